//! Edit sessions: the text buffer behind `EditInput` and its validation.

use thiserror::Error;

use crate::api::types::{FieldMap, FieldValue, IssueDetail};
use crate::config::{CustomFieldSpec, FieldType};
use crate::tasks::FieldUpdate;

use super::mode::Mode;

/// What an edit session writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    Summary,
    Description,
    Labels,
    Components,
    Custom(CustomFieldSpec),
    /// A new comment rather than a field.
    Comment,
}

impl EditTarget {
    pub fn label(&self) -> String {
        match self {
            EditTarget::Summary => "summary".to_string(),
            EditTarget::Description => "description".to_string(),
            EditTarget::Labels => "labels".to_string(),
            EditTarget::Components => "components".to_string(),
            EditTarget::Custom(spec) => spec.name.clone(),
            EditTarget::Comment => "comment".to_string(),
        }
    }

    /// Multi-line targets take Enter as a newline and submit with Ctrl+S.
    pub fn is_multiline(&self) -> bool {
        match self {
            EditTarget::Description | EditTarget::Comment => true,
            EditTarget::Custom(spec) => spec.field_type.is_multiline(),
            EditTarget::Summary | EditTarget::Labels | EditTarget::Components => false,
        }
    }

    pub fn submit_hint(&self) -> &'static str {
        if self.is_multiline() {
            "Ctrl+S submit | Enter newline | Esc cancel"
        } else {
            "Enter submit | Esc cancel"
        }
    }
}

/// Input rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("summary cannot be empty")]
    EmptySummary,

    #[error("comment cannot be empty")]
    EmptyComment,

    #[error("{field} must be a number, got '{value}'")]
    InvalidNumber { field: String, value: String },

    #[error("{field} must be an http(s) URL, got '{value}'")]
    InvalidUrl { field: String, value: String },
}

/// An in-progress edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub target: EditTarget,
    /// Issue the edit applies to, fixed when the session starts.
    pub key: String,
    pub buffer: String,
    /// Where Esc goes back to.
    pub return_to: Mode,
}

impl EditSession {
    /// Start an edit prefilled from the loaded detail, if any.
    pub fn start(target: EditTarget, key: String, detail: Option<&IssueDetail>, return_to: Mode) -> Self {
        let buffer = detail
            .map(|d| initial_value(&target, d))
            .unwrap_or_default();
        Self {
            target,
            key,
            buffer,
            return_to,
        }
    }

    pub fn push(&mut self, c: char) {
        self.buffer.push(c);
    }

    pub fn newline(&mut self) {
        self.buffer.push('\n');
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// The comment body to send.
    pub fn comment_body(&self) -> Result<String, ValidationError> {
        let body = self.buffer.trim();
        if body.is_empty() {
            return Err(ValidationError::EmptyComment);
        }
        Ok(body.to_string())
    }

    /// Validate the buffer and build the field update to send.
    pub fn field_update(&self) -> Result<FieldUpdate, ValidationError> {
        let value = self.buffer.trim();
        let (field_id, field_value) = match &self.target {
            EditTarget::Summary => {
                if value.is_empty() {
                    return Err(ValidationError::EmptySummary);
                }
                ("summary".to_string(), FieldValue::Text(value.to_string()))
            }
            EditTarget::Description => (
                "description".to_string(),
                FieldValue::RichText(self.buffer.trim_end().to_string()),
            ),
            EditTarget::Labels => ("labels".to_string(), FieldValue::List(split_csv(value))),
            EditTarget::Components => {
                ("components".to_string(), FieldValue::Names(split_csv(value)))
            }
            EditTarget::Custom(spec) => (spec.field_id.clone(), custom_value(spec, value)?),
            EditTarget::Comment => return Err(ValidationError::EmptyComment),
        };

        Ok(FieldUpdate {
            label: self.target.label(),
            fields: FieldMap::single(field_id, field_value),
        })
    }
}

fn custom_value(spec: &CustomFieldSpec, value: &str) -> Result<FieldValue, ValidationError> {
    match spec.field_type {
        FieldType::String => Ok(FieldValue::Text(value.to_string())),
        FieldType::Text => Ok(FieldValue::RichText(value.to_string())),
        FieldType::Number => value
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(FieldValue::Number)
            .ok_or_else(|| ValidationError::InvalidNumber {
                field: spec.name.clone(),
                value: value.to_string(),
            }),
        FieldType::Url => {
            let valid = (value.starts_with("https://") || value.starts_with("http://"))
                && value.len() > "https://".len()
                && !value.chars().any(char::is_whitespace);
            if valid {
                Ok(FieldValue::Text(value.to_string()))
            } else {
                Err(ValidationError::InvalidUrl {
                    field: spec.name.clone(),
                    value: value.to_string(),
                })
            }
        }
    }
}

/// Comma separated input, blanks dropped.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn initial_value(target: &EditTarget, detail: &IssueDetail) -> String {
    match target {
        EditTarget::Summary => detail.summary.clone(),
        EditTarget::Description => detail.description.clone(),
        EditTarget::Labels => detail.labels.join(", "),
        EditTarget::Components => detail.components.join(", "),
        EditTarget::Custom(spec) => detail
            .custom_fields
            .get(&spec.field_id)
            .cloned()
            .unwrap_or_default(),
        EditTarget::Comment => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(field_type: FieldType) -> CustomFieldSpec {
        CustomFieldSpec {
            name: "Field".to_string(),
            field_id: "customfield_1".to_string(),
            field_type,
            description: None,
        }
    }

    fn session(target: EditTarget, buffer: &str) -> EditSession {
        EditSession {
            target,
            key: "JAY-1".to_string(),
            buffer: buffer.to_string(),
            return_to: Mode::EditMenu,
        }
    }

    #[test]
    fn test_empty_summary_is_rejected() {
        let err = session(EditTarget::Summary, "   ").field_update().unwrap_err();
        assert_eq!(err, ValidationError::EmptySummary);
    }

    #[test]
    fn test_labels_are_split_and_trimmed() {
        let update = session(EditTarget::Labels, "a, b,, c ").field_update().unwrap();
        assert_eq!(
            update.fields.get("labels"),
            Some(&FieldValue::List(vec!["a".into(), "b".into(), "c".into()]))
        );
        assert_eq!(update.label, "labels");
    }

    #[test]
    fn test_number_field_validation() {
        let ok = session(EditTarget::Custom(spec(FieldType::Number)), " 3.5 ")
            .field_update()
            .unwrap();
        assert_eq!(ok.fields.get("customfield_1"), Some(&FieldValue::Number(3.5)));

        let err = session(EditTarget::Custom(spec(FieldType::Number)), "three")
            .field_update()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidNumber { .. }));
    }

    #[test]
    fn test_url_field_validation() {
        assert!(session(EditTarget::Custom(spec(FieldType::Url)), "https://example.com/x")
            .field_update()
            .is_ok());
        for bad in ["example.com", "https://", "http://a b"] {
            let err = session(EditTarget::Custom(spec(FieldType::Url)), bad)
                .field_update()
                .unwrap_err();
            assert!(matches!(err, ValidationError::InvalidUrl { .. }), "{bad}");
        }
    }

    #[test]
    fn test_comment_body() {
        assert_eq!(
            session(EditTarget::Comment, "  \n ").comment_body(),
            Err(ValidationError::EmptyComment)
        );
        assert_eq!(
            session(EditTarget::Comment, "line one\nline two\n").comment_body().unwrap(),
            "line one\nline two"
        );
    }

    #[test]
    fn test_multiline_targets() {
        assert!(EditTarget::Description.is_multiline());
        assert!(EditTarget::Comment.is_multiline());
        assert!(EditTarget::Custom(spec(FieldType::Text)).is_multiline());
        assert!(!EditTarget::Custom(spec(FieldType::Url)).is_multiline());
        assert!(!EditTarget::Summary.is_multiline());
    }
}
