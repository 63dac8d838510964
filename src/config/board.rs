//! Boards, custom field definitions and the active query source.

use std::fmt;

use serde::Deserialize;

pub const DEFAULT_BOARD_NAME: &str = "myissue";
const DEFAULT_BOARD_JQL: &str = "assignee = currentUser() AND resolution = Unresolved";
const DEFAULT_BOARD_ORDER_BY: &str = "updated";

/// A named, saved query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub name: String,
    pub jql: String,
    pub order_by: Option<String>,
    pub description: Option<String>,
}

impl BoardConfig {
    /// The board used when the configuration defines none.
    pub fn default_board() -> Self {
        Self {
            name: DEFAULT_BOARD_NAME.to_string(),
            jql: DEFAULT_BOARD_JQL.to_string(),
            order_by: Some(DEFAULT_BOARD_ORDER_BY.to_string()),
            description: Some("My current unresolved issues".to_string()),
        }
    }
}

/// Value type of a configured custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    #[default]
    String,
    Text,
    Url,
    Number,
}

impl FieldType {
    /// Parse a `type:` value. Unknown names fall back to `string`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("text") => FieldType::Text,
            Some("url") => FieldType::Url,
            Some("number") => FieldType::Number,
            _ => FieldType::String,
        }
    }

    /// Multi-line fields submit with Ctrl+S so Enter can insert newlines.
    pub fn is_multiline(&self) -> bool {
        matches!(self, FieldType::Text)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Url => "url",
            FieldType::Number => "number",
        })
    }
}

/// An editable custom field, read-only to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFieldSpec {
    pub name: String,
    pub field_id: String,
    pub field_type: FieldType,
    pub description: Option<String>,
}

/// What the issue list is showing: a configured board or a raw JQL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    /// A named board; `None` means the first configured board.
    Board(Option<String>),
    /// Free-text JQL typed on the command line.
    Query(String),
}

impl Default for QuerySource {
    fn default() -> Self {
        QuerySource::Board(None)
    }
}

impl QuerySource {
    pub fn is_query_mode(&self) -> bool {
        matches!(self, QuerySource::Query(_))
    }

    pub fn describe(&self) -> String {
        match self {
            QuerySource::Board(Some(name)) => format!("board={}", name),
            QuerySource::Board(None) => "board=<default>".to_string(),
            QuerySource::Query(jql) => format!("query={}", jql),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawBoard {
    name: Option<String>,
    jql: Option<String>,
    order_by: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawCustomField {
    name: Option<String>,
    field: Option<String>,
    #[serde(rename = "type")]
    field_type: Option<String>,
    description: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RawBoard {
    /// Boards missing a name or JQL are dropped.
    pub(super) fn into_board(self) -> Option<BoardConfig> {
        Some(BoardConfig {
            name: trimmed(self.name)?,
            jql: trimmed(self.jql)?,
            order_by: trimmed(self.order_by),
            description: trimmed(self.description),
        })
    }
}

impl RawCustomField {
    /// Fields missing a name or field id are dropped.
    pub(super) fn into_spec(self) -> Option<CustomFieldSpec> {
        Some(CustomFieldSpec {
            name: trimmed(self.name)?,
            field_id: trimmed(self.field)?,
            field_type: FieldType::parse(self.field_type.as_deref()),
            description: trimmed(self.description),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_parse() {
        assert_eq!(FieldType::parse(None), FieldType::String);
        assert_eq!(FieldType::parse(Some("Text")), FieldType::Text);
        assert_eq!(FieldType::parse(Some(" url ")), FieldType::Url);
        assert_eq!(FieldType::parse(Some("number")), FieldType::Number);
        assert_eq!(FieldType::parse(Some("select")), FieldType::String);
        assert!(FieldType::Text.is_multiline());
        assert!(!FieldType::Url.is_multiline());
    }

    #[test]
    fn test_raw_board_requires_name_and_jql() {
        let board = RawBoard {
            name: Some(" sprint ".to_string()),
            jql: Some("sprint in openSprints()".to_string()),
            order_by: Some("  ".to_string()),
            description: None,
        }
        .into_board()
        .unwrap();
        assert_eq!(board.name, "sprint");
        assert_eq!(board.order_by, None);

        let missing = RawBoard {
            name: Some("x".to_string()),
            ..RawBoard::default()
        };
        assert!(missing.into_board().is_none());
    }

    #[test]
    fn test_raw_custom_field_defaults_to_string() {
        let spec = RawCustomField {
            name: Some("Story Points".to_string()),
            field: Some("customfield_10016".to_string()),
            field_type: None,
            description: None,
        }
        .into_spec()
        .unwrap();
        assert_eq!(spec.field_type, FieldType::String);
    }

    #[test]
    fn test_query_source_describe() {
        assert_eq!(QuerySource::default().describe(), "board=<default>");
        assert_eq!(
            QuerySource::Board(Some("myissue".to_string())).describe(),
            "board=myissue"
        );
        let query = QuerySource::Query("project = JAY".to_string());
        assert!(query.is_query_mode());
        assert_eq!(query.describe(), "query=project = JAY");
    }
}
