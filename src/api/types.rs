//! Jira API request and response types.
//!
//! The public structs are the flattened shapes the UI works with. The
//! `*Payload` structs mirror the REST responses and stay private to the
//! client; they tolerate missing fields because Jira omits anything the
//! caller did not ask for or cannot see.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::adf;
use crate::config::ApiVersion;

/// One row of the issue list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub key: String,
    pub issue_type: String,
    pub summary: String,
    pub status: String,
    pub assignee: String,
    pub reporter: String,
    pub created: String,
    pub updated: String,
}

/// A fully fetched issue. Always replaced as a whole, never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDetail {
    pub key: String,
    pub issue_type: String,
    pub summary: String,
    pub status: String,
    pub priority: String,
    pub assignee: String,
    pub reporter: String,
    pub created: String,
    pub updated: String,
    pub labels: Vec<String>,
    pub components: Vec<String>,
    pub fix_versions: Vec<String>,
    pub description: String,
    /// Display text of configured custom fields, keyed by field id.
    pub custom_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    pub created: String,
}

/// A workflow transition available for an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub to_status: String,
    pub to_description: Option<String>,
}

/// The authenticated user, returned by `GET myself`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

impl CurrentUser {
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.name.as_deref())
            .or(self.email_address.as_deref())
            .unwrap_or("unknown user")
    }
}

/// A typed value for an issue field update.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Single-line text (summary, `string`/`url` custom fields).
    Text(String),
    /// Multi-line text; sent as ADF on API v3.
    RichText(String),
    Number(f64),
    /// Plain string arrays such as labels.
    List(Vec<String>),
    /// Arrays of named objects such as components.
    Names(Vec<String>),
}

impl FieldValue {
    /// The JSON shape the given API version expects.
    pub fn to_json(&self, version: ApiVersion) -> Value {
        match self {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::RichText(text) => match version {
                ApiVersion::V3 => adf::from_plain_text(text),
                ApiVersion::V2 => Value::String(text.clone()),
            },
            FieldValue::Number(n) => json!(n),
            FieldValue::List(items) => json!(items),
            FieldValue::Names(items) => Value::Array(
                items.iter().map(|name| json!({ "name": name })).collect(),
            ),
        }
    }

    /// Plain text form, as the detail pane shows it.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(text) | FieldValue::RichText(text) => text.clone(),
            FieldValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                format!("{}", *n as i64)
            }
            FieldValue::Number(n) => n.to_string(),
            FieldValue::List(items) | FieldValue::Names(items) => items.join(", "),
        }
    }
}

/// Field id to value map for `update_fields`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field_id: impl Into<String>, value: FieldValue) -> Self {
        let mut map = Self::new();
        map.insert(field_id, value);
        map
    }

    pub fn insert(&mut self, field_id: impl Into<String>, value: FieldValue) {
        self.fields.insert(field_id.into(), value);
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.fields.get(field_id)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(id, value)| (id.as_str(), value))
    }

    /// Request body for `PUT issue/{key}`.
    pub fn to_payload(&self, version: ApiVersion) -> Value {
        let fields: Map<String, Value> = self
            .fields
            .iter()
            .map(|(id, value)| (id.clone(), value.to_json(version)))
            .collect();
        json!({ "fields": fields })
    }
}

/// Request body for adding a comment.
pub(crate) fn comment_payload(body: &str, version: ApiVersion) -> Value {
    match version {
        ApiVersion::V2 => json!({ "body": body }),
        ApiVersion::V3 => json!({ "body": adf::from_plain_text(body) }),
    }
}

/// Request body for applying a transition.
pub(crate) fn transition_payload(transition_id: &str) -> Value {
    json!({ "transition": { "id": transition_id } })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchPage {
    #[serde(default)]
    pub issues: Vec<IssuePayload>,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub is_last: Option<bool>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssuePayload {
    pub key: String,
    #[serde(default)]
    pub fields: FieldsPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FieldsPayload {
    summary: Option<String>,
    status: Option<NamedRef>,
    priority: Option<NamedRef>,
    issuetype: Option<NamedRef>,
    assignee: Option<UserRef>,
    reporter: Option<UserRef>,
    created: Option<String>,
    updated: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    components: Vec<NamedRef>,
    #[serde(default)]
    fix_versions: Vec<NamedRef>,
    description: Option<Value>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NamedRef {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserRef {
    display_name: Option<String>,
    name: Option<String>,
    email_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CommentsPage {
    #[serde(default)]
    pub comments: Vec<CommentPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentPayload {
    #[serde(default)]
    id: String,
    author: Option<UserRef>,
    #[serde(default)]
    body: Value,
    created: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TransitionsPage {
    #[serde(default)]
    pub transitions: Vec<TransitionPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionPayload {
    id: String,
    #[serde(default)]
    name: String,
    to: Option<NamedRef>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn named(value: Option<NamedRef>) -> Option<String> {
    value.and_then(|v| non_empty(v.name))
}

fn user_label(value: Option<UserRef>) -> Option<String> {
    value.and_then(|u| non_empty(u.display_name.or(u.name).or(u.email_address)))
}

fn or_placeholder(value: Option<String>, placeholder: &str) -> String {
    value.unwrap_or_else(|| placeholder.to_string())
}

impl IssuePayload {
    pub fn into_issue(self) -> Issue {
        let f = self.fields;
        Issue {
            key: self.key,
            issue_type: or_placeholder(named(f.issuetype), "Unknown"),
            summary: or_placeholder(non_empty(f.summary), "<no summary>"),
            status: or_placeholder(named(f.status), "Unknown"),
            assignee: or_placeholder(user_label(f.assignee), "Unassigned"),
            reporter: or_placeholder(user_label(f.reporter), "Unknown"),
            created: or_placeholder(non_empty(f.created), "Unknown"),
            updated: or_placeholder(non_empty(f.updated), "Unknown"),
        }
    }

    pub fn into_detail(self, custom_field_ids: &[String]) -> IssueDetail {
        let mut f = self.fields;
        let custom_fields = custom_field_ids
            .iter()
            .filter_map(|id| {
                let text = adf::display_value(f.extra.remove(id).as_ref()?);
                (!text.is_empty()).then(|| (id.clone(), text))
            })
            .collect();

        IssueDetail {
            key: self.key,
            issue_type: or_placeholder(named(f.issuetype), "Unknown"),
            summary: or_placeholder(non_empty(f.summary), "<no summary>"),
            status: or_placeholder(named(f.status), "Unknown"),
            priority: or_placeholder(named(f.priority), "Unknown"),
            assignee: or_placeholder(user_label(f.assignee), "Unassigned"),
            reporter: or_placeholder(user_label(f.reporter), "Unknown"),
            created: or_placeholder(non_empty(f.created), "Unknown"),
            updated: or_placeholder(non_empty(f.updated), "Unknown"),
            labels: f.labels.into_iter().filter_map(|l| non_empty(Some(l))).collect(),
            components: f.components.into_iter().filter_map(|c| named(Some(c))).collect(),
            fix_versions: f.fix_versions.into_iter().filter_map(|v| named(Some(v))).collect(),
            description: f.description.as_ref().map(adf::to_plain_text).unwrap_or_default(),
            custom_fields,
        }
    }
}

impl CommentPayload {
    pub fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            author: or_placeholder(user_label(self.author), "Unknown"),
            body: adf::to_plain_text(&self.body),
            created: or_placeholder(non_empty(self.created), "Unknown"),
        }
    }
}

impl TransitionPayload {
    pub fn into_transition(self) -> Transition {
        let (to_status, to_description) = match self.to {
            Some(to) => (non_empty(to.name), non_empty(to.description)),
            None => (None, None),
        };
        Transition {
            id: self.id,
            to_status: to_status.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            to_description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_payload_flattens_fields() {
        let payload: IssuePayload = serde_json::from_value(json!({
            "key": "JAY-1",
            "fields": {
                "summary": "  Fix login  ",
                "status": {"name": "In Progress"},
                "issuetype": {"name": "Bug"},
                "assignee": {"displayName": "Alice"},
                "reporter": {"emailAddress": "bob@example.com"},
                "created": "2026-01-01T10:00:00.000+0000"
            }
        }))
        .unwrap();

        let issue = payload.into_issue();
        assert_eq!(issue.key, "JAY-1");
        assert_eq!(issue.summary, "Fix login");
        assert_eq!(issue.status, "In Progress");
        assert_eq!(issue.issue_type, "Bug");
        assert_eq!(issue.assignee, "Alice");
        assert_eq!(issue.reporter, "bob@example.com");
        assert_eq!(issue.updated, "Unknown");
    }

    #[test]
    fn test_missing_fields_use_placeholders() {
        let payload: IssuePayload = serde_json::from_value(json!({"key": "JAY-2"})).unwrap();
        let issue = payload.into_issue();
        assert_eq!(issue.summary, "<no summary>");
        assert_eq!(issue.assignee, "Unassigned");
    }

    #[test]
    fn test_detail_collects_configured_custom_fields() {
        let payload: IssuePayload = serde_json::from_value(json!({
            "key": "JAY-3",
            "fields": {
                "summary": "Detail",
                "labels": ["backend", " "],
                "components": [{"name": "api"}],
                "description": {"type": "doc", "content": [
                    {"type": "paragraph", "content": [{"type": "text", "text": "Body"}]}
                ]},
                "customfield_10010": {"value": "Team Blue"},
                "customfield_10020": 5,
                "customfield_99999": "not configured"
            }
        }))
        .unwrap();

        let ids = vec![
            "customfield_10010".to_string(),
            "customfield_10020".to_string(),
            "customfield_10030".to_string(),
        ];
        let detail = payload.into_detail(&ids);
        assert_eq!(detail.labels, vec!["backend"]);
        assert_eq!(detail.components, vec!["api"]);
        assert_eq!(detail.description, "Body");
        assert_eq!(detail.custom_fields.len(), 2);
        assert_eq!(detail.custom_fields["customfield_10010"], "Team Blue");
        assert_eq!(detail.custom_fields["customfield_10020"], "5");
    }

    #[test]
    fn test_transition_destination_falls_back_to_name() {
        let with_to: TransitionPayload = serde_json::from_value(json!({
            "id": "31", "name": "Finish", "to": {"name": "Done", "description": "Work complete"}
        }))
        .unwrap();
        let t = with_to.into_transition();
        assert_eq!(t.to_status, "Done");
        assert_eq!(t.to_description.as_deref(), Some("Work complete"));

        let without_to: TransitionPayload =
            serde_json::from_value(json!({"id": "11", "name": "Reopen"})).unwrap();
        assert_eq!(without_to.into_transition().to_status, "Reopen");
    }

    #[test]
    fn test_comment_payload_reads_adf_body() {
        let payload: CommentPayload = serde_json::from_value(json!({
            "id": "100",
            "author": {"displayName": "Carol"},
            "body": {"type": "doc", "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "LGTM"}]}
            ]},
            "created": "2026-02-01"
        }))
        .unwrap();
        let comment = payload.into_comment();
        assert_eq!(comment.author, "Carol");
        assert_eq!(comment.body, "LGTM");
    }

    #[test]
    fn test_field_map_payload_per_version() {
        let mut map = FieldMap::new();
        map.insert("summary", FieldValue::Text("New".to_string()));
        map.insert("description", FieldValue::RichText("Line".to_string()));
        map.insert("components", FieldValue::Names(vec!["api".to_string()]));
        map.insert("customfield_1", FieldValue::Number(3.0));

        let v2 = map.to_payload(ApiVersion::V2);
        assert_eq!(v2["fields"]["summary"], "New");
        assert_eq!(v2["fields"]["description"], "Line");
        assert_eq!(v2["fields"]["components"][0]["name"], "api");
        assert_eq!(v2["fields"]["customfield_1"], 3.0);

        let v3 = map.to_payload(ApiVersion::V3);
        assert_eq!(v3["fields"]["description"]["type"], "doc");
    }

    #[test]
    fn test_comment_payload_per_version() {
        assert_eq!(comment_payload("hi", ApiVersion::V2), json!({"body": "hi"}));
        let v3 = comment_payload("hi", ApiVersion::V3);
        assert_eq!(v3["body"]["content"][0]["content"][0]["text"], "hi");
    }
}
