//! In-process issue backend with canned data.
//!
//! Used by `--mock` runs and by tests that need to count requests or
//! inject failures without an HTTP server.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::backend::IssueBackend;
use super::error::{ApiError, Result};
use super::types::{Comment, FieldMap, FieldValue, Issue, IssueDetail, Transition};

const MOCK_SERVER: &str = "https://jira.mock.local";

const WORKFLOW: &[(&str, &str, &str)] = &[
    ("11", "Reopen", "To Do"),
    ("21", "Start Progress", "In Progress"),
    ("31", "Request Review", "Review"),
    ("41", "Block", "Blocked"),
    ("51", "Resolve", "Done"),
];

/// Operations counted by [`MockBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Search,
    GetIssue,
    ListComments,
    AddComment,
    ListTransitions,
    ApplyTransition,
    UpdateFields,
}

#[derive(Debug, Default)]
struct MockState {
    issues: Vec<IssueDetail>,
    comments: HashMap<String, Vec<Comment>>,
    next_comment_id: u32,
    calls: HashMap<MockOp, u32>,
    failures: HashMap<MockOp, VecDeque<u16>>,
    last_jql: Option<String>,
}

/// Canned issue backend.
#[derive(Debug)]
pub struct MockBackend {
    state: Mutex<MockState>,
    latency: Duration,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// A backend seeded with a handful of issues and comments.
    pub fn new() -> Self {
        let issues = vec![
            sample("JAY-101", "Story", "Build ratatui scaffold", "In Progress", "alice"),
            sample("JAY-102", "Task", "Add adapter JSON contract", "To Do", "bob"),
            sample("JAY-103", "Bug", "Wire issue detail pane", "Blocked", "carol"),
            sample("JAY-104", "Task", "Measure navigation latency", "Review", "dave"),
        ];
        let mut comments = HashMap::new();
        comments.insert(
            "JAY-101".to_string(),
            vec![
                mock_comment("1", "bob", "Scaffold compiles, panes render."),
                mock_comment("2", "alice", "Adding the detail pane next."),
            ],
        );
        comments.insert(
            "JAY-103".to_string(),
            vec![mock_comment("3", "carol", "Blocked on the adapter contract.")],
        );

        Self {
            state: Mutex::new(MockState {
                issues,
                comments,
                next_comment_id: 4,
                ..MockState::default()
            }),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next call to `op` fail with HTTP `status`.
    pub fn fail_next(&self, op: MockOp, status: u16) {
        self.lock().failures.entry(op).or_default().push_back(status);
    }

    /// Number of calls made to `op` so far.
    pub fn calls(&self, op: MockOp) -> u32 {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// The JQL of the most recent search.
    pub fn last_jql(&self) -> Option<String> {
        self.lock().last_jql.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call, wait out the latency and pop any injected failure.
    async fn enter(&self, op: MockOp, key: &str) -> Result<()> {
        let injected = {
            let mut state = self.lock();
            *state.calls.entry(op).or_insert(0) += 1;
            state.failures.get_mut(&op).and_then(VecDeque::pop_front)
        };
        debug!(?op, key, "mock backend call");

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match injected {
            Some(code) => {
                let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Err(ApiError::from_status(status, &format!("injected failure for {}", key)))
            }
            None => Ok(()),
        }
    }

    fn with_issue<T>(&self, key: &str, f: impl FnOnce(&mut IssueDetail) -> T) -> Result<T> {
        let mut state = self.lock();
        state
            .issues
            .iter_mut()
            .find(|i| i.key == key)
            .map(f)
            .ok_or_else(|| ApiError::NotFound(format!("issue {}", key)))
    }
}

#[async_trait]
impl IssueBackend for MockBackend {
    async fn search_issues(&self, jql: &str) -> Result<Vec<Issue>> {
        self.enter(MockOp::Search, "*").await?;
        let mut state = self.lock();
        state.last_jql = Some(jql.to_string());
        Ok(state.issues.iter().map(row).collect())
    }

    async fn get_issue(&self, key: &str) -> Result<IssueDetail> {
        self.enter(MockOp::GetIssue, key).await?;
        self.with_issue(key, |issue| issue.clone())
    }

    async fn list_comments(&self, key: &str) -> Result<Vec<Comment>> {
        self.enter(MockOp::ListComments, key).await?;
        self.with_issue(key, |_| ())?;
        Ok(self.lock().comments.get(key).cloned().unwrap_or_default())
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<Comment> {
        self.enter(MockOp::AddComment, key).await?;
        self.with_issue(key, |_| ())?;

        let mut state = self.lock();
        let id = state.next_comment_id;
        state.next_comment_id += 1;
        let comment = mock_comment(&id.to_string(), "you", body);
        state
            .comments
            .entry(key.to_string())
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }

    async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>> {
        self.enter(MockOp::ListTransitions, key).await?;
        let status = self.with_issue(key, |issue| issue.status.clone())?;
        Ok(WORKFLOW
            .iter()
            .filter(|(_, _, to)| *to != status)
            .map(|(id, name, to)| Transition {
                id: id.to_string(),
                name: name.to_string(),
                to_status: to.to_string(),
                to_description: None,
            })
            .collect())
    }

    async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<()> {
        self.enter(MockOp::ApplyTransition, key).await?;
        let (_, _, to) = WORKFLOW
            .iter()
            .find(|(id, _, _)| *id == transition_id)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown transition {}", transition_id)))?;
        self.with_issue(key, |issue| issue.status = to.to_string())
    }

    async fn update_fields(&self, key: &str, fields: &FieldMap) -> Result<()> {
        self.enter(MockOp::UpdateFields, key).await?;
        self.with_issue(key, |issue| apply_fields(issue, fields))
    }

    fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", MOCK_SERVER, key)
    }
}

fn apply_fields(issue: &mut IssueDetail, fields: &FieldMap) {
    for (id, value) in fields.iter() {
        match (id, value) {
            ("summary", FieldValue::Text(text)) => issue.summary = text.clone(),
            ("description", FieldValue::Text(text) | FieldValue::RichText(text)) => {
                issue.description = text.clone()
            }
            ("labels", FieldValue::List(items)) => issue.labels = items.clone(),
            ("components", FieldValue::Names(items)) => issue.components = items.clone(),
            (custom, value) => {
                issue
                    .custom_fields
                    .insert(custom.to_string(), value.display());
            }
        }
    }
}

fn sample(key: &str, issue_type: &str, summary: &str, status: &str, assignee: &str) -> IssueDetail {
    IssueDetail {
        key: key.to_string(),
        issue_type: issue_type.to_string(),
        summary: summary.to_string(),
        status: status.to_string(),
        priority: "Medium".to_string(),
        assignee: assignee.to_string(),
        reporter: "jayrah".to_string(),
        created: "2026-01-05T09:00:00.000+0000".to_string(),
        updated: "2026-01-12T16:30:00.000+0000".to_string(),
        labels: vec!["tui".to_string()],
        components: vec!["client".to_string()],
        fix_versions: Vec::new(),
        description: format!("{}.\n\nMock issue served without a Jira server.", summary),
        custom_fields: BTreeMap::new(),
    }
}

fn row(detail: &IssueDetail) -> Issue {
    Issue {
        key: detail.key.clone(),
        issue_type: detail.issue_type.clone(),
        summary: detail.summary.clone(),
        status: detail.status.clone(),
        assignee: detail.assignee.clone(),
        reporter: detail.reporter.clone(),
        created: detail.created.clone(),
        updated: detail.updated.clone(),
    }
}

fn mock_comment(id: &str, author: &str, body: &str) -> Comment {
    Comment {
        id: id.to_string(),
        author: author.to_string(),
        body: body.to_string(),
        created: "2026-01-10T12:00:00.000+0000".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorKind;

    #[tokio::test]
    async fn test_search_returns_samples_and_records_jql() {
        let backend = MockBackend::new();
        let issues = backend.search_issues("project = JAY").await.unwrap();
        assert_eq!(issues.len(), 4);
        assert_eq!(issues[0].key, "JAY-101");
        assert_eq!(backend.calls(MockOp::Search), 1);
        assert_eq!(backend.last_jql().as_deref(), Some("project = JAY"));
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let backend = MockBackend::new();
        backend.fail_next(MockOp::GetIssue, 503);

        let err = backend.get_issue("JAY-101").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(backend.get_issue("JAY-101").await.is_ok());
        assert_eq!(backend.calls(MockOp::GetIssue), 2);
    }

    #[tokio::test]
    async fn test_unknown_issue_is_not_found() {
        let backend = MockBackend::new();
        let err = backend.list_comments("NOPE-1").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_transition_moves_status() {
        let backend = MockBackend::new();
        let transitions = backend.list_transitions("JAY-102").await.unwrap();
        assert!(transitions.iter().all(|t| t.to_status != "To Do"));

        backend.apply_transition("JAY-102", "51").await.unwrap();
        assert_eq!(backend.get_issue("JAY-102").await.unwrap().status, "Done");
    }

    #[tokio::test]
    async fn test_comment_and_field_writes_persist() {
        let backend = MockBackend::new();
        let comment = backend.add_comment("JAY-104", "ship it").await.unwrap();
        assert_eq!(comment.body, "ship it");
        assert_eq!(backend.list_comments("JAY-104").await.unwrap().len(), 1);

        let mut fields = FieldMap::new();
        fields.insert("summary", FieldValue::Text("Renamed".to_string()));
        fields.insert("customfield_10016", FieldValue::Number(5.0));
        backend.update_fields("JAY-104", &fields).await.unwrap();

        let detail = backend.get_issue("JAY-104").await.unwrap();
        assert_eq!(detail.summary, "Renamed");
        assert_eq!(detail.custom_fields["customfield_10016"], "5");
    }
}
