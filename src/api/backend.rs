//! The issue service seen by the worker pipeline.

use async_trait::async_trait;

use super::client::JiraClient;
use super::error::Result;
use super::types::{Comment, FieldMap, Issue, IssueDetail, Transition};

/// Operations the UI needs from an issue tracker.
///
/// [`JiraClient`] is the real implementation; [`super::mock::MockBackend`]
/// serves canned data for `--mock` runs and tests.
#[async_trait]
pub trait IssueBackend: Send + Sync {
    async fn search_issues(&self, jql: &str) -> Result<Vec<Issue>>;

    async fn get_issue(&self, key: &str) -> Result<IssueDetail>;

    async fn list_comments(&self, key: &str) -> Result<Vec<Comment>>;

    async fn add_comment(&self, key: &str, body: &str) -> Result<Comment>;

    async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>>;

    async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<()>;

    async fn update_fields(&self, key: &str, fields: &FieldMap) -> Result<()>;

    fn browse_url(&self, key: &str) -> String;
}

#[async_trait]
impl IssueBackend for JiraClient {
    async fn search_issues(&self, jql: &str) -> Result<Vec<Issue>> {
        JiraClient::search_issues(self, jql).await
    }

    async fn get_issue(&self, key: &str) -> Result<IssueDetail> {
        JiraClient::get_issue(self, key).await
    }

    async fn list_comments(&self, key: &str) -> Result<Vec<Comment>> {
        JiraClient::list_comments(self, key).await
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<Comment> {
        JiraClient::add_comment(self, key, body).await
    }

    async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>> {
        JiraClient::list_transitions(self, key).await
    }

    async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<()> {
        JiraClient::apply_transition(self, key, transition_id).await
    }

    async fn update_fields(&self, key: &str, fields: &FieldMap) -> Result<()> {
        JiraClient::update_fields(self, key, fields).await
    }

    fn browse_url(&self, key: &str) -> String {
        JiraClient::browse_url(self, key)
    }
}
