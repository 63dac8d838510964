//! Jira REST client.
//!
//! One client serves both API generations. The version picks the base path
//! (`/rest/api/2` or `/rest/api/3`), the search endpoint and the shape of
//! rich-text payloads; method signatures stay the same either way.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::auth::{Auth, SecretFetcher, SecretRef, SystemSecrets};
use super::error::{ApiError, Result};
use super::types::{
    comment_payload, transition_payload, Comment, CommentPayload, CommentsPage, CurrentUser,
    FieldMap, Issue, IssueDetail, SearchPage, TransitionsPage, Transition,
};
use crate::config::{ApiVersion, Config, ConfigError, PipelineSettings};
use crate::telemetry;

/// Issues requested per search page.
const SEARCH_PAGE_SIZE: usize = 100;

/// Hard stop for runaway pagination.
const MAX_SEARCH_PAGES: usize = 50;

const LIST_FIELDS: &[&str] = &[
    "summary", "status", "issuetype", "assignee", "reporter", "created", "updated",
];

const DETAIL_FIELDS: &[&str] = &[
    "summary",
    "status",
    "priority",
    "issuetype",
    "assignee",
    "reporter",
    "created",
    "updated",
    "labels",
    "components",
    "fixVersions",
    "description",
];

/// Exponential backoff for transient failures.
///
/// Attempt `n` (1-based) that fails with a retryable error waits
/// `base_delay * 2^(n-1)` before attempt `n + 1`. Non-retryable errors and
/// the last attempt return immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&PipelineSettings::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::new(settings.retry_attempts, settings.retry_base_delay())
    }

    /// A policy that never retries.
    pub fn single() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after a failed `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Returns the final result together with the number of attempts made.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> (Result<T>, u32)
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op(attempt).await {
                Ok(value) => return (Ok(value), attempt),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "Request failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        self.max_attempts,
                        delay.as_millis(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }
}

/// The Jira API client.
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: Client,
    server: String,
    base_url: String,
    version: ApiVersion,
    auth: Auth,
    retry: RetryPolicy,
    custom_field_ids: Vec<String>,
}

impl JiraClient {
    /// Build a client from configuration, resolving secrets on the host.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_config_with(config, &SystemSecrets)
    }

    /// Build a client from configuration with a custom secret lookup.
    ///
    /// Fails without touching the network when the server or password is
    /// missing or the secret command fails.
    #[instrument(skip_all, fields(api_version = %config.api_version))]
    pub fn from_config_with(config: &Config, secrets: &dyn SecretFetcher) -> Result<Self> {
        let server = config
            .server
            .as_deref()
            .ok_or_else(|| ApiError::Configuration(ConfigError::MissingServer.to_string()))?;
        let raw_secret = config
            .password
            .as_deref()
            .ok_or_else(|| ApiError::Configuration(ConfigError::MissingPassword.to_string()))?;

        let secret = SecretRef::parse(raw_secret).resolve(secrets)?;
        let auth = Auth::for_method(config.auth_method(), config.user.as_deref(), &secret)
            .map_err(ApiError::Configuration)?;

        let http = build_http_client(config.pipeline.request_timeout(), config.insecure)?;
        info!(server = %server, auth = ?auth.method(), "Jira client configured");

        Ok(Self::assemble(http, server, config.api_version, auth)
            .with_retry_policy(RetryPolicy::from_settings(&config.pipeline))
            .with_custom_fields(
                config
                    .custom_fields
                    .iter()
                    .map(|f| f.field_id.clone())
                    .collect(),
            ))
    }

    /// Create a client with explicit credentials and default settings.
    pub fn new(server: &str, version: ApiVersion, auth: Auth) -> Result<Self> {
        let settings = PipelineSettings::default();
        let http = build_http_client(settings.request_timeout(), false)?;
        Ok(Self::assemble(http, server, version, auth))
    }

    fn assemble(http: Client, server: &str, version: ApiVersion, auth: Auth) -> Self {
        let server = server.trim_end_matches('/').to_string();
        let base_url = format!("{}/rest/api/{}", server, version);
        Self {
            http,
            server,
            base_url,
            version,
            auth,
            retry: RetryPolicy::default(),
            custom_field_ids: Vec::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Custom field ids to request alongside the standard detail fields.
    pub fn with_custom_fields(mut self, ids: Vec<String>) -> Self {
        self.custom_field_ids = ids;
        self
    }

    pub fn api_version(&self) -> ApiVersion {
        self.version
    }

    /// Check reachability and credentials with `GET myself`.
    #[instrument(skip(self))]
    pub async fn validate_connection(&self) -> Result<CurrentUser> {
        let url = self.endpoint("myself");
        let user: CurrentUser = self.read(&url).await.map_err(|e| {
            error!("Connection validation failed: {}", e);
            e
        })?;
        info!("Connected as {}", user.label());
        Ok(user)
    }

    /// Run a JQL search and collect every page.
    #[instrument(skip(self), fields(jql = %jql))]
    pub async fn search_issues(&self, jql: &str) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();
        let mut start_at = 0usize;
        let mut page_token: Option<String> = None;

        for page_number in 0..MAX_SEARCH_PAGES {
            let url = self.search_url(jql, start_at, page_token.as_deref());
            let page: SearchPage = self.read(&url).await?;
            let fetched = page.issues.len();
            issues.extend(page.issues.into_iter().map(|p| p.into_issue()));
            debug!(page = page_number, fetched, "Search page received");

            if fetched == 0 || page.is_last == Some(true) {
                break;
            }
            if let Some(token) = page.next_page_token {
                page_token = Some(token);
                continue;
            }
            start_at += fetched;
            match page.total {
                Some(total) if start_at < total => {}
                _ => break,
            }
        }

        debug!("Search returned {} issues", issues.len());
        Ok(issues)
    }

    fn search_url(&self, jql: &str, start_at: usize, page_token: Option<&str>) -> String {
        let fields = LIST_FIELDS.join(",");
        match self.version {
            ApiVersion::V2 => format!(
                "{}?jql={}&startAt={}&maxResults={}&fields={}",
                self.endpoint("search"),
                urlencoding::encode(jql),
                start_at,
                SEARCH_PAGE_SIZE,
                fields
            ),
            ApiVersion::V3 => {
                let mut url = format!(
                    "{}?jql={}&maxResults={}&fields={}",
                    self.endpoint("search/jql"),
                    urlencoding::encode(jql),
                    SEARCH_PAGE_SIZE,
                    fields
                );
                if let Some(token) = page_token {
                    url.push_str("&nextPageToken=");
                    url.push_str(&urlencoding::encode(token));
                }
                url
            }
        }
    }

    /// Fetch the full record of one issue.
    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn get_issue(&self, key: &str) -> Result<IssueDetail> {
        let mut fields: Vec<&str> = DETAIL_FIELDS.to_vec();
        fields.extend(self.custom_field_ids.iter().map(String::as_str));

        let url = format!("{}?fields={}", self.issue_endpoint(key, ""), fields.join(","));
        let payload: super::types::IssuePayload = self.read(&url).await?;
        Ok(payload.into_detail(&self.custom_field_ids))
    }

    /// Comments in creation order.
    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn list_comments(&self, key: &str) -> Result<Vec<Comment>> {
        let url = format!(
            "{}?orderBy=created&maxResults=1000",
            self.issue_endpoint(key, "/comment")
        );
        let page: CommentsPage = self.read(&url).await?;
        Ok(page.comments.into_iter().map(|c| c.into_comment()).collect())
    }

    /// Post a comment. Not retried so a submission lands at most once.
    #[instrument(skip(self, body), fields(issue_key = %key))]
    pub async fn add_comment(&self, key: &str, body: &str) -> Result<Comment> {
        let url = self.issue_endpoint(key, "/comment");
        let payload = comment_payload(body, self.version);
        let created: CommentPayload = self
            .send(Method::POST, &url, Some(&payload), &RetryPolicy::single())
            .await?;
        Ok(created.into_comment())
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>> {
        let url = self.issue_endpoint(key, "/transitions");
        let page: TransitionsPage = self.read(&url).await?;
        Ok(page
            .transitions
            .into_iter()
            .map(|t| t.into_transition())
            .collect())
    }

    /// Move an issue through a workflow transition. Not retried.
    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<()> {
        let url = self.issue_endpoint(key, "/transitions");
        let payload = transition_payload(transition_id);
        self.send(Method::POST, &url, Some(&payload), &RetryPolicy::single())
            .await
    }

    /// Update fields with `PUT issue/{key}`. The request is idempotent and
    /// follows the normal retry policy.
    #[instrument(skip(self, fields), fields(issue_key = %key))]
    pub async fn update_fields(&self, key: &str, fields: &FieldMap) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let url = self.issue_endpoint(key, "");
        let payload = fields.to_payload(self.version);
        self.send(Method::PUT, &url, Some(&payload), &self.retry).await
    }

    /// Web URL of an issue.
    pub fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.server, key)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn issue_endpoint(&self, key: &str, suffix: &str) -> String {
        format!("{}/issue/{}{}", self.base_url, urlencoding::encode(key), suffix)
    }

    async fn read<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.send(Method::GET, url, None, &self.retry).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        policy: &RetryPolicy,
    ) -> Result<T> {
        let started = Instant::now();
        let (result, attempts) = policy
            .run(|_| self.execute(method.clone(), url, body))
            .await;
        debug!(
            %method,
            url,
            attempts,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Request finished"
        );
        telemetry::record_request(method.as_str(), url, attempts, started.elapsed(), result.is_ok());
        decode(&result?)
    }

    /// One HTTP round trip. Returns the body text of a 2xx response.
    async fn execute(&self, method: Method, url: &str, body: Option<&Value>) -> Result<String> {
        let mut request = self
            .http
            .request(method, url)
            .header(header::AUTHORIZATION, self.auth.header_value())
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(text)
        } else {
            debug!("Error response body: {}", text);
            Err(error_from_response(status, url, &text))
        }
    }
}

fn build_http_client(timeout: Duration, insecure: bool) -> Result<Client> {
    if insecure {
        warn!("TLS certificate verification is disabled");
    }
    Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(insecure)
        .build()
        .map_err(ApiError::Network)
}

/// Decode a response body; an empty body reads as JSON `null`.
fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    let parsed = if text.trim().is_empty() {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_str(text)
    };
    parsed.map_err(|e| ApiError::InvalidResponse(format!("failed to parse response: {}", e)))
}

/// Build a typed error, preferring Jira's own `errorMessages`/`errors`.
fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
    let detail = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        let mut parts: Vec<String> = json
            .get("errorMessages")
            .and_then(Value::as_array)
            .map(|messages| {
                messages
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if let Some(errors) = json.get("errors").and_then(Value::as_object) {
            parts.extend(errors.iter().map(|(field, v)| match v.as_str() {
                Some(text) => format!("{}: {}", field, text),
                None => format!("{}: {}", field, v),
            }));
        }
        (!parts.is_empty()).then(|| parts.join(", "))
    });

    ApiError::from_status(status, detail.as_deref().unwrap_or(url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorKind;
    use crate::api::types::FieldValue;
    use mockito::{Matcher, Server};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    fn client(server: &Server, version: ApiVersion) -> JiraClient {
        JiraClient::new(&server.url(), version, Auth::bearer("tok"))
            .unwrap()
            .with_retry_policy(fast_retry())
    }

    #[test]
    fn test_retry_delay_exponential() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_retry_policy_needs_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
        assert_eq!(RetryPolicy::single().max_attempts(), 1);
    }

    #[tokio::test]
    async fn test_two_503s_then_success_takes_three_attempts() {
        let calls = AtomicU32::new(0);
        let (result, attempts) = fast_retry()
            .run(|_| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, "busy"))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_404_is_not_retried() {
        let (result, attempts) = fast_retry()
            .run(|_| async { Err::<(), _>(ApiError::from_status(StatusCode::NOT_FOUND, "gone")) })
            .await;

        assert_eq!(attempts, 1);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::ClientError);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_last_error() {
        let (result, attempts) = fast_retry()
            .run(|_| async { Err::<(), _>(ApiError::ServerError("down".to_string())) })
            .await;
        assert_eq!(attempts, 3);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Transient);
    }

    #[test]
    fn test_error_from_response_prefers_jira_messages() {
        let err = error_from_response(
            StatusCode::BAD_REQUEST,
            "http://x",
            r#"{"errorMessages":["Field 'foo' does not exist"],"errors":{"summary":"required"}}"#,
        );
        match err {
            ApiError::BadRequest(msg) => {
                assert_eq!(msg, "Field 'foo' does not exist, summary: required")
            }
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_error_from_response_falls_back_to_url() {
        let err = error_from_response(StatusCode::NOT_FOUND, "http://x/issue/JAY-1", "");
        assert_eq!(err.to_string(), "Not found: http://x/issue/JAY-1");
    }

    #[test]
    fn test_decode_empty_body_as_unit() {
        let unit: Result<()> = decode("");
        assert!(unit.is_ok());
        let value: Result<CurrentUser> = decode("");
        assert!(matches!(value, Err(ApiError::InvalidResponse(_))));
    }

    #[test]
    fn test_browse_url_and_base_path() {
        let client = JiraClient::new("https://jira.example.com/", ApiVersion::V3, Auth::bearer("t"))
            .unwrap();
        assert_eq!(client.browse_url("JAY-7"), "https://jira.example.com/browse/JAY-7");
        assert_eq!(
            client.endpoint("search/jql"),
            "https://jira.example.com/rest/api/3/search/jql"
        );
    }

    #[test]
    fn test_search_url_per_version() {
        let v2 = JiraClient::new("https://j", ApiVersion::V2, Auth::bearer("t")).unwrap();
        let url = v2.search_url("project = JAY", 100, None);
        assert!(url.starts_with("https://j/rest/api/2/search?jql=project%20%3D%20JAY&startAt=100"));

        let v3 = JiraClient::new("https://j", ApiVersion::V3, Auth::bearer("t")).unwrap();
        let url = v3.search_url("project = JAY", 0, Some("tok"));
        assert!(url.starts_with("https://j/rest/api/3/search/jql?jql="));
        assert!(url.ends_with("&nextPageToken=tok"));
        assert!(!url.contains("startAt"));
    }

    #[tokio::test]
    async fn test_get_issue_sends_bearer_and_parses() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/2/issue/JAY-1")
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"key":"JAY-1","fields":{"summary":"Hello","status":{"name":"Open"},"description":"plain"}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let detail = client(&server, ApiVersion::V2).get_issue("JAY-1").await.unwrap();
        assert_eq!(detail.summary, "Hello");
        assert_eq!(detail.status, "Open");
        assert_eq!(detail.description, "plain");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_to_the_ceiling() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/2/issue/JAY-2")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let err = client(&server, ApiVersion::V2).get_issue("JAY-2").await.unwrap_err();
        assert!(matches!(err, ApiError::ServerError(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_one_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/2/issue/JAY-404")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"errorMessages":["Issue does not exist"]}"#)
            .expect(1)
            .create_async()
            .await;

        let err = client(&server, ApiVersion::V2).get_issue("JAY-404").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClientError);
        assert_eq!(err.to_string(), "Not found: Issue does not exist");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/3/myself")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let err = client(&server, ApiVersion::V3)
            .validate_connection()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthError);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_v2_search_paginates_by_start_at() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/rest/api/2/search")
            .match_query(Matcher::UrlEncoded("startAt".into(), "0".into()))
            .with_status(200)
            .with_body(r#"{"total":2,"issues":[{"key":"JAY-1","fields":{"summary":"one"}}]}"#)
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/rest/api/2/search")
            .match_query(Matcher::UrlEncoded("startAt".into(), "1".into()))
            .with_status(200)
            .with_body(r#"{"total":2,"issues":[{"key":"JAY-2","fields":{"summary":"two"}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let issues = client(&server, ApiVersion::V2)
            .search_issues("project = JAY")
            .await
            .unwrap();
        let keys: Vec<&str> = issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["JAY-1", "JAY-2"]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_v3_search_uses_jql_endpoint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/3/search/jql")
            .match_query(Matcher::UrlEncoded("jql".into(), "project = JAY".into()))
            .with_status(200)
            .with_body(r#"{"isLast":true,"issues":[{"key":"JAY-9","fields":{}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let issues = client(&server, ApiVersion::V3)
            .search_issues("project = JAY")
            .await
            .unwrap();
        assert_eq!(issues.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_v3_comment_is_sent_as_adf() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/api/3/issue/JAY-1/comment")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "body": {"type": "doc", "version": 1}
            })))
            .with_status(201)
            .with_body(
                r#"{"id":"10","author":{"displayName":"Me"},"body":{"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"hi"}]}]},"created":"now"}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let comment = client(&server, ApiVersion::V3)
            .add_comment("JAY-1", "hi")
            .await
            .unwrap();
        assert_eq!(comment.body, "hi");
        assert_eq!(comment.author, "Me");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_v2_comment_is_plain_and_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/api/2/issue/JAY-1/comment")
            .match_body(Matcher::Json(serde_json::json!({"body": "hi"})))
            .with_status(502)
            .expect(1)
            .create_async()
            .await;

        let err = client(&server, ApiVersion::V2)
            .add_comment("JAY-1", "hi")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_apply_transition_and_update_fields() {
        let mut server = Server::new_async().await;
        let transition = server
            .mock("POST", "/rest/api/2/issue/JAY-1/transitions")
            .match_body(Matcher::Json(serde_json::json!({"transition": {"id": "31"}})))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/rest/api/2/issue/JAY-1")
            .match_body(Matcher::Json(serde_json::json!({"fields": {"labels": ["a", "b"]}})))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let client = client(&server, ApiVersion::V2);
        client.apply_transition("JAY-1", "31").await.unwrap();
        client
            .update_fields(
                "JAY-1",
                &FieldMap::single("labels", FieldValue::List(vec!["a".into(), "b".into()])),
            )
            .await
            .unwrap();
        transition.assert_async().await;
        update.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_transitions() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/api/2/issue/JAY-1/transitions")
            .with_status(200)
            .with_body(r#"{"transitions":[{"id":"21","name":"Start","to":{"name":"In Progress"}}]}"#)
            .create_async()
            .await;

        let transitions = client(&server, ApiVersion::V2)
            .list_transitions("JAY-1")
            .await
            .unwrap();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].to_status, "In Progress");
    }

    #[test]
    fn test_from_config_requires_server_and_password() {
        let config = Config::default();
        assert!(matches!(
            JiraClient::from_config(&config),
            Err(ApiError::Configuration(_))
        ));

        let config = Config {
            server: Some("https://jira.example.com".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            JiraClient::from_config(&config),
            Err(ApiError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_config_secret_failure_is_fatal() {
        struct Broken;
        impl SecretFetcher for Broken {
            fn fetch(
                &self,
                source: crate::api::auth::SecretSource,
                path: &str,
            ) -> std::result::Result<String, crate::api::auth::SecretError> {
                let _ = source;
                Err(crate::api::auth::SecretError::Empty {
                    tool: "pass",
                    path: path.to_string(),
                })
            }
        }

        let config = Config {
            server: Some("https://jira.example.com".to_string()),
            password: Some("pass::jira".to_string()),
            ..Config::default()
        };
        let err = JiraClient::from_config_with(&config, &Broken).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SecretResolution);
    }

    #[test]
    fn test_from_config_picks_auth_by_version() {
        let config = Config {
            server: Some("https://jira.example.com".to_string()),
            user: Some("me@example.com".to_string()),
            password: Some("token".to_string()),
            api_version: ApiVersion::V3,
            ..Config::default()
        };
        let client = JiraClient::from_config(&config).unwrap();
        assert_eq!(client.auth.method(), crate::config::AuthMethod::Basic);
        assert_eq!(client.api_version(), ApiVersion::V3);
    }
}
