//! In-memory caches for fetched issue data.
//!
//! One [`CacheMap`] per entity kind, keyed by issue key (or [`SCOPE_KEY`]
//! for whole-scope entries such as the issue list). The caches live for a
//! single run. They are written only when worker results are applied and
//! read by the renderer.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::api::error::RequestError;
use crate::api::types::{Comment, Issue, IssueDetail, Transition};
use crate::config::{BoardConfig, CustomFieldSpec};

/// Key used for entries that cover a whole scope rather than one issue.
pub const SCOPE_KEY: &str = "*";

/// State of one cached value.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry<T> {
    /// A request is in flight.
    Loading,
    /// The value fetched at `fetched_at`.
    Loaded { value: T, fetched_at: Instant },
    /// The last request failed.
    Error(RequestError),
}

impl<T> CacheEntry<T> {
    pub fn loaded(value: T) -> Self {
        CacheEntry::Loaded {
            value,
            fetched_at: Instant::now(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, CacheEntry::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, CacheEntry::Loaded { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            CacheEntry::Loaded { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RequestError> {
        match self {
            CacheEntry::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Time since the value was fetched.
    pub fn age(&self) -> Option<Duration> {
        match self {
            CacheEntry::Loaded { fetched_at, .. } => Some(fetched_at.elapsed()),
            _ => None,
        }
    }

    /// Display icon for the entry state.
    pub fn icon(&self) -> &'static str {
        match self {
            CacheEntry::Loading => "…",
            CacheEntry::Loaded { .. } => "●",
            CacheEntry::Error(_) => "✗",
        }
    }
}

/// At most one entry per key.
#[derive(Debug, Clone)]
pub struct CacheMap<T> {
    entries: HashMap<String, CacheEntry<T>>,
}

impl<T> Default for CacheMap<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> CacheMap<T> {
    pub fn get(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut CacheEntry<T>> {
        self.entries.get_mut(key)
    }

    /// The loaded value for `key`, if any.
    pub fn value(&self, key: &str) -> Option<&T> {
        self.get(key).and_then(CacheEntry::value)
    }

    pub fn is_loaded(&self, key: &str) -> bool {
        self.get(key).map(CacheEntry::is_loaded).unwrap_or(false)
    }

    /// Overwrite whatever is stored for `key` with `Loading`.
    pub fn mark_loading(&mut self, key: &str) {
        trace!(key, "cache entry loading");
        self.entries.insert(key.to_string(), CacheEntry::Loading);
    }

    /// Store the outcome of a request.
    pub fn store(&mut self, key: &str, result: Result<T, RequestError>) {
        let entry = match result {
            Ok(value) => CacheEntry::loaded(value),
            Err(e) => CacheEntry::Error(e),
        };
        self.entries.insert(key.to_string(), entry);
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<T>> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All per-kind caches of one session.
#[derive(Debug, Default)]
pub struct Caches {
    /// The issue list of the active board or query, under [`SCOPE_KEY`].
    pub issues: CacheMap<Vec<Issue>>,
    pub details: CacheMap<IssueDetail>,
    pub comments: CacheMap<Vec<Comment>>,
    pub transitions: CacheMap<Vec<Transition>>,
    pub boards: CacheMap<Vec<BoardConfig>>,
    pub custom_fields: CacheMap<Vec<CustomFieldSpec>>,
}

impl Caches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything fetched for the current list (board switch, reload).
    ///
    /// Board and custom field metadata come from configuration and survive.
    pub fn clear_issue_data(&mut self) {
        self.issues.clear();
        self.details.clear();
        self.comments.clear();
        self.transitions.clear();
    }

    /// The loaded issue list, empty while loading or failed.
    pub fn issue_list(&self) -> &[Issue] {
        self.issues
            .value(SCOPE_KEY)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append a comment confirmed by the server.
    ///
    /// Only a loaded list is appended to. Returns false when the entry is
    /// missing, loading or failed.
    pub fn append_comment(&mut self, key: &str, comment: Comment) -> bool {
        match self.comments.get_mut(key) {
            Some(CacheEntry::Loaded { value, .. }) => {
                value.push(comment);
                true
            }
            _ => false,
        }
    }

    /// Patch one list row after a confirmed write.
    pub fn update_issue_row(&mut self, key: &str, update: impl FnOnce(&mut Issue)) {
        if let Some(CacheEntry::Loaded { value, .. }) = self.issues.get_mut(SCOPE_KEY) {
            if let Some(issue) = value.iter_mut().find(|i| i.key == key) {
                update(issue);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorKind;

    fn comment(id: &str) -> Comment {
        Comment {
            id: id.to_string(),
            author: "alice".to_string(),
            body: format!("body {}", id),
            created: "today".to_string(),
        }
    }

    fn issue(key: &str) -> Issue {
        Issue {
            key: key.to_string(),
            issue_type: "Task".to_string(),
            summary: "s".to_string(),
            status: "To Do".to_string(),
            assignee: "a".to_string(),
            reporter: "r".to_string(),
            created: "c".to_string(),
            updated: "u".to_string(),
        }
    }

    #[test]
    fn test_loading_overwrites_terminal_state() {
        let mut map: CacheMap<u32> = CacheMap::default();
        map.store("JAY-1", Ok(7));
        assert!(map.is_loaded("JAY-1"));
        assert_eq!(map.value("JAY-1"), Some(&7));

        map.mark_loading("JAY-1");
        assert!(map.get("JAY-1").unwrap().is_loading());
        assert_eq!(map.value("JAY-1"), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_error_entry_keeps_request_error() {
        let mut map: CacheMap<u32> = CacheMap::default();
        map.store(
            "JAY-1",
            Err(RequestError::new(ErrorKind::ClientError, "Not found")),
        );
        let entry = map.get("JAY-1").unwrap();
        assert!(!entry.is_loaded());
        assert_eq!(entry.error().unwrap().message, "Not found");
        assert_eq!(entry.icon(), "✗");
        assert!(entry.age().is_none());
    }

    #[test]
    fn test_append_comment_only_to_loaded_list() {
        let mut caches = Caches::new();
        assert!(!caches.append_comment("JAY-1", comment("1")));
        assert!(caches.comments.get("JAY-1").is_none());

        caches.comments.mark_loading("JAY-1");
        assert!(!caches.append_comment("JAY-1", comment("1")));

        caches.comments.store("JAY-1", Ok(vec![comment("1")]));
        assert!(caches.append_comment("JAY-1", comment("2")));
        let ids: Vec<&str> = caches
            .comments
            .value("JAY-1")
            .unwrap()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_update_issue_row() {
        let mut caches = Caches::new();
        caches.issues.store(SCOPE_KEY, Ok(vec![issue("JAY-1"), issue("JAY-2")]));
        caches.update_issue_row("JAY-2", |i| i.status = "Done".to_string());
        assert_eq!(caches.issue_list()[1].status, "Done");
        assert_eq!(caches.issue_list()[0].status, "To Do");
    }

    #[test]
    fn test_clear_issue_data_keeps_metadata() {
        let mut caches = Caches::new();
        caches.issues.store(SCOPE_KEY, Ok(vec![issue("JAY-1")]));
        caches.details.mark_loading("JAY-1");
        caches.boards.store(SCOPE_KEY, Ok(vec![BoardConfig::default_board()]));

        caches.clear_issue_data();
        assert!(caches.issue_list().is_empty());
        assert!(caches.details.is_empty());
        assert!(caches.boards.is_loaded(SCOPE_KEY));
    }
}
