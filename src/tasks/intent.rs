//! Requests the UI hands to the worker pipeline.

use std::fmt;

use crate::api::types::{FieldMap, Transition};
use crate::cache::SCOPE_KEY;
use crate::config::QuerySource;

/// Everything the state machine can ask the worker layer to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    LoadIssues(QuerySource),
    FetchDetail(String),
    FetchComments(String),
    FetchTransitions(String),
    SubmitComment { key: String, body: String },
    ApplyTransition { key: String, transition: Transition },
    UpdateField { key: String, update: FieldUpdate },
    OpenInBrowser(String),
    LoadBoards,
    LoadCustomFields,
}

/// A confirmed edit: the fields to send and a label for status messages.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub label: String,
    pub fields: FieldMap,
}

/// Cacheable read kinds. Each has its own cache map and debounce slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FetchKind {
    Issues,
    Detail,
    Comments,
    Transitions,
    Boards,
    CustomFields,
}

impl FetchKind {
    pub fn label(&self) -> &'static str {
        match self {
            FetchKind::Issues => "issues",
            FetchKind::Detail => "detail",
            FetchKind::Comments => "comments",
            FetchKind::Transitions => "transitions",
            FetchKind::Boards => "boards",
            FetchKind::CustomFields => "custom_fields",
        }
    }
}

/// The `(kind, key)` pair sequence ids and in-flight tracking are kept for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestTarget {
    pub kind: FetchKind,
    pub key: String,
}

impl RequestTarget {
    pub fn new(kind: FetchKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }

    /// Target for whole-scope kinds such as the issue list.
    pub fn scope(kind: FetchKind) -> Self {
        Self::new(kind, SCOPE_KEY)
    }
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.label(), self.key)
    }
}

/// A read, ready to schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub target: RequestTarget,
    /// Two requests for one target coalesce only when this matches.
    pub fingerprint: String,
    /// Set for [`FetchKind::Issues`].
    pub source: Option<QuerySource>,
}

/// A user-confirmed write. Runs exactly once per submission.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Comment { key: String, body: String },
    Transition { key: String, transition: Transition },
    Field { key: String, update: FieldUpdate },
}

impl WriteRequest {
    pub fn key(&self) -> &str {
        match self {
            WriteRequest::Comment { key, .. }
            | WriteRequest::Transition { key, .. }
            | WriteRequest::Field { key, .. } => key,
        }
    }
}

/// How the pipeline treats an intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Fetch(FetchRequest),
    Write(WriteRequest),
    Open(String),
}

impl Intent {
    pub fn classify(self) -> Classified {
        let fetch = |kind, key: String| {
            Classified::Fetch(FetchRequest {
                target: RequestTarget::new(kind, key.clone()),
                fingerprint: key,
                source: None,
            })
        };

        match self {
            Intent::LoadIssues(source) => Classified::Fetch(FetchRequest {
                target: RequestTarget::scope(FetchKind::Issues),
                fingerprint: source.describe(),
                source: Some(source),
            }),
            Intent::FetchDetail(key) => fetch(FetchKind::Detail, key),
            Intent::FetchComments(key) => fetch(FetchKind::Comments, key),
            Intent::FetchTransitions(key) => fetch(FetchKind::Transitions, key),
            Intent::LoadBoards => fetch(FetchKind::Boards, SCOPE_KEY.to_string()),
            Intent::LoadCustomFields => fetch(FetchKind::CustomFields, SCOPE_KEY.to_string()),
            Intent::SubmitComment { key, body } => {
                Classified::Write(WriteRequest::Comment { key, body })
            }
            Intent::ApplyTransition { key, transition } => {
                Classified::Write(WriteRequest::Transition { key, transition })
            }
            Intent::UpdateField { key, update } => {
                Classified::Write(WriteRequest::Field { key, update })
            }
            Intent::OpenInBrowser(key) => Classified::Open(key),
        }
    }
}
