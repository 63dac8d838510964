//! Jira API client and types.
//!
//! This module provides the interface for communicating with the Jira REST
//! API, plus the [`IssueBackend`] seam the worker pipeline calls through.

pub mod adf;
pub mod auth;
pub mod backend;
mod client;
pub mod error;
pub mod jql;
pub mod mock;
pub mod types;

pub use backend::IssueBackend;
pub use client::{JiraClient, RetryPolicy};
pub use error::{ApiError, ErrorKind, RequestError};
pub use mock::MockBackend;
