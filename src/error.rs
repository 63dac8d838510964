//! Top-level error type for startup and terminal failures.
//!
//! Errors inside a running session become cache entries and status text;
//! only failures that stop the program surface as [`AppError`].

use thiserror::Error;

use crate::api::auth::SecretError;
use crate::api::error::ApiError;
use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

impl AppError {
    pub fn terminal(msg: impl Into<String>) -> Self {
        AppError::Terminal(msg.into())
    }

    /// A one-line explanation for stderr.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not determine the configuration directory.".to_string()
                }
                ConfigError::ReadError { path, .. } => {
                    format!("Could not read configuration file {}.", path.display())
                }
                ConfigError::ParseError { path, message } => {
                    format!("Configuration file {} is invalid: {}", path.display(), message)
                }
                ConfigError::MissingServer => "No Jira server configured (jira_server).".to_string(),
                ConfigError::MissingPassword => {
                    "No Jira password or token configured (jira_password).".to_string()
                }
                ConfigError::BoardNotFound(name) => format!("Board '{}' is not configured.", name),
                ConfigError::NoBoards => "No boards are configured.".to_string(),
                ConfigError::EmptyQuery => "The JQL query is empty.".to_string(),
            },
            AppError::Api(e) => match e {
                ApiError::Unauthorized => {
                    "Authentication failed. Check jira_user and jira_password.".to_string()
                }
                ApiError::Forbidden(_) => "Access denied by the Jira server.".to_string(),
                ApiError::Network(_) => {
                    "Could not reach the Jira server. Check the URL and network.".to_string()
                }
                ApiError::Secret(SecretError::Spawn { .. }) => {
                    "Could not run the password manager for jira_password.".to_string()
                }
                ApiError::Secret(secret) => format!("Could not resolve jira_password: {}", secret),
                ApiError::Configuration(msg) => format!("Invalid client configuration: {}", msg),
                other => other.to_string(),
            },
            AppError::Io(e) => format!("A file operation failed: {}", e),
            AppError::Terminal(msg) => format!("Terminal error: {}", msg),
        }
    }

    /// Errors that mean the session could not start at all.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Api(ApiError::Unauthorized)
                | AppError::Api(ApiError::Forbidden(_))
                | AppError::Api(ApiError::Secret(_))
                | AppError::Api(ApiError::Configuration(_))
                | AppError::Terminal(_)
        )
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Api(e) if e.is_retryable())
    }

    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::NoConfigDir)
            | AppError::Config(ConfigError::ReadError { .. }) => {
                Some("Create ~/.config/jayrah/config.yaml or run with --mock.")
            }
            AppError::Config(ConfigError::MissingServer | ConfigError::MissingPassword) => {
                Some("Set jira_server and jira_password in the general section of the config.")
            }
            AppError::Api(ApiError::Unauthorized) => {
                Some("For Jira Cloud use an API token with basic auth; for Server use a personal access token with auth_method: bearer.")
            }
            AppError::Api(ApiError::Secret(_)) => {
                Some("Check that pass::/passage:: entries exist and the tool is on PATH.")
            }
            AppError::Api(ApiError::Network(_)) => Some("Check jira_server and your network connection."),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
