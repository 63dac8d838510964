//! Configuration loading for jayrah-tui.
//!
//! The config file lives at `~/.config/jayrah/config.yaml` unless
//! `JAYRAH_CONFIG_FILE` points elsewhere. YAML is the native format; a path
//! ending in `.toml` is read as TOML with the same schema:
//!
//! ```yaml
//! general:
//!   jira_server: jira.example.com
//!   jira_user: me@example.com
//!   jira_password: pass::jira/token
//!   api_version: 3
//! boards:
//!   - name: myissue
//!     jql: assignee = currentUser() AND resolution = Unresolved
//!     order_by: updated
//! custom_fields:
//!   - name: Story Points
//!     field: customfield_10016
//!     type: number
//! pipeline:
//!   debounce_ms: 120
//! ```
//!
//! Connection keys may also sit at the top level; `general:` wins.

mod board;
mod settings;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::jql;

pub use board::{BoardConfig, CustomFieldSpec, FieldType, QuerySource, DEFAULT_BOARD_NAME};
pub use settings::PipelineSettings;

/// Environment variable overriding the config file location.
pub const CONFIG_FILE_ENV: &str = "JAYRAH_CONFIG_FILE";

/// Errors that can occur while loading or querying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the home directory")]
    NoConfigDir,

    #[error("failed to read config at {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config format in {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("jira_server is not configured")]
    MissingServer,

    #[error("jira_password is not configured")]
    MissingPassword,

    #[error("board '{0}' not found in configuration")]
    BoardNotFound(String),

    #[error("no boards configured")]
    NoBoards,

    #[error("JQL query cannot be empty")]
    EmptyQuery,
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// REST API generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    /// Server/Data Center style API.
    #[default]
    V2,
    /// Cloud API with ADF rich text.
    V3,
}

impl ApiVersion {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "3" => ApiVersion::V3,
            _ => ApiVersion::V2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V2 => "2",
            ApiVersion::V3 => "3",
        }
    }

    /// The auth scheme used when none is configured.
    pub fn default_auth(&self) -> AuthMethod {
        match self {
            ApiVersion::V2 => AuthMethod::Bearer,
            ApiVersion::V3 => AuthMethod::Basic,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Basic,
    Bearer,
}

impl AuthMethod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(AuthMethod::Basic),
            "bearer" => Some(AuthMethod::Bearer),
            _ => None,
        }
    }
}

/// Resolved configuration.
#[derive(Clone, Default)]
pub struct Config {
    pub server: Option<String>,
    pub user: Option<String>,
    /// Raw password/token; may be a `pass::`/`passage::`/`keyring::` reference.
    pub password: Option<String>,
    pub api_version: ApiVersion,
    pub auth_override: Option<AuthMethod>,
    pub insecure: bool,
    pub boards: Vec<BoardConfig>,
    pub custom_fields: Vec<CustomFieldSpec>,
    pub pipeline: PipelineSettings,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server", &self.server)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .field("auth_override", &self.auth_override)
            .field("insecure", &self.insecure)
            .field("boards", &self.boards)
            .field("custom_fields", &self.custom_fields)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VersionValue {
    Number(i64),
    Text(String),
}

impl VersionValue {
    fn to_version(&self) -> ApiVersion {
        match self {
            VersionValue::Number(n) => ApiVersion::parse(&n.to_string()),
            VersionValue::Text(s) => ApiVersion::parse(s),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConnection {
    jira_server: Option<String>,
    jira_user: Option<String>,
    jira_password: Option<String>,
    api_version: Option<VersionValue>,
    auth_method: Option<String>,
    insecure: Option<bool>,
    #[serde(default)]
    custom_fields: Vec<board::RawCustomField>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    general: RawConnection,
    #[serde(default)]
    boards: Vec<board::RawBoard>,
    #[serde(default)]
    pipeline: Option<PipelineSettings>,
    #[serde(flatten)]
    top: RawConnection,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Add `https://` when no scheme is given and drop trailing slashes.
pub fn normalize_server(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{}", trimmed))
    }
}

/// The config file path, honoring `JAYRAH_CONFIG_FILE`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_FILE_ENV) {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(home.join(".config").join("jayrah").join("config.yaml"))
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };
        debug!(path = %path.display(), "Loading configuration");

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&contents, &path)?;

        info!(
            boards = config.boards.len(),
            custom_fields = config.custom_fields.len(),
            api_version = %config.api_version,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parse file contents; the path picks the format and labels errors.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let raw: RawConfig = if is_toml {
            toml::from_str(contents).map_err(|e| e.to_string())
        } else if contents.trim().is_empty() {
            Ok(RawConfig::default())
        } else {
            serde_yaml::from_str(contents).map_err(|e| e.to_string())
        }
        .map_err(|message| ConfigError::ParseError {
            path: path.to_path_buf(),
            message,
        })?;

        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let RawConfig {
            general,
            boards,
            pipeline,
            top,
        } = raw;

        let mut boards: Vec<BoardConfig> =
            boards.into_iter().filter_map(|b| b.into_board()).collect();
        if boards.is_empty() {
            boards.push(BoardConfig::default_board());
        }

        let field_source = if top.custom_fields.is_empty() {
            general.custom_fields
        } else {
            top.custom_fields
        };

        Self {
            server: non_empty(general.jira_server.or(top.jira_server))
                .and_then(|s| normalize_server(&s)),
            user: non_empty(general.jira_user.or(top.jira_user)),
            password: non_empty(general.jira_password.or(top.jira_password)),
            api_version: general
                .api_version
                .or(top.api_version)
                .map(|v| v.to_version())
                .unwrap_or_default(),
            auth_override: non_empty(general.auth_method.or(top.auth_method))
                .and_then(|m| AuthMethod::parse(&m)),
            insecure: general.insecure.or(top.insecure).unwrap_or(false),
            boards,
            custom_fields: field_source
                .into_iter()
                .filter_map(|f| f.into_spec())
                .collect(),
            pipeline: pipeline.unwrap_or_default().normalized(),
        }
    }

    /// Explicit override, else the API version default.
    pub fn auth_method(&self) -> AuthMethod {
        self.auth_override
            .unwrap_or_else(|| self.api_version.default_auth())
    }

    /// Look up a board by name, or the first board for `None`.
    pub fn board(&self, name: Option<&str>) -> Result<&BoardConfig> {
        match name {
            Some(name) => self
                .boards
                .iter()
                .find(|b| b.name == name)
                .ok_or_else(|| ConfigError::BoardNotFound(name.to_string())),
            None => self.boards.first().ok_or(ConfigError::NoBoards),
        }
    }

    /// The JQL sent for a list source, with ordering and `currentUser()` applied.
    pub fn resolve_jql(&self, source: &QuerySource) -> Result<String> {
        let jql = match source {
            QuerySource::Query(raw) => {
                let query = raw.trim();
                if query.is_empty() {
                    return Err(ConfigError::EmptyQuery);
                }
                query.to_string()
            }
            QuerySource::Board(name) => {
                let board = self.board(name.as_deref())?;
                jql::with_order_by(&board.jql, board.order_by.as_deref())
            }
        };
        Ok(jql::resolve_current_user(&jql, self.user.as_deref()))
    }

    /// Web URL of an issue.
    pub fn browse_url(&self, key: &str) -> Result<String> {
        let server = self.server.as_deref().ok_or(ConfigError::MissingServer)?;
        Ok(format!("{}/browse/{}", server, key))
    }
}
