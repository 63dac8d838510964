//! Authentication handling for the Jira API.
//!
//! Credentials are either Basic (user + password/token) or Bearer (token
//! only). The secret itself may be written literally in the configuration
//! or as an indirect reference that is resolved once at startup:
//!
//! - `pass::<path>` runs `pass show <path>`
//! - `passage::<path>` runs `passage show <path>`
//! - `keyring::<entry>` reads the OS keyring

use std::fmt;
use std::process::Command;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;
use tracing::debug;

use crate::config::AuthMethod;

/// The keyring service name used for `keyring::` references.
const KEYRING_SERVICE: &str = "jayrah-tui";

/// Errors raised while resolving an indirect secret.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret reference '{0}' has an empty path")]
    EmptyPath(String),

    #[error("failed to run `{tool}`: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("`{tool} show {path}` failed ({status}): {stderr}")]
    CommandFailed {
        tool: &'static str,
        path: String,
        status: String,
        stderr: String,
    },

    #[error("`{tool} show {path}` returned an empty secret")]
    Empty { tool: &'static str, path: String },

    #[error("keyring error: {0}")]
    Keyring(String),
}

/// Where an indirect secret lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Pass,
    Passage,
    Keyring,
}

impl SecretSource {
    fn tool(&self) -> &'static str {
        match self {
            SecretSource::Pass => "pass",
            SecretSource::Passage => "passage",
            SecretSource::Keyring => "keyring",
        }
    }
}

/// A password/token value as written in configuration.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretRef {
    Literal(String),
    Indirect { source: SecretSource, path: String },
}

impl SecretRef {
    /// Parse a raw configuration value.
    pub fn parse(raw: &str) -> Self {
        let prefixes = [
            ("pass::", SecretSource::Pass),
            ("passage::", SecretSource::Passage),
            ("keyring::", SecretSource::Keyring),
        ];
        for (prefix, source) in prefixes {
            if let Some(path) = raw.strip_prefix(prefix) {
                return SecretRef::Indirect {
                    source,
                    path: path.trim().to_string(),
                };
            }
        }
        SecretRef::Literal(raw.to_string())
    }

    /// Produce the secret value, running the external lookup when needed.
    pub fn resolve(&self, fetcher: &dyn SecretFetcher) -> Result<String, SecretError> {
        match self {
            SecretRef::Literal(value) => Ok(value.clone()),
            SecretRef::Indirect { source, path } => {
                if path.is_empty() {
                    return Err(SecretError::EmptyPath(format!("{}::", source.tool())));
                }
                debug!(source = source.tool(), path = %path, "Resolving indirect secret");
                fetcher.fetch(*source, path)
            }
        }
    }
}

impl fmt::Debug for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretRef::Literal(_) => f.write_str("SecretRef::Literal(<redacted>)"),
            SecretRef::Indirect { source, path } => f
                .debug_struct("SecretRef::Indirect")
                .field("source", source)
                .field("path", path)
                .finish(),
        }
    }
}

/// Looks up indirect secrets.
pub trait SecretFetcher {
    fn fetch(&self, source: SecretSource, path: &str) -> Result<String, SecretError>;
}

/// Resolves secrets through `pass`/`passage` subprocesses and the OS keyring.
#[derive(Debug, Default)]
pub struct SystemSecrets;

impl SecretFetcher for SystemSecrets {
    fn fetch(&self, source: SecretSource, path: &str) -> Result<String, SecretError> {
        if source == SecretSource::Keyring {
            let entry = keyring::Entry::new(KEYRING_SERVICE, path)
                .map_err(|e| SecretError::Keyring(format!("failed to access keyring: {}", e)))?;
            return entry
                .get_password()
                .map_err(|e| SecretError::Keyring(format!("failed to read '{}': {}", path, e)));
        }

        let tool = source.tool();
        let output = Command::new(tool)
            .arg("show")
            .arg(path)
            .output()
            .map_err(|source| SecretError::Spawn { tool, source })?;

        if !output.status.success() {
            return Err(SecretError::CommandFailed {
                tool,
                path: path.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        secret_from_stdout(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            SecretError::Empty {
                tool,
                path: path.to_string(),
            }
        })
    }
}

/// The whole captured output, trimmed, is the secret.
fn secret_from_stdout(stdout: &str) -> Option<String> {
    let secret = stdout.trim();
    (!secret.is_empty()).then(|| secret.to_string())
}

/// Authentication credentials for Jira.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    Basic { user: String, header: String },
    Bearer { header: String },
}

impl Auth {
    /// Basic credentials. The secret is encoded immediately and not kept.
    pub fn basic(user: &str, secret: &str) -> Self {
        let encoded = BASE64.encode(format!("{}:{}", user, secret).as_bytes());
        Auth::Basic {
            user: user.to_string(),
            header: format!("Basic {}", encoded),
        }
    }

    /// Bearer credentials (personal access token).
    pub fn bearer(token: &str) -> Self {
        Auth::Bearer {
            header: format!("Bearer {}", token),
        }
    }

    /// Build credentials for the configured method.
    ///
    /// Basic auth needs a user; bearer ignores it.
    pub fn for_method(
        method: AuthMethod,
        user: Option<&str>,
        secret: &str,
    ) -> Result<Self, String> {
        match method {
            AuthMethod::Basic => {
                let user = user
                    .filter(|u| !u.trim().is_empty())
                    .ok_or_else(|| "basic auth requires jira_user".to_string())?;
                Ok(Auth::basic(user, secret))
            }
            AuthMethod::Bearer => Ok(Auth::bearer(secret)),
        }
    }

    /// The complete `Authorization` header value.
    pub fn header_value(&self) -> &str {
        match self {
            Auth::Basic { header, .. } | Auth::Bearer { header } => header,
        }
    }

    pub fn method(&self) -> AuthMethod {
        match self {
            Auth::Basic { .. } => AuthMethod::Basic,
            Auth::Bearer { .. } => AuthMethod::Bearer,
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Basic { user, .. } => f
                .debug_struct("Auth::Basic")
                .field("user", user)
                .field("header", &"<redacted>")
                .finish(),
            Auth::Bearer { .. } => f
                .debug_struct("Auth::Bearer")
                .field("header", &"<redacted>")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeSecrets {
        calls: RefCell<Vec<(SecretSource, String)>>,
        answer: Option<String>,
    }

    impl FakeSecrets {
        fn answering(value: &str) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                answer: Some(value.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                answer: None,
            }
        }
    }

    impl SecretFetcher for FakeSecrets {
        fn fetch(&self, source: SecretSource, path: &str) -> Result<String, SecretError> {
            self.calls.borrow_mut().push((source, path.to_string()));
            self.answer.clone().ok_or_else(|| SecretError::CommandFailed {
                tool: source.tool(),
                path: path.to_string(),
                status: "exit status: 1".to_string(),
                stderr: "not in the password store".to_string(),
            })
        }
    }

    #[test]
    fn test_parse_secret_references() {
        assert_eq!(
            SecretRef::parse("pass::jira/token"),
            SecretRef::Indirect {
                source: SecretSource::Pass,
                path: "jira/token".to_string()
            }
        );
        assert_eq!(
            SecretRef::parse("passage::work/jira"),
            SecretRef::Indirect {
                source: SecretSource::Passage,
                path: "work/jira".to_string()
            }
        );
        assert_eq!(
            SecretRef::parse("keyring::jira"),
            SecretRef::Indirect {
                source: SecretSource::Keyring,
                path: "jira".to_string()
            }
        );
        assert_eq!(
            SecretRef::parse("plain-token"),
            SecretRef::Literal("plain-token".to_string())
        );
    }

    #[test]
    fn test_literal_secret_skips_fetcher() {
        let fetcher = FakeSecrets::failing();
        let value = SecretRef::parse("hunter2").resolve(&fetcher).unwrap();
        assert_eq!(value, "hunter2");
        assert!(fetcher.calls.borrow().is_empty());
    }

    #[test]
    fn test_indirect_secret_uses_fetcher() {
        let fetcher = FakeSecrets::answering("s3cret");
        let value = SecretRef::parse("passage::jira").resolve(&fetcher).unwrap();
        assert_eq!(value, "s3cret");
        assert_eq!(
            fetcher.calls.borrow().as_slice(),
            &[(SecretSource::Passage, "jira".to_string())]
        );
    }

    #[test]
    fn test_failed_secret_command_is_an_error() {
        let fetcher = FakeSecrets::failing();
        let err = SecretRef::parse("pass::missing").resolve(&fetcher).unwrap_err();
        assert!(matches!(err, SecretError::CommandFailed { tool: "pass", .. }));
    }

    #[test]
    fn test_empty_reference_path_is_rejected() {
        let fetcher = FakeSecrets::answering("unused");
        let err = SecretRef::parse("pass::  ").resolve(&fetcher).unwrap_err();
        assert!(matches!(err, SecretError::EmptyPath(_)));
        assert!(fetcher.calls.borrow().is_empty());
    }

    #[test]
    fn test_secret_from_stdout_keeps_every_line() {
        assert_eq!(
            secret_from_stdout("tok123\n"),
            Some("tok123".to_string())
        );
        assert_eq!(
            secret_from_stdout("tok-part1\ntok-part2\n"),
            Some("tok-part1\ntok-part2".to_string())
        );
        assert_eq!(secret_from_stdout("  \n"), None);
        assert_eq!(secret_from_stdout(""), None);
    }

    #[test]
    fn test_basic_auth_header() {
        let auth = Auth::basic("user@example.com", "token123");
        // base64("user@example.com:token123")
        assert_eq!(
            auth.header_value(),
            "Basic dXNlckBleGFtcGxlLmNvbTp0b2tlbjEyMw=="
        );
        assert_eq!(auth.method(), AuthMethod::Basic);
    }

    #[test]
    fn test_bearer_auth_header() {
        let auth = Auth::bearer("pat-xyz");
        assert_eq!(auth.header_value(), "Bearer pat-xyz");
    }

    #[test]
    fn test_basic_requires_user() {
        assert!(Auth::for_method(AuthMethod::Basic, None, "t").is_err());
        assert!(Auth::for_method(AuthMethod::Basic, Some(" "), "t").is_err());
        assert!(Auth::for_method(AuthMethod::Bearer, None, "t").is_ok());
    }

    #[test]
    fn test_debug_does_not_leak_secrets() {
        let auth = Auth::basic("me", "very-secret-token");
        let debug = format!("{:?}", auth);
        assert!(!debug.contains("very-secret-token"));
        assert!(!debug.contains(auth.header_value()));

        let secret = SecretRef::parse("very-secret-token");
        assert!(!format!("{:?}", secret).contains("very-secret-token"));
    }
}
