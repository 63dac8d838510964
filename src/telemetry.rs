//! Opt-in per-operation telemetry.
//!
//! Enabled by `JAYRAH_TUI_TELEMETRY=1|true|yes|on`. Events go to the
//! `jayrah_tui::telemetry` target, which [`crate::logging`] routes to
//! stderr only when the toggle is set.

use std::sync::OnceLock;
use std::time::Duration;

/// Environment toggle.
pub const TELEMETRY_ENV: &str = "JAYRAH_TUI_TELEMETRY";

const TARGET: &str = "jayrah_tui::telemetry";

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Whether a toggle value turns telemetry on.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Read the toggle from the environment. Later calls reuse the first answer.
pub fn enabled() -> bool {
    *ENABLED.get_or_init(|| {
        std::env::var(TELEMETRY_ENV)
            .map(|v| is_truthy(&v))
            .unwrap_or(false)
    })
}

/// Record one finished operation.
pub fn record(op: &str, key: &str, duration: Duration, error: Option<&str>) {
    if !enabled() {
        return;
    }
    let duration_ms = duration.as_millis() as u64;
    match error {
        None => tracing::info!(
            target: TARGET,
            op,
            key,
            status = "ok",
            duration_ms,
        ),
        Some(error) => tracing::info!(
            target: TARGET,
            op,
            key,
            status = "error",
            duration_ms,
            error,
        ),
    }
}

/// Record one HTTP exchange with the attempts the retry policy made.
pub fn record_request(method: &str, url: &str, attempts: u32, duration: Duration, ok: bool) {
    if enabled() {
        emit_request(method, url, attempts, duration, ok);
    }
}

fn emit_request(method: &str, url: &str, attempts: u32, duration: Duration, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    tracing::info!(
        target: TARGET,
        op = "http",
        method,
        url,
        attempts,
        status,
        duration_ms = duration.as_millis() as u64,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_request_event_carries_attempts() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            emit_request("GET", "https://jira.example.com/rest/api/2/myself", 3, Duration::from_millis(12), false);
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("jayrah_tui::telemetry"));
        assert!(output.contains("attempts=3"));
        assert!(output.contains("status=\"error\""));
    }

    #[test]
    fn test_truthy_values() {
        for v in ["1", "true", "YES", " on "] {
            assert!(is_truthy(v), "{v} should enable telemetry");
        }
        for v in ["", "0", "false", "off", "maybe"] {
            assert!(!is_truthy(v), "{v} should not enable telemetry");
        }
    }
}
