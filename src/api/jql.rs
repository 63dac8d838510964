//! JQL helpers applied before a query leaves the client.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

fn current_user_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            RegexBuilder::new(r"currentUser\s*\(\s*\)")
                .case_insensitive(true)
                .build()
                .ok()
        })
        .as_ref()
}

/// Replace every `currentUser()` call with the configured user identity.
///
/// Plain identities (letters, digits, `@ . _ - +`) are inserted as-is;
/// anything else is double-quoted with embedded quotes escaped. Without a
/// user the query is returned untouched and the server resolves it.
pub fn resolve_current_user(jql: &str, user: Option<&str>) -> String {
    let Some(user) = user.map(str::trim).filter(|u| !u.is_empty()) else {
        return jql.to_string();
    };
    let Some(pattern) = current_user_pattern() else {
        return jql.to_string();
    };

    let replacement = quote_if_needed(user);
    pattern
        .replace_all(jql, regex::NoExpand(&replacement))
        .into_owned()
}

fn quote_if_needed(value: &str) -> String {
    let plain = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-' | '+'));
    if plain {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

/// Append `ORDER BY <field>` unless the query already orders its results.
pub fn with_order_by(jql: &str, order_by: Option<&str>) -> String {
    let jql = jql.trim();
    match order_by.map(str::trim).filter(|o| !o.is_empty()) {
        Some(order) if !jql.to_ascii_lowercase().contains("order by") => {
            format!("{} ORDER BY {}", jql, order)
        }
        _ => jql.to_string(),
    }
}
