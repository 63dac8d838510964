//! List filtering and search over visible rows.

use crate::api::types::Issue;

fn matches(issue: &Issue, needle: &str) -> bool {
    issue.summary.to_lowercase().contains(needle)
        || issue.key.to_lowercase().contains(needle)
        || issue.status.to_lowercase().contains(needle)
}

/// Indices of rows matching `filter`, in list order.
///
/// Case-insensitive substring match over summary, key and status. A blank
/// filter keeps every row.
pub fn visible_indices(issues: &[Issue], filter: &str) -> Vec<usize> {
    let needle = filter.trim().to_lowercase();
    if needle.is_empty() {
        return (0..issues.len()).collect();
    }
    issues
        .iter()
        .enumerate()
        .filter(|(_, issue)| matches(issue, &needle))
        .map(|(i, _)| i)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// Position within `visible` of the next row matching `query`, starting
/// after `from` and wrapping around. The current row is checked last.
pub fn find_match(
    issues: &[Issue],
    visible: &[usize],
    from: usize,
    query: &str,
    direction: SearchDirection,
) -> Option<usize> {
    let needle = query.trim().to_lowercase();
    let len = visible.len();
    if needle.is_empty() || len == 0 {
        return None;
    }
    let from = from.min(len - 1);
    (1..=len)
        .map(|step| match direction {
            SearchDirection::Forward => (from + step) % len,
            SearchDirection::Backward => (from + len - step % len) % len,
        })
        .find(|&pos| {
            visible
                .get(pos)
                .and_then(|&i| issues.get(i))
                .map(|issue| matches(issue, &needle))
                .unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(key: &str, summary: &str, status: &str) -> Issue {
        Issue {
            key: key.to_string(),
            issue_type: "Task".to_string(),
            summary: summary.to_string(),
            status: status.to_string(),
            assignee: "Zed".to_string(),
            reporter: "r".to_string(),
            created: "c".to_string(),
            updated: "u".to_string(),
        }
    }

    fn sample() -> Vec<Issue> {
        vec![
            issue("JAY-1", "Fix login", "Open"),
            issue("JAY-2", "Refactor cache", "In Progress"),
            issue("OPS-3", "Rotate keys", "Done"),
            issue("JAY-4", "Login page copy", "Open"),
        ]
    }

    #[test]
    fn test_filter_matches_summary_key_and_status() {
        let issues = sample();
        assert_eq!(visible_indices(&issues, "LOGIN"), vec![0, 3]);
        assert_eq!(visible_indices(&issues, "ops-"), vec![2]);
        assert_eq!(visible_indices(&issues, "progress"), vec![1]);
        // Assignee is not searched.
        assert!(visible_indices(&issues, "zed").is_empty());
    }

    #[test]
    fn test_filter_is_idempotent_and_clearing_restores_order() {
        let issues = sample();
        let once = visible_indices(&issues, "open");
        let twice = visible_indices(&issues, "open");
        assert_eq!(once, twice);
        assert_eq!(visible_indices(&issues, ""), vec![0, 1, 2, 3]);
        assert_eq!(visible_indices(&issues, "   "), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_find_match_wraps_both_ways() {
        let issues = sample();
        let visible = visible_indices(&issues, "");
        assert_eq!(
            find_match(&issues, &visible, 0, "login", SearchDirection::Forward),
            Some(3)
        );
        assert_eq!(
            find_match(&issues, &visible, 3, "login", SearchDirection::Forward),
            Some(0)
        );
        assert_eq!(
            find_match(&issues, &visible, 0, "login", SearchDirection::Backward),
            Some(3)
        );
        assert_eq!(
            find_match(&issues, &visible, 1, "rotate", SearchDirection::Backward),
            Some(2)
        );
    }

    #[test]
    fn test_find_match_only_current_row() {
        let issues = sample();
        let visible = visible_indices(&issues, "");
        assert_eq!(
            find_match(&issues, &visible, 2, "rotate", SearchDirection::Forward),
            Some(2)
        );
        assert_eq!(find_match(&issues, &visible, 0, "nothing", SearchDirection::Forward), None);
        assert_eq!(find_match(&issues, &[], 0, "login", SearchDirection::Forward), None);
    }
}
