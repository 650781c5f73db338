use std::path::Path;

use similar::{ChangeTag, TextDiff};

/// Unified diff of `old` against `new`, labelled with `path`.
pub fn unified_diff(old: &str, new: &str, path: &Path) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut output = format!("--- a/{}\n+++ b/{}\n", path.display(), path.display());
    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        output.push_str(&hunk.to_string());
    }
    output
}

/// Count of inserted and deleted lines.
pub fn line_stats(old: &str, new: &str) -> (usize, usize) {
    TextDiff::from_lines(old, new)
        .iter_all_changes()
        .fold((0, 0), |(ins, del), change| match change.tag() {
            ChangeTag::Insert => (ins + 1, del),
            ChangeTag::Delete => (ins, del + 1),
            ChangeTag::Equal => (ins, del),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_has_headers_and_hunks() {
        let diff = unified_diff("a\nb\nc\n", "a\nB\nc\n", Path::new("debugger.md"));
        assert!(diff.starts_with("--- a/debugger.md\n+++ b/debugger.md\n"));
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+B\n"));
    }

    #[test]
    fn identical_text_has_no_hunks() {
        let diff = unified_diff("same\n", "same\n", Path::new("x.md"));
        assert_eq!(diff, "--- a/x.md\n+++ b/x.md\n");
        assert_eq!(line_stats("same\n", "same\n"), (0, 0));
    }

    #[test]
    fn stats_count_lines() {
        assert_eq!(line_stats("a\nb\n", "a\nc\nd\n"), (2, 1));
    }
}
