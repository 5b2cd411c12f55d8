//! Formatting helpers for user-facing error reports

use std::fmt::Display;

/// Render items as a bulleted list, one `  - item` per line
pub fn bulleted_list<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    items
        .into_iter()
        .map(|item| format!("  - {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render names as a bulleted list of `"name" <predicate>` lines
pub(crate) fn quoted_list(names: &[String], predicate: &str) -> String {
    bulleted_list(names.iter().map(|name| format!("\"{name}\" {predicate}")))
}

pub(crate) fn missing_path_list(paths: &[String]) -> String {
    bulleted_list(paths.iter().map(|path| format!("Path \"{path}\" does not exist")))
}

pub(crate) fn count(items: &[String]) -> usize {
    items.len()
}
