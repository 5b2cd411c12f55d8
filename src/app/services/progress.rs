//! Progress bars for long-running network passes
//!
//! Upload, rollback and link checking each walk a known number of items. A
//! hidden bar is used when progress output is disabled so callers never branch
//! on visibility.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Create a progress bar over `total` items
pub fn create_progress_bar(total: usize, message: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total as u64);
    match ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(e) => debug!("Falling back to default progress style: {}", e),
    }
    pb.set_message(message.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_still_counts() {
        let pb = create_progress_bar(3, "Uploading", false);
        assert!(pb.is_hidden());
        pb.inc(2);
        assert_eq!(pb.position(), 2);
    }

    #[test]
    fn test_visible_bar_has_length() {
        let pb = create_progress_bar(5, "Checking links", true);
        assert_eq!(pb.length(), Some(5));
        pb.finish_and_clear();
    }
}
