//! Per-source status derivation.
//!
//! Shared by both processors. Whole-source failures never reach this point:
//! they short-circuit to [`ProcessingSummary::into_failed`].

use crate::models::{ProcessingSummary, SourceKind, SourceStatus};

fn stats(summary: &ProcessingSummary, limit: usize) -> String {
    let mut s = format!(
        "{} found, {} considered, {} processed, {} new, {} skipped",
        summary.items_found,
        summary.items_considered,
        summary.items_processed,
        summary.new_items_added,
        summary.items_skipped
    );
    if summary.items_found > summary.items_considered {
        s.push_str(&format!(
            " (limited to {} by the article limit of {})",
            summary.items_considered, limit
        ));
    }
    s
}

/// Status and message for a source whose items were processed.
///
/// `limit` is the cap that was applied to the item list.
pub fn derive_status(summary: &ProcessingSummary, limit: usize) -> (SourceStatus, String) {
    if !summary.errors.is_empty() {
        let n = summary.errors.len();
        return (
            SourceStatus::PartialSuccess,
            format!(
                "Completed with {} error{}: {}",
                n,
                if n == 1 { "" } else { "s" },
                stats(summary, limit)
            ),
        );
    }

    if summary.items_found == 0 && summary.items_considered == 0 {
        return (SourceStatus::Success, "Success: no items found".to_string());
    }

    if summary.source_kind() == SourceKind::Rss
        && summary.items_considered == 0
        && summary.items_found > 0
    {
        return (
            SourceStatus::Success,
            format!(
                "Success: {} items found, all excluded by the article limit of {}",
                summary.items_found, limit
            ),
        );
    }

    (SourceStatus::Success, format!("Success: {}", stats(summary, limit)))
}

/// Stamp status, message and end time onto a processed summary.
pub fn finish_summary(mut summary: ProcessingSummary, limit: usize) -> ProcessingSummary {
    let (status, message) = derive_status(&summary, limit);
    summary.status = status;
    summary.message = message;
    summary.finished_at = chrono::Utc::now();
    summary
}
