use chrono::DateTime;
use tn_core::SearchResult;

/// Returned in place of a context when there is nothing to assemble.
pub const NO_CONTEXT: &str = "No relevant news found.";
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";
pub const SUMMARY_CHARS: usize = 200;

/// `YYYY-MM-DD HH:MM` in UTC, or the raw value when it is not a valid instant.
pub fn format_published_at(epoch_seconds: i64) -> String {
    DateTime::from_timestamp(epoch_seconds, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| epoch_seconds.to_string())
}

pub fn render_block(result: &SearchResult) -> String {
    let doc = &result.document;
    let summary: String = doc.summary.chars().take(SUMMARY_CHARS).collect();
    format!(
        "[{}] {} ({})\n{}...\nURL: {}",
        doc.ticker,
        doc.title,
        format_published_at(doc.published_at),
        summary,
        doc.url
    )
}

/// Greedy, order-preserving packing of ranked results into at most
/// `max_chars` characters (separators included). Stops at the first block
/// that does not fit; blocks are never cut.
pub fn assemble(results: &[SearchResult], max_chars: usize) -> String {
    if results.is_empty() {
        return NO_CONTEXT.to_string();
    }

    let separator_len = BLOCK_SEPARATOR.chars().count();
    let mut blocks = Vec::new();
    let mut total = 0;

    for result in results {
        let block = render_block(result);
        let cost = block.chars().count() + if blocks.is_empty() { 0 } else { separator_len };
        if total + cost > max_chars {
            break;
        }
        total += cost;
        blocks.push(block);
    }

    blocks.join(BLOCK_SEPARATOR)
}
