use std::fmt::Write;
use tn_core::{AnalysisResult, Citation};
use tn_inference::analysis::context::format_published_at;

fn render_citation(out: &mut String, number: usize, citation: &Citation) {
    let _ = writeln!(out, "{}. [{}] {}", number, citation.ticker, citation.title);
    let _ = writeln!(out, "   Date: {}", format_published_at(citation.published_at));
    let _ = writeln!(out, "   URL: {}", citation.url);
    if citation.score > 0.0 {
        let _ = writeln!(out, "   Relevance: {:.3}", citation.score);
    }
}

/// Human-readable report for the terminal.
pub fn render(result: &AnalysisResult) -> String {
    let mut out = String::new();
    match result {
        AnalysisResult::Failed { error } => {
            let _ = writeln!(out, "❌ Error: {}", error);
        }
        AnalysisResult::Answered {
            answer,
            citations,
            total_results,
        } => {
            let _ = writeln!(out, "{}", answer);
            if !citations.is_empty() {
                let _ = writeln!(out, "\n📚 Sources:");
                for (i, citation) in citations.iter().enumerate() {
                    render_citation(&mut out, i + 1, citation);
                }
            }
            let _ = writeln!(out, "\n📊 Total articles found: {}", total_results);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation(title: &str, published_at: i64, score: f32) -> Citation {
        Citation {
            title: title.to_string(),
            url: format!("https://news.test/{}", title.to_lowercase()),
            published_at,
            ticker: "AAPL".to_string(),
            score,
        }
    }

    #[test]
    fn test_render_error() {
        let report = render(&AnalysisResult::failed("generation failed"));
        assert_eq!(report, "❌ Error: generation failed\n");
    }

    #[test]
    fn test_render_answer_with_sources() {
        let result = AnalysisResult::answered(
            "Apple beat estimates.",
            vec![citation("Beat", 1714681800, 0.91234), citation("Old", 0, 0.0)],
            12,
        );
        let report = render(&result);

        assert!(report.starts_with("Apple beat estimates.\n"));
        assert!(report.contains("1. [AAPL] Beat\n   Date: 2024-05-02 20:30\n   URL: https://news.test/beat\n   Relevance: 0.912\n"));
        assert!(report.contains("2. [AAPL] Old\n   Date: 1970-01-01 00:00\n   URL: https://news.test/old\n"));
        assert_eq!(report.matches("Relevance").count(), 1);
        assert!(report.ends_with("📊 Total articles found: 12\n"));
    }

    #[test]
    fn test_render_empty_answer_and_bad_dates() {
        let report = render(&AnalysisResult::empty("no recent news found for ZZZZ in the last 45 days"));
        assert!(!report.contains("Sources"));
        assert!(report.contains("Total articles found: 0"));

        let result = AnalysisResult::answered("x", vec![citation("Far", i64::MAX, 0.5)], 1);
        assert!(render(&result).contains(&format!("   Date: {}\n", i64::MAX)));
    }
}
