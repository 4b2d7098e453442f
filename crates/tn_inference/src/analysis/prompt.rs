/// Which of the three question shapes a run answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Synthesised "what's new" question about one ticker.
    Latest,
    /// Caller-supplied question about one ticker.
    Custom,
    /// Caller-supplied question over every ticker.
    CrossTicker,
}

const LATEST_SYSTEM_PROMPT: &str = "You are a cautious markets analyst. Use ONLY the provided context. \
Summarize the latest news for the company, infer what's going on, and cite URLs. \
Prefer concrete, recent facts; avoid speculation. Keep it brief.";

const CUSTOM_SYSTEM_PROMPT: &str = "You are a cautious markets analyst. Use ONLY the provided context. \
Answer the user's specific question about the company based on the news. \
Prefer concrete, recent facts; avoid speculation. Keep it brief.";

const CROSS_TICKER_SYSTEM_PROMPT: &str = "You are a cautious markets analyst. Use ONLY the provided context. \
Answer the user's question based on the news from various companies. \
Prefer concrete, recent facts; avoid speculation. Keep it brief.";

pub fn default_question(ticker: &str) -> String {
    format!("What are the latest news for {} and what do they imply?", ticker)
}

pub fn system_prompt(mode: QueryMode) -> &'static str {
    match mode {
        QueryMode::Latest => LATEST_SYSTEM_PROMPT,
        QueryMode::Custom => CUSTOM_SYSTEM_PROMPT,
        QueryMode::CrossTicker => CROSS_TICKER_SYSTEM_PROMPT,
    }
}

pub fn user_prompt(question: &str, context: &str) -> String {
    format!("Question: {}\n\nContext:\n{}", question, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_stay_grounded() {
        for mode in [QueryMode::Latest, QueryMode::Custom, QueryMode::CrossTicker] {
            let prompt = system_prompt(mode);
            assert!(prompt.contains("Use ONLY the provided context"));
            assert!(prompt.contains("avoid speculation"));
            assert!(prompt.contains("Keep it brief"));
        }
    }

    #[test]
    fn test_user_prompt_layout() {
        assert_eq!(
            user_prompt(&default_question("AAPL"), "ctx"),
            "Question: What are the latest news for AAPL and what do they imply?\n\nContext:\nctx"
        );
    }
}
