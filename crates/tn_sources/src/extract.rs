use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tn_core::{Error, Result};

pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedArticle {
    pub text: Option<String>,
    pub summary: Option<String>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Source(format!("Invalid selector {}: {}", css, e)))
}

fn paragraphs(document: &Html, css: &str) -> Result<Vec<String>> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .map(|el| el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
        .collect())
}

fn meta_content(document: &Html, css: &str) -> Result<Option<String>> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty()))
}

/// Pull the readable body and a short description out of an article page.
pub fn extract(html: &str) -> Result<ExtractedArticle> {
    let document = Html::parse_document(html);

    let mut body = paragraphs(&document, "article p")?;
    if body.is_empty() {
        body = paragraphs(&document, "p")?;
    }
    let text = if body.is_empty() { None } else { Some(body.join("\n\n")) };

    let summary = match meta_content(&document, "meta[name='description']")? {
        Some(summary) => Some(summary),
        None => meta_content(&document, "meta[property='og:description']")?,
    };

    Ok(ExtractedArticle { text, summary })
}

pub struct ArticleExtractor {
    client: Client,
    timeout: Duration,
}

impl ArticleExtractor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<ExtractedArticle> {
        let html = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        extract(&html)
    }
}

impl Default for ArticleExtractor {
    fn default() -> Self {
        Self::new(Duration::from_secs(20))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_prefers_article_paragraphs() {
        let html = r#"
            <html><head>
                <meta name="description" content=" Apple beat estimates. ">
            </head><body>
                <nav><p>Markets menu</p></nav>
                <article>
                    <p>Apple reported   strong iPhone sales.</p>
                    <p></p>
                    <p>Services revenue hit a record.</p>
                </article>
            </body></html>
        "#;
        let article = extract(html).unwrap();
        assert_eq!(
            article.text.as_deref(),
            Some("Apple reported strong iPhone sales.\n\nServices revenue hit a record.")
        );
        assert_eq!(article.summary.as_deref(), Some("Apple beat estimates."));
    }

    #[test]
    fn test_extract_falls_back_to_any_paragraph_and_og_description() {
        let html = r#"
            <html><head><meta property="og:description" content="OG summary"></head>
            <body><div><p>Only paragraph.</p></div></body></html>
        "#;
        let article = extract(html).unwrap();
        assert_eq!(article.text.as_deref(), Some("Only paragraph."));
        assert_eq!(article.summary.as_deref(), Some("OG summary"));
    }

    #[test]
    fn test_extract_empty_page() {
        let article = extract("<html><body><div>No paragraphs</div></body></html>").unwrap();
        assert_eq!(article, ExtractedArticle::default());
    }
}
