//! Keyword web search used when deep research yields nothing.
//!
//! Default backend is the DuckDuckGo HTML endpoint, scraped with `scraper`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use thiserror::Error;

const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search engine rate limited the request")]
    RateLimited,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search engine returned status {0}")]
    Status(u16),

    #[error("failed to parse search results: {0}")]
    Parse(String),
}

#[async_trait]
pub trait SearchEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError>;
}

pub struct DuckDuckGoSearch {
    client: Client,
}

impl DuckDuckGoSearch {
    pub fn new() -> Result<Self, SearchError> {
        Ok(Self {
            client: Client::builder()
                .timeout(SEARCH_TIMEOUT)
                .user_agent(USER_AGENT)
                .build()?,
        })
    }
}

#[async_trait]
impl SearchEngine for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        let resp = self
            .client
            .post(DUCKDUCKGO_HTML_URL)
            .form(&[("q", query)])
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await?;

        let status = resp.status().as_u16();
        // DuckDuckGo answers throttled clients with 202 and an anomaly page.
        if status == 429 || status == 202 {
            return Err(SearchError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(SearchError::Status(status));
        }

        let body = resp.text().await?;

        // Parse in spawn_blocking to avoid !Send scraper types
        tokio::task::spawn_blocking(move || parse_results(&body, limit))
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))
    }
}

fn parse_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let result_sel = Selector::parse("div.result").unwrap();
    let title_sel = Selector::parse("a.result__a").unwrap();
    let snippet_sel = Selector::parse(".result__snippet").unwrap();

    let mut hits = Vec::new();
    for result in document.select(&result_sel) {
        if hits.len() >= limit {
            break;
        }
        // Sponsored results carry a separate class and point at ad trackers.
        if result.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        let Some(link) = result.select(&title_sel).next() else {
            continue;
        };

        let title = collapse_whitespace(&link.text().collect::<String>());
        let url = link
            .value()
            .attr("href")
            .map(resolve_result_url)
            .unwrap_or_default();
        let snippet = result
            .select(&snippet_sel)
            .next()
            .map(|s| collapse_whitespace(&s.text().collect::<String>()))
            .unwrap_or_default();

        if title.is_empty() && snippet.is_empty() {
            continue;
        }
        hits.push(SearchHit {
            title,
            snippet,
            url,
        });
    }
    hits
}

/// Unwraps DuckDuckGo redirect links (`//duckduckgo.com/l/?uddg=<target>`).
fn resolve_result_url(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    match Url::parse(&absolute) {
        Ok(url) if url.path() == "/l/" => url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())
            .unwrap_or(absolute),
        _ => absolute,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Converts search hits into free-text documents for ranking.
pub fn build_documents(hits: &[SearchHit]) -> Vec<String> {
    hits.iter()
        .map(|hit| {
            format!(
                "Title: {}\nSnippet: {}\nURL: {}",
                hit.title, hit.snippet, hit.url
            )
            .trim()
            .to_string()
        })
        .collect()
}
