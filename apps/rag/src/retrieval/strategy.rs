//! Retrieval strategies, the ordered tiers `ContextRetriever` walks through.
//!
//! A strategy returns `Ok(vec![])` when it has nothing to offer and an error
//! only for failures the retriever may need to surface (see `RetrievalError`).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::llm_client::prompts::fill_template;
use crate::llm_client::LlmError;
use crate::retrieval::deep_research::{run_deep_research, Researcher};
use crate::retrieval::prompts::{RANKING_QUERY, SEARCH_QUERY_TEMPLATES};
use crate::retrieval::ranking::{rank_documents, Embedder};
use crate::retrieval::search::{build_documents, SearchEngine, SearchError, SearchHit};
use crate::retrieval::RetrievalError;

/// Results requested from the search engine per query.
pub const SEARCH_RESULT_LIMIT: usize = 8;

#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn retrieve(
        &self,
        company_name: &str,
        role_label: &str,
    ) -> Result<Vec<String>, RetrievalError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Deep research
// ────────────────────────────────────────────────────────────────────────────

pub struct DeepResearchStrategy {
    researcher: Arc<dyn Researcher>,
    model: String,
    fallback_model: String,
}

impl DeepResearchStrategy {
    pub const NAME: &'static str = "deep_research";

    pub fn new(researcher: Arc<dyn Researcher>, model: String, fallback_model: String) -> Self {
        Self {
            researcher,
            model,
            fallback_model,
        }
    }
}

#[async_trait]
impl RetrievalStrategy for DeepResearchStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn retrieve(
        &self,
        company_name: &str,
        role_label: &str,
    ) -> Result<Vec<String>, RetrievalError> {
        if company_name.trim().is_empty() {
            return Ok(Vec::new());
        }

        let report = run_deep_research(
            self.researcher.as_ref(),
            company_name,
            role_label,
            &self.model,
            &self.fallback_model,
        )
        .await
        .map_err(|e| RetrievalError::from_llm(Self::NAME, e))?;

        Ok(vec![report])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Search + embedding rank
// ────────────────────────────────────────────────────────────────────────────

pub struct SearchRankStrategy {
    search: Arc<dyn SearchEngine>,
    embedder: Arc<dyn Embedder>,
}

impl SearchRankStrategy {
    pub const NAME: &'static str = "search_rank";

    pub fn new(search: Arc<dyn SearchEngine>, embedder: Arc<dyn Embedder>) -> Self {
        Self { search, embedder }
    }

    /// Runs every query in order; a rate limit stops the remaining queries.
    async fn collect_hits(&self, company_name: &str, role_label: &str) -> (Vec<SearchHit>, bool) {
        let mut hits = Vec::new();
        for query in build_search_queries(company_name, role_label) {
            match self.search.search(&query, SEARCH_RESULT_LIMIT).await {
                Ok(found) => hits.extend(found),
                Err(SearchError::RateLimited) => {
                    warn!(
                        "{} rate limited for query={}",
                        self.search.name(),
                        query
                    );
                    return (hits, true);
                }
                Err(e) => {
                    warn!(
                        "{} search failed for query={} error={}",
                        self.search.name(),
                        query,
                        e
                    );
                }
            }
        }
        (hits, false)
    }
}

#[async_trait]
impl RetrievalStrategy for SearchRankStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn retrieve(
        &self,
        company_name: &str,
        role_label: &str,
    ) -> Result<Vec<String>, RetrievalError> {
        info!(
            "{} search start company={} role={}",
            self.search.name(),
            company_name,
            role_label
        );

        let (hits, rate_limited) = self.collect_hits(company_name, role_label).await;
        if hits.is_empty() {
            if rate_limited {
                warn!("{} rate limited; continuing without external context", self.search.name());
            } else {
                warn!("{} returned no results; continuing without external context", self.search.name());
            }
            return Ok(Vec::new());
        }

        let docs = build_documents(&hits);
        match rank_documents(self.embedder.as_ref(), docs, RANKING_QUERY).await {
            Ok(ranked) => Ok(ranked),
            Err(LlmError::MissingApiKey) => {
                Err(RetrievalError::from_llm(Self::NAME, LlmError::MissingApiKey))
            }
            Err(e) => {
                warn!("embedding rank failed; continuing without external context error={e}");
                Ok(Vec::new())
            }
        }
    }
}

pub fn build_search_queries(company_name: &str, role_label: &str) -> Vec<String> {
    SEARCH_QUERY_TEMPLATES
        .iter()
        .map(|template| fill_template(template, &[("company", company_name), ("role", role_label)]))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::retrieval::deep_research::tests::{api_error, ScriptedResearcher};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Search engine returning a fixed outcome and counting calls.
    pub(crate) struct FakeSearch {
        outcome: Mutex<Option<Result<Vec<SearchHit>, SearchError>>>,
        pub(crate) calls: AtomicUsize,
    }

    impl FakeSearch {
        pub(crate) fn with_hits(hits: Vec<SearchHit>) -> Self {
            Self {
                outcome: Mutex::new(Some(Ok(hits))),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn rate_limited() -> Self {
            Self {
                outcome: Mutex::new(Some(Err(SearchError::RateLimited))),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchEngine for FakeSearch {
        fn name(&self) -> &str {
            "fake"
        }

        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchHit>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.lock().unwrap().take().unwrap_or(Ok(Vec::new()))
        }
    }

    /// Scores documents by how many times they contain "価値観".
    pub(crate) struct KeywordEmbedder {
        pub(crate) calls: AtomicUsize,
    }

    impl KeywordEmbedder {
        pub(crate) fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (docs, _query) = texts.split_at(texts.len() - 1);
            let mut vectors: Vec<Vec<f32>> = docs
                .iter()
                .map(|d| vec![d.matches("価値観").count() as f32, 1.0])
                .collect();
            vectors.push(vec![1.0, 0.0]);
            Ok(vectors)
        }
    }

    struct KeylessEmbedder;

    #[async_trait]
    impl Embedder for KeylessEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            Err(LlmError::MissingApiKey)
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            Err(api_error())
        }
    }

    pub(crate) fn hit(title: &str, snippet: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            snippet: snippet.to_string(),
            url: format!("https://{}.example", title.to_lowercase()),
        }
    }

    #[test]
    fn test_search_queries_include_company_and_role() {
        let queries = build_search_queries("Acme", "Engineer");
        assert_eq!(queries, vec!["Acme Engineer 求める人物像 大切にしている価値観".to_string()]);
    }

    #[test]
    fn test_search_queries_keep_braces_in_company_name() {
        let queries = build_search_queries("{role}", "Engineer");
        assert_eq!(queries, vec!["{role} Engineer 求める人物像 大切にしている価値観".to_string()]);
    }

    #[tokio::test]
    async fn test_deep_research_blank_company_skips_call() {
        let researcher = Arc::new(ScriptedResearcher::new(vec![Ok("unused".to_string())]));
        let strategy = DeepResearchStrategy::new(
            researcher.clone(),
            "primary".to_string(),
            "fallback".to_string(),
        );
        let docs = strategy.retrieve("   ", "指定なし").await.unwrap();
        assert!(docs.is_empty());
        assert!(researcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_deep_research_returns_single_document() {
        let researcher = Arc::new(ScriptedResearcher::new(vec![Ok("report".to_string())]));
        let strategy = DeepResearchStrategy::new(
            researcher,
            "primary".to_string(),
            "fallback".to_string(),
        );
        let docs = strategy.retrieve("Acme", "指定なし").await.unwrap();
        assert_eq!(docs, vec!["report".to_string()]);
    }

    #[tokio::test]
    async fn test_deep_research_failure_is_upstream_error() {
        let researcher = Arc::new(ScriptedResearcher::new(vec![Err(api_error()), Err(api_error())]));
        let strategy = DeepResearchStrategy::new(
            researcher,
            "primary".to_string(),
            "fallback".to_string(),
        );
        let err = strategy.retrieve("Acme", "指定なし").await.unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Upstream {
                strategy: "deep_research",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_search_rank_orders_by_relevance() {
        let search = Arc::new(FakeSearch::with_hits(vec![
            hit("News", "決算発表"),
            hit("Recruit", "価値観 と 価値観"),
            hit("Blog", "価値観"),
        ]));
        let embedder = Arc::new(KeywordEmbedder::new());
        let strategy = SearchRankStrategy::new(search, embedder.clone());

        let docs = strategy.retrieve("Acme", "Engineer").await.unwrap();
        assert_eq!(docs.len(), 3);
        assert!(docs[0].starts_with("Title: Recruit"));
        assert!(docs[1].starts_with("Title: Blog"));
        assert!(docs[2].starts_with("Title: News"));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_rate_limit_returns_empty() {
        let search = Arc::new(FakeSearch::rate_limited());
        let embedder = Arc::new(KeywordEmbedder::new());
        let strategy = SearchRankStrategy::new(search, embedder.clone());

        let docs = strategy.retrieve("Acme", "Engineer").await.unwrap();
        assert!(docs.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_no_results_returns_empty() {
        let search = Arc::new(FakeSearch::with_hits(Vec::new()));
        let strategy = SearchRankStrategy::new(search, Arc::new(KeywordEmbedder::new()));
        assert!(strategy.retrieve("Acme", "Engineer").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_missing_key_is_configuration_error() {
        let search = Arc::new(FakeSearch::with_hits(vec![hit("A", "a")]));
        let strategy = SearchRankStrategy::new(search, Arc::new(KeylessEmbedder));
        let err = strategy.retrieve("Acme", "Engineer").await.unwrap_err();
        assert!(matches!(err, RetrievalError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_search_embedding_failure_degrades_to_empty() {
        let search = Arc::new(FakeSearch::with_hits(vec![hit("A", "a")]));
        let strategy = SearchRankStrategy::new(search, Arc::new(FailingEmbedder));
        assert!(strategy.retrieve("Acme", "Engineer").await.unwrap().is_empty());
    }
}
