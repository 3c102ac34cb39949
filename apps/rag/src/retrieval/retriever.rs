//! ContextRetriever: cached, tiered company context lookup.
//!
//! Algorithm for `retrieve(company, role)`:
//! 1. key = `company::role_label`; a live cache entry is returned with no outbound calls
//! 2. strategies are tried in order until one yields a non-empty result,
//!    which is cached and returned
//! 3. a configuration error aborts immediately; an upstream failure is logged
//!    and skipped, unless strict mode is on and no strategy remains after it
//! 4. exhausting the list yields an empty result, which is not cached

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::retrieval::cache::ContextCache;
use crate::retrieval::search::SearchEngine;
use crate::retrieval::strategy::{DeepResearchStrategy, RetrievalStrategy, SearchRankStrategy};
use crate::retrieval::{cache_key, role_label, RetrievalError};

pub struct ContextRetriever {
    cache: ContextCache,
    strategies: Vec<Box<dyn RetrievalStrategy>>,
    strict: bool,
}

impl ContextRetriever {
    pub fn new(cache: ContextCache, strategies: Vec<Box<dyn RetrievalStrategy>>, strict: bool) -> Self {
        Self {
            cache,
            strategies,
            strict,
        }
    }

    /// Wires the strategy list from the retrieval flags in `config`.
    pub fn from_config(config: &Config, llm: Arc<LlmClient>, search: Arc<dyn SearchEngine>) -> Self {
        let mut strategies: Vec<Box<dyn RetrievalStrategy>> = Vec::new();
        if config.use_deep_research {
            strategies.push(Box::new(DeepResearchStrategy::new(
                llm.clone(),
                config.deep_research_model.clone(),
                config.fallback_model().to_string(),
            )));
        }
        if config.allow_search_fallback {
            strategies.push(Box::new(SearchRankStrategy::new(search, llm)));
        }

        Self::new(
            ContextCache::new(config.cache_ttl),
            strategies,
            config.strict_deep_research,
        )
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn retrieve(
        &self,
        company_name: &str,
        job_title: &str,
    ) -> Result<Vec<String>, RetrievalError> {
        let role = role_label(job_title);
        let key = cache_key(company_name, role);

        if let Some(hit) = self.cache.get(&key) {
            info!(
                "context cache hit for key={} age={}s docs={}",
                key,
                hit.age.as_secs(),
                hit.documents.len()
            );
            return Ok(hit.documents);
        }

        for (idx, strategy) in self.strategies.iter().enumerate() {
            match strategy.retrieve(company_name, role).await {
                Ok(docs) if !docs.is_empty() => {
                    info!(
                        "{} produced {} context documents for key={}",
                        strategy.name(),
                        docs.len(),
                        key
                    );
                    self.cache.insert(&key, &docs);
                    return Ok(docs);
                }
                Ok(_) => {
                    info!("{} produced no context for key={}", strategy.name(), key);
                }
                Err(err @ RetrievalError::Configuration(_)) => return Err(err),
                Err(err) => {
                    warn!("{} failed for key={} error={}", strategy.name(), key, err);
                    let is_last = idx + 1 == self.strategies.len();
                    if self.strict && is_last {
                        return Err(err);
                    }
                }
            }
        }

        Ok(Vec::new())
    }
}
