//! Embedding similarity ranking of retrieved documents.

use std::cmp::Ordering;

use async_trait::async_trait;

use crate::llm_client::{LlmClient, LlmError};

/// Maximum number of documents kept after ranking.
pub const TOP_K: usize = 5;

/// Anything that can turn a batch of texts into vectors, one per text, in order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}

#[async_trait]
impl Embedder for LlmClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        LlmClient::embed(self, texts).await
    }
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 when either vector has zero norm. Components past the end of
/// the shorter vector are ignored.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&av, &bv) in a.iter().zip(b.iter()) {
        let (av, bv) = (f64::from(av), f64::from(bv));
        dot += av * bv;
        norm_a += av * av;
        norm_b += bv * bv;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Ranks `docs` against `query` and keeps the best [`TOP_K`].
///
/// Documents and query are embedded in one batched call. Ordering is by
/// descending similarity; equal scores keep their input order.
pub async fn rank_documents(
    embedder: &dyn Embedder,
    docs: Vec<String>,
    query: &str,
) -> Result<Vec<String>, LlmError> {
    if docs.is_empty() {
        return Ok(Vec::new());
    }

    let mut inputs = docs.clone();
    inputs.push(query.to_string());

    let embeddings = embedder.embed(&inputs).await?;
    if embeddings.len() != inputs.len() {
        return Err(LlmError::EmbeddingCount {
            expected: inputs.len(),
            got: embeddings.len(),
        });
    }

    let (doc_embeddings, query_embedding) = embeddings.split_at(docs.len());
    let query_embedding = &query_embedding[0];

    let mut scored: Vec<(f64, String)> = docs
        .into_iter()
        .zip(doc_embeddings)
        .map(|(doc, emb)| (cosine_similarity(query_embedding, emb), doc))
        .collect();

    // sort_by is stable, so ties stay in input order
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.truncate(TOP_K);

    Ok(scored.into_iter().map(|(_, doc)| doc).collect())
}
