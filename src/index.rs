//! In-memory vector index with maximal-marginal-relevance retrieval.
//!
//! Built once per session from the full segment collection and immutable
//! afterwards: no incremental insert or delete. Vector search is
//! brute-force cosine similarity, which is fine at this scale — the
//! 300-row cap bounds the corpus well under a few thousand segments.
//!
//! MMR re-ranking keeps the result set diverse: repetitive traffic (say,
//! three hundred near-identical DNS queries) would otherwise crowd out
//! everything else in the retrieved context.

use anyhow::{bail, Result};

use crate::chunk::Segment;
use crate::embedding::{cosine_similarity, Embedder};

/// Relevance/diversity trade-off for MMR. 1.0 is pure relevance,
/// 0.0 pure diversity.
const MMR_LAMBDA: f32 = 0.5;

/// Immutable similarity-searchable index over a segment collection.
pub struct VectorIndex {
    segments: Vec<Segment>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Embed every segment and build the index.
    ///
    /// All-or-nothing: any embedding failure propagates and no index is
    /// produced. Batches follow `batch_size` to keep request bodies
    /// bounded.
    pub async fn build(
        segments: Vec<Segment>,
        embedder: &dyn Embedder,
        batch_size: usize,
    ) -> Result<VectorIndex> {
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let batch_size = batch_size.max(1);

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(batch_size) {
            let mut embedded = embedder.embed(batch).await?;
            if embedded.len() != batch.len() {
                bail!(
                    "embedding provider returned {} vectors for {} inputs",
                    embedded.len(),
                    batch.len()
                );
            }
            vectors.append(&mut embedded);
        }

        Ok(VectorIndex { segments, vectors })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Maximal-marginal-relevance search.
    ///
    /// Takes the `fetch_k` segments most similar to the query, then
    /// iteratively selects up to `k` of them, each time picking the
    /// candidate with the best balance of query relevance against
    /// similarity to the already-selected set.
    pub fn mmr_search(&self, query_vec: &[f32], k: usize, fetch_k: usize) -> Result<Vec<&Segment>> {
        if fetch_k < k {
            bail!("fetch_k ({}) must be >= k ({})", fetch_k, k);
        }
        if k == 0 || self.segments.is_empty() {
            return Ok(Vec::new());
        }

        // Candidate pool: top fetch_k by cosine similarity to the query.
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query_vec, v)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(fetch_k);

        let mut selected: Vec<usize> = Vec::with_capacity(k.min(scored.len()));
        let mut remaining: Vec<(usize, f32)> = scored;

        while selected.len() < k && !remaining.is_empty() {
            let mut best_pos = 0;
            let mut best_score = f32::NEG_INFINITY;

            for (pos, &(idx, query_sim)) in remaining.iter().enumerate() {
                let max_selected_sim = selected
                    .iter()
                    .map(|&s| cosine_similarity(&self.vectors[idx], &self.vectors[s]))
                    .fold(f32::NEG_INFINITY, f32::max);
                let redundancy = if selected.is_empty() {
                    0.0
                } else {
                    max_selected_sim
                };
                let mmr = MMR_LAMBDA * query_sim - (1.0 - MMR_LAMBDA) * redundancy;
                if mmr > best_score {
                    best_score = mmr;
                    best_pos = pos;
                }
            }

            let (idx, _) = remaining.remove(best_pos);
            selected.push(idx);
        }

        Ok(selected.into_iter().map(|i| &self.segments[i]).collect())
    }
}
