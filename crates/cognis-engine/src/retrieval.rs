//! Reasoning-trace retrieval: embed the incoming query, rank stored
//! traces by `cognis_core::combined_score`, and mark whichever one is
//! picked as reused.

use cognis_types::{Id, ReasoningTrace};

use crate::Lifecycle;

#[derive(Debug, Clone)]
pub struct TraceCandidate {
    pub trace: ReasoningTrace,
    pub similarity: f64,
    pub score: f64,
}

impl Lifecycle {
    /// Find the best matching trace for `query`, if any clears
    /// `min_similarity`. Returns `None` without error when no embedder is
    /// configured — retrieval degrades to "always distill fresh" rather
    /// than failing the caller.
    pub async fn retrieve_trace(&self, query: &str) -> crate::Result<Option<TraceCandidate>> {
        let Some(embedder) = &self.embedder else {
            return Ok(None);
        };

        let query_embedding = match embedder.embed(query).await {
            Ok(vector) => vector,
            Err(err) => {
                tracing::warn!(error = %err, "embedding the retrieval query failed, skipping trace reuse");
                return Ok(None);
            }
        };

        let now = cognis_types::ids::epoch_seconds();
        let candidates = self.rank_candidates(&query_embedding, now)?;
        let Some(best) = candidates.into_iter().next() else {
            return Ok(None);
        };

        self.traces.mark_reused(&best.trace.id, cognis_types::ids::epoch_seconds())?;
        Ok(Some(best))
    }

    fn rank_candidates(&self, query_embedding: &[f32], now: i64) -> crate::Result<Vec<TraceCandidate>> {
        let mut candidates: Vec<TraceCandidate> = self
            .traces
            .all_with_embeddings()?
            .into_iter()
            .filter_map(|trace| {
                let embedding = trace.query_embedding.as_ref()?;
                let similarity = cognis_core::cosine_similarity(query_embedding, embedding);
                if similarity < self.config.min_similarity {
                    return None;
                }
                let quality = cognis_core::quality_score(&trace, now);
                let score = cognis_core::combined_score(similarity, quality);
                Some(TraceCandidate { trace, similarity, score })
            })
            .collect();

        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(candidates)
    }

    pub fn persist_trace(&self, trace: &ReasoningTrace) -> crate::Result<()> {
        self.traces.insert(trace).map_err(Into::into)
    }

    /// Run the pruning pass: drop traces unused for at least
    /// `max_age_seconds`, with `success_score` below `min_score`, that
    /// have never been reused. The caller is responsible for keeping
    /// `max_age_seconds` at or above 24h.
    pub fn prune_traces(&self, now: i64, max_age_seconds: i64, min_score: f64) -> crate::Result<u64> {
        let cutoff = now - max_age_seconds;
        self.traces.prune(cutoff, min_score).map_err(Into::into)
    }

    pub fn get_trace(&self, id: &Id) -> crate::Result<Option<ReasoningTrace>> {
        self.traces.get(id).map_err(Into::into)
    }
}

/// Minimum age, in seconds, below which `prune_traces` must never delete a
/// trace regardless of score.
pub const MIN_PRUNE_AGE_SECONDS: i64 = 24 * 60 * 60;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Lifecycle};
    use async_trait::async_trait;
    use cognis_core::Embedder;
    use cognis_index::Database;
    use std::sync::Arc;

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, String> {
            Ok(self.0.clone())
        }
    }

    fn lifecycle_with_embedder(vector: Vec<f32>) -> Lifecycle {
        let db = Arc::new(Database::open_in_memory().unwrap());
        Lifecycle::new(db, Config::default()).with_embedder(Arc::new(FixedEmbedder(vector)))
    }

    #[tokio::test]
    async fn retrieval_picks_the_highest_combined_score_above_the_similarity_floor() {
        let lifecycle = lifecycle_with_embedder(vec![1.0, 0.0, 0.0]);

        let mut weak_match = ReasoningTrace::new("low similarity but great outcome");
        weak_match.query_embedding = Some(vec![0.0, 1.0, 0.0]);
        weak_match.success_score = 1.0;
        lifecycle.persist_trace(&weak_match).unwrap();

        let mut strong_match = ReasoningTrace::new("near identical query");
        strong_match.query_embedding = Some(vec![0.99, 0.01, 0.0]);
        strong_match.success_score = 0.8;
        lifecycle.persist_trace(&strong_match).unwrap();

        let result = lifecycle.retrieve_trace("near identical query").await.unwrap().unwrap();
        assert_eq!(result.trace.id, strong_match.id);
        assert_eq!(lifecycle.get_trace(&strong_match.id).unwrap().unwrap().reused_count, 1);
    }

    #[tokio::test]
    async fn no_embedder_configured_degrades_to_no_retrieval() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let lifecycle = Lifecycle::new(db, Config::default());
        let result = lifecycle.retrieve_trace("anything").await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn pruning_respects_the_min_age_floor_via_the_caller_supplied_cutoff() {
        let lifecycle = lifecycle_with_embedder(vec![1.0]);
        let mut old = ReasoningTrace::new("ancient");
        old.last_used_at = 0;
        old.success_score = 0.1;
        lifecycle.traces.insert(&old).unwrap();

        let now = MIN_PRUNE_AGE_SECONDS * 2;
        let deleted = lifecycle.prune_traces(now, MIN_PRUNE_AGE_SECONDS, 0.5).unwrap();
        assert_eq!(deleted, 1);
    }
}
