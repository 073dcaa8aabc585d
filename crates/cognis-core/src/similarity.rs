//! Vector similarity, the retrieval-time quality blend, and the combined
//! score used when picking a reasoning trace to reuse.

use cognis_types::{Outcome, ReasoningTrace};

/// Cosine similarity between two equal-length embeddings. Returns 0.0 if
/// either vector has zero magnitude or the lengths differ, rather than
/// dividing by zero or panicking — callers treat a missing embedding as
/// "no match" rather than an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Weight applied to similarity in the combined retrieval score.
pub const SIMILARITY_WEIGHT: f64 = 0.6;
/// Weight applied to a trace's quality blend in the combined score.
pub const QUALITY_WEIGHT: f64 = 0.4;

/// Combined score used to rank candidate traces for reuse: a blend of how
/// close the query is to the trace's own query, and how good a reuse
/// candidate the trace is on its own merits (see `quality_score`).
pub fn combined_score(similarity: f64, quality: f64) -> f64 {
    SIMILARITY_WEIGHT * similarity + QUALITY_WEIGHT * quality
}

/// Weight of a trace's outcome within the quality blend.
pub const OUTCOME_WEIGHT: f64 = 0.4;
/// Weight of step-count efficiency within the quality blend.
pub const EFFICIENCY_WEIGHT: f64 = 0.2;
/// Weight of recency within the quality blend.
pub const RECENCY_WEIGHT: f64 = 0.15;
/// Weight of reuse count within the quality blend.
pub const REUSE_WEIGHT: f64 = 0.15;
/// Weight of run duration within the quality blend.
pub const DURATION_WEIGHT: f64 = 0.1;

/// How long, in seconds, before a trace's recency term fully decays to 0.
const RECENCY_HORIZON_SECONDS: i64 = 30 * 24 * 60 * 60;
/// Reuse count at and above which the reuse term saturates at 1.0.
const REUSE_SATURATION_COUNT: f64 = 10.0;

/// Fewer steps score higher. Shared with `cognis_engine::collector`, which
/// folds the same buckets into a trace's own `success_score` as a delta
/// rather than a 0..=1 score.
pub fn step_count_efficiency(step_count: usize) -> f64 {
    match step_count {
        0..=3 => 1.0,
        4..=6 => 0.75,
        7..=10 => 0.5,
        _ => 0.25,
    }
}

fn outcome_score(outcome: Outcome) -> f64 {
    match outcome {
        Outcome::Success => 1.0,
        Outcome::Partial => 0.5,
        Outcome::Failed | Outcome::Interrupted => 0.0,
    }
}

fn recency_score(last_used_at: i64, now: i64) -> f64 {
    let age = (now - last_used_at).max(0);
    (1.0 - age as f64 / RECENCY_HORIZON_SECONDS as f64).clamp(0.0, 1.0)
}

fn reuse_score(reused_count: u64) -> f64 {
    (reused_count as f64 / REUSE_SATURATION_COUNT).min(1.0)
}

fn duration_score(duration_ms: u64) -> f64 {
    match duration_ms {
        0..=2_000 => 1.0,
        2_001..=5_000 => 0.7,
        5_001..=15_000 => 0.4,
        _ => 0.2,
    }
}

/// Retrieval-time quality blend for a stored trace: how good a reuse
/// candidate it is, independent of how closely it matches the current
/// query. Fed as `combined_score`'s second argument.
pub fn quality_score(trace: &ReasoningTrace, now: i64) -> f64 {
    OUTCOME_WEIGHT * outcome_score(trace.outcome)
        + EFFICIENCY_WEIGHT * step_count_efficiency(trace.steps.len())
        + RECENCY_WEIGHT * recency_score(trace.last_used_at, now)
        + REUSE_WEIGHT * reuse_score(trace.reused_count)
        + DURATION_WEIGHT * duration_score(trace.duration_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = [1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-9);
    }

    #[test]
    fn opposite_vectors_have_similarity_negative_one() {
        let a = [1.0, 0.0];
        let b = [-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn mismatched_lengths_yield_zero() {
        let a = [1.0, 2.0];
        let b = [1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn zero_vector_yields_zero() {
        let a = [0.0, 0.0];
        let b = [1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn combined_score_blends_similarity_and_quality() {
        assert!((combined_score(1.0, 1.0) - 1.0).abs() < 1e-9);
        assert!((combined_score(1.0, 0.0) - 0.6).abs() < 1e-9);
        assert!((combined_score(0.0, 1.0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn step_count_efficiency_rewards_fewer_steps() {
        assert_eq!(step_count_efficiency(2), 1.0);
        assert_eq!(step_count_efficiency(5), 0.75);
        assert_eq!(step_count_efficiency(9), 0.5);
        assert_eq!(step_count_efficiency(20), 0.25);
    }

    #[test]
    fn quality_score_for_a_fresh_unreused_successful_trace_is_everything_but_reuse() {
        let mut trace = ReasoningTrace::new("q");
        trace.outcome = Outcome::Success;
        trace.duration_ms = 500;
        trace.last_used_at = 1_000;
        let quality = quality_score(&trace, 1_000);
        let expected = OUTCOME_WEIGHT + EFFICIENCY_WEIGHT + RECENCY_WEIGHT + DURATION_WEIGHT;
        assert!((quality - expected).abs() < 1e-9);
    }

    #[test]
    fn quality_score_decays_with_age_and_low_reuse() {
        let mut trace = ReasoningTrace::new("q");
        trace.outcome = Outcome::Success;
        trace.duration_ms = 500;
        trace.last_used_at = 0;
        let now = RECENCY_HORIZON_SECONDS * 2;
        let quality = quality_score(&trace, now);
        assert!(quality < 1.0 - RECENCY_WEIGHT + 1e-9);
    }

    #[test]
    fn quality_score_rewards_heavy_reuse() {
        let mut trace = ReasoningTrace::new("q");
        trace.outcome = Outcome::Success;
        trace.duration_ms = 500;
        trace.last_used_at = 1_000;
        trace.reused_count = 50;
        let quality = quality_score(&trace, 1_000);
        assert!((quality - 1.0).abs() < 1e-9);
    }

    #[test]
    fn failed_outcome_drags_quality_down() {
        let mut trace = ReasoningTrace::new("q");
        trace.outcome = Outcome::Failed;
        trace.duration_ms = 500;
        trace.last_used_at = 1_000;
        let quality = quality_score(&trace, 1_000);
        assert!(quality < 1.0 - OUTCOME_WEIGHT + 1e-9);
    }
}
