//! Maximal marginal relevance reranking.
//!
//! MMR = λ × sim(query, doc) − (1 − λ) × max(sim(doc, selected))
//!
//! λ = 1.0 reproduces plain similarity order, λ = 0.0 maximizes diversity.

/// A candidate result together with its embedding.
#[derive(Debug, Clone)]
pub struct MmrCandidate<T> {
    pub item: T,
    pub score: f32,
    pub vector: Vec<f32>,
}

/// Cosine similarity, 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Greedily select up to `k` candidates maximizing MMR.
///
/// Ties go to the earlier candidate, so callers should pass candidates in
/// descending relevance order.
pub fn mmr_rerank<T>(
    query: &[f32],
    candidates: Vec<MmrCandidate<T>>,
    k: usize,
    lambda: f32,
) -> Vec<MmrCandidate<T>> {
    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }

    let lambda = lambda.clamp(0.0, 1.0);
    let k = k.min(candidates.len());
    let relevance: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(query, &c.vector))
        .collect();

    let mut remaining: Vec<(f32, MmrCandidate<T>)> = relevance.into_iter().zip(candidates).collect();
    let mut selected: Vec<MmrCandidate<T>> = Vec::with_capacity(k);

    while selected.len() < k && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (idx, (rel, candidate)) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|s| cosine_similarity(&candidate.vector, &s.vector))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

            let score = lambda * rel - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }

        let (_, best) = remaining.remove(best_idx);
        selected.push(best);
    }

    selected
}
