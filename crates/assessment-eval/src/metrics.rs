//! Ranking quality metrics.
//!
//! `relevance` is a binary vector over the whole catalog and `ranked` holds
//! catalog indices in ranked order. Wherever a cutoff `k` exceeds the number
//! of ranked items, `k` shrinks to that number.

use std::collections::HashSet;

use assessment_types::{Assessment, CatalogField};

fn is_relevant(relevance: &[bool], index: usize) -> bool {
    relevance.get(index).copied().unwrap_or(false)
}

/// Fraction of the first `k` ranked items that are relevant.
///
/// ```
/// use assessment_eval::metrics::precision_at_k;
///
/// let relevance = [true, false, false];
/// assert_eq!(precision_at_k(&relevance, &[1, 0, 2], 1), 0.0);
/// assert!((precision_at_k(&relevance, &[1, 0, 2], 3) - 1.0 / 3.0).abs() < 1e-9);
/// ```
pub fn precision_at_k(relevance: &[bool], ranked: &[usize], k: usize) -> f64 {
    let k = k.min(ranked.len());
    if k == 0 {
        return 0.0;
    }
    let hits = ranked[..k]
        .iter()
        .filter(|&&i| is_relevant(relevance, i))
        .count();
    hits as f64 / k as f64
}

/// Discounted cumulative gain: position i (1-indexed) contributes
/// `gain_i / log2(i + 1)`.
pub fn dcg(gains: &[f64]) -> f64 {
    gains
        .iter()
        .enumerate()
        .map(|(i, &g)| g / (i as f64 + 2.0).log2())
        .sum()
}

/// Normalized DCG over the top `k` ranked items.
///
/// The ideal ordering places every relevant catalog item first, so a
/// ranking that misses relevant items scores below 1.0 even if everything
/// it returned is relevant. 0.0 when the catalog holds no relevant item.
pub fn ndcg_at_k(relevance: &[bool], ranked: &[usize], k: usize) -> f64 {
    let k = k.min(ranked.len());
    if k == 0 {
        return 0.0;
    }

    let gains: Vec<f64> = ranked[..k]
        .iter()
        .map(|&i| if is_relevant(relevance, i) { 1.0 } else { 0.0 })
        .collect();

    let total_relevant = relevance.iter().filter(|&&r| r).count();
    let ideal = vec![1.0; total_relevant.min(k)];
    let idcg = dcg(&ideal);

    if idcg == 0.0 {
        0.0
    } else {
        dcg(&gains) / idcg
    }
}

/// `1 / rank` of the first relevant item in the full ranking, 0.0 if none.
pub fn reciprocal_rank(relevance: &[bool], ranked: &[usize]) -> f64 {
    ranked
        .iter()
        .position(|&i| is_relevant(relevance, i))
        .map(|pos| 1.0 / (pos as f64 + 1.0))
        .unwrap_or(0.0)
}

/// Unique values of `field` among `items`, divided by the number of items.
///
/// List-valued fields contribute every element. 0.0 for no items.
pub fn diversity_score(items: &[&Assessment], field: CatalogField) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&str> = items.iter().flat_map(|a| field.values(a)).collect();
    unique.len() as f64 / items.len() as f64
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
