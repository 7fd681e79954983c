//! LSE score derivation from a sync profile.
//!
//! Both scores are "lower is better" in [0, 1].

/// LSE-C: confidence-based lip-sync error.
///
/// Raw model confidence ranges roughly 0-10; `log10` maps that onto [0, 1]
/// and the result is clamped before inversion, so out-of-range confidences
/// can never push the score outside [0, 1]. Non-positive confidence counts
/// as zero sync confidence.
pub fn lse_confidence_score(confidence: f64) -> f64 {
    let normalized = if confidence > 0.0 {
        confidence.log10().clamp(0.0, 1.0)
    } else {
        0.0
    };
    1.0 - normalized
}

/// LSE-D: distance-based lip-sync error.
///
/// Takes the per-timestep minimum distance across the shift window,
/// normalizes each by the maximum such minimum (left unnormalized when that
/// maximum is zero), and averages. An empty profile scores 0.0.
pub fn lse_distance_score(dists: &[Vec<f64>]) -> f64 {
    let min_dists: Vec<f64> = dists
        .iter()
        .filter(|row| !row.is_empty())
        .map(|row| row.iter().cloned().fold(f64::INFINITY, f64::min))
        .collect();

    if min_dists.is_empty() {
        return 0.0;
    }

    let max_min = min_dists.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let normalized: Vec<f64> = if max_min > 0.0 {
        min_dists.iter().map(|d| d / max_min).collect()
    } else {
        min_dists
    };

    normalized.iter().sum::<f64>() / normalized.len() as f64
}
