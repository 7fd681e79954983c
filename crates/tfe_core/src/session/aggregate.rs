//! Weighted aggregation of metric results.
//!
//! Weights (defaults or caller overrides) are renormalized to sum to 1
//! across the metrics that succeeded; lower-better metrics are converted to
//! a higher-better 0-1 scale before weighting. PSNR and LPIPS are folded in
//! raw even though they are not naturally bounded to [0, 1]; that scaling
//! is inherited behavior and changing it would change the meaning of the
//! overall score.

use std::collections::BTreeMap;

use crate::metrics::{MetricKind, MetricResult};

use super::types::Summary;

/// Interpretation used when no metric succeeded.
pub const CANNOT_COMPUTE: &str = "cannot compute overall score";

/// Convert a raw metric value to the higher-better 0-1 aggregation scale.
pub fn normalized_score(kind: MetricKind, value: f64) -> f64 {
    match kind {
        MetricKind::Fid => (1.0 - value / 200.0).clamp(0.0, 1.0),
        MetricKind::Niqe => (1.0 - value / 10.0).clamp(0.0, 1.0),
        MetricKind::Lsec | MetricKind::Lsed => 1.0 - value,
        _ => value,
    }
}

/// Qualitative band for an overall score.
pub fn interpret_overall(score: f64) -> &'static str {
    if score > 0.8 {
        "excellent: generation quality is very high"
    } else if score > 0.6 {
        "good: generation quality is solid"
    } else if score > 0.4 {
        "fair: there is room for improvement"
    } else {
        "poor: significant improvement needed"
    }
}

/// Derive the weighted summary for a set of metric results.
///
/// `active` lists the metrics that were dispatched (their default weights
/// seed the table); `overrides` replaces individual weights when non-empty.
/// Only successful metrics receive weight; when none succeeded the overall
/// score is exactly 0.0 with a "cannot compute" interpretation.
pub fn summarize(
    results: &BTreeMap<String, MetricResult>,
    active: &[MetricKind],
    overrides: &BTreeMap<String, f64>,
) -> Summary {
    // Seed weights: overrides where given, defaults otherwise.
    let mut weights: BTreeMap<MetricKind, f64> = BTreeMap::new();
    for kind in active {
        let weight = overrides
            .get(kind.as_str())
            .copied()
            .unwrap_or_else(|| kind.default_weight());
        weights.insert(*kind, weight);
    }

    // Keep only metrics that produced a success.
    let successful: Vec<MetricKind> = active
        .iter()
        .copied()
        .filter(|kind| {
            results
                .get(kind.as_str())
                .map(|r| r.is_success())
                .unwrap_or(false)
        })
        .collect();

    let total_weight: f64 = successful.iter().map(|k| weights[k]).sum();

    let mut used_weights = BTreeMap::new();
    let mut overall_score = 0.0;
    let mut valid_metrics = Vec::new();

    if total_weight > 0.0 {
        for kind in &successful {
            let weight = weights[kind] / total_weight;
            let value = results[kind.as_str()].value;
            overall_score += normalized_score(*kind, value) * weight;
            used_weights.insert(kind.as_str().to_string(), weight);
            valid_metrics.push(kind.as_str().to_string());
        }
    }

    let interpretation = if valid_metrics.is_empty() {
        overall_score = 0.0;
        CANNOT_COMPUTE.to_string()
    } else {
        interpret_overall(overall_score).to_string()
    };

    Summary {
        overall_score,
        weights: used_weights,
        valid_metrics,
        interpretation,
        calculation_time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results_from(entries: &[(MetricKind, f64, bool)]) -> BTreeMap<String, MetricResult> {
        entries
            .iter()
            .map(|&(kind, value, success)| {
                let result = if success {
                    MetricResult::success(kind, value)
                } else {
                    MetricResult::error(kind, "failed")
                };
                (kind.as_str().to_string(), result)
            })
            .collect()
    }

    #[test]
    fn fid_normalization_matches_scale() {
        assert!((normalized_score(MetricKind::Fid, 10.0) - 0.95).abs() < 1e-9);
        assert_eq!(normalized_score(MetricKind::Fid, 500.0), 0.0);
        assert!((normalized_score(MetricKind::Niqe, 5.0) - 0.5).abs() < 1e-9);
        assert!((normalized_score(MetricKind::Lsed, 0.3) - 0.7).abs() < 1e-9);
        assert_eq!(normalized_score(MetricKind::Ssim, 0.9), 0.9);
    }

    #[test]
    fn two_metric_example_aggregates_to_expected_score() {
        // SSIM 0.9 at weight 0.5, FID 10 at weight 0.5:
        // normalized FID = 1 - 10/200 = 0.95, overall = 0.925 -> excellent
        let results = results_from(&[(MetricKind::Ssim, 0.9, true), (MetricKind::Fid, 10.0, true)]);
        let active = [MetricKind::Ssim, MetricKind::Fid];
        let overrides =
            BTreeMap::from([("ssim".to_string(), 0.5), ("fid".to_string(), 0.5)]);

        let summary = summarize(&results, &active, &overrides);
        assert!((summary.overall_score - 0.925).abs() < 1e-9);
        assert!(summary.interpretation.starts_with("excellent"));
        assert_eq!(summary.valid_metrics, vec!["ssim", "fid"]);
    }

    #[test]
    fn weights_renormalize_over_successful_metrics_only() {
        // FID failed: SSIM alone carries all the weight.
        let results = results_from(&[
            (MetricKind::Ssim, 0.8, true),
            (MetricKind::Fid, 0.0, false),
        ]);
        let active = [MetricKind::Ssim, MetricKind::Fid];
        let summary = summarize(&results, &active, &BTreeMap::new());

        assert!((summary.overall_score - 0.8).abs() < 1e-9);
        assert_eq!(summary.weights.len(), 1);
        assert!((summary.weights["ssim"] - 1.0).abs() < 1e-9);
        assert_eq!(summary.valid_metrics, vec!["ssim"]);
    }

    #[test]
    fn all_errors_give_zero_score_and_cannot_compute() {
        let results = results_from(&[
            (MetricKind::Ssim, 0.0, false),
            (MetricKind::Psnr, 0.0, false),
        ]);
        let active = [MetricKind::Ssim, MetricKind::Psnr];
        let summary = summarize(&results, &active, &BTreeMap::new());

        assert_eq!(summary.overall_score, 0.0);
        assert_eq!(summary.interpretation, CANNOT_COMPUTE);
        assert!(summary.valid_metrics.is_empty());
        assert!(summary.weights.is_empty());
    }

    #[test]
    fn overall_bands() {
        assert!(interpret_overall(0.9).starts_with("excellent"));
        assert!(interpret_overall(0.7).starts_with("good"));
        assert!(interpret_overall(0.5).starts_with("fair"));
        assert!(interpret_overall(0.2).starts_with("poor"));
    }
}
