//! LPIPS metric.
//!
//! Learned perceptual distance per matched frame pair, delegated to the
//! external perceptual backend and averaged. Lower is better.

use std::sync::Arc;

use super::backends::PerceptualBackend;
use super::types::{MetricKind, MetricResult};
use crate::media::MatchedFrames;
use crate::sidecar::Capability;

/// Learned perceptual distance over matched frame pairs.
pub struct LpipsEvaluator {
    backend: Capability<Arc<dyn PerceptualBackend>>,
}

impl LpipsEvaluator {
    /// Create the evaluator with a perceptual capability.
    pub fn new(backend: Capability<Arc<dyn PerceptualBackend>>) -> Self {
        Self { backend }
    }

    /// Compute LPIPS over the matched frame pairs.
    pub fn evaluate(&self, matched: &MatchedFrames) -> MetricResult {
        let backend = match self.backend.get() {
            Ok(b) => b,
            Err(reason) => return MetricResult::error(MetricKind::Lpips, reason),
        };

        if matched.is_empty() {
            return MetricResult::error(MetricKind::Lpips, "no matched frame pairs extracted");
        }

        let tmp = match tempfile::Builder::new().prefix("lpips_frames_").tempdir() {
            Ok(t) => t,
            Err(e) => return MetricResult::error(MetricKind::Lpips, e.to_string()),
        };

        let real_paths = super::write_frame_images(&matched.reference, tmp.path(), "real");
        let gen_paths = super::write_frame_images(&matched.generated, tmp.path(), "gen");
        let (real_paths, gen_paths) = match (real_paths, gen_paths) {
            (Ok(r), Ok(g)) => (r, g),
            (Err(e), _) | (_, Err(e)) => {
                return MetricResult::error(MetricKind::Lpips, e.to_string())
            }
        };

        let pairs: Vec<_> = real_paths.into_iter().zip(gen_paths).collect();
        let scores = match backend.perceptual_distances(&pairs) {
            Ok(s) => s,
            Err(e) => return MetricResult::error(MetricKind::Lpips, e.to_string()),
        };

        if scores.is_empty() {
            return MetricResult::error(MetricKind::Lpips, "backend returned no scores");
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        tracing::info!("LPIPS: {:.4} over {} frame pairs", mean, scores.len());

        MetricResult::success(MetricKind::Lpips, mean)
            .with_scores(scores)
            .with_interpretation(interpret(mean))
    }
}

/// Threshold table for LPIPS (lower is better).
fn interpret(score: f64) -> &'static str {
    if score < 0.1 {
        "perceptual quality is very high"
    } else if score < 0.2 {
        "perceptual quality is high"
    } else if score < 0.3 {
        "perceptual quality is fair"
    } else {
        "perceptual quality is low"
    }
}
