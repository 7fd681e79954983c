//! NIQE metric.
//!
//! No-reference naturalness score per sampled generated frame, delegated to
//! the external naturalness backend and averaged. Lower is better.

use std::sync::Arc;

use super::backends::NaturalnessBackend;
use super::types::{MetricKind, MetricResult};
use crate::media::FrameSet;
use crate::sidecar::Capability;

/// No-reference naturalness over sampled generated frames.
pub struct NiqeEvaluator {
    backend: Capability<Arc<dyn NaturalnessBackend>>,
}

impl NiqeEvaluator {
    /// Create the evaluator with a naturalness capability.
    pub fn new(backend: Capability<Arc<dyn NaturalnessBackend>>) -> Self {
        Self { backend }
    }

    /// Compute NIQE over the sampled generated frames.
    pub fn evaluate(&self, frames: &FrameSet) -> MetricResult {
        let backend = match self.backend.get() {
            Ok(b) => b,
            Err(reason) => return MetricResult::error(MetricKind::Niqe, reason),
        };

        if frames.is_empty() {
            return MetricResult::error(MetricKind::Niqe, "no frames decoded from video");
        }

        let tmp = match tempfile::Builder::new().prefix("niqe_frames_").tempdir() {
            Ok(t) => t,
            Err(e) => return MetricResult::error(MetricKind::Niqe, e.to_string()),
        };

        let decoded: Vec<_> = frames.decoded().cloned().collect();
        let paths = match super::write_frame_images(&decoded, tmp.path(), "frame") {
            Ok(p) => p,
            Err(e) => return MetricResult::error(MetricKind::Niqe, e.to_string()),
        };

        let scores = match backend.naturalness_scores(&paths) {
            Ok(s) => s,
            Err(e) => return MetricResult::error(MetricKind::Niqe, e.to_string()),
        };

        if scores.is_empty() {
            return MetricResult::error(MetricKind::Niqe, "backend returned no scores");
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        tracing::info!("NIQE: {:.4} over {} frames", mean, scores.len());

        MetricResult::success(MetricKind::Niqe, mean)
            .with_scores(scores)
            .with_interpretation(interpret(mean))
    }
}

/// Threshold table for NIQE (lower is better).
fn interpret(score: f64) -> &'static str {
    if score < 3.0 {
        "naturalness is very high"
    } else if score < 5.0 {
        "naturalness is high"
    } else if score < 8.0 {
        "naturalness is fair"
    } else {
        "naturalness is low"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::backends::test_backends::ConstantNaturalness;
    use image::{DynamicImage, RgbImage};

    fn frame_set(count: usize) -> FrameSet {
        FrameSet {
            frames: (0..count)
                .map(|_| Some(DynamicImage::ImageRgb8(RgbImage::new(8, 8))))
                .collect(),
            timestamps: (0..count).map(|i| i as f64).collect(),
        }
    }

    #[test]
    fn backend_scores_are_averaged() {
        let evaluator = NiqeEvaluator::new(Capability::ready(
            Arc::new(ConstantNaturalness(4.0)) as Arc<dyn NaturalnessBackend>,
        ));
        let result = evaluator.evaluate(&frame_set(3));
        assert!(result.is_success());
        assert!((result.value - 4.0).abs() < 1e-9);
        assert_eq!(result.interpretation.as_deref(), Some("naturalness is high"));
    }

    #[test]
    fn unavailable_backend_reports_sentinel() {
        let evaluator = NiqeEvaluator::new(Capability::unavailable("niqe backend missing"));
        let result = evaluator.evaluate(&frame_set(2));
        assert!(!result.is_success());
        assert_eq!(result.value, 100.0);
    }

    #[test]
    fn empty_frame_set_reports_error() {
        let evaluator = NiqeEvaluator::new(Capability::ready(
            Arc::new(ConstantNaturalness(4.0)) as Arc<dyn NaturalnessBackend>,
        ));
        let result = evaluator.evaluate(&FrameSet::default());
        assert!(!result.is_success());
    }

    #[test]
    fn interpretation_bands() {
        assert_eq!(interpret(2.0), "naturalness is very high");
        assert_eq!(interpret(6.0), "naturalness is fair");
        assert_eq!(interpret(9.0), "naturalness is low");
    }
}
