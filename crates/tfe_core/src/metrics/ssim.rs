//! SSIM metric.
//!
//! Structural similarity per matched frame pair, computed in-process on
//! grayscale frames and averaged. Higher is better, in [0, 1].

use image::DynamicImage;
use image_compare::Algorithm;

use super::types::{MetricKind, MetricResult};
use crate::media::MatchedFrames;

/// Structural similarity over matched frame pairs.
pub struct SsimEvaluator;

impl SsimEvaluator {
    /// Create the evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Compute SSIM over the matched frame pairs.
    pub fn evaluate(&self, matched: &MatchedFrames) -> MetricResult {
        if matched.is_empty() {
            return MetricResult::error(MetricKind::Ssim, "no matched frame pairs extracted");
        }

        let scores: Vec<f64> = matched
            .reference
            .iter()
            .zip(matched.generated.iter())
            .map(|(r, g)| compute_ssim(r, g))
            .collect();

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        tracing::info!("SSIM: {:.4} over {} frame pairs", mean, scores.len());

        MetricResult::success(MetricKind::Ssim, mean)
            .with_scores(scores)
            .with_interpretation(interpret(mean))
    }
}

impl Default for SsimEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// SSIM between two frames on the grayscale channel.
///
/// Frames are sampled at a common target resolution, so dimensions always
/// match; a comparison failure scores 0.0 rather than failing the metric.
pub fn compute_ssim(frame1: &DynamicImage, frame2: &DynamicImage) -> f64 {
    let gray1 = frame1.to_luma8();
    let gray2 = frame2.to_luma8();

    match image_compare::gray_similarity_structure(&Algorithm::MSSIMSimple, &gray1, &gray2) {
        Ok(similarity) => similarity.score,
        Err(_) => 0.0,
    }
}

/// Threshold table for SSIM.
fn interpret(score: f64) -> &'static str {
    if score > 0.9 {
        "structural similarity is very high"
    } else if score > 0.8 {
        "structural similarity is high"
    } else if score > 0.6 {
        "structural similarity is fair"
    } else {
        "structural similarity is low"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |_, _| Rgb([r, g, b])))
    }

    fn gradient() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, 128])
        }))
    }

    #[test]
    fn identical_frames_have_ssim_near_one() {
        let ssim = compute_ssim(&gradient(), &gradient());
        assert!(ssim > 0.99, "expected ~1.0, got {}", ssim);
    }

    #[test]
    fn different_frames_have_low_ssim() {
        let ssim = compute_ssim(&solid(0, 0, 0), &solid(255, 255, 255));
        assert!(ssim < 0.5, "expected low SSIM, got {}", ssim);
    }

    #[test]
    fn evaluator_averages_pairs() {
        let matched = MatchedFrames {
            reference: vec![gradient(), gradient()],
            generated: vec![gradient(), gradient()],
            timestamps: vec![0.0, 1.0],
            requested: 2,
        };
        let result = SsimEvaluator::new().evaluate(&matched);
        assert!(result.is_success());
        assert!(result.value > 0.99);
        assert_eq!(result.num_frames, Some(2));
        assert_eq!(
            result.interpretation.as_deref(),
            Some("structural similarity is very high")
        );
    }

    #[test]
    fn empty_pairs_report_error() {
        let result = SsimEvaluator::new().evaluate(&MatchedFrames::default());
        assert!(!result.is_success());
        assert_eq!(result.value, 0.0);
    }

    #[test]
    fn interpretation_bands() {
        assert_eq!(interpret(0.95), "structural similarity is very high");
        assert_eq!(interpret(0.85), "structural similarity is high");
        assert_eq!(interpret(0.7), "structural similarity is fair");
        assert_eq!(interpret(0.5), "structural similarity is low");
    }
}
