//! PSNR metric.
//!
//! Peak signal-to-noise ratio per matched frame pair from the RGB mean
//! squared error, averaged. Higher is better, reported in dB.

use image::DynamicImage;

use super::types::{MetricKind, MetricResult};
use crate::media::MatchedFrames;

/// PSNR of identical frames, where the MSE is zero.
const PSNR_CAP_DB: f64 = 100.0;

/// Peak signal-to-noise ratio over matched frame pairs.
pub struct PsnrEvaluator;

impl PsnrEvaluator {
    /// Create the evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Compute PSNR over the matched frame pairs.
    pub fn evaluate(&self, matched: &MatchedFrames) -> MetricResult {
        if matched.is_empty() {
            return MetricResult::error(MetricKind::Psnr, "no matched frame pairs extracted");
        }

        let scores: Vec<f64> = matched
            .reference
            .iter()
            .zip(matched.generated.iter())
            .map(|(r, g)| compute_psnr(r, g))
            .collect();

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        tracing::info!("PSNR: {:.2} dB over {} frame pairs", mean, scores.len());

        MetricResult::success(MetricKind::Psnr, mean)
            .with_scores(scores)
            .with_interpretation(interpret(mean))
    }
}

impl Default for PsnrEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean squared error over the RGB channels of two equally sized frames.
pub fn compute_mse(frame1: &DynamicImage, frame2: &DynamicImage) -> f64 {
    let rgb1 = frame1.to_rgb8();
    let rgb2 = frame2.to_rgb8();

    let pixels1 = rgb1.as_raw();
    let pixels2 = rgb2.as_raw();
    let n = pixels1.len().min(pixels2.len());
    if n == 0 {
        return 0.0;
    }

    let sum: f64 = pixels1[..n]
        .iter()
        .zip(pixels2[..n].iter())
        .map(|(&a, &b)| {
            let diff = a as f64 - b as f64;
            diff * diff
        })
        .sum();
    sum / n as f64
}

/// PSNR in dB from the RGB MSE; identical frames cap at 100 dB.
pub fn compute_psnr(frame1: &DynamicImage, frame2: &DynamicImage) -> f64 {
    let mse = compute_mse(frame1, frame2);
    if mse <= 0.0 {
        return PSNR_CAP_DB;
    }
    (10.0 * (255.0f64 * 255.0 / mse).log10()).min(PSNR_CAP_DB)
}

/// Threshold table for PSNR.
fn interpret(score: f64) -> &'static str {
    if score > 40.0 {
        "signal-to-noise ratio is very high"
    } else if score > 30.0 {
        "signal-to-noise ratio is high"
    } else if score > 20.0 {
        "signal-to-noise ratio is fair"
    } else {
        "signal-to-noise ratio is low"
    }
}
