//! Identity similarity metric.
//!
//! Embeds the source identity image and every sampled generated frame with
//! the external face-embedding backend and averages the per-frame cosine
//! similarity. Higher is better, bounded to [-1, 1] and in practice [0, 1].

use std::path::Path;
use std::sync::Arc;

use super::backends::FaceEmbedder;
use super::types::{MetricKind, MetricResult};
use crate::media::FrameSet;
use crate::sidecar::Capability;

/// Identity similarity against a single source image.
pub struct IdentityEvaluator {
    embedder: Capability<Arc<dyn FaceEmbedder>>,
}

impl IdentityEvaluator {
    /// Create the evaluator with an embedding capability.
    pub fn new(embedder: Capability<Arc<dyn FaceEmbedder>>) -> Self {
        Self { embedder }
    }

    /// Compute identity similarity between `source_image` and the sampled
    /// generated frames.
    pub fn evaluate(&self, source_image: &Path, frames: &FrameSet) -> MetricResult {
        let embedder = match self.embedder.get() {
            Ok(e) => e,
            Err(reason) => return MetricResult::error(MetricKind::Identity, reason),
        };

        if frames.is_empty() {
            return MetricResult::error(MetricKind::Identity, "no frames decoded from video");
        }

        let tmp = match tempfile::Builder::new().prefix("identity_").tempdir() {
            Ok(t) => t,
            Err(e) => return MetricResult::error(MetricKind::Identity, e.to_string()),
        };

        let decoded: Vec<_> = frames.decoded().cloned().collect();
        let mut paths = match super::write_frame_images(&decoded, tmp.path(), "frame") {
            Ok(p) => p,
            Err(e) => return MetricResult::error(MetricKind::Identity, e.to_string()),
        };
        paths.insert(0, source_image.to_path_buf());

        let embeddings = match embedder.embed_faces(&paths) {
            Ok(e) => e,
            Err(e) => return MetricResult::error(MetricKind::Identity, e.to_string()),
        };

        let source_feature = match embeddings.first().and_then(|e| e.clone()) {
            Some(f) => f,
            None => {
                return MetricResult::error(
                    MetricKind::Identity,
                    "no face feature extracted from source image",
                )
            }
        };

        let scores: Vec<f64> = embeddings
            .iter()
            .skip(1)
            .filter_map(|e| e.as_ref())
            .map(|feature| cosine_similarity(&source_feature, feature))
            .collect();

        if scores.is_empty() {
            return MetricResult::error(
                MetricKind::Identity,
                "no face features extracted from video frames",
            );
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        tracing::info!("Identity similarity: {:.4} over {} frames", mean, scores.len());

        MetricResult::success(MetricKind::Identity, mean)
            .with_scores(scores)
            .with_interpretation(interpret(mean))
    }
}

/// Cosine similarity between two feature vectors.
fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Threshold table for identity similarity.
fn interpret(score: f64) -> &'static str {
    if score > 0.8 {
        "identity preserved very well"
    } else if score > 0.6 {
        "identity preserved well"
    } else if score > 0.4 {
        "identity preservation is fair"
    } else {
        "identity preservation is poor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::backends::test_backends::ConstantEmbedder;
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
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![0.5, -0.25, 1.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_similarity_of_orthogonal_vectors_is_zero() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn identical_embeddings_give_perfect_identity() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.png");
        DynamicImage::ImageRgb8(RgbImage::new(8, 8)).save(&source).unwrap();

        let evaluator = IdentityEvaluator::new(Capability::ready(
            Arc::new(ConstantEmbedder(vec![0.3, 0.4, 0.5])) as Arc<dyn FaceEmbedder>,
        ));
        let result = evaluator.evaluate(&source, &frame_set(3));

        assert!(result.is_success());
        assert!((result.value - 1.0).abs() < 1e-9);
        assert_eq!(result.num_frames, Some(3));
        assert_eq!(
            result.interpretation.as_deref(),
            Some("identity preserved very well")
        );
    }

    #[test]
    fn unavailable_backend_reports_error() {
        let evaluator = IdentityEvaluator::new(Capability::unavailable("no embedder"));
        let result = evaluator.evaluate(Path::new("/nonexistent.png"), &frame_set(1));
        assert!(!result.is_success());
        assert_eq!(result.value, 0.0);
    }

    #[test]
    fn empty_frame_set_reports_error() {
        let evaluator = IdentityEvaluator::new(Capability::ready(
            Arc::new(ConstantEmbedder(vec![1.0])) as Arc<dyn FaceEmbedder>,
        ));
        let result = evaluator.evaluate(Path::new("/nonexistent.png"), &FrameSet::default());
        assert!(!result.is_success());
    }

    #[test]
    fn interpretation_bands() {
        assert_eq!(interpret(0.9), "identity preserved very well");
        assert_eq!(interpret(0.7), "identity preserved well");
        assert_eq!(interpret(0.5), "identity preservation is fair");
        assert_eq!(interpret(0.2), "identity preservation is poor");
    }
}
