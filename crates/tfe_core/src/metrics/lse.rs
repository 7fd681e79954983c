//! LSE-C and LSE-D metrics.
//!
//! Lip-sync error from the cross-modal alignment search. When face cropping
//! is enabled the generated video is first reduced to a stabilized face
//! crop; a cropping failure degrades to the uncropped video with a logged
//! warning, never an abort. Both scores are lower-better in [0, 1].

use std::path::Path;
use std::sync::Arc;

use super::types::{MetricKind, MetricResult};
use crate::facetrack::FaceTracker;
use crate::sidecar::Capability;
use crate::sync::{lse_confidence_score, lse_distance_score, SyncFeatureModel, SyncModelConfig};

/// Which of the two LSE scores this evaluator reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LseVariant {
    /// Confidence-based error (LSE-C).
    Confidence,
    /// Distance-based error (LSE-D).
    Distance,
}

impl LseVariant {
    fn kind(&self) -> MetricKind {
        match self {
            LseVariant::Confidence => MetricKind::Lsec,
            LseVariant::Distance => MetricKind::Lsed,
        }
    }
}

/// Lip-sync error over the extracted audio and the generated video.
pub struct LseEvaluator {
    variant: LseVariant,
    model: Capability<Arc<dyn SyncFeatureModel>>,
    tracker: Option<Arc<FaceTracker>>,
    config: SyncModelConfig,
}

impl LseEvaluator {
    /// Create an evaluator for one LSE variant.
    ///
    /// `tracker` is the optional face-crop preprocessing step; `None`
    /// disables cropping entirely.
    pub fn new(
        variant: LseVariant,
        model: Capability<Arc<dyn SyncFeatureModel>>,
        tracker: Option<Arc<FaceTracker>>,
        config: SyncModelConfig,
    ) -> Self {
        Self {
            variant,
            model,
            tracker,
            config,
        }
    }

    /// Compute the LSE score for one audio/video pair.
    pub fn evaluate(&self, audio_path: &Path, video_path: &Path) -> MetricResult {
        let kind = self.variant.kind();

        let model = match self.model.get() {
            Ok(m) => m,
            Err(reason) => return MetricResult::error(kind, reason),
        };

        if !audio_path.exists() {
            return MetricResult::error(kind, "audio file not available");
        }
        if !video_path.exists() {
            return MetricResult::error(
                kind,
                format!("video file not found: {}", video_path.display()),
            );
        }

        // Face-crop preprocessing; any failure degrades to the original video.
        let crop_dir = tempfile::Builder::new().prefix("sync_crop_").tempdir();
        let video_for_sync = match (&self.tracker, &crop_dir) {
            (Some(tracker), Ok(dir)) => {
                match tracker.prepare_cropped_video(video_path, dir.path()) {
                    Ok(cropped) => cropped,
                    Err(e) => {
                        tracing::warn!("Face crop failed ({}); using uncropped video", e);
                        video_path.to_path_buf()
                    }
                }
            }
            _ => video_path.to_path_buf(),
        };

        let profile = match model.evaluate(audio_path, &video_for_sync, &self.config) {
            Ok(p) => p,
            Err(e) => return MetricResult::error(kind, e.to_string()),
        };

        let value = match self.variant {
            LseVariant::Confidence => lse_confidence_score(profile.confidence),
            LseVariant::Distance => lse_distance_score(&profile.dists),
        };

        tracing::info!(
            "{}: {:.4} (offset {:.1} frames, confidence {:.4})",
            kind.display_name(),
            value,
            profile.offset,
            profile.confidence
        );

        MetricResult::success(kind, value)
            .with_sync_details(profile.offset, profile.confidence)
            .with_interpretation(interpret(self.variant, value))
    }
}

/// Threshold table for the LSE scores (lower is better).
fn interpret(variant: LseVariant, score: f64) -> &'static str {
    match variant {
        LseVariant::Confidence => {
            if score < 0.2 {
                "lip sync confidence is very high"
            } else if score < 0.4 {
                "lip sync confidence is high"
            } else if score < 0.6 {
                "lip sync confidence is fair"
            } else {
                "lip sync confidence is low"
            }
        }
        LseVariant::Distance => {
            if score < 0.2 {
                "lip sync distance is very small"
            } else if score < 0.4 {
                "lip sync distance is small"
            } else if score < 0.6 {
                "lip sync distance is fair"
            } else {
                "lip sync distance is large"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sidecar::SidecarError;
    use crate::sync::SyncProfile;

    struct FixedSyncModel {
        profile: SyncProfile,
    }

    impl SyncFeatureModel for FixedSyncModel {
        fn evaluate(
            &self,
            _audio_path: &Path,
            _video_path: &Path,
            _config: &SyncModelConfig,
        ) -> Result<SyncProfile, SidecarError> {
            Ok(self.profile.clone())
        }
    }

    fn touch(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"stub").unwrap();
        path
    }

    fn evaluator(variant: LseVariant, confidence: f64, dists: Vec<Vec<f64>>) -> LseEvaluator {
        LseEvaluator::new(
            variant,
            Capability::ready(Arc::new(FixedSyncModel {
                profile: SyncProfile {
                    offset: -1.0,
                    confidence,
                    dists,
                },
            }) as Arc<dyn SyncFeatureModel>),
            None,
            SyncModelConfig::default(),
        )
    }

    #[test]
    fn confidence_variant_scores_from_confidence() {
        let dir = tempfile::tempdir().unwrap();
        let audio = touch(dir.path(), "audio.wav");
        let video = touch(dir.path(), "video.mp4");

        // confidence 10 -> score 0
        let result =
            evaluator(LseVariant::Confidence, 10.0, vec![vec![1.0; 21]]).evaluate(&audio, &video);
        assert!(result.is_success());
        assert!((result.value - 0.0).abs() < 1e-9);
        assert_eq!(result.offset, Some(-1.0));
        assert_eq!(result.confidence, Some(10.0));
    }

    #[test]
    fn distance_variant_scores_from_dists() {
        let dir = tempfile::tempdir().unwrap();
        let audio = touch(dir.path(), "audio.wav");
        let video = touch(dir.path(), "video.mp4");

        // Row minima 1 and 2 -> normalized [0.5, 1.0] -> mean 0.75
        let dists = vec![vec![3.0, 1.0], vec![2.0, 5.0]];
        let result = evaluator(LseVariant::Distance, 5.0, dists).evaluate(&audio, &video);
        assert!(result.is_success());
        assert!((result.value - 0.75).abs() < 1e-9);
    }

    #[test]
    fn missing_audio_reports_error_with_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let video = touch(dir.path(), "video.mp4");

        let lsec = evaluator(LseVariant::Confidence, 5.0, Vec::new())
            .evaluate(Path::new("/nonexistent.wav"), &video);
        assert!(!lsec.is_success());
        assert_eq!(lsec.value, 0.0);

        let lsed = evaluator(LseVariant::Distance, 5.0, Vec::new())
            .evaluate(Path::new("/nonexistent.wav"), &video);
        assert!(!lsed.is_success());
        assert_eq!(lsed.value, 1.0);
    }

    #[test]
    fn unavailable_model_reports_error() {
        let evaluator = LseEvaluator::new(
            LseVariant::Distance,
            Capability::unavailable("sync model weights not found"),
            None,
            SyncModelConfig::default(),
        );
        let result = evaluator.evaluate(Path::new("/a.wav"), Path::new("/v.mp4"));
        assert!(!result.is_success());
        assert_eq!(result.value, 1.0);
    }
}
