//! Evaluation orchestrator.
//!
//! Owns the session lifecycle: `Configured -> MediaBound -> (per metric:
//! dispatched, resolved or failed) -> Summarized -> Persisted`. Every
//! metric failure is converted into an error result and evaluation
//! continues; only the two input-validation checks (generated video, and
//! reference video when supplied) are fatal.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::Settings;
use crate::media::{extract_wav, probe_video, FrameSampler, FrameSet, MatchedFrames, VideoHandle};
use crate::metrics::{DataRequirement, MetricResult};
use crate::registry::{AvailableData, Evaluator, EvaluatorRegistry};

use super::aggregate::summarize;
use super::report::save_report;
use super::types::{EvaluationSession, SessionError, SessionState, Summary, VideoInfo};

/// Media bound to the current session.
struct BoundMedia {
    generated: VideoHandle,
    reference: Option<VideoHandle>,
    source_image: Option<PathBuf>,
    identity_frame: Option<DynamicImage>,
    audio: Option<PathBuf>,
    /// Scratch dir holding the derived identity image until persistence.
    _scratch: tempfile::TempDir,
}

/// Drives one evaluation session end to end.
pub struct EvaluationOrchestrator {
    settings: Settings,
    registry: EvaluatorRegistry,
    sampler: FrameSampler,
    state: SessionState,
    media: Option<BoundMedia>,
}

impl EvaluationOrchestrator {
    /// Create an orchestrator, constructing the evaluator registry from
    /// settings (this connects the model sidecar).
    pub fn new(settings: Settings) -> Self {
        let registry = EvaluatorRegistry::from_settings(&settings);
        Self::with_registry(settings, registry)
    }

    /// Create an orchestrator around a pre-built registry.
    pub fn with_registry(settings: Settings, registry: EvaluatorRegistry) -> Self {
        let sampler = FrameSampler::new(settings.video.width, settings.video.height);
        Self {
            settings,
            registry,
            sampler,
            state: SessionState::Configured,
            media: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Bind the session's media.
    ///
    /// The generated video must exist and probe cleanly (fatal otherwise);
    /// so must the reference video when supplied. The identity source image
    /// is either the supplied path or, when absent, a frame pulled from the
    /// reference video.
    pub fn bind_media(
        &mut self,
        generated: &Path,
        reference: Option<&Path>,
        source_image: Option<&Path>,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Configured {
            return Err(SessionError::InvalidState(format!(
                "bind_media called in state {:?}",
                self.state
            )));
        }

        let generated =
            probe_video(generated).map_err(|e| SessionError::GeneratedVideo(e.to_string()))?;

        let reference = match reference {
            Some(path) => {
                Some(probe_video(path).map_err(|e| SessionError::ReferenceVideo(e.to_string()))?)
            }
            None => None,
        };

        let scratch = tempfile::Builder::new().prefix("tfe_session_").tempdir()?;

        // Identity source: explicit image, or the reference's center frame.
        let mut identity_frame = None;
        let source_image = match source_image {
            Some(path) => {
                if !path.exists() {
                    return Err(SessionError::SourceImage(path.display().to_string()));
                }
                Some(path.to_path_buf())
            }
            None => match &reference {
                Some(reference) => {
                    let time = self.settings.video.identity_frame_time;
                    match self.sampler.frame_at_time(reference, time) {
                        Some(frame) => {
                            let path = scratch.path().join("identity_source.png");
                            if let Err(e) = frame.save(&path) {
                                tracing::warn!("Failed to save identity frame: {}", e);
                                None
                            } else {
                                identity_frame = Some(frame);
                                Some(path)
                            }
                        }
                        None => {
                            tracing::warn!("Could not extract identity frame from reference");
                            None
                        }
                    }
                }
                None => None,
            },
        };

        tracing::info!(
            "Media bound: generated {} ({} frames @ {:.2} fps){}",
            generated.path.display(),
            generated.total_frames,
            generated.fps,
            if reference.is_some() {
                ", with reference"
            } else {
                ""
            }
        );

        self.media = Some(BoundMedia {
            generated,
            reference,
            source_image,
            identity_frame,
            audio: None,
            _scratch: scratch,
        });
        self.state = SessionState::MediaBound;
        Ok(())
    }

    /// Run every active metric, aggregate, persist and return the session.
    ///
    /// Per-metric failures become error results; a persistence failure is
    /// logged and the in-memory session is still returned.
    pub fn evaluate(&mut self) -> Result<EvaluationSession, SessionError> {
        if self.state != SessionState::MediaBound {
            return Err(SessionError::InvalidState(format!(
                "evaluate called in state {:?}",
                self.state
            )));
        }

        let output_dir = PathBuf::from(&self.settings.output.output_dir);

        // Audio is extracted once, lazily, only when a bound metric needs it.
        let needs_audio = self
            .registry
            .active_metrics()
            .iter()
            .any(|kind| kind.requirements().contains(&DataRequirement::Audio));
        if needs_audio {
            let Some(media) = self.media.as_mut() else {
                return Err(SessionError::InvalidState("no media bound".to_string()));
            };
            media.audio = match extract_wav(&media.generated.path, &output_dir) {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("Audio extraction failed: {}", e);
                    None
                }
            };
        }

        let Some(media) = self.media.as_ref() else {
            return Err(SessionError::InvalidState("no media bound".to_string()));
        };
        let available = AvailableData {
            source_image: media.source_image.is_some(),
            reference_video: media.reference.is_some(),
            generated_video: true,
            audio: media.audio.is_some(),
        };

        let num_frames = self.settings.video.num_frames;
        let sampler = &self.sampler;
        let mut metrics: BTreeMap<String, MetricResult> = BTreeMap::new();

        // Frame sampling is shared across metrics with the same input shape.
        let mut matched_cache: Option<MatchedFrames> = None;
        let mut generated_cache: Option<FrameSet> = None;

        for (kind, evaluator) in self.registry.evaluators() {
            tracing::info!("Computing {}", kind.display_name());

            let (satisfied, reason) = EvaluatorRegistry::check_requirements(*kind, &available);
            if !satisfied {
                tracing::warn!("{} skipped: {}", kind.display_name(), reason);
                metrics.insert(kind.as_str().to_string(), MetricResult::error(*kind, reason));
                continue;
            }

            // Build the argument shape this metric expects and dispatch.
            let result = match (evaluator, &media.reference, &media.source_image, &media.audio)
            {
                (Evaluator::Identity(e), _, Some(source), _) => {
                    let frames = generated_cache
                        .get_or_insert_with(|| sampler.sample(&media.generated, num_frames));
                    e.evaluate(source, frames)
                }
                (Evaluator::Fid(e), Some(reference), _, _) => {
                    let matched = matched_cache.get_or_insert_with(|| {
                        sampler.sample_matched(reference, &media.generated, num_frames)
                    });
                    e.evaluate(matched)
                }
                (Evaluator::Lpips(e), Some(reference), _, _) => {
                    let matched = matched_cache.get_or_insert_with(|| {
                        sampler.sample_matched(reference, &media.generated, num_frames)
                    });
                    e.evaluate(matched)
                }
                (Evaluator::Ssim(e), Some(reference), _, _) => {
                    let matched = matched_cache.get_or_insert_with(|| {
                        sampler.sample_matched(reference, &media.generated, num_frames)
                    });
                    e.evaluate(matched)
                }
                (Evaluator::Psnr(e), Some(reference), _, _) => {
                    let matched = matched_cache.get_or_insert_with(|| {
                        sampler.sample_matched(reference, &media.generated, num_frames)
                    });
                    e.evaluate(matched)
                }
                (Evaluator::Niqe(e), _, _, _) => {
                    let frames = generated_cache
                        .get_or_insert_with(|| sampler.sample(&media.generated, num_frames));
                    e.evaluate(frames)
                }
                (Evaluator::Lse(e), _, _, Some(audio)) => {
                    e.evaluate(audio, &media.generated.path)
                }
                // Unreachable once requirements are checked, but a missing
                // artifact still degrades to an error result, never a panic.
                _ => MetricResult::error(*kind, "required input not bound"),
            };

            if result.is_success() {
                tracing::info!("{} = {:.4}", kind.display_name(), result.value);
            } else {
                tracing::warn!(
                    "{} failed: {}",
                    kind.display_name(),
                    result.message.as_deref().unwrap_or("unknown error")
                );
            }
            metrics.insert(kind.as_str().to_string(), result);
        }

        let active = self.registry.active_metrics();
        let summary: Summary = summarize(&metrics, &active, &self.settings.metrics.weights);
        self.state = SessionState::Summarized;

        let video_name = media
            .generated
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let session = EvaluationSession {
            video_info: VideoInfo {
                video_name,
                generated_video: media.generated.path.clone(),
                reference_video: media.reference.as_ref().map(|r| r.path.clone()),
                generated_info: Some(media.generated.clone()),
                reference_info: media.reference.clone(),
                evaluation_time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                config: self.settings.clone(),
            },
            metrics,
            summary,
        };

        tracing::info!(
            "Overall score: {:.4} ({})",
            session.summary.overall_score,
            session.summary.interpretation
        );

        // Persistence failure never invalidates the computed results.
        if let Err(e) = save_report(&session, &output_dir, media.identity_frame.as_ref()) {
            tracing::warn!("Failed to persist report: {}", e);
        }
        self.state = SessionState::Persisted;

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EvaluatorRegistry;
    use crate::sidecar::Capability;

    fn offline_orchestrator(settings: Settings) -> EvaluationOrchestrator {
        let registry =
            EvaluatorRegistry::with_sidecar(&settings, Capability::unavailable("test"));
        EvaluationOrchestrator::with_registry(settings, registry)
    }

    #[test]
    fn evaluate_before_binding_is_rejected() {
        let mut orchestrator = offline_orchestrator(Settings::default());
        assert_eq!(orchestrator.state(), SessionState::Configured);
        let result = orchestrator.evaluate();
        assert!(matches!(result, Err(SessionError::InvalidState(_))));
    }

    #[test]
    fn missing_generated_video_is_fatal() {
        let mut orchestrator = offline_orchestrator(Settings::default());
        let result = orchestrator.bind_media(Path::new("/nonexistent/gen.mp4"), None, None);
        assert!(matches!(result, Err(SessionError::GeneratedVideo(_))));
        assert_eq!(orchestrator.state(), SessionState::Configured);
    }

    #[test]
    fn unreadable_generated_video_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let generated = dir.path().join("gen.mp4");
        std::fs::write(&generated, b"not a real video").unwrap();

        let mut orchestrator = offline_orchestrator(Settings::default());
        let result = orchestrator.bind_media(&generated, None, None);
        assert!(matches!(result, Err(SessionError::GeneratedVideo(_))));
    }

    #[test]
    fn missing_source_image_is_fatal() {
        let mut orchestrator = offline_orchestrator(Settings::default());
        let result = orchestrator.bind_media(
            Path::new("/nonexistent/gen.mp4"),
            None,
            Some(Path::new("/nonexistent/face.png")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn double_bind_is_rejected() {
        let mut orchestrator = offline_orchestrator(Settings::default());
        // Force the state forward to simulate a bound session.
        orchestrator.state = SessionState::MediaBound;
        let result = orchestrator.bind_media(Path::new("/x.mp4"), None, None);
        assert!(matches!(result, Err(SessionError::InvalidState(_))));
    }
}
