//! Evaluator registry.
//!
//! Resolves a requested metric set (explicit list or named preset) into
//! constructed evaluator instances. Unknown names are skipped with a
//! warning; each evaluator's construction is isolated so one failure never
//! aborts registry initialization. Backends that cannot be reached are
//! wired in as `Unavailable` capabilities and degrade at evaluation time.

use std::sync::Arc;

use crate::config::Settings;
use crate::facetrack::{FaceDetector, FaceTracker};
use crate::metrics::backends::{
    DistributionBackend, FaceEmbedder, NaturalnessBackend, PerceptualBackend,
};
use crate::metrics::{
    DataRequirement, FidEvaluator, IdentityEvaluator, LpipsEvaluator, LseEvaluator, LseVariant,
    MetricKind, NiqeEvaluator, PsnrEvaluator, SsimEvaluator,
};
use crate::sidecar::{Capability, ModelSidecar};
use crate::sync::{SyncFeatureModel, SyncModelConfig};

/// Named metric presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// All eight metrics.
    Full,
    /// Core metrics: identity, FID, SSIM, PSNR.
    Basic,
    /// Lip-sync metrics only.
    Sync,
    /// Generation-quality metrics only.
    Quality,
}

impl Preset {
    /// Parse a preset name.
    pub fn parse(name: &str) -> Option<Preset> {
        match name {
            "full" => Some(Preset::Full),
            "basic" => Some(Preset::Basic),
            "sync" => Some(Preset::Sync),
            "quality" => Some(Preset::Quality),
            _ => None,
        }
    }

    /// Metrics included in this preset.
    pub fn metrics(&self) -> Vec<MetricKind> {
        match self {
            Preset::Full => MetricKind::all().to_vec(),
            Preset::Basic => vec![
                MetricKind::Identity,
                MetricKind::Fid,
                MetricKind::Ssim,
                MetricKind::Psnr,
            ],
            Preset::Sync => vec![MetricKind::Lsec, MetricKind::Lsed],
            Preset::Quality => vec![
                MetricKind::Fid,
                MetricKind::Lpips,
                MetricKind::Ssim,
                MetricKind::Psnr,
                MetricKind::Niqe,
            ],
        }
    }
}

/// Input artifacts currently bound to a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailableData {
    pub source_image: bool,
    pub reference_video: bool,
    pub generated_video: bool,
    pub audio: bool,
}

impl AvailableData {
    fn has(&self, requirement: DataRequirement) -> bool {
        match requirement {
            DataRequirement::SourceImage => self.source_image,
            DataRequirement::ReferenceVideo => self.reference_video,
            DataRequirement::GeneratedVideo => self.generated_video,
            DataRequirement::Audio => self.audio,
        }
    }
}

/// A constructed evaluator, carrying its typed input contract.
pub enum Evaluator {
    Identity(IdentityEvaluator),
    Fid(FidEvaluator),
    Lpips(LpipsEvaluator),
    Ssim(SsimEvaluator),
    Psnr(PsnrEvaluator),
    Niqe(NiqeEvaluator),
    Lse(LseEvaluator),
}

/// Registry of constructed evaluators for one session.
pub struct EvaluatorRegistry {
    evaluators: Vec<(MetricKind, Evaluator)>,
}

impl EvaluatorRegistry {
    /// Build the registry from settings.
    ///
    /// Connects the model sidecar once and shares it across all evaluators
    /// that need a neural backend; a failed connection degrades those
    /// evaluators rather than failing registry construction.
    pub fn from_settings(settings: &Settings) -> Self {
        let sidecar = match ModelSidecar::connect(&settings.models) {
            Ok(s) => Capability::ready(Arc::new(s)),
            Err(e) => {
                tracing::warn!("Model sidecar unavailable: {}", e);
                Capability::unavailable(e.to_string())
            }
        };

        Self::with_sidecar(settings, sidecar)
    }

    /// Build the registry around an explicit sidecar capability.
    pub fn with_sidecar(settings: &Settings, sidecar: Capability<Arc<ModelSidecar>>) -> Self {
        let requested = resolve_metric_names(settings);

        let mut evaluators = Vec::with_capacity(requested.len());
        for kind in requested {
            match build_evaluator(kind, settings, &sidecar) {
                Ok(evaluator) => {
                    tracing::info!("Initialized {} evaluator", kind.display_name());
                    evaluators.push((kind, evaluator));
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize {} evaluator: {}", kind.as_str(), e);
                }
            }
        }

        Self { evaluators }
    }

    /// Active metrics, in evaluation order.
    pub fn active_metrics(&self) -> Vec<MetricKind> {
        self.evaluators.iter().map(|(kind, _)| *kind).collect()
    }

    /// Iterate over the constructed evaluators.
    pub fn evaluators(&self) -> impl Iterator<Item = &(MetricKind, Evaluator)> {
        self.evaluators.iter()
    }

    /// True when no evaluator was constructed.
    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    /// Check a metric's data requirements against the bound artifacts.
    ///
    /// Returns `(true, "")` when satisfiable, otherwise `(false, reason)`.
    pub fn check_requirements(kind: MetricKind, available: &AvailableData) -> (bool, String) {
        for requirement in kind.requirements() {
            if !available.has(*requirement) {
                return (false, format!("missing {}", requirement.describe()));
            }
        }
        (true, String::new())
    }
}

/// Resolve the requested metric list from settings.
///
/// An explicit metric list overrides the preset; unknown names and
/// duplicates are skipped with a warning.
fn resolve_metric_names(settings: &Settings) -> Vec<MetricKind> {
    let names: Vec<String> = if !settings.metrics.metrics.is_empty() {
        settings.metrics.metrics.clone()
    } else {
        match Preset::parse(&settings.metrics.preset) {
            Some(preset) => preset.metrics().iter().map(|k| k.as_str().to_string()).collect(),
            None => {
                tracing::warn!(
                    "Unknown preset '{}', falling back to 'full'",
                    settings.metrics.preset
                );
                Preset::Full
                    .metrics()
                    .iter()
                    .map(|k| k.as_str().to_string())
                    .collect()
            }
        }
    };

    let mut kinds = Vec::new();
    for name in names {
        match MetricKind::parse(&name) {
            Some(kind) if kinds.contains(&kind) => {
                tracing::warn!("Duplicate metric '{}' ignored", name);
            }
            Some(kind) => kinds.push(kind),
            None => tracing::warn!("Unknown metric '{}' skipped", name),
        }
    }
    kinds
}

/// Construct one evaluator with its capabilities.
fn build_evaluator(
    kind: MetricKind,
    settings: &Settings,
    sidecar: &Capability<Arc<ModelSidecar>>,
) -> Result<Evaluator, String> {
    let evaluator = match kind {
        MetricKind::Identity => Evaluator::Identity(IdentityEvaluator::new(backend_capability(
            sidecar,
            |s| s as Arc<dyn FaceEmbedder>,
        ))),
        MetricKind::Fid => Evaluator::Fid(FidEvaluator::new(backend_capability(sidecar, |s| {
            s as Arc<dyn DistributionBackend>
        }))),
        MetricKind::Lpips => Evaluator::Lpips(LpipsEvaluator::new(backend_capability(
            sidecar,
            |s| s as Arc<dyn PerceptualBackend>,
        ))),
        MetricKind::Ssim => Evaluator::Ssim(SsimEvaluator::new()),
        MetricKind::Psnr => Evaluator::Psnr(PsnrEvaluator::new()),
        MetricKind::Niqe => Evaluator::Niqe(NiqeEvaluator::new(backend_capability(
            sidecar,
            |s| s as Arc<dyn NaturalnessBackend>,
        ))),
        MetricKind::Lsec | MetricKind::Lsed => {
            if settings.sync.smooth_kernel % 2 == 0 {
                return Err(format!(
                    "smooth_kernel must be odd, got {}",
                    settings.sync.smooth_kernel
                ));
            }

            let tracker = if settings.sync.enable_face_crop {
                let detector = backend_capability(sidecar, |s| s as Arc<dyn FaceDetector>);
                Some(Arc::new(FaceTracker::new(&settings.sync, detector)))
            } else {
                None
            };

            let variant = if kind == MetricKind::Lsec {
                LseVariant::Confidence
            } else {
                LseVariant::Distance
            };

            Evaluator::Lse(LseEvaluator::new(
                variant,
                backend_capability(sidecar, |s| s as Arc<dyn SyncFeatureModel>),
                tracker,
                SyncModelConfig {
                    batch_size: settings.sync.batch_size,
                    vshift: settings.sync.vshift,
                    reference: "video".to_string(),
                },
            ))
        }
    };
    Ok(evaluator)
}

/// Narrow the shared sidecar capability to one backend trait object.
fn backend_capability<T: ?Sized>(
    sidecar: &Capability<Arc<ModelSidecar>>,
    coerce: fn(Arc<ModelSidecar>) -> Arc<T>,
) -> Capability<Arc<T>> {
    match sidecar {
        Capability::Ready(s) => Capability::ready(coerce(Arc::clone(s))),
        Capability::Unavailable { reason } => Capability::unavailable(reason.clone()),
    }
}
