//! FID metric.
//!
//! Fréchet Inception Distance between the reference and generated frame
//! populations, delegated to the external distribution backend. Lower is
//! better; failure reports +infinity.

use std::sync::Arc;

use super::backends::DistributionBackend;
use super::types::{MetricKind, MetricResult};
use crate::media::MatchedFrames;
use crate::sidecar::Capability;

/// Distribution divergence between matched frame populations.
pub struct FidEvaluator {
    backend: Capability<Arc<dyn DistributionBackend>>,
}

impl FidEvaluator {
    /// Create the evaluator with a distribution capability.
    pub fn new(backend: Capability<Arc<dyn DistributionBackend>>) -> Self {
        Self { backend }
    }

    /// Compute FID over the matched frame sets.
    pub fn evaluate(&self, matched: &MatchedFrames) -> MetricResult {
        let backend = match self.backend.get() {
            Ok(b) => b,
            Err(reason) => return MetricResult::error(MetricKind::Fid, reason),
        };

        if matched.is_empty() {
            return MetricResult::error(MetricKind::Fid, "no matched frame pairs extracted");
        }

        let tmp = match tempfile::Builder::new().prefix("fid_frames_").tempdir() {
            Ok(t) => t,
            Err(e) => return MetricResult::error(MetricKind::Fid, e.to_string()),
        };
        let real_dir = tmp.path().join("real");
        let gen_dir = tmp.path().join("gen");

        if let Err(e) = super::write_frame_images(&matched.reference, &real_dir, "real")
            .and(super::write_frame_images(&matched.generated, &gen_dir, "gen"))
        {
            return MetricResult::error(MetricKind::Fid, e.to_string());
        }

        let value = match backend.frechet_distance(&real_dir, &gen_dir) {
            Ok(v) => v,
            Err(e) => return MetricResult::error(MetricKind::Fid, e.to_string()),
        };

        tracing::info!("FID: {:.4} over {} frame pairs", value, matched.len());

        let mut result = MetricResult::success(MetricKind::Fid, value)
            .with_interpretation(interpret(value));
        result.num_frames = Some(matched.len());
        result
    }
}

/// Threshold table for FID (lower is better).
fn interpret(score: f64) -> &'static str {
    if score < 10.0 {
        "distributions are very close"
    } else if score < 30.0 {
        "distributions are close"
    } else if score < 50.0 {
        "distributions diverge somewhat"
    } else if score < 100.0 {
        "distributions diverge substantially"
    } else {
        "distributions are very different"
    }
}
