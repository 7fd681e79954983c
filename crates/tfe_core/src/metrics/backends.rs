//! Capability contracts for external metric backends.
//!
//! Neural scorers are injected into evaluators as trait objects wrapped in
//! [`Capability`]; a missing backend is an explicit `Unavailable` variant
//! carrying the reason, not a null scattered through call sites.

use std::path::{Path, PathBuf};

use crate::sidecar::SidecarError;

/// Face embedding for identity similarity.
pub trait FaceEmbedder: Send + Sync {
    /// Embed each image into a feature vector.
    ///
    /// Entries are `None` for images where no face feature could be
    /// extracted; the call as a whole only fails when the backend does.
    fn embed_faces(&self, images: &[PathBuf]) -> Result<Vec<Option<Vec<f64>>>, SidecarError>;
}

/// Distribution divergence between two frame populations.
pub trait DistributionBackend: Send + Sync {
    /// Fréchet distance between the image sets in two directories.
    fn frechet_distance(&self, real_dir: &Path, generated_dir: &Path)
        -> Result<f64, SidecarError>;
}

/// Learned perceptual distance between frame pairs.
pub trait PerceptualBackend: Send + Sync {
    /// Perceptual distance for each (reference, generated) image pair.
    fn perceptual_distances(
        &self,
        pairs: &[(PathBuf, PathBuf)],
    ) -> Result<Vec<f64>, SidecarError>;
}

/// No-reference naturalness scoring.
pub trait NaturalnessBackend: Send + Sync {
    /// Naturalness score for each image (lower is better).
    fn naturalness_scores(&self, images: &[PathBuf]) -> Result<Vec<f64>, SidecarError>;
}
