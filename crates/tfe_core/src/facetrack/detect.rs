//! Face detector contract.
//!
//! Detection runs in the external model sidecar over a directory of frame
//! images; the core only defines the call shape. Tests substitute synthetic
//! detectors.

use std::path::Path;

use super::types::FaceDetection;
use crate::sidecar::SidecarError;

/// Per-frame face detection over an extracted frame-image directory.
///
/// Implementations return one entry per frame, in frame order, each holding
/// zero or more detections for that frame.
pub trait FaceDetector: Send + Sync {
    /// Detect faces on every frame image in `frames_dir`.
    fn detect_frames(&self, frames_dir: &Path) -> Result<Vec<Vec<FaceDetection>>, SidecarError>;
}
