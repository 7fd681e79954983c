//! External model sidecar.
//!
//! The neural backends (face embedding, FID/LPIPS/NIQE scorers, the sync
//! feature model and the face detector) are pretrained components that run
//! out of process in a Python sidecar. The core speaks a small
//! JSON-over-stdio protocol: one request object on stdin, one response
//! object on stdout per invocation:
//!
//! ```json
//! {"command": "niqe", "args": {"images": ["..."], "device": "cuda"}}
//! {"success": true, "result": {"scores": [4.2, 3.9]}}
//! ```
//!
//! Absence of the sidecar (or of its model weights) is represented as
//! [`Capability::Unavailable`] and degrades the affected metrics to error
//! results; it never aborts a session.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::ModelSettings;
use crate::facetrack::{BoundingBox, FaceDetection, FaceDetector};
use crate::metrics::backends::{
    DistributionBackend, FaceEmbedder, NaturalnessBackend, PerceptualBackend,
};
use crate::sync::{SyncFeatureModel, SyncModelConfig, SyncProfile};

/// Error types for sidecar calls.
#[derive(Debug, thiserror::Error)]
pub enum SidecarError {
    /// The sidecar process could not be started.
    #[error("Failed to launch model sidecar: {0}")]
    SpawnFailed(String),

    /// The sidecar exited with a failure status.
    #[error("Model sidecar failed: {0}")]
    ProcessFailed(String),

    /// The sidecar's response was not valid protocol JSON.
    #[error("Bad sidecar response: {0}")]
    Protocol(String),

    /// The sidecar reported a model-level error.
    #[error("Model error: {0}")]
    ModelError(String),
}

/// A dependency that may or may not be backed by a real implementation.
///
/// Evaluators receive their backends through this wrapper; when the backing
/// implementation is absent they degrade to an error result carrying the
/// recorded reason.
pub enum Capability<T> {
    /// The backend is available.
    Ready(T),
    /// The backend is missing, with a human-readable reason.
    Unavailable { reason: String },
}

impl<T> Capability<T> {
    /// Wrap an available backend.
    pub fn ready(value: T) -> Self {
        Capability::Ready(value)
    }

    /// Record an unavailable backend.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Capability::Unavailable {
            reason: reason.into(),
        }
    }

    /// Build from a fallible constructor result.
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Capability::Ready(value),
            Err(e) => Capability::Unavailable {
                reason: e.to_string(),
            },
        }
    }

    /// The backend, or the unavailability reason.
    pub fn get(&self) -> Result<&T, &str> {
        match self {
            Capability::Ready(value) => Ok(value),
            Capability::Unavailable { reason } => Err(reason),
        }
    }

    /// True when a backend is present.
    pub fn is_ready(&self) -> bool {
        matches!(self, Capability::Ready(_))
    }
}

/// Handle to the Python model sidecar.
///
/// Each call spawns one short-lived subprocess; the sidecar caches model
/// weights on its own side. The handle is validated once at construction
/// with a `probe` command.
pub struct ModelSidecar {
    python: String,
    module: String,
    device: String,
    sync_model_path: String,
}

impl ModelSidecar {
    /// Connect to the sidecar and probe it.
    ///
    /// The probe reports the device actually selected (the sidecar falls
    /// back to CPU when CUDA is unavailable).
    pub fn connect(settings: &ModelSettings) -> Result<Self, SidecarError> {
        let mut sidecar = Self {
            python: settings.python.clone(),
            module: settings.sidecar_module.clone(),
            device: settings.device.clone(),
            sync_model_path: settings.sync_model_path.clone(),
        };

        let result = sidecar.run_command(
            "probe",
            serde_json::json!({ "device": settings.device }),
        )?;

        if let Some(actual) = result.get("device").and_then(|d| d.as_str()) {
            if actual != sidecar.device {
                tracing::warn!(
                    "Requested device '{}' unavailable, sidecar using '{}'",
                    sidecar.device,
                    actual
                );
                sidecar.device = actual.to_string();
            }
        }

        tracing::info!("Model sidecar ready on device '{}'", sidecar.device);
        Ok(sidecar)
    }

    /// Device the sidecar is actually computing on.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Run one protocol command.
    fn run_command(
        &self,
        command: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, SidecarError> {
        let request = serde_json::json!({ "command": command, "args": args });

        let mut child = Command::new(&self.python)
            .arg("-m")
            .arg(&self.module)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SidecarError::SpawnFailed(e.to_string()))?;

        if let Some(ref mut stdin) = child.stdin {
            stdin
                .write_all(request.to_string().as_bytes())
                .map_err(|e| SidecarError::ProcessFailed(format!("stdin write failed: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| SidecarError::ProcessFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SidecarError::ProcessFailed(
                stderr.lines().last().unwrap_or("unknown error").to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let response: serde_json::Value = serde_json::from_str(&stdout)
            .map_err(|e| SidecarError::Protocol(format!("{}: {}", e, stdout)))?;

        if response.get("success").and_then(|v| v.as_bool()) == Some(true) {
            Ok(response.get("result").cloned().unwrap_or(serde_json::Value::Null))
        } else {
            Err(SidecarError::ModelError(
                response
                    .get("error")
                    .and_then(|e| e.as_str())
                    .unwrap_or("unknown error")
                    .to_string(),
            ))
        }
    }
}

impl FaceEmbedder for ModelSidecar {
    fn embed_faces(&self, images: &[PathBuf]) -> Result<Vec<Option<Vec<f64>>>, SidecarError> {
        let result = self.run_command(
            "embed_faces",
            serde_json::json!({ "images": images, "device": self.device }),
        )?;
        serde_json::from_value(
            result
                .get("embeddings")
                .cloned()
                .unwrap_or(serde_json::Value::Null),
        )
        .map_err(|e| SidecarError::Protocol(format!("embeddings: {}", e)))
    }
}

impl DistributionBackend for ModelSidecar {
    fn frechet_distance(
        &self,
        real_dir: &Path,
        generated_dir: &Path,
    ) -> Result<f64, SidecarError> {
        let result = self.run_command(
            "fid",
            serde_json::json!({
                "real_dir": real_dir,
                "generated_dir": generated_dir,
                "device": self.device,
            }),
        )?;
        result
            .get("value")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| SidecarError::Protocol("fid value missing".to_string()))
    }
}

impl PerceptualBackend for ModelSidecar {
    fn perceptual_distances(
        &self,
        pairs: &[(PathBuf, PathBuf)],
    ) -> Result<Vec<f64>, SidecarError> {
        let result = self.run_command(
            "lpips",
            serde_json::json!({ "pairs": pairs, "device": self.device }),
        )?;
        serde_json::from_value(
            result
                .get("scores")
                .cloned()
                .unwrap_or(serde_json::Value::Null),
        )
        .map_err(|e| SidecarError::Protocol(format!("lpips scores: {}", e)))
    }
}

impl NaturalnessBackend for ModelSidecar {
    fn naturalness_scores(&self, images: &[PathBuf]) -> Result<Vec<f64>, SidecarError> {
        let result = self.run_command(
            "niqe",
            serde_json::json!({ "images": images, "device": self.device }),
        )?;
        serde_json::from_value(
            result
                .get("scores")
                .cloned()
                .unwrap_or(serde_json::Value::Null),
        )
        .map_err(|e| SidecarError::Protocol(format!("niqe scores: {}", e)))
    }
}

impl SyncFeatureModel for ModelSidecar {
    fn evaluate(
        &self,
        audio_path: &Path,
        video_path: &Path,
        config: &SyncModelConfig,
    ) -> Result<SyncProfile, SidecarError> {
        let result = self.run_command(
            "sync",
            serde_json::json!({
                "audio": audio_path,
                "video": video_path,
                "model_path": self.sync_model_path,
                "batch_size": config.batch_size,
                "vshift": config.vshift,
                "reference": config.reference,
                "device": self.device,
            }),
        )?;
        serde_json::from_value(result)
            .map_err(|e| SidecarError::Protocol(format!("sync profile: {}", e)))
    }
}

impl FaceDetector for ModelSidecar {
    fn detect_frames(&self, frames_dir: &Path) -> Result<Vec<Vec<FaceDetection>>, SidecarError> {
        let result = self.run_command(
            "detect_faces",
            serde_json::json!({ "frames_dir": frames_dir, "device": self.device }),
        )?;

        // Wire format: one array per frame of {bbox: [x1,y1,x2,y2], conf}.
        let frames = result
            .get("frames")
            .and_then(|f| f.as_array())
            .ok_or_else(|| SidecarError::Protocol("detect_faces frames missing".to_string()))?;

        let mut detections = Vec::with_capacity(frames.len());
        for (frame_index, faces) in frames.iter().enumerate() {
            let faces = faces
                .as_array()
                .ok_or_else(|| SidecarError::Protocol("frame entry is not an array".to_string()))?;
            let mut frame_dets = Vec::with_capacity(faces.len());
            for face in faces {
                let bbox: Vec<f64> = serde_json::from_value(
                    face.get("bbox").cloned().unwrap_or(serde_json::Value::Null),
                )
                .map_err(|e| SidecarError::Protocol(format!("bbox: {}", e)))?;
                if bbox.len() != 4 {
                    return Err(SidecarError::Protocol("bbox must have 4 values".to_string()));
                }
                frame_dets.push(FaceDetection {
                    frame_index,
                    bbox: BoundingBox::new(bbox[0], bbox[1], bbox[2], bbox[3]),
                    confidence: face.get("conf").and_then(|c| c.as_f64()).unwrap_or(1.0),
                });
            }
            detections.push(frame_dets);
        }

        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_reports_reason() {
        let cap: Capability<u32> = Capability::unavailable("weights not found");
        assert!(!cap.is_ready());
        assert_eq!(cap.get().err(), Some("weights not found"));

        let ready = Capability::ready(7u32);
        assert!(ready.is_ready());
        assert_eq!(ready.get().ok(), Some(&7));
    }

    #[test]
    fn capability_from_result() {
        let ok: Capability<u32> = Capability::from_result(Ok::<_, SidecarError>(1));
        assert!(ok.is_ready());

        let err: Capability<u32> =
            Capability::from_result(Err::<u32, _>(SidecarError::SpawnFailed("gone".into())));
        assert!(!err.is_ready());
    }

    #[test]
    fn connect_fails_without_python() {
        let settings = ModelSettings {
            python: "/nonexistent/python3".to_string(),
            ..ModelSettings::default()
        };
        let result = ModelSidecar::connect(&settings);
        assert!(result.is_err());
    }
}
