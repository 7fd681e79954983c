//! Settings struct with TOML-based sections.
//!
//! Each section maps to a TOML table and can be deserialized independently,
//! with missing fields taking the documented defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Frame sampling and resizing.
    #[serde(default)]
    pub video: VideoSettings,

    /// External model backends.
    #[serde(default)]
    pub models: ModelSettings,

    /// Audio-visual sync pipeline (face tracking + feature matching).
    #[serde(default)]
    pub sync: SyncSettings,

    /// Metric selection and weighting.
    #[serde(default)]
    pub metrics: MetricSettings,

    /// Report output.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Frame sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    /// Target frame width after resize.
    #[serde(default = "default_resolution")]
    pub width: u32,

    /// Target frame height after resize.
    #[serde(default = "default_resolution")]
    pub height: u32,

    /// Number of frames sampled per video.
    #[serde(default = "default_num_frames")]
    pub num_frames: usize,

    /// Wall-clock time (seconds) of the reference frame used as the
    /// identity source image when none is supplied explicitly.
    #[serde(default = "default_identity_frame_time")]
    pub identity_frame_time: f64,
}

fn default_resolution() -> u32 {
    512
}

fn default_num_frames() -> usize {
    30
}

fn default_identity_frame_time() -> f64 {
    0.5
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: default_resolution(),
            height: default_resolution(),
            num_frames: default_num_frames(),
            identity_frame_time: default_identity_frame_time(),
        }
    }
}

/// External model backend configuration.
///
/// Neural backends (face embedding, FID/LPIPS/NIQE, sync features, face
/// detection) run out of process in a Python sidecar; the core only speaks
/// its JSON protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Compute device requested from the sidecar ("cuda" or "cpu").
    /// The sidecar falls back to CPU when CUDA is unavailable.
    #[serde(default = "default_device")]
    pub device: String,

    /// Python executable used to launch the sidecar.
    #[serde(default = "default_python")]
    pub python: String,

    /// Python module implementing the sidecar protocol.
    #[serde(default = "default_sidecar_module")]
    pub sidecar_module: String,

    /// Path to the sync model weights, passed through to the sidecar.
    #[serde(default = "default_sync_model_path")]
    pub sync_model_path: String,
}

fn default_device() -> String {
    "cuda".to_string()
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_sidecar_module() -> String {
    "tfe_models.cli".to_string()
}

fn default_sync_model_path() -> String {
    "models/syncnet.pth".to_string()
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            device: default_device(),
            python: default_python(),
            sidecar_module: default_sidecar_module(),
            sync_model_path: default_sync_model_path(),
        }
    }
}

/// Audio-visual sync pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Crop the face region before feature matching.
    #[serde(default = "default_true")]
    pub enable_face_crop: bool,

    /// Sidecar batch size for feature extraction.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Half-width of the alignment search window, in frames.
    #[serde(default = "default_vshift")]
    pub vshift: u32,

    /// Extra margin around the detected face box when cropping.
    #[serde(default = "default_crop_scale")]
    pub crop_scale: f64,

    /// Minimum face-track length (frames) for a track to be usable.
    #[serde(default = "default_min_track_len")]
    pub min_track_len: usize,

    /// Maximum frame gap bridged within a single track.
    #[serde(default = "default_max_frame_gap")]
    pub max_frame_gap: usize,

    /// IOU threshold for associating a detection with the active track.
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f64,

    /// Median-filter kernel for bbox smoothing (odd).
    #[serde(default = "default_smooth_kernel")]
    pub smooth_kernel: usize,
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> u32 {
    20
}

fn default_vshift() -> u32 {
    10
}

fn default_crop_scale() -> f64 {
    0.4
}

fn default_min_track_len() -> usize {
    100
}

fn default_max_frame_gap() -> usize {
    25
}

fn default_iou_threshold() -> f64 {
    0.5
}

fn default_smooth_kernel() -> usize {
    13
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enable_face_crop: true,
            batch_size: default_batch_size(),
            vshift: default_vshift(),
            crop_scale: default_crop_scale(),
            min_track_len: default_min_track_len(),
            max_frame_gap: default_max_frame_gap(),
            iou_threshold: default_iou_threshold(),
            smooth_kernel: default_smooth_kernel(),
        }
    }
}

/// Metric selection and weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSettings {
    /// Named preset resolved by the registry (full/basic/sync/quality).
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Explicit metric list. Overrides the preset when non-empty.
    #[serde(default)]
    pub metrics: Vec<String>,

    /// Per-metric weight overrides. Empty means the built-in defaults.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

fn default_preset() -> String {
    "full".to_string()
}

impl Default for MetricSettings {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            metrics: Vec::new(),
            weights: BTreeMap::new(),
        }
    }
}

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory that receives JSON reports, CSV summaries and batch summaries.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_output_dir() -> String {
    "evaluation_results".to_string()
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[video]"));
        assert!(toml.contains("[sync]"));
        assert!(toml.contains("output_dir"));
    }

    #[test]
    fn settings_round_trip() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.video.num_frames, settings.video.num_frames);
        assert_eq!(parsed.sync.vshift, settings.sync.vshift);
        assert_eq!(parsed.metrics.preset, settings.metrics.preset);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[video]\nnum_frames = 10";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        // Custom value preserved
        assert_eq!(parsed.video.num_frames, 10);
        // Defaults applied for missing
        assert_eq!(parsed.video.width, 512);
        assert_eq!(parsed.sync.min_track_len, 100);
        assert_eq!(parsed.models.device, "cuda");
    }

    #[test]
    fn weight_overrides_parse() {
        let text = "[metrics]\npreset = \"basic\"\n[metrics.weights]\nssim = 0.5\nfid = 0.5";
        let parsed: Settings = toml::from_str(text).unwrap();
        assert_eq!(parsed.metrics.preset, "basic");
        assert_eq!(parsed.metrics.weights.get("ssim"), Some(&0.5));
    }
}
