//! Session data model.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::media::VideoHandle;
use crate::metrics::MetricResult;

/// Lifecycle of one evaluation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Settings accepted, no media bound yet.
    Configured,
    /// Generated (and optionally reference) video bound and probed.
    MediaBound,
    /// Metrics computed and summary derived.
    Summarized,
    /// Report written (or persistence failure reported).
    Persisted,
}

/// Identification block of a session report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Stem of the generated video file.
    pub video_name: String,
    /// Path of the generated video.
    pub generated_video: PathBuf,
    /// Path of the reference video, when bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_video: Option<PathBuf>,
    /// Probed metadata of the generated video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_info: Option<VideoHandle>,
    /// Probed metadata of the reference video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_info: Option<VideoHandle>,
    /// Local wall-clock time of the evaluation.
    pub evaluation_time: String,
    /// Echo of the configuration used.
    pub config: Settings,
}

/// Aggregated weighted summary over the successful metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Weighted overall score in [0, 1].
    pub overall_score: f64,
    /// Normalized weights actually applied (successful metrics only).
    pub weights: BTreeMap<String, f64>,
    /// Metric keys that contributed to the score.
    pub valid_metrics: Vec<String>,
    /// Qualitative band for the overall score.
    pub interpretation: String,
    /// Local wall-clock time the summary was computed.
    pub calculation_time: String,
}

/// One evaluation session's accumulated results.
///
/// Created per `evaluate()` call and not reused across videos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSession {
    /// Identification and configuration echo.
    pub video_info: VideoInfo,
    /// Per-metric results, keyed by canonical metric name.
    pub metrics: BTreeMap<String, MetricResult>,
    /// Weighted summary.
    pub summary: Summary,
}

/// Error types for session orchestration.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The generated video is missing or unreadable (fatal).
    #[error("Generated video not usable: {0}")]
    GeneratedVideo(String),

    /// The reference video was supplied but is missing or unreadable (fatal).
    #[error("Reference video not usable: {0}")]
    ReferenceVideo(String),

    /// The supplied identity source image does not exist (fatal).
    #[error("Source image not found: {0}")]
    SourceImage(String),

    /// A lifecycle method was called out of order.
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// IO error during session setup.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
