//! Metric identities and results.

use serde::{Deserialize, Serialize};

/// The fixed set of supported metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Identity,
    Fid,
    Lpips,
    Ssim,
    Psnr,
    Niqe,
    Lsec,
    Lsed,
}

/// Whether lower or higher raw values indicate better quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherBetter,
    LowerBetter,
}

/// Input artifacts a metric needs before it can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRequirement {
    SourceImage,
    ReferenceVideo,
    GeneratedVideo,
    Audio,
}

impl DataRequirement {
    /// Human-readable name used in "requirement not met" messages.
    pub fn describe(&self) -> &'static str {
        match self {
            DataRequirement::SourceImage => "source identity image",
            DataRequirement::ReferenceVideo => "reference video",
            DataRequirement::GeneratedVideo => "generated video",
            DataRequirement::Audio => "extracted audio",
        }
    }
}

impl MetricKind {
    /// All supported metrics, in evaluation order.
    pub fn all() -> [MetricKind; 8] {
        [
            MetricKind::Identity,
            MetricKind::Fid,
            MetricKind::Lpips,
            MetricKind::Ssim,
            MetricKind::Psnr,
            MetricKind::Niqe,
            MetricKind::Lsec,
            MetricKind::Lsed,
        ]
    }

    /// Canonical lowercase key, used in config, reports and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Identity => "identity",
            MetricKind::Fid => "fid",
            MetricKind::Lpips => "lpips",
            MetricKind::Ssim => "ssim",
            MetricKind::Psnr => "psnr",
            MetricKind::Niqe => "niqe",
            MetricKind::Lsec => "lsec",
            MetricKind::Lsed => "lsed",
        }
    }

    /// Display name used in summaries.
    pub fn display_name(&self) -> &'static str {
        match self {
            MetricKind::Identity => "Identity Similarity",
            MetricKind::Fid => "FID",
            MetricKind::Lpips => "LPIPS",
            MetricKind::Ssim => "SSIM",
            MetricKind::Psnr => "PSNR",
            MetricKind::Niqe => "NIQE",
            MetricKind::Lsec => "LSE-C",
            MetricKind::Lsed => "LSE-D",
        }
    }

    /// Parse a canonical key.
    pub fn parse(name: &str) -> Option<MetricKind> {
        match name {
            "identity" => Some(MetricKind::Identity),
            "fid" => Some(MetricKind::Fid),
            "lpips" => Some(MetricKind::Lpips),
            "ssim" => Some(MetricKind::Ssim),
            "psnr" => Some(MetricKind::Psnr),
            "niqe" => Some(MetricKind::Niqe),
            "lsec" => Some(MetricKind::Lsec),
            "lsed" => Some(MetricKind::Lsed),
            _ => None,
        }
    }

    /// Which numeric direction means "better".
    pub fn direction(&self) -> Direction {
        match self {
            MetricKind::Identity | MetricKind::Ssim | MetricKind::Psnr => Direction::HigherBetter,
            MetricKind::Fid | MetricKind::Lpips | MetricKind::Niqe | MetricKind::Lsec
            | MetricKind::Lsed => Direction::LowerBetter,
        }
    }

    /// Default aggregation weight.
    pub fn default_weight(&self) -> f64 {
        match self {
            MetricKind::Identity => 0.2,
            MetricKind::Fid => 0.2,
            MetricKind::Lpips => 0.15,
            MetricKind::Ssim => 0.1,
            MetricKind::Psnr => 0.1,
            MetricKind::Niqe => 0.1,
            MetricKind::Lsec => 0.075,
            MetricKind::Lsed => 0.075,
        }
    }

    /// Direction-appropriate "worst" value reported on failure.
    pub fn error_sentinel(&self) -> f64 {
        match self {
            MetricKind::Identity => 0.0,
            MetricKind::Fid => f64::INFINITY,
            MetricKind::Lpips => 1.0,
            MetricKind::Ssim => 0.0,
            MetricKind::Psnr => 0.0,
            MetricKind::Niqe => 100.0,
            MetricKind::Lsec => 0.0,
            MetricKind::Lsed => 1.0,
        }
    }

    /// Input artifacts this metric needs.
    pub fn requirements(&self) -> &'static [DataRequirement] {
        match self {
            MetricKind::Identity => {
                &[DataRequirement::SourceImage, DataRequirement::GeneratedVideo]
            }
            MetricKind::Fid | MetricKind::Lpips | MetricKind::Ssim | MetricKind::Psnr => &[
                DataRequirement::ReferenceVideo,
                DataRequirement::GeneratedVideo,
            ],
            MetricKind::Niqe => &[DataRequirement::GeneratedVideo],
            MetricKind::Lsec | MetricKind::Lsed => {
                &[DataRequirement::Audio, DataRequirement::GeneratedVideo]
            }
        }
    }
}

/// Outcome status of one metric computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Success,
    Error,
}

/// Summary statistics over per-unit scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Compute mean/std/min/max of a score list. Returns None when empty.
pub fn score_stats(scores: &[f64]) -> Option<ScoreStats> {
    if scores.is_empty() {
        return None;
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some(ScoreStats {
        mean,
        std: variance.sqrt(),
        min,
        max,
    })
}

/// The outcome of one metric in one evaluation session.
///
/// Created once per metric and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricResult {
    /// Display name of the metric.
    pub name: String,
    /// Primary value (mean over units where applicable). Non-finite values
    /// encode as JSON null and decode back to +infinity.
    #[serde(with = "json_float")]
    pub value: f64,
    /// Success or error.
    pub status: MetricStatus,
    /// Human-readable failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Mean over per-unit scores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    /// Standard deviation over per-unit scores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    /// Minimum per-unit score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum per-unit score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Number of frames/pairs that contributed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_frames: Option<usize>,
    /// Per-unit scores.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scores: Vec<f64>,
    /// Qualitative interpretation from the metric's threshold table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
    /// Best audio-video offset in frames (sync metrics only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    /// Raw model confidence (sync metrics only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl MetricResult {
    /// Create a successful result with a primary value.
    pub fn success(kind: MetricKind, value: f64) -> Self {
        Self {
            name: kind.display_name().to_string(),
            value,
            status: MetricStatus::Success,
            message: None,
            mean: None,
            std: None,
            min: None,
            max: None,
            num_frames: None,
            scores: Vec::new(),
            interpretation: None,
            offset: None,
            confidence: None,
        }
    }

    /// Create an error result carrying the metric's sentinel value.
    pub fn error(kind: MetricKind, message: impl Into<String>) -> Self {
        Self {
            name: kind.display_name().to_string(),
            value: kind.error_sentinel(),
            status: MetricStatus::Error,
            message: Some(message.into()),
            mean: None,
            std: None,
            min: None,
            max: None,
            num_frames: None,
            scores: Vec::new(),
            interpretation: None,
            offset: None,
            confidence: None,
        }
    }

    /// Attach per-unit scores and their statistics.
    pub fn with_scores(mut self, scores: Vec<f64>) -> Self {
        if let Some(stats) = score_stats(&scores) {
            self.mean = Some(stats.mean);
            self.std = Some(stats.std);
            self.min = Some(stats.min);
            self.max = Some(stats.max);
            self.num_frames = Some(scores.len());
        }
        self.scores = scores;
        self
    }

    /// Attach the qualitative interpretation.
    pub fn with_interpretation(mut self, text: impl Into<String>) -> Self {
        self.interpretation = Some(text.into());
        self
    }

    /// Attach sync diagnostics.
    pub fn with_sync_details(mut self, offset: f64, confidence: f64) -> Self {
        self.offset = Some(offset);
        self.confidence = Some(confidence);
        self
    }

    /// True when the metric succeeded.
    pub fn is_success(&self) -> bool {
        self.status == MetricStatus::Success
    }
}

/// JSON encoding for possibly non-finite floats: non-finite serializes as
/// null, null deserializes to +infinity (only the FID sentinel is ever
/// non-finite).
mod json_float {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
