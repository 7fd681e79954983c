//! Sync feature model contract.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sidecar::SidecarError;

/// Configuration passed by value to the sync feature model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncModelConfig {
    /// Batch size for feature extraction.
    pub batch_size: u32,
    /// Half-width of the alignment search window, in frames.
    pub vshift: u32,
    /// Reference mode for the alignment search.
    pub reference: String,
}

impl Default for SyncModelConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            vshift: 10,
            reference: "video".to_string(),
        }
    }
}

/// Result of the cross-modal alignment search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncProfile {
    /// Best integer audio-video offset, in frames.
    pub offset: f64,
    /// Confidence score derived from the gap between the best and
    /// second-best alignment.
    pub confidence: f64,
    /// Per-timestep distance matrix of shape `[T][2*vshift + 1]`.
    pub dists: Vec<Vec<f64>>,
}

/// Cross-modal feature matching over an audio track and a face video.
///
/// Implementations embed both modalities and search a bounded shift window
/// for the best alignment. The backing network is opaque to the core.
pub trait SyncFeatureModel: Send + Sync {
    /// Run the alignment search for one audio/video pair.
    fn evaluate(
        &self,
        audio_path: &Path,
        video_path: &Path,
        config: &SyncModelConfig,
    ) -> Result<SyncProfile, SidecarError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_search_window() {
        let config = SyncModelConfig::default();
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.vshift, 10);
        assert_eq!(config.reference, "video");
    }

    #[test]
    fn profile_serializes() {
        let profile = SyncProfile {
            offset: -2.0,
            confidence: 5.4,
            dists: vec![vec![1.0; 21]; 3],
        };
        let json = serde_json::to_string(&profile).unwrap();
        let parsed: SyncProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.dists.len(), 3);
        assert_eq!(parsed.dists[0].len(), 21);
    }
}
