//! High-level face tracker: detection through cropped-video production.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::crop::{crop_track_video, extract_frame_images, CropConfig};
use super::detect::FaceDetector;
use super::smooth::smooth_track;
use super::track::{associate_tracks, select_longest, TrackerConfig};
use super::{TrackError, TrackResult};
use crate::config::SyncSettings;
use crate::sidecar::Capability;

/// Detects, tracks and crops the dominant face of a video.
pub struct FaceTracker {
    detector: Capability<Arc<dyn FaceDetector>>,
    tracker_config: TrackerConfig,
    crop_config: CropConfig,
    smooth_kernel: usize,
}

impl FaceTracker {
    /// Build a tracker from sync settings and a detector capability.
    pub fn new(settings: &SyncSettings, detector: Capability<Arc<dyn FaceDetector>>) -> Self {
        Self {
            detector,
            tracker_config: TrackerConfig {
                max_frame_gap: settings.max_frame_gap,
                iou_threshold: settings.iou_threshold,
                min_track_len: settings.min_track_len,
            },
            crop_config: CropConfig {
                crop_scale: settings.crop_scale,
                ..CropConfig::default()
            },
            smooth_kernel: settings.smooth_kernel,
        }
    }

    /// Produce a face-cropped version of `video_path` in `work_dir`.
    ///
    /// Fails with [`TrackError::NoUsableTrack`] when no track meets the
    /// minimum length and with [`TrackError::DetectorUnavailable`] when the
    /// detector backend is missing; callers fall back to the uncropped
    /// video in both cases.
    pub fn prepare_cropped_video(&self, video_path: &Path, work_dir: &Path) -> TrackResult<PathBuf> {
        let detector = match &self.detector {
            Capability::Ready(d) => Arc::clone(d),
            Capability::Unavailable { reason } => {
                return Err(TrackError::DetectorUnavailable(reason.clone()));
            }
        };

        let tmp = tempfile::Builder::new()
            .prefix("face_detect_")
            .tempdir()
            .map_err(TrackError::IoError)?;
        let frames_dir = tmp.path().join("frames");

        tracing::info!("Detecting faces in {}", video_path.display());
        extract_frame_images(video_path, &frames_dir)?;
        let detections = detector
            .detect_frames(&frames_dir)
            .map_err(|e| TrackError::DetectorUnavailable(e.to_string()))?;

        tracing::info!("Tracking faces across {} frames", detections.len());
        let tracks = associate_tracks(&detections, &self.tracker_config);
        let track = select_longest(&tracks).ok_or(TrackError::NoUsableTrack)?;
        tracing::info!(
            "Selected track: {} detections over frames {:?}..{:?}",
            track.len(),
            track.first_frame(),
            track.last_frame()
        );

        let smoothed = smooth_track(track, self.smooth_kernel);

        std::fs::create_dir_all(work_dir)?;
        let output = work_dir.join("cropped_face.mp4");
        crop_track_video(video_path, &smoothed, &output, &self.crop_config)?;

        Ok(output)
    }
}
