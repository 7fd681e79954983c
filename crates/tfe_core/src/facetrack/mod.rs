//! Face detection, tracking and cropping for the sync sub-pipeline.
//!
//! Converts a raw per-frame face-detection stream into stable face tracks
//! and produces one cropped, audio-muxed face video for the longest track:
//!
//! 1. **Detection** (`detect`): per-frame bounding boxes from the configured
//!    detector backend.
//! 2. **Association** (`track`): greedy streaming IOU tracking - a single
//!    active track at a time, closed tracks never reopened.
//! 3. **Smoothing** (`smooth`): gap interpolation plus median filtering of
//!    the per-frame box center and half-size.
//! 4. **Cropping** (`crop`): padded square crops resized to a fixed output
//!    size and reassembled into a video with the matching audio slice.
//!
//! When no track meets the minimum length the tracker reports
//! [`TrackError::NoUsableTrack`] and callers fall back to the original,
//! uncropped video.

mod crop;
mod detect;
mod smooth;
mod track;
mod tracker;
mod types;

pub use crop::{crop_track_video, extract_frame_images, CropConfig};
pub use detect::FaceDetector;
pub use smooth::{fill_frame_gaps, median_filter, smooth_track, SmoothedTrack};
pub use track::{associate_tracks, select_longest, TrackerConfig};
pub use tracker::FaceTracker;
pub use types::{BoundingBox, FaceDetection, RawTrack};

/// Error types for the face-tracking pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    /// No track met the minimum length requirement.
    #[error("No usable face track found")]
    NoUsableTrack,

    /// The detector backend is not available.
    #[error("Face detector unavailable: {0}")]
    DetectorUnavailable(String),

    /// FFmpeg invocation failed.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// A frame image could not be read back.
    #[error("Failed to load frame image: {0}")]
    FrameLoadError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Type alias for tracking results.
pub type TrackResult<T> = Result<T, TrackError>;
