//! Media probing and extraction.
//!
//! All decoding goes through `ffprobe`/`ffmpeg` subprocesses:
//!
//! 1. **Probing** (`probe`): container/stream metadata for a video file.
//! 2. **Frame sampling** (`frames`): evenly-spaced or timestamp-matched frame
//!    extraction with a fixed target resolution.
//! 3. **Audio extraction** (`audio`): demux the audio track to a PCM WAV file.
//!
//! Per-position decode failures are tolerated (`None` placeholders); only a
//! completely unreadable source is an error.

mod audio;
mod frames;
mod probe;

pub use audio::{extract_wav, has_audio_stream};
pub use frames::{linspace, FrameSampler, FrameSet, MatchedFrames};
pub use probe::{probe_video, VideoHandle};

/// Error types for media operations.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Source file not found.
    #[error("Source file not found: {0}")]
    SourceNotFound(String),

    /// FFmpeg/ffprobe execution failed.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// The file has no usable video stream.
    #[error("No video stream in {0}")]
    NoVideoStream(String),

    /// Failed to parse tool output.
    #[error("Failed to parse {what}: {message}")]
    ParseError { what: String, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Type alias for media results.
pub type MediaResult<T> = Result<T, MediaError>;
