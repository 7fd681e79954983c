//! Video metadata probing via ffprobe.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use super::{MediaError, MediaResult};

/// Probed metadata for a video file.
///
/// Immutable once probed; callers re-probe per session rather than caching
/// handles across evaluations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoHandle {
    /// Path to the video file.
    pub path: PathBuf,
    /// Frame rate in frames per second.
    pub fps: f64,
    /// Total number of frames.
    pub total_frames: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl VideoHandle {
    /// Duration in seconds, derived from frame count and rate.
    pub fn duration(&self) -> f64 {
        if self.fps > 0.0 {
            self.total_frames as f64 / self.fps
        } else {
            0.0
        }
    }

    /// Clamped frame index for a wall-clock timestamp.
    pub fn frame_index_at(&self, timestamp_secs: f64) -> u64 {
        let idx = (timestamp_secs * self.fps).floor();
        let max = self.total_frames.saturating_sub(1);
        if idx <= 0.0 {
            0
        } else {
            (idx as u64).min(max)
        }
    }
}

/// Probe a video file with ffprobe.
///
/// Returns a handle with fps, frame count and resolution. A missing file,
/// a file without a video stream, or zero fps/frames is an error - there is
/// nothing a frame-based metric could do with such a source.
pub fn probe_video(path: &Path) -> MediaResult<VideoHandle> {
    if !path.exists() {
        return Err(MediaError::SourceNotFound(path.display().to_string()));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=r_frame_rate,nb_frames,duration,width,height",
            "-show_entries",
            "format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| MediaError::FfmpegError(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(MediaError::FfmpegError(format!(
            "ffprobe failed for {}",
            path.display()
        )));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let data: serde_json::Value =
        serde_json::from_str(&json_str).map_err(|e| MediaError::ParseError {
            what: "ffprobe JSON".to_string(),
            message: e.to_string(),
        })?;

    let streams = data.get("streams").and_then(|s| s.as_array());
    let stream = match streams.and_then(|s| s.first()) {
        Some(s) => s,
        None => return Err(MediaError::NoVideoStream(path.display().to_string())),
    };

    let fps = stream
        .get("r_frame_rate")
        .and_then(|v| v.as_str())
        .and_then(parse_fps_fraction)
        .unwrap_or(0.0);

    let width = stream.get("width").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
    let height = stream.get("height").and_then(|v| v.as_u64()).unwrap_or(0) as u32;

    // nb_frames is often absent (e.g. MKV); fall back to duration * fps.
    let mut total_frames = stream
        .get("nb_frames")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    if total_frames == 0 {
        let duration = stream
            .get("duration")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<f64>().ok())
            .or_else(|| {
                data.get("format")
                    .and_then(|f| f.get("duration"))
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse::<f64>().ok())
            })
            .unwrap_or(0.0);
        if duration > 0.0 && fps > 0.0 {
            total_frames = (duration * fps).round() as u64;
        }
    }

    if fps <= 0.0 || total_frames == 0 {
        return Err(MediaError::NoVideoStream(path.display().to_string()));
    }

    tracing::debug!(
        "Probed {}: {}x{} @ {:.3} fps, {} frames",
        path.display(),
        width,
        height,
        fps,
        total_frames
    );

    Ok(VideoHandle {
        path: path.to_path_buf(),
        fps,
        total_frames,
        width,
        height,
    })
}

/// Parse an ffprobe rate fraction like "30000/1001".
fn parse_fps_fraction(text: &str) -> Option<f64> {
    match text.split_once('/') {
        Some((num, denom)) => {
            let num: f64 = num.parse().ok()?;
            let denom: f64 = denom.parse().ok()?;
            if denom == 0.0 {
                None
            } else {
                Some(num / denom)
            }
        }
        None => text.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(fps: f64, total_frames: u64) -> VideoHandle {
        VideoHandle {
            path: PathBuf::from("/test.mp4"),
            fps,
            total_frames,
            width: 512,
            height: 512,
        }
    }

    #[test]
    fn duration_derives_from_frames_and_fps() {
        let h = handle(25.0, 250);
        assert!((h.duration() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn duration_is_zero_for_zero_fps() {
        assert_eq!(handle(0.0, 250).duration(), 0.0);
    }

    #[test]
    fn frame_index_is_clamped() {
        let h = handle(25.0, 100);
        assert_eq!(h.frame_index_at(0.0), 0);
        assert_eq!(h.frame_index_at(1.0), 25);
        // Past the end clamps to the last frame
        assert_eq!(h.frame_index_at(100.0), 99);
        // Negative timestamps clamp to the first frame
        assert_eq!(h.frame_index_at(-1.0), 0);
    }

    #[test]
    fn fps_fraction_parses() {
        assert_eq!(parse_fps_fraction("25/1"), Some(25.0));
        let ntsc = parse_fps_fraction("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
        assert_eq!(parse_fps_fraction("0/0"), None);
        assert_eq!(parse_fps_fraction("24"), Some(24.0));
    }

    #[test]
    fn probe_rejects_missing_file() {
        let result = probe_video(Path::new("/nonexistent/video.mp4"));
        assert!(matches!(result, Err(MediaError::SourceNotFound(_))));
    }
}
