//! Audio track extraction.
//!
//! Demuxes the audio track of a video into a mono 16 kHz PCM WAV file, the
//! format the sync feature model consumes. Extraction is deduplicated by the
//! deterministic output filename.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::{MediaError, MediaResult};

/// Check whether a media file has at least one audio stream.
pub fn has_audio_stream(path: &Path) -> MediaResult<bool> {
    if !path.exists() {
        return Err(MediaError::SourceNotFound(path.display().to_string()));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "a",
            "-show_entries",
            "stream=index",
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

    let data: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))
        .map_err(|e| MediaError::ParseError {
            what: "ffprobe JSON".to_string(),
            message: e.to_string(),
        })?;

    let count = data
        .get("streams")
        .and_then(|s| s.as_array())
        .map(|s| s.len())
        .unwrap_or(0);

    Ok(count > 0)
}

/// Extract the audio track of a video as `<stem>_audio.wav` in `output_dir`.
///
/// Returns `Ok(None)` when the video has no audio stream - downstream sync
/// metrics treat that as "metric unavailable", not a fatal error. If a file
/// with the deterministic name already exists, extraction is skipped.
pub fn extract_wav(video_path: &Path, output_dir: &Path) -> MediaResult<Option<PathBuf>> {
    if !video_path.exists() {
        return Err(MediaError::SourceNotFound(video_path.display().to_string()));
    }

    std::fs::create_dir_all(output_dir)?;

    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    let audio_path = output_dir.join(format!("{}_audio.wav", stem));

    if audio_path.exists() {
        tracing::debug!("Audio already extracted: {}", audio_path.display());
        return Ok(Some(audio_path));
    }

    if !has_audio_stream(video_path)? {
        tracing::warn!("No audio track in {}", video_path.display());
        return Ok(None);
    }

    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(video_path)
        .args(["-vn", "-ac", "1", "-ar", "16000", "-acodec", "pcm_s16le"])
        .arg(&audio_path)
        .output()
        .map_err(|e| MediaError::FfmpegError(format!("Failed to spawn FFmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::FfmpegError(format!(
            "Audio extraction failed: {}",
            stderr.lines().last().unwrap_or("unknown error")
        )));
    }

    if !audio_path.exists() {
        return Err(MediaError::FfmpegError(
            "FFmpeg reported success but produced no audio file".to_string(),
        ));
    }

    tracing::info!("Extracted audio: {}", audio_path.display());
    Ok(Some(audio_path))
}
