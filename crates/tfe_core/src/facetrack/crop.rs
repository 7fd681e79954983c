//! Face-region cropping and cropped-video assembly.
//!
//! For the selected track, every covered source frame is padded, cropped
//! around the smoothed box center, resized to a fixed square and written
//! back out as an image sequence; ffmpeg assembles the sequence into a video
//! and muxes on the matching audio slice of the source.

use std::path::Path;
use std::process::Command;

use image::{DynamicImage, GenericImage, Rgb, RgbImage};

use super::smooth::SmoothedTrack;
use super::{TrackError, TrackResult};

/// Gray fill value for padded borders.
const PAD_FILL: u8 = 110;

/// Configuration for face cropping.
#[derive(Debug, Clone)]
pub struct CropConfig {
    /// Extra margin around the face box, as a fraction of its half-size.
    pub crop_scale: f64,
    /// Frame rate of the assembled cropped video.
    pub frame_rate: f64,
    /// Side length of the square output crop.
    pub output_size: u32,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            crop_scale: 0.4,
            frame_rate: 25.0,
            output_size: 224,
        }
    }
}

/// Dump every frame of a video as JPEG images into `frames_dir`.
///
/// Files are named `%06d.jpg` starting at 000001, matching ffmpeg's image2
/// numbering, so frame index `i` maps to file `i + 1`.
pub fn extract_frame_images(video_path: &Path, frames_dir: &Path) -> TrackResult<()> {
    std::fs::create_dir_all(frames_dir)?;

    let pattern = frames_dir.join("%06d.jpg");
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(video_path)
        .args(["-qscale:v", "2", "-f", "image2"])
        .arg(&pattern)
        .output()
        .map_err(|e| TrackError::FfmpegError(format!("Failed to spawn FFmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TrackError::FfmpegError(format!(
            "Frame extraction failed: {}",
            stderr.lines().last().unwrap_or("unknown error")
        )));
    }

    Ok(())
}

/// Crop one frame around the smoothed box.
///
/// The source is padded on all sides by `half_size * (1 + 2*crop_scale)`
/// pixels of constant gray; the crop window in padded space is centered on
/// the box center with half-height `half_size` and half-width
/// `half_size * (1 + crop_scale)`, which yields a square window of side
/// `2 * half_size * (1 + crop_scale)`.
fn crop_frame(
    frame: &DynamicImage,
    center_x: f64,
    center_y: f64,
    half_size: f64,
    config: &CropConfig,
) -> DynamicImage {
    let cs = config.crop_scale;
    let bs = half_size;
    let bsi = (bs * (1.0 + 2.0 * cs)).max(1.0) as u32;

    let src = frame.to_rgb8();
    let (w, h) = src.dimensions();

    let mut padded = RgbImage::from_pixel(w + 2 * bsi, h + 2 * bsi, Rgb([PAD_FILL; 3]));
    padded
        .copy_from(&src, bsi, bsi)
        .expect("padded image always fits the source");

    let my = center_y + bsi as f64;
    let mx = center_x + bsi as f64;

    let y1 = (my - bs).max(0.0) as u32;
    let y2 = (my + bs * (1.0 + 2.0 * cs)) as u32;
    let x1 = (mx - bs * (1.0 + cs)).max(0.0) as u32;
    let x2 = (mx + bs * (1.0 + cs)) as u32;

    let (pw, ph) = padded.dimensions();
    let x2 = x2.min(pw);
    let y2 = y2.min(ph);
    let crop_w = x2.saturating_sub(x1).max(1);
    let crop_h = y2.saturating_sub(y1).max(1);

    let face = image::imageops::crop_imm(&padded, x1, y1, crop_w, crop_h).to_image();
    DynamicImage::ImageRgb8(face).resize_exact(
        config.output_size,
        config.output_size,
        image::imageops::FilterType::Lanczos3,
    )
}

/// Produce a cropped, audio-muxed face video for one smoothed track.
///
/// `source_path` is the original video, `track` the selected smoothed track,
/// `output_path` the final cropped video. All intermediate files live in a
/// scoped temp dir that is removed on every exit path.
pub fn crop_track_video(
    source_path: &Path,
    track: &SmoothedTrack,
    output_path: &Path,
    config: &CropConfig,
) -> TrackResult<()> {
    if track.is_empty() {
        return Err(TrackError::NoUsableTrack);
    }

    let tmp = tempfile::Builder::new()
        .prefix("face_crop_")
        .tempdir()
        .map_err(TrackError::IoError)?;

    let frames_dir = tmp.path().join("frames");
    extract_frame_images(source_path, &frames_dir)?;

    let crops_dir = tmp.path().join("crops");
    std::fs::create_dir_all(&crops_dir)?;

    let mut written = 0usize;
    for (i, &frame_index) in track.frames.iter().enumerate() {
        // ffmpeg image2 numbering starts at 1
        let src_path = frames_dir.join(format!("{:06}.jpg", frame_index + 1));
        if !src_path.exists() {
            break;
        }

        let frame = image::open(&src_path)
            .map_err(|e| TrackError::FrameLoadError(format!("{}: {}", src_path.display(), e)))?;

        let face = crop_frame(
            &frame,
            track.center_x[i],
            track.center_y[i],
            track.half_size[i],
            config,
        );

        let out_path = crops_dir.join(format!("{:06}.png", written + 1));
        face.save(&out_path)
            .map_err(|e| TrackError::FrameLoadError(format!("{}: {}", out_path.display(), e)))?;
        written += 1;
    }

    if written == 0 {
        return Err(TrackError::NoUsableTrack);
    }

    // Assemble the silent cropped video.
    let silent_video = tmp.path().join("cropped.mp4");
    let pattern = crops_dir.join("%06d.png");
    let output = Command::new("ffmpeg")
        .arg("-y")
        .args(["-framerate", &format!("{}", config.frame_rate)])
        .arg("-i")
        .arg(&pattern)
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .arg(&silent_video)
        .output()
        .map_err(|e| TrackError::FfmpegError(format!("Failed to spawn FFmpeg: {}", e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TrackError::FfmpegError(format!(
            "Crop video assembly failed: {}",
            stderr.lines().last().unwrap_or("unknown error")
        )));
    }

    // Extract the audio slice covering the track's time range.
    let (audio_start, audio_end) = track.time_range(config.frame_rate);
    let audio_path = tmp.path().join("audio.wav");
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(source_path)
        .args([
            "-ss",
            &format!("{:.3}", audio_start),
            "-to",
            &format!("{:.3}", audio_end),
            "-ac",
            "1",
            "-vn",
            "-acodec",
            "pcm_s16le",
            "-ar",
            "16000",
        ])
        .arg(&audio_path)
        .output()
        .map_err(|e| TrackError::FfmpegError(format!("Failed to spawn FFmpeg: {}", e)))?;

    if output.status.success() && audio_path.exists() {
        // Mux audio onto the cropped video.
        let output = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(&silent_video)
            .arg("-i")
            .arg(&audio_path)
            .args(["-c:v", "copy", "-c:a", "aac"])
            .arg(output_path)
            .output()
            .map_err(|e| TrackError::FfmpegError(format!("Failed to spawn FFmpeg: {}", e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrackError::FfmpegError(format!(
                "Audio mux failed: {}",
                stderr.lines().last().unwrap_or("unknown error")
            )));
        }
    } else {
        // Source without audio: ship the silent crop.
        tracing::warn!("No audio slice extracted; cropped video will be silent");
        std::fs::copy(&silent_video, output_path)?;
    }

    tracing::info!(
        "Cropped face video written: {} ({} frames)",
        output_path.display(),
        written
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn gradient_frame(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn crop_frame_is_output_sized() {
        let frame = gradient_frame(640, 480);
        let config = CropConfig::default();
        let face = crop_frame(&frame, 320.0, 240.0, 60.0, &config);
        assert_eq!(face.dimensions(), (224, 224));
    }

    #[test]
    fn crop_near_border_uses_padding() {
        // Face box hugging the top-left corner: the window extends into the
        // padded area instead of failing.
        let frame = gradient_frame(320, 240);
        let config = CropConfig::default();
        let face = crop_frame(&frame, 10.0, 10.0, 50.0, &config);
        assert_eq!(face.dimensions(), (224, 224));

        // The top-left of the crop comes from the gray padding.
        let rgb = face.to_rgb8();
        let corner = rgb.get_pixel(0, 0);
        assert_eq!(corner.0, [PAD_FILL; 3]);
    }

    #[test]
    fn crop_empty_track_is_rejected() {
        let track = SmoothedTrack {
            frames: Vec::new(),
            center_x: Vec::new(),
            center_y: Vec::new(),
            half_size: Vec::new(),
        };
        let out = std::env::temp_dir().join("tfe_crop_test_out.mp4");
        let result = crop_track_video(Path::new("/nonexistent.mp4"), &track, &out, &CropConfig::default());
        assert!(matches!(result, Err(TrackError::NoUsableTrack)));
    }
}
