//! Frame sampling and alignment.
//!
//! Frames are pulled one at a time with ffmpeg seek+decode, resized to a
//! fixed target resolution, and handed to metrics either as a single sampled
//! set or as timestamp-matched pairs across two videos.

use std::io::Cursor;
use std::path::Path;
use std::process::Command;

use image::DynamicImage;

use super::probe::VideoHandle;

/// An ordered sequence of decoded frames and their sampling timestamps.
///
/// `frames[i]` is `None` when decoding failed at `timestamps[i]`; both
/// vectors always have equal length.
#[derive(Debug, Default)]
pub struct FrameSet {
    /// Decoded frames, `None` where decoding failed.
    pub frames: Vec<Option<DynamicImage>>,
    /// Sampling timestamps in seconds.
    pub timestamps: Vec<f64>,
}

impl FrameSet {
    /// Iterate over the successfully decoded frames.
    pub fn decoded(&self) -> impl Iterator<Item = &DynamicImage> {
        self.frames.iter().filter_map(|f| f.as_ref())
    }

    /// Number of successfully decoded frames.
    pub fn decoded_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }

    /// True when nothing was decoded.
    pub fn is_empty(&self) -> bool {
        self.decoded_count() == 0
    }
}

/// Timestamp-matched frame pairs from two videos.
///
/// Only positions where both videos decoded successfully are kept, so the
/// result may hold fewer pairs than were requested.
#[derive(Debug, Default)]
pub struct MatchedFrames {
    /// Frames from the first (reference) video.
    pub reference: Vec<DynamicImage>,
    /// Frames from the second (generated) video, parallel to `reference`.
    pub generated: Vec<DynamicImage>,
    /// Timestamps of the kept positions, in seconds.
    pub timestamps: Vec<f64>,
    /// Number of pairs originally requested.
    pub requested: usize,
}

impl MatchedFrames {
    /// Number of matched pairs.
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    /// True when no pair survived.
    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }
}

/// Evenly spaced values over `[start, stop)` (endpoint excluded).
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    if num == 0 {
        return Vec::new();
    }
    let step = (stop - start) / num as f64;
    (0..num).map(|i| start + step * i as f64).collect()
}

/// Samples frames from probed videos at computed timestamps.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    target_width: u32,
    target_height: u32,
}

impl FrameSampler {
    /// Create a sampler with the given target resolution.
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Sample `num_frames` evenly over the full duration of one video.
    ///
    /// Timestamps are `linspace(0, duration, N)` with the endpoint excluded.
    /// Positions that fail to decode are kept as `None` placeholders.
    pub fn sample(&self, video: &VideoHandle, num_frames: usize) -> FrameSet {
        let duration = video.duration();
        if duration <= 0.0 {
            return FrameSet::default();
        }

        let timestamps = linspace(0.0, duration, num_frames);
        let frames = timestamps
            .iter()
            .map(|&ts| self.decode_at(video, ts))
            .collect();

        FrameSet { frames, timestamps }
    }

    /// Sample matched frame pairs from two videos at identical timestamps.
    ///
    /// The sampling window is `[0, min(duration_a, duration_b))` so neither
    /// video is sampled past its end. Only positions where both videos
    /// decoded are kept.
    pub fn sample_matched(
        &self,
        reference: &VideoHandle,
        generated: &VideoHandle,
        num_frames: usize,
    ) -> MatchedFrames {
        let min_duration = reference.duration().min(generated.duration());
        if min_duration <= 0.0 {
            return MatchedFrames {
                requested: num_frames,
                ..MatchedFrames::default()
            };
        }

        let timestamps = linspace(0.0, min_duration, num_frames);

        let mut matched = MatchedFrames {
            requested: num_frames,
            ..MatchedFrames::default()
        };

        for &ts in &timestamps {
            let ref_frame = self.decode_at(reference, ts);
            let gen_frame = self.decode_at(generated, ts);
            if let (Some(r), Some(g)) = (ref_frame, gen_frame) {
                matched.reference.push(r);
                matched.generated.push(g);
                matched.timestamps.push(ts);
            }
        }

        if matched.len() < num_frames {
            tracing::debug!(
                "Matched extraction kept {}/{} pairs",
                matched.len(),
                num_frames
            );
        }

        matched
    }

    /// Decode the single frame nearest a wall-clock time.
    ///
    /// Used to pull the identity source frame out of the reference video.
    pub fn frame_at_time(&self, video: &VideoHandle, timestamp_secs: f64) -> Option<DynamicImage> {
        self.decode_at(video, timestamp_secs)
    }

    /// Decode and resize one frame. Returns None on any decode failure.
    fn decode_at(&self, video: &VideoHandle, timestamp_secs: f64) -> Option<DynamicImage> {
        // Snap the timestamp to the clamped frame index so seeks near the
        // end of the stream still land on a real frame.
        let frame_index = video.frame_index_at(timestamp_secs);
        let seek_secs = frame_index as f64 / video.fps;

        let output = Command::new("ffmpeg")
            .args([
                "-ss",
                &format!("{:.6}", seek_secs),
                "-i",
                video.path.to_str().unwrap_or(""),
                "-vframes",
                "1",
                "-f",
                "image2pipe",
                "-vcodec",
                "png",
                "-",
            ])
            .output()
            .ok()?;

        if !output.status.success() || output.stdout.is_empty() {
            tracing::trace!(
                "Frame decode failed at {:.3}s in {}",
                timestamp_secs,
                video.path.display()
            );
            return None;
        }

        let img = image::load(Cursor::new(output.stdout), image::ImageFormat::Png).ok()?;
        Some(img.resize_exact(
            self.target_width,
            self.target_height,
            image::imageops::FilterType::Lanczos3,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn handle(fps: f64, total_frames: u64) -> VideoHandle {
        VideoHandle {
            path: PathBuf::from("/nonexistent/video.mp4"),
            fps,
            total_frames,
            width: 64,
            height: 64,
        }
    }

    #[test]
    fn linspace_excludes_endpoint() {
        let ts = linspace(0.0, 10.0, 5);
        assert_eq!(ts, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn linspace_handles_zero_count() {
        assert!(linspace(0.0, 10.0, 0).is_empty());
    }

    #[test]
    fn matched_timestamps_stay_within_shorter_duration() {
        // 10s and 4s videos: all timestamps must lie in [0, 4)
        let a = handle(25.0, 250);
        let b = handle(25.0, 100);
        let min_duration = a.duration().min(b.duration());
        let ts = linspace(0.0, min_duration, 30);
        assert_eq!(ts.len(), 30);
        assert!(ts.iter().all(|&t| t >= 0.0 && t < 4.0));
    }

    #[test]
    fn sample_of_zero_duration_video_is_empty() {
        let sampler = FrameSampler::new(64, 64);
        let video = handle(0.0, 0);
        let set = sampler.sample(&video, 30);
        assert!(set.is_empty());
        assert!(set.timestamps.is_empty());
    }

    #[test]
    fn matched_returns_at_most_requested_pairs() {
        // Both paths are unreadable, so every decode fails and zero pairs
        // survive; the invariant pairs <= requested still holds.
        let sampler = FrameSampler::new(64, 64);
        let a = handle(25.0, 250);
        let b = handle(25.0, 100);
        let matched = sampler.sample_matched(&a, &b, 10);
        assert!(matched.len() <= 10);
        assert_eq!(matched.requested, 10);
        assert_eq!(matched.reference.len(), matched.generated.len());
        assert_eq!(matched.reference.len(), matched.timestamps.len());
    }

    #[test]
    fn frame_set_counts_decoded() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(4, 4));
        let set = FrameSet {
            frames: vec![Some(img), None, None],
            timestamps: vec![0.0, 1.0, 2.0],
        };
        assert_eq!(set.decoded_count(), 1);
        assert!(!set.is_empty());
        assert_eq!(set.decoded().count(), 1);
    }
}
