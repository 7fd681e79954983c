//! Track smoothing: gap interpolation and median filtering.
//!
//! A retained track may skip frames (bounded by the tracker's maximum gap);
//! the missing frames are filled by linear interpolation over frame index
//! before the per-coordinate median filter suppresses detector jitter.

use super::types::RawTrack;

/// A track densified to every frame in its span, with smoothed crop
/// parameters per frame.
#[derive(Debug, Clone)]
pub struct SmoothedTrack {
    /// Dense frame indices, `first..=last` of the raw track.
    pub frames: Vec<usize>,
    /// Smoothed box center x per frame.
    pub center_x: Vec<f64>,
    /// Smoothed box center y per frame.
    pub center_y: Vec<f64>,
    /// Smoothed box half-size per frame.
    pub half_size: Vec<f64>,
}

impl SmoothedTrack {
    /// Number of frames covered.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when the track covers no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Covered time range in seconds at the given frame rate:
    /// `[first/fps, (last+1)/fps)`.
    pub fn time_range(&self, fps: f64) -> (f64, f64) {
        match (self.frames.first(), self.frames.last()) {
            (Some(&first), Some(&last)) => (first as f64 / fps, (last + 1) as f64 / fps),
            _ => (0.0, 0.0),
        }
    }
}

/// Linearly interpolate `values` sampled at `frames` onto every frame index
/// in `[frames[0], frames[last]]`.
///
/// `frames` must be strictly increasing and the two slices the same length.
pub fn fill_frame_gaps(frames: &[usize], values: &[f64]) -> Vec<f64> {
    debug_assert_eq!(frames.len(), values.len());
    if frames.is_empty() {
        return Vec::new();
    }

    let first = frames[0];
    let last = frames[frames.len() - 1];
    let mut dense = Vec::with_capacity(last - first + 1);

    let mut seg = 0;
    for frame in first..=last {
        // Advance to the segment containing this frame.
        while seg + 1 < frames.len() && frames[seg + 1] <= frame {
            seg += 1;
        }
        if frames[seg] == frame || seg + 1 >= frames.len() {
            dense.push(values[seg]);
        } else {
            let span = (frames[seg + 1] - frames[seg]) as f64;
            let t = (frame - frames[seg]) as f64 / span;
            dense.push(values[seg] + (values[seg + 1] - values[seg]) * t);
        }
    }

    dense
}

/// Median filter with an odd kernel and replicated edges.
///
/// Edge replication keeps monotone sequences fixed points of the filter, so
/// re-filtering already-smoothed data changes nothing.
pub fn median_filter(values: &[f64], kernel_size: usize) -> Vec<f64> {
    if values.is_empty() || kernel_size <= 1 {
        return values.to_vec();
    }
    debug_assert!(kernel_size % 2 == 1, "kernel size must be odd");

    let half = kernel_size / 2;
    let n = values.len();
    let mut out = Vec::with_capacity(n);
    let mut window = Vec::with_capacity(kernel_size);

    for i in 0..n {
        window.clear();
        for k in 0..kernel_size {
            let idx = (i + k).saturating_sub(half).min(n - 1);
            window.push(values[idx]);
        }
        window.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        out.push(window[half]);
    }

    out
}

/// Densify and smooth a raw track for cropping.
///
/// The four box coordinates are interpolated over the track's frame span,
/// then center-x, center-y and half-size are median-filtered independently.
pub fn smooth_track(track: &RawTrack, kernel_size: usize) -> SmoothedTrack {
    if track.is_empty() {
        return SmoothedTrack {
            frames: Vec::new(),
            center_x: Vec::new(),
            center_y: Vec::new(),
            half_size: Vec::new(),
        };
    }

    let frames: Vec<usize> = track.detections.iter().map(|d| d.frame_index).collect();
    let x1: Vec<f64> = track.detections.iter().map(|d| d.bbox.x1).collect();
    let y1: Vec<f64> = track.detections.iter().map(|d| d.bbox.y1).collect();
    let x2: Vec<f64> = track.detections.iter().map(|d| d.bbox.x2).collect();
    let y2: Vec<f64> = track.detections.iter().map(|d| d.bbox.y2).collect();

    let x1 = fill_frame_gaps(&frames, &x1);
    let y1 = fill_frame_gaps(&frames, &y1);
    let x2 = fill_frame_gaps(&frames, &x2);
    let y2 = fill_frame_gaps(&frames, &y2);

    let first = frames[0];
    let dense_frames: Vec<usize> = (first..first + x1.len()).collect();

    let mut center_x = Vec::with_capacity(x1.len());
    let mut center_y = Vec::with_capacity(x1.len());
    let mut half_size = Vec::with_capacity(x1.len());
    for i in 0..x1.len() {
        center_x.push((x1[i] + x2[i]) / 2.0);
        center_y.push((y1[i] + y2[i]) / 2.0);
        half_size.push((x2[i] - x1[i]).max(y2[i] - y1[i]) / 2.0);
    }

    SmoothedTrack {
        frames: dense_frames,
        center_x: median_filter(&center_x, kernel_size),
        center_y: median_filter(&center_y, kernel_size),
        half_size: median_filter(&half_size, kernel_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facetrack::types::{BoundingBox, FaceDetection};

    #[test]
    fn fill_frame_gaps_interpolates_linearly() {
        let frames = vec![10, 12, 16];
        let values = vec![0.0, 2.0, 10.0];
        let dense = fill_frame_gaps(&frames, &values);
        assert_eq!(dense, vec![0.0, 1.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn fill_frame_gaps_without_gaps_is_identity() {
        let frames = vec![0, 1, 2];
        let values = vec![5.0, 6.0, 7.0];
        assert_eq!(fill_frame_gaps(&frames, &values), values);
    }

    #[test]
    fn median_filter_removes_spikes() {
        let mut values = vec![1.0; 21];
        values[10] = 50.0;
        let filtered = median_filter(&values, 5);
        assert!(filtered.iter().all(|&v| (v - 1.0).abs() < 1e-9));
    }

    #[test]
    fn median_filter_is_idempotent_on_constant_velocity_data() {
        // Linear motion: a second application must not change anything.
        let values: Vec<f64> = (0..60).map(|i| 3.0 + 0.5 * i as f64).collect();
        let once = median_filter(&values, 13);
        let twice = median_filter(&once, 13);
        for (a, b) in once.iter().zip(twice.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn median_filter_kernel_one_is_identity() {
        let values = vec![3.0, 1.0, 2.0];
        assert_eq!(median_filter(&values, 1), values);
    }

    fn track_with_gap() -> RawTrack {
        // Box drifting right 2 px/frame, detections missing frames 5..=9.
        let mut detections = Vec::new();
        for f in (0..5).chain(10..20) {
            let x = 2.0 * f as f64;
            detections.push(FaceDetection {
                frame_index: f,
                bbox: BoundingBox::new(x, 100.0, x + 100.0, 200.0),
                confidence: 1.0,
            });
        }
        RawTrack { detections }
    }

    #[test]
    fn smooth_track_densifies_gaps() {
        let track = track_with_gap();
        let smoothed = smooth_track(&track, 1);
        assert_eq!(smoothed.len(), 20);
        assert_eq!(smoothed.frames, (0..20).collect::<Vec<_>>());
        // Interpolated center at frame 7: cx = 2*7 + 50 = 64
        assert!((smoothed.center_x[7] - 64.0).abs() < 1e-9);
        // Square 100x100 box: half size 50 everywhere
        assert!(smoothed.half_size.iter().all(|&s| (s - 50.0).abs() < 1e-9));
    }

    #[test]
    fn time_range_maps_through_frame_rate() {
        let track = track_with_gap();
        let smoothed = smooth_track(&track, 1);
        let (start, end) = smoothed.time_range(25.0);
        assert!((start - 0.0).abs() < 1e-9);
        assert!((end - 20.0 / 25.0).abs() < 1e-9);
    }
}
