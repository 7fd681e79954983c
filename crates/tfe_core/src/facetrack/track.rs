//! Greedy streaming IOU track association.
//!
//! Single-pass, single-active-track association: detections are scanned in
//! frame order, at most one track is open at any time, and a closed track is
//! never reopened. This is deliberately not globally optimal multi-object
//! tracking; the greedy behavior is a compatibility invariant.

use super::types::{FaceDetection, RawTrack};

/// Configuration for track association.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Maximum frame gap bridged within a track.
    pub max_frame_gap: usize,
    /// Minimum IOU with the track's last member to extend it.
    pub iou_threshold: f64,
    /// Minimum track length (frames) to retain a track.
    pub min_track_len: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_frame_gap: 25,
            iou_threshold: 0.5,
            min_track_len: 100,
        }
    }
}

/// Associate per-frame detections into face tracks.
///
/// Repeatedly builds one track from the earliest unconsumed detection:
/// a candidate extends the open track when its frame gap to the last member
/// is within `max_frame_gap` AND its IOU exceeds `iou_threshold`; once the
/// gap alone is exceeded the track is closed for the remainder of the pass.
/// Consumed detections are marked in a side table rather than removed from
/// the input, so the scan order never shifts underneath the loop. Tracks
/// shorter than `min_track_len` are discarded.
pub fn associate_tracks(
    frame_detections: &[Vec<FaceDetection>],
    config: &TrackerConfig,
) -> Vec<RawTrack> {
    let mut consumed: Vec<Vec<bool>> = frame_detections
        .iter()
        .map(|faces| vec![false; faces.len()])
        .collect();

    let mut tracks = Vec::new();

    loop {
        let mut track: Vec<FaceDetection> = Vec::new();
        let mut closed = false;

        'frames: for (fidx, faces) in frame_detections.iter().enumerate() {
            if closed {
                break 'frames;
            }
            for (didx, face) in faces.iter().enumerate() {
                if consumed[fidx][didx] {
                    continue;
                }

                match track.last() {
                    None => {
                        track.push(face.clone());
                        consumed[fidx][didx] = true;
                    }
                    Some(last) => {
                        let gap = face.frame_index.saturating_sub(last.frame_index);
                        if gap <= config.max_frame_gap {
                            if face.bbox.iou(&last.bbox) > config.iou_threshold {
                                track.push(face.clone());
                                consumed[fidx][didx] = true;
                            }
                        } else {
                            // Gap exceeded: the active track is closed and
                            // the remaining detections seed later passes.
                            closed = true;
                            break;
                        }
                    }
                }
            }
        }

        if track.is_empty() {
            break;
        }

        if track.len() >= config.min_track_len {
            tracks.push(RawTrack { detections: track });
        } else {
            tracing::debug!(
                "Discarding short track: {} < {} frames",
                track.len(),
                config.min_track_len
            );
        }
    }

    tracks
}

/// Select the longest track; ties broken by first encountered.
pub fn select_longest(tracks: &[RawTrack]) -> Option<&RawTrack> {
    let mut best: Option<&RawTrack> = None;
    for track in tracks {
        if best.map(|b| track.len() > b.len()).unwrap_or(true) {
            best = Some(track);
        }
    }
    best
}
