//! Core types for face tracking.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    /// Create a box from corner coordinates.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box width.
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Box height.
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Center point (x, y).
    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Half of the larger side, the crop radius used downstream.
    pub fn half_size(&self) -> f64 {
        self.height().max(self.width()) / 2.0
    }

    /// Intersection-over-union with another box.
    ///
    /// Returns 0.0 for disjoint or degenerate boxes.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let xa = self.x1.max(other.x1);
        let ya = self.y1.max(other.y1);
        let xb = self.x2.min(other.x2);
        let yb = self.y2.min(other.y2);

        let inter = (xb - xa).max(0.0) * (yb - ya).max(0.0);
        let area_a = self.width() * self.height();
        let area_b = other.width() * other.height();
        let union = area_a + area_b - inter;

        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }
}

/// A single face detection on one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    /// Zero-based frame index.
    pub frame_index: usize,
    /// Detected bounding box.
    pub bbox: BoundingBox,
    /// Detector confidence in [0, 1].
    pub confidence: f64,
}

/// A temporally contiguous run of detections believed to be one face.
///
/// Invariant: frame indices are strictly increasing (enforced by the
/// association pass, which consumes frames in order).
#[derive(Debug, Clone, Default)]
pub struct RawTrack {
    /// Member detections in frame order.
    pub detections: Vec<FaceDetection>,
}

impl RawTrack {
    /// Number of member detections.
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    /// True when the track has no members.
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// First member frame index.
    pub fn first_frame(&self) -> Option<usize> {
        self.detections.first().map(|d| d.frame_index)
    }

    /// Last member frame index.
    pub fn last_frame(&self) -> Option<usize> {
        self.detections.last().map(|d| d.frame_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let b = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
        assert!((b.iou(&b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        // Two 10x10 boxes shifted by half: intersection 50, union 150
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn half_size_uses_larger_side() {
        let wide = BoundingBox::new(0.0, 0.0, 40.0, 20.0);
        assert_eq!(wide.half_size(), 20.0);
        let tall = BoundingBox::new(0.0, 0.0, 20.0, 40.0);
        assert_eq!(tall.half_size(), 20.0);
    }

    #[test]
    fn center_is_box_midpoint() {
        let b = BoundingBox::new(10.0, 20.0, 30.0, 60.0);
        assert_eq!(b.center(), (20.0, 40.0));
    }

    #[test]
    fn track_reports_frame_span() {
        let track = RawTrack {
            detections: vec![
                FaceDetection {
                    frame_index: 3,
                    bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
                    confidence: 1.0,
                },
                FaceDetection {
                    frame_index: 7,
                    bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
                    confidence: 1.0,
                },
            ],
        };
        assert_eq!(track.first_frame(), Some(3));
        assert_eq!(track.last_frame(), Some(7));
        assert_eq!(track.len(), 2);
    }
}
