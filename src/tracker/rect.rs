use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned face bounding box.
///
/// Stored in TLWH form (top-left x, top-left y, width, height). Detectors that
/// report corners or centers convert through [`Rect::from_tlbr`] and
/// [`Rect::from_center`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (left, top, right, bottom).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Create a Rect from its center point and dimensions.
    #[inline]
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Midpoint of the top-left and bottom-right corners.
    #[inline]
    pub fn centroid(&self) -> Point2<f32> {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Euclidean distance between the centroids of two boxes.
    pub fn centroid_distance(&self, other: &Rect) -> f64 {
        let a = self.centroid().cast::<f64>();
        let b = other.centroid().cast::<f64>();
        nalgebra::distance(&a, &b)
    }

    /// Shift the box by `(dx, dy)` without changing its size.
    #[inline]
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Map a box from a frame resized by `scale_factor` back to the
    /// original frame.
    #[inline]
    pub fn unscaled(&self, scale_factor: f32) -> Self {
        Self::new(
            self.x / scale_factor,
            self.y / scale_factor,
            self.width / scale_factor,
            self.height / scale_factor,
        )
    }
}
