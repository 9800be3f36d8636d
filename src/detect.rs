//! Glyph detection interface.
//!
//! Detection itself (locating iconographic glyphs in a reference image) is
//! supplied by the caller through [`GlyphDetector`]. This module only
//! defines the result types and the greatest-overlap conflict filter used
//! to pick one detection per location.

use ndarray::ArrayView3;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Axis-aligned box in pixel coordinates, `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn area(&self) -> f32 {
        (self.x1 - self.x0).max(0.0) * (self.y1 - self.y0).max(0.0)
    }

    pub fn intersection(&self, other: &BoundingBox) -> f32 {
        let w = self.x1.min(other.x1) - self.x0.max(other.x0);
        let h = self.y1.min(other.y1) - self.y0.max(other.y0);
        w.max(0.0) * h.max(0.0)
    }

    /// Intersection over union. Zero when either box is empty.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter = self.intersection(other);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// One detected glyph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub label: String,
}

/// Locates glyphs in an RGBA image.
pub trait GlyphDetector {
    fn detect(&self, image: ArrayView3<u8>) -> Result<Vec<Detection>>;
}

/// Drop detections that overlap a more confident one.
///
/// Detections are visited from most to least confident. Each is kept
/// unless it overlaps an already kept detection and its greatest IoU with
/// one is at least `min_overlap`. Disjoint detections are always kept.
/// The survivors are returned in that visiting order.
pub fn resolve_conflicts(mut detections: Vec<Detection>, min_overlap: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let greatest = kept
            .iter()
            .map(|k| k.bbox.iou(&candidate.bbox))
            .fold(0.0f32, f32::max);
        if greatest == 0.0 || greatest < min_overlap {
            kept.push(candidate);
        } else {
            tracing::trace!(label = %candidate.label, overlap = greatest, "dropping overlapping detection");
        }
    }
    kept
}
