//! Stride and anchor constants for the three YOLOv5 detection heads.

/// Number of detection heads.
pub const NUM_HEADS: usize = 3;

/// Number of anchor templates per grid cell.
pub const ANCHORS_PER_CELL: usize = 3;

/// Geometry (4) plus objectness (1) channels ahead of the class logits.
pub const BOX_CHANNELS: usize = 5;

/// Downsampling factor of each head, finest first.
pub const STRIDES: [usize; NUM_HEADS] = [8, 16, 32];

/// Anchor `(width, height)` in model pixels, per head and anchor slot.
pub type AnchorTable = [[(f32, f32); ANCHORS_PER_CELL]; NUM_HEADS];

/// Default YOLOv5 anchors at the model's native resolution.
pub const ANCHORS: AnchorTable = [
    [(10.0, 13.0), (16.0, 30.0), (33.0, 23.0)],
    [(30.0, 61.0), (62.0, 45.0), (59.0, 119.0)],
    [(116.0, 90.0), (156.0, 198.0), (373.0, 326.0)],
];
