//! Raw head layout and borrowed head views.
//!
//! Each head is an NHWC tensor of shape `(grid, grid, 3 * (5 + C))` with the
//! anchor folded into the channel dimension. The flat offset of a value is
//!
//! ```text
//! ((row * grid + col) * 3 + anchor) * (5 + C) + channel
//! ```
//!
//! and the head-local anchor index is `(row * grid + col) * 3 + anchor`.
//! `HeadLayout` is the only place that knows this arithmetic; decode code asks
//! it for offsets and never indexes a head buffer on its own.

use crate::util::{YoloPostError, YoloPostResult};

pub mod anchors;

use anchors::{ANCHORS_PER_CELL, BOX_CHANNELS, NUM_HEADS, STRIDES};

/// Grid position and anchor slot of one anchor site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorSite {
    /// Grid row (y).
    pub row: usize,
    /// Grid column (x).
    pub col: usize,
    /// Anchor slot within the cell.
    pub anchor: usize,
}

/// Address arithmetic for one detection head.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadLayout {
    head: usize,
    grid: usize,
    classes: usize,
}

impl HeadLayout {
    /// Layout of head `head` for a square model input of `model_size` pixels.
    pub fn new(head: usize, model_size: usize, classes: usize) -> YoloPostResult<Self> {
        let stride = *STRIDES
            .get(head)
            .ok_or(YoloPostError::InvariantViolation("head index out of range"))?;
        if model_size == 0 || model_size % stride != 0 {
            return Err(YoloPostError::ModelSizeNotDivisible { model_size, stride });
        }
        if classes == 0 {
            return Err(YoloPostError::InvalidConfig("classes_number must be > 0"));
        }
        Ok(Self {
            head,
            grid: model_size / stride,
            classes,
        })
    }

    /// Index of the head (0 for stride 8).
    pub fn head(&self) -> usize {
        self.head
    }

    /// Stride in model pixels.
    pub fn stride(&self) -> usize {
        STRIDES[self.head]
    }

    /// Grid rows (equal to grid columns).
    pub fn grid(&self) -> usize {
        self.grid
    }

    /// Number of class logits per anchor.
    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Values per anchor: geometry, objectness and class logits.
    pub fn channels(&self) -> usize {
        BOX_CHANNELS + self.classes
    }

    /// Anchor sites in this head.
    pub fn anchor_count(&self) -> usize {
        self.grid * self.grid * ANCHORS_PER_CELL
    }

    /// Total number of `f32` values in the head buffer.
    pub fn len(&self) -> usize {
        self.anchor_count() * self.channels()
    }

    /// Flat offset of `channel` at `(row, col, anchor)`.
    #[inline]
    pub fn offset(&self, row: usize, col: usize, anchor: usize, channel: usize) -> usize {
        (self.local_index(row, col, anchor)) * self.channels() + channel
    }

    /// Head-local anchor index of `(row, col, anchor)`.
    #[inline]
    pub fn local_index(&self, row: usize, col: usize, anchor: usize) -> usize {
        (row * self.grid + col) * ANCHORS_PER_CELL + anchor
    }

    /// Inverse of [`HeadLayout::local_index`].
    #[inline]
    pub fn site(&self, local: usize) -> AnchorSite {
        let cell = local / ANCHORS_PER_CELL;
        AnchorSite {
            row: cell / self.grid,
            col: cell % self.grid,
            anchor: local % ANCHORS_PER_CELL,
        }
    }

    /// Offset of channel 0 for a head-local anchor index.
    #[inline]
    pub fn site_offset(&self, local: usize) -> usize {
        local * self.channels()
    }
}

/// Borrowed view of one raw head buffer with a validated length.
#[derive(Clone, Copy, Debug)]
pub struct HeadView<'a> {
    data: &'a [f32],
    layout: HeadLayout,
}

impl<'a> HeadView<'a> {
    /// Wraps `data`, which must hold exactly `layout.len()` values.
    pub fn new(data: &'a [f32], layout: HeadLayout) -> YoloPostResult<Self> {
        if data.len() != layout.len() {
            return Err(YoloPostError::HeadLengthMismatch {
                head: layout.head(),
                expected: layout.len(),
                got: data.len(),
            });
        }
        Ok(Self { data, layout })
    }

    /// Returns the layout of this head.
    pub fn layout(&self) -> &HeadLayout {
        &self.layout
    }

    /// Returns the `5 + C` values of one anchor site.
    #[inline]
    pub fn anchor_values(&self, local: usize) -> &'a [f32] {
        let start = self.layout.site_offset(local);
        &self.data[start..start + self.layout.channels()]
    }
}

/// The three raw heads of one inference, finest stride first.
#[derive(Clone, Copy, Debug)]
pub struct RawHeads<'a> {
    heads: [HeadView<'a>; NUM_HEADS],
}

impl<'a> RawHeads<'a> {
    /// Validates three buffers against the layouts for `model_size` and `classes`.
    pub fn new(
        buffers: [&'a [f32]; NUM_HEADS],
        model_size: usize,
        classes: usize,
    ) -> YoloPostResult<Self> {
        let [b0, b1, b2] = buffers;
        Ok(Self {
            heads: [
                HeadView::new(b0, HeadLayout::new(0, model_size, classes)?)?,
                HeadView::new(b1, HeadLayout::new(1, model_size, classes)?)?,
                HeadView::new(b2, HeadLayout::new(2, model_size, classes)?)?,
            ],
        })
    }

    /// Returns head `index`, if it exists.
    pub fn get(&self, index: usize) -> Option<&HeadView<'a>> {
        self.heads.get(index)
    }

    /// Anchor counts per head.
    pub fn anchor_counts(&self) -> [usize; NUM_HEADS] {
        [
            self.heads[0].layout.anchor_count(),
            self.heads[1].layout.anchor_count(),
            self.heads[2].layout.anchor_count(),
        ]
    }
}

/// Infers the class count from the last dimension of a head tensor.
pub fn classes_from_channels(channels: usize) -> YoloPostResult<usize> {
    if channels % ANCHORS_PER_CELL != 0 {
        return Err(YoloPostError::InvalidConfig(
            "head channels must be a multiple of the anchor count",
        ));
    }
    match (channels / ANCHORS_PER_CELL).checked_sub(BOX_CHANNELS) {
        Some(classes) if classes > 0 => Ok(classes),
        _ => Err(YoloPostError::InvalidConfig(
            "head channels leave no room for class logits",
        )),
    }
}
