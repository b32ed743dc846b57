//! Decode-filter workers.
//!
//! A worker walks one [`WorkAssignment`], rejects anchors through the
//! pre-activation gate before touching `exp`, decodes the survivors into
//! corner-form boxes and appends them to the shared [`DetectionBuffer`].
//! Workers share nothing but the buffer.

use crate::candidate::buffer::DetectionBuffer;
use crate::candidate::CandidateBox;
use crate::config::ScoreGate;
use crate::head::anchors::{AnchorTable, ANCHORS_PER_CELL, BOX_CHANNELS, NUM_HEADS};
use crate::head::{HeadView, RawHeads};
use crate::kernel::{ActiveClassScan, ClassScan};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::math::sigmoid;
use crate::util::{YoloPostError, YoloPostResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub mod partition;

pub use partition::{Partition, WorkAssignment};

const OBJECTNESS: usize = 4;

/// Read-only inputs shared by all workers of one call.
#[derive(Clone, Copy, Debug)]
pub struct DecodeContext<'a> {
    heads: RawHeads<'a>,
    anchors: &'a AnchorTable,
    gate: ScoreGate,
    model_size: f32,
}

impl<'a> DecodeContext<'a> {
    pub fn new(
        heads: RawHeads<'a>,
        anchors: &'a AnchorTable,
        gate: ScoreGate,
        model_size: usize,
    ) -> Self {
        Self {
            heads,
            anchors,
            gate,
            model_size: model_size as f32,
        }
    }

    fn head(&self, head: usize) -> YoloPostResult<&HeadView<'a>> {
        self.heads
            .get(head)
            .ok_or(YoloPostError::InvariantViolation("head index out of range"))
    }

    /// Decodes one anchor site, returning a box if it passes every filter.
    pub fn decode_site(&self, head: &HeadView<'_>, local: usize) -> Option<CandidateBox> {
        let values = head.anchor_values(local);

        let objectness = values[OBJECTNESS];
        if !self.gate.admits(objectness) {
            return None;
        }
        let (class_id, class_logit) = ActiveClassScan::best_class(&values[BOX_CHANNELS..]);
        if !self.gate.admits(class_logit) {
            return None;
        }
        let score = sigmoid(objectness) * sigmoid(class_logit);
        if !self.gate.accepts(score) {
            return None;
        }

        let layout = head.layout();
        let site = layout.site(local);
        let stride = layout.stride() as f32;
        let (anchor_w, anchor_h) = self.anchors[layout.head()][site.anchor];

        let cx = (sigmoid(values[0]) * 2.0 - 0.5 + site.col as f32) * stride;
        let cy = (sigmoid(values[1]) * 2.0 - 0.5 + site.row as f32) * stride;
        let w = (2.0 * sigmoid(values[2])).powi(2) * anchor_w;
        let h = (2.0 * sigmoid(values[3])).powi(2) * anchor_h;
        if !(w > 0.0 && h > 0.0) {
            return None;
        }

        let xmin = (cx - 0.5 * w).clamp(0.0, self.model_size);
        let ymin = (cy - 0.5 * h).clamp(0.0, self.model_size);
        let xmax = (cx + 0.5 * w).clamp(0.0, self.model_size);
        let ymax = (cy + 0.5 * h).clamp(0.0, self.model_size);
        if !(xmax - xmin > 0.0 && ymax - ymin > 0.0) {
            return None;
        }

        Some(CandidateBox {
            xmin,
            ymin,
            xmax,
            ymax,
            class_id: class_id as u32,
            score,
        })
    }

    /// Runs one assignment, appending accepted boxes to `buffer`.
    ///
    /// Returns the number of boxes appended.
    pub fn decode_assignment(
        &self,
        assignment: &WorkAssignment,
        buffer: &DetectionBuffer,
    ) -> YoloPostResult<usize> {
        let mut accepted = 0usize;
        match assignment {
            WorkAssignment::Range { begin, len } => {
                let counts = self.heads.anchor_counts();
                for index in *begin..*begin + *len {
                    let (head_idx, local) = resolve_head(index, &counts)?;
                    let head = self.head(head_idx)?;
                    if let Some(candidate) = self.decode_site(head, local) {
                        buffer.push(candidate)?;
                        accepted += 1;
                    }
                }
            }
            WorkAssignment::Block { head, rows, cols } => {
                let head = self.head(*head)?;
                let layout = head.layout();
                if rows.end > layout.grid() || cols.end > layout.grid() {
                    return Err(YoloPostError::InvariantViolation(
                        "spatial block outside the head grid",
                    ));
                }
                for anchor in 0..ANCHORS_PER_CELL {
                    for row in rows.clone() {
                        for col in cols.clone() {
                            let local = layout.local_index(row, col, anchor);
                            if let Some(candidate) = self.decode_site(head, local) {
                                buffer.push(candidate)?;
                                accepted += 1;
                            }
                        }
                    }
                }
            }
        }
        trace_debug!(
            "assignment_decoded",
            anchors = assignment.anchor_count(),
            accepted = accepted
        );
        Ok(accepted)
    }

    /// Runs every assignment and returns once all of them have finished.
    ///
    /// With the `rayon` feature the assignments run on the current rayon pool;
    /// otherwise they run in order on the calling thread.
    pub fn decode_all(
        &self,
        assignments: &[WorkAssignment],
        buffer: &DetectionBuffer,
    ) -> YoloPostResult<usize> {
        let _span = trace_span!("decode", assignments = assignments.len()).entered();

        #[cfg(feature = "rayon")]
        let accepted = assignments
            .par_iter()
            .map(|assignment| self.decode_assignment(assignment, buffer))
            .try_reduce(|| 0, |a, b| Ok(a + b))?;

        #[cfg(not(feature = "rayon"))]
        let accepted = assignments.iter().try_fold(0usize, |acc, assignment| {
            self.decode_assignment(assignment, buffer).map(|n| acc + n)
        })?;

        trace_event!("decoded_candidates", count = accepted);
        Ok(accepted)
    }
}

/// Maps a head-major flat anchor index to `(head, head-local index)`.
pub fn resolve_head(index: usize, counts: &[usize; NUM_HEADS]) -> YoloPostResult<(usize, usize)> {
    let mut local = index;
    for (head, &count) in counts.iter().enumerate() {
        if local < count {
            return Ok((head, local));
        }
        local -= count;
    }
    Err(YoloPostError::InvariantViolation(
        "anchor index past the last head",
    ))
}
