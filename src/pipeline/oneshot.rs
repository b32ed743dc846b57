//! Stateless entry point.
//!
//! Same decode/NMS contract as [`PostProcessor`](super::PostProcessor), but
//! every resource lives for one call: the detection arena is sized by the
//! caller, the work is split into the default 4x4 / 2x2 / 1x1 spatial blocks
//! and decoding runs on rayon's global pool.

use crate::candidate::buffer::DetectionBuffer;
use crate::candidate::nms::nms;
use crate::candidate::CandidateBox;
use crate::config::{validate_model, validate_threshold, ScoreGate};
use crate::decode::partition::DEFAULT_SPLITS;
use crate::decode::{DecodeContext, Partition};
use crate::head::anchors::{ANCHORS, NUM_HEADS};
use crate::head::RawHeads;
use crate::pipeline::extract::write_rows;
use crate::trace::trace_span;
use crate::util::YoloPostResult;

/// Decodes, suppresses and writes up to `max_boxes` normalized rows into `out`.
///
/// `max_candidates` sizes the detection arena and must be at least the total
/// raw anchor count; when more boxes pass the filters than fit, the call
/// fails with `CapacityExceeded`. Returns the number of rows written.
#[allow(clippy::too_many_arguments)]
pub fn fast_postprocess(
    heads: [&[f32]; NUM_HEADS],
    model_size: usize,
    classes_number: usize,
    score_threshold: f32,
    nms_threshold: f32,
    max_candidates: usize,
    out: &mut [f32],
    max_boxes: usize,
) -> YoloPostResult<usize> {
    let _span = trace_span!(
        "fast_postprocess",
        model_size = model_size,
        max_candidates = max_candidates
    )
    .entered();

    validate_model(model_size, classes_number)?;
    validate_threshold("nms_threshold", nms_threshold)?;
    let gate = ScoreGate::new(score_threshold)?;
    let heads = RawHeads::new(heads, model_size, classes_number)?;

    let assignments = Partition::SpatialBlocks {
        splits: DEFAULT_SPLITS,
    }
    .plan(model_size, 1)?;
    let buffer = DetectionBuffer::with_capacity(max_candidates);
    DecodeContext::new(heads, &ANCHORS, gate, model_size).decode_all(&assignments, &buffer)?;

    let candidates = buffer.snapshot()?;
    let kept: Vec<CandidateBox> = nms(&candidates, nms_threshold)
        .into_iter()
        .map(|idx| candidates[idx])
        .collect();
    write_rows(&kept, model_size, out, max_boxes)
}
