//! Class-aware greedy non-maximum suppression.

use crate::candidate::CandidateBox;
use crate::trace::{trace_event, trace_span};

/// Per-candidate state within one suppression run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuppressionState {
    Unvisited,
    Kept,
    Suppressed,
}

/// Intersection over union of two corner-form boxes.
pub fn iou(a: &CandidateBox, b: &CandidateBox) -> f32 {
    let left = a.xmin.max(b.xmin);
    let top = a.ymin.max(b.ymin);
    let right = a.xmax.min(b.xmax);
    let bottom = a.ymax.min(b.ymax);

    let inter_w = right - left;
    let inter_h = bottom - top;
    if inter_w <= 0.0 || inter_h <= 0.0 {
        return 0.0;
    }

    let inter = inter_w * inter_h;
    let union = a.area() + b.area() - inter;
    if union == 0.0 {
        return 0.0;
    }
    inter / union
}

/// Greedy suppression over `candidates`.
///
/// Each round keeps the unvisited valid box with the strictly greatest score
/// (the first one in buffer order on ties) and suppresses every unvisited box
/// of the same class whose IOU with it exceeds `nms_threshold`. Boxes with
/// `xmin >= xmax` or `ymin >= ymax` are suppressed without being compared.
///
/// Returns indices into `candidates` in selection order.
pub fn nms(candidates: &[CandidateBox], nms_threshold: f32) -> Vec<usize> {
    let _span = trace_span!("nms", candidates = candidates.len()).entered();

    let mut state = vec![SuppressionState::Unvisited; candidates.len()];
    let mut kept = Vec::new();

    loop {
        let mut selected: Option<usize> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            if state[idx] != SuppressionState::Unvisited {
                continue;
            }
            if !candidate.is_valid() {
                state[idx] = SuppressionState::Suppressed;
                continue;
            }
            match selected {
                None => selected = Some(idx),
                Some(best) if candidate.score > candidates[best].score => selected = Some(idx),
                Some(_) => {}
            }
        }

        let Some(best_idx) = selected else {
            break;
        };
        state[best_idx] = SuppressionState::Kept;
        kept.push(best_idx);

        let best = &candidates[best_idx];
        for (idx, candidate) in candidates.iter().enumerate() {
            if state[idx] != SuppressionState::Unvisited || candidate.class_id != best.class_id {
                continue;
            }
            if iou(best, candidate) > nms_threshold {
                state[idx] = SuppressionState::Suppressed;
            }
        }
    }

    trace_event!("nms_kept", count = kept.len());
    kept
}
