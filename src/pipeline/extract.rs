//! Result extraction: normalization and truncation of kept boxes.

use crate::candidate::CandidateBox;
use crate::util::{YoloPostError, YoloPostResult};

/// Floats per output row: `xmin, ymin, xmax, ymax, class_id, score`.
pub const ROW_LEN: usize = 6;

/// Detection with coordinates normalized by the model size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub class_id: u32,
    pub score: f32,
}

impl Detection {
    /// Normalizes a model-pixel candidate.
    pub fn from_candidate(candidate: &CandidateBox, model_size: usize) -> Self {
        let scale = model_size as f32;
        Self {
            xmin: candidate.xmin / scale,
            ymin: candidate.ymin / scale,
            xmax: candidate.xmax / scale,
            ymax: candidate.ymax / scale,
            class_id: candidate.class_id,
            score: candidate.score,
        }
    }
}

/// Writes at most `max_rows` normalized rows of `kept` into `out`.
///
/// Rows keep the order of `kept`. Returns the number of rows written; fails
/// without writing if `out` cannot hold them all.
pub fn write_rows(
    kept: &[CandidateBox],
    model_size: usize,
    out: &mut [f32],
    max_rows: usize,
) -> YoloPostResult<usize> {
    let rows = kept.len().min(max_rows);
    let needed = rows * ROW_LEN;
    if out.len() < needed {
        return Err(YoloPostError::OutputTooSmall {
            needed,
            got: out.len(),
        });
    }

    let scale = model_size as f32;
    for (candidate, row) in kept.iter().zip(out.chunks_exact_mut(ROW_LEN)).take(rows) {
        row.copy_from_slice(&candidate.to_row(scale));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kept() -> Vec<CandidateBox> {
        vec![
            CandidateBox {
                xmin: 0.0,
                ymin: 32.0,
                xmax: 64.0,
                ymax: 48.0,
                class_id: 3,
                score: 0.9,
            },
            CandidateBox {
                xmin: 16.0,
                ymin: 16.0,
                xmax: 32.0,
                ymax: 32.0,
                class_id: 0,
                score: 0.8,
            },
        ]
    }

    #[test]
    fn rows_are_normalized_in_order() {
        let mut out = [0.0f32; 12];
        assert_eq!(write_rows(&kept(), 64, &mut out, usize::MAX).unwrap(), 2);
        assert_eq!(&out[..6], &[0.0, 0.5, 1.0, 0.75, 3.0, 0.9]);
        assert_eq!(&out[6..], &[0.25, 0.25, 0.5, 0.5, 0.0, 0.8]);
    }

    #[test]
    fn max_rows_truncates() {
        let mut out = [-1.0f32; 12];
        assert_eq!(write_rows(&kept(), 64, &mut out, 1).unwrap(), 1);
        assert_eq!(out[4], 3.0);
        assert_eq!(out[6], -1.0);
    }

    #[test]
    fn short_output_is_rejected() {
        let mut out = [0.0f32; 11];
        assert_eq!(
            write_rows(&kept(), 64, &mut out, usize::MAX),
            Err(YoloPostError::OutputTooSmall { needed: 12, got: 11 })
        );
    }
}
