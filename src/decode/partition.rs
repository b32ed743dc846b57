//! Work partitioning of the flattened anchor space.
//!
//! Both strategies produce disjoint assignments that together cover every
//! anchor of every head exactly once.

use std::ops::Range;

use crate::config::anchor_counts;
use crate::head::anchors::{NUM_HEADS, STRIDES};
use crate::util::{YoloPostError, YoloPostResult};

/// Splits of the original fixed 21-way layout: 4x4, 2x2 and 1x1 blocks.
pub const DEFAULT_SPLITS: [usize; NUM_HEADS] = [4, 2, 1];

/// Strategy used to divide decode work between workers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Partition {
    /// `worker_count` equal head-major index ranges plus one remainder range.
    #[default]
    EvenChunks,
    /// Head `h` is cut into `splits[h] x splits[h]` grid blocks.
    SpatialBlocks { splits: [usize; NUM_HEADS] },
}

/// One unit of decode work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkAssignment {
    /// Contiguous range of the head-major flattened anchor index space.
    Range { begin: usize, len: usize },
    /// All anchors of the grid cells in `rows x cols` of one head.
    Block {
        head: usize,
        rows: Range<usize>,
        cols: Range<usize>,
    },
}

impl WorkAssignment {
    /// Number of anchor sites covered.
    pub fn anchor_count(&self) -> usize {
        match self {
            WorkAssignment::Range { len, .. } => *len,
            WorkAssignment::Block { rows, cols, .. } => rows.len() * cols.len() * 3,
        }
    }
}

impl Partition {
    /// Checks the strategy parameters.
    pub fn validate(&self) -> YoloPostResult<()> {
        match self {
            Partition::EvenChunks => Ok(()),
            Partition::SpatialBlocks { splits } => {
                if splits.iter().any(|&s| s == 0) {
                    return Err(YoloPostError::InvalidConfig(
                        "spatial block splits must be >= 1",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Plans the assignments for one model size.
    pub fn plan(&self, model_size: usize, worker_count: usize) -> YoloPostResult<Vec<WorkAssignment>> {
        self.validate()?;
        match self {
            Partition::EvenChunks => {
                if worker_count == 0 {
                    return Err(YoloPostError::InvalidConfig("worker_count must be >= 1"));
                }
                let total = anchor_counts(model_size).iter().sum();
                Ok(even_chunks(total, worker_count))
            }
            Partition::SpatialBlocks { splits } => Ok(spatial_blocks(model_size, *splits)),
        }
    }
}

/// `workers` chunks of `total / workers` anchors and one chunk for the remainder.
pub fn even_chunks(total: usize, workers: usize) -> Vec<WorkAssignment> {
    let chunk = total / workers;
    let tail = total % workers;

    let mut out = Vec::with_capacity(workers + 1);
    if chunk > 0 {
        for worker in 0..workers {
            out.push(WorkAssignment::Range {
                begin: worker * chunk,
                len: chunk,
            });
        }
    }
    if tail > 0 {
        out.push(WorkAssignment::Range {
            begin: workers * chunk,
            len: tail,
        });
    }
    out
}

/// Grid blocks with boundaries at `i * grid / splits[h]`.
pub fn spatial_blocks(model_size: usize, splits: [usize; NUM_HEADS]) -> Vec<WorkAssignment> {
    let mut out = Vec::new();
    for (head, (&stride, &parts)) in STRIDES.iter().zip(splits.iter()).enumerate() {
        let grid = model_size / stride;
        let bounds: Vec<usize> = (0..=parts).map(|i| i * grid / parts).collect();
        for rows in bounds.windows(2) {
            for cols in bounds.windows(2) {
                if rows[0] == rows[1] || cols[0] == cols[1] {
                    continue;
                }
                out.push(WorkAssignment::Block {
                    head,
                    rows: rows[0]..rows[1],
                    cols: cols[0]..cols[1],
                });
            }
        }
    }
    out
}
