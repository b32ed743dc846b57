//! Low-level building blocks for custom post-processing pipelines.
//!
//! These expose head layouts, the decode worker, the detection arena and NMS
//! for callers that schedule work themselves. Most users should prefer
//! [`PostProcessor`](crate::PostProcessor) or
//! [`fast_postprocess`](crate::fast_postprocess).

pub use crate::candidate::buffer::DetectionBuffer;
pub use crate::candidate::nms::{iou, nms, SuppressionState};
pub use crate::config::anchor_counts;
pub use crate::decode::partition::{even_chunks, spatial_blocks, DEFAULT_SPLITS};
pub use crate::decode::{resolve_head, DecodeContext, WorkAssignment};
pub use crate::head::{classes_from_channels, AnchorSite, HeadLayout, HeadView, RawHeads};
pub use crate::kernel::scalar::ScalarClassScan;
#[cfg(feature = "simd")]
pub use crate::kernel::simd::SimdClassScan;
pub use crate::kernel::ClassScan;
pub use crate::pipeline::extract::write_rows;
