//! yolopost turns the three raw YOLOv5 detection heads into a short list of
//! class-labelled boxes.
//!
//! Anchors are rejected through a pre-activation gate before any `exp` is
//! evaluated, survivors are decoded into corner-form boxes in model pixels,
//! and a class-aware greedy NMS keeps the final set. Decoding fans out over a
//! worker pool with the `rayon` feature; the class argmax can use SIMD with
//! the `simd` feature.
//!
//! Two entry points share the same contract: [`PostProcessor`] keeps its pool
//! and detection arena across calls, [`fast_postprocess`] allocates per call.

pub mod candidate;
pub mod config;
pub mod decode;
pub mod head;
pub mod kernel;
pub mod lowlevel;
pub mod pipeline;
mod trace;
pub mod util;

pub use candidate::CandidateBox;
pub use config::{ParameterConfig, ScoreGate, SessionConfig};
pub use decode::Partition;
pub use head::anchors::{AnchorTable, ANCHORS, STRIDES};
pub use pipeline::oneshot::fast_postprocess;
pub use pipeline::{Detection, PostProcessor, ROW_LEN};
pub use util::{YoloPostError, YoloPostResult};
