//! Post-processing session.
//!
//! [`PostProcessor`] owns everything that outlives one inference: validated
//! parameters, the work plan, the detection arena sized to the total anchor
//! count and (with the `rayon` feature) a worker pool of `worker_count`
//! threads. Each [`PostProcessor::process`] call resets the per-call state,
//! decodes in parallel, joins, and runs NMS on the calling thread.

use crate::candidate::buffer::DetectionBuffer;
use crate::candidate::nms::nms;
use crate::candidate::CandidateBox;
use crate::config::{ParameterConfig, SessionConfig};
use crate::decode::{DecodeContext, Partition, WorkAssignment};
use crate::head::RawHeads;
use crate::trace::trace_span;
use crate::util::YoloPostResult;
#[cfg(feature = "rayon")]
use crate::util::YoloPostError;

pub mod extract;
pub mod oneshot;

pub use extract::{write_rows, Detection, ROW_LEN};

/// Reusable decode/NMS session for one model configuration.
#[derive(Debug)]
pub struct PostProcessor {
    params: ParameterConfig,
    partition: Partition,
    assignments: Vec<WorkAssignment>,
    buffer: DetectionBuffer,
    candidates: Vec<CandidateBox>,
    kept: Vec<CandidateBox>,
    #[cfg(feature = "rayon")]
    pool: rayon::ThreadPool,
}

impl PostProcessor {
    /// Validates `cfg` and allocates the session resources.
    pub fn new(cfg: SessionConfig) -> YoloPostResult<Self> {
        let params = ParameterConfig::new(&cfg)?;
        let partition = Partition::default();
        let assignments = partition.plan(params.model_size(), params.worker_count())?;
        let buffer = DetectionBuffer::with_capacity(params.total_anchors());

        #[cfg(feature = "rayon")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.worker_count())
            .thread_name(|idx| format!("yolopost-decode-{idx}"))
            .build()
            .map_err(|err| YoloPostError::WorkerPool {
                reason: err.to_string(),
            })?;

        Ok(Self {
            params,
            partition,
            assignments,
            buffer,
            candidates: Vec::new(),
            kept: Vec::new(),
            #[cfg(feature = "rayon")]
            pool,
        })
    }

    /// Replaces the partition strategy.
    pub fn with_partition(mut self, partition: Partition) -> YoloPostResult<Self> {
        self.assignments = partition.plan(self.params.model_size(), self.params.worker_count())?;
        self.partition = partition;
        Ok(self)
    }

    /// Returns the validated session parameters.
    pub fn params(&self) -> &ParameterConfig {
        &self.params
    }

    /// Returns the active partition strategy.
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Decodes, filters and suppresses one set of raw heads.
    ///
    /// Returns the number of boxes kept after NMS.
    pub fn process(&mut self, head0: &[f32], head1: &[f32], head2: &[f32]) -> YoloPostResult<usize> {
        let _span = trace_span!(
            "process",
            model_size = self.params.model_size(),
            assignments = self.assignments.len()
        )
        .entered();

        self.buffer.reset();
        self.candidates.clear();
        self.kept.clear();

        let heads = RawHeads::new(
            [head0, head1, head2],
            self.params.model_size(),
            self.params.classes_number(),
        )?;
        let ctx = DecodeContext::new(
            heads,
            self.params.anchors(),
            self.params.gate(),
            self.params.model_size(),
        );
        let assignments = &self.assignments;
        let buffer = &self.buffer;

        #[cfg(feature = "rayon")]
        self.pool.install(|| ctx.decode_all(assignments, buffer))?;
        #[cfg(not(feature = "rayon"))]
        ctx.decode_all(assignments, buffer)?;

        self.candidates = self.buffer.snapshot()?;
        self.kept = nms(&self.candidates, self.params.nms_threshold())
            .into_iter()
            .map(|idx| self.candidates[idx])
            .collect();
        Ok(self.kept.len())
    }

    /// Number of boxes kept by the last `process` call.
    pub fn kept_count(&self) -> usize {
        self.kept.len()
    }

    /// Candidates of the last call before NMS, in buffer order.
    pub fn candidates(&self) -> &[CandidateBox] {
        &self.candidates
    }

    /// Kept boxes of the last call in model pixels, in selection order.
    pub fn kept(&self) -> &[CandidateBox] {
        &self.kept
    }

    /// Fills `out` with one normalized row per kept box.
    ///
    /// `out` must hold at least `6 * kept_count()` floats.
    pub fn get_results(&self, out: &mut [f32]) -> YoloPostResult<usize> {
        write_rows(&self.kept, self.params.model_size(), out, usize::MAX)
    }

    /// Like [`PostProcessor::get_results`], writing at most `max_rows` rows.
    pub fn get_results_limited(&self, out: &mut [f32], max_rows: usize) -> YoloPostResult<usize> {
        write_rows(&self.kept, self.params.model_size(), out, max_rows)
    }

    /// Kept boxes as normalized detections, in selection order.
    pub fn detections(&self) -> Vec<Detection> {
        self.kept
            .iter()
            .map(|candidate| Detection::from_candidate(candidate, self.params.model_size()))
            .collect()
    }
}
