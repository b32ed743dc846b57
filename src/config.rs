//! Session configuration and the constants derived from it.

use crate::head::anchors::{AnchorTable, ANCHORS, ANCHORS_PER_CELL, NUM_HEADS, STRIDES};
use crate::util::math::inverse_sigmoid;
use crate::util::{YoloPostError, YoloPostResult};

/// User-facing parameters of a post-processing session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// Square model input resolution in pixels.
    pub model_size: usize,
    /// Number of class logits per anchor.
    pub classes_number: usize,
    /// Minimum accepted score, in (0, 1).
    pub score_threshold: f32,
    /// IOU above which same-class boxes are suppressed, in (0, 1).
    pub nms_threshold: f32,
    /// Number of decode workers.
    pub worker_count: usize,
    /// Anchor `(width, height)` templates in model pixels.
    pub anchors: AnchorTable,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model_size: 640,
            classes_number: 80,
            score_threshold: 0.4,
            nms_threshold: 0.45,
            worker_count: 8,
            anchors: ANCHORS,
        }
    }
}

impl SessionConfig {
    /// Validates all parameters.
    pub fn validate(&self) -> YoloPostResult<()> {
        validate_model(self.model_size, self.classes_number)?;
        validate_threshold("score_threshold", self.score_threshold)?;
        validate_threshold("nms_threshold", self.nms_threshold)?;
        if self.worker_count == 0 {
            return Err(YoloPostError::InvalidConfig("worker_count must be >= 1"));
        }
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !self.anchors.iter().flatten().all(|&(w, h)| positive(w) && positive(h)) {
            return Err(YoloPostError::InvalidConfig(
                "anchor sizes must be positive and finite",
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_model(model_size: usize, classes_number: usize) -> YoloPostResult<()> {
    for stride in STRIDES {
        if model_size == 0 || model_size % stride != 0 {
            return Err(YoloPostError::ModelSizeNotDivisible { model_size, stride });
        }
    }
    if classes_number == 0 {
        return Err(YoloPostError::InvalidConfig("classes_number must be > 0"));
    }
    Ok(())
}

pub(crate) fn validate_threshold(name: &'static str, value: f32) -> YoloPostResult<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(YoloPostError::ThresholdOutOfRange { name, value });
    }
    Ok(())
}

/// Pre-activation gate for logits.
///
/// `sigmoid(x) * p <= sigmoid(x)` for any probability `p`, so an anchor whose
/// objectness or best class logit is below `inverse_sigmoid(threshold)`
/// cannot reach the threshold and is dropped before any `exp` is evaluated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreGate {
    threshold: f32,
    logit: f32,
}

impl ScoreGate {
    /// Gate for a score threshold in (0, 1).
    pub fn new(threshold: f32) -> YoloPostResult<Self> {
        validate_threshold("score_threshold", threshold)?;
        Ok(Self {
            threshold,
            logit: inverse_sigmoid(threshold),
        })
    }

    /// Score threshold in probability space.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Score threshold in logit space.
    pub fn logit(&self) -> f32 {
        self.logit
    }

    /// Returns true if `logit` may still produce an accepted score.
    #[inline]
    pub fn admits(&self, logit: f32) -> bool {
        logit >= self.logit
    }

    /// Returns true if the final score is accepted.
    #[inline]
    pub fn accepts(&self, score: f32) -> bool {
        score >= self.threshold
    }
}

/// Immutable per-session constants.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterConfig {
    model_size: usize,
    classes_number: usize,
    nms_threshold: f32,
    worker_count: usize,
    gate: ScoreGate,
    anchors: AnchorTable,
    anchor_counts: [usize; NUM_HEADS],
}

impl ParameterConfig {
    /// Validates `cfg` and derives the session constants.
    pub fn new(cfg: &SessionConfig) -> YoloPostResult<Self> {
        cfg.validate()?;
        Ok(Self {
            model_size: cfg.model_size,
            classes_number: cfg.classes_number,
            nms_threshold: cfg.nms_threshold,
            worker_count: cfg.worker_count,
            gate: ScoreGate::new(cfg.score_threshold)?,
            anchors: cfg.anchors,
            anchor_counts: anchor_counts(cfg.model_size),
        })
    }

    pub fn model_size(&self) -> usize {
        self.model_size
    }

    pub fn classes_number(&self) -> usize {
        self.classes_number
    }

    pub fn score_threshold(&self) -> f32 {
        self.gate.threshold()
    }

    pub fn nms_threshold(&self) -> f32 {
        self.nms_threshold
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Pre-activation gate derived from the score threshold.
    pub fn gate(&self) -> ScoreGate {
        self.gate
    }

    /// Anchor templates used for width/height decoding.
    pub fn anchors(&self) -> &AnchorTable {
        &self.anchors
    }

    /// Raw anchor count of each head.
    pub fn anchor_counts(&self) -> [usize; NUM_HEADS] {
        self.anchor_counts
    }

    /// Raw anchor count across all heads.
    pub fn total_anchors(&self) -> usize {
        self.anchor_counts.iter().sum()
    }
}

/// `3 * (model_size / stride)^2` per head.
pub fn anchor_counts(model_size: usize) -> [usize; NUM_HEADS] {
    STRIDES.map(|stride| {
        let grid = model_size / stride;
        ANCHORS_PER_CELL * grid * grid
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let params = ParameterConfig::new(&SessionConfig::default()).unwrap();
        assert_eq!(params.anchor_counts(), [19200, 4800, 1200]);
        assert_eq!(params.total_anchors(), 25200);
    }

    #[test]
    fn gate_boundary_is_inclusive() {
        let gate = ScoreGate::new(0.4).unwrap();
        let at = gate.logit();
        let below = f32::from_bits(at.to_bits() + 1);
        assert!(at < 0.0 && below < at);
        assert!(gate.admits(at));
        assert!(!gate.admits(below));
        assert!(gate.accepts(0.4));
        assert!(!gate.accepts(0.399_999));
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        for value in [0.0f32, 1.0, -0.1, f32::NAN] {
            let cfg = SessionConfig {
                nms_threshold: value,
                ..SessionConfig::default()
            };
            assert!(matches!(
                cfg.validate(),
                Err(YoloPostError::ThresholdOutOfRange {
                    name: "nms_threshold",
                    ..
                })
            ));
        }
    }

    #[test]
    fn rejects_bad_model_size_and_counts() {
        let cfg = SessionConfig {
            model_size: 100,
            ..SessionConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(YoloPostError::ModelSizeNotDivisible {
                model_size: 100,
                stride: 8,
            })
        );
        let cfg = SessionConfig {
            model_size: 648,
            ..SessionConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(YoloPostError::ModelSizeNotDivisible {
                model_size: 648,
                stride: 16,
            })
        );
        let cfg = SessionConfig {
            worker_count: 0,
            ..SessionConfig::default()
        };
        assert!(cfg.validate().unwrap_err().is_configuration());
        let cfg = SessionConfig {
            classes_number: 0,
            ..SessionConfig::default()
        };
        assert!(cfg.validate().unwrap_err().is_configuration());
    }
}
