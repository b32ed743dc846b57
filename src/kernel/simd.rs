//! SIMD class-logit scan using the `wide` crate.
//!
//! The maximum is reduced eight lanes at a time, then the first index holding
//! it is located with a scalar pass so ties resolve exactly like the scalar
//! kernel. A NaN in the first lane is kept as the result, as the scalar scan
//! does, so the gate rejects the anchor either way.

use crate::kernel::scalar::ScalarClassScan;
use crate::kernel::ClassScan;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Horizontal max of f32x8.
#[inline]
fn hmax(v: f32x8) -> f32 {
    v.to_array().into_iter().fold(f32::NEG_INFINITY, f32::max)
}

/// Vectorized scan for wide class heads (for example 80 COCO classes).
pub struct SimdClassScan;

impl ClassScan for SimdClassScan {
    #[inline]
    fn best_class(logits: &[f32]) -> (usize, f32) {
        if logits.len() < LANES || logits[0].is_nan() {
            return ScalarClassScan::best_class(logits);
        }

        let chunks = logits.chunks_exact(LANES);
        let tail = chunks.remainder();
        let mut acc = f32x8::splat(f32::NEG_INFINITY);
        for chunk in chunks {
            acc = acc.max(load_f32x8(chunk));
        }
        let best = tail.iter().copied().fold(hmax(acc), f32::max);

        match logits.iter().position(|&value| value == best) {
            Some(idx) => (idx, best),
            None => ScalarClassScan::best_class(logits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SimdClassScan;
    use crate::kernel::scalar::ScalarClassScan;
    use crate::kernel::ClassScan;

    #[test]
    fn matches_scalar_kernel() {
        let mut logits: Vec<f32> = (0..80).map(|i| ((i * 37) % 23) as f32 * 0.25 - 2.0).collect();
        assert_eq!(
            SimdClassScan::best_class(&logits),
            ScalarClassScan::best_class(&logits)
        );
        logits[79] = 100.0;
        assert_eq!(SimdClassScan::best_class(&logits), (79, 100.0));
        logits[12] = 100.0;
        assert_eq!(SimdClassScan::best_class(&logits), (12, 100.0));
    }

    #[test]
    fn leading_nan_matches_scalar_kernel() {
        let mut logits = vec![0.0f32; 16];
        logits[0] = f32::NAN;
        logits[5] = 3.0;
        let (idx, value) = SimdClassScan::best_class(&logits);
        assert_eq!(idx, 0);
        assert!(value.is_nan());
        assert_eq!(ScalarClassScan::best_class(&logits).0, idx);

        logits[0] = 0.0;
        logits[9] = f32::NAN;
        assert_eq!(
            SimdClassScan::best_class(&logits),
            ScalarClassScan::best_class(&logits)
        );
    }
}
