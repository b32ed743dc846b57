//! Scalar reference kernel for the class-logit scan.

use crate::kernel::ClassScan;

/// Linear scan, first occurrence wins ties.
pub struct ScalarClassScan;

impl ClassScan for ScalarClassScan {
    #[inline]
    fn best_class(logits: &[f32]) -> (usize, f32) {
        let Some((&first, rest)) = logits.split_first() else {
            return (0, f32::NEG_INFINITY);
        };
        let mut best_idx = 0usize;
        let mut best = first;
        for (idx, &value) in rest.iter().enumerate() {
            if value > best {
                best = value;
                best_idx = idx + 1;
            }
        }
        (best_idx, best)
    }
}
