//! Class-logit scan kernels.
//!
//! The decode loop spends most of its accepted-anchor time finding the best
//! class logit. The scalar kernel is the reference; the `simd` feature swaps
//! in an `f32x8` kernel with the same first-occurrence tie rule.

/// Finds the maximum class logit of one anchor.
pub trait ClassScan {
    /// Returns `(index, logit)` of the maximum; the lowest index wins ties.
    fn best_class(logits: &[f32]) -> (usize, f32);
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(not(feature = "simd"))]
pub(crate) use scalar::ScalarClassScan as ActiveClassScan;
#[cfg(feature = "simd")]
pub(crate) use simd::SimdClassScan as ActiveClassScan;
