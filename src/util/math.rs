//! Activation helpers for logit decoding.

/// Logistic sigmoid.
#[inline]
pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Inverse of [`sigmoid`] for `p` in (0, 1).
#[inline]
pub(crate) fn inverse_sigmoid(p: f32) -> f32 {
    let p = p as f64;
    (p / (1.0 - p)).ln() as f32
}

#[cfg(test)]
mod tests {
    use super::{inverse_sigmoid, sigmoid};

    #[test]
    fn sigmoid_is_centered_at_zero() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-7);
        assert!(sigmoid(20.0) > 0.999_999);
        assert!(sigmoid(-20.0) < 1e-6);
    }

    #[test]
    fn inverse_sigmoid_round_trips() {
        for p in [0.05f32, 0.25, 0.4, 0.5, 0.75, 0.95] {
            assert!((sigmoid(inverse_sigmoid(p)) - p).abs() < 1e-6);
        }
        assert_eq!(inverse_sigmoid(0.5), 0.0);
    }
}
