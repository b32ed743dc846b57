//! Candidate boxes, the shared detection buffer and non-max suppression.

pub mod buffer;
pub mod nms;

/// Decoded box in model-resolution pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    /// Index of the best class logit.
    pub class_id: u32,
    /// `sigmoid(objectness) * sigmoid(best class)`.
    pub score: f32,
}

impl CandidateBox {
    /// Returns true if the box has positive width and height.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.xmin < self.xmax && self.ymin < self.ymax
    }

    /// Area of the box; meaningful only for valid boxes.
    #[inline]
    pub fn area(&self) -> f32 {
        (self.xmax - self.xmin) * (self.ymax - self.ymin)
    }

    /// Row `[xmin, ymin, xmax, ymax, class_id, score]` with coordinates divided by `scale`.
    pub fn to_row(&self, scale: f32) -> [f32; 6] {
        [
            self.xmin / scale,
            self.ymin / scale,
            self.xmax / scale,
            self.ymax / scale,
            self.class_id as f32,
            self.score,
        ]
    }
}
