//! Fixed-capacity detection arena shared by decode workers.
//!
//! Workers reserve a slot with a single `fetch_add` on the cursor and write
//! the box into that slot. Reservations are unique, so slots are written at
//! most once per call and no lock is needed. A reservation at or past the
//! capacity fails with `CapacityExceeded` and writes nothing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use crate::candidate::CandidateBox;
use crate::util::{YoloPostError, YoloPostResult};

/// Pre-sized buffer of write-once candidate slots with an atomic cursor.
pub struct DetectionBuffer {
    slots: Box<[OnceLock<CandidateBox>]>,
    cursor: AtomicUsize,
}

impl DetectionBuffer {
    /// Allocates `capacity` empty slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| OnceLock::new()).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of reserved slots, capped at the capacity.
    pub fn len(&self) -> usize {
        self.cursor.load(Ordering::Acquire).min(self.slots.len())
    }

    /// Returns true if nothing has been appended since the last reset.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a box and returns its slot index.
    pub fn push(&self, candidate: CandidateBox) -> YoloPostResult<usize> {
        let slot = self.cursor.fetch_add(1, Ordering::AcqRel);
        let cell = self
            .slots
            .get(slot)
            .ok_or(YoloPostError::CapacityExceeded {
                capacity: self.slots.len(),
            })?;
        cell.set(candidate)
            .map_err(|_| YoloPostError::InvariantViolation("detection slot written twice"))?;
        Ok(slot)
    }

    /// Clears every written slot and rewinds the cursor.
    pub fn reset(&mut self) {
        let used = self.len();
        for slot in &mut self.slots[..used] {
            slot.take();
        }
        *self.cursor.get_mut() = 0;
    }

    /// Copies the appended boxes in slot order.
    ///
    /// Must be called after all writers have joined.
    pub fn snapshot(&self) -> YoloPostResult<Vec<CandidateBox>> {
        self.slots[..self.len()]
            .iter()
            .map(|slot| {
                slot.get()
                    .copied()
                    .ok_or(YoloPostError::InvariantViolation("reserved slot left empty"))
            })
            .collect()
    }
}

impl std::fmt::Debug for DetectionBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(score: f32) -> CandidateBox {
        CandidateBox {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 1.0,
            ymax: 1.0,
            class_id: 0,
            score,
        }
    }

    #[test]
    fn push_fills_slots_in_order() {
        let buffer = DetectionBuffer::with_capacity(3);
        assert_eq!(buffer.push(unit_box(0.1)).unwrap(), 0);
        assert_eq!(buffer.push(unit_box(0.2)).unwrap(), 1);
        let boxes = buffer.snapshot().unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[1].score, 0.2);
    }

    #[test]
    fn push_past_capacity_fails() {
        let buffer = DetectionBuffer::with_capacity(1);
        buffer.push(unit_box(0.5)).unwrap();
        let err = buffer.push(unit_box(0.6)).unwrap_err();
        assert_eq!(err, YoloPostError::CapacityExceeded { capacity: 1 });
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.snapshot().unwrap()[0].score, 0.5);
    }

    #[test]
    fn reset_clears_previous_call() {
        let mut buffer = DetectionBuffer::with_capacity(2);
        buffer.push(unit_box(0.5)).unwrap();
        buffer.push(unit_box(0.6)).unwrap();
        let _ = buffer.push(unit_box(0.7));
        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!(buffer.push(unit_box(0.9)).unwrap(), 0);
        assert_eq!(buffer.snapshot().unwrap(), vec![unit_box(0.9)]);
    }

    #[test]
    fn concurrent_pushes_get_unique_slots() {
        let buffer = DetectionBuffer::with_capacity(400);
        std::thread::scope(|scope| {
            for t in 0..4 {
                let buffer = &buffer;
                scope.spawn(move || {
                    for i in 0..100 {
                        buffer.push(unit_box((t * 100 + i) as f32)).unwrap();
                    }
                });
            }
        });
        let mut scores: Vec<u32> = buffer
            .snapshot()
            .unwrap()
            .iter()
            .map(|b| b.score as u32)
            .collect();
        scores.sort_unstable();
        assert_eq!(scores, (0..400).collect::<Vec<_>>());
    }
}
