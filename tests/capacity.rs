use yolopost::lowlevel::{DetectionBuffer, HeadLayout};
use yolopost::{fast_postprocess, CandidateBox, YoloPostError, ROW_LEN};

const MODEL_SIZE: usize = 64;
const CLASSES: usize = 1;

/// Heads where every anchor passes the score filter with a valid box.
fn saturated_heads() -> [Vec<f32>; 3] {
    [0, 1, 2].map(|head| {
        let layout = HeadLayout::new(head, MODEL_SIZE, CLASSES).unwrap();
        let mut data = vec![0.0f32; layout.len()];
        for site in data.chunks_exact_mut(layout.channels()) {
            site[4] = 5.0;
            site[5] = 5.0;
        }
        data
    })
}

fn run(max_candidates: usize, out: &mut [f32], max_boxes: usize) -> Result<usize, YoloPostError> {
    let heads = saturated_heads();
    fast_postprocess(
        [&heads[0], &heads[1], &heads[2]],
        MODEL_SIZE,
        CLASSES,
        0.4,
        0.45,
        max_candidates,
        out,
        max_boxes,
    )
}

#[test]
fn undersized_arena_reports_capacity() {
    let mut out = vec![0.0f32; 100 * ROW_LEN];
    assert_eq!(
        run(4, &mut out, 100),
        Err(YoloPostError::CapacityExceeded { capacity: 4 })
    );
}

#[test]
fn arena_sized_to_anchor_total_succeeds() {
    let mut out = vec![0.0f32; 300 * ROW_LEN];
    let rows = run(252, &mut out, 300).unwrap();
    assert!(rows > 0);
    assert!(rows <= 252);
    for row in out[..rows * ROW_LEN].chunks_exact(ROW_LEN) {
        assert!(row[..4].iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(row[0] < row[2] && row[1] < row[3]);
        assert_eq!(row[4], 0.0);
    }
}

#[test]
fn short_output_is_reported() {
    let mut out = vec![0.0f32; ROW_LEN];
    assert!(matches!(
        run(252, &mut out, 10),
        Err(YoloPostError::OutputTooSmall { got: 6, .. })
    ));
}

#[test]
fn buffer_rejects_pushes_past_capacity() {
    let buffer = DetectionBuffer::with_capacity(2);
    let candidate = CandidateBox {
        xmin: 0.0,
        ymin: 0.0,
        xmax: 1.0,
        ymax: 1.0,
        class_id: 0,
        score: 0.5,
    };
    assert_eq!(buffer.push(candidate).unwrap(), 0);
    assert_eq!(buffer.push(candidate).unwrap(), 1);
    assert_eq!(
        buffer.push(candidate),
        Err(YoloPostError::CapacityExceeded { capacity: 2 })
    );
    assert_eq!(buffer.len(), 2);
    assert_eq!(buffer.snapshot().unwrap().len(), 2);
}
