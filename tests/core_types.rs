use yolopost::lowlevel::{anchor_counts, classes_from_channels, HeadLayout, RawHeads};
use yolopost::{PostProcessor, SessionConfig, YoloPostError};

#[test]
fn anchor_counts_follow_strides() {
    assert_eq!(anchor_counts(640), [19200, 4800, 1200]);
    assert_eq!(anchor_counts(320), [4800, 1200, 300]);
}

#[test]
fn head_layout_round_trips_sites() {
    let layout = HeadLayout::new(1, 64, 3).unwrap();
    assert_eq!(layout.grid(), 4);
    assert_eq!(layout.channels(), 8);
    assert_eq!(layout.len(), 4 * 4 * 3 * 8);

    let local = layout.local_index(3, 1, 2);
    let site = layout.site(local);
    assert_eq!((site.row, site.col, site.anchor), (3, 1, 2));
    assert_eq!(layout.site_offset(local), layout.offset(3, 1, 2, 0));
}

#[test]
fn raw_heads_reject_wrong_lengths() {
    let h0 = vec![0.0f32; 8 * 8 * 3 * 6];
    let h1 = vec![0.0f32; 4 * 4 * 3 * 6];
    let h2 = vec![0.0f32; 2 * 2 * 3 * 6 - 1];
    let err = RawHeads::new([&h0, &h1, &h2], 64, 1).err().unwrap();
    assert_eq!(
        err,
        YoloPostError::HeadLengthMismatch {
            head: 2,
            expected: 72,
            got: 71,
        }
    );
    assert!(err.is_configuration());
}

#[test]
fn classes_are_inferred_from_channels() {
    assert_eq!(classes_from_channels(255).unwrap(), 80);
    assert!(classes_from_channels(254).is_err());
    assert!(classes_from_channels(15).is_err());
}

#[test]
fn session_rejects_invalid_config() {
    let err = PostProcessor::new(SessionConfig {
        score_threshold: 1.0,
        ..SessionConfig::default()
    })
    .err()
    .unwrap();
    assert_eq!(
        err,
        YoloPostError::ThresholdOutOfRange {
            name: "score_threshold",
            value: 1.0,
        }
    );

    let err = PostProcessor::new(SessionConfig {
        model_size: 100,
        ..SessionConfig::default()
    })
    .err()
    .unwrap();
    assert_eq!(
        err,
        YoloPostError::ModelSizeNotDivisible {
            model_size: 100,
            stride: 8,
        }
    );

    let err = PostProcessor::new(SessionConfig {
        worker_count: 0,
        ..SessionConfig::default()
    })
    .err()
    .unwrap();
    assert!(err.is_configuration());
}

#[test]
fn process_rejects_mismatched_heads() {
    let mut post = PostProcessor::new(SessionConfig {
        model_size: 64,
        classes_number: 1,
        ..SessionConfig::default()
    })
    .unwrap();
    let h0 = vec![0.0f32; 8 * 8 * 3 * 6];
    let h1 = vec![0.0f32; 10];
    let h2 = vec![0.0f32; 2 * 2 * 3 * 6];
    let err = post.process(&h0, &h1, &h2).err().unwrap();
    assert!(matches!(
        err,
        YoloPostError::HeadLengthMismatch { head: 1, got: 10, .. }
    ));
    assert_eq!(post.kept_count(), 0);
}
