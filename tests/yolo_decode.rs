use boxsift::{
    decode_yolo, BBox, BoxCoords, BoxSiftError, DetectionSource, PostProcessConfig,
    PostProcessor, YoloDecodeConfig,
};

/// Builds a `[4 + C, anchors]` head output from per-anchor rows.
fn features_first(rows: &[Vec<f32>]) -> (Vec<f32>, usize, usize) {
    let anchors = rows.len();
    let features = rows[0].len();
    let mut out = vec![0.0; anchors * features];
    for (a, row) in rows.iter().enumerate() {
        for (f, &value) in row.iter().enumerate() {
            out[f * anchors + a] = value;
        }
    }
    (out, features, anchors)
}

fn assert_box_close(got: BBox, want: [f32; 4]) {
    for (g, w) in got.to_array().iter().zip(want) {
        assert!((g - w).abs() < 1e-6, "{got:?} vs {want:?}");
    }
}

fn anchor_rows() -> Vec<Vec<f32>> {
    // cx, cy, w, h in pixels of a 640x640 input, then three class scores
    vec![
        vec![192.0, 192.0, 256.0, 256.0, 0.9, 0.05, 0.01],
        vec![200.0, 200.0, 256.0, 256.0, 0.8, 0.1, 0.02],
        vec![512.0, 480.0, 128.0, 96.0, 0.02, 0.03, 0.7],
        vec![600.0, 600.0, 200.0, 200.0, 0.01, 0.6, 0.02],
    ]
}

#[test]
fn both_layouts_decode_identically() {
    let rows = anchor_rows();
    let cfg = YoloDecodeConfig {
        coords: BoxCoords::Pixels,
        ..YoloDecodeConfig::default()
    };
    let (ff, r, c) = features_first(&rows);
    let pf: Vec<f32> = rows.concat();

    let a = decode_yolo(&ff, r, c, 3, &cfg).unwrap();
    let b = decode_yolo(&pf, c, r, 3, &cfg).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 4);
    assert_box_close(a.view().bbox(0).unwrap(), [0.1, 0.1, 0.5, 0.5]);
}

#[test]
fn decoded_output_runs_through_post_processing() {
    let (ff, r, c) = features_first(&anchor_rows());
    let owned = decode_yolo(
        &ff,
        r,
        c,
        3,
        &YoloDecodeConfig {
            coords: BoxCoords::Pixels,
            ..YoloDecodeConfig::default()
        },
    )
    .unwrap();

    let out = PostProcessor::new(PostProcessConfig::default())
        .unwrap()
        .process(&owned.view());
    assert_eq!(out.source, DetectionSource::Nms);
    let labels: Vec<usize> = out.items.iter().map(|d| d.class_id).collect();
    // anchor 1 is suppressed by anchor 0; anchor 3 is clipped into range
    assert_eq!(labels, vec![0, 2, 1]);
    let clipped = out.items[2].bbox;
    assert_eq!(clipped.x_max, 1.0);
    assert_eq!(clipped.y_max, 1.0);
}

#[test]
fn unclipped_boxes_are_dropped_by_the_validity_filter() {
    let (ff, r, c) = features_first(&anchor_rows());
    let owned = decode_yolo(
        &ff,
        r,
        c,
        3,
        &YoloDecodeConfig {
            coords: BoxCoords::Pixels,
            clip: false,
            ..YoloDecodeConfig::default()
        },
    )
    .unwrap();

    let out = PostProcessor::new(PostProcessConfig::default())
        .unwrap()
        .process(&owned.view());
    let labels: Vec<usize> = out.items.iter().map(|d| d.class_id).collect();
    assert_eq!(labels, vec![0, 2]);
}

#[test]
fn unsupported_shape_is_an_error() {
    let data = vec![0.0f32; 30];
    let err = decode_yolo(&data, 5, 6, 3, &YoloDecodeConfig::default())
        .err()
        .unwrap();
    assert_eq!(
        err,
        BoxSiftError::UnsupportedLayout {
            rows: 5,
            cols: 6,
            num_classes: 3,
        }
    );

    let err = decode_yolo(
        &data,
        5,
        6,
        1,
        &YoloDecodeConfig {
            input_width: 0,
            coords: BoxCoords::Pixels,
            ..YoloDecodeConfig::default()
        },
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        BoxSiftError::InvalidParameter {
            name: "input_width",
            ..
        }
    ));
}
