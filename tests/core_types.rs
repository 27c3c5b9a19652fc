use boxsift::{BBox, BoxSiftError, OwnedPredictions, PredictionView};

#[test]
fn view_rejects_partial_box_rows() {
    let boxes = [0.0f32; 6];
    let probs = [0.5f32; 1];

    let err = PredictionView::new(&boxes, &probs, 1).err().unwrap();
    assert_eq!(
        err,
        BoxSiftError::ShapeMismatch {
            what: "box coordinates",
            expected: 4,
            got: 6,
        }
    );
}

#[test]
fn view_rejects_mismatched_score_rows() {
    let boxes = [0.0f32; 8];
    let probs = [0.5f32; 5];

    let err = PredictionView::new(&boxes, &probs, 3).err().unwrap();
    assert_eq!(
        err,
        BoxSiftError::ShapeMismatch {
            what: "class_probs",
            expected: 6,
            got: 5,
        }
    );
}

#[test]
fn view_rejects_zero_classes_with_candidates() {
    let boxes = [0.0f32; 4];

    let err = PredictionView::new(&boxes, &[], 0).err().unwrap();
    assert_eq!(
        err,
        BoxSiftError::InvalidDimensions {
            num_classes: 0,
            background: false,
        }
    );
    assert!(PredictionView::new(&[], &[], 0).unwrap().is_empty());
}

#[test]
fn view_rejects_objectness_length() {
    let boxes = [0.0f32; 8];
    let probs = [0.5f32; 2];
    let objectness = [0.9f32];

    let err = PredictionView::new(&boxes, &probs, 1)
        .unwrap()
        .with_objectness(&objectness)
        .err()
        .unwrap();
    assert_eq!(
        err,
        BoxSiftError::ShapeMismatch {
            what: "objectness",
            expected: 2,
            got: 1,
        }
    );
}

#[test]
fn background_slot_is_hidden_from_class_scores() {
    let boxes = [0.1f32, 0.1, 0.4, 0.4];
    let probs = [0.2f32, 0.3, 0.95];
    let view = PredictionView::new(&boxes, &probs, 3)
        .unwrap()
        .with_background_slot()
        .unwrap();

    assert_eq!(view.num_classes(), 2);
    assert_eq!(view.stride(), 3);
    assert!(view.has_background());
    let candidate = view.candidate(0).unwrap();
    assert_eq!(candidate.class_scores, &[0.2, 0.3]);
    assert_eq!(candidate.best_class(), Some(1));

    let err = view.with_background_slot().err().unwrap();
    assert_eq!(
        err,
        BoxSiftError::InvalidDimensions {
            num_classes: 2,
            background: true,
        }
    );
}

#[test]
fn background_only_scores_are_rejected() {
    let boxes = [0.1f32, 0.1, 0.4, 0.4];
    let probs = [0.9f32];

    let err = PredictionView::new(&boxes, &probs, 1)
        .unwrap()
        .with_background_slot()
        .err()
        .unwrap();
    assert_eq!(
        err,
        BoxSiftError::InvalidDimensions {
            num_classes: 0,
            background: true,
        }
    );
}

#[test]
fn owned_predictions_from_rows() {
    let boxes = [BBox::new(0.1, 0.1, 0.3, 0.3), BBox::new(0.5, 0.5, 0.9, 0.9)];
    let rows = vec![vec![0.7, 0.1], vec![0.2, 0.6]];
    let owned = OwnedPredictions::from_rows(&boxes, &rows)
        .unwrap()
        .with_objectness(vec![0.8, 0.4])
        .unwrap();

    assert_eq!(owned.len(), 2);
    assert_eq!(owned.num_classes(), 2);
    let view = owned.view();
    assert_eq!(view.bbox(1), Some(boxes[1]));
    assert_eq!(view.objectness_at(0), Some(0.8));
    let collected: Vec<usize> = view.candidates().map(|c| c.index).collect();
    assert_eq!(collected, vec![0, 1]);
}

#[test]
fn owned_predictions_reject_ragged_rows() {
    let boxes = [BBox::new(0.1, 0.1, 0.3, 0.3), BBox::new(0.5, 0.5, 0.9, 0.9)];
    let rows = vec![vec![0.7, 0.1], vec![0.2]];

    let err = OwnedPredictions::from_rows(&boxes, &rows).err().unwrap();
    assert_eq!(
        err,
        BoxSiftError::ShapeMismatch {
            what: "class_probs row",
            expected: 2,
            got: 1,
        }
    );
}

#[test]
fn iou_handles_degenerate_boxes() {
    let point = BBox::new(0.5, 0.5, 0.5, 0.5);
    assert_eq!(point.iou(&point), 0.0);

    let a = BBox::new(0.0, 0.0, 0.2, 0.2);
    let b = BBox::new(0.8, 0.8, 1.0, 1.0);
    assert_eq!(a.iou(&b), 0.0);
    assert!((a.iou(&a) - 1.0).abs() < 1e-5);
}

#[test]
fn error_messages_name_the_problem() {
    let err = BoxSiftError::InvalidParameter {
        name: "iou_threshold",
        value: 1.5,
        reason: "must lie in [0, 1]",
    };
    assert_eq!(
        err.to_string(),
        "invalid parameter iou_threshold=1.5: must lie in [0, 1]"
    );
}
