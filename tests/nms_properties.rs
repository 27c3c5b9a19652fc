//! Randomized checks of the NMS and post-processing invariants.

use boxsift::{
    classwise_nms, NmsParams, OwnedPredictions, PostProcessConfig, PostProcessor, Selection,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TRIALS: usize = 200;

/// Random candidates; some boxes are inverted or leave the unit square.
fn random_predictions(rng: &mut StdRng) -> OwnedPredictions {
    let n = rng.random_range(0..40);
    let num_classes = rng.random_range(1..6);
    let mut boxes = Vec::with_capacity(n * 4);
    for _ in 0..n {
        let x = rng.random_range(-0.1f32..1.0);
        let y = rng.random_range(-0.1f32..1.0);
        let w = rng.random_range(-0.05f32..0.5);
        let h = rng.random_range(-0.05f32..0.5);
        boxes.extend_from_slice(&[x, y, x + w, y + h]);
    }
    let probs = (0..n * num_classes).map(|_| rng.random::<f32>()).collect();
    let objectness = (0..n).map(|_| rng.random::<f32>()).collect();
    OwnedPredictions::new(boxes, probs, num_classes)
        .unwrap()
        .with_objectness(objectness)
        .unwrap()
}

fn random_params(rng: &mut StdRng) -> NmsParams {
    NmsParams {
        iou_threshold: rng.random_range(0.0f32..=1.0),
        score_threshold: rng.random_range(0.0f32..=1.0),
        max_output_per_class: rng.random_range(0..6),
    }
}

fn per_class_counts(sel: &Selection, num_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; num_classes];
    for &label in sel.labels() {
        counts[label] += 1;
    }
    counts
}

#[test]
fn raising_score_threshold_never_adds_detections() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..TRIALS {
        let owned = random_predictions(&mut rng);
        let view = owned.view();
        let low = random_params(&mut rng);
        let high = NmsParams {
            score_threshold: rng.random_range(low.score_threshold..=1.0),
            ..low
        };
        let n_low = classwise_nms(&view, &low).len();
        let n_high = classwise_nms(&view, &high).len();
        assert!(n_high <= n_low, "{n_high} > {n_low} for {low:?} -> {high:?}");
    }
}

#[test]
fn per_class_cap_holds() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..TRIALS {
        let owned = random_predictions(&mut rng);
        let view = owned.view();
        let params = random_params(&mut rng);
        let sel = classwise_nms(&view, &params);
        for count in per_class_counts(&sel, view.num_classes()) {
            assert!(count <= params.max_output_per_class);
        }
    }
}

#[test]
fn scores_are_sorted_and_above_threshold() {
    let mut rng = StdRng::seed_from_u64(37);
    for _ in 0..TRIALS {
        let owned = random_predictions(&mut rng);
        let params = random_params(&mut rng);
        let sel = classwise_nms(&owned.view(), &params);
        assert!(sel.scores().windows(2).all(|w| w[0] >= w[1]));
        assert!(sel.scores().iter().all(|&s| s > params.score_threshold));
    }
}

#[test]
fn kept_boxes_of_one_class_do_not_overlap_past_threshold() {
    let mut rng = StdRng::seed_from_u64(41);
    for _ in 0..TRIALS {
        let owned = random_predictions(&mut rng);
        let mut params = random_params(&mut rng);
        params.max_output_per_class = 40;
        let sel = classwise_nms(&owned.view(), &params);
        let dets: Vec<_> = sel.detections().collect();
        for (i, a) in dets.iter().enumerate() {
            for b in &dets[i + 1..] {
                if a.class_id == b.class_id {
                    assert!(a.bbox.iou(&b.bbox) <= params.iou_threshold);
                }
            }
        }
    }
}

#[test]
fn processed_boxes_are_valid_and_sorted() {
    let mut rng = StdRng::seed_from_u64(53);
    for _ in 0..TRIALS {
        let owned = random_predictions(&mut rng);
        let processor = PostProcessor::new(PostProcessConfig {
            nms: random_params(&mut rng),
            ..PostProcessConfig::default()
        })
        .unwrap();
        let out = processor.process(&owned.view());
        for det in &out.items {
            let b = det.bbox;
            assert!(b.x_max > b.x_min && b.y_max > b.y_min);
            assert!([b.x_min, b.y_min, b.x_max, b.y_max]
                .iter()
                .all(|v| (0.0..=1.0).contains(v)));
        }
        assert!(out.items.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn nms_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(67);
    for _ in 0..50 {
        let owned = random_predictions(&mut rng);
        let params = random_params(&mut rng);
        let view = owned.view();
        assert_eq!(classwise_nms(&view, &params), classwise_nms(&view, &params));
    }
}
