#![cfg(feature = "simd")]

use boxsift::lowlevel::{KeptBoxes, OverlapKernel, ScalarOverlap, SimdOverlap};
use boxsift::BBox;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_box(rng: &mut StdRng) -> BBox {
    let x = rng.random_range(-0.1f32..1.0);
    let y = rng.random_range(-0.1f32..1.0);
    let w = rng.random_range(-0.05f32..0.6);
    let h = rng.random_range(-0.05f32..0.6);
    BBox::new(x, y, x + w, y + h)
}

#[test]
fn simd_and_scalar_reach_the_same_decisions() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..500 {
        let mut kept = KeptBoxes::default();
        for _ in 0..rng.random_range(0..13) {
            kept.push(random_box(&mut rng));
        }
        let bbox = random_box(&mut rng);
        let threshold = rng.random_range(0.0f32..=1.0);
        assert_eq!(
            ScalarOverlap::suppresses(&bbox, &kept, threshold),
            SimdOverlap::suppresses(&bbox, &kept, threshold),
            "bbox {bbox:?} threshold {threshold}"
        );
    }
}

#[test]
fn exact_duplicate_is_suppressed_in_every_lane() {
    let target = BBox::new(0.2, 0.2, 0.4, 0.4);
    for position in 0..9 {
        let mut kept = KeptBoxes::with_capacity(9);
        for i in 0..9 {
            if i == position {
                kept.push(target);
            } else {
                let offset = 0.5 + i as f32 * 0.05;
                kept.push(BBox::new(offset, offset, offset + 0.04, offset + 0.04));
            }
        }
        assert!(SimdOverlap::suppresses(&target, &kept, 0.9));
        assert!(ScalarOverlap::suppresses(&target, &kept, 0.9));
    }
}
