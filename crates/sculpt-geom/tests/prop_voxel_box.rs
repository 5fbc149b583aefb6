use proptest::prelude::*;
use sculpt_geom::{IVec3, VoxelBox};

fn coord() -> impl Strategy<Value = i32> {
    -64i32..=64
}

fn arb_ivec3() -> impl Strategy<Value = IVec3> {
    (coord(), coord(), coord()).prop_map(|(x, y, z)| IVec3::new(x, y, z))
}

fn arb_box() -> impl Strategy<Value = VoxelBox> {
    (arb_ivec3(), 0i32..=24, 0i32..=24, 0i32..=24)
        .prop_map(|(min, ex, ey, ez)| VoxelBox::new(min, min + IVec3::new(ex, ey, ez)))
}

proptest! {
    // A point is in the intersection iff it is in both boxes
    #[test]
    fn intersect_matches_membership(a in arb_box(), b in arb_box(), p in arb_ivec3()) {
        let both = a.contains(p) && b.contains(p);
        match a.intersect(&b) {
            Some(i) => prop_assert_eq!(i.contains(p), both),
            None => prop_assert!(!both),
        }
    }

    // Intersection is commutative
    #[test]
    fn intersect_commutes(a in arb_box(), b in arb_box()) {
        prop_assert_eq!(a.intersect(&b), b.intersect(&a));
    }

    // around() is centered and spans exactly size/2 on each side
    #[test]
    fn around_spans_half_size_each_side(c in arb_ivec3(), s in 0i32..=20) {
        let b = VoxelBox::around(c, IVec3::splat(s));
        let h = s / 2;
        prop_assert!(b.contains(c - IVec3::splat(h)));
        prop_assert!(b.contains(c + IVec3::splat(h)));
        prop_assert!(!b.contains(c + IVec3::new(h + 1, 0, 0)));
        prop_assert!(!b.contains(c - IVec3::new(0, 0, h + 1)));
        prop_assert_eq!(b.volume(), ((2 * h + 1) as usize).pow(3));
    }

    // volume equals the number of contained lattice points
    #[test]
    fn volume_counts_contained_points(b in arb_box()) {
        let mut n = 0usize;
        for x in b.min.x..b.max.x {
            for y in b.min.y..b.max.y {
                for z in b.min.z..b.max.z {
                    if b.contains(IVec3::new(x, y, z)) {
                        n += 1;
                    }
                }
            }
        }
        prop_assert_eq!(n, b.volume());
    }
}

#[test]
fn degenerate_boxes_are_empty() {
    let b = VoxelBox::new(IVec3::splat(3), IVec3::new(3, 5, 5));
    assert!(b.is_empty());
    assert_eq!(b.volume(), 0);
    assert_eq!(b.intersect(&VoxelBox::from_dims(IVec3::splat(10))), None);
}
