use proptest::prelude::*;
use sculpt_geom::IVec3;
use sculpt_runtime::{BlockingSet, ChunkPartition};

fn arb_partition() -> impl Strategy<Value = ChunkPartition> {
    (1i32..=40, 1i32..=40, 1i32..=40, 0u32..=4).prop_map(|(x, y, z, shift)| {
        ChunkPartition::new(IVec3::new(x, y, z), 1usize << shift).unwrap()
    })
}

proptest! {
    // Chunk boxes tile the grid: volumes add up and every voxel lies in its owner
    #[test]
    fn chunk_bounds_tile_the_grid(p in arb_partition(), sx in 0i32..40, sy in 0i32..40, sz in 0i32..40) {
        let d = p.grid_dims();
        let total: usize = p.ids().map(|id| p.bounds(id).volume()).sum();
        prop_assert_eq!(total, (d.x * d.y * d.z) as usize);

        let v = IVec3::new(sx % d.x, sy % d.y, sz % d.z);
        let owner = p.id(p.chunk_of(v.x, v.y, v.z)).unwrap();
        prop_assert!(p.bounds(owner).contains(v));
        for id in p.ids().filter(|&id| id != owner) {
            prop_assert!(!p.bounds(id).contains(v));
        }
    }

    // The owner is always affected and every affected chunk is adjacent to it
    #[test]
    fn affected_chunks_surround_the_owner(
        p in arb_partition(),
        sx in 0i32..40, sy in 0i32..40, sz in 0i32..40,
        margin in 0u32..6,
    ) {
        let d = p.grid_dims();
        let (x, y, z) = (sx % d.x, sy % d.y, sz % d.z);
        let owner = p.chunk_of(x, y, z);
        let mut seen = Vec::new();
        p.for_each_affected(x, y, z, margin, |id| seen.push(p.coord(id)));
        prop_assert!(seen.contains(&owner));
        prop_assert!(seen.len() <= 27);
        for c in &seen {
            prop_assert!((c.cx - owner.cx).abs() <= 1);
            prop_assert!((c.cy - owner.cy).abs() <= 1);
            prop_assert!((c.cz - owner.cz).abs() <= 1);
        }
        let mut unique = seen.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(unique.len(), seen.len());
    }

    // A blocking set yields each distinct value once, in first-insertion order
    #[test]
    fn blocking_set_dedups_in_fifo_order(values in proptest::collection::vec(0u8..16, 0..64)) {
        let set = BlockingSet::new();
        set.add_all(values.iter().copied());
        let mut expected = Vec::new();
        for v in &values {
            if !expected.contains(v) {
                expected.push(*v);
            }
        }
        let mut taken = Vec::new();
        while let Some(v) = set.try_take() {
            taken.push(v);
        }
        prop_assert_eq!(taken, expected);
    }
}
