use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

use sculpt_geom::{IVec3, VoxelBox};
use sculpt_grid::{CubeGenerator, SphereGenerator, Voxel, VoxelGrid};
use sculpt_mesh::{ChunkData, PointCloudTessellator, SurfaceNetTessellator, Tessellator};

fn sculpted_grid() -> VoxelGrid {
    let grid = VoxelGrid::cube(64);
    grid.insert_shape(&CubeGenerator::new(Voxel::Clay, IVec3::splat(32), 30));
    for (i, c) in [(16, 20, 40), (40, 44, 24), (32, 32, 60), (8, 50, 30)]
        .into_iter()
        .enumerate()
    {
        let radius = 6.0 + 3.0 * i as f32;
        grid.insert_shape(&SphereGenerator::new(Voxel::Air, c.into(), radius));
    }
    grid
}

fn bench_surface_net_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("surface_net_chunk");
    let grid = sculpted_grid();
    let mesher = SurfaceNetTessellator::new();
    let chunk = VoxelBox::new(IVec3::splat(0), IVec3::splat(32));
    let mut scratch = ChunkData::new(0, 32);
    group.bench_function("carved_cube_32", |b| {
        b.iter(|| {
            let stats = mesher.tessellate(&grid, black_box(chunk), &mut scratch);
            black_box(stats);
        })
    });
    group.finish();
}

fn bench_point_cloud_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_cloud_chunk");
    let grid = sculpted_grid();
    let chunk = VoxelBox::new(IVec3::splat(32), IVec3::splat(64));
    let mut scratch = ChunkData::new(0, 32);
    group.bench_function("carved_cube_32", |b| {
        b.iter(|| {
            let stats = PointCloudTessellator.tessellate(&grid, black_box(chunk), &mut scratch);
            black_box(stats);
        })
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(3));
    targets = bench_surface_net_chunk, bench_point_cloud_chunk
}
criterion_main!(benches);
