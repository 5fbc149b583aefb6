use sculpt_geom::Vec3;
use sculpt_grid::VoxelGrid;

/// Half-width of the neighbourhood sampled for normals (5×5×5 window).
pub const NORMAL_RADIUS: i32 = 2;

/// Normalized sum of the offsets toward every in-grid air voxel around
/// `(x, y, z)`. A symmetric neighbourhood sums to zero and yields NaN.
pub fn air_direction_normal(grid: &VoxelGrid, x: i32, y: i32, z: i32) -> Vec3 {
    let mut sum = Vec3::ZERO;
    for dx in -NORMAL_RADIUS..=NORMAL_RADIUS {
        for dy in -NORMAL_RADIUS..=NORMAL_RADIUS {
            for dz in -NORMAL_RADIUS..=NORMAL_RADIUS {
                let (nx, ny, nz) = (x + dx, y + dy, z + dz);
                if grid.contains(nx, ny, nz) && !grid.get_voxel(nx, ny, nz).is_solid() {
                    sum += Vec3::new(dx as f32, dy as f32, dz as f32);
                }
            }
        }
    }
    sum.normalized_or_nan()
}
