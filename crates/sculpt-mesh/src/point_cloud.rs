use sculpt_geom::{Vec3, VoxelBox};
use sculpt_grid::VoxelGrid;

use crate::{ChunkData, MeshStats, MeshVertex, Tessellator, Topology, air_direction_normal};

const FACE_NEIGHBORS: [(i32, i32, i32); 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

/// One point per solid voxel that touches an in-grid air voxel across a face.
///
/// Neighbours outside the grid do not count as air, so a block filling the
/// grid has no points on its outer faces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointCloudTessellator;

impl PointCloudTessellator {
    fn exposed(grid: &VoxelGrid, x: i32, y: i32, z: i32) -> bool {
        FACE_NEIGHBORS.iter().any(|&(dx, dy, dz)| {
            let (nx, ny, nz) = (x + dx, y + dy, z + dz);
            grid.contains(nx, ny, nz) && !grid.get_voxel(nx, ny, nz).is_solid()
        })
    }
}

impl Tessellator for PointCloudTessellator {
    fn name(&self) -> &'static str {
        "point-cloud"
    }

    fn topology(&self) -> Topology {
        Topology::Points
    }

    fn tessellate(&self, grid: &VoxelGrid, chunk: VoxelBox, scratch: &mut ChunkData) -> MeshStats {
        scratch.reset_points();
        let mut stats = MeshStats::default();
        let Some(region) = chunk.intersect(&grid.bounds()) else {
            return stats;
        };
        for x in region.min.x..region.max.x {
            for y in region.min.y..region.max.y {
                for z in region.min.z..region.max.z {
                    stats.cells_visited += 1;
                    if !grid.get_voxel(x, y, z).is_solid() || !Self::exposed(grid, x, y, z) {
                        continue;
                    }
                    stats.transition_cells += 1;
                    let normal = air_direction_normal(grid, x, y, z);
                    if !normal.is_finite() {
                        stats.nan_normals += 1;
                    }
                    let position = Vec3::new(x as f32, y as f32, z as f32);
                    scratch.push_vertex(MeshVertex::new(position, normal));
                }
            }
        }
        stats.vertices = scratch.vertex_count() as u32;
        stats.primitives = stats.vertices;
        log::trace!(
            "point-cloud {:?}..{:?}: {} exposed of {} cells",
            region.min,
            region.max,
            stats.transition_cells,
            stats.cells_visited
        );
        scratch.set_stats(stats);
        stats
    }
}
