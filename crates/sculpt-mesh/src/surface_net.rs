use sculpt_geom::{IVec3, Vec3, VoxelBox};
use sculpt_grid::VoxelGrid;

use crate::{ChunkData, MeshStats, Tessellator, Topology, air_direction_normal};

/// Offset applied to a node along each axis whose face disagrees.
pub const DISPLACEMENT: f32 = 0.3;

const CELL_CENTER: f32 = 0.5;

/// Corner order: c0=(0,0,0) c1=+x c2=+y c3=+z c4=+x+y c5=+x+z c6=+y+z c7=+x+y+z.
const CORNERS: [(i32, i32, i32); 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (0, 1, 0),
    (0, 0, 1),
    (1, 1, 0),
    (1, 0, 1),
    (0, 1, 1),
    (1, 1, 1),
];

/// Cells a chunk tessellates. Cell `p` spans voxels `p..=p+1`, so the last
/// row of the grid never starts a cell.
pub fn surface_net_cells(grid_dims: IVec3, chunk: VoxelBox) -> VoxelBox {
    VoxelBox::new(chunk.min, chunk.max.min(grid_dims - IVec3::splat(1)))
}

#[inline]
fn sample_corners(grid: &VoxelGrid, cell: IVec3) -> [bool; 8] {
    CORNERS.map(|(dx, dy, dz)| grid.is_solid(cell.x + dx, cell.y + dy, cell.z + dz))
}

#[inline]
fn is_uniform(c: &[bool; 8]) -> bool {
    c[0] == c[1] && c[0] == c[2] && c[0] == c[3] && c[7] == c[4] && c[7] == c[5] && c[7] == c[6]
}

/// Naive surface net over the binary occupancy field.
///
/// Each transition cell owns one node, pulled from the cell centre toward
/// the faces where occupancy changes. Triangles are emitted for the three
/// edges leaving the min corner and the three entering the max corner, so
/// every voxel edge is visited by exactly two cells and yields one quad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceNetTessellator {
    displacement: f32,
}

impl Default for SurfaceNetTessellator {
    fn default() -> Self {
        Self {
            displacement: DISPLACEMENT,
        }
    }
}

impl SurfaceNetTessellator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_displacement(displacement: f32) -> Self {
        Self { displacement }
    }

    fn displace(&self, c: &[bool; 8]) -> Vec3 {
        let m = self.displacement;
        let mut d = Vec3::ZERO;
        if c[0] != c[2] || c[0] != c[3] || c[0] != c[6] {
            d.x -= m;
        }
        if c[0] != c[1] || c[0] != c[3] || c[0] != c[5] {
            d.y -= m;
        }
        if c[0] != c[1] || c[0] != c[2] || c[0] != c[4] {
            d.z -= m;
        }
        if c[7] != c[1] || c[7] != c[4] || c[7] != c[5] {
            d.x += m;
        }
        if c[7] != c[2] || c[7] != c[4] || c[7] != c[6] {
            d.y += m;
        }
        if c[7] != c[3] || c[7] != c[5] || c[7] != c[6] {
            d.z += m;
        }
        d
    }

    /// Returns the node index for `cell`, displacing it on first use.
    fn place(
        &self,
        grid: &VoxelGrid,
        scratch: &mut ChunkData,
        cell: IVec3,
        stats: &mut MeshStats,
    ) -> usize {
        let index = scratch.node_index(cell);
        if scratch.node(index).placed {
            return index;
        }
        let corners = sample_corners(grid, cell);
        let position = Vec3::from(cell) + Vec3::splat(CELL_CENTER) + self.displace(&corners);
        let normal = air_direction_normal(grid, cell.x, cell.y, cell.z);
        if !normal.is_finite() {
            stats.nan_normals += 1;
        }
        let node = scratch.node_mut(index);
        node.position = position;
        node.normal = normal;
        node.placed = true;
        index
    }
}

impl Tessellator for SurfaceNetTessellator {
    fn name(&self) -> &'static str {
        "surface-net"
    }

    fn topology(&self) -> Topology {
        Topology::Triangles
    }

    fn tessellate(&self, grid: &VoxelGrid, chunk: VoxelBox, scratch: &mut ChunkData) -> MeshStats {
        let cells = surface_net_cells(grid.dims(), chunk);
        scratch.reset_nodes(cells);
        let mut stats = MeshStats::default();
        if cells.is_empty() {
            return stats;
        }

        for x in cells.min.x..cells.max.x {
            for y in cells.min.y..cells.max.y {
                for z in cells.min.z..cells.max.z {
                    stats.cells_visited += 1;
                    let p = IVec3::new(x, y, z);
                    let c = sample_corners(grid, p);
                    if is_uniform(&c) {
                        continue;
                    }
                    stats.transition_cells += 1;
                    let v = self.place(grid, scratch, p, &mut stats);

                    if c[0] != c[1] || c[0] != c[2] || c[0] != c[3] {
                        let vx0 = self.place(grid, scratch, IVec3::new(x - 1, y, z), &mut stats);
                        let vy0 = self.place(grid, scratch, IVec3::new(x, y - 1, z), &mut stats);
                        let vz0 = self.place(grid, scratch, IVec3::new(x, y, z - 1), &mut stats);
                        if c[0] {
                            if !c[1] {
                                scratch.push_face(v, vy0, vz0);
                            }
                            if !c[2] {
                                scratch.push_face(v, vz0, vx0);
                            }
                            if !c[3] {
                                scratch.push_face(v, vx0, vy0);
                            }
                        } else {
                            if c[1] {
                                scratch.push_face(v, vz0, vy0);
                            }
                            if c[2] {
                                scratch.push_face(v, vx0, vz0);
                            }
                            if c[3] {
                                scratch.push_face(v, vy0, vx0);
                            }
                        }
                    }

                    if c[7] != c[4] || c[7] != c[5] || c[7] != c[6] {
                        let vx1 = self.place(grid, scratch, IVec3::new(x + 1, y, z), &mut stats);
                        let vy1 = self.place(grid, scratch, IVec3::new(x, y + 1, z), &mut stats);
                        let vz1 = self.place(grid, scratch, IVec3::new(x, y, z + 1), &mut stats);
                        if c[7] {
                            if !c[4] {
                                scratch.push_face(v, vy1, vx1);
                            }
                            if !c[5] {
                                scratch.push_face(v, vx1, vz1);
                            }
                            if !c[6] {
                                scratch.push_face(v, vz1, vy1);
                            }
                        } else {
                            if c[4] {
                                scratch.push_face(v, vx1, vy1);
                            }
                            if c[5] {
                                scratch.push_face(v, vz1, vx1);
                            }
                            if c[6] {
                                scratch.push_face(v, vy1, vz1);
                            }
                        }
                    }
                }
            }
        }

        scratch.expand_faces();
        stats.primitives = scratch.faces().len() as u32;
        stats.vertices = scratch.vertex_count() as u32;
        if stats.nan_normals > 0 {
            log::trace!(
                "surface-net {:?}..{:?}: {} nodes without an air direction",
                chunk.min,
                chunk.max,
                stats.nan_normals
            );
        }
        scratch.set_stats(stats);
        stats
    }
}
