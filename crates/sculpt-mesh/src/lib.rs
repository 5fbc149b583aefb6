//! CPU tessellation of voxel chunks into point clouds or surface-net meshes.
#![forbid(unsafe_code)]

mod normals;
mod point_cloud;
mod scratch;
mod surface_net;
mod vertex;

use sculpt_geom::VoxelBox;
use sculpt_grid::VoxelGrid;

pub use normals::{NORMAL_RADIUS, air_direction_normal};
pub use point_cloud::PointCloudTessellator;
pub use scratch::{ChunkData, MeshNode};
pub use surface_net::{DISPLACEMENT, SurfaceNetTessellator, surface_net_cells};
pub use vertex::{MeshVertex, NORMAL_OFFSET, POSITION_OFFSET, VERTEX_STRIDE};

/// Primitive topology of a tessellator's output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Triangles,
}

impl Topology {
    /// Vertices consumed per primitive.
    pub const fn vertices_per_primitive(self) -> usize {
        match self {
            Topology::Points => 1,
            Topology::Triangles => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    pub cells_visited: u32,
    pub transition_cells: u32,
    pub primitives: u32,
    pub vertices: u32,
    /// Normals whose air-direction sum was zero.
    pub nan_normals: u32,
}

/// Rebuilds the geometry of one chunk into a scratch workspace.
///
/// `chunk` is the chunk's voxel ownership box. Implementations read the
/// live grid and must leave `scratch` holding exactly the new vertices.
pub trait Tessellator: Send + Sync {
    fn name(&self) -> &'static str;

    fn topology(&self) -> Topology;

    fn tessellate(&self, grid: &VoxelGrid, chunk: VoxelBox, scratch: &mut ChunkData) -> MeshStats;
}
