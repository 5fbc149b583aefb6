use sculpt_geom::{IVec3, Vec3, VoxelBox};

use crate::{MeshStats, MeshVertex};

/// Most triangles a single surface-net cell can emit (3 per corner fan).
pub(crate) const MAX_TRIANGLES_PER_CELL: usize = 6;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshNode {
    pub position: Vec3,
    pub normal: Vec3,
    pub placed: bool,
}

/// Reusable per-worker workspace: a surface-net node grid sized for one
/// chunk plus a one-node halo, a face list and the output vertex buffer.
///
/// Buffers are allocated once for the worst case and never grow. `slot`
/// identifies the instance within its pool.
#[derive(Debug)]
pub struct ChunkData {
    slot: usize,
    chunk_size: usize,
    origin: IVec3,
    node_extent: IVec3,
    nodes: Vec<MeshNode>,
    faces: Vec<[u32; 3]>,
    vertices: Vec<MeshVertex>,
    stats: MeshStats,
}

impl ChunkData {
    pub fn new(slot: usize, chunk_size: usize) -> Self {
        let side = chunk_size + 2;
        let cells = chunk_size * chunk_size * chunk_size;
        Self {
            slot,
            chunk_size,
            origin: IVec3::ZERO,
            node_extent: IVec3::ZERO,
            nodes: vec![MeshNode::default(); side * side * side],
            faces: Vec::with_capacity(cells * MAX_TRIANGLES_PER_CELL),
            vertices: Vec::with_capacity(cells * MAX_TRIANGLES_PER_CELL * 3),
            stats: MeshStats::default(),
        }
    }

    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[inline]
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    #[inline]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    #[inline]
    pub fn stats(&self) -> MeshStats {
        self.stats
    }

    pub(crate) fn set_stats(&mut self, stats: MeshStats) {
        self.stats = stats;
    }

    /// Resets the node grid to cover `cells` plus one node on every side.
    /// Every node starts unplaced at its cell centre with a zero normal.
    pub(crate) fn reset_nodes(&mut self, cells: VoxelBox) {
        self.faces.clear();
        self.vertices.clear();
        self.stats = MeshStats::default();
        self.origin = cells.min - IVec3::splat(1);
        self.node_extent = if cells.is_empty() {
            IVec3::ZERO
        } else {
            cells.extent() + IVec3::splat(2)
        };
        let e = self.node_extent;
        debug_assert!(e.x as usize <= self.chunk_size + 2);
        debug_assert!(e.y as usize <= self.chunk_size + 2);
        debug_assert!(e.z as usize <= self.chunk_size + 2);
        let mut i = 0;
        for lx in 0..e.x {
            for ly in 0..e.y {
                for lz in 0..e.z {
                    let cell = self.origin + IVec3::new(lx, ly, lz);
                    self.nodes[i] = MeshNode {
                        position: Vec3::from(cell) + Vec3::splat(0.5),
                        normal: Vec3::ZERO,
                        placed: false,
                    };
                    i += 1;
                }
            }
        }
    }

    /// Clears output buffers for a pass that emits vertices directly.
    pub(crate) fn reset_points(&mut self) {
        self.faces.clear();
        self.vertices.clear();
        self.stats = MeshStats::default();
        self.node_extent = IVec3::ZERO;
    }

    #[inline]
    pub(crate) fn node_index(&self, cell: IVec3) -> usize {
        let l = cell - self.origin;
        debug_assert!(
            l.x >= 0
                && l.y >= 0
                && l.z >= 0
                && l.x < self.node_extent.x
                && l.y < self.node_extent.y
                && l.z < self.node_extent.z,
            "cell {cell:?} outside node grid"
        );
        ((l.x as usize * self.node_extent.y as usize) + l.y as usize) * self.node_extent.z as usize
            + l.z as usize
    }

    #[inline]
    pub fn node(&self, index: usize) -> &MeshNode {
        &self.nodes[index]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, index: usize) -> &mut MeshNode {
        &mut self.nodes[index]
    }

    #[inline]
    pub(crate) fn push_face(&mut self, a: usize, b: usize, c: usize) {
        debug_assert!(self.faces.len() < self.faces.capacity());
        self.faces.push([a as u32, b as u32, c as u32]);
    }

    #[inline]
    pub(crate) fn push_vertex(&mut self, v: MeshVertex) {
        debug_assert!(self.vertices.len() < self.vertices.capacity());
        self.vertices.push(v);
    }

    /// Expands the face list into the interleaved vertex buffer.
    pub(crate) fn expand_faces(&mut self) {
        self.vertices.clear();
        for face in &self.faces {
            for &n in face {
                let node = &self.nodes[n as usize];
                self.vertices.push(MeshVertex::new(node.position, node.normal));
            }
        }
    }
}
