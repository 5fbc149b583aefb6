use sculpt_geom::{IVec3, VoxelBox};
use serde::{Deserialize, Serialize};

use crate::PipelineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<ChunkCoord> for (i32, i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy, value.cz)
    }
}

/// Dense index of a chunk within its partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub usize);

/// Splits a grid into power-of-two cubes. Chunks on the high faces of the
/// grid are clipped, so the chunk boxes tile the grid exactly.
#[derive(Clone, Debug)]
pub struct ChunkPartition {
    grid_dims: IVec3,
    chunk_size: i32,
    shift: u32,
    counts: IVec3,
}

impl ChunkPartition {
    pub fn new(grid_dims: IVec3, chunk_size: usize) -> Result<Self, PipelineError> {
        if !chunk_size.is_power_of_two() {
            return Err(PipelineError::ChunkSizeNotPowerOfTwo(chunk_size));
        }
        if grid_dims.x <= 0 || grid_dims.y <= 0 || grid_dims.z <= 0 {
            return Err(PipelineError::EmptyGrid);
        }
        let cs = chunk_size as i32;
        let counts = IVec3::new(
            (grid_dims.x + cs - 1) / cs,
            (grid_dims.y + cs - 1) / cs,
            (grid_dims.z + cs - 1) / cs,
        );
        Ok(Self {
            grid_dims,
            chunk_size: cs,
            shift: chunk_size.trailing_zeros(),
            counts,
        })
    }

    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size as usize
    }

    #[inline]
    pub fn counts(&self) -> IVec3 {
        self.counts
    }

    #[inline]
    pub fn grid_dims(&self) -> IVec3 {
        self.grid_dims
    }

    pub fn len(&self) -> usize {
        self.counts.x as usize * self.counts.y as usize * self.counts.z as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chunk containing voxel `(x, y, z)`; may lie outside the partition.
    #[inline]
    pub fn chunk_of(&self, x: i32, y: i32, z: i32) -> ChunkCoord {
        ChunkCoord::new(x >> self.shift, y >> self.shift, z >> self.shift)
    }

    #[inline]
    pub fn id(&self, c: ChunkCoord) -> Option<ChunkId> {
        let n = self.counts;
        if c.cx < 0 || c.cy < 0 || c.cz < 0 || c.cx >= n.x || c.cy >= n.y || c.cz >= n.z {
            return None;
        }
        Some(ChunkId(
            ((c.cx as usize * n.y as usize) + c.cy as usize) * n.z as usize + c.cz as usize,
        ))
    }

    #[inline]
    pub fn coord(&self, id: ChunkId) -> ChunkCoord {
        let (ny, nz) = (self.counts.y as usize, self.counts.z as usize);
        let cz = id.0 % nz;
        let cy = (id.0 / nz) % ny;
        let cx = id.0 / (nz * ny);
        ChunkCoord::new(cx as i32, cy as i32, cz as i32)
    }

    /// Voxels owned by the chunk, `[c*size, min((c+1)*size, dim))`.
    pub fn bounds(&self, id: ChunkId) -> VoxelBox {
        let c = self.coord(id);
        let min = IVec3::new(c.cx, c.cy, c.cz) * self.chunk_size;
        VoxelBox::new(min, (min + IVec3::splat(self.chunk_size)).min(self.grid_dims))
    }

    pub fn ids(&self) -> impl Iterator<Item = ChunkId> + use<> {
        (0..self.len()).map(ChunkId)
    }

    /// Calls `f` for the owner of `(x, y, z)` and, when the voxel lies
    /// within `margin` of a chunk face, for the chunks across that face
    /// (edges and corners included). Voxels outside the grid are ignored.
    pub fn for_each_affected(&self, x: i32, y: i32, z: i32, margin: u32, mut f: impl FnMut(ChunkId)) {
        let d = self.grid_dims;
        if x < 0 || y < 0 || z < 0 || x >= d.x || y >= d.y || z >= d.z {
            return;
        }
        let owner = self.chunk_of(x, y, z);
        if margin == 0 {
            if let Some(id) = self.id(owner) {
                f(id);
            }
            return;
        }
        let m = margin as i32;
        let cs = self.chunk_size;
        let span = |local: i32| {
            let lo = if local < m { -1 } else { 0 };
            let hi = if local >= cs - m { 1 } else { 0 };
            lo..=hi
        };
        let mask = cs - 1;
        for dx in span(x & mask) {
            for dy in span(y & mask) {
                for dz in span(z & mask) {
                    if let Some(id) = self.id(owner.offset(dx, dy, dz)) {
                        f(id);
                    }
                }
            }
        }
    }
}
