//! Interleaved vertex layout shared with GPU consumers.

use bytemuck::{Pod, Zeroable};
use sculpt_geom::Vec3;

/// `[px, py, pz, nx, ny, nz]` as `f32`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

pub const VERTEX_STRIDE: usize = std::mem::size_of::<MeshVertex>();
pub const POSITION_OFFSET: usize = 0;
pub const NORMAL_OFFSET: usize = 12;

const _: () = assert!(VERTEX_STRIDE == 24);

impl MeshVertex {
    #[inline]
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.position[0], self.position[1], self.position[2])
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        Vec3::new(self.normal[0], self.normal[1], self.normal[2])
    }
}
