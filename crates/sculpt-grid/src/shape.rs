use sculpt_geom::{IVec3, VoxelBox};

use crate::Voxel;

/// Pure mapping from voxel coordinates to labels inside a declared box.
///
/// `value_for_voxel` returns `None` for "no change"; such voxels are neither
/// written nor marked dirty.
pub trait ShapeGenerator: Sync {
    fn center(&self) -> IVec3;

    fn size(&self) -> IVec3;

    fn value_for_voxel(&self, x: i32, y: i32, z: i32) -> Option<Voxel>;

    /// `center ± size/2`, inclusive.
    fn bounds(&self) -> VoxelBox {
        VoxelBox::around(self.center(), self.size())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereGenerator {
    pub value: Voxel,
    pub center: IVec3,
    pub radius: f32,
}

impl SphereGenerator {
    pub const fn new(value: Voxel, center: IVec3, radius: f32) -> Self {
        Self {
            value,
            center,
            radius,
        }
    }
}

impl ShapeGenerator for SphereGenerator {
    fn center(&self) -> IVec3 {
        self.center
    }

    fn size(&self) -> IVec3 {
        IVec3::splat((self.radius.max(0.0) as i32).saturating_mul(2))
    }

    fn value_for_voxel(&self, x: i32, y: i32, z: i32) -> Option<Voxel> {
        let dx = (x - self.center.x) as f32;
        let dy = (y - self.center.y) as f32;
        let dz = (z - self.center.z) as f32;
        if dx * dx + dy * dy + dz * dz < self.radius * self.radius {
            Some(self.value)
        } else {
            None
        }
    }
}

/// Axis-aligned cube; a voxel is inside when `|d| < half_extent` on all axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CubeGenerator {
    pub value: Voxel,
    pub center: IVec3,
    pub half_extent: i32,
}

impl CubeGenerator {
    pub const fn new(value: Voxel, center: IVec3, half_extent: i32) -> Self {
        Self {
            value,
            center,
            half_extent,
        }
    }
}

impl ShapeGenerator for CubeGenerator {
    fn center(&self) -> IVec3 {
        self.center
    }

    fn size(&self) -> IVec3 {
        IVec3::splat(self.half_extent.max(0).saturating_mul(2))
    }

    fn value_for_voxel(&self, x: i32, y: i32, z: i32) -> Option<Voxel> {
        let h = self.half_extent;
        let inside = (x - self.center.x).abs() < h
            && (y - self.center.y).abs() < h
            && (z - self.center.z).abs() < h;
        inside.then_some(self.value)
    }
}
