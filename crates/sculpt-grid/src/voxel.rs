/// Stored voxel label. "No change" only exists as a generator output
/// (`None` from [`crate::ShapeGenerator::value_for_voxel`]).
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Voxel {
    #[default]
    Air = 0,
    Clay = 1,
}

impl Voxel {
    #[inline]
    pub const fn is_solid(self) -> bool {
        matches!(self, Voxel::Clay)
    }

    #[inline]
    pub const fn to_raw(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Voxel::Air,
            _ => Voxel::Clay,
        }
    }
}
