//! Voxel occupancy grid, shape generators and the render-strategy seam.
#![forbid(unsafe_code)]

mod grid;
mod shape;
mod strategy;
mod voxel;

pub use grid::{EditBatch, VoxelGrid};
pub use shape::{CubeGenerator, ShapeGenerator, SphereGenerator};
pub use strategy::RenderStrategy;
pub use voxel::Voxel;
