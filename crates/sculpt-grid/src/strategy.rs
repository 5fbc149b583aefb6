/// A consumer of voxel writes that keeps some derived representation
/// (typically a chunked mesh) in sync with the grid.
///
/// The grid forwards every write to the active strategy and brackets
/// batches on all registered strategies.
pub trait RenderStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Called after the voxel at `(x, y, z)` was written.
    fn mark_voxel_dirty(&self, x: i32, y: i32, z: i32);

    fn begin_voxel_marking(&self);

    /// Flushes marks collected since the matching `begin_voxel_marking`.
    fn end_voxel_marking(&self);

    /// Marks the whole grid dirty.
    fn refresh(&self);
}
