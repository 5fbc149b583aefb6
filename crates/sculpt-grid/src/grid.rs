use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use rayon::prelude::*;
use sculpt_geom::{IVec3, VoxelBox};

use crate::{RenderStrategy, ShapeGenerator, Voxel};

const NO_STRATEGY: usize = usize::MAX;

/// Dense `width × height × depth` occupancy grid.
///
/// Voxels are stored as relaxed atomics: readers running concurrently with
/// an edit may observe a mix of old and new labels, which the mesh pipeline
/// tolerates by re-tessellating any chunk touched by a later write.
pub struct VoxelGrid {
    dims: IVec3,
    cells: Box<[AtomicU8]>,
    solid: AtomicUsize,
    strategies: RwLock<Vec<Arc<dyn RenderStrategy>>>,
    active: AtomicUsize,
}

impl VoxelGrid {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        let len = width * height * depth;
        let cells = (0..len).map(|_| AtomicU8::new(Voxel::Air.to_raw())).collect();
        Self {
            dims: IVec3::new(width as i32, height as i32, depth as i32),
            cells,
            solid: AtomicUsize::new(0),
            strategies: RwLock::new(Vec::new()),
            active: AtomicUsize::new(NO_STRATEGY),
        }
    }

    pub fn cube(size: usize) -> Self {
        Self::new(size, size, size)
    }

    #[inline]
    pub fn dims(&self) -> IVec3 {
        self.dims
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.dims.x as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.dims.y as usize
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.dims.z as usize
    }

    #[inline]
    pub fn bounds(&self) -> VoxelBox {
        VoxelBox::from_dims(self.dims)
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0 && y >= 0 && z >= 0 && x < self.dims.x && y < self.dims.y && z < self.dims.z
    }

    #[inline]
    fn idx(&self, x: i32, y: i32, z: i32) -> usize {
        debug_assert!(self.contains(x, y, z), "voxel ({x},{y},{z}) out of bounds");
        ((x as usize * self.height()) + y as usize) * self.depth() + z as usize
    }

    /// Stored label. Coordinates must be in bounds.
    #[inline]
    pub fn get_voxel(&self, x: i32, y: i32, z: i32) -> Voxel {
        Voxel::from_raw(self.cells[self.idx(x, y, z)].load(Ordering::Relaxed))
    }

    /// Bounds-checked occupancy; everything outside the grid reads as air.
    #[inline]
    pub fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        self.contains(x, y, z) && self.get_voxel(x, y, z).is_solid()
    }

    /// Number of non-air voxels.
    pub fn solid_voxels(&self) -> usize {
        self.solid.load(Ordering::Relaxed)
    }

    fn store(&self, x: i32, y: i32, z: i32, value: Voxel) {
        let prev = Voxel::from_raw(self.cells[self.idx(x, y, z)].swap(value.to_raw(), Ordering::Relaxed));
        match (prev.is_solid(), value.is_solid()) {
            (false, true) => {
                self.solid.fetch_add(1, Ordering::Relaxed);
            }
            (true, false) => {
                self.solid.fetch_sub(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    /// Overwrites the voxel and notifies the active strategy.
    pub fn set_voxel(&self, x: i32, y: i32, z: i32, value: Voxel) {
        self.store(x, y, z, value);
        if let Some(strategy) = self.active_strategy() {
            strategy.mark_voxel_dirty(x, y, z);
        }
    }

    /// Applies `shape` to the part of its box that lies inside the grid.
    /// Returns the number of voxels written.
    pub fn insert_shape(&self, shape: &dyn ShapeGenerator) -> usize {
        let Some(region) = shape.bounds().intersect(&self.bounds()) else {
            return 0;
        };
        let strategy = self.active_strategy();
        let _batch = self.edit_batch();
        let written: usize = (region.min.x..region.max.x)
            .into_par_iter()
            .map(|x| {
                let mut n = 0usize;
                for y in region.min.y..region.max.y {
                    for z in region.min.z..region.max.z {
                        if let Some(value) = shape.value_for_voxel(x, y, z) {
                            self.store(x, y, z, value);
                            if let Some(s) = &strategy {
                                s.mark_voxel_dirty(x, y, z);
                            }
                            n += 1;
                        }
                    }
                }
                n
            })
            .sum();
        log::trace!(
            "insert_shape region={:?}..{:?} written={}",
            region.min,
            region.max,
            written
        );
        written
    }

    /// Sets every voxel to air.
    pub fn clear(&self) {
        let strategy = self.active_strategy();
        let _batch = self.edit_batch();
        let (h, d) = (self.dims.y, self.dims.z);
        (0..self.dims.x).into_par_iter().for_each(|x| {
            for y in 0..h {
                for z in 0..d {
                    self.store(x, y, z, Voxel::Air);
                    if let Some(s) = &strategy {
                        s.mark_voxel_dirty(x, y, z);
                    }
                }
            }
        });
    }

    /// Starts a batch on every registered strategy. Must be paired with
    /// [`VoxelGrid::end_editing`] on the same thread.
    pub fn begin_editing(&self) {
        for s in self.strategies_snapshot() {
            s.begin_voxel_marking();
        }
    }

    pub fn end_editing(&self) {
        for s in self.strategies_snapshot() {
            s.end_voxel_marking();
        }
    }

    /// Scoped batch: ends on drop.
    pub fn edit_batch(&self) -> EditBatch<'_> {
        self.begin_editing();
        EditBatch { grid: self }
    }

    /// Re-tessellates everything on the active strategy.
    pub fn refresh(&self) {
        if let Some(s) = self.active_strategy() {
            s.refresh();
        }
    }

    /// Registers a strategy and returns its index. The first registered
    /// strategy becomes active.
    pub fn register_strategy(&self, strategy: Arc<dyn RenderStrategy>) -> usize {
        let mut list = self
            .strategies
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        list.push(strategy);
        let index = list.len() - 1;
        let _ = self.active.compare_exchange(
            NO_STRATEGY,
            index,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        log::debug!("registered render strategy #{index}");
        index
    }

    /// Drops every registered strategy.
    pub fn clear_strategies(&self) {
        self.strategies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.active.store(NO_STRATEGY, Ordering::Release);
    }

    /// Makes `index` the strategy that receives voxel marks and refreshes it
    /// so its mesh reflects the current grid. Returns `false` for an unknown
    /// index.
    pub fn select_strategy(&self, index: usize) -> bool {
        let strategy = {
            let list = self
                .strategies
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match list.get(index) {
                Some(s) => s.clone(),
                None => return false,
            }
        };
        self.active.store(index, Ordering::Release);
        log::info!("render strategy -> {}", strategy.name());
        strategy.refresh();
        true
    }

    pub fn active_strategy_index(&self) -> Option<usize> {
        match self.active.load(Ordering::Acquire) {
            NO_STRATEGY => None,
            i => Some(i),
        }
    }

    pub fn active_strategy(&self) -> Option<Arc<dyn RenderStrategy>> {
        let index = self.active_strategy_index()?;
        self.strategies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    fn strategies_snapshot(&self) -> Vec<Arc<dyn RenderStrategy>> {
        self.strategies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Guard returned by [`VoxelGrid::edit_batch`].
pub struct EditBatch<'a> {
    grid: &'a VoxelGrid,
}

impl Drop for EditBatch<'_> {
    fn drop(&mut self) {
        self.grid.end_editing();
    }
}
