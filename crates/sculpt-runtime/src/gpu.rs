use std::thread;
use std::time::Duration;

use sculpt_mesh::{Topology, VERTEX_STRIDE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Render-thread consumer of finished chunk meshes.
///
/// Buffers hold interleaved `[px, py, pz, nx, ny, nz]` f32 vertices with a
/// 24-byte stride. Every call happens on the thread that drains the
/// pipeline.
pub trait GpuBackend {
    fn create_buffer(&mut self) -> BufferHandle;

    /// Replaces the contents of `handle`.
    fn upload(&mut self, handle: BufferHandle, bytes: &[u8], vertex_count: usize);

    fn draw(&mut self, handle: BufferHandle, topology: Topology, vertex_count: usize);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub handle: BufferHandle,
    pub topology: Topology,
    pub vertex_count: usize,
}

#[derive(Clone, Debug, Default)]
struct RecordedBuffer {
    bytes: Vec<u8>,
    vertex_count: usize,
}

/// Headless backend that keeps uploaded bytes and logs draw calls.
#[derive(Debug, Default)]
pub struct RecordingGpu {
    buffers: Vec<RecordedBuffer>,
    draws: Vec<DrawCall>,
    uploads: usize,
    upload_delay: Duration,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps for `delay` inside every upload, to stand in for a slow driver.
    pub fn with_upload_delay(delay: Duration) -> Self {
        Self {
            upload_delay: delay,
            ..Self::default()
        }
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_bytes(&self, handle: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(handle.0 as usize).map(|b| b.bytes.as_slice())
    }

    pub fn buffer_vertex_count(&self, handle: BufferHandle) -> Option<usize> {
        self.buffers.get(handle.0 as usize).map(|b| b.vertex_count)
    }

    pub fn uploads(&self) -> usize {
        self.uploads
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Clears and returns the draw calls issued since the last call.
    pub fn take_draws(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draws)
    }
}

impl GpuBackend for RecordingGpu {
    fn create_buffer(&mut self) -> BufferHandle {
        self.buffers.push(RecordedBuffer::default());
        BufferHandle((self.buffers.len() - 1) as u32)
    }

    fn upload(&mut self, handle: BufferHandle, bytes: &[u8], vertex_count: usize) {
        debug_assert_eq!(bytes.len(), vertex_count * VERTEX_STRIDE);
        if !self.upload_delay.is_zero() {
            thread::sleep(self.upload_delay);
        }
        let Some(buffer) = self.buffers.get_mut(handle.0 as usize) else {
            log::warn!("upload to unknown buffer {:?}", handle);
            return;
        };
        buffer.bytes.clear();
        buffer.bytes.extend_from_slice(bytes);
        buffer.vertex_count = vertex_count;
        self.uploads += 1;
    }

    fn draw(&mut self, handle: BufferHandle, topology: Topology, vertex_count: usize) {
        self.draws.push(DrawCall {
            handle,
            topology,
            vertex_count,
        });
    }
}
