/// ArenaRegion - one growable device-local buffer with an append cursor
///
/// Uploads go through a host-visible staging buffer recorded on the caller's
/// recorder. When an upload does not fit, the region grows by its multiplier
/// until it does and relocates:
///
/// ```text
/// old ──copy [0, used)──> staging <── new bytes written by the CPU at `used`
///                           │
///                        barrier
///                           │
/// new <──copy [0, end)──────┘      old and staging retired on the recorder
/// ```
///
/// Bytes already written keep their offsets, so element offsets handed out
/// earlier stay valid.

use std::sync::Arc;
use crate::command::CommandRecorder;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{AccessFlags, BufferUsage, GraphicsDevice, PipelineStages};
use crate::memory::{BufferDesc, GpuBuffer};
use crate::{engine_debug, engine_fail};

pub struct ArenaRegion<D: GraphicsDevice> {
    buffer: Arc<D::Buffer>,
    /// Bytes in use, always a whole number of elements
    write_offset: u64,
    element_size: u64,
    growth: f64,
    usage: BufferUsage,
    label: String,
    growth_count: u64,
}

impl<D: GraphicsDevice> ArenaRegion<D> {
    pub fn new(
        context: &GraphicsContext<D>,
        label: impl Into<String>,
        usage: BufferUsage,
        element_size: u64,
        initial_count: u64,
        growth: f64,
    ) -> Result<Self> {
        let label = label.into();
        if element_size == 0 || growth <= 1.0 || !growth.is_finite() {
            return Err(engine_fail!(InvalidResource, "galaxy3d::gpu::ArenaRegion",
                "Region '{}' needs a non-zero element size and a growth factor above 1 (got {}, {})",
                label, element_size, growth));
        }
        let usage = usage | BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST;
        let buffer = context.create_buffer(&BufferDesc::device_local(
            initial_count.max(1) * element_size,
            usage,
            label.clone(),
        ))?;
        Ok(Self { buffer, write_offset: 0, element_size, growth, usage, label, growth_count: 0 })
    }

    pub fn buffer(&self) -> &Arc<D::Buffer> {
        &self.buffer
    }

    /// Backing buffer size in bytes
    pub fn capacity(&self) -> u64 {
        self.buffer.size()
    }

    /// Bytes in use
    pub fn used(&self) -> u64 {
        self.write_offset
    }

    /// Elements in use
    pub fn len(&self) -> u64 {
        self.write_offset / self.element_size
    }

    pub fn is_empty(&self) -> bool {
        self.write_offset == 0
    }

    pub fn growth_count(&self) -> u64 {
        self.growth_count
    }

    /// Smallest size reached by repeated growth from `capacity` that holds `required` bytes
    pub fn grown_size(&self, required: u64) -> u64 {
        let mut size = self.capacity().max(self.element_size);
        while size < required {
            size = (size as f64 * self.growth).ceil() as u64;
        }
        size.div_ceil(self.element_size) * self.element_size
    }

    /// Append `bytes`, returning the element offset they were written at
    ///
    /// Empty uploads record nothing and return the current offset.
    pub fn upload(
        &mut self,
        context: &GraphicsContext<D>,
        recorder: &mut CommandRecorder<D>,
        bytes: &[u8],
    ) -> Result<u64> {
        let offset = self.write_offset;
        if bytes.is_empty() {
            return Ok(offset / self.element_size);
        }
        let len = bytes.len() as u64;
        if len % self.element_size != 0 {
            return Err(engine_fail!(InvalidResource, "galaxy3d::gpu::ArenaRegion",
                "{} bytes is not a whole number of {}-byte elements in '{}'", len, self.element_size, self.label));
        }
        let end = offset + len;

        if end > self.capacity() {
            self.grow_with(context, recorder, bytes, end)?;
        } else {
            let staging = context.create_buffer(&BufferDesc::host(
                len,
                BufferUsage::TRANSFER_SRC,
                format!("{} staging", self.label),
            ))?;
            staging.write(0, bytes)?;
            recorder.copy_buffer_to_buffer(&staging, &self.buffer, len, 0, offset)?;
            recorder.destroy_buffer_after_execution(staging);
        }

        recorder.synchronize_buffer_usage(
            &self.buffer,
            PipelineStages::TRANSFER,
            PipelineStages::VERTEX_INPUT | PipelineStages::TRANSFER,
            AccessFlags::TRANSFER_WRITE,
            AccessFlags::VERTEX_ATTRIBUTE_READ | AccessFlags::INDEX_READ | AccessFlags::TRANSFER_READ,
        )?;
        self.write_offset = end;
        Ok(offset / self.element_size)
    }

    fn grow_with(
        &mut self,
        context: &GraphicsContext<D>,
        recorder: &mut CommandRecorder<D>,
        bytes: &[u8],
        end: u64,
    ) -> Result<()> {
        let new_size = self.grown_size(end);
        let offset = self.write_offset;

        let staging = context.create_buffer(&BufferDesc::host(
            new_size,
            BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST,
            format!("{} staging", self.label),
        ))?;
        if offset > 0 {
            recorder.copy_buffer_to_buffer(&self.buffer, &staging, offset, 0, 0)?;
        }
        staging.write(offset, bytes)?;
        recorder.synchronize_buffer_usage(
            &staging,
            PipelineStages::TRANSFER,
            PipelineStages::TRANSFER,
            AccessFlags::TRANSFER_WRITE,
            AccessFlags::TRANSFER_READ,
        )?;

        let grown = context.create_buffer(&BufferDesc::device_local(new_size, self.usage, self.label.clone()))?;
        recorder.copy_buffer_to_buffer(&staging, &grown, end, 0, 0)?;

        let old = std::mem::replace(&mut self.buffer, grown);
        recorder.destroy_buffer_after_execution(old);
        recorder.destroy_buffer_after_execution(staging);
        self.growth_count += 1;

        engine_debug!("galaxy3d::gpu::ArenaRegion", "'{}' grew to {} bytes ({} in use)",
            self.label, new_size, end);
        Ok(())
    }
}
