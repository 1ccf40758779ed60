/// Buffer - Vulkan implementation of GpuBuffer

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation as AllocatorLocation;
use std::sync::Arc;

use galaxy_3d_gpu::galaxy3d::{Error, Result};
use galaxy_3d_gpu::galaxy3d::gpu::{BufferDesc, GpuBuffer, MemoryLocation};
use galaxy_3d_gpu::{engine_err, engine_error};

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert;

/// Vulkan buffer and its allocation
///
/// Host-visible buffers use coherent memory mapped for the buffer's lifetime.
pub struct VulkanBuffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    desc: BufferDesc,
}

impl VulkanBuffer {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &BufferDesc) -> Result<Self> {
        if desc.size == 0 {
            engine_error!("galaxy3d::vulkan", "Buffer '{}' requested with size 0", desc.label);
            return Err(Error::ResourceCreationFailure(format!("buffer '{}' has size 0", desc.label)));
        }

        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(vulkan_convert::buffer_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx.device.create_buffer(&create_info, None).map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create buffer '{}' ({} bytes, {:?}): {:?}",
                    desc.label, desc.size, desc.usage, e);
                Error::ResourceCreationFailure(format!(
                    "buffer '{}' ({} bytes, {:?}): {:?}", desc.label, desc.size, desc.usage, e))
            })?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let location = match desc.location {
                MemoryLocation::HostVisible => AllocatorLocation::CpuToGpu,
                MemoryLocation::DeviceLocal => AllocatorLocation::GpuOnly,
            };

            let allocation = ctx.allocator().and_then(|mut allocator| {
                allocator
                    .allocate(&AllocationCreateDesc {
                        name: &desc.label,
                        requirements,
                        location,
                        linear: true,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|e| {
                        let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                        engine_error!("galaxy3d::vulkan",
                            "Out of GPU memory for buffer '{}' (required: {:.2} MB): {:?}", desc.label, size_mb, e);
                        Error::OutOfMemory
                    })
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            let mut vk_buffer = Self { ctx, buffer, allocation: Some(allocation), desc: desc.clone() };
            vk_buffer
                .ctx
                .device
                .bind_buffer_memory(buffer, vk_buffer.memory()?, vk_buffer.memory_offset()?)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to bind buffer memory: {:?}", e))?;

            if desc.location == MemoryLocation::HostVisible {
                if let Some(slice) = vk_buffer.allocation.as_mut().and_then(|a| a.mapped_slice_mut()) {
                    slice.fill(0);
                }
            }

            Ok(vk_buffer)
        }
    }

    fn memory(&self) -> Result<vk::DeviceMemory> {
        self.allocation
            .as_ref()
            .map(|a| unsafe { a.memory() })
            .ok_or_else(|| engine_err!("galaxy3d::vulkan", "Buffer '{}' has no allocation", self.desc.label))
    }

    fn memory_offset(&self) -> Result<u64> {
        self.allocation
            .as_ref()
            .map(|a| a.offset())
            .ok_or_else(|| engine_err!("galaxy3d::vulkan", "Buffer '{}' has no allocation", self.desc.label))
    }

    /// Mapped pointer and a range check for `[offset, offset + len)`
    fn mapped_range(&self, offset: u64, len: u64) -> Result<*mut u8> {
        if offset.checked_add(len).map_or(true, |end| end > self.desc.size) {
            engine_error!("galaxy3d::vulkan", "Range {}+{} outside buffer '{}' ({} bytes)",
                offset, len, self.desc.label, self.desc.size);
            return Err(Error::InvalidResource(format!(
                "range {}+{} outside buffer '{}'", offset, len, self.desc.label)));
        }

        let ptr = self
            .allocation
            .as_ref()
            .and_then(|a| a.mapped_ptr())
            .ok_or_else(|| {
                engine_error!("galaxy3d::vulkan", "Buffer '{}' is not CPU-accessible", self.desc.label);
                Error::InvalidResource(format!("buffer '{}' is not host-visible", self.desc.label))
            })?;

        Ok(unsafe { (ptr.as_ptr() as *mut u8).add(offset as usize) })
    }
}

impl GpuBuffer for VulkanBuffer {
    fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    fn write_mapped(&self, offset: u64, data: &[u8]) -> Result<()> {
        let dst = self.mapped_range(offset, data.len() as u64)?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }
        Ok(())
    }

    fn read_mapped(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let src = self.mapped_range(offset, len)?;
        let mut out = vec![0u8; len as usize];
        unsafe {
            std::ptr::copy_nonoverlapping(src as *const u8, out.as_mut_ptr(), out.len());
        }
        Ok(out)
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                // The buffer is destroyed even if the allocator is unavailable
                if let Ok(mut allocator) = self.ctx.allocator() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
