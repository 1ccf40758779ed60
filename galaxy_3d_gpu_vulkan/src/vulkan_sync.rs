/// Fences and semaphores

use ash::vk;
use std::sync::Arc;

use galaxy_3d_gpu::galaxy3d::Result;
use galaxy_3d_gpu::engine_err;

use crate::vulkan_context::GpuContext;

pub struct VulkanFence {
    ctx: Arc<GpuContext>,
    pub(crate) fence: vk::Fence,
}

impl VulkanFence {
    pub(crate) fn new(ctx: Arc<GpuContext>, signaled: bool) -> Result<Self> {
        let flags = if signaled { vk::FenceCreateFlags::SIGNALED } else { vk::FenceCreateFlags::empty() };
        let fence = unsafe {
            ctx.device
                .create_fence(&vk::FenceCreateInfo::default().flags(flags), None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create fence: {:?}", e))?
        };
        Ok(Self { ctx, fence })
    }

    pub(crate) fn wait(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .wait_for_fences(&[self.fence], true, u64::MAX)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to wait for fence: {:?}", e))
        }
    }

    pub(crate) fn reset(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .reset_fences(&[self.fence])
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to reset fence: {:?}", e))
        }
    }
}

impl Drop for VulkanFence {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_fence(self.fence, None);
        }
    }
}

pub struct VulkanSemaphore {
    ctx: Arc<GpuContext>,
    pub(crate) semaphore: vk::Semaphore,
}

impl VulkanSemaphore {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let semaphore = unsafe {
            ctx.device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create semaphore: {:?}", e))?
        };
        Ok(Self { ctx, semaphore })
    }
}

impl Drop for VulkanSemaphore {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.semaphore, None);
        }
    }
}
