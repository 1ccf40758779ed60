/// Swapchain - Vulkan implementation of SurfaceChain

use ash::vk;
use glam::UVec2;
use std::sync::Arc;

use galaxy_3d_gpu::galaxy3d::{Error, Result};
use galaxy_3d_gpu::galaxy3d::gpu::{AcquireOutcome, PresentOutcome, SurfaceChain, SurfaceFormat, SwapchainDesc};
use galaxy_3d_gpu::{engine_debug, engine_err, engine_error};

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert;
use crate::vulkan_device::VulkanDevice;
use crate::vulkan_image::VulkanImage;
use crate::vulkan_sync::VulkanSemaphore;

pub struct VulkanSwapchain {
    ctx: Arc<GpuContext>,
    pub(crate) swapchain: vk::SwapchainKHR,
    images: Vec<Arc<VulkanImage>>,
    format: SurfaceFormat,
    extent: UVec2,
}

impl VulkanSwapchain {
    /// Create the chain, retiring `old` (its handle stays valid until the caller drops it)
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &SwapchainDesc, old: Option<&VulkanSwapchain>) -> Result<Self> {
        let families = ctx.queue_families();
        let (sharing_mode, family_indices): (vk::SharingMode, &[u32]) = if families.len() > 1 {
            (vk::SharingMode::CONCURRENT, families.as_slice())
        } else {
            (vk::SharingMode::EXCLUSIVE, &[])
        };

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(ctx.surface)
            .min_image_count(desc.image_count)
            .image_format(vulkan_convert::format_to_vk(desc.format.format))
            .image_color_space(vulkan_convert::color_space_to_vk(desc.format.color_space))
            .image_extent(vk::Extent2D { width: desc.extent.x, height: desc.extent.y })
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(family_indices)
            .pre_transform(vk::SurfaceTransformFlagsKHR::IDENTITY)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(vulkan_convert::present_mode_to_vk(desc.present_mode))
            .clipped(true)
            .old_swapchain(old.map(|o| o.swapchain).unwrap_or_default());

        let swapchain = unsafe {
            ctx.swapchain_loader.create_swapchain(&create_info, None).map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create swapchain {}x{}: {:?}",
                    desc.extent.x, desc.extent.y, e);
                Error::InitializationFailed(format!("swapchain: {:?}", e))
            })?
        };

        let vk_images = match unsafe { ctx.swapchain_loader.get_swapchain_images(swapchain) } {
            Ok(images) => images,
            Err(e) => {
                unsafe { ctx.swapchain_loader.destroy_swapchain(swapchain, None) };
                return Err(engine_err!("galaxy3d::vulkan", "Failed to get swapchain images: {:?}", e));
            }
        };

        let mut images = Vec::with_capacity(vk_images.len());
        for (index, &image) in vk_images.iter().enumerate() {
            match VulkanImage::from_surface(ctx.clone(), image, desc.format.format, desc.extent.x, desc.extent.y, index) {
                Ok(image) => images.push(Arc::new(image)),
                Err(e) => {
                    images.clear();
                    unsafe { ctx.swapchain_loader.destroy_swapchain(swapchain, None) };
                    return Err(e);
                }
            }
        }

        engine_debug!("galaxy3d::vulkan", "Swapchain created: {}x{}, {} images, {:?}",
            desc.extent.x, desc.extent.y, images.len(), desc.present_mode);

        Ok(Self {
            ctx,
            swapchain,
            images,
            format: desc.format,
            extent: desc.extent,
        })
    }
}

impl SurfaceChain<VulkanDevice> for VulkanSwapchain {
    fn images(&self) -> &[Arc<VulkanImage>] {
        &self.images
    }

    fn format(&self) -> SurfaceFormat {
        self.format
    }

    fn extent(&self) -> UVec2 {
        self.extent
    }

    fn acquire_next_image(&self, signal: &VulkanSemaphore) -> Result<AcquireOutcome> {
        let result = unsafe {
            self.ctx.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                signal.semaphore,
                vk::Fence::null(),
            )
        };
        match result {
            // A suboptimal image is still usable this frame
            Ok((index, _suboptimal)) => Ok(AcquireOutcome::Image(index)),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::Stale),
            Err(e) => Err(engine_err!("galaxy3d::vulkan", "Failed to acquire swapchain image: {:?}", e)),
        }
    }

    fn present(&self, image_index: u32, wait: &VulkanSemaphore) -> Result<PresentOutcome> {
        let wait_semaphores = [wait.semaphore];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let _queue = self.ctx.lock_queue()?;
        let result = unsafe { self.ctx.swapchain_loader.queue_present(self.ctx.present_queue, &present_info) };
        match result {
            Ok(false) => Ok(PresentOutcome::Presented),
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::Stale),
            Err(e) => Err(engine_err!("galaxy3d::vulkan", "Failed to present swapchain image: {:?}", e)),
        }
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        // Views first, the swapchain owns the images
        self.images.clear();
        unsafe {
            self.ctx.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}
