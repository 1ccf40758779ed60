/// Image - Vulkan implementation of GpuImage

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use galaxy_3d_gpu::galaxy3d::{Error, Result};
use galaxy_3d_gpu::galaxy3d::gpu::{
    derive_aspect, Format, GpuImage, ImageAspect, ImageDesc, ImageKind, ImageLayout, ImageUsage,
    TrackedLayout,
};
use galaxy_3d_gpu::{engine_err, engine_error};

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert;

/// Vulkan image with a view covering every mip level and layer
pub struct VulkanImage {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    /// None for surface-owned images
    allocation: Option<Allocation>,
    desc: ImageDesc,
    aspect: ImageAspect,
    layout: TrackedLayout,
    surface_owned: bool,
}

impl VulkanImage {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &ImageDesc) -> Result<Self> {
        desc.validate().map_err(|e| {
            engine_error!("galaxy3d::vulkan", "Invalid image descriptor: {}", e);
            e
        })?;

        let format = vulkan_convert::format_to_vk(desc.format);
        let flags = match desc.kind {
            ImageKind::Cube => vk::ImageCreateFlags::CUBE_COMPATIBLE,
            ImageKind::Tex2D => vk::ImageCreateFlags::empty(),
        };

        unsafe {
            let create_info = vk::ImageCreateInfo::default()
                .flags(flags)
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
                .mip_levels(desc.mip_levels)
                .array_layers(desc.array_layers)
                .samples(vulkan_convert::sample_count_to_vk(desc.samples))
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(vulkan_convert::image_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx.device.create_image(&create_info, None).map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create image '{}' ({}x{} {:?}, {:?}): {:?}",
                    desc.label, desc.width, desc.height, desc.format, desc.usage, e);
                Error::ResourceCreationFailure(format!(
                    "image '{}' ({}x{} {:?}, {:?}): {:?}",
                    desc.label, desc.width, desc.height, desc.format, desc.usage, e))
            })?;

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = ctx.allocator().and_then(|mut allocator| {
                allocator
                    .allocate(&AllocationCreateDesc {
                        name: &desc.label,
                        requirements,
                        location: MemoryLocation::GpuOnly,
                        linear: false,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|e| {
                        let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                        engine_error!("galaxy3d::vulkan",
                            "Out of GPU memory for image '{}' (required: {:.2} MB): {:?}", desc.label, size_mb, e);
                        Error::OutOfMemory
                    })
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            if let Err(e) = ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset()) {
                if let Ok(mut allocator) = ctx.allocator() {
                    allocator.free(allocation).ok();
                }
                ctx.device.destroy_image(image, None);
                return Err(engine_err!("galaxy3d::vulkan", "Failed to bind image memory: {:?}", e));
            }

            let aspect = derive_aspect(desc.usage);
            let view_type = match (desc.kind, desc.array_layers) {
                (ImageKind::Cube, 6) => vk::ImageViewType::CUBE,
                (ImageKind::Cube, _) => vk::ImageViewType::CUBE_ARRAY,
                (ImageKind::Tex2D, 1) => vk::ImageViewType::TYPE_2D,
                (ImageKind::Tex2D, _) => vk::ImageViewType::TYPE_2D_ARRAY,
            };
            let view = match create_view(&ctx.device, image, format, view_type, aspect, desc.mip_levels, desc.array_layers) {
                Ok(view) => view,
                Err(e) => {
                    if let Ok(mut allocator) = ctx.allocator() {
                        allocator.free(allocation).ok();
                    }
                    ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            Ok(Self {
                ctx,
                image,
                view,
                allocation: Some(allocation),
                desc: desc.clone(),
                aspect,
                layout: TrackedLayout::new(ImageLayout::Undefined),
                surface_owned: false,
            })
        }
    }

    /// Wrap an image owned by a surface chain: color aspect, one mip and one layer
    pub(crate) fn from_surface(
        ctx: Arc<GpuContext>,
        image: vk::Image,
        format: Format,
        width: u32,
        height: u32,
        index: usize,
    ) -> Result<Self> {
        let view = create_view(
            &ctx.device,
            image,
            vulkan_convert::format_to_vk(format),
            vk::ImageViewType::TYPE_2D,
            ImageAspect::COLOR,
            1,
            1,
        )?;

        Ok(Self {
            ctx,
            image,
            view,
            allocation: None,
            desc: ImageDesc::texture_2d(width, height, format, ImageUsage::COLOR_ATTACHMENT | ImageUsage::TRANSFER_DST)
                .with_label(format!("surface image {}", index)),
            aspect: ImageAspect::COLOR,
            layout: TrackedLayout::new(ImageLayout::Undefined),
            surface_owned: true,
        })
    }
}

fn create_view(
    device: &ash::Device,
    image: vk::Image,
    format: vk::Format,
    view_type: vk::ImageViewType,
    aspect: ImageAspect,
    level_count: u32,
    layer_count: u32,
) -> Result<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(view_type)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vulkan_convert::aspect_to_vk(aspect),
            base_mip_level: 0,
            level_count,
            base_array_layer: 0,
            layer_count,
        });

    unsafe {
        device.create_image_view(&create_info, None).map_err(|e| {
            engine_error!("galaxy3d::vulkan", "Failed to create image view: {:?}", e);
            Error::ResourceCreationFailure(format!("image view ({:?}): {:?}", format, e))
        })
    }
}

impl GpuImage for VulkanImage {
    fn desc(&self) -> &ImageDesc {
        &self.desc
    }

    fn aspect(&self) -> ImageAspect {
        self.aspect
    }

    fn layout(&self) -> ImageLayout {
        self.layout.get()
    }

    fn set_layout(&self, layout: ImageLayout) {
        self.layout.set(layout);
    }

    fn is_surface_owned(&self) -> bool {
        self.surface_owned
    }
}

impl Drop for VulkanImage {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);

            if self.surface_owned {
                return;
            }
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
