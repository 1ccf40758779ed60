/// Descriptor pools, set layouts, sets and descriptor writes

use ash::vk;
use std::sync::Arc;

use galaxy_3d_gpu::galaxy3d::{Error, Result};
use galaxy_3d_gpu::galaxy3d::gpu::{
    DescriptorPoolSize, DescriptorResource, DescriptorSetLayoutDesc, DescriptorSetLayoutFlags,
    DescriptorWrite, DeviceFeature, GraphicsDevice, PoolAllocError,
};
use galaxy_3d_gpu::{engine_debug, engine_err, engine_error, engine_warn};

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert;
use crate::vulkan_device::VulkanDevice;

// ===== POOL =====

pub struct VulkanDescriptorPool {
    ctx: Arc<GpuContext>,
    pub(crate) pool: vk::DescriptorPool,
}

impl VulkanDescriptorPool {
    pub(crate) fn new(ctx: Arc<GpuContext>, sizes: &[DescriptorPoolSize], max_sets: u32) -> Result<Self> {
        let pool_sizes: Vec<vk::DescriptorPoolSize> = sizes
            .iter()
            .filter(|size| size.count > 0)
            .map(|size| vk::DescriptorPoolSize {
                ty: vulkan_convert::descriptor_type_to_vk(size.ty),
                descriptor_count: size.count,
            })
            .collect();

        let create_info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(max_sets);

        let pool = unsafe {
            ctx.device.create_descriptor_pool(&create_info, None).map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create descriptor pool ({} sets): {:?}", max_sets, e);
                Error::ResourceCreationFailure(format!("descriptor pool of {} sets: {:?}", max_sets, e))
            })?
        };
        Ok(Self { ctx, pool })
    }

    pub(crate) fn allocate(&self, layout: &VulkanDescriptorSetLayout) -> std::result::Result<VulkanDescriptorSet, PoolAllocError> {
        let layouts = [layout.layout];
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(&layouts);

        match unsafe { self.ctx.device.allocate_descriptor_sets(&allocate_info) } {
            Ok(sets) => sets
                .first()
                .map(|&set| VulkanDescriptorSet { set })
                .ok_or_else(|| PoolAllocError::Other(engine_err!("galaxy3d::vulkan", "Driver returned no descriptor set"))),
            Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) => Err(PoolAllocError::OutOfPoolMemory),
            Err(vk::Result::ERROR_FRAGMENTED_POOL) => Err(PoolAllocError::FragmentedPool),
            Err(e) => Err(PoolAllocError::Other(engine_err!("galaxy3d::vulkan",
                "Failed to allocate descriptor set: {:?}", e))),
        }
    }

    pub(crate) fn reset(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .reset_descriptor_pool(self.pool, vk::DescriptorPoolResetFlags::empty())
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to reset descriptor pool: {:?}", e))
        }
    }
}

impl Drop for VulkanDescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

/// Set allocated from a pool, returned to it when the pool is reset
pub struct VulkanDescriptorSet {
    pub(crate) set: vk::DescriptorSet,
}

// ===== LAYOUT =====

pub struct VulkanDescriptorSetLayout {
    ctx: Arc<GpuContext>,
    pub(crate) layout: vk::DescriptorSetLayout,
}

impl VulkanDescriptorSetLayout {
    pub(crate) fn new(device: &VulkanDevice, desc: &DescriptorSetLayoutDesc) -> Result<Self> {
        let ctx = device.context().clone();
        let indexing = device.features().is_enabled(DeviceFeature::DescriptorIndexing);

        let mut layout_flags = vk::DescriptorSetLayoutCreateFlags::empty();
        if desc.flags.contains(DescriptorSetLayoutFlags::PUSH_DESCRIPTOR) {
            if !device.features().is_enabled(DeviceFeature::PushDescriptor) {
                engine_error!("galaxy3d::vulkan", "Push descriptor layout requested without VK_KHR_push_descriptor");
                return Err(Error::CapabilityUnsupported(DeviceFeature::PushDescriptor.extension_name().to_string()));
            }
            layout_flags |= vk::DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR_KHR;
        }

        let mut effective = desc.flags;
        if desc.flags.contains(DescriptorSetLayoutFlags::UPDATE_AFTER_BIND_POOL) {
            if indexing {
                layout_flags |= vk::DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL;
            } else {
                engine_warn!("galaxy3d::vulkan", "Update-after-bind layout without descriptor indexing, flag dropped");
                effective.remove(DescriptorSetLayoutFlags::UPDATE_AFTER_BIND_POOL);
            }
        }

        let bindings: Vec<vk::DescriptorSetLayoutBinding> = desc
            .bindings
            .values()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(vulkan_convert::descriptor_type_to_vk(b.ty))
                    .descriptor_count(b.count)
                    .stage_flags(vulkan_convert::shader_stages_to_vk(b.stages))
            })
            .collect();

        // Binding flags need descriptor indexing; arrays stay fully bound without it
        let binding_flags: Vec<vk::DescriptorBindingFlags> = desc
            .bindings
            .values()
            .map(|b| vk::DescriptorBindingFlags::from_raw(b.flags(effective).bits()))
            .collect();
        let use_binding_flags = indexing && binding_flags.iter().any(|f| !f.is_empty());
        if !indexing && binding_flags.iter().any(|f| !f.is_empty()) {
            engine_debug!("galaxy3d::vulkan", "Binding flags ignored without descriptor indexing");
        }

        let mut flags_info = vk::DescriptorSetLayoutBindingFlagsCreateInfo::default().binding_flags(&binding_flags);
        let mut create_info = vk::DescriptorSetLayoutCreateInfo::default()
            .flags(layout_flags)
            .bindings(&bindings);
        if use_binding_flags {
            create_info = create_info.push_next(&mut flags_info);
        }

        let layout = unsafe {
            ctx.device.create_descriptor_set_layout(&create_info, None).map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create descriptor set layout: {:?}", e);
                Error::ResourceCreationFailure(format!("descriptor set layout: {:?}", e))
            })?
        };
        Ok(Self { ctx, layout })
    }
}

impl Drop for VulkanDescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

// ===== WRITES =====

enum WriteInfo {
    Buffer(vk::DescriptorBufferInfo),
    Image(vk::DescriptorImageInfo),
}

/// Build the Vulkan writes for `set` and hand them to `f`
///
/// Push descriptors use a null `set`.
pub(crate) fn with_vk_writes<R>(
    set: vk::DescriptorSet,
    writes: &[DescriptorWrite<VulkanDevice>],
    f: impl FnOnce(&[vk::WriteDescriptorSet<'_>]) -> R,
) -> R {
    let infos: Vec<WriteInfo> = writes
        .iter()
        .map(|write| match &write.resource {
            DescriptorResource::Buffer { buffer, offset, range } => WriteInfo::Buffer(vk::DescriptorBufferInfo {
                buffer: buffer.buffer,
                offset: *offset,
                range: *range,
            }),
            DescriptorResource::Image { image, sampler, layout } => WriteInfo::Image(vk::DescriptorImageInfo {
                sampler: sampler.as_ref().map(|s| s.sampler).unwrap_or_default(),
                image_view: image.view,
                image_layout: vulkan_convert::image_layout_to_vk(*layout),
            }),
        })
        .collect();

    let vk_writes: Vec<vk::WriteDescriptorSet<'_>> = writes
        .iter()
        .zip(&infos)
        .map(|(write, info)| {
            let base = vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(write.binding)
                .dst_array_element(write.array_element)
                .descriptor_type(vulkan_convert::descriptor_type_to_vk(write.ty));
            match info {
                WriteInfo::Buffer(buffer) => base.buffer_info(std::slice::from_ref(buffer)),
                WriteInfo::Image(image) => base.image_info(std::slice::from_ref(image)),
            }
        })
        .collect();

    f(&vk_writes)
}
