/// Sampler - Vulkan sampler created from a SamplerDesc

use ash::vk;
use std::sync::Arc;

use galaxy_3d_gpu::galaxy3d::{Error, Result};
use galaxy_3d_gpu::galaxy3d::gpu::{AddressMode, SamplerDesc};
use galaxy_3d_gpu::engine_error;

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert;

pub struct VulkanSampler {
    ctx: Arc<GpuContext>,
    pub(crate) sampler: vk::Sampler,
    desc: SamplerDesc,
}

impl VulkanSampler {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &SamplerDesc) -> Result<Self> {
        let address = vulkan_convert::address_mode_to_vk(desc.address_mode);
        let border = if desc.address_mode == AddressMode::ClampToBorder {
            vk::BorderColor::FLOAT_OPAQUE_WHITE
        } else {
            vk::BorderColor::FLOAT_OPAQUE_BLACK
        };
        let max_lod = if desc.max_lod >= vk::LOD_CLAMP_NONE { vk::LOD_CLAMP_NONE } else { desc.max_lod };

        let mut create_info = vk::SamplerCreateInfo::default()
            .mag_filter(vulkan_convert::filter_to_vk(desc.mag_filter))
            .min_filter(vulkan_convert::filter_to_vk(desc.min_filter))
            .mipmap_mode(vulkan_convert::mipmap_mode_to_vk(desc.mipmap_filter))
            .address_mode_u(address)
            .address_mode_v(address)
            .address_mode_w(address)
            .mip_lod_bias(0.0)
            .min_lod(desc.min_lod)
            .max_lod(max_lod)
            .border_color(border)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .unnormalized_coordinates(false);

        create_info = match desc.anisotropy {
            Some(max_anisotropy) => create_info.anisotropy_enable(true).max_anisotropy(max_anisotropy),
            None => create_info.anisotropy_enable(false).max_anisotropy(1.0),
        };

        let sampler = unsafe {
            ctx.device.create_sampler(&create_info, None).map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create sampler {:?}: {:?}", desc, e);
                Error::ResourceCreationFailure(format!("sampler: {:?}", e))
            })?
        };

        Ok(Self { ctx, sampler, desc: *desc })
    }

    pub fn desc(&self) -> &SamplerDesc {
        &self.desc
    }
}

impl Drop for VulkanSampler {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_sampler(self.sampler, None);
        }
    }
}
