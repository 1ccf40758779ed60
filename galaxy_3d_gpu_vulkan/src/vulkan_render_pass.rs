/// Render passes and framebuffers

use ash::vk;
use glam::UVec2;
use std::sync::Arc;

use galaxy_3d_gpu::galaxy3d::{Error, Result};
use galaxy_3d_gpu::galaxy3d::gpu::{AttachmentDesc, ImageLayout, RenderPassDesc};
use galaxy_3d_gpu::engine_error;

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert;
use crate::vulkan_image::VulkanImage;

/// Single-subpass render pass
pub struct VulkanRenderPass {
    ctx: Arc<GpuContext>,
    pub(crate) render_pass: vk::RenderPass,
    /// Number of color attachments, one blend state each in pipelines built against this pass
    pub(crate) color_count: u32,
}

fn attachment_to_vk(attachment: &AttachmentDesc) -> vk::AttachmentDescription {
    vk::AttachmentDescription::default()
        .format(vulkan_convert::format_to_vk(attachment.format))
        .samples(vulkan_convert::sample_count_to_vk(attachment.samples))
        .load_op(vulkan_convert::load_op_to_vk(attachment.load_op))
        .store_op(vulkan_convert::store_op_to_vk(attachment.store_op))
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vulkan_convert::image_layout_to_vk(attachment.initial_layout))
        .final_layout(vulkan_convert::image_layout_to_vk(attachment.final_layout))
}

impl VulkanRenderPass {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &RenderPassDesc) -> Result<Self> {
        let mut attachments: Vec<vk::AttachmentDescription> =
            desc.color_attachments.iter().map(attachment_to_vk).collect();

        let color_refs: Vec<vk::AttachmentReference> = (0..desc.color_attachments.len() as u32)
            .map(|attachment| vk::AttachmentReference {
                attachment,
                layout: vulkan_convert::image_layout_to_vk(ImageLayout::ColorAttachment),
            })
            .collect();

        let depth_ref = desc.depth_attachment.as_ref().map(|depth| {
            attachments.push(attachment_to_vk(depth));
            vk::AttachmentReference {
                attachment: desc.color_attachments.len() as u32,
                layout: vulkan_convert::image_layout_to_vk(ImageLayout::DepthStencilAttachment),
            }
        });

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if let Some(depth_ref) = depth_ref.as_ref() {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }

        // Attachment writes wait for the previous use of the surface image
        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            )
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            )
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            );

        let subpasses = [subpass];
        let dependencies = [dependency];
        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe {
            ctx.device.create_render_pass(&create_info, None).map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create render pass ({} color attachments): {:?}",
                    desc.color_attachments.len(), e);
                Error::ResourceCreationFailure(format!("render pass: {:?}", e))
            })?
        };

        Ok(Self {
            ctx,
            render_pass,
            color_count: desc.color_attachments.len() as u32,
        })
    }
}

impl Drop for VulkanRenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

pub struct VulkanFramebuffer {
    ctx: Arc<GpuContext>,
    pub(crate) framebuffer: vk::Framebuffer,
}

impl VulkanFramebuffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        render_pass: &VulkanRenderPass,
        attachments: &[&VulkanImage],
        extent: UVec2,
    ) -> Result<Self> {
        let views: Vec<vk::ImageView> = attachments.iter().map(|image| image.view).collect();
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.render_pass)
            .attachments(&views)
            .width(extent.x)
            .height(extent.y)
            .layers(1);

        let framebuffer = unsafe {
            ctx.device.create_framebuffer(&create_info, None).map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create framebuffer {}x{}: {:?}", extent.x, extent.y, e);
                Error::ResourceCreationFailure(format!("framebuffer {}x{}: {:?}", extent.x, extent.y, e))
            })?
        };
        Ok(Self { ctx, framebuffer })
    }
}

impl Drop for VulkanFramebuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
