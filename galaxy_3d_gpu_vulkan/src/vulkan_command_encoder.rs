/// Command encoder - Vulkan implementation of CommandEncoder
///
/// Each encoder owns its command pool and a single primary command buffer
/// that is reset and re-recorded every frame.

use ash::vk;
use glam::UVec2;
use std::sync::Arc;

use galaxy_3d_gpu::galaxy3d::Result;
use galaxy_3d_gpu::galaxy3d::gpu::{
    BufferBarrier, BufferCopy, BufferImageCopy, ClearValue, CommandEncoder, DescriptorWrite,
    ImageBarrier, ImageBlit, ImageLayout, IndexType, PipelineBindPoint, Rect2D, ShaderStages, Viewport,
};
use galaxy_3d_gpu::{engine_err, engine_warn};

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_convert;
use crate::vulkan_descriptor::{self, VulkanDescriptorSet};
use crate::vulkan_device::VulkanDevice;
use crate::vulkan_image::VulkanImage;
use crate::vulkan_pipeline::{VulkanPipeline, VulkanPipelineLayout};
use crate::vulkan_render_pass::{VulkanFramebuffer, VulkanRenderPass};

pub struct VulkanEncoder {
    ctx: Arc<GpuContext>,
    pool: vk::CommandPool,
    pub(crate) buffer: vk::CommandBuffer,
}

impl VulkanEncoder {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let pool = ctx
                .device
                .create_command_pool(&pool_info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create command pool: {:?}", e))?;

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let buffer = match ctx.device.allocate_command_buffers(&allocate_info) {
                Ok(buffers) if !buffers.is_empty() => buffers[0],
                Ok(_) => {
                    ctx.device.destroy_command_pool(pool, None);
                    return Err(engine_err!("galaxy3d::vulkan", "Driver returned no command buffer"));
                }
                Err(e) => {
                    ctx.device.destroy_command_pool(pool, None);
                    return Err(engine_err!("galaxy3d::vulkan", "Failed to allocate command buffer: {:?}", e));
                }
            };

            Ok(Self { ctx, pool, buffer })
        }
    }

    fn device(&self) -> &ash::Device {
        &self.ctx.device
    }
}

impl CommandEncoder<VulkanDevice> for VulkanEncoder {
    fn reset(&mut self) -> Result<()> {
        unsafe {
            self.device()
                .reset_command_buffer(self.buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to reset command buffer: {:?}", e))
        }
    }

    fn begin(&mut self, one_time_submit: bool) -> Result<()> {
        let flags = if one_time_submit {
            vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT
        } else {
            vk::CommandBufferUsageFlags::empty()
        };
        unsafe {
            self.device()
                .begin_command_buffer(self.buffer, &vk::CommandBufferBeginInfo::default().flags(flags))
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to begin command buffer: {:?}", e))
        }
    }

    fn end(&mut self) -> Result<()> {
        unsafe {
            self.device()
                .end_command_buffer(self.buffer)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to end command buffer: {:?}", e))
        }
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };
        unsafe {
            self.device().cmd_set_viewport(self.buffer, 0, &[vk_viewport]);
        }
    }

    fn set_scissor(&mut self, scissor: &Rect2D) {
        let rect = vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D { width: scissor.width, height: scissor.height },
        };
        unsafe {
            self.device().cmd_set_scissor(self.buffer, 0, &[rect]);
        }
    }

    fn copy_buffer(&mut self, src: &VulkanBuffer, dst: &VulkanBuffer, region: &BufferCopy) {
        let copy = vk::BufferCopy {
            src_offset: region.src_offset,
            dst_offset: region.dst_offset,
            size: region.size,
        };
        unsafe {
            self.device().cmd_copy_buffer(self.buffer, src.buffer, dst.buffer, &[copy]);
        }
    }

    fn copy_buffer_to_image(&mut self, src: &VulkanBuffer, dst: &VulkanImage, layout: ImageLayout, region: &BufferImageCopy) {
        let copy = vk::BufferImageCopy::default()
            .buffer_offset(region.buffer_offset)
            .buffer_row_length(0)
            .buffer_image_height(0)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vulkan_convert::aspect_to_vk(region.aspect),
                mip_level: region.mip_level,
                base_array_layer: region.base_array_layer,
                layer_count: region.layer_count,
            })
            .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
            .image_extent(vk::Extent3D {
                width: region.image_extent.x,
                height: region.image_extent.y,
                depth: 1,
            });
        unsafe {
            self.device().cmd_copy_buffer_to_image(
                self.buffer,
                src.buffer,
                dst.image,
                vulkan_convert::image_layout_to_vk(layout),
                &[copy],
            );
        }
    }

    fn blit_image(&mut self, image: &VulkanImage, region: &ImageBlit) {
        let aspect_mask = vulkan_convert::aspect_to_vk(region.aspect);
        let corner = |extent: UVec2| vk::Offset3D {
            x: extent.x.max(1) as i32,
            y: extent.y.max(1) as i32,
            z: 1,
        };
        let blit = vk::ImageBlit {
            src_subresource: vk::ImageSubresourceLayers {
                aspect_mask,
                mip_level: region.src_mip_level,
                base_array_layer: region.base_array_layer,
                layer_count: region.layer_count,
            },
            src_offsets: [vk::Offset3D::default(), corner(region.src_extent)],
            dst_subresource: vk::ImageSubresourceLayers {
                aspect_mask,
                mip_level: region.dst_mip_level,
                base_array_layer: region.base_array_layer,
                layer_count: region.layer_count,
            },
            dst_offsets: [vk::Offset3D::default(), corner(region.dst_extent)],
        };
        unsafe {
            self.device().cmd_blit_image(
                self.buffer,
                image.image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                image.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[blit],
                vk::Filter::LINEAR,
            );
        }
    }

    fn buffer_barrier(&mut self, barrier: &BufferBarrier<'_, VulkanDevice>) {
        let vk_barrier = vk::BufferMemoryBarrier::default()
            .src_access_mask(vulkan_convert::access_to_vk(barrier.src_access))
            .dst_access_mask(vulkan_convert::access_to_vk(barrier.dst_access))
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .buffer(barrier.buffer.buffer)
            .offset(barrier.offset)
            .size(barrier.size);
        unsafe {
            self.device().cmd_pipeline_barrier(
                self.buffer,
                vulkan_convert::pipeline_stages_to_vk(barrier.src_stage),
                vulkan_convert::pipeline_stages_to_vk(barrier.dst_stage),
                vk::DependencyFlags::empty(),
                &[],
                &[vk_barrier],
                &[],
            );
        }
    }

    fn image_barrier(&mut self, barrier: &ImageBarrier<'_, VulkanDevice>) {
        let range = barrier.range;
        let vk_barrier = vk::ImageMemoryBarrier::default()
            .src_access_mask(vulkan_convert::access_to_vk(barrier.src_access))
            .dst_access_mask(vulkan_convert::access_to_vk(barrier.dst_access))
            .old_layout(vulkan_convert::image_layout_to_vk(barrier.old_layout))
            .new_layout(vulkan_convert::image_layout_to_vk(barrier.new_layout))
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(barrier.image.image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vulkan_convert::aspect_to_vk(range.aspect),
                base_mip_level: range.base_mip_level,
                level_count: range.level_count,
                base_array_layer: range.base_array_layer,
                layer_count: range.layer_count,
            });
        unsafe {
            self.device().cmd_pipeline_barrier(
                self.buffer,
                vulkan_convert::pipeline_stages_to_vk(barrier.src_stage),
                vulkan_convert::pipeline_stages_to_vk(barrier.dst_stage),
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[vk_barrier],
            );
        }
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &VulkanRenderPass,
        framebuffer: &VulkanFramebuffer,
        extent: UVec2,
        clear_values: &[ClearValue],
    ) {
        let vk_clear_values: Vec<vk::ClearValue> = clear_values.iter().map(vulkan_convert::clear_value_to_vk).collect();
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass.render_pass)
            .framebuffer(framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D { width: extent.x, height: extent.y },
            })
            .clear_values(&vk_clear_values);
        unsafe {
            self.device().cmd_begin_render_pass(self.buffer, &begin_info, vk::SubpassContents::INLINE);
        }
    }

    fn end_render_pass(&mut self) {
        unsafe {
            self.device().cmd_end_render_pass(self.buffer);
        }
    }

    fn bind_pipeline(&mut self, bind_point: PipelineBindPoint, pipeline: &VulkanPipeline) {
        unsafe {
            self.device().cmd_bind_pipeline(
                self.buffer,
                vulkan_convert::bind_point_to_vk(bind_point),
                pipeline.pipeline,
            );
        }
    }

    fn bind_vertex_buffer(&mut self, binding: u32, buffer: &VulkanBuffer, offset: u64) {
        unsafe {
            self.device().cmd_bind_vertex_buffers(self.buffer, binding, &[buffer.buffer], &[offset]);
        }
    }

    fn bind_index_buffer(&mut self, buffer: &VulkanBuffer, offset: u64, index_type: IndexType) {
        unsafe {
            self.device().cmd_bind_index_buffer(
                self.buffer,
                buffer.buffer,
                offset,
                vulkan_convert::index_type_to_vk(index_type),
            );
        }
    }

    fn bind_descriptor_sets(
        &mut self,
        bind_point: PipelineBindPoint,
        layout: &VulkanPipelineLayout,
        first_set: u32,
        sets: &[&VulkanDescriptorSet],
    ) {
        let vk_sets: Vec<vk::DescriptorSet> = sets.iter().map(|s| s.set).collect();
        unsafe {
            self.device().cmd_bind_descriptor_sets(
                self.buffer,
                vulkan_convert::bind_point_to_vk(bind_point),
                layout.layout,
                first_set,
                &vk_sets,
                &[],
            );
        }
    }

    fn push_constants(&mut self, layout: &VulkanPipelineLayout, stages: ShaderStages, offset: u32, data: &[u8]) {
        unsafe {
            self.device().cmd_push_constants(
                self.buffer,
                layout.layout,
                vulkan_convert::shader_stages_to_vk(stages),
                offset,
                data,
            );
        }
    }

    fn push_descriptor_set(
        &mut self,
        bind_point: PipelineBindPoint,
        layout: &VulkanPipelineLayout,
        set: u32,
        writes: &[DescriptorWrite<VulkanDevice>],
    ) {
        let Some(loader) = self.ctx.push_descriptor_loader.as_ref() else {
            engine_warn!("galaxy3d::vulkan", "Push descriptor write skipped: VK_KHR_push_descriptor not enabled");
            return;
        };
        vulkan_descriptor::with_vk_writes(vk::DescriptorSet::null(), writes, |vk_writes| unsafe {
            loader.cmd_push_descriptor_set(
                self.buffer,
                vulkan_convert::bind_point_to_vk(bind_point),
                layout.layout,
                set,
                vk_writes,
            );
        });
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        unsafe {
            self.device().cmd_draw(self.buffer, vertex_count, instance_count, first_vertex, first_instance);
        }
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        unsafe {
            self.device().cmd_draw_indexed(
                self.buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        unsafe {
            self.device().cmd_dispatch(self.buffer, x, y, z);
        }
    }
}

impl Drop for VulkanEncoder {
    fn drop(&mut self) {
        unsafe {
            // Freeing the pool frees its command buffer
            self.ctx.device.destroy_command_pool(self.pool, None);
        }
    }
}
