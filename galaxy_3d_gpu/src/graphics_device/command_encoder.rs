/// CommandEncoder trait - native command recording
///
/// The encoder is the raw recording handle. State tracking, dirty flags and
/// deferred destruction live in `CommandRecorder`, which wraps one encoder.

use glam::UVec2;
use crate::error::Result;
use crate::descriptor::DescriptorWrite;
use crate::graphics_device::{
    AccessFlags, BufferCopy, BufferImageCopy, ClearValue, GraphicsDevice, ImageBlit, ImageLayout,
    IndexType, PipelineBindPoint, PipelineStages, Rect2D, ShaderStages, SubresourceRange, Viewport,
};

/// Memory barrier over a buffer range
pub struct BufferBarrier<'a, D: GraphicsDevice> {
    pub buffer: &'a D::Buffer,
    pub src_stage: PipelineStages,
    pub dst_stage: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub offset: u64,
    pub size: u64,
}

/// Memory barrier and layout transition over an image range
pub struct ImageBarrier<'a, D: GraphicsDevice> {
    pub image: &'a D::Image,
    pub src_stage: PipelineStages,
    pub dst_stage: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub range: SubresourceRange,
}

pub trait CommandEncoder<D: GraphicsDevice>: Send {
    /// Discard everything recorded so far
    fn reset(&mut self) -> Result<()>;

    fn begin(&mut self, one_time_submit: bool) -> Result<()>;

    fn end(&mut self) -> Result<()>;

    fn set_viewport(&mut self, viewport: &Viewport);

    fn set_scissor(&mut self, scissor: &Rect2D);

    fn copy_buffer(&mut self, src: &D::Buffer, dst: &D::Buffer, region: &BufferCopy);

    fn copy_buffer_to_image(&mut self, src: &D::Buffer, dst: &D::Image, layout: ImageLayout, region: &BufferImageCopy);

    /// Blit inside one image, source in TRANSFER_SRC and destination in TRANSFER_DST
    fn blit_image(&mut self, image: &D::Image, region: &ImageBlit);

    fn buffer_barrier(&mut self, barrier: &BufferBarrier<'_, D>);

    fn image_barrier(&mut self, barrier: &ImageBarrier<'_, D>);

    fn begin_render_pass(
        &mut self,
        render_pass: &D::RenderPass,
        framebuffer: &D::Framebuffer,
        extent: UVec2,
        clear_values: &[ClearValue],
    );

    fn end_render_pass(&mut self);

    fn bind_pipeline(&mut self, bind_point: PipelineBindPoint, pipeline: &D::Pipeline);

    fn bind_vertex_buffer(&mut self, binding: u32, buffer: &D::Buffer, offset: u64);

    fn bind_index_buffer(&mut self, buffer: &D::Buffer, offset: u64, index_type: IndexType);

    fn bind_descriptor_sets(
        &mut self,
        bind_point: PipelineBindPoint,
        layout: &D::PipelineLayout,
        first_set: u32,
        sets: &[&D::DescriptorSet],
    );

    fn push_constants(&mut self, layout: &D::PipelineLayout, stages: ShaderStages, offset: u32, data: &[u8]);

    fn push_descriptor_set(
        &mut self,
        bind_point: PipelineBindPoint,
        layout: &D::PipelineLayout,
        set: u32,
        writes: &[DescriptorWrite<D>],
    );

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32);

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    );

    fn dispatch(&mut self, x: u32, y: u32, z: u32);
}
