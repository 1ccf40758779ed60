/// CommandRecorder - reusable command recording
///
/// Wraps a native encoder with the recording state machine, a dirty flag and
/// two lists drained once the GPU has finished with the recording:
/// resources retired by `destroy_*_after_execution` and completion callbacks.
///
/// ```text
/// Unrecorded --begin--> Recording --end--> Ended --submit--> Submitted
///      ^                                                         |
///      +----------------------- complete ------------------------+
/// ```

use std::sync::Arc;
use glam::UVec2;
use crate::descriptor::DescriptorWrite;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AccessFlags, BufferBarrier, BufferCopy, BufferImageCopy, ClearValue, CommandEncoder,
    GraphicsDevice, ImageBarrier, ImageBlit, ImageLayout, IndexType, PipelineBindPoint,
    PipelineStages, Rect2D, ShaderStages, SubresourceRange, Viewport,
};
use crate::memory::{GpuBuffer, GpuImage};
use crate::{engine_error, engine_trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Unrecorded,
    Recording,
    Ended,
    /// Submitted and not yet known to be complete
    Submitted,
}

/// Resource kept alive until the recording has executed
pub enum Retired<D: GraphicsDevice> {
    Buffer(Arc<D::Buffer>),
    Image(Arc<D::Image>),
}

pub struct CommandRecorder<D: GraphicsDevice> {
    encoder: D::Encoder,
    state: RecorderState,
    dirty: bool,
    retired: Vec<Retired<D>>,
    callbacks: Vec<Box<dyn FnOnce() + Send>>,
    label: String,
}

impl<D: GraphicsDevice> CommandRecorder<D> {
    pub fn new(device: &D, label: impl Into<String>) -> Result<Self> {
        Ok(Self {
            encoder: device.create_encoder()?,
            state: RecorderState::Unrecorded,
            dirty: false,
            retired: Vec::new(),
            callbacks: Vec::new(),
            label: label.into(),
        })
    }

    // ===== STATE =====

    /// Start a new recording, discarding anything recorded since the last begin
    ///
    /// Retired resources and callbacks are kept: they belong to work that
    /// may already be referenced by an earlier submission.
    pub fn begin(&mut self) -> Result<()> {
        if self.state == RecorderState::Submitted {
            engine_error!("galaxy3d::gpu::CommandRecorder",
                "'{}' restarted before its submission completed", self.label);
            return Err(Error::SynchronizationMisuse(format!(
                "recorder '{}' is still in flight", self.label)));
        }
        self.encoder.reset()?;
        self.encoder.begin(true)?;
        self.state = RecorderState::Recording;
        self.dirty = false;
        Ok(())
    }

    pub fn end(&mut self) -> Result<()> {
        self.require_recording("end")?;
        self.encoder.end()?;
        self.state = RecorderState::Ended;
        Ok(())
    }

    /// Called by the submitter once the encoder has been queued
    pub fn mark_submitted(&mut self) -> Result<()> {
        if self.state != RecorderState::Ended {
            engine_error!("galaxy3d::gpu::CommandRecorder",
                "'{}' submitted in state {:?}", self.label, self.state);
            return Err(Error::SynchronizationMisuse(format!(
                "recorder '{}' submitted without being ended", self.label)));
        }
        self.state = RecorderState::Submitted;
        Ok(())
    }

    /// Run once the GPU has finished the submission
    ///
    /// Drops retired resources in insertion order, then runs callbacks in
    /// insertion order, then clears both lists.
    pub fn complete(&mut self) {
        let retired = std::mem::take(&mut self.retired);
        let callbacks = std::mem::take(&mut self.callbacks);
        engine_trace!("galaxy3d::gpu::CommandRecorder",
            "'{}' complete: {} retired, {} callbacks", self.label, retired.len(), callbacks.len());

        for resource in retired {
            drop(resource);
        }
        for callback in callbacks {
            callback();
        }
        if self.state == RecorderState::Submitted {
            self.state = RecorderState::Unrecorded;
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// A command was recorded since the last begin
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn encoder(&self) -> &D::Encoder {
        &self.encoder
    }

    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    // ===== DEFERRED DESTRUCTION =====

    pub fn destroy_after_execution(&mut self, resource: Retired<D>) {
        self.retired.push(resource);
    }

    pub fn destroy_buffer_after_execution(&mut self, buffer: Arc<D::Buffer>) {
        self.retired.push(Retired::Buffer(buffer));
    }

    pub fn destroy_image_after_execution(&mut self, image: Arc<D::Image>) {
        self.retired.push(Retired::Image(image));
    }

    pub fn push_completion_callback<F: FnOnce() + Send + 'static>(&mut self, callback: F) {
        self.callbacks.push(Box::new(callback));
    }

    // ===== STATE SETTERS =====

    /// Viewport flipped so +Y points up
    pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<()> {
        self.require_recording("set_viewport")?;
        self.encoder.set_viewport(&Viewport {
            x,
            y: y + height,
            width,
            height: -height,
            min_depth: 0.0,
            max_depth: 1.0,
        });
        self.dirty = true;
        Ok(())
    }

    pub fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.require_recording("set_scissor")?;
        self.encoder.set_scissor(&scissor);
        self.dirty = true;
        Ok(())
    }

    pub fn set_viewport_and_scissor(&mut self, extent: UVec2) -> Result<()> {
        self.set_viewport(0.0, 0.0, extent.x as f32, extent.y as f32)?;
        self.set_scissor(Rect2D::from_extent(extent))
    }

    // ===== TRANSFERS =====

    /// Copy `size` bytes (0 = the whole source) between buffers
    pub fn copy_buffer_to_buffer(
        &mut self,
        src: &D::Buffer,
        dst: &D::Buffer,
        size: u64,
        src_offset: u64,
        dst_offset: u64,
    ) -> Result<()> {
        self.require_recording("copy_buffer_to_buffer")?;
        let size = if size == 0 { src.size() } else { size };
        if src_offset + size > src.size() || dst_offset + size > dst.size() {
            engine_error!("galaxy3d::gpu::CommandRecorder",
                "Copy of {} bytes ({} -> {}) overflows source ({}) or destination ({})",
                size, src_offset, dst_offset, src.size(), dst.size());
            return Err(Error::InvalidResource(format!("copy of {} bytes out of range", size)));
        }
        self.encoder.copy_buffer(src, dst, &BufferCopy { src_offset, dst_offset, size });
        self.dirty = true;
        Ok(())
    }

    /// Copy tightly packed texels into one mip level; the image must be in TRANSFER_DST
    pub fn copy_buffer_to_image(
        &mut self,
        src: &D::Buffer,
        dst: &D::Image,
        mip_level: u32,
        base_array_layer: u32,
        layer_count: u32,
    ) -> Result<()> {
        self.require_recording("copy_buffer_to_image")?;
        let desc = dst.desc();
        let extent = UVec2::new((desc.width >> mip_level).max(1), (desc.height >> mip_level).max(1));
        self.encoder.copy_buffer_to_image(
            src,
            dst,
            ImageLayout::TransferDst,
            &BufferImageCopy {
                buffer_offset: 0,
                aspect: dst.aspect(),
                mip_level,
                base_array_layer,
                layer_count,
                image_extent: extent,
            },
        );
        self.dirty = true;
        Ok(())
    }

    /// Blit mip level `level` into `level + 1` of the same image
    pub fn blit_image_mip(&mut self, image: &D::Image, level: u32) -> Result<()> {
        self.require_recording("blit_image_mip")?;
        let desc = image.desc();
        if level + 1 >= desc.mip_levels {
            return Err(Error::InvalidResource(format!(
                "mip {} has no next level ({} levels)", level, desc.mip_levels)));
        }
        let size = |l: u32| UVec2::new((desc.width >> l).max(1), (desc.height >> l).max(1));
        self.encoder.blit_image(image, &ImageBlit {
            aspect: image.aspect(),
            src_mip_level: level,
            src_extent: size(level),
            dst_mip_level: level + 1,
            dst_extent: size(level + 1),
            base_array_layer: 0,
            layer_count: desc.array_layers,
        });
        self.dirty = true;
        Ok(())
    }

    /// Fill every mip level from level 0 and leave the image shader-readable
    ///
    /// Level 0 must be in TRANSFER_DST.
    pub fn generate_mipmaps(&mut self, image: &D::Image) -> Result<()> {
        let levels = image.desc().mip_levels;
        for level in 0..levels.saturating_sub(1) {
            self.synchronize_image_level_usage(
                image, level,
                PipelineStages::TRANSFER, PipelineStages::TRANSFER,
                AccessFlags::TRANSFER_WRITE, AccessFlags::TRANSFER_READ,
                ImageLayout::TransferDst, ImageLayout::TransferSrc,
            )?;
            self.synchronize_image_level_usage(
                image, level + 1,
                PipelineStages::TOP_OF_PIPE, PipelineStages::TRANSFER,
                AccessFlags::empty(), AccessFlags::TRANSFER_WRITE,
                ImageLayout::Undefined, ImageLayout::TransferDst,
            )?;
            self.blit_image_mip(image, level)?;
            self.synchronize_image_level_usage(
                image, level,
                PipelineStages::TRANSFER, PipelineStages::FRAGMENT_SHADER,
                AccessFlags::TRANSFER_READ, AccessFlags::SHADER_READ,
                ImageLayout::TransferSrc, ImageLayout::ShaderReadOnly,
            )?;
        }
        self.synchronize_image_level_usage(
            image, levels.saturating_sub(1),
            PipelineStages::TRANSFER, PipelineStages::FRAGMENT_SHADER,
            AccessFlags::TRANSFER_WRITE, AccessFlags::SHADER_READ,
            ImageLayout::TransferDst, ImageLayout::ShaderReadOnly,
        )?;
        image.set_layout(ImageLayout::ShaderReadOnly);
        Ok(())
    }

    // ===== BARRIERS =====

    /// Barrier over the whole buffer
    pub fn synchronize_buffer_usage(
        &mut self,
        buffer: &D::Buffer,
        src_stage: PipelineStages,
        dst_stage: PipelineStages,
        src_access: AccessFlags,
        dst_access: AccessFlags,
    ) -> Result<()> {
        self.require_recording("synchronize_buffer_usage")?;
        self.encoder.buffer_barrier(&BufferBarrier {
            buffer,
            src_stage,
            dst_stage,
            src_access,
            dst_access,
            offset: 0,
            size: buffer.size(),
        });
        self.dirty = true;
        Ok(())
    }

    /// Barrier over every mip and layer; `None` keeps the current layout
    pub fn synchronize_image_usage(
        &mut self,
        image: &D::Image,
        src_stage: PipelineStages,
        dst_stage: PipelineStages,
        src_access: AccessFlags,
        dst_access: AccessFlags,
        new_layout: Option<ImageLayout>,
    ) -> Result<()> {
        self.require_recording("synchronize_image_usage")?;
        let old_layout = image.layout();
        let new_layout = new_layout.unwrap_or(old_layout);
        self.encoder.image_barrier(&ImageBarrier {
            image,
            src_stage,
            dst_stage,
            src_access,
            dst_access,
            old_layout,
            new_layout,
            range: image.full_range(),
        });
        image.set_layout(new_layout);
        self.dirty = true;
        Ok(())
    }

    /// Barrier over one mip level with explicit layouts; the tracked layout is not touched
    #[allow(clippy::too_many_arguments)]
    pub fn synchronize_image_level_usage(
        &mut self,
        image: &D::Image,
        level: u32,
        src_stage: PipelineStages,
        dst_stage: PipelineStages,
        src_access: AccessFlags,
        dst_access: AccessFlags,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
    ) -> Result<()> {
        self.require_recording("synchronize_image_level_usage")?;
        let desc = image.desc();
        self.encoder.image_barrier(&ImageBarrier {
            image,
            src_stage,
            dst_stage,
            src_access,
            dst_access,
            old_layout,
            new_layout,
            range: SubresourceRange {
                aspect: image.aspect(),
                base_mip_level: level,
                level_count: 1,
                base_array_layer: 0,
                layer_count: desc.array_layers,
            },
        });
        self.dirty = true;
        Ok(())
    }

    // ===== RENDERING =====

    pub fn begin_render_pass(
        &mut self,
        render_pass: &D::RenderPass,
        framebuffer: &D::Framebuffer,
        extent: UVec2,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_recording("begin_render_pass")?;
        self.encoder.begin_render_pass(render_pass, framebuffer, extent, clear_values);
        self.dirty = true;
        Ok(())
    }

    pub fn end_render_pass(&mut self) -> Result<()> {
        self.require_recording("end_render_pass")?;
        self.encoder.end_render_pass();
        self.dirty = true;
        Ok(())
    }

    pub fn bind_pipeline(&mut self, bind_point: PipelineBindPoint, pipeline: &D::Pipeline) -> Result<()> {
        self.require_recording("bind_pipeline")?;
        self.encoder.bind_pipeline(bind_point, pipeline);
        self.dirty = true;
        Ok(())
    }

    pub fn bind_vertex_buffer(&mut self, binding: u32, buffer: &D::Buffer, offset: u64) -> Result<()> {
        self.require_recording("bind_vertex_buffer")?;
        self.encoder.bind_vertex_buffer(binding, buffer, offset);
        self.dirty = true;
        Ok(())
    }

    pub fn bind_index_buffer(&mut self, buffer: &D::Buffer, offset: u64, index_type: IndexType) -> Result<()> {
        self.require_recording("bind_index_buffer")?;
        self.encoder.bind_index_buffer(buffer, offset, index_type);
        self.dirty = true;
        Ok(())
    }

    pub fn bind_descriptor_sets(
        &mut self,
        bind_point: PipelineBindPoint,
        layout: &D::PipelineLayout,
        first_set: u32,
        sets: &[&D::DescriptorSet],
    ) -> Result<()> {
        self.require_recording("bind_descriptor_sets")?;
        self.encoder.bind_descriptor_sets(bind_point, layout, first_set, sets);
        self.dirty = true;
        Ok(())
    }

    pub fn push_constants(
        &mut self,
        layout: &D::PipelineLayout,
        stages: ShaderStages,
        offset: u32,
        data: &[u8],
    ) -> Result<()> {
        self.require_recording("push_constants")?;
        self.encoder.push_constants(layout, stages, offset, data);
        self.dirty = true;
        Ok(())
    }

    pub fn push_descriptor_set(
        &mut self,
        bind_point: PipelineBindPoint,
        layout: &D::PipelineLayout,
        set: u32,
        writes: &[DescriptorWrite<D>],
    ) -> Result<()> {
        self.require_recording("push_descriptor_set")?;
        self.encoder.push_descriptor_set(bind_point, layout, set, writes);
        self.dirty = true;
        Ok(())
    }

    pub fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) -> Result<()> {
        self.require_recording("draw")?;
        self.encoder.draw(vertex_count, instance_count, first_vertex, first_instance);
        self.dirty = true;
        Ok(())
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        self.require_recording("draw_indexed")?;
        self.encoder.draw_indexed(index_count, instance_count, first_index, vertex_offset, first_instance);
        self.dirty = true;
        Ok(())
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.require_recording("dispatch")?;
        self.encoder.dispatch(x, y, z);
        self.dirty = true;
        Ok(())
    }

    fn require_recording(&self, operation: &str) -> Result<()> {
        if self.state != RecorderState::Recording {
            engine_error!("galaxy3d::gpu::CommandRecorder",
                "{} on '{}' outside of a recording ({:?})", operation, self.label, self.state);
            return Err(Error::SynchronizationMisuse(format!(
                "{} called while recorder '{}' is {:?}", operation, self.label, self.state)));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "command_recorder_tests.rs"]
mod tests;
