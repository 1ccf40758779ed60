/// FrameScheduler - frames in flight and the acquire/submit/present protocol
///
/// Each frame slot owns an image-available semaphore, an in-flight fence, a
/// command recorder and a pair of host-visible buffers (uniform and storage).
/// Render-finished semaphores are held per surface image, since presentation
/// of an image may still be waiting on one when its slot comes around again.
///
/// ```text
/// acquire_next_image   wait slot fence, complete slot recorder, acquire, begin recording
///   begin_render_pass / record / end_render_pass
/// swap_image           wait previous user of the image, submit, present, advance
/// ```
///
/// A stale surface (or a resized window) triggers a synchronous rebuild that
/// first blocks until the window is presentable again.

use std::sync::Arc;
use glam::UVec2;
use crate::command::{CommandRecorder, RecorderState};
use crate::config::{PresentPreference, MAX_FRAMES_IN_FLIGHT};
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::frame::WindowState;
use crate::graphics_device::{
    AcquireOutcome, AttachmentDesc, BufferUsage, ClearValue, ColorSpace, Format, GraphicsDevice,
    ImageLayout, LoadOp, PipelineStages, PresentMode, PresentOutcome, RenderPassDesc, StoreOp,
    SubmitSync, SurfaceCapabilities, SurfaceChain, SurfaceFormat, SwapchainDesc,
};
use crate::memory::{BufferDesc, GpuBuffer};
use crate::{engine_debug, engine_error, engine_fail, engine_info};

const SOURCE: &str = "galaxy3d::gpu::FrameScheduler";

// ===== SELECTION =====

/// Prefer an 8-bit RGBA/BGRA format in the sRGB non-linear color space, else the first one
pub fn select_surface_format(formats: &[SurfaceFormat]) -> Option<SurfaceFormat> {
    formats
        .iter()
        .find(|f| f.format.is_8bit_rgba() && f.color_space == ColorSpace::SrgbNonlinear)
        .or_else(|| formats.first())
        .copied()
}

/// Prefer a non-blocking mode (mailbox first) unless vsync is requested; FIFO is always available
pub fn select_present_mode(modes: &[PresentMode], preference: PresentPreference) -> PresentMode {
    if preference == PresentPreference::VSync {
        return PresentMode::Fifo;
    }
    [PresentMode::Mailbox, PresentMode::Immediate]
        .into_iter()
        .find(|mode| modes.contains(mode))
        .unwrap_or(PresentMode::Fifo)
}

/// Surface extent: the surface's own extent when it reports one, else the
/// framebuffer size, clamped to the surface limits
pub fn choose_extent(caps: &SurfaceCapabilities, framebuffer_size: UVec2) -> UVec2 {
    caps.current_extent
        .unwrap_or(framebuffer_size)
        .clamp(caps.min_extent, caps.max_extent.max(caps.min_extent))
}

/// Frames in flight: `min(3, max(min images, max images))`, then the configured cap
pub fn select_frame_count(caps: &SurfaceCapabilities, configured: u32) -> u32 {
    let surface_max = if caps.max_image_count == 0 { MAX_FRAMES_IN_FLIGHT } else { caps.max_image_count };
    MAX_FRAMES_IN_FLIGHT
        .min(caps.min_image_count.max(surface_max))
        .min(configured)
        .max(1)
}

/// Images requested from the surface: the frame count within the surface limits
pub fn select_image_count(caps: &SurfaceCapabilities, frames: u32) -> u32 {
    let max = if caps.max_image_count == 0 { u32::MAX } else { caps.max_image_count };
    frames.clamp(caps.min_image_count.min(max), max)
}

// ===== FRAME SLOT =====

struct FrameSlot<D: GraphicsDevice> {
    recorder: CommandRecorder<D>,
    image_available: D::Semaphore,
    in_flight: D::Fence,
    uniform_buffer: Arc<D::Buffer>,
    storage_buffer: Arc<D::Buffer>,
    /// The fence was waited since this slot was last submitted
    fence_waited: bool,
}

impl<D: GraphicsDevice> FrameSlot<D> {
    fn new(context: &GraphicsContext<D>, index: usize) -> Result<Self> {
        let device = context.device();
        let config = context.config();
        Ok(Self {
            recorder: CommandRecorder::new(device, format!("frame {}", index))?,
            image_available: device.create_semaphore()?,
            in_flight: device.create_fence(true)?,
            uniform_buffer: context.create_buffer(&BufferDesc::host(
                config.frame_uniform_buffer_size,
                BufferUsage::UNIFORM,
                format!("frame {} uniforms", index),
            ))?,
            storage_buffer: context.create_buffer(&BufferDesc::host(
                config.frame_storage_buffer_size,
                BufferUsage::STORAGE,
                format!("frame {} storage", index),
            ))?,
            fence_waited: false,
        })
    }
}

// ===== FRAME SCHEDULER =====

pub struct FrameScheduler<D: GraphicsDevice, W: WindowState> {
    framebuffers: Vec<D::Framebuffer>,
    chain: D::Swapchain,
    render_pass: Arc<D::RenderPass>,
    render_finished: Vec<D::Semaphore>,
    slots: Vec<FrameSlot<D>>,
    /// Slot that last rendered to each surface image
    images_in_flight: Vec<Option<usize>>,
    current_frame: usize,
    image_index: Option<u32>,
    surface_format: SurfaceFormat,
    present_mode: PresentMode,
    rebuild_count: u64,
    window: W,
    context: Arc<GraphicsContext<D>>,
}

impl<D: GraphicsDevice, W: WindowState> FrameScheduler<D, W> {
    pub fn new(context: Arc<GraphicsContext<D>>, window: W) -> Result<Self> {
        let device = context.device();
        let caps = device.surface_capabilities()?;
        let frames = context.frames_in_flight() as u32;

        let surface_format = select_surface_format(&device.surface_formats()?).ok_or_else(|| {
            engine_fail!(InitializationFailed, SOURCE, "Surface reports no formats")
        })?;
        let present_mode = select_present_mode(&device.present_modes()?, context.config().present_preference);
        let extent = choose_extent(&caps, window.framebuffer_size());

        let chain = device.create_swapchain(
            &SwapchainDesc {
                image_count: select_image_count(&caps, frames),
                format: surface_format,
                present_mode,
                extent,
            },
            None,
        )?;
        let render_pass = Arc::new(Self::create_render_pass(device, surface_format.format)?);
        let framebuffers = Self::create_framebuffers(device, &render_pass, &chain)?;
        let render_finished = (0..chain.images().len())
            .map(|_| device.create_semaphore())
            .collect::<Result<Vec<_>>>()?;
        let slots = (0..frames as usize)
            .map(|i| FrameSlot::new(&context, i))
            .collect::<Result<Vec<_>>>()?;

        engine_info!(SOURCE, "Surface {}x{} {:?} {:?}, {} images, {} frames in flight",
            extent.x, extent.y, surface_format.format, present_mode, chain.images().len(), frames);

        Ok(Self {
            images_in_flight: vec![None; chain.images().len()],
            framebuffers,
            chain,
            render_pass,
            render_finished,
            slots,
            current_frame: 0,
            image_index: None,
            surface_format,
            present_mode,
            rebuild_count: 0,
            window,
            context,
        })
    }

    fn create_render_pass(device: &D, format: Format) -> Result<D::RenderPass> {
        device.create_render_pass(&RenderPassDesc {
            color_attachments: vec![AttachmentDesc {
                format,
                samples: 1,
                load_op: LoadOp::Clear,
                store_op: StoreOp::Store,
                initial_layout: ImageLayout::Undefined,
                final_layout: ImageLayout::PresentSrc,
            }],
            depth_attachment: None,
        })
    }

    fn create_framebuffers(device: &D, render_pass: &D::RenderPass, chain: &D::Swapchain) -> Result<Vec<D::Framebuffer>> {
        chain
            .images()
            .iter()
            .map(|image| device.create_framebuffer(render_pass, &[image.as_ref()], chain.extent()))
            .collect()
    }

    // ===== FRAME CYCLE =====

    /// Wait for the current slot, acquire a surface image and begin the slot's recording
    ///
    /// Blocks on the slot fence, and on the window while the surface has to be
    /// rebuilt. Returns the acquired image index.
    pub fn acquire_next_image(&mut self) -> Result<u32> {
        if self.image_index.is_some() {
            return Err(engine_fail!(SynchronizationMisuse, SOURCE,
                "Image acquired twice without swap_image"));
        }
        loop {
            let slot = &mut self.slots[self.current_frame];
            self.context.device().wait_fence(&slot.in_flight)?;
            slot.recorder.complete();
            slot.fence_waited = true;

            match self.chain.acquire_next_image(&slot.image_available)? {
                AcquireOutcome::Image(index) => {
                    slot.recorder.begin()?;
                    self.image_index = Some(index);
                    return Ok(index);
                }
                AcquireOutcome::Stale => {
                    engine_debug!(SOURCE, "Surface stale on acquire");
                    self.rebuild()?;
                }
            }
        }
    }

    /// Submit the slot's recording and present the acquired image
    ///
    /// Advances to the next slot unless the surface had to be rebuilt.
    pub fn swap_image(&mut self) -> Result<()> {
        let image_index = self.image_index.take().ok_or_else(|| {
            engine_fail!(SynchronizationMisuse, SOURCE, "swap_image without an acquired image")
        })?;
        let frame = self.current_frame;
        let image = image_index as usize;
        let device = self.context.device();

        if let Some(previous) = self.images_in_flight[image] {
            if previous != frame {
                device.wait_fence(&self.slots[previous].in_flight)?;
            }
        }
        self.images_in_flight[image] = Some(frame);

        let slot = &mut self.slots[frame];
        if slot.recorder.state() == RecorderState::Recording {
            slot.recorder.end()?;
        }
        device.reset_fence(&slot.in_flight)?;
        device.submit(
            slot.recorder.encoder(),
            &SubmitSync {
                wait: Some((&slot.image_available, PipelineStages::COLOR_ATTACHMENT_OUTPUT)),
                signal: Some(&self.render_finished[image]),
                fence: Some(&slot.in_flight),
            },
        )?;
        slot.recorder.mark_submitted()?;
        slot.fence_waited = false;

        let outcome = self.chain.present(image_index, &self.render_finished[image])?;
        let resized = self.window.take_resized();
        if outcome == PresentOutcome::Stale || resized {
            engine_debug!(SOURCE, "Surface stale on present (resized: {})", resized);
            return self.rebuild();
        }

        self.current_frame = (frame + 1) % self.slots.len();
        Ok(())
    }

    /// Rebuild every surface-dependent object at the window's current size
    ///
    /// Semaphores, fences and slot buffers survive a rebuild.
    pub fn rebuild(&mut self) -> Result<()> {
        while !self.window.is_presentable() {
            self.window.wait_events();
        }

        let device = self.context.device();
        device.wait_idle()?;
        for slot in &mut self.slots {
            if slot.recorder.state() == RecorderState::Submitted {
                slot.recorder.complete();
            }
        }
        self.framebuffers.clear();

        let caps = device.surface_capabilities()?;
        let surface_format = select_surface_format(&device.surface_formats()?).ok_or_else(|| {
            engine_fail!(InitializationFailed, SOURCE, "Surface reports no formats")
        })?;
        let extent = choose_extent(&caps, self.window.framebuffer_size());

        let chain = device.create_swapchain(
            &SwapchainDesc {
                image_count: select_image_count(&caps, self.slots.len() as u32),
                format: surface_format,
                present_mode: self.present_mode,
                extent,
            },
            Some(&self.chain),
        )?;
        self.chain = chain;

        if surface_format.format != self.surface_format.format {
            self.render_pass = Arc::new(Self::create_render_pass(device, surface_format.format)?);
        }
        self.surface_format = surface_format;
        self.framebuffers = Self::create_framebuffers(device, &self.render_pass, &self.chain)?;

        let image_count = self.chain.images().len();
        while self.render_finished.len() < image_count {
            self.render_finished.push(device.create_semaphore()?);
        }
        self.images_in_flight = vec![None; image_count];
        self.rebuild_count += 1;

        engine_info!(SOURCE, "Surface rebuilt at {}x{} ({} images)", extent.x, extent.y, image_count);
        Ok(())
    }

    // ===== RENDERING =====

    /// Begin the surface render pass on the current slot, clearing to `clear_color`
    pub fn begin_render_pass(&mut self, clear_color: [f32; 4]) -> Result<()> {
        let image = self.require_acquired("begin_render_pass")? as usize;
        let extent = self.chain.extent();
        let recorder = &mut self.slots[self.current_frame].recorder;
        recorder.begin_render_pass(
            &self.render_pass,
            &self.framebuffers[image],
            extent,
            &[ClearValue::Color(clear_color)],
        )?;
        recorder.set_viewport_and_scissor(extent)
    }

    pub fn end_render_pass(&mut self) -> Result<()> {
        self.require_acquired("end_render_pass")?;
        self.slots[self.current_frame].recorder.end_render_pass()
    }

    /// Write into the current slot's uniform buffer
    pub fn write_frame_uniform(&self, offset: u64, data: &[u8]) -> Result<()> {
        let slot = self.writable_slot("write_frame_uniform")?;
        slot.uniform_buffer.write(offset, data)
    }

    /// Write into the current slot's storage buffer
    pub fn write_frame_storage(&self, offset: u64, data: &[u8]) -> Result<()> {
        let slot = self.writable_slot("write_frame_storage")?;
        slot.storage_buffer.write(offset, data)
    }

    // ===== ACCESSORS =====

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn frame_count(&self) -> usize {
        self.slots.len()
    }

    /// Image acquired for the current frame, if any
    pub fn image_index(&self) -> Option<u32> {
        self.image_index
    }

    pub fn extent(&self) -> UVec2 {
        self.chain.extent()
    }

    pub fn format(&self) -> SurfaceFormat {
        self.surface_format
    }

    pub fn present_mode(&self) -> PresentMode {
        self.present_mode
    }

    pub fn render_pass(&self) -> &Arc<D::RenderPass> {
        &self.render_pass
    }

    /// Recorder of the current slot
    pub fn frame_recorder(&mut self) -> &mut CommandRecorder<D> {
        &mut self.slots[self.current_frame].recorder
    }

    pub fn frame_uniform_buffer(&self) -> &Arc<D::Buffer> {
        &self.slots[self.current_frame].uniform_buffer
    }

    pub fn frame_storage_buffer(&self) -> &Arc<D::Buffer> {
        &self.slots[self.current_frame].storage_buffer
    }

    /// Number of surface rebuilds since creation
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }

    // ===== HELPERS =====

    fn require_acquired(&self, operation: &str) -> Result<u32> {
        self.image_index.ok_or_else(|| {
            engine_fail!(SynchronizationMisuse, SOURCE, "{} without an acquired image", operation)
        })
    }

    fn writable_slot(&self, operation: &str) -> Result<&FrameSlot<D>> {
        let slot = &self.slots[self.current_frame];
        if !slot.fence_waited {
            return Err(engine_fail!(SynchronizationMisuse, SOURCE,
                "{} on frame {} before its fence was waited", operation, self.current_frame));
        }
        Ok(slot)
    }
}

impl<D: GraphicsDevice, W: WindowState> Drop for FrameScheduler<D, W> {
    fn drop(&mut self) {
        if let Err(e) = self.context.device().wait_idle() {
            engine_error!(SOURCE, "wait_idle failed during teardown: {}", e);
        }
        for slot in &mut self.slots {
            slot.recorder.complete();
        }
    }
}

#[cfg(test)]
#[path = "frame_scheduler_tests.rs"]
mod tests;
