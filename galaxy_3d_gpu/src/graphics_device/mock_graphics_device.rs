/// Mock graphics device for unit tests (no GPU required)
///
/// Buffers are host memory. Encoders record `MockCommand`s; buffer copies
/// are executed when the encoder is submitted, and submission signals the
/// fence immediately. Every observable side effect (destruction, fence waits,
/// submissions, presentation) is appended to a shared event log so tests can
/// assert on ordering.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use glam::UVec2;
use crate::descriptor::{
    DescriptorPoolSize, DescriptorResource, DescriptorSetLayoutDesc, DescriptorWrite, PoolAllocError,
};
use crate::error::{Error, Result};
use crate::features::{DeviceFeature, FeatureSet};
use crate::frame::WindowState;
use crate::graphics_device::{
    AcquireOutcome, BufferBarrier, BufferCopy, BufferImageCopy, ClearValue, ColorSpace, CommandEncoder,
    Format, GraphicsDevice, ImageBarrier, ImageBlit, ImageLayout, IndexType, PipelineBindPoint,
    PresentMode, PresentOutcome, Rect2D, RenderPassDesc, ShaderStages, SubmitSync, SurfaceCapabilities,
    SurfaceChain, SurfaceFormat, SwapchainDesc, Viewport, ImageAspect, ImageUsage,
};
use crate::memory::{
    derive_aspect, BufferDesc, GpuBuffer, GpuImage, ImageDesc, MemoryLocation, SamplerDesc,
    TrackedLayout,
};
use crate::pipeline::{PipelineDesc, PipelineKind, PushConstantRange};

/// Shared, ordered log of device side effects
pub type EventLog = Arc<Mutex<Vec<String>>>;

fn log_event(events: &EventLog, event: impl Into<String>) {
    events.lock().unwrap().push(event.into());
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

// ============================================================================
// Mock Buffer
// ============================================================================

pub struct MockBuffer {
    pub desc: BufferDesc,
    pub data: Arc<Mutex<Vec<u8>>>,
    events: EventLog,
}

impl MockBuffer {
    /// Whole contents, regardless of memory location
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }

    pub fn is_host_visible(&self) -> bool {
        self.desc.location == MemoryLocation::HostVisible
    }
}

impl GpuBuffer for MockBuffer {
    fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    fn write_mapped(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut storage = self.data.lock().unwrap();
        let start = offset as usize;
        storage[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read_mapped(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let storage = self.data.lock().unwrap();
        let end = (offset + len) as usize;
        if end > storage.len() {
            return Err(Error::InvalidResource(format!("read of {} bytes at {} out of range", len, offset)));
        }
        Ok(storage[offset as usize..end].to_vec())
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        log_event(&self.events, format!("destroy:{}", self.desc.label));
    }
}

// ============================================================================
// Mock Image / Sampler
// ============================================================================

pub struct MockImage {
    pub desc: ImageDesc,
    aspect: ImageAspect,
    layout: TrackedLayout,
    surface_owned: bool,
    events: EventLog,
}

impl MockImage {
    pub fn new(desc: ImageDesc, surface_owned: bool, events: EventLog) -> Self {
        Self {
            aspect: derive_aspect(desc.usage),
            desc,
            layout: TrackedLayout::new(ImageLayout::Undefined),
            surface_owned,
            events,
        }
    }
}

impl GpuImage for MockImage {
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

impl Drop for MockImage {
    fn drop(&mut self) {
        if !self.surface_owned {
            log_event(&self.events, format!("destroy:{}", self.desc.label));
        }
    }
}

pub struct MockSampler {
    pub desc: SamplerDesc,
}

// ============================================================================
// Mock Encoder
// ============================================================================

/// One recorded command
#[derive(Debug, Clone)]
pub enum MockCommand {
    SetViewport(Viewport),
    SetScissor(Rect2D),
    CopyBuffer { src: String, dst: String, region: BufferCopy },
    CopyBufferToImage { src: String, dst: String, layout: ImageLayout, region: BufferImageCopy },
    BlitImage { image: String, region: ImageBlit },
    BufferBarrier { buffer: String, size: u64 },
    ImageBarrier { image: String, old_layout: ImageLayout, new_layout: ImageLayout, base_mip_level: u32, level_count: u32 },
    BeginRenderPass { extent: UVec2, clear_values: Vec<ClearValue> },
    EndRenderPass,
    BindPipeline { bind_point: PipelineBindPoint, pipeline: u64 },
    BindVertexBuffer { binding: u32, buffer: String, offset: u64 },
    BindIndexBuffer { buffer: String, offset: u64, index_type: IndexType },
    BindDescriptorSets { first_set: u32, count: usize },
    PushConstants { stages: ShaderStages, offset: u32, data: Vec<u8> },
    /// (binding, array element) of each write
    PushDescriptorSet { set: u32, writes: Vec<(u32, u32)> },
    Draw { vertex_count: u32, instance_count: u32 },
    DrawIndexed { index_count: u32, first_index: u32, vertex_offset: i32 },
    Dispatch { x: u32, y: u32, z: u32 },
}

/// Copy executed at submission
struct PendingCopy {
    src: Arc<Mutex<Vec<u8>>>,
    dst: Arc<Mutex<Vec<u8>>>,
    region: BufferCopy,
}

pub struct MockEncoder {
    pub commands: Vec<MockCommand>,
    pub recording: bool,
    pub one_time_submit: bool,
    copies: Vec<PendingCopy>,
}

impl MockEncoder {
    pub fn count(&self, predicate: impl Fn(&MockCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }
}

impl CommandEncoder<MockGraphicsDevice> for MockEncoder {
    fn reset(&mut self) -> Result<()> {
        self.commands.clear();
        self.copies.clear();
        self.recording = false;
        Ok(())
    }

    fn begin(&mut self, one_time_submit: bool) -> Result<()> {
        self.recording = true;
        self.one_time_submit = one_time_submit;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.recording = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.commands.push(MockCommand::SetViewport(*viewport));
    }

    fn set_scissor(&mut self, scissor: &Rect2D) {
        self.commands.push(MockCommand::SetScissor(*scissor));
    }

    fn copy_buffer(&mut self, src: &MockBuffer, dst: &MockBuffer, region: &BufferCopy) {
        self.copies.push(PendingCopy { src: src.data.clone(), dst: dst.data.clone(), region: *region });
        self.commands.push(MockCommand::CopyBuffer {
            src: src.desc.label.clone(),
            dst: dst.desc.label.clone(),
            region: *region,
        });
    }

    fn copy_buffer_to_image(&mut self, src: &MockBuffer, dst: &MockImage, layout: ImageLayout, region: &BufferImageCopy) {
        self.commands.push(MockCommand::CopyBufferToImage {
            src: src.desc.label.clone(),
            dst: dst.desc.label.clone(),
            layout,
            region: *region,
        });
    }

    fn blit_image(&mut self, image: &MockImage, region: &ImageBlit) {
        self.commands.push(MockCommand::BlitImage { image: image.desc.label.clone(), region: *region });
    }

    fn buffer_barrier(&mut self, barrier: &BufferBarrier<'_, MockGraphicsDevice>) {
        self.commands.push(MockCommand::BufferBarrier {
            buffer: barrier.buffer.desc.label.clone(),
            size: barrier.size,
        });
    }

    fn image_barrier(&mut self, barrier: &ImageBarrier<'_, MockGraphicsDevice>) {
        self.commands.push(MockCommand::ImageBarrier {
            image: barrier.image.desc.label.clone(),
            old_layout: barrier.old_layout,
            new_layout: barrier.new_layout,
            base_mip_level: barrier.range.base_mip_level,
            level_count: barrier.range.level_count,
        });
    }

    fn begin_render_pass(
        &mut self,
        _render_pass: &MockRenderPass,
        _framebuffer: &MockFramebuffer,
        extent: UVec2,
        clear_values: &[ClearValue],
    ) {
        self.commands.push(MockCommand::BeginRenderPass { extent, clear_values: clear_values.to_vec() });
    }

    fn end_render_pass(&mut self) {
        self.commands.push(MockCommand::EndRenderPass);
    }

    fn bind_pipeline(&mut self, bind_point: PipelineBindPoint, pipeline: &MockPipeline) {
        self.commands.push(MockCommand::BindPipeline { bind_point, pipeline: pipeline.id });
    }

    fn bind_vertex_buffer(&mut self, binding: u32, buffer: &MockBuffer, offset: u64) {
        self.commands.push(MockCommand::BindVertexBuffer { binding, buffer: buffer.desc.label.clone(), offset });
    }

    fn bind_index_buffer(&mut self, buffer: &MockBuffer, offset: u64, index_type: IndexType) {
        self.commands.push(MockCommand::BindIndexBuffer { buffer: buffer.desc.label.clone(), offset, index_type });
    }

    fn bind_descriptor_sets(
        &mut self,
        _bind_point: PipelineBindPoint,
        _layout: &MockPipelineLayout,
        first_set: u32,
        sets: &[&MockDescriptorSet],
    ) {
        self.commands.push(MockCommand::BindDescriptorSets { first_set, count: sets.len() });
    }

    fn push_constants(&mut self, _layout: &MockPipelineLayout, stages: ShaderStages, offset: u32, data: &[u8]) {
        self.commands.push(MockCommand::PushConstants { stages, offset, data: data.to_vec() });
    }

    fn push_descriptor_set(
        &mut self,
        _bind_point: PipelineBindPoint,
        _layout: &MockPipelineLayout,
        set: u32,
        writes: &[DescriptorWrite<MockGraphicsDevice>],
    ) {
        self.commands.push(MockCommand::PushDescriptorSet {
            set,
            writes: writes.iter().map(|w| (w.binding, w.array_element)).collect(),
        });
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, _first_vertex: u32, _first_instance: u32) {
        self.commands.push(MockCommand::Draw { vertex_count, instance_count });
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        _instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        _first_instance: u32,
    ) {
        self.commands.push(MockCommand::DrawIndexed { index_count, first_index, vertex_offset });
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.commands.push(MockCommand::Dispatch { x, y, z });
    }
}

// ============================================================================
// Mock Synchronization
// ============================================================================

pub struct MockFence {
    pub id: u64,
    pub signaled: AtomicBool,
}

pub struct MockSemaphore {
    pub id: u64,
}

// ============================================================================
// Mock Descriptors
// ============================================================================

pub struct MockDescriptorPool {
    pub id: u64,
    pub capacity: u32,
    pub allocated: AtomicU32,
    events: EventLog,
}

impl Drop for MockDescriptorPool {
    fn drop(&mut self) {
        log_event(&self.events, format!("destroy_pool:{}", self.id));
    }
}

pub struct MockDescriptorSetLayout {
    pub desc: DescriptorSetLayoutDesc,
}

pub struct MockDescriptorSet {
    pub pool: u64,
    pub index: u32,
}

// ============================================================================
// Mock Pipelines
// ============================================================================

pub struct MockPipelineLayout {
    pub set_layout_count: usize,
    pub push_constant: Option<PushConstantRange>,
}

pub struct MockPipelineCache {
    pub initial_data: Vec<u8>,
}

pub struct MockPipeline {
    pub id: u64,
    pub label: String,
    pub compute: bool,
    pub stage_count: usize,
    pub specialization_data: Vec<u8>,
    pub used_cache: bool,
}

pub struct MockRenderPass {
    pub desc: RenderPassDesc,
}

pub struct MockFramebuffer {
    pub extent: UVec2,
    pub attachment_count: usize,
}

// ============================================================================
// Mock Swapchain
// ============================================================================

pub struct MockSwapchain {
    pub id: u64,
    pub desc: SwapchainDesc,
    images: Vec<Arc<MockImage>>,
    next_image: AtomicU32,
    state: Arc<Mutex<MockDeviceState>>,
    events: EventLog,
}

impl SurfaceChain<MockGraphicsDevice> for MockSwapchain {
    fn images(&self) -> &[Arc<MockImage>] {
        &self.images
    }

    fn format(&self) -> SurfaceFormat {
        self.desc.format
    }

    fn extent(&self) -> UVec2 {
        self.desc.extent
    }

    fn acquire_next_image(&self, signal: &MockSemaphore) -> Result<AcquireOutcome> {
        let scripted = self.state.lock().unwrap().acquire_script.pop_front();
        let outcome = scripted.unwrap_or_else(|| {
            let index = self.next_image.fetch_add(1, Ordering::Relaxed) % self.images.len() as u32;
            AcquireOutcome::Image(index)
        });
        log_event(&self.events, format!("acquire:{:?}:sem{}", outcome, signal.id));
        Ok(outcome)
    }

    fn present(&self, image_index: u32, wait: &MockSemaphore) -> Result<PresentOutcome> {
        let outcome = self.state.lock().unwrap().present_script.pop_front().unwrap_or(PresentOutcome::Presented);
        log_event(&self.events, format!("present:{}:sem{}", image_index, wait.id));
        Ok(outcome)
    }
}

impl Drop for MockSwapchain {
    fn drop(&mut self) {
        log_event(&self.events, format!("destroy_swapchain:{}", self.id));
    }
}

// ============================================================================
// Mock Graphics Device
// ============================================================================

/// Scripted surface and counters shared by the device and its swapchains
pub struct MockDeviceState {
    pub capabilities: SurfaceCapabilities,
    pub formats: Vec<SurfaceFormat>,
    pub present_modes: Vec<PresentMode>,
    pub acquire_script: VecDeque<AcquireOutcome>,
    pub present_script: VecDeque<PresentOutcome>,
    pub swapchains_created: usize,
    pub last_swapchain: Option<SwapchainDesc>,
    pub buffers_created: usize,
    pub pools_created: usize,
    pub sets_allocated: usize,
    pub pipelines_created: usize,
    pub submits: usize,
    pub wait_idle_calls: usize,
    pub descriptor_writes: usize,
    /// Returned by `pipeline_cache_data`
    pub pipeline_cache_blob: Vec<u8>,
}

impl Default for MockDeviceState {
    fn default() -> Self {
        Self {
            capabilities: SurfaceCapabilities {
                min_image_count: 2,
                max_image_count: 4,
                min_extent: UVec2::new(1, 1),
                max_extent: UVec2::new(4096, 4096),
                current_extent: None,
            },
            formats: vec![
                SurfaceFormat { format: Format::R16G16B16A16_SFLOAT, color_space: ColorSpace::Other(1000104002) },
                SurfaceFormat { format: Format::B8G8R8A8_UNORM, color_space: ColorSpace::SrgbNonlinear },
            ],
            present_modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            swapchains_created: 0,
            last_swapchain: None,
            buffers_created: 0,
            pools_created: 0,
            sets_allocated: 0,
            pipelines_created: 0,
            submits: 0,
            wait_idle_calls: 0,
            descriptor_writes: 0,
            pipeline_cache_blob: b"mock pipeline cache".to_vec(),
        }
    }
}

/// Initial data that `create_pipeline_cache` rejects
pub const CORRUPT_CACHE: &[u8] = b"corrupt";

pub struct MockGraphicsDevice {
    features: FeatureSet,
    state: Arc<Mutex<MockDeviceState>>,
    events: EventLog,
}

impl MockGraphicsDevice {
    /// Device with every feature enabled
    pub fn new() -> Self {
        Self::with_features(FeatureSet::from_features([
            DeviceFeature::Swapchain,
            DeviceFeature::Maintenance3,
            DeviceFeature::PushDescriptor,
            DeviceFeature::DynamicRendering,
            DeviceFeature::DepthStencilResolve,
            DeviceFeature::CreateRenderPass2,
            DeviceFeature::DescriptorIndexing,
        ]))
    }

    pub fn with_features(features: FeatureSet) -> Self {
        Self {
            features,
            state: Arc::new(Mutex::new(MockDeviceState::default())),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Same device without one feature
    pub fn without_feature(self, feature: DeviceFeature) -> Self {
        let features = FeatureSet::from_features(self.features.iter().filter(|f| *f != feature));
        Self { features, ..self }
    }

    pub fn state(&self) -> MutexGuard<'_, MockDeviceState> {
        self.state.lock().unwrap()
    }

    pub fn events(&self) -> EventLog {
        self.events.clone()
    }

    pub fn event_list(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    type Buffer = MockBuffer;
    type Image = MockImage;
    type Sampler = MockSampler;
    type Encoder = MockEncoder;
    type Fence = MockFence;
    type Semaphore = MockSemaphore;
    type DescriptorPool = MockDescriptorPool;
    type DescriptorSetLayout = MockDescriptorSetLayout;
    type DescriptorSet = MockDescriptorSet;
    type PipelineLayout = MockPipelineLayout;
    type PipelineCache = MockPipelineCache;
    type Pipeline = MockPipeline;
    type RenderPass = MockRenderPass;
    type Framebuffer = MockFramebuffer;
    type Swapchain = MockSwapchain;

    fn features(&self) -> &FeatureSet {
        &self.features
    }

    fn create_buffer(&self, desc: &BufferDesc) -> Result<MockBuffer> {
        if desc.size == 0 {
            return Err(Error::ResourceCreationFailure(format!("buffer '{}' has size 0", desc.label)));
        }
        self.state().buffers_created += 1;
        Ok(MockBuffer {
            desc: desc.clone(),
            data: Arc::new(Mutex::new(vec![0u8; desc.size as usize])),
            events: self.events.clone(),
        })
    }

    fn create_image(&self, desc: &ImageDesc) -> Result<MockImage> {
        desc.validate()?;
        Ok(MockImage::new(desc.clone(), false, self.events.clone()))
    }

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<MockSampler> {
        Ok(MockSampler { desc: *desc })
    }

    fn create_encoder(&self) -> Result<MockEncoder> {
        Ok(MockEncoder { commands: Vec::new(), recording: false, one_time_submit: false, copies: Vec::new() })
    }

    fn submit(&self, encoder: &MockEncoder, sync: &SubmitSync<'_, Self>) -> Result<()> {
        if encoder.recording {
            return Err(Error::SynchronizationMisuse("encoder submitted while recording".to_string()));
        }
        for copy in &encoder.copies {
            let start = copy.region.src_offset as usize;
            let bytes = copy.src.lock().unwrap()[start..start + copy.region.size as usize].to_vec();
            let dst_start = copy.region.dst_offset as usize;
            copy.dst.lock().unwrap()[dst_start..dst_start + bytes.len()].copy_from_slice(&bytes);
        }
        if let Some(fence) = sync.fence {
            fence.signaled.store(true, Ordering::Release);
        }
        self.state().submits += 1;
        log_event(&self.events, format!(
            "submit:{}:wait{}:signal{}",
            encoder.commands.len(),
            sync.wait.map_or(0, |(s, _)| s.id),
            sync.signal.map_or(0, |s| s.id),
        ));
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        self.state().wait_idle_calls += 1;
        log_event(&self.events, "wait_idle");
        Ok(())
    }

    fn create_fence(&self, signaled: bool) -> Result<MockFence> {
        Ok(MockFence { id: next_id(), signaled: AtomicBool::new(signaled) })
    }

    fn wait_fence(&self, fence: &MockFence) -> Result<()> {
        log_event(&self.events, format!("wait_fence:{}", fence.id));
        if !fence.signaled.load(Ordering::Acquire) {
            return Err(Error::SynchronizationMisuse(format!("fence {} would never signal", fence.id)));
        }
        Ok(())
    }

    fn reset_fence(&self, fence: &MockFence) -> Result<()> {
        fence.signaled.store(false, Ordering::Release);
        log_event(&self.events, format!("reset_fence:{}", fence.id));
        Ok(())
    }

    fn create_semaphore(&self) -> Result<MockSemaphore> {
        Ok(MockSemaphore { id: next_id() })
    }

    fn create_descriptor_pool(&self, _sizes: &[DescriptorPoolSize], max_sets: u32) -> Result<MockDescriptorPool> {
        self.state().pools_created += 1;
        Ok(MockDescriptorPool {
            id: next_id(),
            capacity: max_sets,
            allocated: AtomicU32::new(0),
            events: self.events.clone(),
        })
    }

    fn allocate_descriptor_set(
        &self,
        pool: &MockDescriptorPool,
        _layout: &MockDescriptorSetLayout,
    ) -> std::result::Result<MockDescriptorSet, PoolAllocError> {
        let index = pool.allocated.load(Ordering::Relaxed);
        if index >= pool.capacity {
            return Err(PoolAllocError::OutOfPoolMemory);
        }
        pool.allocated.store(index + 1, Ordering::Relaxed);
        self.state().sets_allocated += 1;
        Ok(MockDescriptorSet { pool: pool.id, index })
    }

    fn reset_descriptor_pool(&self, pool: &MockDescriptorPool) -> Result<()> {
        pool.allocated.store(0, Ordering::Relaxed);
        log_event(&self.events, format!("reset_pool:{}", pool.id));
        Ok(())
    }

    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<MockDescriptorSetLayout> {
        Ok(MockDescriptorSetLayout { desc: desc.clone() })
    }

    fn write_descriptor_set(&self, _set: &MockDescriptorSet, writes: &[DescriptorWrite<Self>]) -> Result<()> {
        for write in writes {
            if let DescriptorResource::Image { sampler: None, .. } = write.resource {
                if write.ty == crate::descriptor::DescriptorType::CombinedImageSampler {
                    return Err(Error::InvalidResource("combined image sampler without sampler".to_string()));
                }
            }
        }
        self.state().descriptor_writes += writes.len();
        Ok(())
    }

    fn create_pipeline_layout(
        &self,
        set_layouts: &[&MockDescriptorSetLayout],
        push_constant: Option<&PushConstantRange>,
    ) -> Result<MockPipelineLayout> {
        Ok(MockPipelineLayout { set_layout_count: set_layouts.len(), push_constant: push_constant.copied() })
    }

    fn create_pipeline_cache(&self, initial_data: &[u8]) -> Result<MockPipelineCache> {
        if initial_data == CORRUPT_CACHE {
            return Err(Error::BackendError("pipeline cache header mismatch".to_string()));
        }
        Ok(MockPipelineCache { initial_data: initial_data.to_vec() })
    }

    fn pipeline_cache_data(&self, _cache: &MockPipelineCache) -> Result<Vec<u8>> {
        Ok(self.state().pipeline_cache_blob.clone())
    }

    fn create_pipeline(&self, desc: &PipelineDesc<'_, Self>) -> Result<MockPipeline> {
        self.state().pipelines_created += 1;
        Ok(MockPipeline {
            id: next_id(),
            label: desc.label.to_string(),
            compute: matches!(desc.kind, PipelineKind::Compute),
            stage_count: desc.stages.len(),
            specialization_data: desc.specialization.map(|s| s.data.clone()).unwrap_or_default(),
            used_cache: desc.cache.is_some(),
        })
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<MockRenderPass> {
        Ok(MockRenderPass { desc: desc.clone() })
    }

    fn create_framebuffer(
        &self,
        _render_pass: &MockRenderPass,
        attachments: &[&MockImage],
        extent: UVec2,
    ) -> Result<MockFramebuffer> {
        Ok(MockFramebuffer { extent, attachment_count: attachments.len() })
    }

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities> {
        Ok(self.state().capabilities)
    }

    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>> {
        Ok(self.state().formats.clone())
    }

    fn present_modes(&self) -> Result<Vec<PresentMode>> {
        Ok(self.state().present_modes.clone())
    }

    fn create_swapchain(&self, desc: &SwapchainDesc, old: Option<&MockSwapchain>) -> Result<MockSwapchain> {
        {
            let mut state = self.state();
            state.swapchains_created += 1;
            state.last_swapchain = Some(*desc);
        }
        let id = next_id();
        log_event(&self.events, format!("create_swapchain:{}:old{}", id, old.map_or(0, |o| o.id)));
        let images = (0..desc.image_count)
            .map(|i| {
                let image_desc = ImageDesc::texture_2d(
                    desc.extent.x, desc.extent.y, desc.format.format, ImageUsage::COLOR_ATTACHMENT,
                )
                .with_label(format!("surface {}", i));
                Arc::new(MockImage::new(image_desc, true, self.events.clone()))
            })
            .collect();
        Ok(MockSwapchain {
            id,
            desc: *desc,
            images,
            next_image: AtomicU32::new(0),
            state: self.state.clone(),
            events: self.events.clone(),
        })
    }
}

// ============================================================================
// Mock Window
// ============================================================================

/// Window that stays minimized for a number of event waits
pub struct MockWindow {
    pub size: UVec2,
    pub minimized_polls: u32,
    pub focused: bool,
    pub resized: bool,
    pub wait_events_calls: u32,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self { size: UVec2::new(width, height), minimized_polls: 0, focused: true, resized: false, wait_events_calls: 0 }
    }
}

impl WindowState for MockWindow {
    fn framebuffer_size(&self) -> UVec2 {
        if self.minimized_polls > 0 { UVec2::ZERO } else { self.size }
    }

    fn is_minimized(&self) -> bool {
        self.minimized_polls > 0
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn take_resized(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    fn wait_events(&mut self) {
        self.wait_events_calls += 1;
        self.minimized_polls = self.minimized_polls.saturating_sub(1);
        self.focused = true;
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
