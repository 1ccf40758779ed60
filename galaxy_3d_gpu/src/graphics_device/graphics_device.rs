/// GraphicsDevice trait - the backend seam
///
/// Core components are generic over a device. Every associated handle type
/// releases its native object in `Drop`, so destroying a resource means
/// dropping its last owner.

use glam::UVec2;
use crate::error::Result;
use crate::descriptor::{DescriptorPoolSize, DescriptorSetLayoutDesc, DescriptorWrite, PoolAllocError};
use crate::features::FeatureSet;
use crate::graphics_device::{
    CommandEncoder, PipelineStages, PresentMode, RenderPassDesc, SurfaceCapabilities,
    SurfaceChain, SurfaceFormat,
};
use crate::memory::{BufferDesc, GpuBuffer, GpuImage, ImageDesc, SamplerDesc};
use crate::pipeline::{PipelineDesc, PushConstantRange};

/// Semaphores and fence attached to one queue submission
pub struct SubmitSync<'a, D: GraphicsDevice> {
    /// Semaphore to wait on, and the stages that wait
    pub wait: Option<(&'a D::Semaphore, PipelineStages)>,
    pub signal: Option<&'a D::Semaphore>,
    pub fence: Option<&'a D::Fence>,
}

impl<'a, D: GraphicsDevice> SubmitSync<'a, D> {
    /// No semaphores and no fence
    pub fn none() -> Self {
        Self { wait: None, signal: None, fence: None }
    }
}

/// Parameters of a surface chain (swapchain)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainDesc {
    pub image_count: u32,
    pub format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub extent: UVec2,
}

/// Graphics device
///
/// One logical device with a single graphics queue that also presents.
pub trait GraphicsDevice: Send + Sync + Sized + 'static {
    type Buffer: GpuBuffer;
    type Image: GpuImage;
    type Sampler: Send + Sync;
    type Encoder: CommandEncoder<Self>;
    type Fence: Send + Sync;
    type Semaphore: Send + Sync;
    type DescriptorPool: Send + Sync;
    type DescriptorSetLayout: Send + Sync;
    type DescriptorSet: Send + Sync;
    type PipelineLayout: Send + Sync;
    type PipelineCache: Send + Sync;
    type Pipeline: Send + Sync;
    type RenderPass: Send + Sync;
    type Framebuffer: Send + Sync;
    type Swapchain: SurfaceChain<Self>;

    /// Extensions and features enabled at device creation
    fn features(&self) -> &FeatureSet;

    // ===== RESOURCES =====

    fn create_buffer(&self, desc: &BufferDesc) -> Result<Self::Buffer>;

    /// Create an image and a view covering all its mip levels and layers
    fn create_image(&self, desc: &ImageDesc) -> Result<Self::Image>;

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Self::Sampler>;

    // ===== SUBMISSION =====

    fn create_encoder(&self) -> Result<Self::Encoder>;

    fn submit(&self, encoder: &Self::Encoder, sync: &SubmitSync<'_, Self>) -> Result<()>;

    /// Block until the device has finished all submitted work
    fn wait_idle(&self) -> Result<()>;

    fn create_fence(&self, signaled: bool) -> Result<Self::Fence>;

    /// Block until the fence is signaled
    fn wait_fence(&self, fence: &Self::Fence) -> Result<()>;

    fn reset_fence(&self, fence: &Self::Fence) -> Result<()>;

    fn create_semaphore(&self) -> Result<Self::Semaphore>;

    // ===== DESCRIPTORS =====

    fn create_descriptor_pool(&self, sizes: &[DescriptorPoolSize], max_sets: u32) -> Result<Self::DescriptorPool>;

    /// Allocate one set; exhaustion and fragmentation are reported apart from other failures
    fn allocate_descriptor_set(
        &self,
        pool: &Self::DescriptorPool,
        layout: &Self::DescriptorSetLayout,
    ) -> std::result::Result<Self::DescriptorSet, PoolAllocError>;

    /// Return every set of the pool to it
    fn reset_descriptor_pool(&self, pool: &Self::DescriptorPool) -> Result<()>;

    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<Self::DescriptorSetLayout>;

    fn write_descriptor_set(&self, set: &Self::DescriptorSet, writes: &[DescriptorWrite<Self>]) -> Result<()>;

    // ===== PIPELINES =====

    fn create_pipeline_layout(
        &self,
        set_layouts: &[&Self::DescriptorSetLayout],
        push_constant: Option<&PushConstantRange>,
    ) -> Result<Self::PipelineLayout>;

    /// Create a pipeline cache seeded with driver data (empty for a fresh cache)
    fn create_pipeline_cache(&self, initial_data: &[u8]) -> Result<Self::PipelineCache>;

    fn pipeline_cache_data(&self, cache: &Self::PipelineCache) -> Result<Vec<u8>>;

    fn create_pipeline(&self, desc: &PipelineDesc<'_, Self>) -> Result<Self::Pipeline>;

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Self::RenderPass>;

    fn create_framebuffer(
        &self,
        render_pass: &Self::RenderPass,
        attachments: &[&Self::Image],
        extent: UVec2,
    ) -> Result<Self::Framebuffer>;

    // ===== SURFACE =====

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities>;

    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>>;

    fn present_modes(&self) -> Result<Vec<PresentMode>>;

    /// Create a surface chain, retiring `old` if given
    fn create_swapchain(&self, desc: &SwapchainDesc, old: Option<&Self::Swapchain>) -> Result<Self::Swapchain>;
}
