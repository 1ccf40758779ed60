/// VulkanDevice - Vulkan implementation of GraphicsDevice
///
/// Owns the instance, the window surface, one logical device with a graphics
/// queue (plus a present queue when the families differ) and the GPU
/// allocator, all through the shared `GpuContext`.

use ash::vk;
use glam::UVec2;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rustc_hash::FxHashSet;
use std::ffi::{CStr, CString};
use std::sync::Arc;

use galaxy_3d_gpu::galaxy3d::{Error, Result};
use galaxy_3d_gpu::galaxy3d::gpu::{
    default_feature_requests, resolve_features, BufferDesc, DescriptorPoolSize, DescriptorSetLayoutDesc,
    DescriptorWrite, DeviceFeature, FeatureRequest, FeatureSet, Format, GpuConfig, GraphicsDevice, ImageDesc,
    PipelineDesc, PoolAllocError, PresentMode, PushConstantRange, RenderPassDesc, SamplerDesc,
    SubmitSync, SurfaceCapabilities, SurfaceFormat, SwapchainDesc,
};
use galaxy_3d_gpu::{engine_debug, engine_err, engine_error, engine_info, engine_warn};

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_command_encoder::VulkanEncoder;
use crate::vulkan_context::{GpuContext, QueueInfo};
use crate::vulkan_convert;
use crate::vulkan_descriptor::{self, VulkanDescriptorPool, VulkanDescriptorSet, VulkanDescriptorSetLayout};
use crate::vulkan_image::VulkanImage;
use crate::vulkan_pipeline::{VulkanPipeline, VulkanPipelineCache, VulkanPipelineLayout};
use crate::vulkan_render_pass::{VulkanFramebuffer, VulkanRenderPass};
use crate::vulkan_sampler::VulkanSampler;
use crate::vulkan_swapchain::VulkanSwapchain;
use crate::vulkan_sync::{VulkanFence, VulkanSemaphore};

const PORTABILITY_ENUMERATION: &CStr = c"VK_KHR_portability_enumeration";

/// Feature structs chained onto device creation, one per enabled feature that needs one
enum FeatureStruct {
    DescriptorIndexing(vk::PhysicalDeviceDescriptorIndexingFeatures<'static>),
    DynamicRendering(vk::PhysicalDeviceDynamicRenderingFeatures<'static>),
}

pub struct VulkanDevice {
    ctx: Arc<GpuContext>,
    features: FeatureSet,
    device_name: String,
    limits: vk::PhysicalDeviceLimits,
    anisotropy_supported: bool,
}

impl VulkanDevice {
    /// Create a device presenting to `window` with the default feature requests
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &GpuConfig) -> Result<Self> {
        Self::with_feature_requests(window, config, &default_feature_requests())
    }

    pub fn with_feature_requests<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        config: &GpuConfig,
        requests: &[FeatureRequest],
    ) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            let validation = validation_enabled(config);

            // ===== INSTANCE =====

            let app_name = CString::new(config.application_name.as_str())
                .unwrap_or_else(|_| CString::from(c"Galaxy3D Application"));
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Galaxy3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle().map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to get required extensions: {}", e);
                    Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                })?
                .to_vec();

            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let mut instance_flags = vk::InstanceCreateFlags::empty();
            let instance_extensions = entry.enumerate_instance_extension_properties(None).unwrap_or_default();
            if instance_extensions
                .iter()
                .any(|p| p.extension_name_as_c_str().is_ok_and(|name| name == PORTABILITY_ENUMERATION))
            {
                extension_names.push(PORTABILITY_ENUMERATION.as_ptr());
                instance_flags |= vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
            }

            let layer_names = if validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .flags(instance_flags)
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            let (debug_utils_loader, debug_messenger) = if validation {
                create_debug_messenger(&entry, &instance, config)?
            } else {
                (None, None)
            };

            // ===== SURFACE =====

            let window_handle = window.window_handle().map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            // ===== PHYSICAL DEVICE =====

            let (physical_device, graphics_family, present_family) =
                pick_physical_device(&instance, &surface_loader, surface)?;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown device".to_string());
            engine_info!("galaxy3d::vulkan", "Using GPU '{}' ({:?})", device_name, properties.device_type);

            // ===== FEATURES =====

            let supported: FxHashSet<String> = instance
                .enumerate_device_extension_properties(physical_device)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to enumerate device extensions: {:?}", e))?
                .iter()
                .filter_map(|p| p.extension_name_as_c_str().ok())
                .map(|name| name.to_string_lossy().into_owned())
                .collect();

            let features = resolve_features(requests, |feature| supported.contains(feature.extension_name()))?;

            let device_extensions: Vec<CString> = features
                .iter()
                .filter_map(|feature| CString::new(feature.extension_name()).ok())
                .collect();
            let device_extension_ptrs: Vec<*const std::ffi::c_char> =
                device_extensions.iter().map(|name| name.as_ptr()).collect();

            let base_features = instance.get_physical_device_features(physical_device);
            let anisotropy_supported = base_features.sampler_anisotropy == vk::TRUE;
            let device_features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(anisotropy_supported);

            let mut feature_chain = feature_structs(&instance, physical_device, &features);

            // ===== LOGICAL DEVICE =====

            let queue_priorities = [1.0];
            let mut queue_create_infos = vec![vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family)
                .queue_priorities(&queue_priorities)];
            if present_family != graphics_family {
                queue_create_infos.push(
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_family)
                        .queue_priorities(&queue_priorities),
                );
            }

            let mut device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_ptrs)
                .enabled_features(&device_features);
            for feature_struct in feature_chain.iter_mut() {
                device_create_info = match feature_struct {
                    FeatureStruct::DescriptorIndexing(s) => device_create_info.push_next(s),
                    FeatureStruct::DynamicRendering(s) => device_create_info.push_next(s),
                };
            }

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let queues = QueueInfo {
                graphics_queue: device.get_device_queue(graphics_family, 0),
                graphics_family,
                present_queue: device.get_device_queue(present_family, 0),
                present_family,
            };

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            let ctx = Arc::new(GpuContext::new(
                entry,
                instance,
                physical_device,
                device,
                allocator,
                queues,
                surface,
                surface_loader,
                features.is_enabled(DeviceFeature::PushDescriptor),
                debug_utils_loader,
                debug_messenger,
            ));

            engine_debug!("galaxy3d::vulkan", "Device ready: graphics family {}, present family {}, features {:?}",
                graphics_family, present_family, features.iter().collect::<Vec<_>>());

            Ok(Self {
                ctx,
                features,
                device_name,
                limits: properties.limits,
                anisotropy_supported,
            })
        }
    }

    pub(crate) fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// First of D32_SFLOAT then D16_UNORM usable as an optimal-tiling depth attachment
    pub fn best_depth_format(&self) -> Result<Format> {
        for format in [Format::D32_SFLOAT, Format::D16_UNORM] {
            let properties = unsafe {
                self.ctx.instance.get_physical_device_format_properties(
                    self.ctx.physical_device,
                    vulkan_convert::format_to_vk(format),
                )
            };
            if properties
                .optimal_tiling_features
                .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
            {
                return Ok(format);
            }
        }
        engine_error!("galaxy3d::vulkan", "No supported depth format on '{}'", self.device_name);
        Err(Error::CapabilityUnsupported("depth attachment format".to_string()))
    }

    /// Highest sample count usable by both color and depth framebuffer attachments
    pub fn max_sample_count(&self) -> u32 {
        vulkan_convert::max_sample_count(
            self.limits.framebuffer_color_sample_counts & self.limits.framebuffer_depth_sample_counts,
        )
    }
}

fn validation_enabled(config: &GpuConfig) -> bool {
    if config.enable_validation && !cfg!(feature = "vulkan-validation") {
        engine_warn!("galaxy3d::vulkan", "Validation requested but the 'vulkan-validation' feature is off");
    }
    config.enable_validation && cfg!(feature = "vulkan-validation")
}

#[cfg(feature = "vulkan-validation")]
unsafe fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
    config: &GpuConfig,
) -> Result<(Option<ash::ext::debug_utils::Instance>, Option<vk::DebugUtilsMessengerEXT>)> {
    use galaxy_3d_gpu::galaxy3d::gpu::DebugSeverity;

    let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);

    crate::debug::init_debug_config(crate::debug::Config {
        severity: config.debug_severity,
        output: config.debug_output.clone(),
        message_filter: config.debug_message_filter,
        break_on_error: config.break_on_validation_error,
        panic_on_error: config.panic_on_error,
        enable_stats: config.enable_validation_stats,
    });

    let severity_flags = match config.debug_severity {
        DebugSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        DebugSeverity::ErrorsAndWarnings => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        }
        DebugSeverity::All => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
    };

    let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(severity_flags)
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

    let messenger = debug_utils.create_debug_utils_messenger(&debug_info, None).map_err(|e| {
        engine_error!("galaxy3d::vulkan", "Failed to create debug messenger: {:?}", e);
        Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
    })?;

    Ok((Some(debug_utils), Some(messenger)))
}

#[cfg(not(feature = "vulkan-validation"))]
unsafe fn create_debug_messenger(
    _entry: &ash::Entry,
    _instance: &ash::Instance,
    _config: &GpuConfig,
) -> Result<(Option<ash::ext::debug_utils::Instance>, Option<vk::DebugUtilsMessengerEXT>)> {
    Ok((None, None))
}

/// Pick a device with a graphics queue and a queue that presents to `surface`, discrete GPUs first
///
/// Returns the device with its graphics and present queue families.
unsafe fn pick_physical_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<(vk::PhysicalDevice, u32, u32)> {
    let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
        engine_error!("galaxy3d::vulkan", "Failed to enumerate physical devices: {:?}", e);
        Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
    })?;

    let mut candidates = Vec::new();
    for physical_device in physical_devices {
        let families = instance.get_physical_device_queue_family_properties(physical_device);
        let graphics = families
            .iter()
            .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
            .map(|i| i as u32);
        let presents = |i: u32| {
            surface_loader
                .get_physical_device_surface_support(physical_device, i, surface)
                .unwrap_or(false)
        };

        let Some(graphics) = graphics else { continue };
        // Same family for both when possible
        let present = if presents(graphics) {
            Some(graphics)
        } else {
            (0..families.len() as u32).find(|&i| presents(i))
        };
        let Some(present) = present else { continue };

        let device_type = instance.get_physical_device_properties(physical_device).device_type;
        let rank = match device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => 0,
            vk::PhysicalDeviceType::INTEGRATED_GPU => 1,
            _ => 2,
        };
        candidates.push((rank, physical_device, graphics, present));
    }

    candidates
        .into_iter()
        .min_by_key(|(rank, ..)| *rank)
        .map(|(_, physical_device, graphics, present)| (physical_device, graphics, present))
        .ok_or_else(|| {
            engine_error!("galaxy3d::vulkan", "No Vulkan GPU can render and present to this window");
            Error::InitializationFailed("No suitable Vulkan GPU found".to_string())
        })
}

/// Feature structs for the enabled features, limited to what the device reports
unsafe fn feature_structs(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    features: &FeatureSet,
) -> Vec<FeatureStruct> {
    let mut chain = Vec::new();

    if features.is_enabled(DeviceFeature::DescriptorIndexing) {
        let mut indexing = vk::PhysicalDeviceDescriptorIndexingFeatures::default();
        {
            let mut features2 = vk::PhysicalDeviceFeatures2::default().push_next(&mut indexing);
            instance.get_physical_device_features2(physical_device, &mut features2);
        }
        chain.push(FeatureStruct::DescriptorIndexing(
            vk::PhysicalDeviceDescriptorIndexingFeatures::default()
                .runtime_descriptor_array(indexing.runtime_descriptor_array == vk::TRUE)
                .descriptor_binding_partially_bound(indexing.descriptor_binding_partially_bound == vk::TRUE)
                .descriptor_binding_update_unused_while_pending(
                    indexing.descriptor_binding_update_unused_while_pending == vk::TRUE,
                )
                .descriptor_binding_sampled_image_update_after_bind(
                    indexing.descriptor_binding_sampled_image_update_after_bind == vk::TRUE,
                )
                .shader_sampled_image_array_non_uniform_indexing(
                    indexing.shader_sampled_image_array_non_uniform_indexing == vk::TRUE,
                ),
        ));
    }

    if features.is_enabled(DeviceFeature::DynamicRendering) {
        chain.push(FeatureStruct::DynamicRendering(
            vk::PhysicalDeviceDynamicRenderingFeatures::default().dynamic_rendering(true),
        ));
    }

    chain
}

impl GraphicsDevice for VulkanDevice {
    type Buffer = VulkanBuffer;
    type Image = VulkanImage;
    type Sampler = VulkanSampler;
    type Encoder = VulkanEncoder;
    type Fence = VulkanFence;
    type Semaphore = VulkanSemaphore;
    type DescriptorPool = VulkanDescriptorPool;
    type DescriptorSetLayout = VulkanDescriptorSetLayout;
    type DescriptorSet = VulkanDescriptorSet;
    type PipelineLayout = VulkanPipelineLayout;
    type PipelineCache = VulkanPipelineCache;
    type Pipeline = VulkanPipeline;
    type RenderPass = VulkanRenderPass;
    type Framebuffer = VulkanFramebuffer;
    type Swapchain = VulkanSwapchain;

    fn features(&self) -> &FeatureSet {
        &self.features
    }

    // ===== RESOURCES =====

    fn create_buffer(&self, desc: &BufferDesc) -> Result<VulkanBuffer> {
        VulkanBuffer::new(self.ctx.clone(), desc)
    }

    fn create_image(&self, desc: &ImageDesc) -> Result<VulkanImage> {
        VulkanImage::new(self.ctx.clone(), desc)
    }

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<VulkanSampler> {
        let mut desc = *desc;
        desc.anisotropy = match desc.anisotropy {
            Some(_) if !self.anisotropy_supported => {
                engine_warn!("galaxy3d::vulkan", "Sampler anisotropy unsupported on '{}', disabled", self.device_name);
                None
            }
            Some(level) => Some(level.clamp(1.0, self.limits.max_sampler_anisotropy)),
            None => None,
        };
        VulkanSampler::new(self.ctx.clone(), &desc)
    }

    // ===== COMMANDS =====

    fn create_encoder(&self) -> Result<VulkanEncoder> {
        VulkanEncoder::new(self.ctx.clone())
    }

    fn submit(&self, encoder: &VulkanEncoder, sync: &SubmitSync<'_, Self>) -> Result<()> {
        let command_buffers = [encoder.buffer];
        let (wait_semaphores, wait_stages): (Vec<vk::Semaphore>, Vec<vk::PipelineStageFlags>) = sync
            .wait
            .map(|(semaphore, stages)| (semaphore.semaphore, vulkan_convert::pipeline_stages_to_vk(stages)))
            .into_iter()
            .unzip();
        let signal_semaphores: Vec<vk::Semaphore> = sync.signal.map(|s| s.semaphore).into_iter().collect();
        let fence = sync.fence.map(|f| f.fence).unwrap_or_default();

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        let _queue = self.ctx.lock_queue()?;
        unsafe {
            self.ctx
                .device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], fence)
                .map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to submit command buffer: {:?}", e);
                    match e {
                        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY | vk::Result::ERROR_OUT_OF_HOST_MEMORY => {
                            Error::OutOfMemory
                        }
                        _ => Error::BackendError(format!("queue submit: {:?}", e)),
                    }
                })
        }
    }

    fn wait_idle(&self) -> Result<()> {
        let _queue = self.ctx.lock_queue()?;
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to wait for device idle: {:?}", e))
        }
    }

    fn create_fence(&self, signaled: bool) -> Result<VulkanFence> {
        VulkanFence::new(self.ctx.clone(), signaled)
    }

    fn wait_fence(&self, fence: &VulkanFence) -> Result<()> {
        fence.wait()
    }

    fn reset_fence(&self, fence: &VulkanFence) -> Result<()> {
        fence.reset()
    }

    fn create_semaphore(&self) -> Result<VulkanSemaphore> {
        VulkanSemaphore::new(self.ctx.clone())
    }

    // ===== DESCRIPTORS =====

    fn create_descriptor_pool(&self, sizes: &[DescriptorPoolSize], max_sets: u32) -> Result<VulkanDescriptorPool> {
        VulkanDescriptorPool::new(self.ctx.clone(), sizes, max_sets)
    }

    fn allocate_descriptor_set(
        &self,
        pool: &VulkanDescriptorPool,
        layout: &VulkanDescriptorSetLayout,
    ) -> std::result::Result<VulkanDescriptorSet, PoolAllocError> {
        pool.allocate(layout)
    }

    fn reset_descriptor_pool(&self, pool: &VulkanDescriptorPool) -> Result<()> {
        pool.reset()
    }

    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<VulkanDescriptorSetLayout> {
        VulkanDescriptorSetLayout::new(self, desc)
    }

    fn write_descriptor_set(&self, set: &VulkanDescriptorSet, writes: &[DescriptorWrite<Self>]) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        vulkan_descriptor::with_vk_writes(set.set, writes, |vk_writes| unsafe {
            self.ctx.device.update_descriptor_sets(vk_writes, &[]);
        });
        Ok(())
    }

    // ===== PIPELINES =====

    fn create_pipeline_layout(
        &self,
        set_layouts: &[&VulkanDescriptorSetLayout],
        push_constant: Option<&PushConstantRange>,
    ) -> Result<VulkanPipelineLayout> {
        VulkanPipelineLayout::new(self.ctx.clone(), set_layouts, push_constant)
    }

    fn create_pipeline_cache(&self, initial_data: &[u8]) -> Result<VulkanPipelineCache> {
        VulkanPipelineCache::new(self.ctx.clone(), initial_data)
    }

    fn pipeline_cache_data(&self, cache: &VulkanPipelineCache) -> Result<Vec<u8>> {
        cache.data()
    }

    fn create_pipeline(&self, desc: &PipelineDesc<'_, Self>) -> Result<VulkanPipeline> {
        VulkanPipeline::new(self.ctx.clone(), desc)
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<VulkanRenderPass> {
        VulkanRenderPass::new(self.ctx.clone(), desc)
    }

    fn create_framebuffer(
        &self,
        render_pass: &VulkanRenderPass,
        attachments: &[&VulkanImage],
        extent: UVec2,
    ) -> Result<VulkanFramebuffer> {
        VulkanFramebuffer::new(self.ctx.clone(), render_pass, attachments, extent)
    }

    // ===== SURFACE =====

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities> {
        let caps = unsafe {
            self.ctx
                .surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.ctx.surface)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to query surface capabilities: {:?}", e))?
        };
        // u32::MAX means the window decides the extent
        let current_extent = (caps.current_extent.width != u32::MAX)
            .then(|| UVec2::new(caps.current_extent.width, caps.current_extent.height));

        Ok(SurfaceCapabilities {
            min_image_count: caps.min_image_count,
            max_image_count: caps.max_image_count,
            min_extent: UVec2::new(caps.min_image_extent.width, caps.min_image_extent.height),
            max_extent: UVec2::new(caps.max_image_extent.width, caps.max_image_extent.height),
            current_extent,
        })
    }

    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>> {
        let formats = unsafe {
            self.ctx
                .surface_loader
                .get_physical_device_surface_formats(self.ctx.physical_device, self.ctx.surface)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to query surface formats: {:?}", e))?
        };
        Ok(formats
            .iter()
            .map(|f| SurfaceFormat {
                format: vulkan_convert::format_from_vk(f.format),
                color_space: vulkan_convert::color_space_from_vk(f.color_space),
            })
            .collect())
    }

    fn present_modes(&self) -> Result<Vec<PresentMode>> {
        let modes = unsafe {
            self.ctx
                .surface_loader
                .get_physical_device_surface_present_modes(self.ctx.physical_device, self.ctx.surface)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to query present modes: {:?}", e))?
        };
        Ok(modes.into_iter().filter_map(vulkan_convert::present_mode_from_vk).collect())
    }

    fn create_swapchain(&self, desc: &SwapchainDesc, old: Option<&VulkanSwapchain>) -> Result<VulkanSwapchain> {
        VulkanSwapchain::new(self.ctx.clone(), desc, old)
    }
}
