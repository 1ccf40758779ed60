/*!
# Galaxy 3D GPU - Vulkan Backend

Vulkan implementation of the `galaxy_3d_gpu` device seam.

[`VulkanDevice`] implements `GraphicsDevice` using Ash for the Vulkan bindings,
gpu-allocator for memory, ash-window for the window surface and spirq for
SPIR-V reflection. [`WinitWindowState`] feeds a winit window to the frame
scheduler.

# Example

```no_run
use galaxy_3d_gpu::galaxy3d::gpu::{FrameScheduler, GpuConfig, GraphicsContext};
use galaxy_3d_gpu_vulkan::{VulkanDevice, WinitWindowState};
use std::sync::Arc;
# fn run(window: Arc<winit::window::Window>) -> galaxy_3d_gpu::galaxy3d::Result<()> {
let config = GpuConfig::default();
let device = VulkanDevice::new(&*window, &config)?;
let context = GraphicsContext::new(device, config)?;
let scheduler = FrameScheduler::new(context, WinitWindowState::new(window))?;
# Ok(())
# }
```
*/

mod debug;
mod vulkan_context;
mod vulkan_convert;
mod vulkan_buffer;
mod vulkan_image;
mod vulkan_sampler;
mod vulkan_sync;
mod vulkan_command_encoder;
mod vulkan_descriptor;
mod vulkan_pipeline;
mod vulkan_render_pass;
mod vulkan_swapchain;
mod vulkan_reflection;
mod vulkan_device;
mod window;

pub use vulkan_device::VulkanDevice;
pub use window::WinitWindowState;
pub use vulkan_reflection::reflect_shader;

// Backend handle types, as named by `GraphicsDevice`'s associated types
pub use vulkan_buffer::VulkanBuffer;
pub use vulkan_image::VulkanImage;
pub use vulkan_sampler::VulkanSampler;
pub use vulkan_sync::{VulkanFence, VulkanSemaphore};
pub use vulkan_command_encoder::VulkanEncoder;
pub use vulkan_descriptor::{VulkanDescriptorPool, VulkanDescriptorSet, VulkanDescriptorSetLayout};
pub use vulkan_pipeline::{VulkanPipeline, VulkanPipelineCache, VulkanPipelineLayout};
pub use vulkan_render_pass::{VulkanFramebuffer, VulkanRenderPass};
pub use vulkan_swapchain::VulkanSwapchain;

// Re-export debug utilities
pub use debug::{get_validation_stats, print_validation_stats_report};
