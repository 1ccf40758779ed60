/// GpuContext - Vulkan objects shared by every resource of a device
///
/// Each resource handle keeps an `Arc<GpuContext>`, so the device, allocator,
/// surface and instance are destroyed only after the last resource is gone.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard};

use galaxy_3d_gpu::galaxy3d::Result;
use galaxy_3d_gpu::engine_err;

/// Shared Vulkan context
pub struct GpuContext {
    pub(crate) _entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    /// Dropped before the device in `Drop`
    pub(crate) allocator: ManuallyDrop<Mutex<Allocator>>,

    pub(crate) graphics_queue: vk::Queue,
    pub(crate) graphics_queue_family: u32,
    pub(crate) present_queue: vk::Queue,
    pub(crate) present_queue_family: u32,
    /// Serializes queue submission and presentation
    queue_lock: Mutex<()>,

    /// Window surface, alive for the whole device lifetime
    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) surface_loader: ash::khr::surface::Instance,
    pub(crate) swapchain_loader: ash::khr::swapchain::Device,
    /// Loaded only when push descriptors were enabled
    pub(crate) push_descriptor_loader: Option<ash::khr::push_descriptor::Device>,

    pub(crate) debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    pub(crate) debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl GpuContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        allocator: Allocator,
        queues: QueueInfo,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
        push_descriptors: bool,
        debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
        debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    ) -> Self {
        let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);
        let push_descriptor_loader = if push_descriptors {
            Some(ash::khr::push_descriptor::Device::new(&instance, &device))
        } else {
            None
        };

        Self {
            _entry: entry,
            instance,
            physical_device,
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            graphics_queue: queues.graphics_queue,
            graphics_queue_family: queues.graphics_family,
            present_queue: queues.present_queue,
            present_queue_family: queues.present_family,
            queue_lock: Mutex::new(()),
            surface,
            surface_loader,
            swapchain_loader,
            push_descriptor_loader,
            debug_utils_loader,
            debug_messenger,
        }
    }

    pub(crate) fn allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| engine_err!("galaxy3d::vulkan", "GPU allocator mutex poisoned"))
    }

    pub(crate) fn lock_queue(&self) -> Result<MutexGuard<'_, ()>> {
        self.queue_lock
            .lock()
            .map_err(|_| engine_err!("galaxy3d::vulkan", "Queue mutex poisoned"))
    }

    /// Both queue families, deduplicated, for concurrent sharing
    pub(crate) fn queue_families(&self) -> Vec<u32> {
        if self.graphics_queue_family == self.present_queue_family {
            vec![self.graphics_queue_family]
        } else {
            vec![self.graphics_queue_family, self.present_queue_family]
        }
    }
}

/// Queues picked at device creation
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueueInfo {
    pub graphics_queue: vk::Queue,
    pub graphics_family: u32,
    pub present_queue: vk::Queue,
    pub present_family: u32,
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // Allocator pages must be freed while the device is alive
            ManuallyDrop::drop(&mut self.allocator);

            // No callbacks during destruction
            crate::debug::cleanup_debug_config();

            if let (Some(debug_utils), Some(messenger)) =
                (&self.debug_utils_loader, self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
            self.instance.destroy_instance(None);
        }
    }
}
