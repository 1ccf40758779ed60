//! Integration tests for the Vulkan backend
//!
//! Every test opens a hidden window and a real device, so all of them need a
//! GPU and are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_device_tests -- --ignored

use galaxy_3d_gpu::galaxy3d::gpu::{
    AccessFlags, ArenaAllocator, BufferDesc, BufferUsage, CommandRecorder, DescriptorSetLayoutDesc, DescriptorSetLayoutFlags,
    DescriptorType, Format, FrameScheduler, GpuBuffer, GpuConfig, GpuImage, GraphicsContext, GraphicsDevice,
    DeviceFeature, ImageDesc, ImageLayout, ImageUsage, PipelineStages, SamplerDesc, ShaderStages,
};
use galaxy_3d_gpu::galaxy3d::Error;
use galaxy_3d_gpu_vulkan::{VulkanDevice, WinitWindowState};
use serial_test::serial;
use std::sync::Arc;
use winit::event_loop::EventLoop;
use winit::window::Window;

/// Hidden window for the device surface
#[allow(deprecated)]
fn create_test_window() -> (Arc<Window>, EventLoop<()>) {
    let event_loop = EventLoop::new().unwrap();
    let window_attrs = Window::default_attributes()
        .with_title("Galaxy3D GPU Test")
        .with_inner_size(winit::dpi::LogicalSize::new(800, 600))
        .with_visible(false);
    let window = event_loop.create_window(window_attrs).unwrap();
    (Arc::new(window), event_loop)
}

fn create_context(window: &Window) -> Arc<GraphicsContext<VulkanDevice>> {
    let config = GpuConfig::default();
    let device = VulkanDevice::new(window, &config).unwrap();
    GraphicsContext::new(device, config).unwrap()
}

// ============================================================================
// DEVICE TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_device_creation_enables_swapchain() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);

    assert!(context.features().is_enabled(DeviceFeature::Swapchain));
    assert!(!context.device().device_name().is_empty());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_best_depth_format_and_samples() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);

    let depth = context.device().best_depth_format().unwrap();
    assert!(depth == Format::D32_SFLOAT || depth == Format::D16_UNORM);
    assert!(context.device().max_sample_count() >= 1);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_surface_queries() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);
    let device = context.device();

    let caps = device.surface_capabilities().unwrap();
    assert!(caps.min_image_count >= 1);
    assert!(!device.surface_formats().unwrap().is_empty());
    // FIFO is always supported
    assert!(!device.present_modes().unwrap().is_empty());
}

// ============================================================================
// MEMORY TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_host_buffer_write_read() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);

    let buffer = context
        .create_buffer(&BufferDesc::host(64, BufferUsage::UNIFORM, "test uniform"))
        .unwrap();
    buffer.write_mapped(16, &[1, 2, 3, 4]).unwrap();

    assert_eq!(buffer.read_mapped(16, 4).unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(buffer.read_mapped(0, 4).unwrap(), vec![0, 0, 0, 0]);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_host_buffer_out_of_range_write_fails() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);

    let buffer = context
        .create_buffer(&BufferDesc::host(16, BufferUsage::STORAGE, "small"))
        .unwrap();
    assert!(buffer.write_mapped(12, &[0u8; 8]).is_err());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_device_local_buffer_is_not_mapped() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);

    let buffer = context
        .create_buffer(&BufferDesc::device_local(256, BufferUsage::VERTEX | BufferUsage::TRANSFER_DST, "vertices"))
        .unwrap();
    assert!(buffer.write_mapped(0, &[1]).is_err());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_cube_image() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);

    let desc = ImageDesc::cube(64, Format::R8G8B8A8_UNORM, ImageUsage::SAMPLED | ImageUsage::TRANSFER_DST)
        .with_label("sky");
    let image = context.device().create_image(&desc).unwrap();

    assert_eq!(image.desc().array_layers, 6);
    assert_eq!(image.layout(), ImageLayout::Undefined);
    assert!(!image.is_surface_owned());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_sampler() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);

    let sampler = context.device().create_sampler(&SamplerDesc::linear_repeat()).unwrap();
    assert_eq!(sampler.desc().mag_filter, SamplerDesc::linear_repeat().mag_filter);
}

// ============================================================================
// RECORDING TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_upload_and_generate_mipmaps() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);
    let device = context.device();

    let desc = ImageDesc::texture_2d(
        16,
        16,
        Format::R8G8B8A8_UNORM,
        ImageUsage::SAMPLED | ImageUsage::TRANSFER_SRC | ImageUsage::TRANSFER_DST,
    )
    .with_mip_levels(5);
    let image = Arc::new(device.create_image(&desc).unwrap());
    let staging = context
        .create_buffer(&BufferDesc::host(16 * 16 * 4, BufferUsage::TRANSFER_SRC, "staging"))
        .unwrap();
    staging.write_mapped(0, &[255u8; 16 * 16 * 4]).unwrap();

    let mut recorder = CommandRecorder::new(device, "upload").unwrap();
    recorder.begin().unwrap();
    recorder
        .synchronize_image_usage(
            &image,
            PipelineStages::TOP_OF_PIPE,
            PipelineStages::TRANSFER,
            AccessFlags::empty(),
            AccessFlags::TRANSFER_WRITE,
            Some(ImageLayout::TransferDst),
        )
        .unwrap();
    recorder.copy_buffer_to_image(&staging, &image, 0, 0, 1).unwrap();
    recorder.generate_mipmaps(&image).unwrap();
    recorder.destroy_buffer_after_execution(staging);
    context.submit_and_wait(&mut [&mut recorder]).unwrap();

    assert_eq!(recorder.retired_count(), 0);
    assert_eq!(image.layout(), ImageLayout::ShaderReadOnly);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_arena_register_mesh() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);

    let mut arena: ArenaAllocator<VulkanDevice, [f32; 3]> = ArenaAllocator::new(context.clone()).unwrap();
    let mut recorder = CommandRecorder::new(context.device(), "arena").unwrap();
    recorder.begin().unwrap();

    let vertices = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let (first, _) = arena.register_mesh(&mut recorder, &vertices, &[0, 1, 2]).unwrap();
    let (_, second) = arena.register_mesh(&mut recorder, &vertices, &[0, 2, 1]).unwrap();
    context.submit_and_wait(&mut [&mut recorder]).unwrap();

    assert_eq!(arena.mesh(first).unwrap().vertex_offset, 0);
    assert_eq!(second.vertex_offset, 3);
    assert_eq!(second.index_offset, 3);
}

// ============================================================================
// DESCRIPTOR TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_allocate_many_descriptor_sets() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);

    let layout_desc = DescriptorSetLayoutDesc::new(DescriptorSetLayoutFlags::empty())
        .with_binding(0, DescriptorType::UniformBuffer, 1, ShaderStages::VERTEX);
    let layout = context.device().create_descriptor_set_layout(&layout_desc).unwrap();

    // More sets than one pool holds
    let sets: Vec<_> = (0..2048)
        .map(|_| context.allocate_descriptor_set(&layout).unwrap())
        .collect();
    assert_eq!(sets.len(), 2048);

    context.reset_descriptor_pools().unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_push_descriptor_layout_follows_feature() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);

    let layout_desc = DescriptorSetLayoutDesc::new(DescriptorSetLayoutFlags::PUSH_DESCRIPTOR)
        .with_binding(0, DescriptorType::UniformBuffer, 1, ShaderStages::VERTEX);
    let result = context.device().create_descriptor_set_layout(&layout_desc);

    if context.features().is_enabled(DeviceFeature::PushDescriptor) {
        assert!(result.is_ok());
    } else {
        assert!(matches!(result, Err(Error::CapabilityUnsupported(_))));
    }
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_frames_in_flight_shared_with_scheduler() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);
    let scheduler = FrameScheduler::new(context.clone(), WinitWindowState::new(window.clone())).unwrap();

    assert_eq!(scheduler.frame_count(), context.frames_in_flight());
}

// ============================================================================
// FRAME TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_frame_cycle() {
    let (window, _event_loop) = create_test_window();
    let context = create_context(&window);
    let mut scheduler = FrameScheduler::new(context.clone(), WinitWindowState::new(window.clone())).unwrap();

    for _ in 0..4 {
        scheduler.acquire_next_image().unwrap();
        scheduler.begin_render_pass([0.1, 0.2, 0.3, 1.0]).unwrap();
        scheduler.end_render_pass().unwrap();
        scheduler.swap_image().unwrap();
    }

    assert!(scheduler.frame_count() >= 1);
    context.device().wait_idle().unwrap();
}
