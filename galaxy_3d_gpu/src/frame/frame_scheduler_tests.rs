//! Unit tests for FrameScheduler and the surface selection rules

use std::sync::Arc;
use glam::UVec2;
use crate::config::PresentPreference;
use crate::frame::{
    choose_extent, select_frame_count, select_image_count, select_present_mode,
    select_surface_format, FrameScheduler,
};
use crate::galaxy3d::Error;
use crate::graphics_device::mock_graphics_device::{MockCommand, MockGraphicsDevice, MockWindow};
use crate::graphics_device::{
    AcquireOutcome, ColorSpace, Format, PresentMode, PresentOutcome, SurfaceCapabilities,
    SurfaceFormat,
};
use crate::test_support::{mock_context, mock_context_with, test_config, MockContext};

fn caps(min: u32, max: u32) -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: min,
        max_image_count: max,
        min_extent: UVec2::new(1, 1),
        max_extent: UVec2::new(4096, 4096),
        current_extent: None,
    }
}

fn scheduler(context: &MockContext) -> FrameScheduler<MockGraphicsDevice, MockWindow> {
    FrameScheduler::new(context.clone(), MockWindow::new(800, 600)).unwrap()
}

// ============================================================================
// SELECTION
// ============================================================================

#[test]
fn test_select_surface_format_prefers_srgb_rgba() {
    let hdr = SurfaceFormat { format: Format::R16G16B16A16_SFLOAT, color_space: ColorSpace::Other(7) };
    let bgra = SurfaceFormat { format: Format::B8G8R8A8_SRGB, color_space: ColorSpace::SrgbNonlinear };

    assert_eq!(select_surface_format(&[hdr, bgra]), Some(bgra));
    assert_eq!(select_surface_format(&[hdr]), Some(hdr));
    assert_eq!(select_surface_format(&[]), None);
}

#[test]
fn test_select_present_mode() {
    let all = [PresentMode::Fifo, PresentMode::Immediate, PresentMode::Mailbox];
    assert_eq!(select_present_mode(&all, PresentPreference::LowLatency), PresentMode::Mailbox);
    assert_eq!(select_present_mode(&[PresentMode::Fifo, PresentMode::Immediate], PresentPreference::LowLatency),
        PresentMode::Immediate);
    assert_eq!(select_present_mode(&[PresentMode::Fifo], PresentPreference::LowLatency), PresentMode::Fifo);
    assert_eq!(select_present_mode(&all, PresentPreference::VSync), PresentMode::Fifo);
}

#[test]
fn test_choose_extent() {
    let mut surface = caps(2, 3);
    assert_eq!(choose_extent(&surface, UVec2::new(800, 600)), UVec2::new(800, 600));
    assert_eq!(choose_extent(&surface, UVec2::new(9000, 0)), UVec2::new(4096, 1));

    surface.current_extent = Some(UVec2::new(640, 480));
    assert_eq!(choose_extent(&surface, UVec2::new(800, 600)), UVec2::new(640, 480));
}

#[test]
fn test_select_frame_count() {
    assert_eq!(select_frame_count(&caps(2, 4), 3), 3);
    assert_eq!(select_frame_count(&caps(2, 2), 3), 2);
    assert_eq!(select_frame_count(&caps(2, 0), 3), 3);
    assert_eq!(select_frame_count(&caps(1, 8), 1), 1);
    assert_eq!(select_frame_count(&caps(3, 3), 0), 1);
}

#[test]
fn test_select_image_count() {
    assert_eq!(select_image_count(&caps(2, 4), 3), 3);
    assert_eq!(select_image_count(&caps(3, 4), 2), 3);
    assert_eq!(select_image_count(&caps(2, 2), 3), 2);
    assert_eq!(select_image_count(&caps(2, 0), 5), 5);
}

// ============================================================================
// CREATION
// ============================================================================

#[test]
fn test_scheduler_new() {
    let context = mock_context();
    let frames = scheduler(&context);

    assert_eq!(frames.frame_count(), 3);
    assert_eq!(frames.current_frame(), 0);
    assert_eq!(frames.image_index(), None);
    assert_eq!(frames.extent(), UVec2::new(800, 600));
    assert_eq!(frames.format().format, Format::B8G8R8A8_UNORM);
    assert_eq!(frames.present_mode(), PresentMode::Mailbox);
    assert_eq!(context.device().state().last_swapchain.unwrap().image_count, 3);
    assert_eq!(frames.rebuild_count(), 0);
}

#[test]
fn test_scheduler_uses_context_frame_count() {
    let device = MockGraphicsDevice::new();
    device.state().capabilities.min_image_count = 2;
    device.state().capabilities.max_image_count = 2;
    let context = mock_context_with(device, test_config());
    let frames = scheduler(&context);

    assert_eq!(frames.frame_count(), 2);
    assert_eq!(frames.frame_count(), context.frames_in_flight());
    assert_eq!(context.device().state().last_swapchain.unwrap().image_count, 2);
}

#[test]
fn test_scheduler_new_without_formats() {
    let context = mock_context();
    context.device().state().formats.clear();
    let result = FrameScheduler::new(context.clone(), MockWindow::new(8, 8));
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

// ============================================================================
// FRAME CYCLE
// ============================================================================

#[test]
fn test_frame_cycle_advances_modulo() {
    let context = mock_context();
    let mut frames = scheduler(&context);

    let mut visited = Vec::new();
    for _ in 0..4 {
        frames.acquire_next_image().unwrap();
        frames.begin_render_pass([0.0, 0.0, 0.0, 1.0]).unwrap();
        frames.end_render_pass().unwrap();
        frames.swap_image().unwrap();
        visited.push(frames.current_frame());
    }

    assert_eq!(visited, vec![1, 2, 0, 1]);
    assert_eq!(context.device().state().submits, 4);
    let presents: Vec<String> = context.device().event_list().into_iter()
        .filter(|e| e.starts_with("present:"))
        .map(|e| e.split(':').nth(1).unwrap_or_default().to_string())
        .collect();
    assert_eq!(presents, vec!["0", "1", "2", "0"]);
}

#[test]
fn test_acquire_twice_is_misuse() {
    let context = mock_context();
    let mut frames = scheduler(&context);
    frames.acquire_next_image().unwrap();
    assert!(matches!(frames.acquire_next_image(), Err(Error::SynchronizationMisuse(_))));
}

#[test]
fn test_swap_without_acquire_is_misuse() {
    let context = mock_context();
    let mut frames = scheduler(&context);
    assert!(matches!(frames.swap_image(), Err(Error::SynchronizationMisuse(_))));
    assert!(frames.begin_render_pass([0.0; 4]).is_err());
}

#[test]
fn test_render_pass_sets_viewport_and_scissor() {
    let context = mock_context();
    let mut frames = scheduler(&context);
    frames.acquire_next_image().unwrap();
    frames.begin_render_pass([0.1, 0.2, 0.3, 1.0]).unwrap();

    let encoder = frames.frame_recorder().encoder();
    assert!(matches!(encoder.commands[0], MockCommand::BeginRenderPass { extent, .. } if extent == UVec2::new(800, 600)));
    assert_eq!(encoder.count(|c| matches!(c, MockCommand::SetViewport(_))), 1);
    assert_eq!(encoder.count(|c| matches!(c, MockCommand::SetScissor(_))), 1);
}

#[test]
fn test_image_reuse_waits_previous_slot() {
    let context = mock_context();
    let mut frames = scheduler(&context);

    frames.acquire_next_image().unwrap();
    let slot0_wait = context.device().event_list()
        .into_iter()
        .find(|e| e.starts_with("wait_fence:"))
        .unwrap();
    frames.swap_image().unwrap();

    context.device().state().acquire_script.push_back(AcquireOutcome::Image(0));
    assert_eq!(frames.acquire_next_image().unwrap(), 0);
    context.device().clear_events();
    frames.swap_image().unwrap();

    assert!(context.device().event_list().contains(&slot0_wait));
}

// ============================================================================
// FRAME BUFFERS
// ============================================================================

#[test]
fn test_frame_buffers_writable_after_fence_wait() {
    let context = mock_context();
    let mut frames = scheduler(&context);

    assert!(matches!(frames.write_frame_uniform(0, &[1; 4]), Err(Error::SynchronizationMisuse(_))));

    frames.acquire_next_image().unwrap();
    frames.write_frame_uniform(0, &[1u8; 4]).unwrap();
    frames.write_frame_storage(8, &[2; 4]).unwrap();
    assert_eq!(&frames.frame_uniform_buffer().contents()[..4], &[1u8; 4]);
    assert_eq!(&frames.frame_storage_buffer().contents()[8..12], &[2u8; 4]);

    frames.swap_image().unwrap();
    assert!(frames.write_frame_storage(0, &[0; 4]).is_err());
}

// ============================================================================
// REBUILD
// ============================================================================

#[test]
fn test_stale_acquire_rebuilds_then_acquires() {
    let context = mock_context();
    let mut frames = scheduler(&context);
    context.device().state().acquire_script.push_back(AcquireOutcome::Stale);

    assert_eq!(frames.acquire_next_image().unwrap(), 0);
    assert_eq!(frames.rebuild_count(), 1);
    assert_eq!(context.device().state().swapchains_created, 2);
    assert!(context.device().event_list().iter().any(|e| e.starts_with("create_swapchain:") && !e.ends_with(":old0")));
}

#[test]
fn test_minimized_window_blocks_rebuild() {
    let context = mock_context();
    let mut frames = scheduler(&context);
    frames.window_mut().minimized_polls = 3;
    context.device().state().acquire_script.push_back(AcquireOutcome::Stale);

    frames.acquire_next_image().unwrap();

    assert_eq!(frames.window().wait_events_calls, 3);
    assert_eq!(frames.rebuild_count(), 1);
    assert_eq!(frames.extent(), UVec2::new(800, 600));
}

#[test]
fn test_unfocused_window_waits_for_focus() {
    let context = mock_context();
    let mut frames = scheduler(&context);
    frames.window_mut().focused = false;

    frames.rebuild().unwrap();
    assert_eq!(frames.window().wait_events_calls, 1);
}

#[test]
fn test_stale_present_rebuilds_without_advancing() {
    let context = mock_context();
    let mut frames = scheduler(&context);
    context.device().state().present_script.push_back(PresentOutcome::Stale);

    frames.acquire_next_image().unwrap();
    frames.swap_image().unwrap();

    assert_eq!(frames.current_frame(), 0);
    assert_eq!(frames.rebuild_count(), 1);
    assert_eq!(frames.image_index(), None);
    assert!(frames.acquire_next_image().is_ok());
}

#[test]
fn test_resize_rebuilds_at_new_size() {
    let context = mock_context();
    let mut frames = scheduler(&context);

    frames.acquire_next_image().unwrap();
    frames.window_mut().size = UVec2::new(1024, 768);
    frames.window_mut().resized = true;
    frames.swap_image().unwrap();

    assert_eq!(frames.rebuild_count(), 1);
    assert_eq!(frames.extent(), UVec2::new(1024, 768));
    assert_eq!(frames.current_frame(), 0);
}

#[test]
fn test_rebuild_recreates_render_pass_on_format_change() {
    let context = mock_context();
    let mut frames = scheduler(&context);
    let before = frames.render_pass().clone();

    frames.rebuild().unwrap();
    assert!(Arc::ptr_eq(&before, frames.render_pass()));

    context.device().state().formats =
        vec![SurfaceFormat { format: Format::R8G8B8A8_SRGB, color_space: ColorSpace::SrgbNonlinear }];
    frames.rebuild().unwrap();
    assert!(!Arc::ptr_eq(&before, frames.render_pass()));
    assert_eq!(frames.format().format, Format::R8G8B8A8_SRGB);
}

#[test]
fn test_drop_waits_idle() {
    let context = mock_context();
    let frames = scheduler(&context);
    let idle_before = context.device().state().wait_idle_calls;
    drop(frames);
    assert_eq!(context.device().state().wait_idle_calls, idle_before + 1);
}
