/// winit-backed window state for the frame scheduler

use glam::UVec2;
use std::sync::Arc;
use std::time::Duration;
use winit::event::WindowEvent;
use winit::window::Window;

use galaxy_3d_gpu::galaxy3d::gpu::WindowState;
use galaxy_3d_gpu::engine_trace;

/// Poll interval while the scheduler waits for the window to become presentable
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Window state read from a winit window
///
/// The application forwards its window events through `handle_window_event`
/// (usually via `FrameScheduler::window_mut`). Size, focus and minimization are
/// read from the window itself, so they stay current even while the scheduler
/// blocks outside the event loop.
pub struct WinitWindowState {
    window: Arc<Window>,
    resized: bool,
    focused: bool,
}

impl WinitWindowState {
    pub fn new(window: Arc<Window>) -> Self {
        let focused = window.has_focus();
        Self { window, resized: false, focused }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::Resized(size) => {
                engine_trace!("galaxy3d::vulkan::Window", "Resized to {}x{}", size.width, size.height);
                self.resized = true;
            }
            WindowEvent::ScaleFactorChanged { .. } => self.resized = true,
            WindowEvent::Focused(focused) => self.focused = *focused,
            _ => {}
        }
    }
}

impl WindowState for WinitWindowState {
    fn framebuffer_size(&self) -> UVec2 {
        let size = self.window.inner_size();
        UVec2::new(size.width, size.height)
    }

    fn is_minimized(&self) -> bool {
        self.window.is_minimized().unwrap_or(false)
    }

    fn is_focused(&self) -> bool {
        self.focused || self.window.has_focus()
    }

    fn take_resized(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    // winit delivers events only inside its event loop; poll the window instead
    fn wait_events(&mut self) {
        std::thread::sleep(WAIT_POLL_INTERVAL);
    }
}
