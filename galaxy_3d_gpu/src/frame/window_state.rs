/// Window state queried by the frame scheduler

use glam::UVec2;

/// What the frame scheduler needs to know about the presenting window
pub trait WindowState {
    /// Framebuffer size in pixels
    fn framebuffer_size(&self) -> UVec2;

    fn is_minimized(&self) -> bool;

    fn is_focused(&self) -> bool;

    /// Whether the window was resized since the last call, clearing the flag
    fn take_resized(&mut self) -> bool;

    /// Block until the platform delivers more window events
    fn wait_events(&mut self);

    /// Whether a surface can be built for the window right now
    fn is_presentable(&self) -> bool {
        let size = self.framebuffer_size();
        !self.is_minimized() && self.is_focused() && size.x > 0 && size.y > 0
    }
}
