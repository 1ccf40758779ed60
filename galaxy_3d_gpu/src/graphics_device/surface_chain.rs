/// Surface chain (swapchain) trait

use std::sync::Arc;
use glam::UVec2;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, SurfaceFormat};

/// Result of an image acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Index of the acquired image (a suboptimal surface still counts)
    Image(u32),
    /// The surface no longer matches the window and must be rebuilt
    Stale,
}

/// Result of a presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    /// Out of date or suboptimal
    Stale,
}

/// Chain of presentable images owned by the window surface
pub trait SurfaceChain<D: GraphicsDevice>: Send + Sync {
    /// Surface-owned images, in chain order
    fn images(&self) -> &[Arc<D::Image>];

    fn format(&self) -> SurfaceFormat;

    fn extent(&self) -> UVec2;

    /// Acquire the next image, signaling `signal` when it is ready
    fn acquire_next_image(&self, signal: &D::Semaphore) -> Result<AcquireOutcome>;

    /// Queue `image_index` for presentation once `wait` is signaled
    fn present(&self, image_index: u32, wait: &D::Semaphore) -> Result<PresentOutcome>;
}
