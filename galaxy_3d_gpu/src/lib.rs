/*!
# Galaxy 3D GPU

GPU resource and command-submission layer of the Galaxy 3D engine.

Every component is generic over a [`galaxy3d::gpu::GraphicsDevice`], the seam
implemented by backends (Vulkan in `galaxy_3d_gpu_vulkan`), and receives the
shared state through an explicit `Arc<GraphicsContext<D>>`.

## Architecture

- **Memory**: buffers and images owned by their creator, released on drop
- **CommandRecorder**: recording state machine with deferred destruction
- **DescriptorAllocator**: descriptor pools recycled per render cycle
- **PipelineLayoutBuilder / Pipeline**: layouts from explicit descriptions or shader reflection,
  bind by slot or by member name
- **FrameScheduler**: frames in flight and the acquire/submit/present protocol
- **ArenaAllocator**: growable vertex and index buffers shared by every mesh
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod features;
pub mod context;
pub mod graphics_device;
pub mod memory;
pub mod command;
pub mod descriptor;
pub mod pipeline;
pub mod frame;
pub mod arena;

#[cfg(test)]
mod test_support;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Global logger
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // GPU sub-module with every component and device type
    pub mod gpu {
        pub use crate::config::*;
        pub use crate::features::*;
        pub use crate::context::GraphicsContext;
        pub use crate::graphics_device::*;
        pub use crate::memory::*;
        pub use crate::command::*;
        pub use crate::descriptor::*;
        pub use crate::pipeline::*;
        pub use crate::frame::*;
        pub use crate::arena::*;
    }
}

// Re-export math library at crate root
pub use glam;
