/// Backend seam: the device trait, its encoder and surface chain, and shared types

pub mod types;
pub mod graphics_device;
pub mod command_encoder;
pub mod surface_chain;

pub use types::*;
pub use graphics_device::*;
pub use command_encoder::*;
pub use surface_chain::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
