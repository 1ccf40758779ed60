/// Growable vertex and index arenas for mesh geometry

pub mod arena_region;
pub mod arena_allocator;

pub use arena_region::*;
pub use arena_allocator::*;
