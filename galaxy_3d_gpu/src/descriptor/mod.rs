/// Descriptor set layouts, writes and the pooled set allocator

pub mod descriptor_layout;
pub mod descriptor_write;
pub mod descriptor_allocator;

pub use descriptor_layout::*;
pub use descriptor_write::*;
pub use descriptor_allocator::*;
