/// Pipeline layouts, reflection, caches and live pipelines

pub mod pipeline_desc;
pub mod reflection;
pub mod pipeline_layout;
pub mod pipeline_cache;
pub mod pipeline;

pub use pipeline_desc::*;
pub use reflection::*;
pub use pipeline_layout::*;
pub use pipeline_cache::*;
pub use pipeline::*;
