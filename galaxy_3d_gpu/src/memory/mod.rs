/// GPU memory resources: buffers, images and samplers

pub mod buffer;
pub mod image;
pub mod sampler;

pub use buffer::*;
pub use image::*;
pub use sampler::*;
