/// Image descriptor, layout tracking and the image resource trait

use std::sync::atomic::{AtomicU32, Ordering};
use crate::error::{Error, Result};
use crate::graphics_device::{Format, ImageAspect, ImageLayout, ImageUsage, SubresourceRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Tex2D,
    /// Cube compatible, six layers per cube
    Cube,
}

/// Descriptor for creating an image and its view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub format: Format,
    pub usage: ImageUsage,
    pub kind: ImageKind,
    pub samples: u32,
    pub label: String,
}

impl ImageDesc {
    pub fn texture_2d(width: u32, height: u32, format: Format, usage: ImageUsage) -> Self {
        Self {
            width,
            height,
            mip_levels: 1,
            array_layers: 1,
            format,
            usage,
            kind: ImageKind::Tex2D,
            samples: 1,
            label: String::new(),
        }
    }

    pub fn cube(size: u32, format: Format, usage: ImageUsage) -> Self {
        Self { array_layers: 6, kind: ImageKind::Cube, ..Self::texture_2d(size, size, format, usage) }
    }

    pub fn with_mip_levels(mut self, mip_levels: u32) -> Self {
        self.mip_levels = mip_levels;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Full mip chain length for the image size
    pub fn max_mip_levels(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Reject descriptors no backend can create
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::ResourceCreationFailure(format!(
                "image '{}' has a zero extent {}x{}", self.label, self.width, self.height)));
        }
        if self.mip_levels == 0 || self.mip_levels > self.max_mip_levels() {
            return Err(Error::ResourceCreationFailure(format!(
                "image '{}' requests {} mip levels, at most {} fit",
                self.label, self.mip_levels, self.max_mip_levels())));
        }
        if self.array_layers == 0 {
            return Err(Error::ResourceCreationFailure(format!("image '{}' has no layers", self.label)));
        }
        if self.kind == ImageKind::Cube && (self.array_layers % 6 != 0 || self.width != self.height) {
            return Err(Error::ResourceCreationFailure(format!(
                "cube image '{}' needs square faces and a multiple of 6 layers", self.label)));
        }
        Ok(())
    }
}

/// Aspect of the image view: depth for depth/stencil attachments, color otherwise
pub fn derive_aspect(usage: ImageUsage) -> ImageAspect {
    if usage.contains(ImageUsage::DEPTH_STENCIL_ATTACHMENT) {
        ImageAspect::DEPTH
    } else {
        ImageAspect::COLOR
    }
}

/// Layout of an image as last recorded by a barrier
#[derive(Debug)]
pub struct TrackedLayout(AtomicU32);

impl TrackedLayout {
    pub fn new(layout: ImageLayout) -> Self {
        Self(AtomicU32::new(layout as u32))
    }

    pub fn get(&self) -> ImageLayout {
        ImageLayout::from_raw(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, layout: ImageLayout) {
        self.0.store(layout as u32, Ordering::Release);
    }
}

/// Image resource
///
/// Implemented by backend image types. Dropping the image releases the view
/// and memory; surface-owned images only release their view.
pub trait GpuImage: Send + Sync {
    fn desc(&self) -> &ImageDesc;

    fn aspect(&self) -> ImageAspect;

    fn layout(&self) -> ImageLayout;

    fn set_layout(&self, layout: ImageLayout);

    /// The image handle belongs to a surface chain
    fn is_surface_owned(&self) -> bool;

    /// Every mip level and layer of the image
    fn full_range(&self) -> SubresourceRange {
        let desc = self.desc();
        SubresourceRange {
            aspect: self.aspect(),
            base_mip_level: 0,
            level_count: desc.mip_levels,
            base_array_layer: 0,
            layer_count: desc.array_layers,
        }
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
