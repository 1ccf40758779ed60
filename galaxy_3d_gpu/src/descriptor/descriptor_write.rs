/// Descriptor writes and push descriptor sets

use std::collections::BTreeMap;
use std::sync::Arc;
use crate::descriptor::DescriptorType;
use crate::graphics_device::{GraphicsDevice, ImageLayout};

/// Resource referenced by a descriptor
///
/// Holding the resource keeps it alive for as long as the write is staged.
pub enum DescriptorResource<D: GraphicsDevice> {
    Buffer {
        buffer: Arc<D::Buffer>,
        offset: u64,
        /// Bytes visible to the shader
        range: u64,
    },
    Image {
        image: Arc<D::Image>,
        sampler: Option<Arc<D::Sampler>>,
        layout: ImageLayout,
    },
}

impl<D: GraphicsDevice> Clone for DescriptorResource<D> {
    fn clone(&self) -> Self {
        match self {
            DescriptorResource::Buffer { buffer, offset, range } => DescriptorResource::Buffer {
                buffer: buffer.clone(),
                offset: *offset,
                range: *range,
            },
            DescriptorResource::Image { image, sampler, layout } => DescriptorResource::Image {
                image: image.clone(),
                sampler: sampler.clone(),
                layout: *layout,
            },
        }
    }
}

/// One array element of one binding
pub struct DescriptorWrite<D: GraphicsDevice> {
    pub binding: u32,
    pub array_element: u32,
    pub ty: DescriptorType,
    pub resource: DescriptorResource<D>,
}

impl<D: GraphicsDevice> Clone for DescriptorWrite<D> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding,
            array_element: self.array_element,
            ty: self.ty,
            resource: self.resource.clone(),
        }
    }
}

/// Writes staged for a push descriptor set, keyed by binding and array element
pub struct PushDescriptorSet<D: GraphicsDevice> {
    writes: BTreeMap<(u32, u32), DescriptorWrite<D>>,
}

impl<D: GraphicsDevice> Default for PushDescriptorSet<D> {
    fn default() -> Self {
        Self { writes: BTreeMap::new() }
    }
}

impl<D: GraphicsDevice> PushDescriptorSet<D> {
    /// Stage a buffer; a size of 0 covers the buffer from `offset` to its end
    pub fn set_buffer(
        &mut self,
        binding: u32,
        ty: DescriptorType,
        buffer: Arc<D::Buffer>,
        array_element: u32,
        size: u64,
        offset: u64,
    ) {
        use crate::memory::GpuBuffer;
        let range = if size == 0 { buffer.size().saturating_sub(offset) } else { size };
        self.writes.insert(
            (binding, array_element),
            DescriptorWrite {
                binding,
                array_element,
                ty,
                resource: DescriptorResource::Buffer { buffer, offset, range },
            },
        );
    }

    pub fn set_image(
        &mut self,
        binding: u32,
        ty: DescriptorType,
        image: Arc<D::Image>,
        sampler: Option<Arc<D::Sampler>>,
        array_element: u32,
    ) {
        let layout = match ty {
            DescriptorType::StorageImage => ImageLayout::General,
            _ => ImageLayout::ShaderReadOnly,
        };
        self.writes.insert(
            (binding, array_element),
            DescriptorWrite {
                binding,
                array_element,
                ty,
                resource: DescriptorResource::Image { image, sampler, layout },
            },
        );
    }

    /// Combined image sampler
    pub fn set_texture(&mut self, binding: u32, image: Arc<D::Image>, sampler: Arc<D::Sampler>, array_element: u32) {
        self.set_image(binding, DescriptorType::CombinedImageSampler, image, Some(sampler), array_element);
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Staged writes ordered by binding then array element
    pub fn writes(&self) -> Vec<DescriptorWrite<D>> {
        self.writes.values().cloned().collect()
    }
}
