/// Descriptor types and set layout descriptions

use std::collections::BTreeMap;
use bitflags::bitflags;
use crate::error::{Error, Result};
use crate::graphics_device::ShaderStages;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DescriptorType {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
    UniformBuffer,
    StorageBuffer,
    UniformBufferDynamic,
    StorageBufferDynamic,
    InputAttachment,
}

impl DescriptorType {
    pub fn is_buffer(&self) -> bool {
        matches!(
            self,
            DescriptorType::UniformBuffer
                | DescriptorType::StorageBuffer
                | DescriptorType::UniformBufferDynamic
                | DescriptorType::StorageBufferDynamic
        )
    }
}

bitflags! {
    /// Layout creation flags (Vulkan bit values)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DescriptorSetLayoutFlags: u32 {
        /// Sets are pushed into the recording instead of allocated
        const PUSH_DESCRIPTOR = 0x1;
        /// Bindless: sets may be updated after being bound
        const UPDATE_AFTER_BIND_POOL = 0x2;
    }
}

bitflags! {
    /// Per-binding flags (Vulkan bit values)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DescriptorBindingFlags: u32 {
        const UPDATE_AFTER_BIND = 0x1;
        const UPDATE_UNUSED_WHILE_PENDING = 0x2;
        const PARTIALLY_BOUND = 0x4;
    }
}

/// One binding slot of a set layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBinding {
    pub binding: u32,
    pub ty: DescriptorType,
    /// Array size
    pub count: u32,
    pub stages: ShaderStages,
}

impl DescriptorBinding {
    /// Arrays may leave elements unwritten
    pub fn flags(&self, layout_flags: DescriptorSetLayoutFlags) -> DescriptorBindingFlags {
        let mut flags = DescriptorBindingFlags::empty();
        if self.count > 1 {
            flags |= DescriptorBindingFlags::PARTIALLY_BOUND;
        }
        if layout_flags.contains(DescriptorSetLayoutFlags::UPDATE_AFTER_BIND_POOL) {
            flags |= DescriptorBindingFlags::UPDATE_AFTER_BIND;
        }
        flags
    }
}

/// Set layout request keyed by binding index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorSetLayoutDesc {
    pub bindings: BTreeMap<u32, DescriptorBinding>,
    pub flags: DescriptorSetLayoutFlags,
}

impl DescriptorSetLayoutDesc {
    pub fn new(flags: DescriptorSetLayoutFlags) -> Self {
        Self { bindings: BTreeMap::new(), flags }
    }

    pub fn with_binding(mut self, binding: u32, ty: DescriptorType, count: u32, stages: ShaderStages) -> Self {
        self.bindings.insert(binding, DescriptorBinding { binding, ty, count, stages });
        self
    }

    /// Add a binding, or widen the stage mask of an identical one
    ///
    /// Two different resources on the same binding index are rejected.
    pub fn add_binding(&mut self, binding: DescriptorBinding) -> Result<()> {
        match self.bindings.get_mut(&binding.binding) {
            Some(existing) if existing.ty == binding.ty && existing.count == binding.count => {
                existing.stages |= binding.stages;
                Ok(())
            }
            Some(existing) => Err(Error::InvalidResource(format!(
                "binding {} declared as {:?}[{}] and {:?}[{}]",
                binding.binding, existing.ty, existing.count, binding.ty, binding.count
            ))),
            None => {
                self.bindings.insert(binding.binding, binding);
                Ok(())
            }
        }
    }

    pub fn binding(&self, binding: u32) -> Option<&DescriptorBinding> {
        self.bindings.get(&binding)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn is_push_descriptor(&self) -> bool {
        self.flags.contains(DescriptorSetLayoutFlags::PUSH_DESCRIPTOR)
    }
}

/// Descriptor count of one type in a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorPoolSize {
    pub ty: DescriptorType,
    pub count: u32,
}

#[cfg(test)]
#[path = "descriptor_layout_tests.rs"]
mod tests;
