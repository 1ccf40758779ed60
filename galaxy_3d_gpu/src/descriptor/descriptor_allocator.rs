/// DescriptorAllocator - pooled descriptor set allocation
///
/// Pools move between two lists: the ones handed sets during the current
/// render cycle and the ones free for reuse. A pool that runs out (or is too
/// fragmented) is replaced by a fresh one and the allocation retried once.

use crate::error::{Error, Result};
use crate::descriptor::{DescriptorPoolSize, DescriptorType};
use crate::graphics_device::GraphicsDevice;
use crate::{engine_debug, engine_error};

/// Why a pool could not hand out a set
#[derive(Debug, Clone, PartialEq)]
pub enum PoolAllocError {
    OutOfPoolMemory,
    FragmentedPool,
    Other(Error),
}

/// Default descriptor weights, multiplied by the pool multiplier
pub const DEFAULT_POOL_WEIGHTS: [(DescriptorType, f32); 11] = [
    (DescriptorType::Sampler, 0.5),
    (DescriptorType::CombinedImageSampler, 4.0),
    (DescriptorType::SampledImage, 4.0),
    (DescriptorType::StorageImage, 1.0),
    (DescriptorType::UniformTexelBuffer, 1.0),
    (DescriptorType::StorageTexelBuffer, 1.0),
    (DescriptorType::UniformBuffer, 2.0),
    (DescriptorType::StorageBuffer, 2.0),
    (DescriptorType::UniformBufferDynamic, 1.0),
    (DescriptorType::StorageBufferDynamic, 1.0),
    (DescriptorType::InputAttachment, 0.5),
];

/// Pool sizes for `multiplier`
pub fn pool_sizes(multiplier: u32) -> Vec<DescriptorPoolSize> {
    DEFAULT_POOL_WEIGHTS
        .iter()
        .map(|(ty, weight)| DescriptorPoolSize {
            ty: *ty,
            count: ((weight * multiplier as f32) as u32).max(1),
        })
        .collect()
}

pub struct DescriptorAllocator<D: GraphicsDevice> {
    multiplier: u32,
    /// Pools handed sets this cycle, the active one last
    used_pools: Vec<D::DescriptorPool>,
    free_pools: Vec<D::DescriptorPool>,
    has_active: bool,
    pools_created: usize,
}

impl<D: GraphicsDevice> DescriptorAllocator<D> {
    /// `multiplier` scales the weight table and is the set capacity of each pool
    pub fn new(multiplier: u32) -> Self {
        Self {
            multiplier: multiplier.max(1),
            used_pools: Vec::new(),
            free_pools: Vec::new(),
            has_active: false,
            pools_created: 0,
        }
    }

    /// Allocate a set, switching to a fresh pool when the active one is full
    pub fn allocate_set(&mut self, device: &D, layout: &D::DescriptorSetLayout) -> Result<D::DescriptorSet> {
        if !self.has_active {
            self.activate_pool(device)?;
        }

        match self.try_allocate(device, layout) {
            Ok(set) => return Ok(set),
            Err(PoolAllocError::OutOfPoolMemory) | Err(PoolAllocError::FragmentedPool) => {
                engine_debug!("galaxy3d::gpu::DescriptorAllocator", "Active pool exhausted, switching pool");
            }
            Err(PoolAllocError::Other(e)) => {
                engine_error!("galaxy3d::gpu::DescriptorAllocator", "Descriptor set allocation failed: {}", e);
                return Err(e);
            }
        }

        self.activate_pool(device)?;
        match self.try_allocate(device, layout) {
            Ok(set) => Ok(set),
            Err(PoolAllocError::Other(e)) => {
                engine_error!("galaxy3d::gpu::DescriptorAllocator", "Descriptor set allocation failed: {}", e);
                Err(e)
            }
            Err(reason) => {
                engine_error!("galaxy3d::gpu::DescriptorAllocator",
                    "Descriptor set allocation failed on a fresh pool: {:?}", reason);
                Err(Error::ResourceCreationFailure(format!(
                    "descriptor set does not fit an empty pool ({:?}, multiplier {})",
                    reason, self.multiplier
                )))
            }
        }
    }

    /// Move every used pool to the free list
    ///
    /// No set from these pools may still be referenced by in-flight work.
    pub fn reset_pools(&mut self, device: &D) -> Result<()> {
        for pool in &self.used_pools {
            device.reset_descriptor_pool(pool)?;
        }
        let recycled = self.used_pools.len();
        self.free_pools.append(&mut self.used_pools);
        self.has_active = false;
        engine_debug!("galaxy3d::gpu::DescriptorAllocator", "Recycled {} descriptor pools", recycled);
        Ok(())
    }

    /// Destroy every pool, only valid once the device is idle
    pub fn dispose_pools(&mut self) {
        self.used_pools.clear();
        self.free_pools.clear();
        self.has_active = false;
    }

    pub fn used_pool_count(&self) -> usize {
        self.used_pools.len()
    }

    pub fn free_pool_count(&self) -> usize {
        self.free_pools.len()
    }

    /// Pools created since construction (recycled ones are not counted again)
    pub fn pools_created(&self) -> usize {
        self.pools_created
    }

    fn try_allocate(
        &self,
        device: &D,
        layout: &D::DescriptorSetLayout,
    ) -> std::result::Result<D::DescriptorSet, PoolAllocError> {
        match self.used_pools.last() {
            Some(pool) => device.allocate_descriptor_set(pool, layout),
            None => Err(PoolAllocError::Other(Error::BackendError("no active descriptor pool".to_string()))),
        }
    }

    fn activate_pool(&mut self, device: &D) -> Result<()> {
        let pool = match self.free_pools.pop() {
            Some(pool) => pool,
            None => {
                let pool = device.create_descriptor_pool(&pool_sizes(self.multiplier), self.multiplier)?;
                self.pools_created += 1;
                engine_debug!("galaxy3d::gpu::DescriptorAllocator",
                    "Created descriptor pool #{} ({} sets)", self.pools_created, self.multiplier);
                pool
            }
        };
        self.used_pools.push(pool);
        self.has_active = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "descriptor_allocator_tests.rs"]
mod tests;
