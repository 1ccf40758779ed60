/// ArenaAllocator - shared vertex and index buffers for every registered mesh
///
/// Meshes are appended and never move: a mesh keeps the element offsets it
/// was registered at for the lifetime of the arena.

use std::marker::PhantomData;
use std::sync::Arc;
use bytemuck::Pod;
use slotmap::{new_key_type, SlotMap};
use crate::command::CommandRecorder;
use crate::config::ArenaConfig;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{BufferUsage, GraphicsDevice, IndexType};
use crate::arena::ArenaRegion;
use crate::{engine_fail, engine_trace};

new_key_type! {
    /// Stable key of a mesh registered in an arena
    pub struct MeshKey;
}

/// Where a mesh lives inside the arena, in elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshAllocation {
    pub vertex_offset: u32,
    pub vertex_count: u32,
    pub index_offset: u32,
    pub index_count: u32,
}

pub struct ArenaAllocator<D: GraphicsDevice, V: Pod> {
    vertices: ArenaRegion<D>,
    indices: ArenaRegion<D>,
    meshes: SlotMap<MeshKey, MeshAllocation>,
    context: Arc<GraphicsContext<D>>,
    _vertex: PhantomData<V>,
}

impl<D: GraphicsDevice, V: Pod> ArenaAllocator<D, V> {
    /// Arena sized by the context's configuration
    pub fn new(context: Arc<GraphicsContext<D>>) -> Result<Self> {
        let config = context.config().arena;
        Self::with_config(context, &config)
    }

    pub fn with_config(context: Arc<GraphicsContext<D>>, config: &ArenaConfig) -> Result<Self> {
        let vertices = ArenaRegion::new(
            &context,
            "arena vertices",
            BufferUsage::VERTEX,
            std::mem::size_of::<V>() as u64,
            config.initial_vertex_count,
            config.vertex_growth,
        )?;
        let indices = ArenaRegion::new(
            &context,
            "arena indices",
            BufferUsage::INDEX,
            std::mem::size_of::<u32>() as u64,
            config.initial_index_count,
            config.index_growth,
        )?;
        Ok(Self {
            vertices,
            indices,
            meshes: SlotMap::with_key(),
            context,
            _vertex: PhantomData,
        })
    }

    /// Upload a mesh through `recorder` and register it
    ///
    /// Growth and upload copies are recorded on `recorder`; the data is usable
    /// by any work recorded after it. Buffers replaced by growth are retired
    /// on the same recorder.
    pub fn register_mesh(
        &mut self,
        recorder: &mut CommandRecorder<D>,
        vertices: &[V],
        indices: &[u32],
    ) -> Result<(MeshKey, MeshAllocation)> {
        let vertex_offset = self.vertices.upload(&self.context, recorder, bytemuck::cast_slice(vertices))?;
        let index_offset = self.indices.upload(&self.context, recorder, bytemuck::cast_slice(indices))?;

        let allocation = MeshAllocation {
            vertex_offset: to_u32(vertex_offset, "vertex offset")?,
            vertex_count: to_u32(vertices.len() as u64, "vertex count")?,
            index_offset: to_u32(index_offset, "index offset")?,
            index_count: to_u32(indices.len() as u64, "index count")?,
        };
        let key = self.meshes.insert(allocation);
        engine_trace!("galaxy3d::gpu::ArenaAllocator", "Registered mesh {:?}: {:?}", key, allocation);
        Ok((key, allocation))
    }

    pub fn mesh(&self, key: MeshKey) -> Option<&MeshAllocation> {
        self.meshes.get(key)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Bind the vertex region at binding 0 and the index region as 32-bit indices
    pub fn bind(&self, recorder: &mut CommandRecorder<D>) -> Result<()> {
        recorder.bind_vertex_buffer(0, self.vertices.buffer(), 0)?;
        recorder.bind_index_buffer(self.indices.buffer(), 0, IndexType::U32)
    }

    /// Indexed draw of a registered mesh; the arena must be bound
    pub fn draw_mesh(&self, recorder: &mut CommandRecorder<D>, key: MeshKey, instance_count: u32) -> Result<()> {
        let mesh = self.meshes.get(key).ok_or_else(|| {
            engine_fail!(InvalidResource, "galaxy3d::gpu::ArenaAllocator", "Unknown mesh {:?}", key)
        })?;
        recorder.draw_indexed(mesh.index_count, instance_count, mesh.index_offset, mesh.vertex_offset as i32, 0)
    }

    pub fn vertex_region(&self) -> &ArenaRegion<D> {
        &self.vertices
    }

    pub fn index_region(&self) -> &ArenaRegion<D> {
        &self.indices
    }
}

fn to_u32(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        engine_fail!(ResourceCreationFailure, "galaxy3d::gpu::ArenaAllocator", "{} {} exceeds 32 bits", what, value)
    })
}

#[cfg(test)]
#[path = "arena_allocator_tests.rs"]
mod tests;
