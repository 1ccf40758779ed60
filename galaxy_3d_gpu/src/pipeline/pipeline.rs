/// Pipeline - a live pipeline with name and slot based resource binding
///
/// Binding protocol, per frame:
///
/// ```text
/// begin(recorder, frame)      bind the pipeline, frame set not yet pushed
///   set_shader_binding_* / set_shader_member_*
///   draw / draw_indexed / dispatch   push constants + push descriptor set, then the call
/// end()
/// ```
///
/// Push constant data may be staged at any time and is pushed at each draw.
/// Everything touching descriptors requires the pipeline to be bound.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::command::CommandRecorder;
use crate::context::GraphicsContext;
use crate::descriptor::{DescriptorType, PushDescriptorSet};
use crate::error::{Error, Result};
use crate::graphics_device::{GraphicsDevice, PipelineBindPoint, ShaderStages};
use crate::memory::{GpuBuffer, GpuImage, ImageKind};
use crate::pipeline::{
    GraphicsState, PipelineCache, PipelineDesc, PipelineKind, PipelineLayout, PipelineLayoutBuilder,
    ShaderMember, ShaderModuleDesc, ShaderStageInfo, SpecializationInfo,
};
use crate::{engine_debug, engine_error, engine_fail, engine_warn};

pub enum PipelineTarget<D: GraphicsDevice> {
    Graphics {
        state: GraphicsState,
        render_pass: Arc<D::RenderPass>,
    },
    Compute,
}

pub struct PipelineCreateDesc<D: GraphicsDevice> {
    pub label: String,
    pub shaders: Vec<ShaderModuleDesc>,
    /// Layout used when no shader carries reflection
    pub explicit_layout: PipelineLayoutBuilder,
    pub target: PipelineTarget<D>,
}

pub struct Pipeline<D: GraphicsDevice> {
    handle: D::Pipeline,
    layout: PipelineLayout<D>,
    cache: PipelineCache<D>,
    context: Arc<GraphicsContext<D>>,
    label: String,
    shaders: Vec<ShaderModuleDesc>,
    target: PipelineTarget<D>,
    specialization: SpecializationInfo,
    push_data: Vec<u8>,
    /// One push descriptor set per frame in flight
    push_sets: Vec<PushDescriptorSet<D>>,
    /// Per-frame buffers bound to buffer members
    member_buffers: FxHashMap<String, Vec<Arc<D::Buffer>>>,
    bound_frame: Option<usize>,
    updated_for_frame: bool,
}

const SOURCE: &str = "galaxy3d::gpu::Pipeline";

impl<D: GraphicsDevice> Pipeline<D> {
    pub fn new(context: Arc<GraphicsContext<D>>, desc: PipelineCreateDesc<D>) -> Result<Self> {
        let PipelineCreateDesc { label, shaders, explicit_layout, target } = desc;

        if shaders.is_empty() {
            engine_error!(SOURCE, "Pipeline '{}' has no shader stages", label);
            return Err(Error::InvalidResource(format!("pipeline '{}' has no shader stages", label)));
        }
        if let PipelineTarget::Compute = target {
            if shaders.len() != 1 || shaders[0].stage != ShaderStages::COMPUTE {
                engine_error!(SOURCE, "Compute pipeline '{}' needs exactly one compute stage", label);
                return Err(Error::InvalidResource(format!("compute pipeline '{}' stages", label)));
            }
        }

        let layout = PipelineLayoutBuilder::from_shaders(&shaders, explicit_layout)?.build(context.device())?;
        let cache = PipelineCache::open(context.clone(), shaders.iter().map(|s| s.identity.as_str()))?;
        let specialization = layout.specialization().clone();
        let handle = Self::create_handle(&context, &label, &shaders, &target, &layout, &cache, &specialization)?;

        let push_data = vec![0u8; layout.push_constant().map_or(0, |r| r.size as usize)];
        let push_sets = if layout.uses_push_descriptors() {
            (0..context.frames_in_flight()).map(|_| PushDescriptorSet::default()).collect()
        } else {
            Vec::new()
        };

        engine_debug!(SOURCE, "Created pipeline '{}' ({} stages, reflected: {})",
            label, shaders.len(), layout.is_reflected());

        Ok(Self {
            handle,
            layout,
            cache,
            context,
            label,
            shaders,
            target,
            specialization,
            push_data,
            push_sets,
            member_buffers: FxHashMap::default(),
            bound_frame: None,
            updated_for_frame: false,
        })
    }

    fn create_handle(
        context: &GraphicsContext<D>,
        label: &str,
        shaders: &[ShaderModuleDesc],
        target: &PipelineTarget<D>,
        layout: &PipelineLayout<D>,
        cache: &PipelineCache<D>,
        specialization: &SpecializationInfo,
    ) -> Result<D::Pipeline> {
        let stages = shaders
            .iter()
            .map(|s| ShaderStageInfo { stage: s.stage, code: &s.code, entry_point: &s.entry_point })
            .collect();
        let kind = match target {
            PipelineTarget::Graphics { state, render_pass } => PipelineKind::Graphics {
                state,
                render_pass: render_pass.as_ref(),
            },
            PipelineTarget::Compute => PipelineKind::Compute,
        };
        context.device().create_pipeline(&PipelineDesc {
            label,
            stages,
            layout: layout.handle(),
            kind,
            specialization: if specialization.is_empty() { None } else { Some(specialization) },
            cache: Some(cache.handle()),
        })
    }

    // ===== ACCESSORS =====

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn handle(&self) -> &D::Pipeline {
        &self.handle
    }

    pub fn layout(&self) -> &PipelineLayout<D> {
        &self.layout
    }

    pub fn cache(&self) -> &PipelineCache<D> {
        &self.cache
    }

    pub fn bind_point(&self) -> PipelineBindPoint {
        match self.target {
            PipelineTarget::Graphics { .. } => PipelineBindPoint::Graphics,
            PipelineTarget::Compute => PipelineBindPoint::Compute,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound_frame.is_some()
    }

    /// Staged push constant bytes
    pub fn push_constant_data(&self) -> &[u8] {
        &self.push_data
    }

    pub fn specialization(&self) -> &SpecializationInfo {
        &self.specialization
    }

    // ===== BIND / DRAW =====

    /// Bind the pipeline for frame `frame`
    pub fn begin(&mut self, recorder: &mut CommandRecorder<D>, frame: usize) -> Result<()> {
        if self.bound_frame.is_some() {
            return Err(engine_fail!(SynchronizationMisuse, SOURCE, "Pipeline '{}' is already bound", self.label));
        }
        recorder.bind_pipeline(self.bind_point(), &self.handle)?;
        self.bound_frame = Some(frame % self.frame_count());
        self.updated_for_frame = false;
        Ok(())
    }

    pub fn end(&mut self) {
        self.bound_frame = None;
    }

    /// Push staged constants and the frame's descriptor set if it changed
    pub fn bind_resources(&mut self, recorder: &mut CommandRecorder<D>) -> Result<()> {
        let frame = self.require_bound("bind_resources")?;

        if let Some(range) = self.layout.push_constant() {
            recorder.push_constants(self.layout.handle(), range.stages, range.offset, &self.push_data)?;
        }

        if let Some(set) = self.push_sets.get(frame) {
            if !set.is_empty() && !self.updated_for_frame {
                recorder.push_descriptor_set(self.bind_point(), self.layout.handle(), 0, &set.writes())?;
                self.updated_for_frame = true;
            }
        }
        Ok(())
    }

    pub fn draw(
        &mut self,
        recorder: &mut CommandRecorder<D>,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Result<()> {
        self.bind_resources(recorder)?;
        recorder.draw(vertex_count, instance_count, first_vertex, first_instance)
    }

    pub fn draw_indexed(
        &mut self,
        recorder: &mut CommandRecorder<D>,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        self.bind_resources(recorder)?;
        recorder.draw_indexed(index_count, instance_count, first_index, vertex_offset, first_instance)
    }

    pub fn dispatch(&mut self, recorder: &mut CommandRecorder<D>, x: u32, y: u32, z: u32) -> Result<()> {
        self.bind_resources(recorder)?;
        recorder.dispatch(x, y, z)
    }

    /// Bind sets allocated from the context against an explicit layout
    pub fn bind_descriptor_sets(
        &mut self,
        recorder: &mut CommandRecorder<D>,
        first_set: u32,
        sets: &[&D::DescriptorSet],
    ) -> Result<()> {
        self.require_bound("bind_descriptor_sets")?;
        recorder.bind_descriptor_sets(self.bind_point(), self.layout.handle(), first_set, sets)
    }

    // ===== BINDING BY SLOT =====

    /// Bind a buffer for the current frame; a size of 0 covers the rest of the buffer
    pub fn set_shader_binding_buffer(
        &mut self,
        binding: u32,
        buffer: Arc<D::Buffer>,
        size: u64,
        offset: u64,
        array_element: u32,
    ) -> Result<()> {
        let frame = self.require_bound("set_shader_binding_buffer")?;
        let ty = self.binding_type(binding)?;
        if !ty.is_buffer() {
            return Err(engine_fail!(InvalidResource, SOURCE,
                "Binding {} of '{}' is {:?}, not a buffer", binding, self.label, ty));
        }
        if let Some(set) = self.push_sets.get_mut(frame) {
            set.set_buffer(binding, ty, buffer, array_element, size, offset);
        }
        self.updated_for_frame = false;
        Ok(())
    }

    /// Bind an image (with an optional sampler) for every frame
    pub fn set_shader_binding_image(
        &mut self,
        binding: u32,
        image: Arc<D::Image>,
        sampler: Option<Arc<D::Sampler>>,
        array_element: u32,
    ) -> Result<()> {
        self.require_bound("set_shader_binding_image")?;
        let ty = self.binding_type(binding)?;
        if ty.is_buffer() {
            return Err(engine_fail!(InvalidResource, SOURCE,
                "Binding {} of '{}' is a buffer, not an image", binding, self.label));
        }
        if ty == DescriptorType::CombinedImageSampler && sampler.is_none() {
            return Err(engine_fail!(InvalidResource, SOURCE,
                "Binding {} of '{}' needs a sampler", binding, self.label));
        }
        for set in &mut self.push_sets {
            set.set_image(binding, ty, image.clone(), sampler.clone(), array_element);
        }
        self.updated_for_frame = false;
        Ok(())
    }

    pub fn set_shader_binding_texture(
        &mut self,
        binding: u32,
        image: Arc<D::Image>,
        sampler: Arc<D::Sampler>,
        array_element: u32,
    ) -> Result<()> {
        if image.desc().kind == ImageKind::Cube {
            return Err(engine_fail!(InvalidResource, SOURCE,
                "Binding {} of '{}' expects a 2D texture, got a cubemap", binding, self.label));
        }
        self.set_shader_binding_image(binding, image, Some(sampler), array_element)
    }

    pub fn set_shader_binding_cubemap(
        &mut self,
        binding: u32,
        image: Arc<D::Image>,
        sampler: Arc<D::Sampler>,
        array_element: u32,
    ) -> Result<()> {
        if image.desc().kind != ImageKind::Cube {
            return Err(engine_fail!(InvalidResource, SOURCE,
                "Binding {} of '{}' expects a cubemap", binding, self.label));
        }
        self.set_shader_binding_image(binding, image, Some(sampler), array_element)
    }

    // ===== BINDING BY NAME =====

    /// Bind one buffer per frame (or a single buffer for all frames) to a buffer member
    pub fn set_shader_member_buffers(&mut self, name: &str, buffers: &[Arc<D::Buffer>]) -> Result<()> {
        self.require_bound("set_shader_member_buffers")?;
        let bindings = match &self.member(name)?.member {
            ShaderMember::Buffer { bindings, .. } => bindings.clone(),
            other => return Err(self.kind_mismatch(name, other, "buffer")),
        };

        let frames = self.frame_count();
        if buffers.len() != 1 && buffers.len() != frames {
            return Err(engine_fail!(InvalidResource, SOURCE,
                "Member '{}' takes 1 or {} buffers, got {}", name, frames, buffers.len()));
        }
        let per_frame: Vec<Arc<D::Buffer>> = (0..frames).map(|f| buffers[f % buffers.len()].clone()).collect();

        for (frame, set) in self.push_sets.iter_mut().enumerate() {
            for binding in &bindings {
                set.set_buffer(binding.binding, binding.ty, per_frame[frame].clone(), 0, 0, 0);
            }
        }
        self.member_buffers.insert(name.to_string(), per_frame);
        self.updated_for_frame = false;
        Ok(())
    }

    pub fn set_shader_member_texture(&mut self, name: &str, image: Arc<D::Image>, sampler: Arc<D::Sampler>) -> Result<()> {
        self.set_member_image(name, image, sampler, false)
    }

    pub fn set_shader_member_cubemap(&mut self, name: &str, image: Arc<D::Image>, sampler: Arc<D::Sampler>) -> Result<()> {
        self.set_member_image(name, image, sampler, true)
    }

    fn set_member_image(&mut self, name: &str, image: Arc<D::Image>, sampler: Arc<D::Sampler>, cube: bool) -> Result<()> {
        self.require_bound("set_shader_member_texture")?;
        let bindings = match &self.member(name)?.member {
            ShaderMember::Texture { bindings, cube: member_cube } if *member_cube == cube => bindings.clone(),
            other => {
                let expected = if cube { "cubemap" } else { "texture" };
                return Err(self.kind_mismatch(name, other, expected));
            }
        };
        if (image.desc().kind == ImageKind::Cube) != cube {
            return Err(engine_fail!(InvalidResource, SOURCE,
                "Image bound to '{}' does not match the member's dimensionality", name));
        }
        for set in &mut self.push_sets {
            for binding in &bindings {
                set.set_image(binding.binding, binding.ty, image.clone(), Some(sampler.clone()), 0);
            }
        }
        self.updated_for_frame = false;
        Ok(())
    }

    /// Write `size` bytes of `data` into a member at byte `offset`; size 0 covers the rest of the member
    ///
    /// - push constant: staged immediately, pushed at the next draw
    /// - buffer: written to the current frame's buffer when bound, to every buffer otherwise
    /// - specialization constant: rewrites the constant and rebuilds the pipeline (not while bound)
    pub fn set_shader_member_data(&mut self, name: &str, data: &[u8], size: u64, offset: u64) -> Result<()> {
        let member = self.member(name)?.member.clone();
        match member {
            ShaderMember::PushConstant { memory_size } => {
                let bytes = member_bytes(name, data, memory_size as u64, size, offset)?;
                let start = offset as usize;
                self.push_data[start..start + bytes.len()].copy_from_slice(bytes);
                Ok(())
            }
            ShaderMember::Buffer { memory_size, .. } => {
                let bytes = match (memory_size, size) {
                    // Runtime-sized block: the buffer itself bounds the write
                    (0, 0) => data,
                    (0, _) => member_bytes(name, data, u64::MAX, size, offset)?,
                    _ => member_bytes(name, data, memory_size, size, offset)?,
                };
                let buffers = self.member_buffers.get(name).ok_or_else(|| {
                    engine_fail!(InvalidResource, SOURCE, "No buffers bound to member '{}'", name)
                })?;
                match self.bound_frame {
                    Some(frame) => buffers[frame].write(offset, bytes),
                    None => {
                        let mut written: Vec<&Arc<D::Buffer>> = Vec::new();
                        for buffer in buffers {
                            if !written.iter().any(|b| Arc::ptr_eq(b, buffer)) {
                                buffer.write(offset, bytes)?;
                                written.push(buffer);
                            }
                        }
                        Ok(())
                    }
                }
            }
            ShaderMember::SpecializationConstant { constant_id, size: constant_size, .. } => {
                if offset != 0 {
                    return Err(engine_fail!(InvalidResource, SOURCE,
                        "Specialization constant '{}' is written whole, got offset {}", name, offset));
                }
                let bytes = member_bytes(name, data, constant_size as u64, size, 0)?;
                self.set_specialization_constant(constant_id, bytes)
            }
            ShaderMember::Texture { .. } => Err(self.kind_mismatch(name, &member, "data")),
        }
    }

    /// Rewrite a specialization constant and rebuild the pipeline object
    ///
    /// Unknown ids are ignored with a warning.
    pub fn set_specialization_constant(&mut self, constant_id: u32, data: &[u8]) -> Result<()> {
        if self.bound_frame.is_some() {
            return Err(engine_fail!(SynchronizationMisuse, SOURCE,
                "Specialization constant {} of '{}' changed while bound", constant_id, self.label));
        }
        let Some(entry) = self.specialization.entry(constant_id).copied() else {
            engine_warn!(SOURCE, "Pipeline '{}' has no specialization constant {}", self.label, constant_id);
            return Ok(());
        };
        if data.len() != entry.size as usize {
            return Err(engine_fail!(InvalidResource, SOURCE,
                "Specialization constant {} is {} bytes, got {}", constant_id, entry.size, data.len()));
        }

        let start = entry.offset as usize;
        self.specialization.data[start..start + data.len()].copy_from_slice(data);

        // The old pipeline object may still be referenced by in-flight work
        self.context.device().wait_idle()?;
        self.handle = Self::create_handle(
            &self.context, &self.label, &self.shaders, &self.target, &self.layout, &self.cache, &self.specialization,
        )?;
        engine_debug!(SOURCE, "Rebuilt '{}' for specialization constant {}", self.label, constant_id);
        Ok(())
    }

    /// Stage push constant bytes; warns and does nothing without a push constant range
    pub fn set_push_constants(&mut self, data: &[u8]) -> Result<()> {
        let Some(range) = self.layout.push_constant() else {
            engine_warn!(SOURCE, "Pipeline '{}' has no push constant range, data ignored", self.label);
            return Ok(());
        };
        if data.len() > range.size as usize {
            return Err(engine_fail!(InvalidResource, SOURCE,
                "{} push constant bytes exceed the {} byte range of '{}'", data.len(), range.size, self.label));
        }
        self.push_data[..data.len()].copy_from_slice(data);
        Ok(())
    }

    // ===== QUERIES =====

    /// Byte size of a buffer or push constant member
    pub fn shader_member_memory_size(&self, name: &str) -> Result<u64> {
        match &self.member(name)?.member {
            ShaderMember::Buffer { memory_size, .. } => Ok(*memory_size),
            ShaderMember::PushConstant { memory_size } => Ok(*memory_size as u64),
            other => Err(self.kind_mismatch(name, other, "buffer or push constant")),
        }
    }

    /// Binding indices of a descriptor member
    pub fn shader_member_bindings(&self, name: &str) -> Result<Vec<u32>> {
        match &self.member(name)?.member {
            ShaderMember::Buffer { bindings, .. } | ShaderMember::Texture { bindings, .. } => {
                Ok(bindings.iter().map(|b| b.binding).collect())
            }
            other => Err(self.kind_mismatch(name, other, "descriptor")),
        }
    }

    // ===== HELPERS =====

    fn frame_count(&self) -> usize {
        self.context.frames_in_flight().max(1)
    }

    fn require_bound(&self, operation: &str) -> Result<usize> {
        self.bound_frame.ok_or_else(|| {
            engine_fail!(SynchronizationMisuse, SOURCE, "{} on '{}' while not bound", operation, self.label)
        })
    }

    fn member(&self, name: &str) -> Result<&crate::pipeline::ReflectedMember> {
        let table = self.layout.reflection().ok_or_else(|| {
            engine_fail!(InvalidResource, SOURCE, "Pipeline '{}' has no reflection, cannot resolve '{}'", self.label, name)
        })?;
        table.get(name).ok_or_else(|| {
            engine_fail!(InvalidResource, SOURCE, "Pipeline '{}' has no member '{}'", self.label, name)
        })
    }

    fn binding_type(&self, binding: u32) -> Result<DescriptorType> {
        if self.push_sets.is_empty() {
            return Err(engine_fail!(InvalidResource, SOURCE,
                "Pipeline '{}' has no push descriptor set", self.label));
        }
        self.layout
            .descriptor_set_layout_desc()
            .and_then(|d| d.binding(binding))
            .map(|b| b.ty)
            .ok_or_else(|| engine_fail!(InvalidResource, SOURCE, "Pipeline '{}' has no binding {}", self.label, binding))
    }

    fn kind_mismatch(&self, name: &str, member: &ShaderMember, expected: &str) -> Error {
        engine_fail!(InvalidResource, SOURCE,
            "Member '{}' of '{}' is a {}, not a {}", name, self.label, member.kind_name(), expected)
    }
}

/// Bytes of `data` written into a member of `member_size` bytes; size 0 runs to the end of the member
fn member_bytes<'a>(name: &str, data: &'a [u8], member_size: u64, size: u64, offset: u64) -> Result<&'a [u8]> {
    let size = if size == 0 { member_size.saturating_sub(offset) } else { size };
    let fits = offset.checked_add(size).is_some_and(|end| end <= member_size);
    if !fits || (data.len() as u64) < size {
        return Err(engine_fail!(InvalidResource, SOURCE,
            "Write of {} bytes at offset {} does not fit member '{}' ({} bytes, {} source bytes)",
            size, offset, name, member_size, data.len()));
    }
    Ok(&data[..size as usize])
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
