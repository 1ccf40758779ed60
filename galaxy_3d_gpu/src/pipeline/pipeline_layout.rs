/// PipelineLayoutBuilder - pipeline layouts from explicit descriptions or reflection
///
/// The explicit path takes a push constant range and a set layout as given.
/// The reflected path merges the tables of every stage and derives a push
/// descriptor set layout, the push constant range and the specialization
/// constant offsets from the merged table.

use std::sync::Arc;
use crate::descriptor::{DescriptorBinding, DescriptorSetLayoutDesc, DescriptorSetLayoutFlags};
use crate::error::{Error, Result};
use crate::features::DeviceFeature;
use crate::graphics_device::GraphicsDevice;
use crate::pipeline::{
    PushConstantRange, ReflectionTable, ShaderMember, ShaderModuleDesc, SpecializationEntry,
    SpecializationInfo,
};
use crate::{engine_debug, engine_error, engine_warn};

enum LayoutSource {
    Explicit {
        push_constant: Option<PushConstantRange>,
        set_layout: Option<DescriptorSetLayoutDesc>,
        descriptor_set_count: u32,
    },
    Reflected {
        table: ReflectionTable,
    },
}

pub struct PipelineLayoutBuilder {
    source: LayoutSource,
}

/// A built pipeline layout and what was derived to build it
pub struct PipelineLayout<D: GraphicsDevice> {
    handle: D::PipelineLayout,
    set_layout: Option<Arc<D::DescriptorSetLayout>>,
    set_layout_desc: Option<DescriptorSetLayoutDesc>,
    descriptor_set_count: u32,
    push_constant: Option<PushConstantRange>,
    reflection: Option<ReflectionTable>,
    specialization: SpecializationInfo,
}

impl PipelineLayoutBuilder {
    /// Explicit layout with no push constants and no set layout
    pub fn explicit() -> Self {
        Self {
            source: LayoutSource::Explicit {
                push_constant: None,
                set_layout: None,
                descriptor_set_count: 1,
            },
        }
    }

    /// Merge the reflection tables of every stage
    pub fn reflected(tables: &[&ReflectionTable]) -> Result<Self> {
        let mut table = ReflectionTable::new();
        for stage_table in tables {
            table.merge(stage_table)?;
        }
        Ok(Self { source: LayoutSource::Reflected { table } })
    }

    /// Reflected layout when every stage carries a table
    ///
    /// Stages mixing reflected and non-reflected shaders are rejected; when
    /// no stage is reflected `explicit` is returned as the fallback.
    pub fn from_shaders(shaders: &[ShaderModuleDesc], explicit: PipelineLayoutBuilder) -> Result<Self> {
        let reflected = shaders.iter().filter(|s| s.reflection.is_some()).count();
        if reflected == 0 {
            return Ok(explicit);
        }
        if reflected != shaders.len() {
            engine_error!("galaxy3d::gpu::PipelineLayout",
                "{} of {} shader stages carry reflection", reflected, shaders.len());
            return Err(Error::InvalidResource(
                "reflected and non-reflected shader stages cannot share a pipeline".to_string(),
            ));
        }
        let tables: Vec<&ReflectionTable> = shaders.iter().filter_map(|s| s.reflection.as_ref()).collect();
        Self::reflected(&tables)
    }

    pub fn push_constant(mut self, range: PushConstantRange) -> Self {
        if let LayoutSource::Explicit { push_constant, .. } = &mut self.source {
            *push_constant = Some(range);
        }
        self
    }

    pub fn set_layout(mut self, desc: DescriptorSetLayoutDesc) -> Self {
        if let LayoutSource::Explicit { set_layout, .. } = &mut self.source {
            *set_layout = Some(desc);
        }
        self
    }

    /// Number of times the set layout is repeated in the pipeline layout
    pub fn descriptor_set_count(mut self, count: u32) -> Self {
        if let LayoutSource::Explicit { descriptor_set_count, .. } = &mut self.source {
            *descriptor_set_count = count.max(1);
        }
        self
    }

    pub fn is_reflected(&self) -> bool {
        matches!(self.source, LayoutSource::Reflected { .. })
    }

    /// Merged table of the reflected path
    pub fn reflection(&self) -> Option<&ReflectionTable> {
        match &self.source {
            LayoutSource::Reflected { table } => Some(table),
            LayoutSource::Explicit { .. } => None,
        }
    }

    pub fn build<D: GraphicsDevice>(self, device: &D) -> Result<PipelineLayout<D>> {
        match self.source {
            LayoutSource::Explicit { push_constant, set_layout, descriptor_set_count } => {
                let set_layout = match set_layout {
                    Some(desc) => Some(Self::check_explicit_flags(device, desc, descriptor_set_count)?),
                    None => None,
                };
                Self::finish(device, set_layout, descriptor_set_count, push_constant, None, SpecializationInfo::default())
            }
            LayoutSource::Reflected { mut table } => {
                let (set_layout, push_constant) = Self::derive_from_table(&table)?;
                let specialization = Self::assign_specialization_offsets(&mut table);

                if set_layout.is_some() && !device.features().is_enabled(DeviceFeature::PushDescriptor) {
                    engine_error!("galaxy3d::gpu::PipelineLayout",
                        "Reflected pipelines need {}", DeviceFeature::PushDescriptor.extension_name());
                    return Err(Error::CapabilityUnsupported(
                        DeviceFeature::PushDescriptor.extension_name().to_string(),
                    ));
                }

                Self::finish(device, set_layout, 1, push_constant, Some(table), specialization)
            }
        }
    }

    fn check_explicit_flags<D: GraphicsDevice>(
        device: &D,
        mut desc: DescriptorSetLayoutDesc,
        descriptor_set_count: u32,
    ) -> Result<DescriptorSetLayoutDesc> {
        if desc.is_push_descriptor() {
            if descriptor_set_count > 1 {
                engine_error!("galaxy3d::gpu::PipelineLayout",
                    "A push descriptor layout cannot be repeated {} times", descriptor_set_count);
                return Err(Error::InvalidResource("push descriptor layout repeated".to_string()));
            }
            if !device.features().is_enabled(DeviceFeature::PushDescriptor) {
                engine_error!("galaxy3d::gpu::PipelineLayout", "Push descriptors are not enabled");
                return Err(Error::CapabilityUnsupported(
                    DeviceFeature::PushDescriptor.extension_name().to_string(),
                ));
            }
        }
        if desc.flags.contains(DescriptorSetLayoutFlags::UPDATE_AFTER_BIND_POOL)
            && !device.features().is_enabled(DeviceFeature::DescriptorIndexing)
        {
            engine_warn!("galaxy3d::gpu::PipelineLayout",
                "Update-after-bind requested without descriptor indexing, flag dropped");
            desc.flags.remove(DescriptorSetLayoutFlags::UPDATE_AFTER_BIND_POOL);
        }
        Ok(desc)
    }

    fn derive_from_table(
        table: &ReflectionTable,
    ) -> Result<(Option<DescriptorSetLayoutDesc>, Option<PushConstantRange>)> {
        let mut desc = DescriptorSetLayoutDesc::new(DescriptorSetLayoutFlags::PUSH_DESCRIPTOR);
        let mut push_constant = None;

        for (name, reflected) in table.iter() {
            match &reflected.member {
                ShaderMember::Buffer { bindings, .. } | ShaderMember::Texture { bindings, .. } => {
                    for binding in bindings {
                        desc.add_binding(DescriptorBinding {
                            binding: binding.binding,
                            ty: binding.ty,
                            count: binding.count,
                            stages: reflected.stages,
                        })
                        .map_err(|e| {
                            engine_error!("galaxy3d::gpu::PipelineLayout", "Member '{}': {}", name, e);
                            e
                        })?;
                    }
                }
                ShaderMember::PushConstant { memory_size } => {
                    push_constant = Some(PushConstantRange {
                        stages: reflected.stages,
                        offset: 0,
                        size: *memory_size,
                    });
                }
                ShaderMember::SpecializationConstant { .. } => {}
            }
        }

        let set_layout = if desc.is_empty() { None } else { Some(desc) };
        Ok((set_layout, push_constant))
    }

    /// Lay specialization constants out by ascending constant id
    fn assign_specialization_offsets(table: &mut ReflectionTable) -> SpecializationInfo {
        let mut constants: Vec<(String, u32, u32)> = table
            .iter()
            .filter_map(|(name, m)| match m.member {
                ShaderMember::SpecializationConstant { constant_id, size, .. } => {
                    Some((name.clone(), constant_id, size))
                }
                _ => None,
            })
            .collect();
        constants.sort_by_key(|(_, id, _)| *id);

        let mut info = SpecializationInfo::default();
        let mut cursor = 0u32;
        for (name, constant_id, size) in constants {
            if let Some(reflected) = table.get_mut(&name) {
                reflected.member = ShaderMember::SpecializationConstant { constant_id, offset: cursor, size };
            }
            info.entries.push(SpecializationEntry { constant_id, offset: cursor, size });
            cursor += size;
        }
        info.data = vec![0; cursor as usize];
        info
    }

    fn finish<D: GraphicsDevice>(
        device: &D,
        set_layout_desc: Option<DescriptorSetLayoutDesc>,
        descriptor_set_count: u32,
        push_constant: Option<PushConstantRange>,
        reflection: Option<ReflectionTable>,
        specialization: SpecializationInfo,
    ) -> Result<PipelineLayout<D>> {
        let set_layout = match &set_layout_desc {
            Some(desc) => Some(Arc::new(device.create_descriptor_set_layout(desc)?)),
            None => None,
        };

        let set_layouts: Vec<&D::DescriptorSetLayout> = match &set_layout {
            Some(layout) => (0..descriptor_set_count).map(|_| layout.as_ref()).collect(),
            None => Vec::new(),
        };
        let handle = device.create_pipeline_layout(&set_layouts, push_constant.as_ref())?;

        engine_debug!("galaxy3d::gpu::PipelineLayout",
            "Pipeline layout: {} bindings x {} sets, push constants {:?}",
            set_layout_desc.as_ref().map_or(0, |d| d.bindings.len()),
            set_layouts.len(),
            push_constant.map(|p| p.size));

        Ok(PipelineLayout {
            handle,
            set_layout,
            set_layout_desc,
            descriptor_set_count,
            push_constant,
            reflection,
            specialization,
        })
    }
}

impl<D: GraphicsDevice> PipelineLayout<D> {
    pub fn handle(&self) -> &D::PipelineLayout {
        &self.handle
    }

    /// Set layout, shared so sets can be allocated against it
    pub fn descriptor_set_layout(&self) -> Option<&Arc<D::DescriptorSetLayout>> {
        self.set_layout.as_ref()
    }

    pub fn descriptor_set_layout_desc(&self) -> Option<&DescriptorSetLayoutDesc> {
        self.set_layout_desc.as_ref()
    }

    pub fn descriptor_set_count(&self) -> u32 {
        if self.set_layout.is_some() { self.descriptor_set_count } else { 0 }
    }

    pub fn push_constant(&self) -> Option<&PushConstantRange> {
        self.push_constant.as_ref()
    }

    pub fn reflection(&self) -> Option<&ReflectionTable> {
        self.reflection.as_ref()
    }

    pub fn is_reflected(&self) -> bool {
        self.reflection.is_some()
    }

    /// Uses push descriptors (set 0 is pushed at draw time)
    pub fn uses_push_descriptors(&self) -> bool {
        self.set_layout_desc.as_ref().is_some_and(|d| d.is_push_descriptor())
    }

    pub fn specialization(&self) -> &SpecializationInfo {
        &self.specialization
    }
}

#[cfg(test)]
#[path = "pipeline_layout_tests.rs"]
mod tests;
