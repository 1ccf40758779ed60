/// Pipeline layouts, pipeline caches and graphics/compute pipelines

use ash::vk;
use std::ffi::CString;
use std::sync::Arc;

use galaxy_3d_gpu::galaxy3d::{Error, Result};
use galaxy_3d_gpu::galaxy3d::gpu::{PipelineDesc, PipelineKind, PushConstantRange, ShaderStageInfo};
use galaxy_3d_gpu::{engine_debug, engine_err, engine_error, engine_warn};

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert;
use crate::vulkan_descriptor::VulkanDescriptorSetLayout;
use crate::vulkan_device::VulkanDevice;

// ===== LAYOUT =====

pub struct VulkanPipelineLayout {
    ctx: Arc<GpuContext>,
    pub(crate) layout: vk::PipelineLayout,
}

impl VulkanPipelineLayout {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        set_layouts: &[&VulkanDescriptorSetLayout],
        push_constant: Option<&PushConstantRange>,
    ) -> Result<Self> {
        let vk_set_layouts: Vec<vk::DescriptorSetLayout> = set_layouts.iter().map(|l| l.layout).collect();
        let ranges: Vec<vk::PushConstantRange> = push_constant
            .map(|range| vk::PushConstantRange {
                stage_flags: vulkan_convert::shader_stages_to_vk(range.stages),
                offset: range.offset,
                size: range.size,
            })
            .into_iter()
            .collect();

        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&vk_set_layouts)
            .push_constant_ranges(&ranges);

        let layout = unsafe {
            ctx.device.create_pipeline_layout(&create_info, None).map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create pipeline layout ({} sets): {:?}",
                    vk_set_layouts.len(), e);
                Error::ResourceCreationFailure(format!("pipeline layout: {:?}", e))
            })?
        };
        Ok(Self { ctx, layout })
    }
}

impl Drop for VulkanPipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

// ===== CACHE =====

pub struct VulkanPipelineCache {
    ctx: Arc<GpuContext>,
    pub(crate) cache: vk::PipelineCache,
}

impl VulkanPipelineCache {
    /// Seed the cache with `initial_data`; data the driver rejects is dropped and the cache starts empty
    pub(crate) fn new(ctx: Arc<GpuContext>, initial_data: &[u8]) -> Result<Self> {
        let seeded = vk::PipelineCacheCreateInfo::default().initial_data(initial_data);
        let cache = match unsafe { ctx.device.create_pipeline_cache(&seeded, None) } {
            Ok(cache) => cache,
            Err(e) if !initial_data.is_empty() => {
                engine_warn!("galaxy3d::vulkan", "Pipeline cache data rejected ({:?}), starting empty", e);
                unsafe {
                    ctx.device
                        .create_pipeline_cache(&vk::PipelineCacheCreateInfo::default(), None)
                        .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create pipeline cache: {:?}", e))?
                }
            }
            Err(e) => return Err(engine_err!("galaxy3d::vulkan", "Failed to create pipeline cache: {:?}", e)),
        };
        Ok(Self { ctx, cache })
    }

    pub(crate) fn data(&self) -> Result<Vec<u8>> {
        unsafe {
            self.ctx
                .device
                .get_pipeline_cache_data(self.cache)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to read pipeline cache data: {:?}", e))
        }
    }
}

impl Drop for VulkanPipelineCache {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline_cache(self.cache, None);
        }
    }
}

// ===== PIPELINE =====

pub struct VulkanPipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
}

/// Shader modules that live only while the pipeline is being built
struct StageModules<'a> {
    device: &'a ash::Device,
    modules: Vec<vk::ShaderModule>,
}

impl<'a> StageModules<'a> {
    fn new(device: &'a ash::Device, label: &str, stages: &[ShaderStageInfo<'_>]) -> Result<Self> {
        let mut out = Self { device, modules: Vec::with_capacity(stages.len()) };
        for stage in stages {
            let create_info = vk::ShaderModuleCreateInfo::default().code(stage.code);
            let module = unsafe {
                device.create_shader_module(&create_info, None).map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to create {:?} shader module for pipeline '{}': {:?}",
                        stage.stage, label, e);
                    Error::ResourceCreationFailure(format!("shader module for '{}': {:?}", label, e))
                })?
            };
            out.modules.push(module);
        }
        Ok(out)
    }
}

impl Drop for StageModules<'_> {
    fn drop(&mut self) {
        for module in self.modules.drain(..) {
            unsafe {
                self.device.destroy_shader_module(module, None);
            }
        }
    }
}

impl VulkanPipeline {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &PipelineDesc<'_, VulkanDevice>) -> Result<Self> {
        if desc.stages.is_empty() {
            engine_error!("galaxy3d::vulkan", "Pipeline '{}' has no shader stage", desc.label);
            return Err(Error::ResourceCreationFailure(format!("pipeline '{}' has no shader stage", desc.label)));
        }

        let modules = StageModules::new(&ctx.device, desc.label, &desc.stages)?;

        let entry_points: Vec<CString> = desc
            .stages
            .iter()
            .map(|stage| {
                CString::new(stage.entry_point).map_err(|_| {
                    engine_err!("galaxy3d::vulkan", "Entry point '{}' contains a NUL byte", stage.entry_point)
                })
            })
            .collect::<Result<_>>()?;

        let map_entries: Vec<vk::SpecializationMapEntry> = desc
            .specialization
            .map(|info| {
                info.entries
                    .iter()
                    .map(|entry| vk::SpecializationMapEntry {
                        constant_id: entry.constant_id,
                        offset: entry.offset,
                        size: entry.size as usize,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let specialization = desc
            .specialization
            .filter(|info| !info.is_empty())
            .map(|info| vk::SpecializationInfo::default().map_entries(&map_entries).data(&info.data));

        let stage_infos: Vec<vk::PipelineShaderStageCreateInfo> = desc
            .stages
            .iter()
            .zip(&modules.modules)
            .zip(&entry_points)
            .map(|((stage, &module), entry)| {
                let info = vk::PipelineShaderStageCreateInfo::default()
                    .stage(vulkan_convert::shader_stages_to_vk(stage.stage))
                    .module(module)
                    .name(entry.as_c_str());
                match specialization.as_ref() {
                    Some(specialization) => info.specialization_info(specialization),
                    None => info,
                }
            })
            .collect();

        let cache = desc.cache.map(|c| c.cache).unwrap_or_default();

        let pipeline = match &desc.kind {
            PipelineKind::Graphics { state, render_pass } => {
                let bindings: Vec<vk::VertexInputBindingDescription> = state
                    .vertex_layout
                    .bindings
                    .iter()
                    .map(|b| vk::VertexInputBindingDescription {
                        binding: b.binding,
                        stride: b.stride,
                        input_rate: vulkan_convert::input_rate_to_vk(b.input_rate),
                    })
                    .collect();
                let attributes: Vec<vk::VertexInputAttributeDescription> = state
                    .vertex_layout
                    .attributes
                    .iter()
                    .map(|a| vk::VertexInputAttributeDescription {
                        location: a.location,
                        binding: a.binding,
                        format: vulkan_convert::format_to_vk(a.format),
                        offset: a.offset,
                    })
                    .collect();

                let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
                    .vertex_binding_descriptions(&bindings)
                    .vertex_attribute_descriptions(&attributes);

                let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
                    .topology(vulkan_convert::topology_to_vk(state.topology))
                    .primitive_restart_enable(false);

                // Viewport and scissor are dynamic
                let viewport_state = vk::PipelineViewportStateCreateInfo::default()
                    .viewport_count(1)
                    .scissor_count(1);

                let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
                    .depth_clamp_enable(false)
                    .rasterizer_discard_enable(false)
                    .polygon_mode(vulkan_convert::polygon_mode_to_vk(state.polygon_mode))
                    .line_width(1.0)
                    .cull_mode(vulkan_convert::cull_mode_to_vk(state.cull_mode))
                    .front_face(vulkan_convert::front_face_to_vk(state.front_face))
                    .depth_bias_enable(false);

                let multisample = vk::PipelineMultisampleStateCreateInfo::default()
                    .sample_shading_enable(false)
                    .rasterization_samples(vulkan_convert::sample_count_to_vk(state.samples));

                let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
                    .depth_test_enable(state.depth_test)
                    .depth_write_enable(state.depth_write)
                    .depth_compare_op(vulkan_convert::compare_op_to_vk(state.depth_compare))
                    .depth_bounds_test_enable(false)
                    .stencil_test_enable(false);

                let blend_attachments =
                    vec![vulkan_convert::blend_attachment(state.blend); render_pass.color_count as usize];
                let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
                    .logic_op_enable(false)
                    .attachments(&blend_attachments);

                let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
                let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

                let create_info = vk::GraphicsPipelineCreateInfo::default()
                    .stages(&stage_infos)
                    .vertex_input_state(&vertex_input)
                    .input_assembly_state(&input_assembly)
                    .viewport_state(&viewport_state)
                    .rasterization_state(&rasterization)
                    .multisample_state(&multisample)
                    .depth_stencil_state(&depth_stencil)
                    .color_blend_state(&color_blend)
                    .dynamic_state(&dynamic_state)
                    .layout(desc.layout.layout)
                    .render_pass(render_pass.render_pass)
                    .subpass(0);

                unsafe { ctx.device.create_graphics_pipelines(cache, &[create_info], None) }
                    .map_err(|(_, e)| e)
            }
            PipelineKind::Compute => {
                if stage_infos.len() != 1 {
                    engine_error!("galaxy3d::vulkan", "Compute pipeline '{}' needs exactly one stage, got {}",
                        desc.label, stage_infos.len());
                    return Err(Error::ResourceCreationFailure(format!(
                        "compute pipeline '{}' needs exactly one stage", desc.label)));
                }
                let create_info = vk::ComputePipelineCreateInfo::default()
                    .stage(stage_infos[0])
                    .layout(desc.layout.layout);

                unsafe { ctx.device.create_compute_pipelines(cache, &[create_info], None) }
                    .map_err(|(_, e)| e)
            }
        };

        let pipeline = pipeline
            .map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create pipeline '{}': {:?}", desc.label, e);
                Error::ResourceCreationFailure(format!("pipeline '{}': {:?}", desc.label, e))
            })?
            .first()
            .copied()
            .ok_or_else(|| engine_err!("galaxy3d::vulkan", "Driver returned no pipeline for '{}'", desc.label))?;

        engine_debug!("galaxy3d::vulkan", "Pipeline '{}' created ({} stages)", desc.label, desc.stages.len());
        drop(modules);
        Ok(Self { ctx, pipeline })
    }
}

impl Drop for VulkanPipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
        }
    }
}
