/// SPIR-V reflection into the engine's shader member tables (spirq)

use galaxy_3d_gpu::galaxy3d::Result;
use galaxy_3d_gpu::galaxy3d::gpu::{DescriptorType, MemberBinding, ReflectionTable, ShaderMember, ShaderStages};
use galaxy_3d_gpu::{engine_bail, engine_err, engine_warn};

/// First word of every SPIR-V module
const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Words in the SPIR-V module header
const SPIRV_HEADER_WORDS: usize = 5;

/// Parse SPIR-V bytecode and build the member table of one stage
///
/// Every descriptor must live in set 0; reflected pipelines push that set.
pub fn reflect_shader(code: &[u32], stage: ShaderStages) -> Result<ReflectionTable> {
    // spirq slices the header without checking its length
    if code.len() < SPIRV_HEADER_WORDS || code[0] != SPIRV_MAGIC {
        engine_bail!("galaxy3d::vulkan",
            "Invalid SPIR-V module: {} words, magic {:#010x}",
            code.len(), code.first().copied().unwrap_or(0));
    }

    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| engine_err!("galaxy3d::vulkan", "SPIR-V reflection failed: {:?}", e))?;

    let mut table = ReflectionTable::new();

    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            match var {
                spirq::var::Variable::Descriptor { name, desc_bind, desc_ty, ty, nbind } => {
                    if desc_bind.set() != 0 {
                        engine_bail!("galaxy3d::vulkan",
                            "Descriptor '{}' uses set {}, reflected shaders may only use set 0",
                            name.as_deref().unwrap_or("?"), desc_bind.set());
                    }
                    let member_name = name
                        .clone()
                        .unwrap_or_else(|| format!("binding_{}", desc_bind.bind()));
                    let binding = MemberBinding {
                        binding: desc_bind.bind(),
                        ty: descriptor_type_from_spirq(desc_ty)?,
                        count: (*nbind).max(1),
                    };

                    let member = if binding.ty.is_buffer() {
                        ShaderMember::Buffer {
                            bindings: vec![binding],
                            memory_size: ty.nbyte().unwrap_or(0) as u64,
                        }
                    } else {
                        ShaderMember::Texture {
                            bindings: vec![binding],
                            cube: is_cube(ty),
                        }
                    };
                    table.insert(member_name, stage, member)?;
                }
                spirq::var::Variable::PushConstant { name, ty } => {
                    let memory_size = ty.nbyte().unwrap_or(0) as u32;
                    table.insert(
                        name.clone().unwrap_or_else(|| "push_constants".to_string()),
                        stage,
                        ShaderMember::PushConstant { memory_size },
                    )?;
                }
                spirq::var::Variable::SpecConstant { name, spec_id, ty } => {
                    let Some(name) = name.clone() else {
                        engine_warn!("galaxy3d::vulkan", "Unnamed specialization constant {} skipped", spec_id);
                        continue;
                    };
                    // Offsets are assigned when the pipeline layout is built
                    table.insert(
                        name,
                        stage,
                        ShaderMember::SpecializationConstant {
                            constant_id: *spec_id,
                            offset: 0,
                            size: ty.nbyte().unwrap_or(4) as u32,
                        },
                    )?;
                }
                _ => {}
            }
        }
    }

    Ok(table)
}

pub(crate) fn descriptor_type_from_spirq(desc_ty: &spirq::ty::DescriptorType) -> Result<DescriptorType> {
    use spirq::ty::DescriptorType as Spirq;
    match desc_ty {
        Spirq::Sampler() => Ok(DescriptorType::Sampler),
        Spirq::CombinedImageSampler() => Ok(DescriptorType::CombinedImageSampler),
        Spirq::SampledImage() => Ok(DescriptorType::SampledImage),
        Spirq::StorageImage(..) => Ok(DescriptorType::StorageImage),
        Spirq::UniformTexelBuffer() => Ok(DescriptorType::UniformTexelBuffer),
        Spirq::StorageTexelBuffer(..) => Ok(DescriptorType::StorageTexelBuffer),
        Spirq::UniformBuffer() => Ok(DescriptorType::UniformBuffer),
        Spirq::StorageBuffer(..) => Ok(DescriptorType::StorageBuffer),
        Spirq::InputAttachment(..) => Ok(DescriptorType::InputAttachment),
        other => {
            engine_bail!("galaxy3d::vulkan", "Unsupported SPIR-V descriptor type: {:?}", other);
        }
    }
}

fn is_cube(ty: &spirq::ty::Type) -> bool {
    use spirq::spirv::Dim;
    use spirq::ty::Type;
    match ty {
        Type::CombinedImageSampler(t) => t.sampled_image_ty.dim == Dim::DimCube,
        Type::SampledImage(t) => t.dim == Dim::DimCube,
        _ => false,
    }
}

#[cfg(test)]
#[path = "vulkan_reflection_tests.rs"]
mod tests;
