use super::*;

// ============================================================================
// DESCRIPTOR TYPE TESTS
// ============================================================================

#[test]
fn test_descriptor_type_from_spirq_buffers() {
    let uniform = descriptor_type_from_spirq(&spirq::ty::DescriptorType::UniformBuffer()).unwrap();
    assert_eq!(uniform, DescriptorType::UniformBuffer);
    assert!(uniform.is_buffer());
}

#[test]
fn test_descriptor_type_from_spirq_images() {
    assert_eq!(
        descriptor_type_from_spirq(&spirq::ty::DescriptorType::CombinedImageSampler()).unwrap(),
        DescriptorType::CombinedImageSampler
    );
    assert_eq!(
        descriptor_type_from_spirq(&spirq::ty::DescriptorType::SampledImage()).unwrap(),
        DescriptorType::SampledImage
    );
    assert_eq!(
        descriptor_type_from_spirq(&spirq::ty::DescriptorType::Sampler()).unwrap(),
        DescriptorType::Sampler
    );
}

// ============================================================================
// REFLECT SHADER TESTS
// ============================================================================

#[test]
fn test_reflect_shader_rejects_garbage() {
    let code = [0xDEAD_BEEFu32, 1, 2, 3];
    assert!(reflect_shader(&code, ShaderStages::VERTEX).is_err());
}

#[test]
fn test_reflect_shader_rejects_empty_module() {
    assert!(reflect_shader(&[], ShaderStages::FRAGMENT).is_err());
}

#[test]
fn test_reflect_shader_rejects_truncated_header() {
    // Valid magic, but shorter than the five header words
    let code = [SPIRV_MAGIC, 0x0001_0000, 0, 1];
    assert!(reflect_shader(&code, ShaderStages::VERTEX).is_err());
}

#[test]
fn test_reflect_shader_rejects_wrong_magic() {
    let code = [0x0302_2307u32, 0x0001_0000, 0, 1, 0];
    assert!(reflect_shader(&code, ShaderStages::COMPUTE).is_err());
}
