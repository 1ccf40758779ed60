//! Unit tests for ReflectionTable and the cross-stage merge

use crate::descriptor::DescriptorType;
use crate::galaxy3d::Error;
use crate::graphics_device::ShaderStages;
use crate::pipeline::{MemberBinding, ReflectionTable, ShaderMember};

fn uniform(binding: u32, memory_size: u64) -> ShaderMember {
    ShaderMember::Buffer {
        bindings: vec![MemberBinding { binding, ty: DescriptorType::UniformBuffer, count: 1 }],
        memory_size,
    }
}

fn texture(binding: u32, cube: bool) -> ShaderMember {
    ShaderMember::Texture {
        bindings: vec![MemberBinding { binding, ty: DescriptorType::CombinedImageSampler, count: 1 }],
        cube,
    }
}

// ============================================================================
// INSERT / LOOKUP
// ============================================================================

#[test]
fn test_insert_and_get() {
    let mut table = ReflectionTable::new();
    table.insert("Globals", ShaderStages::VERTEX, uniform(0, 64)).unwrap();

    let member = table.get("Globals").unwrap();
    assert_eq!(member.stages, ShaderStages::VERTEX);
    assert_eq!(member.member.kind_name(), "buffer");
    assert_eq!(member.member.bindings().len(), 1);
    assert_eq!(table.len(), 1);
    assert!(table.get("Missing").is_none());
}

#[test]
fn test_push_constant_lookup() {
    let mut table = ReflectionTable::new();
    table.insert("Globals", ShaderStages::VERTEX, uniform(0, 64)).unwrap();
    assert!(table.push_constant().is_none());

    table.insert("Constants", ShaderStages::VERTEX, ShaderMember::PushConstant { memory_size: 16 }).unwrap();
    let (name, member) = table.push_constant().unwrap();
    assert_eq!(name, "Constants");
    assert!(member.member.bindings().is_empty());
}

// ============================================================================
// MERGE
// ============================================================================

#[test]
fn test_merge_same_member_different_bindings() {
    let mut vertex = ReflectionTable::new();
    vertex.insert("Globals", ShaderStages::VERTEX, uniform(0, 64)).unwrap();
    let mut fragment = ReflectionTable::new();
    fragment.insert("Globals", ShaderStages::FRAGMENT, uniform(3, 64)).unwrap();

    let mut merged = ReflectionTable::new();
    merged.merge(&vertex).unwrap();
    merged.merge(&fragment).unwrap();

    assert_eq!(merged.len(), 1);
    let globals = merged.get("Globals").unwrap();
    assert_eq!(globals.stages, ShaderStages::VERTEX | ShaderStages::FRAGMENT);
    let bindings: Vec<u32> = globals.member.bindings().iter().map(|b| b.binding).collect();
    assert_eq!(bindings, vec![0, 3]);
}

#[test]
fn test_merge_same_binding_is_not_duplicated() {
    let mut table = ReflectionTable::new();
    table.insert("Globals", ShaderStages::VERTEX, uniform(1, 64)).unwrap();
    table.insert("Globals", ShaderStages::FRAGMENT, uniform(1, 64)).unwrap();
    assert_eq!(table.get("Globals").unwrap().member.bindings().len(), 1);
}

#[test]
fn test_merge_keeps_largest_size() {
    let mut table = ReflectionTable::new();
    table.insert("Lights", ShaderStages::VERTEX, uniform(2, 32)).unwrap();
    table.insert("Lights", ShaderStages::FRAGMENT, uniform(2, 128)).unwrap();
    match &table.get("Lights").unwrap().member {
        ShaderMember::Buffer { memory_size, .. } => assert_eq!(*memory_size, 128),
        other => panic!("unexpected member {:?}", other),
    }
}

#[test]
fn test_merge_push_constant_unions_stages() {
    let mut table = ReflectionTable::new();
    table.insert("Push", ShaderStages::VERTEX, ShaderMember::PushConstant { memory_size: 16 }).unwrap();
    table.insert("Push", ShaderStages::FRAGMENT, ShaderMember::PushConstant { memory_size: 32 }).unwrap();

    let push = table.get("Push").unwrap();
    assert_eq!(push.stages, ShaderStages::VERTEX | ShaderStages::FRAGMENT);
    assert_eq!(push.member, ShaderMember::PushConstant { memory_size: 32 });
}

#[test]
fn test_merge_rejects_kind_change() {
    let mut table = ReflectionTable::new();
    table.insert("Albedo", ShaderStages::FRAGMENT, texture(1, false)).unwrap();
    let result = table.insert("Albedo", ShaderStages::VERTEX, ShaderMember::PushConstant { memory_size: 4 });
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_merge_rejects_second_push_constant_block() {
    let mut table = ReflectionTable::new();
    table.insert("A", ShaderStages::VERTEX, ShaderMember::PushConstant { memory_size: 4 }).unwrap();
    let result = table.insert("B", ShaderStages::FRAGMENT, ShaderMember::PushConstant { memory_size: 4 });
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_merge_rejects_specialization_id_mismatch() {
    let mut table = ReflectionTable::new();
    table.insert("Quality", ShaderStages::VERTEX,
        ShaderMember::SpecializationConstant { constant_id: 0, offset: 0, size: 4 }).unwrap();
    let result = table.insert("Quality", ShaderStages::FRAGMENT,
        ShaderMember::SpecializationConstant { constant_id: 1, offset: 0, size: 4 });
    assert!(result.is_err());
}

#[test]
fn test_merge_texture_cube_flag() {
    let mut table = ReflectionTable::new();
    table.insert("Sky", ShaderStages::FRAGMENT, texture(4, true)).unwrap();
    table.insert("Sky", ShaderStages::VERTEX, texture(4, true)).unwrap();
    assert!(matches!(table.get("Sky").unwrap().member, ShaderMember::Texture { cube: true, .. }));
}
