/// Shader reflection tables and their cross-stage merge
///
/// A table maps member names to what the shader declares under that name.
/// Tables of several stages merge into one: stage masks are unioned, binding
/// sets are unioned, and a name may not change kind between stages.

use rustc_hash::FxHashMap;
use crate::descriptor::DescriptorType;
use crate::error::{Error, Result};
use crate::graphics_device::ShaderStages;
use crate::engine_error;

/// Descriptor binding used by a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberBinding {
    pub binding: u32,
    pub ty: DescriptorType,
    /// Array size
    pub count: u32,
}

/// What a reflected member is, with only the fields its kind needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderMember {
    /// Uniform or storage block
    Buffer {
        bindings: Vec<MemberBinding>,
        memory_size: u64,
    },
    /// Sampled image, combined or not
    Texture {
        bindings: Vec<MemberBinding>,
        cube: bool,
    },
    PushConstant {
        memory_size: u32,
    },
    /// Offset inside the pipeline specialization data, assigned at layout build
    SpecializationConstant {
        constant_id: u32,
        offset: u32,
        size: u32,
    },
}

impl ShaderMember {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ShaderMember::Buffer { .. } => "buffer",
            ShaderMember::Texture { .. } => "texture",
            ShaderMember::PushConstant { .. } => "push constant",
            ShaderMember::SpecializationConstant { .. } => "specialization constant",
        }
    }

    /// Descriptor bindings, empty for push and specialization constants
    pub fn bindings(&self) -> &[MemberBinding] {
        match self {
            ShaderMember::Buffer { bindings, .. } | ShaderMember::Texture { bindings, .. } => bindings,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedMember {
    pub stages: ShaderStages,
    pub member: ShaderMember,
}

/// Name to member table of one or more shader stages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionTable {
    members: FxHashMap<String, ReflectedMember>,
}

fn union_bindings(into: &mut Vec<MemberBinding>, from: &[MemberBinding]) {
    for binding in from {
        if !into.contains(binding) {
            into.push(*binding);
        }
    }
    into.sort_by_key(|b| b.binding);
}

impl ReflectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member of a single stage, merging with an existing entry of the same name
    pub fn insert(&mut self, name: impl Into<String>, stages: ShaderStages, member: ShaderMember) -> Result<()> {
        self.merge_member(name.into(), ReflectedMember { stages, member })
    }

    pub fn get(&self, name: &str) -> Option<&ReflectedMember> {
        self.members.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ReflectedMember> {
        self.members.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ReflectedMember)> {
        self.members.iter()
    }

    /// The push constant member, if any
    pub fn push_constant(&self) -> Option<(&String, &ReflectedMember)> {
        self.members
            .iter()
            .find(|(_, m)| matches!(m.member, ShaderMember::PushConstant { .. }))
    }

    /// Merge every member of another stage's table into this one
    pub fn merge(&mut self, other: &ReflectionTable) -> Result<()> {
        for (name, member) in &other.members {
            self.merge_member(name.clone(), member.clone())?;
        }
        Ok(())
    }

    fn merge_member(&mut self, name: String, incoming: ReflectedMember) -> Result<()> {
        if matches!(incoming.member, ShaderMember::PushConstant { .. }) {
            if let Some((other, _)) = self.push_constant() {
                if *other != name {
                    engine_error!("galaxy3d::gpu::Reflection",
                        "Push constant blocks '{}' and '{}' in one pipeline", other, name);
                    return Err(Error::InvalidResource(format!(
                        "more than one push constant block ('{}', '{}')", other, name)));
                }
            }
        }

        if !self.members.contains_key(&name) {
            self.members.insert(name, incoming);
            return Ok(());
        }
        let Some(existing) = self.members.get_mut(&name) else {
            return Ok(());
        };

        existing.stages |= incoming.stages;
        match (&mut existing.member, incoming.member) {
            (
                ShaderMember::Buffer { bindings, memory_size },
                ShaderMember::Buffer { bindings: other, memory_size: other_size },
            ) => {
                union_bindings(bindings, &other);
                *memory_size = (*memory_size).max(other_size);
            }
            (
                ShaderMember::Texture { bindings, cube },
                ShaderMember::Texture { bindings: other, cube: other_cube },
            ) => {
                union_bindings(bindings, &other);
                *cube |= other_cube;
            }
            (ShaderMember::PushConstant { memory_size }, ShaderMember::PushConstant { memory_size: other }) => {
                *memory_size = (*memory_size).max(other);
            }
            (
                ShaderMember::SpecializationConstant { constant_id, size, .. },
                ShaderMember::SpecializationConstant { constant_id: other_id, size: other_size, .. },
            ) if *constant_id == other_id => {
                *size = (*size).max(other_size);
            }
            (current, other) => {
                engine_error!("galaxy3d::gpu::Reflection",
                    "Member '{}' is a {} in one stage and a {} in another",
                    name, current.kind_name(), other.kind_name());
                return Err(Error::InvalidResource(format!(
                    "member '{}' declared as {} and {}", name, current.kind_name(), other.kind_name())));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "reflection_tests.rs"]
mod tests;
