/// Shader modules, fixed-function state and the device-level pipeline descriptor

use crate::graphics_device::{Format, GraphicsDevice, ShaderStages};
use crate::pipeline::ReflectionTable;

/// Push constant byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushConstantRange {
    pub stages: ShaderStages,
    pub offset: u32,
    pub size: u32,
}

/// One specialization constant inside the specialization data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecializationEntry {
    pub constant_id: u32,
    pub offset: u32,
    pub size: u32,
}

/// Specialization constants shared by every stage of a pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecializationInfo {
    pub entries: Vec<SpecializationEntry>,
    pub data: Vec<u8>,
}

impl SpecializationInfo {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, constant_id: u32) -> Option<&SpecializationEntry> {
        self.entries.iter().find(|e| e.constant_id == constant_id)
    }
}

/// Compiled shader stage
#[derive(Debug, Clone)]
pub struct ShaderModuleDesc {
    /// Stable identity of the shader (usually its file path), part of the cache key
    pub identity: String,
    /// A single stage bit
    pub stage: ShaderStages,
    /// SPIR-V words
    pub code: Vec<u32>,
    pub entry_point: String,
    /// Reflected members, None for shaders described by an explicit layout
    pub reflection: Option<ReflectionTable>,
}

impl ShaderModuleDesc {
    pub fn new(identity: impl Into<String>, stage: ShaderStages, code: Vec<u32>) -> Self {
        Self {
            identity: identity.into(),
            stage,
            code,
            entry_point: "main".to_string(),
            reflection: None,
        }
    }

    pub fn with_reflection(mut self, reflection: ReflectionTable) -> Self {
        self.reflection = Some(reflection);
        self
    }
}

// ===== FIXED-FUNCTION STATE =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Opaque,
    /// src_alpha, one_minus_src_alpha
    AlphaBlend,
    Additive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexInputRate {
    Vertex,
    Instance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBinding {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: VertexInputRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: Format,
    pub offset: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    pub bindings: Vec<VertexBinding>,
    pub attributes: Vec<VertexAttribute>,
}

/// Fixed-function state of a graphics pipeline (viewport and scissor are dynamic)
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub vertex_layout: VertexLayout,
    pub topology: PrimitiveTopology,
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare: CompareOp,
    pub blend: BlendMode,
    pub samples: u32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            vertex_layout: VertexLayout::default(),
            topology: PrimitiveTopology::TriangleList,
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            depth_test: true,
            depth_write: true,
            depth_compare: CompareOp::Less,
            blend: BlendMode::Opaque,
            samples: 1,
        }
    }
}

// ===== DEVICE DESCRIPTOR =====

/// Stage as handed to the device
pub struct ShaderStageInfo<'a> {
    pub stage: ShaderStages,
    pub code: &'a [u32],
    pub entry_point: &'a str,
}

pub enum PipelineKind<'a, D: GraphicsDevice> {
    Graphics {
        state: &'a GraphicsState,
        render_pass: &'a D::RenderPass,
    },
    Compute,
}

/// Everything the device needs to build a pipeline object
pub struct PipelineDesc<'a, D: GraphicsDevice> {
    pub label: &'a str,
    pub stages: Vec<ShaderStageInfo<'a>>,
    pub layout: &'a D::PipelineLayout,
    pub kind: PipelineKind<'a, D>,
    /// Applied to every stage
    pub specialization: Option<&'a SpecializationInfo>,
    pub cache: Option<&'a D::PipelineCache>,
}
