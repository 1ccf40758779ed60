/// Sampler descriptor

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDesc {
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub mipmap_filter: Filter,
    pub address_mode: AddressMode,
    /// Maximum anisotropy, None disables it
    pub anisotropy: Option<f32>,
    pub min_lod: f32,
    pub max_lod: f32,
}

impl SamplerDesc {
    pub fn linear_repeat() -> Self {
        Self {
            mag_filter: Filter::Linear,
            min_filter: Filter::Linear,
            mipmap_filter: Filter::Linear,
            address_mode: AddressMode::Repeat,
            anisotropy: Some(16.0),
            min_lod: 0.0,
            max_lod: f32::MAX,
        }
    }

    pub fn nearest_clamp() -> Self {
        Self {
            mag_filter: Filter::Nearest,
            min_filter: Filter::Nearest,
            mipmap_filter: Filter::Nearest,
            address_mode: AddressMode::ClampToEdge,
            anisotropy: None,
            min_lod: 0.0,
            max_lod: 0.0,
        }
    }
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self::linear_repeat()
    }
}
