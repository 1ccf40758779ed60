/// Configuration for the GPU layer
///
/// Plain structs with `Default` values and `with_*` builders. Backends read
/// the validation and presentation settings, core components read the rest.

use std::path::PathBuf;

/// Upper bound for frames in flight
pub const MAX_FRAMES_IN_FLIGHT: u32 = 3;

/// Validation message severity filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    ErrorsOnly,
    ErrorsAndWarnings,
    All,
}

/// Where validation messages go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugOutput {
    Console,
    File(String),
    Both(String),
}

/// Validation message category filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    pub show_general: bool,
    pub show_validation: bool,
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: true,
        }
    }
}

/// Counters collected by the validation callback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

/// Present mode policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentPreference {
    /// Prefer IMMEDIATE or MAILBOX, fall back to FIFO
    LowLatency,
    /// Always FIFO
    VSync,
}

/// Initial sizes and growth factors of the mesh arena
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaConfig {
    /// Vertices the vertex region holds before its first growth
    pub initial_vertex_count: u64,
    /// Indices the index region holds before its first growth
    pub initial_index_count: u64,
    pub vertex_growth: f64,
    pub index_growth: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_vertex_count: 4096,
            initial_index_count: 4096 * 4,
            vertex_growth: 2.4,
            index_growth: 2.4 * 4.0,
        }
    }
}

/// Configuration of a graphics context
#[derive(Debug, Clone)]
pub struct GpuConfig {
    pub application_name: String,

    /// Load VK_LAYER_KHRONOS_validation (needs the `vulkan-validation` feature)
    pub enable_validation: bool,
    pub debug_severity: DebugSeverity,
    pub debug_output: DebugOutput,
    pub debug_message_filter: DebugMessageFilter,
    /// Abort the process on a validation error
    pub break_on_validation_error: bool,
    /// Panic on a validation error
    pub panic_on_error: bool,
    pub enable_validation_stats: bool,

    /// Requested frames in flight, clamped to 1..=3
    pub max_frames_in_flight: u32,
    /// Scales the default descriptor pool weights
    pub descriptor_pool_multiplier: u32,
    /// Root of `PipelineCache/`
    pub project_directory: PathBuf,
    pub present_preference: PresentPreference,
    pub frame_uniform_buffer_size: u64,
    pub frame_storage_buffer_size: u64,
    pub arena: ArenaConfig,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            application_name: "Galaxy3D".to_string(),
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            debug_output: DebugOutput::Console,
            debug_message_filter: DebugMessageFilter::default(),
            break_on_validation_error: false,
            panic_on_error: false,
            enable_validation_stats: false,
            max_frames_in_flight: MAX_FRAMES_IN_FLIGHT,
            descriptor_pool_multiplier: 512,
            project_directory: PathBuf::from("."),
            present_preference: PresentPreference::LowLatency,
            frame_uniform_buffer_size: 64 * 1024,
            frame_storage_buffer_size: 1024 * 1024,
            arena: ArenaConfig::default(),
        }
    }
}

impl GpuConfig {
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = enabled;
        self
    }

    pub fn with_max_frames_in_flight(mut self, frames: u32) -> Self {
        self.max_frames_in_flight = frames;
        self
    }

    pub fn with_descriptor_pool_multiplier(mut self, multiplier: u32) -> Self {
        self.descriptor_pool_multiplier = multiplier;
        self
    }

    pub fn with_project_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.project_directory = directory.into();
        self
    }

    pub fn with_present_preference(mut self, preference: PresentPreference) -> Self {
        self.present_preference = preference;
        self
    }

    pub fn with_arena(mut self, arena: ArenaConfig) -> Self {
        self.arena = arena;
        self
    }

    /// Frames in flight after clamping to 1..=3
    pub fn frames_in_flight(&self) -> u32 {
        self.max_frames_in_flight.clamp(1, MAX_FRAMES_IN_FLIGHT)
    }

    /// Directory holding the persisted pipeline caches
    pub fn pipeline_cache_directory(&self) -> PathBuf {
        self.project_directory.join("PipelineCache")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
