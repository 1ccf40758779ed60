//! Unit tests for config.rs

use crate::config::*;
use std::path::PathBuf;

#[test]
fn test_gpu_config_defaults() {
    let config = GpuConfig::default();
    assert_eq!(config.max_frames_in_flight, 3);
    assert_eq!(config.descriptor_pool_multiplier, 512);
    assert_eq!(config.present_preference, PresentPreference::LowLatency);
    assert_eq!(config.debug_output, DebugOutput::Console);
}

#[test]
fn test_frames_in_flight_is_clamped() {
    assert_eq!(GpuConfig::default().with_max_frames_in_flight(0).frames_in_flight(), 1);
    assert_eq!(GpuConfig::default().with_max_frames_in_flight(2).frames_in_flight(), 2);
    assert_eq!(GpuConfig::default().with_max_frames_in_flight(8).frames_in_flight(), 3);
}

#[test]
fn test_pipeline_cache_directory_under_project() {
    let config = GpuConfig::default().with_project_directory("/tmp/project");
    assert_eq!(config.pipeline_cache_directory(), PathBuf::from("/tmp/project/PipelineCache"));
}

#[test]
fn test_arena_config_defaults() {
    let arena = ArenaConfig::default();
    assert_eq!(arena.initial_vertex_count, 4096);
    assert_eq!(arena.initial_index_count, 16384);
    assert!((arena.vertex_growth - 2.4).abs() < 1e-9);
    assert!((arena.index_growth - 9.6).abs() < 1e-9);
}

#[test]
fn test_validation_stats_total() {
    let stats = ValidationStats { errors: 1, warnings: 2, info: 3, verbose: 4 };
    assert_eq!(stats.total(), 10);
    assert_eq!(ValidationStats::default().total(), 0);
}

#[test]
fn test_builders_chain() {
    let config = GpuConfig::default()
        .with_application_name("Sandbox")
        .with_validation(false)
        .with_descriptor_pool_multiplier(4)
        .with_present_preference(PresentPreference::VSync);
    assert_eq!(config.application_name, "Sandbox");
    assert!(!config.enable_validation);
    assert_eq!(config.descriptor_pool_multiplier, 4);
    assert_eq!(config.present_preference, PresentPreference::VSync);
}
