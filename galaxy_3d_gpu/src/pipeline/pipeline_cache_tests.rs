//! Unit tests for PipelineCache persistence

use std::path::Path;
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, CORRUPT_CACHE};
use crate::pipeline::{pipeline_cache_key, pipeline_cache_path, PipelineCache};
use crate::test_support::{mock_context, mock_context_with, test_config};

// ============================================================================
// KEY AND PATH
// ============================================================================

#[test]
fn test_cache_key_is_deterministic() {
    let a = pipeline_cache_key(["mesh.vert", "mesh.frag"]);
    let b = pipeline_cache_key(["mesh.vert", "mesh.frag"]);
    assert_eq!(a, b);
}

#[test]
fn test_cache_key_depends_on_identities() {
    let a = pipeline_cache_key(["mesh.vert", "mesh.frag"]);
    let b = pipeline_cache_key(["mesh.vert", "sky.frag"]);
    assert_ne!(a, b);
}

#[test]
fn test_cache_path_format() {
    let path = pipeline_cache_path(Path::new("project/PipelineCache"), 42);
    assert_eq!(path, Path::new("project/PipelineCache/PipelineCache_42.cache"));
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn test_new_cache_is_written_on_drop() {
    let context = mock_context();
    let cache = PipelineCache::open(context.clone(), ["a.vert", "a.frag"]).unwrap();
    let path = cache.path().to_path_buf();

    assert!(!cache.was_loaded());
    assert!(cache.handle().initial_data.is_empty());
    assert!(path.starts_with(context.config().pipeline_cache_directory()));
    assert!(!path.exists());

    drop(cache);
    assert_eq!(std::fs::read(&path).unwrap(), b"mock pipeline cache".to_vec());
}

#[test]
fn test_existing_cache_is_loaded_and_not_rewritten() {
    let context = mock_context();
    drop(PipelineCache::open(context.clone(), ["b.comp"]).unwrap());

    context.device().state().pipeline_cache_blob = b"changed blob".to_vec();
    let cache = PipelineCache::open(context.clone(), ["b.comp"]).unwrap();
    let path = cache.path().to_path_buf();
    assert!(cache.was_loaded());
    assert_eq!(cache.handle().initial_data, b"mock pipeline cache".to_vec());

    drop(cache);
    assert_eq!(std::fs::read(&path).unwrap(), b"mock pipeline cache".to_vec());
}

#[test]
fn test_corrupt_cache_falls_back_to_empty() {
    let config = test_config();
    let key = pipeline_cache_key(["c.vert"]);
    let path = pipeline_cache_path(&config.pipeline_cache_directory(), key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, CORRUPT_CACHE).unwrap();

    let context = mock_context_with(MockGraphicsDevice::new(), config);
    let cache = PipelineCache::open(context, ["c.vert"]).unwrap();
    assert!(!cache.was_loaded());
    assert!(cache.handle().initial_data.is_empty());

    drop(cache);
    assert_eq!(std::fs::read(&path).unwrap(), b"mock pipeline cache".to_vec());
}
