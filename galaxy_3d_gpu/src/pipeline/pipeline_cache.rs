/// Persistent pipeline cache
///
/// One cache file per pipeline, named after a hash of its shader identities:
/// `<project>/PipelineCache/PipelineCache_<hash>.cache`. The blob is opaque
/// driver data. A cache loaded from disk is never written back.

use std::hash::Hasher;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use rustc_hash::FxHasher;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::{engine_debug, engine_info, engine_warn};

/// Deterministic key of the concatenated shader identities
pub fn pipeline_cache_key<'a>(identities: impl IntoIterator<Item = &'a str>) -> u64 {
    let mut joined = String::new();
    for identity in identities {
        joined.push_str(identity);
    }
    let mut hasher = FxHasher::default();
    hasher.write(joined.as_bytes());
    hasher.finish()
}

pub fn pipeline_cache_path(directory: &Path, key: u64) -> PathBuf {
    directory.join(format!("PipelineCache_{}.cache", key))
}

pub struct PipelineCache<D: GraphicsDevice> {
    context: Arc<GraphicsContext<D>>,
    handle: D::PipelineCache,
    path: PathBuf,
    loaded: bool,
}

impl<D: GraphicsDevice> PipelineCache<D> {
    /// Open the cache for a set of shader identities, seeding it from disk when possible
    pub fn open<'a>(
        context: Arc<GraphicsContext<D>>,
        identities: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let key = pipeline_cache_key(identities);
        let path = pipeline_cache_path(&context.config().pipeline_cache_directory(), key);

        let (handle, loaded) = match std::fs::read(&path) {
            Ok(data) => match context.device().create_pipeline_cache(&data) {
                Ok(handle) => {
                    engine_debug!("galaxy3d::gpu::PipelineCache", "Loaded {} ({} bytes)", path.display(), data.len());
                    (handle, true)
                }
                Err(e) => {
                    engine_warn!("galaxy3d::gpu::PipelineCache", "Rejected {}: {}", path.display(), e);
                    (context.device().create_pipeline_cache(&[])?, false)
                }
            },
            Err(_) => (context.device().create_pipeline_cache(&[])?, false),
        };

        Ok(Self { context, handle, path, loaded })
    }

    pub fn handle(&self) -> &D::PipelineCache {
        &self.handle
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cache was seeded from an existing file
    pub fn was_loaded(&self) -> bool {
        self.loaded
    }

    fn persist(&self) -> Result<()> {
        let data = self.context.device().pipeline_cache_data(&self.handle)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                crate::engine_err!("galaxy3d::gpu::PipelineCache", "Cannot create {}: {}", parent.display(), e)
            })?;
        }
        std::fs::write(&self.path, &data).map_err(|e| {
            crate::engine_err!("galaxy3d::gpu::PipelineCache", "Cannot write {}: {}", self.path.display(), e)
        })?;
        engine_info!("galaxy3d::gpu::PipelineCache", "Saved {} ({} bytes)", self.path.display(), data.len());
        Ok(())
    }
}

impl<D: GraphicsDevice> Drop for PipelineCache<D> {
    fn drop(&mut self) {
        if !self.loaded {
            // Errors are already logged; nothing to propagate from drop
            let _ = self.persist();
        }
    }
}

#[cfg(test)]
#[path = "pipeline_cache_tests.rs"]
mod tests;
