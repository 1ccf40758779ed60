/// GraphicsContext - the explicit owner of shared GPU state
///
/// Built once and handed to every component as `Arc<GraphicsContext<D>>`.
/// Holds the device, the configuration, the frames-in-flight count shared by
/// the scheduler and pipelines, and the descriptor allocator. Access is
/// single-writer by the recording model; the mutex is never contended.

use std::sync::{Arc, Mutex, MutexGuard};
use crate::command::{CommandRecorder, RecorderState};
use crate::config::GpuConfig;
use crate::descriptor::DescriptorAllocator;
use crate::error::{Error, Result};
use crate::features::FeatureSet;
use crate::frame::select_frame_count;
use crate::graphics_device::{GraphicsDevice, SubmitSync};
use crate::memory::BufferDesc;
use crate::{engine_debug, engine_error, engine_warn};

pub struct GraphicsContext<D: GraphicsDevice> {
    // Declared before the device so pools are released first
    descriptors: Mutex<DescriptorAllocator<D>>,
    config: GpuConfig,
    frames_in_flight: usize,
    device: D,
}

impl<D: GraphicsDevice> GraphicsContext<D> {
    /// Resolve the frames-in-flight count from the surface limits and the config
    pub fn new(device: D, config: GpuConfig) -> Result<Arc<Self>> {
        let caps = device.surface_capabilities()?;
        let frames_in_flight = select_frame_count(&caps, config.frames_in_flight()) as usize;
        engine_debug!("galaxy3d::gpu::Context",
            "Graphics context: {} frames in flight (configured {}), descriptor multiplier {}",
            frames_in_flight, config.frames_in_flight(), config.descriptor_pool_multiplier);
        Ok(Arc::new(Self {
            descriptors: Mutex::new(DescriptorAllocator::new(config.descriptor_pool_multiplier)),
            config,
            frames_in_flight,
            device,
        }))
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn config(&self) -> &GpuConfig {
        &self.config
    }

    pub fn features(&self) -> &FeatureSet {
        self.device.features()
    }

    /// Frames in flight used by every per-frame resource
    pub fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    pub fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<D::Buffer>> {
        Ok(Arc::new(self.device.create_buffer(desc)?))
    }

    // ===== DESCRIPTORS =====

    pub fn allocate_descriptor_set(&self, layout: &D::DescriptorSetLayout) -> Result<D::DescriptorSet> {
        self.descriptors()?.allocate_set(&self.device, layout)
    }

    /// Recycle every pool used this cycle; sets from them must no longer be in flight
    pub fn reset_descriptor_pools(&self) -> Result<()> {
        self.descriptors()?.reset_pools(&self.device)
    }

    /// Destroy every descriptor pool (shutdown only)
    pub fn dispose_descriptor_pools(&self) -> Result<()> {
        self.descriptors()?.dispose_pools();
        Ok(())
    }

    pub fn descriptors(&self) -> Result<MutexGuard<'_, DescriptorAllocator<D>>> {
        self.descriptors.lock().map_err(|_| {
            engine_error!("galaxy3d::gpu::Context", "Descriptor allocator lock poisoned");
            Error::BackendError("descriptor allocator lock poisoned".to_string())
        })
    }

    // ===== SUBMISSION =====

    /// Submit recorders, block until the device is idle, then complete each recorder
    ///
    /// Recorders still recording are ended first. When one fails to submit,
    /// the ones queued before it are still waited on and completed before the
    /// error is returned.
    pub fn submit_and_wait(&self, recorders: &mut [&mut CommandRecorder<D>]) -> Result<()> {
        let mut submitted = 0;
        let mut failure = None;
        for recorder in recorders.iter_mut() {
            if let Err(e) = self.submit_recorder(recorder) {
                failure = Some(e);
                break;
            }
            submitted += 1;
        }

        if submitted > 0 {
            self.device.wait_idle()?;
            for recorder in recorders[..submitted].iter_mut() {
                recorder.complete();
            }
        }

        match failure {
            Some(e) => {
                if submitted > 0 {
                    engine_warn!("galaxy3d::gpu::Context",
                        "Submission stopped after {} of {} recorders", submitted, recorders.len());
                }
                Err(e)
            }
            None => Ok(()),
        }
    }

    fn submit_recorder(&self, recorder: &mut CommandRecorder<D>) -> Result<()> {
        match recorder.state() {
            RecorderState::Recording => recorder.end()?,
            RecorderState::Ended => {}
            state => {
                engine_error!("galaxy3d::gpu::Context",
                    "Cannot submit '{}' in state {:?}", recorder.label(), state);
                return Err(Error::SynchronizationMisuse(format!(
                    "recorder '{}' has nothing to submit", recorder.label())));
            }
        }
        self.device.submit(recorder.encoder(), &SubmitSync::none())?;
        recorder.mark_submitted()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
