//! Helpers shared by unit tests

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use crate::config::GpuConfig;
use crate::context::GraphicsContext;
use crate::engine::Engine;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::log::{LogEntry, LogSeverity, Logger};

pub type MockContext = Arc<GraphicsContext<MockGraphicsDevice>>;

static NEXT_DIRECTORY: AtomicU32 = AtomicU32::new(0);

/// Fresh project directory under the system temp directory
pub fn temp_project_directory() -> PathBuf {
    std::env::temp_dir().join(format!(
        "galaxy3d_gpu_test_{}_{}",
        std::process::id(),
        NEXT_DIRECTORY.fetch_add(1, Ordering::Relaxed)
    ))
}

/// Default configuration with a private project directory
pub fn test_config() -> GpuConfig {
    GpuConfig::default().with_project_directory(temp_project_directory())
}

pub fn mock_context() -> MockContext {
    GraphicsContext::new(MockGraphicsDevice::new(), test_config()).unwrap()
}

pub fn mock_context_with(device: MockGraphicsDevice, config: GpuConfig) -> MockContext {
    GraphicsContext::new(device, config).unwrap()
}

/// Logger that stores every entry for later inspection
#[derive(Clone, Default)]
pub struct CaptureLogger {
    pub entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    /// Install a fresh capture logger and return a handle to its entries
    pub fn install() -> Self {
        let logger = Self::default();
        Engine::set_logger(logger.clone());
        logger
    }

    pub fn count(&self, severity: LogSeverity) -> usize {
        self.entries.lock().unwrap().iter().filter(|e| e.severity == severity).count()
    }

    pub fn contains(&self, severity: LogSeverity, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.severity == severity && e.message.contains(needle))
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}
