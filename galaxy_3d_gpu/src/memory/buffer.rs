/// Buffer descriptor and the buffer resource trait

use crate::error::{Error, Result};
use crate::graphics_device::BufferUsage;
use crate::engine_error;

/// Where a buffer's memory lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryLocation {
    /// Host-visible, mapped once for the whole lifetime of the buffer
    HostVisible,
    /// Device-local, only reachable through GPU copies
    DeviceLocal,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    pub usage: BufferUsage,
    pub location: MemoryLocation,
    /// Debug name given to the allocation
    pub label: String,
}

impl BufferDesc {
    /// Host-visible buffer, the common case
    pub fn host(size: u64, usage: BufferUsage, label: impl Into<String>) -> Self {
        Self { size, usage, location: MemoryLocation::HostVisible, label: label.into() }
    }

    pub fn device_local(size: u64, usage: BufferUsage, label: impl Into<String>) -> Self {
        Self { size, usage, location: MemoryLocation::DeviceLocal, label: label.into() }
    }
}

/// Buffer resource
///
/// Implemented by backend buffer types. Memory is released when the buffer
/// is dropped; host-visible buffers are zero-filled at creation and stay
/// mapped until then.
pub trait GpuBuffer: Send + Sync {
    fn desc(&self) -> &BufferDesc;

    /// Copy `data` into mapped memory at `offset` and flush the range
    ///
    /// Implementations validate the range and reject device-local buffers.
    fn write_mapped(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Read `len` bytes of mapped memory starting at `offset`
    fn read_mapped(&self, offset: u64, len: u64) -> Result<Vec<u8>>;

    fn size(&self) -> u64 {
        self.desc().size
    }

    /// Copy `size` bytes of `data` to `offset`; a size of 0 copies up to the end of the buffer
    fn copy_from(&self, data: &[u8], size: u64, offset: u64) -> Result<()> {
        let desc = self.desc();
        if desc.location != MemoryLocation::HostVisible {
            engine_error!("galaxy3d::gpu::Buffer", "Buffer '{}' is not host-visible", desc.label);
            return Err(Error::InvalidResource(format!("buffer '{}' is not host-visible", desc.label)));
        }
        if offset > desc.size {
            engine_error!("galaxy3d::gpu::Buffer", "Offset {} is past the end of '{}' ({} bytes)",
                offset, desc.label, desc.size);
            return Err(Error::InvalidResource(format!("offset {} out of range", offset)));
        }

        let size = if size == 0 { desc.size - offset } else { size };
        if offset + size > desc.size || (data.len() as u64) < size {
            engine_error!("galaxy3d::gpu::Buffer",
                "Write of {} bytes at {} into '{}' ({} bytes) from {} source bytes",
                size, offset, desc.label, desc.size, data.len());
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at offset {} does not fit", size, offset)));
        }

        self.write_mapped(offset, &data[..size as usize])
    }

    /// Copy all of `data` to `offset`
    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.copy_from(data, data.len() as u64, offset)
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
