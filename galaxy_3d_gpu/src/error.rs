//! Error types for the Galaxy3D GPU layer
//!
//! Every fallible operation returns [`Result`]. Errors are logged at the
//! point they are raised (see the `engine_err!` family of macros) and then
//! propagated to the application, which decides whether to abort.

use std::fmt;

/// Result type for Galaxy3D GPU operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D GPU errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan result codes, driver failures)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (bad descriptor, out of range write, unknown member)
    InvalidResource(String),

    /// Initialization failed (instance, device, surface)
    InitializationFailed(String),

    /// Allocation failure, unsupported format or device limit exceeded
    ResourceCreationFailure(String),

    /// Binding or recording call made in the wrong state
    SynchronizationMisuse(String),

    /// A required device extension or feature is missing
    CapabilityUnsupported(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ResourceCreationFailure(msg) => write!(f, "Resource creation failed: {}", msg),
            Error::SynchronizationMisuse(msg) => write!(f, "Synchronization misuse: {}", msg),
            Error::CapabilityUnsupported(msg) => write!(f, "Capability unsupported: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
