//! Error types shared by the library modules

use thiserror::Error;

/// Errors surfaced by the VR GUI layer
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or deserialized
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Mirror window could not be created
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// wgpu could not create a surface for the mirror window
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// No adapter matched the requested backends
    #[error("no compatible GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    /// Device creation failed
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    /// The async runtime used to block on GPU setup could not start
    #[error("failed to start async runtime: {0}")]
    AsyncRuntime(#[from] std::io::Error),

    /// HMD runtime failure
    #[error(transparent)]
    Hmd(#[from] crate::hmd::HmdError),
}

/// Result alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;
