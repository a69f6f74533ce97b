//! Crate-wide error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeroError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings override is not valid TOML: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to acquire GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("simulation thread is gone")]
    WorkerGone,
}
