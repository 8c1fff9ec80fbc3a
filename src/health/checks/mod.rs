//! Built-in health checks for core systems

pub mod build_info;
pub mod config;
pub mod graphics_backend;
pub mod gui_panel;
pub mod hmd_runtime;
pub mod system_info;

pub use build_info::BuildInfoCheck;
pub use config::ConfigCheck;
pub use graphics_backend::GraphicsBackendCheck;
pub use gui_panel::GuiPanelCheck;
pub use hmd_runtime::HmdRuntimeCheck;
pub use system_info::SystemInfoCheck;
