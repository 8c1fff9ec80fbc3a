//! Desktop host application
//!
//! Owns the mirror window, the HMD session and the GUI panel, and runs the
//! per-frame loop between them.

mod debug_ui;
pub mod input;
mod panel;
mod runner;
mod window;

pub use debug_ui::{DebugInfo, DebugUi, DebugUiResponse};
pub use panel::{DemoPanel, PanelInfo};
pub use runner::App;
pub use window::{window_attributes_from_config, window_title};
