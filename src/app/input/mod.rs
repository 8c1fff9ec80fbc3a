//! Desktop input handling
//!
//! The mirror window is the only desktop surface. Its mouse and keyboard feed
//! two consumers: the debug overlay (through egui-winit) and the simulated HMD
//! runtime, which turns them into head and controller motion.
//!
//! ```text
//! Raw Input (winit) → InputCollector → DesktopInput → HmdRuntime::feed_desktop_input
//! ```

mod collector;
mod state;

pub use collector::InputCollector;
pub use state::{ButtonState, DesktopInput, KeyboardState, Modifiers, MouseButtons, MouseState};
