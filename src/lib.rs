//! VR GUI
//!
//! Renders an egui panel on a quad floating in a VR scene and drives it with a
//! tracked hand controller: the controller ray becomes the mouse pointer, the
//! trigger clicks, and thumbstick and face buttons move keyboard focus.

/// Desktop host: mirror window, frame loop, debug overlay and demo panel
pub mod app;

/// Build-time information (git SHA, branch, timestamp, etc.)
pub mod build_info;

/// Tracking-space poses, stereo eye views and projections
pub mod camera;

/// Profile-based configuration
pub mod config;

pub mod error;

/// egui backend for the world-space panel
pub mod gui;

/// Startup health checks
pub mod health;

/// Headset runtimes: simulated and OpenXR
pub mod hmd;

pub mod logging;

/// Controller ray against the panel quad
pub mod raycast;

/// wgpu renderer for the eye targets and the mirror window
pub mod render;

pub use error::{Error, Result};
