//! Head-mounted display session wrapper
//!
//! One [`HmdRuntime`] is chosen at startup. Each frame the host calls
//! [`HmdRuntime::begin_frame`] to get predicted tracking, renders both eyes and
//! then calls [`HmdRuntime::end_frame`], which reports whether the session wants
//! the application to quit or recenter.

use std::time::Duration;

use bitflags::bitflags;
use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::app::input::DesktopInput;
use crate::camera::{Fov, Pose};
use crate::config::HmdConfig;
use crate::render::MirrorMode;

#[cfg(feature = "openxr")]
mod openxr_runtime;
mod simulated;

#[cfg(feature = "openxr")]
pub use openxr_runtime::OpenXrRuntime;
pub use simulated::SimulatedHmd;

/// Errors reported by an HMD runtime
#[derive(Debug, Error)]
pub enum HmdError {
    /// The runtime cannot be used in this build or on this machine
    #[error("HMD runtime unavailable: {0}")]
    Unavailable(String),

    /// A runtime call failed
    #[error("HMD runtime call `{call}` failed: {reason}")]
    Runtime { call: &'static str, reason: String },

    /// The session was lost and has to be recreated
    #[error("HMD session lost")]
    SessionLost,
}

impl HmdError {
    pub fn runtime(call: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Runtime {
            call,
            reason: reason.to_string(),
        }
    }
}

/// Which runtime backs the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// Desktop stand-in driven by mouse and keyboard
    Simulated,
    /// OpenXR loader (requires the `openxr` feature)
    #[value(name = "openxr")]
    OpenXr,
}

impl RuntimeKind {
    pub fn label(self) -> &'static str {
        match self {
            RuntimeKind::Simulated => "simulated",
            RuntimeKind::OpenXr => "openxr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const BOTH: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn index(self) -> usize {
        match self {
            Hand::Left => 0,
            Hand::Right => 1,
        }
    }
}

bitflags! {
    /// Digital controller inputs
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ControllerButtons: u32 {
        const A = 1 << 0;
        const B = 1 << 1;
        const X = 1 << 2;
        const Y = 1 << 3;
        const THUMBSTICK = 1 << 4;
        const MENU = 1 << 5;
    }
}

/// One tracked hand controller
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerState {
    /// Aim pose in tracking space, pointing along -Z
    pub pose: Pose,
    /// Each axis in `[-1, 1]`, +Y up
    pub thumbstick: Vec2,
    /// `[0, 1]`
    pub index_trigger: f32,
    /// `[0, 1]`
    pub hand_trigger: f32,
    pub buttons: ControllerButtons,
    /// False when the controller is not tracked or not connected
    pub active: bool,
}

/// Predicted tracking for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingState {
    /// Predicted display time since the session started
    pub display_time: Duration,
    pub frame_index: u64,
    pub head: Pose,
    /// Head pose with the head-to-eye offsets applied
    pub eyes: [Pose; 2],
    pub controllers: [ControllerState; 2],
}

impl TrackingState {
    pub fn controller(&self, hand: Hand) -> &ControllerState {
        &self.controllers[hand.index()]
    }
}

/// Flags returned when a frame is submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub should_quit: bool,
    pub should_recenter: bool,
    /// False while the compositor is not showing this application
    pub visible: bool,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            should_quit: false,
            should_recenter: false,
            visible: true,
        }
    }
}

/// Static properties of the headset
#[derive(Debug, Clone, PartialEq)]
pub struct HmdDescription {
    pub display_name: String,
    /// Recommended per-eye render target size
    pub eye_resolution: UVec2,
    pub fov: [Fov; 2],
    /// Head-to-eye offsets
    pub eye_offsets: [Pose; 2],
    pub refresh_rate: f32,
}

impl HmdDescription {
    pub fn ipd(&self) -> f32 {
        self.eye_offsets[0]
            .position
            .distance(self.eye_offsets[1].position)
    }
}

/// A VR runtime session
pub trait HmdRuntime {
    /// Short runtime identifier for logs
    fn name(&self) -> &'static str;

    fn description(&self) -> &HmdDescription;

    /// Waits for the next frame slot and returns predicted tracking
    fn begin_frame(&mut self) -> Result<TrackingState, HmdError>;

    /// Submits the frame started by [`HmdRuntime::begin_frame`]
    fn end_frame(&mut self) -> Result<SessionStatus, HmdError>;

    /// Resets the tracking origin to the current head pose
    fn recenter(&mut self) -> Result<(), HmdError>;

    /// Desktop mouse and keyboard for runtimes that emulate a headset
    fn feed_desktop_input(&mut self, _input: &DesktopInput) {}

    /// Which eye images the desktop window shows, for runtimes that read its cursor
    fn set_mirror_mode(&mut self, _mode: MirrorMode) {}
}

/// Creates the runtime selected in `config`
pub fn create_runtime(config: &HmdConfig) -> Result<Box<dyn HmdRuntime>, HmdError> {
    let runtime: Box<dyn HmdRuntime> = match config.runtime {
        RuntimeKind::Simulated => Box::new(SimulatedHmd::new(config)),
        #[cfg(feature = "openxr")]
        RuntimeKind::OpenXr => Box::new(OpenXrRuntime::new(config)?),
        #[cfg(not(feature = "openxr"))]
        RuntimeKind::OpenXr => {
            return Err(HmdError::Unavailable(
                "built without the `openxr` feature".to_string(),
            ));
        }
    };

    let description = runtime.description();
    info!(
        runtime = runtime.name(),
        hmd = %description.display_name,
        eye.width = description.eye_resolution.x,
        eye.height = description.eye_resolution.y,
        ipd = description.ipd(),
        refresh_rate = description.refresh_rate,
        "HMD runtime created"
    );

    Ok(runtime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_runtime_is_always_available() {
        let runtime = create_runtime(&HmdConfig::default()).expect("simulated runtime");
        assert_eq!(runtime.name(), "simulated");
        assert!((runtime.description().ipd() - 0.063).abs() < 1e-5);
    }

    #[cfg(not(feature = "openxr"))]
    #[test]
    fn openxr_without_feature_is_unavailable() {
        let config = HmdConfig {
            runtime: RuntimeKind::OpenXr,
            ..HmdConfig::default()
        };
        assert!(matches!(
            create_runtime(&config),
            Err(HmdError::Unavailable(_))
        ));
    }

    #[test]
    fn tracking_state_indexes_by_hand() {
        let mut controllers = [ControllerState::default(); 2];
        controllers[1].index_trigger = 1.0;
        let state = TrackingState {
            display_time: Duration::ZERO,
            frame_index: 0,
            head: Pose::IDENTITY,
            eyes: [Pose::IDENTITY; 2],
            controllers,
        };
        assert_eq!(state.controller(Hand::Right).index_trigger, 1.0);
        assert_eq!(state.controller(Hand::Left).index_trigger, 0.0);
    }
}
