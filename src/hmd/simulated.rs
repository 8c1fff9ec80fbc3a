//! Desktop stand-in for a headset
//!
//! Controls on the mirror window:
//! - WASD moves, Q/E lowers and raises the head, right-drag looks around
//! - the controller hangs below the head and aims at the mouse cursor
//! - left mouse is the index trigger, Backspace the hand trigger
//! - arrow keys drive the thumbstick, Enter clicks it
//! - Tab presses Y, Shift+Tab presses X
//! - R asks for a recenter

use std::time::{Duration, Instant};

use glam::{Quat, Vec2, Vec3};
use tracing::{debug, info};
use winit::keyboard::KeyCode;

use super::{
    ControllerButtons, ControllerState, Hand, HmdDescription, HmdError, HmdRuntime,
    SessionStatus, TrackingState,
};
use crate::app::input::DesktopInput;
use crate::camera::{Fov, Pose, calc_eye_poses};
use crate::config::HmdConfig;
use crate::render::MirrorMode;
use crate::render::mirror::eye_under_cursor;

/// Metres per second
const MOVE_SPEED: f32 = 1.5;
/// Radians per pixel of right-drag
const LOOK_SENSITIVITY: f32 = 0.004;
const MAX_PITCH: f32 = 1.45;
/// Controller position relative to the head, right hand
const CONTROLLER_OFFSET: Vec3 = Vec3::new(0.2, -0.35, -0.3);
/// Distance of the point the controller aims at
const AIM_DISTANCE: f32 = 2.5;
const REFRESH_RATE: f32 = 90.0;
/// Longest step integrated at once, so a stall does not teleport the head
const MAX_STEP: f32 = 0.1;

/// Controls sampled from the desktop since the last frame
#[derive(Debug, Clone, Default)]
struct Controls {
    /// x right, y up, z backwards in the head's yaw frame
    movement: Vec3,
    look_delta: Vec2,
    /// Normalised cursor, y down
    cursor: Option<Vec2>,
    trigger: bool,
    hand_trigger: bool,
    thumbstick: Vec2,
    buttons: ControllerButtons,
}

/// Mouse-and-keyboard headset emulation
pub struct SimulatedHmd {
    description: HmdDescription,
    hand: Hand,
    head_height: f32,
    position: Vec3,
    yaw: f32,
    pitch: f32,
    controls: Controls,
    /// Decides which eye image lies under the cursor
    mirror_mode: MirrorMode,
    recenter_requested: bool,
    started: Instant,
    last_frame: Option<Instant>,
    frame_index: u64,
    in_frame: bool,
}

impl SimulatedHmd {
    pub fn new(config: &HmdConfig) -> Self {
        let half_ipd = config.ipd * 0.5;
        let fov = config.fov();

        let description = HmdDescription {
            display_name: "Simulated HMD".to_string(),
            eye_resolution: config.eye_resolution(),
            fov: [fov; 2],
            eye_offsets: [
                Pose::new(Vec3::new(-half_ipd, 0.0, 0.0), Quat::IDENTITY),
                Pose::new(Vec3::new(half_ipd, 0.0, 0.0), Quat::IDENTITY),
            ],
            refresh_rate: REFRESH_RATE,
        };

        Self {
            description,
            hand: config.hand,
            head_height: config.head_height,
            position: Vec3::new(0.0, config.head_height, 0.0),
            yaw: 0.0,
            pitch: 0.0,
            controls: Controls::default(),
            mirror_mode: config.mirror,
            recenter_requested: false,
            started: Instant::now(),
            last_frame: None,
            frame_index: 0,
            in_frame: false,
        }
    }

    fn yaw_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    fn head_pose(&self) -> Pose {
        Pose::new(
            self.position,
            self.yaw_rotation() * Quat::from_rotation_x(self.pitch),
        )
    }

    /// Integrates movement and look input over `dt` seconds
    fn step(&mut self, dt: f32) {
        let dt = dt.clamp(0.0, MAX_STEP);

        self.yaw -= self.controls.look_delta.x * LOOK_SENSITIVITY;
        self.pitch = (self.pitch - self.controls.look_delta.y * LOOK_SENSITIVITY)
            .clamp(-MAX_PITCH, MAX_PITCH);
        self.controls.look_delta = Vec2::ZERO;

        let movement = self.controls.movement;
        if movement != Vec3::ZERO {
            self.position += self.yaw_rotation() * movement.normalize() * MOVE_SPEED * dt;
        }
    }

    /// Point seen under the cursor at [`AIM_DISTANCE`], in tracking space
    ///
    /// The ray starts at the eye whose mirror image is under the cursor.
    fn cursor_target(&self, head: &Pose) -> Vec3 {
        let Some((eye, cursor)) = self
            .controls
            .cursor
            .and_then(|cursor| eye_under_cursor(self.mirror_mode, cursor))
        else {
            return head.position + head.forward() * AIM_DISTANCE;
        };

        let eye_pose = head.compose(&self.description.eye_offsets[eye.index()]);
        let fov: &Fov = &self.description.fov[eye.index()];
        let ndc = Vec2::new(cursor.x * 2.0 - 1.0, 1.0 - cursor.y * 2.0);
        let x = if ndc.x < 0.0 {
            ndc.x * fov.left_tan
        } else {
            ndc.x * fov.right_tan
        };
        let y = if ndc.y < 0.0 {
            ndc.y * fov.down_tan
        } else {
            ndc.y * fov.up_tan
        };

        let direction = eye_pose.orientation * Vec3::new(x, y, -1.0).normalize();
        eye_pose.position + direction * AIM_DISTANCE
    }

    fn controller(&self, head: &Pose, hand: Hand) -> ControllerState {
        let side = match hand {
            Hand::Left => -1.0,
            Hand::Right => 1.0,
        };
        let offset = CONTROLLER_OFFSET * Vec3::new(side, 1.0, 1.0);
        let position = self.position + self.yaw_rotation() * offset;

        let target = self.cursor_target(head);
        let aim = (target - position).normalize_or(head.forward());
        let orientation = Quat::from_rotation_arc(Vec3::NEG_Z, aim);

        if hand != self.hand {
            // Idle hand rests beside the body
            return ControllerState {
                pose: Pose::new(position, self.yaw_rotation()),
                active: true,
                ..ControllerState::default()
            };
        }

        ControllerState {
            pose: Pose::new(position, orientation),
            thumbstick: self.controls.thumbstick,
            index_trigger: if self.controls.trigger { 1.0 } else { 0.0 },
            hand_trigger: if self.controls.hand_trigger { 1.0 } else { 0.0 },
            buttons: self.controls.buttons,
            active: true,
        }
    }

    fn tracking_state(&self, display_time: Duration) -> TrackingState {
        let head = self.head_pose();
        TrackingState {
            display_time,
            frame_index: self.frame_index,
            head,
            eyes: calc_eye_poses(&head, &self.description.eye_offsets),
            controllers: [
                self.controller(&head, Hand::Left),
                self.controller(&head, Hand::Right),
            ],
        }
    }
}

impl HmdRuntime for SimulatedHmd {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn description(&self) -> &HmdDescription {
        &self.description
    }

    fn begin_frame(&mut self) -> Result<TrackingState, HmdError> {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| (now - last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        self.step(dt);
        self.frame_index += 1;
        self.in_frame = true;

        let period = Duration::from_secs_f32(1.0 / self.description.refresh_rate);
        Ok(self.tracking_state(now - self.started + period))
    }

    fn end_frame(&mut self) -> Result<SessionStatus, HmdError> {
        if !std::mem::take(&mut self.in_frame) {
            return Err(HmdError::runtime("end_frame", "no frame in flight"));
        }

        Ok(SessionStatus {
            should_recenter: std::mem::take(&mut self.recenter_requested),
            ..SessionStatus::default()
        })
    }

    fn set_mirror_mode(&mut self, mode: MirrorMode) {
        self.mirror_mode = mode;
    }

    fn recenter(&mut self) -> Result<(), HmdError> {
        self.position = Vec3::new(0.0, self.head_height, 0.0);
        self.yaw = 0.0;
        self.pitch = 0.0;
        info!("Simulated tracking origin recentered");
        Ok(())
    }

    fn feed_desktop_input(&mut self, input: &DesktopInput) {
        let keys = &input.keyboard;

        self.controls.movement = Vec3::new(
            keys.axis(KeyCode::KeyA, KeyCode::KeyD),
            keys.axis(KeyCode::KeyQ, KeyCode::KeyE),
            keys.axis(KeyCode::KeyW, KeyCode::KeyS),
        );

        if input.mouse.buttons.right.is_down() {
            self.controls.look_delta += input.mouse.drag_delta;
        }
        self.controls.cursor = input.mouse.normalized_pos;

        self.controls.trigger = input.mouse.buttons.left.is_down();
        self.controls.hand_trigger = keys.is_held(KeyCode::Backspace);
        self.controls.thumbstick = Vec2::new(
            keys.axis(KeyCode::ArrowLeft, KeyCode::ArrowRight),
            keys.axis(KeyCode::ArrowDown, KeyCode::ArrowUp),
        );

        let tab = keys.is_held(KeyCode::Tab);
        let mut buttons = ControllerButtons::empty();
        buttons.set(ControllerButtons::THUMBSTICK, keys.is_held(KeyCode::Enter));
        buttons.set(ControllerButtons::Y, tab && !keys.modifiers.shift);
        buttons.set(ControllerButtons::X, tab && keys.modifiers.shift);
        self.controls.buttons = buttons;

        if keys.was_pressed(KeyCode::KeyR) {
            debug!("Recenter requested from keyboard");
            self.recenter_requested = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::input::ButtonState;

    fn runtime() -> SimulatedHmd {
        SimulatedHmd::new(&HmdConfig::default())
    }

    fn input_with_keys(keys: &[KeyCode]) -> DesktopInput {
        let mut input = DesktopInput::new();
        input.keyboard.held.extend(keys.iter().copied());
        input
    }

    #[test]
    fn head_starts_at_configured_height() {
        let mut hmd = runtime();
        let state = hmd.begin_frame().expect("frame");
        assert!((state.head.position.y - 1.6).abs() < 1e-5);
        assert_eq!(state.frame_index, 1);
    }

    #[test]
    fn eyes_are_one_ipd_apart() {
        let mut hmd = runtime();
        let state = hmd.begin_frame().expect("frame");
        let separation = state.eyes[0].position.distance(state.eyes[1].position);
        assert!((separation - 0.063).abs() < 1e-5);
        assert!(state.eyes[0].position.x < state.eyes[1].position.x);
    }

    #[test]
    fn forward_key_moves_along_view_direction() {
        let mut hmd = runtime();
        hmd.feed_desktop_input(&input_with_keys(&[KeyCode::KeyW]));
        hmd.step(0.1);

        assert!(hmd.position.z < -0.1);
        assert!(hmd.position.x.abs() < 1e-5);
    }

    #[test]
    fn large_frame_gaps_are_clamped() {
        let mut hmd = runtime();
        hmd.feed_desktop_input(&input_with_keys(&[KeyCode::KeyD]));
        hmd.step(5.0);
        assert!((hmd.position.x - MOVE_SPEED * MAX_STEP).abs() < 1e-4);
    }

    #[test]
    fn right_drag_turns_the_head() {
        let mut hmd = runtime();
        let mut input = DesktopInput::new();
        input.mouse.buttons.right = ButtonState::Pressed;
        input.mouse.drag_delta = Vec2::new(100.0, 0.0);
        hmd.feed_desktop_input(&input);
        hmd.step(0.0);

        // Dragging right turns right: forward gains +X
        assert!(hmd.head_pose().forward().x > 0.1);
    }

    fn aim_error(state: &TrackingState, target: Vec3) -> f32 {
        let controller = state.controller(Hand::Right);
        let aim = (target - controller.pose.position).normalize();
        controller.pose.forward().distance(aim)
    }

    fn cursor_at(hmd: &mut SimulatedHmd, cursor: Vec2) {
        let mut input = DesktopInput::new();
        input.mouse.normalized_pos = Some(cursor);
        hmd.feed_desktop_input(&input);
    }

    #[test]
    fn centred_cursor_aims_controller_at_view_centre() {
        let mut hmd = runtime();
        hmd.set_mirror_mode(MirrorMode::Left);
        cursor_at(&mut hmd, Vec2::splat(0.5));

        let state = hmd.begin_frame().expect("frame");
        let target = state.eyes[0].position + state.head.forward() * AIM_DISTANCE;

        assert!(aim_error(&state, target) < 1e-4);
        assert!(state.controller(Hand::Right).active);
    }

    #[test]
    fn side_by_side_cursor_aims_through_the_eye_under_it() {
        let mut hmd = runtime();
        hmd.set_mirror_mode(MirrorMode::SideBySide);

        // Centre of the left half is the centre of the left eye image
        cursor_at(&mut hmd, Vec2::new(0.25, 0.5));
        let state = hmd.begin_frame().expect("frame");
        let left_target = state.eyes[0].position + state.head.forward() * AIM_DISTANCE;
        assert!(aim_error(&state, left_target) < 1e-4);
        hmd.end_frame().expect("submit");

        cursor_at(&mut hmd, Vec2::new(0.75, 0.5));
        let state = hmd.begin_frame().expect("frame");
        let right_target = state.eyes[1].position + state.head.forward() * AIM_DISTANCE;
        assert!(aim_error(&state, right_target) < 1e-4);
    }

    #[test]
    fn mirror_mode_comes_from_config() {
        let config = HmdConfig {
            mirror: MirrorMode::Right,
            ..HmdConfig::default()
        };
        let mut hmd = SimulatedHmd::new(&config);
        cursor_at(&mut hmd, Vec2::splat(0.5));

        let state = hmd.begin_frame().expect("frame");
        let target = state.eyes[1].position + state.head.forward() * AIM_DISTANCE;
        assert!(aim_error(&state, target) < 1e-4);
    }

    #[test]
    fn mouse_and_keys_map_to_controller_inputs() {
        let mut hmd = runtime();
        let mut input =
            input_with_keys(&[KeyCode::ArrowUp, KeyCode::Enter, KeyCode::Backspace, KeyCode::Tab]);
        input.mouse.buttons.left = ButtonState::JustPressed;
        hmd.feed_desktop_input(&input);

        let state = hmd.begin_frame().expect("frame");
        let right = state.controller(Hand::Right);
        assert_eq!(right.index_trigger, 1.0);
        assert_eq!(right.hand_trigger, 1.0);
        assert_eq!(right.thumbstick, Vec2::new(0.0, 1.0));
        assert!(right.buttons.contains(ControllerButtons::THUMBSTICK | ControllerButtons::Y));
        assert!(!right.buttons.contains(ControllerButtons::X));

        // The other hand stays idle
        assert_eq!(state.controller(Hand::Left).index_trigger, 0.0);
    }

    #[test]
    fn recenter_request_is_reported_once() {
        let mut hmd = runtime();
        let mut input = DesktopInput::new();
        input.keyboard.pressed.insert(KeyCode::KeyR);
        hmd.feed_desktop_input(&input);

        hmd.begin_frame().expect("frame");
        assert!(hmd.end_frame().expect("submit").should_recenter);

        hmd.begin_frame().expect("frame");
        assert!(!hmd.end_frame().expect("submit").should_recenter);
    }

    #[test]
    fn recenter_restores_origin() {
        let mut hmd = runtime();
        hmd.position = Vec3::new(3.0, 0.5, 2.0);
        hmd.yaw = 1.0;
        hmd.recenter().expect("recenter");
        assert_eq!(hmd.head_pose(), Pose::new(Vec3::new(0.0, 1.6, 0.0), Quat::IDENTITY));
    }

    #[test]
    fn end_frame_without_begin_is_an_error() {
        let mut hmd = runtime();
        assert!(hmd.end_frame().is_err());
    }
}
