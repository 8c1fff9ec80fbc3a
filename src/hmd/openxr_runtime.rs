//! OpenXR-backed session
//!
//! Runs a headless session (`XR_MND_headless`): the runtime supplies frame
//! timing, head and eye tracking, controller input and session lifecycle, while
//! the stereo images are presented on the desktop mirror.

use std::time::Duration;

use glam::{Quat, UVec2, Vec2, Vec3};
use openxr as xr;
use tracing::{debug, info, warn};

use super::{
    ControllerButtons, ControllerState, Hand, HmdDescription, HmdError, HmdRuntime,
    SessionStatus, TrackingState,
};
use crate::camera::{Fov, Pose, calc_eye_poses};
use crate::config::HmdConfig;

const VIEW_TYPE: xr::ViewConfigurationType = xr::ViewConfigurationType::PRIMARY_STEREO;

fn to_pose(pose: xr::Posef) -> Pose {
    Pose::new(
        Vec3::new(pose.position.x, pose.position.y, pose.position.z),
        Quat::from_xyzw(
            pose.orientation.x,
            pose.orientation.y,
            pose.orientation.z,
            pose.orientation.w,
        ),
    )
}

fn to_fov(fov: xr::Fovf) -> Fov {
    Fov::from_angles(fov.angle_left, fov.angle_right, fov.angle_up, fov.angle_down)
}

/// Yaw-only floor-level pose under `head`
fn floor_origin(head: &Pose) -> Pose {
    let forward = head.forward();
    let yaw = (-forward.x).atan2(-forward.z);
    Pose::new(
        Vec3::new(head.position.x, 0.0, head.position.z),
        Quat::from_rotation_y(yaw),
    )
}

struct ControllerActions {
    action_set: xr::ActionSet,
    aim: xr::Action<xr::Posef>,
    trigger: xr::Action<f32>,
    squeeze: xr::Action<f32>,
    thumbstick: xr::Action<xr::Vector2f>,
    thumbstick_click: xr::Action<bool>,
    primary: xr::Action<bool>,
    secondary: xr::Action<bool>,
    menu: xr::Action<bool>,
    paths: [xr::Path; 2],
    spaces: [xr::Space; 2],
}

impl ControllerActions {
    fn new(instance: &xr::Instance, session: &xr::Session<xr::Headless>) -> Result<Self, HmdError> {
        let fail = |call: &'static str| move |e: xr::sys::Result| HmdError::runtime(call, e);

        let action_set = instance
            .create_action_set("panel", "GUI panel", 0)
            .map_err(fail("xrCreateActionSet"))?;

        let paths = [
            instance
                .string_to_path("/user/hand/left")
                .map_err(fail("xrStringToPath"))?,
            instance
                .string_to_path("/user/hand/right")
                .map_err(fail("xrStringToPath"))?,
        ];

        let aim = action_set
            .create_action("aim", "Aim pose", &paths)
            .map_err(fail("xrCreateAction"))?;
        let trigger = action_set
            .create_action("trigger", "Trigger", &paths)
            .map_err(fail("xrCreateAction"))?;
        let squeeze = action_set
            .create_action("squeeze", "Squeeze", &paths)
            .map_err(fail("xrCreateAction"))?;
        let thumbstick = action_set
            .create_action("thumbstick", "Thumbstick", &paths)
            .map_err(fail("xrCreateAction"))?;
        let thumbstick_click = action_set
            .create_action("thumbstick_click", "Thumbstick click", &paths)
            .map_err(fail("xrCreateAction"))?;
        let primary = action_set
            .create_action("primary", "A / X", &paths)
            .map_err(fail("xrCreateAction"))?;
        let secondary = action_set
            .create_action("secondary", "B / Y", &paths)
            .map_err(fail("xrCreateAction"))?;
        let menu = action_set
            .create_action("menu", "Menu", &paths)
            .map_err(fail("xrCreateAction"))?;

        let path = |p: &str| instance.string_to_path(p);

        let touch = [
            (path("/user/hand/left/input/aim/pose"), Binding::Pose),
            (path("/user/hand/right/input/aim/pose"), Binding::Pose),
            (path("/user/hand/left/input/trigger/value"), Binding::Trigger),
            (path("/user/hand/right/input/trigger/value"), Binding::Trigger),
            (path("/user/hand/left/input/squeeze/value"), Binding::Squeeze),
            (path("/user/hand/right/input/squeeze/value"), Binding::Squeeze),
            (path("/user/hand/left/input/thumbstick"), Binding::Thumbstick),
            (path("/user/hand/right/input/thumbstick"), Binding::Thumbstick),
            (path("/user/hand/left/input/thumbstick/click"), Binding::ThumbstickClick),
            (path("/user/hand/right/input/thumbstick/click"), Binding::ThumbstickClick),
            (path("/user/hand/left/input/x/click"), Binding::Primary),
            (path("/user/hand/right/input/a/click"), Binding::Primary),
            (path("/user/hand/left/input/y/click"), Binding::Secondary),
            (path("/user/hand/right/input/b/click"), Binding::Secondary),
            (path("/user/hand/left/input/menu/click"), Binding::Menu),
        ];
        let simple = [
            (path("/user/hand/left/input/aim/pose"), Binding::Pose),
            (path("/user/hand/right/input/aim/pose"), Binding::Pose),
            (path("/user/hand/left/input/select/click"), Binding::Trigger),
            (path("/user/hand/right/input/select/click"), Binding::Trigger),
            (path("/user/hand/left/input/menu/click"), Binding::Menu),
            (path("/user/hand/right/input/menu/click"), Binding::Menu),
        ];

        let profiles: [(&str, &[_]); 2] = [
            ("/interaction_profiles/oculus/touch_controller", &touch),
            ("/interaction_profiles/khr/simple_controller", &simple),
        ];

        for (profile, entries) in profiles {
            let mut bindings = Vec::with_capacity(entries.len());
            for (binding_path, kind) in entries {
                let Ok(binding_path) = binding_path else {
                    continue;
                };
                bindings.push(match kind {
                    Binding::Pose => xr::Binding::new(&aim, *binding_path),
                    Binding::Trigger => xr::Binding::new(&trigger, *binding_path),
                    Binding::Squeeze => xr::Binding::new(&squeeze, *binding_path),
                    Binding::Thumbstick => xr::Binding::new(&thumbstick, *binding_path),
                    Binding::ThumbstickClick => xr::Binding::new(&thumbstick_click, *binding_path),
                    Binding::Primary => xr::Binding::new(&primary, *binding_path),
                    Binding::Secondary => xr::Binding::new(&secondary, *binding_path),
                    Binding::Menu => xr::Binding::new(&menu, *binding_path),
                });
            }

            let result = instance
                .string_to_path(profile)
                .and_then(|profile_path| {
                    instance.suggest_interaction_profile_bindings(profile_path, &bindings)
                });
            if let Err(e) = result {
                warn!(profile, error = %e, "Interaction profile bindings rejected");
            }
        }

        session
            .attach_action_sets(&[&action_set])
            .map_err(fail("xrAttachSessionActionSets"))?;

        let spaces = [
            aim.create_space(session.clone(), paths[0], xr::Posef::IDENTITY)
                .map_err(fail("xrCreateActionSpace"))?,
            aim.create_space(session.clone(), paths[1], xr::Posef::IDENTITY)
                .map_err(fail("xrCreateActionSpace"))?,
        ];

        Ok(Self {
            action_set,
            aim,
            trigger,
            squeeze,
            thumbstick,
            thumbstick_click,
            primary,
            secondary,
            menu,
            paths,
            spaces,
        })
    }

    fn sync(&self, session: &xr::Session<xr::Headless>) -> Result<(), HmdError> {
        session
            .sync_actions(&[xr::ActiveActionSet::new(&self.action_set)])
            .map_err(|e| HmdError::runtime("xrSyncActions", e))
    }

    fn controller(
        &self,
        session: &xr::Session<xr::Headless>,
        base: &xr::Space,
        time: xr::Time,
        hand: Hand,
    ) -> ControllerState {
        let path = self.paths[hand.index()];

        let location = self.spaces[hand.index()].locate(base, time).ok();
        let tracked = location.as_ref().is_some_and(|l| {
            l.location_flags
                .contains(xr::SpaceLocationFlags::POSITION_VALID | xr::SpaceLocationFlags::ORIENTATION_VALID)
        });
        let pose_active = self
            .aim
            .is_active(session, path)
            .unwrap_or(false);

        let float = |action: &xr::Action<f32>| {
            action
                .state(session, path)
                .map(|s| s.current_state)
                .unwrap_or(0.0)
        };
        let pressed = |action: &xr::Action<bool>| {
            action
                .state(session, path)
                .map(|s| s.current_state)
                .unwrap_or(false)
        };

        let stick = self
            .thumbstick
            .state(session, path)
            .map(|s| Vec2::new(s.current_state.x, s.current_state.y))
            .unwrap_or(Vec2::ZERO);

        let (primary, secondary) = match hand {
            Hand::Left => (ControllerButtons::X, ControllerButtons::Y),
            Hand::Right => (ControllerButtons::A, ControllerButtons::B),
        };
        let mut buttons = ControllerButtons::empty();
        buttons.set(primary, pressed(&self.primary));
        buttons.set(secondary, pressed(&self.secondary));
        buttons.set(ControllerButtons::THUMBSTICK, pressed(&self.thumbstick_click));
        buttons.set(ControllerButtons::MENU, pressed(&self.menu));

        ControllerState {
            pose: location.map(|l| to_pose(l.pose)).unwrap_or_default(),
            thumbstick: stick,
            index_trigger: float(&self.trigger),
            hand_trigger: float(&self.squeeze),
            buttons,
            active: pose_active && tracked,
        }
    }
}

#[derive(Clone, Copy)]
enum Binding {
    Pose,
    Trigger,
    Squeeze,
    Thumbstick,
    ThumbstickClick,
    Primary,
    Secondary,
    Menu,
}

/// Headless OpenXR session driving tracking, input and lifecycle
pub struct OpenXrRuntime {
    instance: xr::Instance,
    session: xr::Session<xr::Headless>,
    frame_waiter: xr::FrameWaiter,
    frame_stream: xr::FrameStream<xr::Headless>,
    base_space: xr::Space,
    view_space: xr::Space,
    actions: ControllerActions,
    event_buffer: xr::EventDataBuffer,
    description: HmdDescription,
    session_running: bool,
    pending_frame: Option<xr::FrameState>,
    frame_index: u64,
    status: SessionStatus,
    /// Tracking origin set by the last recenter
    origin: Pose,
    /// Last raw head pose, before the origin is applied
    raw_head: Pose,
    last_tracking: Option<TrackingState>,
}

impl OpenXrRuntime {
    pub fn new(config: &HmdConfig) -> Result<Self, HmdError> {
        let entry = unsafe { xr::Entry::load() }
            .map_err(|e| HmdError::Unavailable(format!("OpenXR loader not found: {e}")))?;

        let available = entry
            .enumerate_extensions()
            .map_err(|e| HmdError::runtime("xrEnumerateInstanceExtensionProperties", e))?;
        if !available.mnd_headless {
            return Err(HmdError::Unavailable(
                "runtime does not support XR_MND_headless".to_string(),
            ));
        }

        let mut extensions = xr::ExtensionSet::default();
        extensions.mnd_headless = true;

        let instance = entry
            .create_instance(
                &xr::ApplicationInfo {
                    application_name: "vr-gui",
                    application_version: 1,
                    engine_name: "vr-gui",
                    engine_version: 1,
                    api_version: xr::Version::new(1, 0, 0),
                },
                &extensions,
                &[],
            )
            .map_err(|e| HmdError::runtime("xrCreateInstance", e))?;

        if let Ok(properties) = instance.properties() {
            info!(
                runtime.name = %properties.runtime_name,
                runtime.version = %properties.runtime_version,
                "OpenXR instance created"
            );
        }

        let system = instance
            .system(xr::FormFactor::HEAD_MOUNTED_DISPLAY)
            .map_err(|e| HmdError::Unavailable(format!("no headset connected: {e}")))?;

        let display_name = instance
            .system_properties(system)
            .map(|p| p.system_name)
            .unwrap_or_else(|_| "OpenXR HMD".to_string());

        let eye_resolution = instance
            .enumerate_view_configuration_views(system, VIEW_TYPE)
            .ok()
            .and_then(|views| {
                views.first().map(|view| {
                    UVec2::new(
                        view.recommended_image_rect_width,
                        view.recommended_image_rect_height,
                    )
                })
            })
            .unwrap_or_else(|| config.eye_resolution());

        let (session, frame_waiter, frame_stream) = unsafe {
            instance.create_session::<xr::Headless>(system, &xr::headless::SessionCreateInfo {})
        }
        .map_err(|e| HmdError::runtime("xrCreateSession", e))?;

        let base_space = session
            .create_reference_space(xr::ReferenceSpaceType::STAGE, xr::Posef::IDENTITY)
            .or_else(|_| {
                session.create_reference_space(xr::ReferenceSpaceType::LOCAL, xr::Posef::IDENTITY)
            })
            .map_err(|e| HmdError::runtime("xrCreateReferenceSpace", e))?;
        let view_space = session
            .create_reference_space(xr::ReferenceSpaceType::VIEW, xr::Posef::IDENTITY)
            .map_err(|e| HmdError::runtime("xrCreateReferenceSpace", e))?;

        let actions = ControllerActions::new(&instance, &session)?;

        let half_ipd = config.ipd * 0.5;
        let description = HmdDescription {
            display_name,
            eye_resolution,
            fov: [config.fov(); 2],
            eye_offsets: [
                Pose::new(Vec3::new(-half_ipd, 0.0, 0.0), Quat::IDENTITY),
                Pose::new(Vec3::new(half_ipd, 0.0, 0.0), Quat::IDENTITY),
            ],
            refresh_rate: 90.0,
        };

        Ok(Self {
            instance,
            session,
            frame_waiter,
            frame_stream,
            base_space,
            view_space,
            actions,
            event_buffer: xr::EventDataBuffer::new(),
            description,
            session_running: false,
            pending_frame: None,
            frame_index: 0,
            status: SessionStatus::default(),
            origin: Pose::IDENTITY,
            raw_head: Pose::IDENTITY,
            last_tracking: None,
        })
    }

    fn poll_events(&mut self) -> Result<(), HmdError> {
        let mut state_changes = Vec::new();

        while let Some(event) = self
            .instance
            .poll_event(&mut self.event_buffer)
            .map_err(|e| HmdError::runtime("xrPollEvent", e))?
        {
            match event {
                xr::Event::SessionStateChanged(e) => state_changes.push(e.state()),
                xr::Event::ReferenceSpaceChangePending(_) => {
                    self.status.should_recenter = true;
                }
                xr::Event::InstanceLossPending(_) => {
                    self.status.should_quit = true;
                }
                _ => {}
            }
        }

        for state in state_changes {
            debug!(?state, "OpenXR session state changed");
            match state {
                xr::SessionState::READY => {
                    self.session
                        .begin(VIEW_TYPE)
                        .map_err(|e| HmdError::runtime("xrBeginSession", e))?;
                    self.session_running = true;
                    info!("OpenXR session running");
                }
                xr::SessionState::STOPPING => {
                    self.session
                        .end()
                        .map_err(|e| HmdError::runtime("xrEndSession", e))?;
                    self.session_running = false;
                    info!("OpenXR session stopped");
                }
                xr::SessionState::EXITING | xr::SessionState::LOSS_PENDING => {
                    self.status.should_quit = true;
                }
                xr::SessionState::VISIBLE | xr::SessionState::FOCUSED => {
                    self.status.visible = true;
                }
                xr::SessionState::SYNCHRONIZED | xr::SessionState::IDLE => {
                    self.status.visible = false;
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn idle_tracking(&self) -> TrackingState {
        self.last_tracking.unwrap_or_else(|| {
            let head = self.origin.inverse().compose(&self.raw_head);
            TrackingState {
                display_time: Duration::ZERO,
                frame_index: self.frame_index,
                head,
                eyes: calc_eye_poses(&head, &self.description.eye_offsets),
                controllers: [ControllerState::default(); 2],
            }
        })
    }

    fn locate(&mut self, time: xr::Time) -> Result<TrackingState, HmdError> {
        let head_location = self
            .view_space
            .locate(&self.base_space, time)
            .map_err(|e| HmdError::runtime("xrLocateSpace", e))?;
        if head_location
            .location_flags
            .contains(xr::SpaceLocationFlags::ORIENTATION_VALID)
        {
            self.raw_head = to_pose(head_location.pose);
        }

        let (_, views) = self
            .session
            .locate_views(VIEW_TYPE, time, &self.view_space)
            .map_err(|e| HmdError::runtime("xrLocateViews", e))?;
        if let [left, right] = views.as_slice() {
            self.description.eye_offsets = [to_pose(left.pose), to_pose(right.pose)];
            self.description.fov = [to_fov(left.fov), to_fov(right.fov)];
        }

        self.actions.sync(&self.session)?;

        let to_origin = self.origin.inverse();
        let head = to_origin.compose(&self.raw_head);
        let mut controllers = Hand::BOTH.map(|hand| {
            self.actions
                .controller(&self.session, &self.base_space, time, hand)
        });
        for controller in &mut controllers {
            controller.pose = to_origin.compose(&controller.pose);
        }

        Ok(TrackingState {
            display_time: Duration::from_nanos(time.as_nanos().max(0) as u64),
            frame_index: self.frame_index,
            head,
            eyes: calc_eye_poses(&head, &self.description.eye_offsets),
            controllers,
        })
    }

    /// Ends the frame opened by `begin_frame`, if any, with no layers
    fn submit_pending_frame(&mut self) -> Result<(), HmdError> {
        let Some(frame_state) = self.pending_frame.take() else {
            return Ok(());
        };
        self.frame_stream
            .end(
                frame_state.predicted_display_time,
                xr::EnvironmentBlendMode::OPAQUE,
                &[],
            )
            .map_err(|e| HmdError::runtime("xrEndFrame", e))
    }
}

impl HmdRuntime for OpenXrRuntime {
    fn name(&self) -> &'static str {
        "openxr"
    }

    fn description(&self) -> &HmdDescription {
        &self.description
    }

    fn begin_frame(&mut self) -> Result<TrackingState, HmdError> {
        self.poll_events()?;
        self.frame_index += 1;

        if !self.session_running {
            return Ok(self.idle_tracking());
        }

        let frame_state = self
            .frame_waiter
            .wait()
            .map_err(|e| HmdError::runtime("xrWaitFrame", e))?;
        self.frame_stream
            .begin()
            .map_err(|e| HmdError::runtime("xrBeginFrame", e))?;
        self.pending_frame = Some(frame_state);

        let period = frame_state.predicted_display_period.as_nanos();
        if period > 0 {
            self.description.refresh_rate = 1.0e9 / period as f32;
        }

        let tracking = match self.locate(frame_state.predicted_display_time) {
            Ok(tracking) => tracking,
            Err(e) => {
                // The begun frame must be ended before the next xrBeginFrame
                if let Err(end_error) = self.submit_pending_frame() {
                    warn!(error = %end_error, "Failed to end frame after tracking loss");
                }
                return Err(e);
            }
        };
        self.last_tracking = Some(tracking);
        Ok(tracking)
    }

    fn end_frame(&mut self) -> Result<SessionStatus, HmdError> {
        self.submit_pending_frame()?;

        let status = self.status;
        self.status.should_recenter = false;
        Ok(status)
    }

    fn recenter(&mut self) -> Result<(), HmdError> {
        self.origin = floor_origin(&self.raw_head);
        self.last_tracking = None;
        info!(
            origin.x = self.origin.position.x,
            origin.z = self.origin.position.z,
            "OpenXR tracking origin recentered"
        );
        Ok(())
    }
}

impl Drop for OpenXrRuntime {
    fn drop(&mut self) {
        if self.session_running
            && let Err(e) = self.session.request_exit()
        {
            warn!(error = %e, "Failed to request OpenXR session exit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_origin_keeps_only_yaw() {
        let head = Pose::new(
            Vec3::new(1.0, 1.7, -2.0),
            Quat::from_rotation_y(0.8) * Quat::from_rotation_x(-0.3),
        );
        let origin = floor_origin(&head);

        assert_eq!(origin.position, Vec3::new(1.0, 0.0, -2.0));
        assert!(origin.orientation.abs_diff_eq(Quat::from_rotation_y(0.8), 1e-5));
    }

    #[test]
    fn openxr_fov_angles_become_tangents() {
        let fov = to_fov(xr::Fovf {
            angle_left: -0.5,
            angle_right: 0.5,
            angle_up: 0.4,
            angle_down: -0.6,
        });
        assert!((fov.left_tan - 0.5f32.tan()).abs() < 1e-6);
        assert!((fov.down_tan - 0.6f32.tan()).abs() < 1e-6);
    }
}
