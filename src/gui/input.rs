//! Controller buttons and thumbstick mapped onto GUI input
//!
//! | Controller          | GUI                     |
//! |---------------------|-------------------------|
//! | index trigger > 0.5 | primary pointer button  |
//! | hand trigger > 0.5  | Escape                  |
//! | thumbstick ± x / y  | arrow keys              |
//! | thumbstick click    | Enter                   |
//! | Y                   | Tab                     |
//! | X                   | Shift+Tab               |

use egui::{Event, Key, Modifiers, PointerButton, Pos2};

use crate::hmd::{ControllerButtons, ControllerState};

/// Analog value above which a trigger counts as pressed
pub const TRIGGER_THRESHOLD: f32 = 0.5;

/// Maps `value` from `[low, high]` onto `[0, 1]`, clamping outside the range
///
/// `high` may be below `low` to map a negative axis.
pub fn map_analog_input(value: f32, low: f32, high: f32) -> f32 {
    ((value - low) / (high - low)).clamp(0.0, 1.0)
}

/// Digital GUI inputs derived from one controller sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MappedInputs {
    primary: bool,
    escape: bool,
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    enter: bool,
    tab: bool,
    shift_tab: bool,
}

impl MappedInputs {
    fn sample(controller: &ControllerState, deadzone: f32) -> Self {
        if !controller.active {
            return Self::default();
        }
        let stick = controller.thumbstick;
        let beyond = |v: f32| map_analog_input(v, deadzone, 1.0) > 0.0;

        Self {
            primary: controller.index_trigger > TRIGGER_THRESHOLD,
            escape: controller.hand_trigger > TRIGGER_THRESHOLD,
            up: beyond(stick.y),
            down: beyond(-stick.y),
            left: beyond(-stick.x),
            right: beyond(stick.x),
            enter: controller.buttons.contains(ControllerButtons::THUMBSTICK),
            tab: controller.buttons.contains(ControllerButtons::Y),
            shift_tab: controller.buttons.contains(ControllerButtons::X),
        }
    }
}

/// Turns controller samples into GUI events, emitting only on transitions
#[derive(Debug, Clone)]
pub struct ControllerMapper {
    deadzone: f32,
    previous: MappedInputs,
}

impl ControllerMapper {
    pub fn new(deadzone: f32) -> Self {
        let mut mapper = Self {
            deadzone: 0.0,
            previous: MappedInputs::default(),
        };
        mapper.set_deadzone(deadzone);
        mapper
    }

    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    pub fn set_deadzone(&mut self, deadzone: f32) {
        self.deadzone = deadzone.clamp(0.0, 0.99);
    }

    /// Whether the primary pointer button is currently held
    pub fn primary_down(&self) -> bool {
        self.previous.primary
    }

    /// Events for the change between the last sample and `controller`
    ///
    /// Pointer button events are placed at `pointer`.
    pub fn update(&mut self, controller: &ControllerState, pointer: Pos2) -> Vec<Event> {
        let current = MappedInputs::sample(controller, self.deadzone);
        let mut events = Vec::new();
        self.emit(current, pointer, &mut events);
        events
    }

    fn emit(&mut self, current: MappedInputs, pointer: Pos2, events: &mut Vec<Event>) {
        let previous = std::mem::replace(&mut self.previous, current);

        if current.primary != previous.primary {
            events.push(Event::PointerButton {
                pos: pointer,
                button: PointerButton::Primary,
                pressed: current.primary,
                modifiers: Modifiers::NONE,
            });
        }

        let keys = [
            (current.escape, previous.escape, Key::Escape, Modifiers::NONE),
            (current.up, previous.up, Key::ArrowUp, Modifiers::NONE),
            (current.down, previous.down, Key::ArrowDown, Modifiers::NONE),
            (current.left, previous.left, Key::ArrowLeft, Modifiers::NONE),
            (current.right, previous.right, Key::ArrowRight, Modifiers::NONE),
            (current.enter, previous.enter, Key::Enter, Modifiers::NONE),
            (current.tab, previous.tab, Key::Tab, Modifiers::NONE),
            (current.shift_tab, previous.shift_tab, Key::Tab, Modifiers::SHIFT),
        ];

        for (now, before, key, modifiers) in keys {
            if now != before {
                events.push(Event::Key {
                    key,
                    physical_key: None,
                    pressed: now,
                    repeat: false,
                    modifiers,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn active() -> ControllerState {
        ControllerState {
            active: true,
            ..ControllerState::default()
        }
    }

    fn key_events(events: &[Event]) -> Vec<(Key, bool, Modifiers)> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Key {
                    key,
                    pressed,
                    modifiers,
                    ..
                } => Some((*key, *pressed, *modifiers)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn analog_input_maps_and_clamps() {
        assert_eq!(map_analog_input(0.3, 0.3, 1.0), 0.0);
        assert_eq!(map_analog_input(1.0, 0.3, 1.0), 1.0);
        assert!((map_analog_input(0.65, 0.3, 1.0) - 0.5).abs() < 1e-6);
        assert_eq!(map_analog_input(-2.0, 0.3, 1.0), 0.0);
        assert_eq!(map_analog_input(2.0, 0.3, 1.0), 1.0);
    }

    #[test]
    fn analog_input_handles_negative_axis() {
        assert!((map_analog_input(-0.65, -0.3, -1.0) - 0.5).abs() < 1e-6);
        assert_eq!(map_analog_input(0.5, -0.3, -1.0), 0.0);
    }

    #[test]
    fn initial_state_emits_nothing() {
        let mut mapper = ControllerMapper::new(0.3);
        assert!(mapper.update(&active(), Pos2::ZERO).is_empty());
    }

    #[test]
    fn trigger_press_and_release_emit_once() {
        let mut mapper = ControllerMapper::new(0.3);
        let mut controller = active();
        controller.index_trigger = 0.9;

        let pressed = mapper.update(&controller, Pos2::new(10.0, 20.0));
        assert_eq!(pressed.len(), 1);
        assert!(matches!(
            pressed[0],
            Event::PointerButton {
                button: PointerButton::Primary,
                pressed: true,
                pos,
                ..
            } if pos == Pos2::new(10.0, 20.0)
        ));
        assert!(mapper.primary_down());

        // Held: no repeat
        assert!(mapper.update(&controller, Pos2::new(10.0, 20.0)).is_empty());

        controller.index_trigger = 0.2;
        let released = mapper.update(&controller, Pos2::new(12.0, 20.0));
        assert!(matches!(
            released[0],
            Event::PointerButton { pressed: false, .. }
        ));
    }

    #[test]
    fn trigger_exactly_at_threshold_is_not_pressed() {
        let mut mapper = ControllerMapper::new(0.3);
        let mut controller = active();
        controller.index_trigger = TRIGGER_THRESHOLD;
        assert!(mapper.update(&controller, Pos2::ZERO).is_empty());
    }

    #[test]
    fn thumbstick_inside_deadzone_is_ignored() {
        let mut mapper = ControllerMapper::new(0.3);
        let mut controller = active();
        controller.thumbstick = Vec2::new(0.25, -0.3);
        assert!(mapper.update(&controller, Pos2::ZERO).is_empty());
    }

    #[test]
    fn thumbstick_directions_map_to_arrows() {
        let mut mapper = ControllerMapper::new(0.3);
        let mut controller = active();
        controller.thumbstick = Vec2::new(0.8, -0.9);

        let events = key_events(&mapper.update(&controller, Pos2::ZERO));
        assert_eq!(
            events,
            vec![
                (Key::ArrowDown, true, Modifiers::NONE),
                (Key::ArrowRight, true, Modifiers::NONE),
            ]
        );

        controller.thumbstick = Vec2::ZERO;
        let events = key_events(&mapper.update(&controller, Pos2::ZERO));
        assert_eq!(
            events,
            vec![
                (Key::ArrowDown, false, Modifiers::NONE),
                (Key::ArrowRight, false, Modifiers::NONE),
            ]
        );
    }

    #[test]
    fn face_buttons_map_to_navigation_keys() {
        let mut mapper = ControllerMapper::new(0.3);
        let mut controller = active();
        controller.buttons = ControllerButtons::X | ControllerButtons::THUMBSTICK;
        controller.hand_trigger = 1.0;

        let events = key_events(&mapper.update(&controller, Pos2::ZERO));
        assert_eq!(
            events,
            vec![
                (Key::Escape, true, Modifiers::NONE),
                (Key::Enter, true, Modifiers::NONE),
                (Key::Tab, true, Modifiers::SHIFT),
            ]
        );
    }

    #[test]
    fn inactive_controller_releases_held_inputs() {
        let mut mapper = ControllerMapper::new(0.3);
        let mut controller = active();
        controller.buttons = ControllerButtons::Y;
        mapper.update(&controller, Pos2::ZERO);

        controller.active = false;
        let events = key_events(&mapper.update(&controller, Pos2::ZERO));
        assert_eq!(events, vec![(Key::Tab, false, Modifiers::NONE)]);
    }

    #[test]
    fn deadzone_is_clamped() {
        let mut mapper = ControllerMapper::new(0.3);
        mapper.set_deadzone(1.5);
        assert_eq!(mapper.deadzone(), 0.99);
        mapper.set_deadzone(-1.0);
        assert_eq!(mapper.deadzone(), 0.0);
    }

    #[test]
    fn oversized_deadzone_at_construction_keeps_neutral_stick_quiet() {
        let mut mapper = ControllerMapper::new(1.5);
        assert_eq!(mapper.deadzone(), 0.99);
        assert!(mapper.update(&active(), Pos2::ZERO).is_empty());
    }
}
