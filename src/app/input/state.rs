//! Desktop input snapshot

use std::collections::HashSet;

use glam::Vec2;
use winit::keyboard::KeyCode;

/// Desktop mouse and keyboard state for a single frame
#[derive(Debug, Clone, Default)]
pub struct DesktopInput {
    pub mouse: MouseState,
    pub keyboard: KeyboardState,
}

/// Mouse input state
#[derive(Debug, Clone, Default)]
pub struct MouseState {
    /// Window coordinates (physical pixels)
    pub window_pos: Option<Vec2>,
    /// Cursor position in `[0, 1]` across the window, y down
    pub normalized_pos: Option<Vec2>,
    pub buttons: MouseButtons,
    /// Cursor travel while the right button is held, physical pixels
    pub drag_delta: Vec2,
}

/// State of all mouse buttons
#[derive(Debug, Clone, Default)]
pub struct MouseButtons {
    pub left: ButtonState,
    pub right: ButtonState,
    pub middle: ButtonState,
}

/// Button press state with edge detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Released,
    /// Pressed this frame (edge)
    JustPressed,
    /// Held down (multiple frames)
    Pressed,
    /// Released this frame (edge)
    JustReleased,
}

impl ButtonState {
    /// Advance state for next frame (transitions edges to steady states)
    pub fn advance(self) -> Self {
        match self {
            Self::JustPressed => Self::Pressed,
            Self::JustReleased => Self::Released,
            state => state,
        }
    }

    /// Returns true if button is currently down (just pressed or held)
    pub fn is_down(self) -> bool {
        matches!(self, Self::JustPressed | Self::Pressed)
    }

    pub fn is_just_pressed(self) -> bool {
        matches!(self, Self::JustPressed)
    }

    pub fn is_just_released(self) -> bool {
        matches!(self, Self::JustReleased)
    }
}

/// Keyboard input state
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    pub modifiers: Modifiers,
    /// Keys currently held
    pub held: HashSet<KeyCode>,
    /// Keys that went down this frame
    pub pressed: HashSet<KeyCode>,
}

impl KeyboardState {
    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    pub fn was_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// -1, 0 or 1 depending on which of the two keys is held
    pub fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        let mut value = 0.0;
        if self.is_held(negative) {
            value -= 1.0;
        }
        if self.is_held(positive) {
            value += 1.0;
        }
        value
    }
}

/// Keyboard modifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl DesktopInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance all edge states for next frame
    pub fn advance_frame(&mut self) {
        self.mouse.buttons.left = self.mouse.buttons.left.advance();
        self.mouse.buttons.right = self.mouse.buttons.right.advance();
        self.mouse.buttons.middle = self.mouse.buttons.middle.advance();

        self.mouse.drag_delta = Vec2::ZERO;
        self.keyboard.pressed.clear();
    }
}
