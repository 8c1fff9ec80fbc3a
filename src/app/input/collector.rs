//! Raw input collection from winit events

use glam::Vec2;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::PhysicalKey;

use super::state::{ButtonState, DesktopInput, Modifiers};

/// Collects raw input from winit events and maintains [`DesktopInput`]
pub struct InputCollector {
    state: DesktopInput,
    window_size: Vec2,
}

impl InputCollector {
    pub fn new() -> Self {
        Self {
            state: DesktopInput::new(),
            window_size: Vec2::ONE,
        }
    }

    /// Window size used to normalise cursor positions
    pub fn set_window_size(&mut self, size: PhysicalSize<u32>) {
        self.window_size = Vec2::new(size.width.max(1) as f32, size.height.max(1) as f32);
    }

    /// Handle a winit window event
    ///
    /// Button presses the overlay consumed are not recorded; releases always are
    /// so a held button never gets stuck.
    pub fn handle_window_event(&mut self, event: &WindowEvent, consumed_by_overlay: bool) {
        match event {
            WindowEvent::Resized(size) => self.set_window_size(*size),

            WindowEvent::CursorMoved { position, .. } => {
                let window_pos = Vec2::new(position.x as f32, position.y as f32);

                if self.state.mouse.buttons.right.is_down()
                    && let Some(previous) = self.state.mouse.window_pos
                {
                    self.state.mouse.drag_delta += window_pos - previous;
                }

                self.state.mouse.window_pos = Some(window_pos);
                self.state.mouse.normalized_pos = Some(window_pos / self.window_size);
            }

            WindowEvent::CursorLeft { .. } => {
                self.state.mouse.window_pos = None;
                self.state.mouse.normalized_pos = None;
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if consumed_by_overlay && state.is_pressed() {
                    return;
                }
                let button_state = match state {
                    ElementState::Pressed => ButtonState::JustPressed,
                    ElementState::Released => ButtonState::JustReleased,
                };

                match button {
                    winit::event::MouseButton::Left => {
                        self.state.mouse.buttons.left = button_state;
                    }
                    winit::event::MouseButton::Right => {
                        self.state.mouse.buttons.right = button_state;
                    }
                    winit::event::MouseButton::Middle => {
                        self.state.mouse.buttons.middle = button_state;
                    }
                    _ => {}
                }
            }

            WindowEvent::ModifiersChanged(modifiers_state) => {
                self.state.keyboard.modifiers = Modifiers {
                    shift: modifiers_state.state().shift_key(),
                    ctrl: modifiers_state.state().control_key(),
                    alt: modifiers_state.state().alt_key(),
                    meta: modifiers_state.state().super_key(),
                };
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => {
                        if self.state.keyboard.held.insert(code) {
                            self.state.keyboard.pressed.insert(code);
                        }
                    }
                    ElementState::Released => {
                        self.state.keyboard.held.remove(&code);
                    }
                }
            }

            WindowEvent::Focused(false) => {
                // Key-up events are lost while unfocused
                self.state.keyboard.held.clear();
            }

            _ => {}
        }
    }

    /// Advance to next frame (transitions edge states to steady states)
    pub fn advance_frame(&mut self) {
        self.state.advance_frame();
    }

    pub fn state(&self) -> &DesktopInput {
        &self.state
    }
}

impl Default for InputCollector {
    fn default() -> Self {
        Self::new()
    }
}
