//! Keyboard and mouse state tracking.
//!
//! [`InputState`] turns winit's event stream into per-frame queries.
//! Call [`InputState::begin_frame`] once per frame to age the edge
//! ("just pressed"/"just released") sets, then feed events as they
//! arrive.

use std::collections::HashSet;

pub use winit::keyboard::KeyCode;

/// The mouse buttons the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Any button winit reports beyond the primary three.
    Other,
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Other,
        }
    }
}

/// Current keyboard and mouse state.
#[derive(Debug, Default)]
pub struct InputState {
    /// Currently held keys
    pressed_keys: HashSet<KeyCode>,
    /// Keys that went down this frame
    just_pressed_keys: HashSet<KeyCode>,
    /// Keys that went up this frame
    just_released_keys: HashSet<KeyCode>,

    /// Currently held mouse buttons
    pressed_buttons: HashSet<MouseButton>,
    /// Buttons that went down this frame
    just_pressed_buttons: HashSet<MouseButton>,
    /// Buttons that went up this frame
    just_released_buttons: HashSet<MouseButton>,

    /// Cursor position in window coordinates
    mouse_position: (f32, f32),
    /// Cursor movement since the last update
    mouse_delta: (f32, f32),
}

impl InputState {
    /// Creates an empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears per-frame edge state. Call once at the top of each frame.
    pub fn begin_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.just_released_keys.clear();
        self.just_pressed_buttons.clear();
        self.just_released_buttons.clear();
        self.mouse_delta = (0.0, 0.0);
    }

    /// Records a key press. Key-repeat events do not re-trigger the
    /// just-pressed edge.
    pub fn on_key_pressed(&mut self, key: KeyCode) {
        if self.pressed_keys.insert(key) {
            self.just_pressed_keys.insert(key);
        }
    }

    /// Records a key release.
    pub fn on_key_released(&mut self, key: KeyCode) {
        if self.pressed_keys.remove(&key) {
            self.just_released_keys.insert(key);
        }
    }

    /// Records a mouse button press.
    pub fn on_mouse_pressed(&mut self, button: MouseButton) {
        if self.pressed_buttons.insert(button) {
            self.just_pressed_buttons.insert(button);
        }
    }

    /// Records a mouse button release.
    pub fn on_mouse_released(&mut self, button: MouseButton) {
        if self.pressed_buttons.remove(&button) {
            self.just_released_buttons.insert(button);
        }
    }

    /// Records cursor movement.
    pub fn on_mouse_moved(&mut self, x: f32, y: f32) {
        let old = self.mouse_position;
        self.mouse_position = (x, y);
        self.mouse_delta = (x - old.0, y - old.1);
    }

    /// True while the key is held.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// True only on the frame the key went down.
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    /// True only on the frame the key went up.
    pub fn is_key_just_released(&self, key: KeyCode) -> bool {
        self.just_released_keys.contains(&key)
    }

    /// True while the button is held.
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// True only on the frame the button went down.
    pub fn is_mouse_just_pressed(&self, button: MouseButton) -> bool {
        self.just_pressed_buttons.contains(&button)
    }

    /// Current cursor position.
    pub fn mouse_position(&self) -> (f32, f32) {
        self.mouse_position
    }

    /// Cursor movement since the last update.
    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press_edge_fires_once() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::Escape);
        assert!(input.is_key_pressed(KeyCode::Escape));
        assert!(input.is_key_just_pressed(KeyCode::Escape));

        // Key-repeat while held
        input.begin_frame();
        input.on_key_pressed(KeyCode::Escape);
        assert!(input.is_key_pressed(KeyCode::Escape));
        assert!(!input.is_key_just_pressed(KeyCode::Escape));
    }

    #[test]
    fn test_key_release_clears_held_state() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::Space);
        input.begin_frame();
        input.on_key_released(KeyCode::Space);
        assert!(!input.is_key_pressed(KeyCode::Space));
        assert!(input.is_key_just_released(KeyCode::Space));

        input.begin_frame();
        assert!(!input.is_key_just_released(KeyCode::Space));
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let mut input = InputState::new();
        input.on_key_released(KeyCode::KeyW);
        assert!(!input.is_key_just_released(KeyCode::KeyW));
    }

    #[test]
    fn test_mouse_button_edges() {
        let mut input = InputState::new();
        input.on_mouse_pressed(MouseButton::Left);
        assert!(input.is_mouse_pressed(MouseButton::Left));
        assert!(input.is_mouse_just_pressed(MouseButton::Left));

        input.begin_frame();
        assert!(input.is_mouse_pressed(MouseButton::Left));
        assert!(!input.is_mouse_just_pressed(MouseButton::Left));
    }

    #[test]
    fn test_mouse_delta_resets_each_frame() {
        let mut input = InputState::new();
        input.on_mouse_moved(10.0, 20.0);
        input.begin_frame();
        input.on_mouse_moved(15.0, 18.0);
        assert_eq!(input.mouse_position(), (15.0, 18.0));
        assert_eq!(input.mouse_delta(), (5.0, -2.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
    }

    #[test]
    fn test_extra_buttons_map_to_other() {
        assert_eq!(
            MouseButton::from(winit::event::MouseButton::Back),
            MouseButton::Other
        );
        assert_eq!(
            MouseButton::from(winit::event::MouseButton::Left),
            MouseButton::Left
        );
    }
}
