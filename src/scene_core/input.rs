use glam::Vec2;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

/// World units the pointer light travels per normalized screen axis.
pub const POINTER_LIGHT_SCALE: f32 = 10.0;

/// Snapshot of the held camera keys, read once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub move_up: bool,
    pub move_down: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub rotate_up: bool,
    pub rotate_down: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub zoom_in: bool,
    pub zoom_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    RotateUp,
    RotateDown,
    RotateLeft,
    RotateRight,
    ZoomIn,
    ZoomOut,
}

impl CameraAction {
    pub fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::Named(NamedKey::ArrowUp) => Some(Self::MoveUp),
            Key::Named(NamedKey::ArrowDown) => Some(Self::MoveDown),
            Key::Named(NamedKey::ArrowLeft) => Some(Self::MoveLeft),
            Key::Named(NamedKey::ArrowRight) => Some(Self::MoveRight),
            Key::Character(c) => match c.as_str() {
                "w" => Some(Self::RotateUp),
                "s" => Some(Self::RotateDown),
                "a" => Some(Self::RotateLeft),
                "d" => Some(Self::RotateRight),
                "+" => Some(Self::ZoomIn),
                "-" => Some(Self::ZoomOut),
                _ => None,
            },
            _ => None,
        }
    }
}

impl InputState {
    pub fn set(&mut self, action: CameraAction, pressed: bool) {
        let flag = match action {
            CameraAction::MoveUp => &mut self.move_up,
            CameraAction::MoveDown => &mut self.move_down,
            CameraAction::MoveLeft => &mut self.move_left,
            CameraAction::MoveRight => &mut self.move_right,
            CameraAction::RotateUp => &mut self.rotate_up,
            CameraAction::RotateDown => &mut self.rotate_down,
            CameraAction::RotateLeft => &mut self.rotate_left,
            CameraAction::RotateRight => &mut self.rotate_right,
            CameraAction::ZoomIn => &mut self.zoom_in,
            CameraAction::ZoomOut => &mut self.zoom_out,
        };
        *flag = pressed;
    }
}

/// Map a cursor position to the pointer light's `(x, z)` placement.
///
/// The cursor is normalized to `[-1, 1]` on both axes around the window
/// center (screen Y flipped so up is positive), then screen up maps to
/// world -Z.
pub fn pointer_light_offset(cursor_x: f32, cursor_y: f32, width: f32, height: f32) -> Vec2 {
    let nx = (cursor_x / width.max(1.0)) * 2.0 - 1.0;
    let ny = -(cursor_y / height.max(1.0)) * 2.0 + 1.0;
    Vec2::new(nx * POINTER_LIGHT_SCALE, -ny * POINTER_LIGHT_SCALE)
}

/// Turns window events into an [`InputState`] and pointer-drag updates.
pub struct InputAdapter {
    state: InputState,
    dragging: bool,
    pointer_light: Option<Vec2>,
}

impl Default for InputAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl InputAdapter {
    pub fn new() -> Self {
        Self {
            state: InputState::default(),
            dragging: false,
            pointer_light: None,
        }
    }

    /// Returns `true` when the event changed input state.
    pub fn process_window_event(&mut self, event: &WindowEvent, window_size: (u32, u32)) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(&event.logical_key, event.state == ElementState::Pressed)
            }
            WindowEvent::MouseInput { state, .. } => {
                self.handle_mouse_button(*state == ElementState::Pressed);
                true
            }
            WindowEvent::CursorMoved { position, .. } => self.handle_cursor_moved(
                position.x as f32,
                position.y as f32,
                window_size.0 as f32,
                window_size.1 as f32,
            ),
            _ => false,
        }
    }

    pub fn handle_key(&mut self, key: &Key, pressed: bool) -> bool {
        let Some(action) = CameraAction::from_key(key) else {
            return false;
        };
        self.state.set(action, pressed);
        true
    }

    pub fn handle_mouse_button(&mut self, pressed: bool) {
        self.dragging = pressed;
    }

    pub fn handle_cursor_moved(&mut self, x: f32, y: f32, width: f32, height: f32) -> bool {
        if !self.dragging {
            return false;
        }
        self.pointer_light = Some(pointer_light_offset(x, y, width, height));
        true
    }

    pub fn snapshot(&self) -> InputState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Latest pointer light placement since the previous call, if any.
    pub fn take_pointer_light(&mut self) -> Option<Vec2> {
        self.pointer_light.take()
    }

    /// Drop held keys and any drag in progress (e.g. when focus is lost and
    /// the matching release events will never arrive).
    pub fn reset(&mut self) {
        self.state = InputState::default();
        self.dragging = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::SmolStr;

    fn character(s: &str) -> Key {
        Key::Character(SmolStr::new(s))
    }

    #[test]
    fn arrow_keys_and_letters_map_to_camera_actions() {
        let mut adapter = InputAdapter::new();
        assert!(adapter.handle_key(&Key::Named(NamedKey::ArrowUp), true));
        assert!(adapter.handle_key(&Key::Named(NamedKey::ArrowRight), true));
        assert!(adapter.handle_key(&character("a"), true));
        assert!(adapter.handle_key(&character("+"), true));

        let state = adapter.snapshot();
        assert!(state.move_up && state.move_right);
        assert!(state.rotate_left);
        assert!(state.zoom_in);
        assert!(!state.move_down && !state.zoom_out && !state.rotate_up);
    }

    #[test]
    fn release_clears_only_that_flag() {
        let mut adapter = InputAdapter::new();
        adapter.handle_key(&character("w"), true);
        adapter.handle_key(&character("-"), true);
        adapter.handle_key(&character("w"), false);

        let state = adapter.snapshot();
        assert!(!state.rotate_up);
        assert!(state.zoom_out);
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let mut adapter = InputAdapter::new();
        assert!(!adapter.handle_key(&character("q"), true));
        assert!(!adapter.handle_key(&Key::Named(NamedKey::Space), true));
        assert_eq!(adapter.snapshot(), InputState::default());
    }

    #[test]
    fn cursor_motion_moves_pointer_light_only_while_dragging() {
        let mut adapter = InputAdapter::new();
        assert!(!adapter.handle_cursor_moved(0.0, 0.0, 800.0, 600.0));
        assert!(adapter.take_pointer_light().is_none());

        adapter.handle_mouse_button(true);
        assert!(adapter.handle_cursor_moved(800.0, 0.0, 800.0, 600.0));
        let offset = adapter.take_pointer_light().unwrap();
        assert!((offset.x - 10.0).abs() < 1e-5);
        assert!((offset.y + 10.0).abs() < 1e-5);
        assert!(adapter.take_pointer_light().is_none());

        adapter.handle_mouse_button(false);
        assert!(!adapter.handle_cursor_moved(400.0, 300.0, 800.0, 600.0));
    }

    #[test]
    fn window_center_maps_to_origin() {
        let offset = pointer_light_offset(400.0, 300.0, 800.0, 600.0);
        assert!(offset.length() < 1e-5);

        let bottom_left = pointer_light_offset(0.0, 600.0, 800.0, 600.0);
        assert!((bottom_left.x + 10.0).abs() < 1e-5);
        assert!((bottom_left.y - 10.0).abs() < 1e-5);
    }

    #[test]
    fn only_pointer_and_key_events_are_consumed() {
        use winit::event::{DeviceId, MouseButton};

        let mut adapter = InputAdapter::new();
        // SAFETY: a placeholder id, never handed back to the platform.
        let device_id = unsafe { DeviceId::dummy() };
        let press = WindowEvent::MouseInput {
            device_id,
            state: ElementState::Pressed,
            button: MouseButton::Left,
        };
        assert!(adapter.process_window_event(&press, (800, 600)));
        assert!(adapter.is_dragging());

        assert!(!adapter.process_window_event(&WindowEvent::Focused(false), (800, 600)));
        assert!(!adapter.process_window_event(&WindowEvent::CloseRequested, (800, 600)));
    }

    #[test]
    fn reset_drops_held_keys_and_drag() {
        let mut adapter = InputAdapter::new();
        adapter.handle_key(&Key::Named(NamedKey::ArrowDown), true);
        adapter.handle_mouse_button(true);
        adapter.reset();
        assert_eq!(adapter.snapshot(), InputState::default());
        assert!(!adapter.is_dragging());
    }
}
