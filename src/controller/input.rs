/// Platform-agnostic input handling
use glam::Vec2;

/// The eight keys the simulator listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlightKey {
    /// Tracked but not bound to any motion
    Up,
    /// Tracked but not bound to any motion
    Down,
    StrafeLeft,
    StrafeRight,
    Thrust,
    Reverse,
    RollLeft,
    RollRight,
}

impl FlightKey {
    pub const ALL: [FlightKey; 8] = [
        FlightKey::Up,
        FlightKey::Down,
        FlightKey::StrafeLeft,
        FlightKey::StrafeRight,
        FlightKey::Thrust,
        FlightKey::Reverse,
        FlightKey::RollLeft,
        FlightKey::RollRight,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Platform-independent input events
#[derive(Debug, Clone)]
pub enum InputEvent {
    KeyDown(FlightKey),
    KeyUp(FlightKey),
    MouseMove { dx: f32, dy: f32 },
    /// A pointer device started (or stopped) delivering relative motion
    PointerLockChanged { locked: bool },
    FocusLost,
}

/// Held/released state for every [`FlightKey`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    held: [bool; 8],
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: FlightKey, down: bool) {
        self.held[key.index()] = down;
    }

    pub fn is_down(&self, key: FlightKey) -> bool {
        self.held[key.index()]
    }

    pub fn with(mut self, key: FlightKey) -> Self {
        self.set(key, true);
        self
    }

    pub fn clear(&mut self) {
        self.held = [false; 8];
    }
}

/// Key states plus mouse motion accumulated since the last frame.
///
/// `look_delta` is `None` while no pointer is attached; the orientation
/// update is skipped entirely in that case.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub keys: KeyState,
    look_delta: Option<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => self.keys.set(*key, true),
            InputEvent::KeyUp(key) => self.keys.set(*key, false),
            InputEvent::MouseMove { dx, dy } => {
                if let Some(delta) = self.look_delta.as_mut() {
                    *delta += Vec2::new(*dx, *dy);
                }
            }
            InputEvent::PointerLockChanged { locked } => {
                if !*locked {
                    self.look_delta = None;
                } else if self.look_delta.is_none() {
                    self.look_delta = Some(Vec2::ZERO);
                }
            }
            InputEvent::FocusLost => self.keys.clear(),
        }
    }

    pub fn is_key_pressed(&self, key: FlightKey) -> bool {
        self.keys.is_down(key)
    }

    pub fn pointer_attached(&self) -> bool {
        self.look_delta.is_some()
    }

    pub fn pending_look(&self) -> Option<Vec2> {
        self.look_delta
    }

    /// Read and reset the accumulated mouse delta in one step
    pub fn consume_look(&mut self) -> Option<Vec2> {
        let delta = self.look_delta?;
        self.look_delta = Some(Vec2::ZERO);
        Some(delta)
    }
}

/// Key names (DOM `KeyboardEvent.key` spelling) mapped to flight keys
#[derive(Clone)]
pub struct KeyBindings {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub strafe_left: Vec<String>,
    pub strafe_right: Vec<String>,
    pub thrust: Vec<String>,
    pub reverse: Vec<String>,
    pub roll_left: Vec<String>,
    pub roll_right: Vec<String>,
    pub release_pointer: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let keys = |names: &[&str]| names.iter().map(|k| k.to_string()).collect::<Vec<_>>();
        Self {
            up: keys(&["ArrowUp"]),
            down: keys(&["ArrowDown"]),
            strafe_left: keys(&["ArrowLeft", "a"]),
            strafe_right: keys(&["ArrowRight", "d"]),
            thrust: keys(&["w"]),
            reverse: keys(&["s"]),
            roll_left: keys(&["q"]),
            roll_right: keys(&["e"]),
            release_pointer: "Escape".to_string(),
        }
    }
}

/// Translates platform key names into flight keys
#[derive(Clone)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn flight_key(&self, key: &str) -> Option<FlightKey> {
        let b = &self.bindings;
        let table = [
            (&b.up, FlightKey::Up),
            (&b.down, FlightKey::Down),
            (&b.strafe_left, FlightKey::StrafeLeft),
            (&b.strafe_right, FlightKey::StrafeRight),
            (&b.thrust, FlightKey::Thrust),
            (&b.reverse, FlightKey::Reverse),
            (&b.roll_left, FlightKey::RollLeft),
            (&b.roll_right, FlightKey::RollRight),
        ];
        table
            .into_iter()
            .find(|(names, _)| names.iter().any(|n| n == key))
            .map(|(_, flight)| flight)
    }

    pub fn key_event(&self, key: &str, is_down: bool) -> Option<InputEvent> {
        self.flight_key(key).map(|k| {
            if is_down {
                InputEvent::KeyDown(k)
            } else {
                InputEvent::KeyUp(k)
            }
        })
    }

    pub fn is_release_pointer(&self, key: &str) -> bool {
        key == self.bindings.release_pointer
    }
}

impl Default for InputProcessor {
    fn default() -> Self {
        Self::new(KeyBindings::default())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod native {
    use super::*;
    use winit::keyboard::KeyCode;

    /// Same names the DOM reports, so one binding table serves both targets
    pub fn key_name(code: KeyCode) -> Option<&'static str> {
        Some(match code {
            KeyCode::ArrowUp => "ArrowUp",
            KeyCode::ArrowDown => "ArrowDown",
            KeyCode::ArrowLeft => "ArrowLeft",
            KeyCode::ArrowRight => "ArrowRight",
            KeyCode::KeyA => "a",
            KeyCode::KeyD => "d",
            KeyCode::KeyW => "w",
            KeyCode::KeyS => "s",
            KeyCode::KeyQ => "q",
            KeyCode::KeyE => "e",
            KeyCode::Escape => "Escape",
            _ => return None,
        })
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use web_sys::KeyboardEvent;

    /// Letter keys arrive upper-cased while shift or caps lock is active
    pub fn key_name(e: &KeyboardEvent) -> String {
        let key = e.key();
        if key.chars().count() == 1 {
            key.to_lowercase()
        } else {
            key
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached() -> InputState {
        let mut input = InputState::new();
        input.process_event(&InputEvent::PointerLockChanged { locked: true });
        input
    }

    #[test]
    fn mouse_ignored_without_pointer() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseMove { dx: 5.0, dy: 1.0 });
        assert_eq!(input.consume_look(), None);
        assert!(!input.pointer_attached());
    }

    #[test]
    fn deltas_accumulate_and_consume_once() {
        let mut input = attached();
        input.process_event(&InputEvent::MouseMove { dx: 3.0, dy: -1.0 });
        input.process_event(&InputEvent::MouseMove { dx: 2.0, dy: 4.0 });
        assert_eq!(input.consume_look(), Some(Vec2::new(5.0, 3.0)));
        assert_eq!(input.consume_look(), Some(Vec2::ZERO));
    }

    #[test]
    fn relocking_keeps_pending_delta() {
        let mut input = attached();
        input.process_event(&InputEvent::MouseMove { dx: 1.0, dy: 1.0 });
        input.process_event(&InputEvent::PointerLockChanged { locked: true });
        assert_eq!(input.consume_look(), Some(Vec2::ONE));
    }

    #[test]
    fn focus_loss_releases_keys() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(FlightKey::Thrust));
        input.process_event(&InputEvent::KeyDown(FlightKey::RollLeft));
        assert!(input.is_key_pressed(FlightKey::Thrust));
        input.process_event(&InputEvent::FocusLost);
        assert!(FlightKey::ALL.iter().all(|k| !input.is_key_pressed(*k)));
    }

    #[test]
    fn default_bindings() {
        let p = InputProcessor::default();
        assert_eq!(p.flight_key("a"), Some(FlightKey::StrafeLeft));
        assert_eq!(p.flight_key("ArrowLeft"), Some(FlightKey::StrafeLeft));
        assert_eq!(p.flight_key("d"), Some(FlightKey::StrafeRight));
        assert_eq!(p.flight_key("w"), Some(FlightKey::Thrust));
        assert_eq!(p.flight_key("s"), Some(FlightKey::Reverse));
        assert_eq!(p.flight_key("q"), Some(FlightKey::RollLeft));
        assert_eq!(p.flight_key("e"), Some(FlightKey::RollRight));
        assert_eq!(p.flight_key("ArrowUp"), Some(FlightKey::Up));
        assert_eq!(p.flight_key("x"), None);
        assert!(p.is_release_pointer("Escape"));
        assert!(matches!(p.key_event("w", false), Some(InputEvent::KeyUp(FlightKey::Thrust))));
    }
}
