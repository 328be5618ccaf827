use std::collections::BTreeSet;

/// A key the camera understands.
///
/// Hosts map their physical keys onto these; the default desktop binding is
/// A/D for yaw, W/S for pitch, V/B for zoom out/in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Orbit +2° about world Y.
    RotateLeft,
    /// Orbit -2° about world Y.
    RotateRight,
    /// Orbit +2° about world X.
    RotateUp,
    /// Orbit -2° about world X.
    RotateDown,
    /// Scale the camera position by 1.05.
    ZoomOut,
    /// Scale the camera position by 0.95.
    ZoomIn,
}

impl Key {
    pub const ALL: [Key; 6] = [
        Key::RotateLeft,
        Key::RotateUp,
        Key::RotateRight,
        Key::RotateDown,
        Key::ZoomOut,
        Key::ZoomIn,
    ];

    /// Resolve a DOM-style key code (`"KeyA"`, `"KeyW"`, ...) to a key.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "KeyA" => Some(Key::RotateLeft),
            "KeyD" => Some(Key::RotateRight),
            "KeyW" => Some(Key::RotateUp),
            "KeyS" => Some(Key::RotateDown),
            "KeyV" => Some(Key::ZoomOut),
            "KeyB" => Some(Key::ZoomIn),
            _ => None,
        }
    }
}

/// Set of currently held keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    held: BTreeSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State with the given keys held.
    pub fn with_keys(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            held: keys.into_iter().collect(),
        }
    }

    /// Record a key transition from the host.
    pub fn set(&mut self, key: Key, pressed: bool) {
        let changed = if pressed {
            self.held.insert(key)
        } else {
            self.held.remove(&key)
        };
        if changed {
            tracing::trace!(?key, pressed, "key state changed");
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }

    pub fn held(&self) -> impl Iterator<Item = Key> + '_ {
        self.held.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut input = InputState::new();
        input.set(Key::RotateLeft, true);
        assert!(input.is_held(Key::RotateLeft));
        assert!(!input.is_held(Key::RotateRight));

        input.set(Key::RotateLeft, false);
        assert!(input.is_empty());
    }

    #[test]
    fn repeated_press_is_idempotent() {
        let mut input = InputState::new();
        input.set(Key::ZoomIn, true);
        input.set(Key::ZoomIn, true);
        assert_eq!(input.held().count(), 1);
    }

    #[test]
    fn dom_codes_map_to_keys() {
        assert_eq!(Key::from_code("KeyA"), Some(Key::RotateLeft));
        assert_eq!(Key::from_code("KeyB"), Some(Key::ZoomIn));
        assert_eq!(Key::from_code("KeyQ"), None);
    }

    #[test]
    fn with_keys_builds_state() {
        let input = InputState::with_keys([Key::RotateUp, Key::ZoomOut]);
        assert!(input.is_held(Key::RotateUp));
        assert!(input.is_held(Key::ZoomOut));
        assert!(!input.is_held(Key::ZoomIn));
    }
}
