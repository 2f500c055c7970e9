//! Debounced keyboard and pointer input.
//!
//! The host pushes raw [`InputEvent`]s at any time between frames. They are
//! staged in two queues and folded into the held-key state exactly once per
//! simulation step by [`InputHandler::commit`], so every system in a step
//! sees the same snapshot.
//!
//! ## Key lifecycle
//!
//! A press becomes a held entry with `fresh = true` on the next commit. On
//! the following commits `fresh` is cleared and `duration` grows. A release
//! marks the entry stale and removes it in the same commit; the removed entry
//! is kept as "released this step" so [`InputHandler::is_stale`] reports it
//! for exactly one step. A press and release that both land inside one
//! staging window cancel out and never become held.
//!
//! Pointer motion is continuous and bypasses the queues.

use crate::error::EngineError;
use crate::vector::Vector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

macro_rules! named_keys {
    ($($name:ident),* $(,)?) => {
        /// Input key, named after DOM `KeyboardEvent.code` values.
        /// Pointer buttons are `Mouse(button)`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum Key {
            $($name,)*
            Mouse(u8),
        }

        impl Key {
            fn named(code: &str) -> Option<Key> {
                match code {
                    $(stringify!($name) => Some(Key::$name),)*
                    _ => None,
                }
            }

            fn name(&self) -> Option<&'static str> {
                match self {
                    $(Key::$name => Some(stringify!($name)),)*
                    Key::Mouse(_) => None,
                }
            }
        }
    };
}

named_keys!(
    Escape, F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    KeyQ, KeyW, KeyE, KeyR, KeyT, KeyY, KeyU, KeyI, KeyO, KeyP,
    KeyA, KeyS, KeyD, KeyF, KeyG, KeyH, KeyJ, KeyK, KeyL,
    KeyZ, KeyX, KeyC, KeyV, KeyB, KeyN, KeyM,
    Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9, Digit0,
    Numpad1, Numpad2, Numpad3, Numpad4, Numpad5, Numpad6, Numpad7, Numpad8, Numpad9, Numpad0,
    Space, ArrowUp, ArrowDown, ArrowLeft, ArrowRight, Backspace, Enter,
    ShiftLeft, ShiftRight, AltLeft, AltRight, ControlLeft, ControlRight, MetaLeft, MetaRight,
    Tab, CapsLock, Home, End, PageUp, PageDown, Insert, Delete,
    Minus, Equal, BracketLeft, BracketRight, Backslash, Semicolon, Quote, Comma, Period, Slash,
);

impl Key {
    pub fn is_pointer(&self) -> bool {
        matches!(self, Key::Mouse(_))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Mouse(button) => write!(f, "Mouse{button}"),
            _ => f.write_str(self.name().unwrap_or_default()),
        }
    }
}

impl FromStr for Key {
    type Err = EngineError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        if let Some(key) = Key::named(code) {
            return Ok(key);
        }
        code.strip_prefix("Mouse")
            .and_then(|button| button.parse::<u8>().ok())
            .map(Key::Mouse)
            .ok_or_else(|| EngineError::UnknownKey(code.to_string()))
    }
}

impl TryFrom<String> for Key {
    type Error = EngineError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        code.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

/// Raw device event delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Press {
        key: Key,
        /// Host time of the event, in milliseconds.
        timestamp: f64,
        /// Pointer position for pointer-originated presses.
        coordinates: Option<Vector>,
        /// OS key-repeat; dropped at intake.
        repeat: bool,
    },
    Release {
        key: Key,
        timestamp: f64,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
}

/// State of one held (or just released) key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InputEntry {
    pub key: Key,
    /// Simulation time of the commit that activated the key.
    pub time: f64,
    /// Host time of the originating press event.
    pub timestamp: f64,
    /// Time held, in milliseconds, summed over committed steps.
    pub duration: f64,
    /// Activated by the most recent commit.
    pub fresh: bool,
    /// Released by the most recent commit.
    pub stale: bool,
    /// Pointer position when the key was pressed.
    pub coordinates: Vector,
}

#[derive(Debug, Clone, Copy)]
struct PendingPress {
    key: Key,
    timestamp: f64,
    coordinates: Vector,
}

/// Staged and committed input state.
#[derive(Debug, Default)]
pub struct InputHandler {
    fresh_queue: Vec<PendingPress>,
    stale_queue: Vec<Key>,
    /// Held keys. An entry exists iff the key is held.
    state: HashMap<Key, InputEntry>,
    /// Keys released by the last commit.
    released: HashMap<Key, InputEntry>,
    pointer: Vector,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw host event into the staging queues.
    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::Press { repeat: true, key, .. } => {
                tracing::trace!(%key, "key repeat dropped");
            }
            InputEvent::Press { key, timestamp, coordinates, repeat: false } => {
                self.press(key, timestamp, coordinates);
            }
            InputEvent::Release { key, .. } => self.release(key),
            InputEvent::PointerMove { x, y } => self.move_pointer(x, y),
        }
    }

    /// Stage a press. Presses of a key that is already held (and not pending
    /// release) or already staged are ignored.
    pub fn press(&mut self, key: Key, timestamp: f64, coordinates: Option<Vector>) {
        let held = self.state.contains_key(&key) && !self.stale_queue.contains(&key);
        let staged = self.fresh_queue.iter().any(|pending| pending.key == key);
        if held || staged {
            tracing::trace!(%key, "duplicate press dropped");
            return;
        }

        self.fresh_queue.push(PendingPress {
            key,
            timestamp,
            coordinates: coordinates.unwrap_or(self.pointer),
        });
    }

    /// Stage a release. A press still waiting in the queue is cancelled.
    pub fn release(&mut self, key: Key) {
        self.fresh_queue.retain(|pending| pending.key != key);

        if self.state.contains_key(&key) && !self.stale_queue.contains(&key) {
            self.stale_queue.push(key);
        }
    }

    pub fn move_pointer(&mut self, x: f64, y: f64) {
        self.pointer = Vector::new(x, y);
    }

    /// Fold staged events into the held state. Runs once per simulation
    /// step, before any system update.
    ///
    /// `delta` is the step length and `now` the simulation time, both in
    /// milliseconds.
    pub fn commit(&mut self, delta: f64, now: f64) {
        for entry in self.state.values_mut() {
            entry.duration += delta;
            entry.fresh = false;
        }

        for key in self.stale_queue.drain(..) {
            if let Some(entry) = self.state.get_mut(&key) {
                entry.stale = true;
            }
        }

        self.released.clear();
        let stale: Vec<Key> = self
            .state
            .values()
            .filter(|entry| entry.stale)
            .map(|entry| entry.key)
            .collect();
        for key in stale {
            if let Some(entry) = self.state.remove(&key) {
                self.released.insert(key, entry);
            }
        }

        for pending in self.fresh_queue.drain(..) {
            self.state.insert(
                pending.key,
                InputEntry {
                    key: pending.key,
                    time: now,
                    timestamp: pending.timestamp,
                    duration: 0.0,
                    fresh: true,
                    stale: false,
                    coordinates: pending.coordinates,
                },
            );
        }
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.state.contains_key(&key)
    }

    /// Key became held in the last commit.
    pub fn is_fresh(&self, key: Key) -> bool {
        self.state.get(&key).is_some_and(|entry| entry.fresh)
    }

    /// Key was released in the last commit.
    pub fn is_stale(&self, key: Key) -> bool {
        self.released.contains_key(&key)
    }

    pub fn get(&self, key: Key) -> Option<&InputEntry> {
        self.state.get(&key)
    }

    /// Final entry of a key released in the last commit.
    pub fn released(&self, key: Key) -> Option<&InputEntry> {
        self.released.get(&key)
    }

    /// Held keys, in key order.
    pub fn keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.state.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Latest pointer position.
    pub fn pointer(&self) -> Vector {
        self.pointer
    }
}
