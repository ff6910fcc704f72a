//! Input events delivered to entities
//!
//! Events carry window pixel coordinates; the screen converts them to world
//! space before entities see pointer positions.

use std::collections::VecDeque;

use glam::Vec2;

/// Keyboard keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Escape,
    Backspace,
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Platform event
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The window was closed; ends the loop immediately
    Closed,
    Resized { width: u32, height: u32 },
    FocusLost,
    FocusGained,
    TextEntered(char),
    KeyPressed(Key),
    KeyReleased(Key),
    MouseWheelScrolled { delta: f32, position: Vec2 },
    MouseButtonPressed { button: MouseButton, position: Vec2 },
    MouseButtonReleased { button: MouseButton, position: Vec2 },
    MouseMoved(Vec2),
    MouseEntered,
    MouseLeft,
}

impl InputEvent {
    /// Window pixel position carried by pointer events
    pub fn pointer_position(&self) -> Option<Vec2> {
        match self {
            InputEvent::MouseMoved(p) => Some(*p),
            InputEvent::MouseButtonPressed { position, .. }
            | InputEvent::MouseButtonReleased { position, .. }
            | InputEvent::MouseWheelScrolled { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Source of platform events, drained once per tick
pub trait EventSource {
    fn poll_event(&mut self) -> Option<InputEvent>;
}

/// Per-frame scripted input for headless runs
///
/// Events queued for frame `n` become visible once `advance` has been called
/// `n` times; `push` queues for the current frame.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    frame: u64,
    pending: VecDeque<(u64, InputEvent)>,
    ready: VecDeque<InputEvent>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the current frame
    pub fn push(&mut self, event: InputEvent) {
        self.ready.push_back(event);
    }

    /// Queue an event for a future frame (events must be queued in frame order)
    pub fn push_at(&mut self, frame: u64, event: InputEvent) {
        if frame <= self.frame {
            self.ready.push_back(event);
        } else {
            self.pending.push_back((frame, event));
        }
    }

    /// Move to the next frame, releasing events scheduled for it
    pub fn advance(&mut self) {
        self.frame += 1;
        while let Some((frame, _)) = self.pending.front() {
            if *frame > self.frame {
                break;
            }
            if let Some((_, event)) = self.pending.pop_front() {
                self.ready.push_back(event);
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty() && self.ready.is_empty()
    }
}

impl EventSource for ScriptedInput {
    fn poll_event(&mut self) -> Option<InputEvent> {
        self.ready.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_releases_by_frame() {
        let mut input = ScriptedInput::new();
        input.push(InputEvent::KeyPressed(Key::W));
        input.push_at(2, InputEvent::KeyReleased(Key::W));

        assert_eq!(input.poll_event(), Some(InputEvent::KeyPressed(Key::W)));
        assert_eq!(input.poll_event(), None);

        input.advance();
        assert_eq!(input.poll_event(), None);
        input.advance();
        assert_eq!(input.poll_event(), Some(InputEvent::KeyReleased(Key::W)));
        assert!(input.is_exhausted());
    }

    #[test]
    fn test_pointer_position() {
        let click = InputEvent::MouseButtonReleased {
            button: MouseButton::Left,
            position: Vec2::new(3.0, 4.0),
        };
        assert_eq!(click.pointer_position(), Some(Vec2::new(3.0, 4.0)));
        assert_eq!(InputEvent::FocusLost.pointer_position(), None);
    }
}
