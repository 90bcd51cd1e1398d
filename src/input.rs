//! Pointer and keyboard input.
//!
//! [`InputTracker`] owns the single shared target point that most modes
//! arrange particles around. Mouse movement and the first touch contact are
//! treated the same way. When the tracked contact lifts while other fingers
//! are still down, the oldest remaining one takes over. Updates are refused while the supernova is
//! gathering, so the collapse always lands on the canvas centre.
//!
//! Keyboard state is tracked per frame for the window driver:
//!
//! ```ignore
//! if input.key_pressed(KeyCode::Space) {
//!     token += 1;
//!     simulation.trigger_supernova(token);
//! }
//! ```

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, TouchPhase, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::animation::AnimationState;

/// Keys the drivers react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Space,
    Tab,
    Escape,
    Enter,
    Other(u32),
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Tab => KeyCode::Tab,
            WinitKeyCode::Escape => KeyCode::Escape,
            WinitKeyCode::Enter | WinitKeyCode::NumpadEnter => KeyCode::Enter,
            _ => KeyCode::Other(key as u32),
        }
    }
}

/// Shared target point plus per-frame keyboard state.
#[derive(Debug)]
pub struct InputTracker {
    target: Vec2,
    canvas: Vec2,
    interacted: bool,
    touch_id: Option<u64>,
    /// Active contacts in the order they went down, with their last position.
    touches: Vec<(u64, Vec2)>,

    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
}

impl InputTracker {
    /// Tracker for a `width` x `height` canvas, target at its centre.
    pub fn new(width: f32, height: f32) -> Self {
        let canvas = Vec2::new(width, height).max(Vec2::ZERO);
        Self {
            target: canvas * 0.5,
            canvas,
            interacted: false,
            touch_id: None,
            touches: Vec::new(),
            keys_held: HashSet::new(),
            keys_pressed: HashSet::new(),
        }
    }

    /// The shared target point in canvas pixels.
    #[inline]
    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Whether any pointer update has been accepted yet.
    #[inline]
    pub fn interacted(&self) -> bool {
        self.interacted
    }

    #[inline]
    pub fn canvas_size(&self) -> Vec2 {
        self.canvas
    }

    /// Move the target unless the supernova is gathering.
    ///
    /// Returns whether the update was accepted.
    pub fn pointer_moved(&mut self, position: Vec2, state: AnimationState) -> bool {
        if state == AnimationState::Gathering || !position.is_finite() {
            return false;
        }
        self.target = position;
        self.interacted = true;
        true
    }

    /// Record a new canvas size. The target recentres until the first interaction.
    pub fn canvas_resized(&mut self, width: f32, height: f32) {
        self.canvas = Vec2::new(width, height).max(Vec2::ZERO);
        if !self.interacted {
            self.target = self.canvas * 0.5;
        }
    }

    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Clear per-frame key presses. Call once per frame after reacting to them.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
    }

    /// Contact currently driving the target, if any.
    pub fn tracked_touch(&self) -> Option<u64> {
        self.touch_id
    }

    /// Feed one touch contact update.
    pub fn touch(&mut self, id: u64, phase: TouchPhase, position: Vec2, state: AnimationState) {
        match phase {
            TouchPhase::Started | TouchPhase::Moved => {
                match self.touches.iter_mut().find(|(t, _)| *t == id) {
                    Some(contact) => contact.1 = position,
                    None => self.touches.push((id, position)),
                }
                if self.touch_id.is_none() {
                    self.touch_id = Some(id);
                }
                if self.touch_id == Some(id) {
                    self.pointer_moved(position, state);
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.touches.retain(|(t, _)| *t != id);
                if self.touch_id == Some(id) {
                    self.touch_id = self.touches.first().map(|(t, _)| *t);
                    if let Some(&(next, at)) = self.touches.first() {
                        log::trace!("touch {id} lifted, following {next}");
                        self.pointer_moved(at, state);
                    }
                }
            }
        }
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent, state: AnimationState) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    let key = KeyCode::from(code);
                    match event.state {
                        ElementState::Pressed => {
                            // Ignore auto-repeat.
                            if self.keys_held.insert(key) {
                                self.keys_pressed.insert(key);
                            }
                        }
                        ElementState::Released => {
                            self.keys_held.remove(&key);
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_moved(Vec2::new(position.x as f32, position.y as f32), state);
            }

            WindowEvent::Touch(touch) => {
                let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                self.touch(touch.id, touch.phase, position, state);
            }

            WindowEvent::Resized(size) => {
                self.canvas_resized(size.width as f32, size.height as f32);
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_canvas_centre() {
        let input = InputTracker::new(800.0, 600.0);
        assert_eq!(input.target(), Vec2::new(400.0, 300.0));
        assert!(!input.interacted());
    }

    #[test]
    fn test_pointer_updates_target() {
        let mut input = InputTracker::new(800.0, 600.0);
        assert!(input.pointer_moved(Vec2::new(10.0, 20.0), AnimationState::Normal));
        assert_eq!(input.target(), Vec2::new(10.0, 20.0));
        assert!(input.interacted());

        assert!(input.pointer_moved(Vec2::new(30.0, 40.0), AnimationState::Exploding));
        assert_eq!(input.target(), Vec2::new(30.0, 40.0));
    }

    #[test]
    fn test_pointer_ignored_while_gathering() {
        let mut input = InputTracker::new(800.0, 600.0);
        assert!(!input.pointer_moved(Vec2::new(10.0, 20.0), AnimationState::Gathering));
        assert_eq!(input.target(), Vec2::new(400.0, 300.0));
        assert!(!input.interacted());
    }

    #[test]
    fn test_resize_recentres_until_interaction() {
        let mut input = InputTracker::new(800.0, 600.0);
        input.canvas_resized(1000.0, 500.0);
        assert_eq!(input.target(), Vec2::new(500.0, 250.0));

        input.pointer_moved(Vec2::new(1.0, 2.0), AnimationState::Normal);
        input.canvas_resized(200.0, 200.0);
        assert_eq!(input.target(), Vec2::new(1.0, 2.0));
        assert_eq!(input.canvas_size(), Vec2::new(200.0, 200.0));
    }

    #[test]
    fn test_non_finite_pointer_rejected() {
        let mut input = InputTracker::new(800.0, 600.0);
        assert!(!input.pointer_moved(Vec2::new(f32::NAN, 0.0), AnimationState::Normal));
        assert_eq!(input.target(), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_key_pressed_cleared_each_frame() {
        let mut input = InputTracker::new(800.0, 600.0);
        input.keys_held.insert(KeyCode::Space);
        input.keys_pressed.insert(KeyCode::Space);
        assert!(input.key_pressed(KeyCode::Space));

        input.begin_frame();
        assert!(!input.key_pressed(KeyCode::Space));
        assert!(input.key_held(KeyCode::Space));
    }

    #[test]
    fn test_first_touch_drives_target() {
        let mut input = InputTracker::new(800.0, 600.0);
        let normal = AnimationState::Normal;
        input.touch(1, TouchPhase::Started, Vec2::new(10.0, 10.0), normal);
        input.touch(2, TouchPhase::Started, Vec2::new(50.0, 50.0), normal);
        assert_eq!(input.tracked_touch(), Some(1));
        assert_eq!(input.target(), Vec2::new(10.0, 10.0));

        input.touch(2, TouchPhase::Moved, Vec2::new(60.0, 60.0), normal);
        assert_eq!(input.target(), Vec2::new(10.0, 10.0));
        input.touch(1, TouchPhase::Moved, Vec2::new(12.0, 14.0), normal);
        assert_eq!(input.target(), Vec2::new(12.0, 14.0));
    }

    #[test]
    fn test_next_touch_takes_over_when_tracked_one_lifts() {
        let mut input = InputTracker::new(800.0, 600.0);
        let normal = AnimationState::Normal;
        input.touch(1, TouchPhase::Started, Vec2::new(10.0, 10.0), normal);
        input.touch(2, TouchPhase::Started, Vec2::new(50.0, 50.0), normal);
        input.touch(3, TouchPhase::Started, Vec2::new(90.0, 90.0), normal);
        input.touch(2, TouchPhase::Moved, Vec2::new(60.0, 70.0), normal);

        input.touch(1, TouchPhase::Ended, Vec2::new(10.0, 10.0), normal);
        assert_eq!(input.tracked_touch(), Some(2));
        assert_eq!(input.target(), Vec2::new(60.0, 70.0));

        input.touch(2, TouchPhase::Cancelled, Vec2::new(60.0, 70.0), normal);
        assert_eq!(input.tracked_touch(), Some(3));
        assert_eq!(input.target(), Vec2::new(90.0, 90.0));
        input.touch(3, TouchPhase::Moved, Vec2::new(95.0, 91.0), normal);
        assert_eq!(input.target(), Vec2::new(95.0, 91.0));

        input.touch(3, TouchPhase::Ended, Vec2::new(95.0, 91.0), normal);
        assert_eq!(input.tracked_touch(), None);
        assert_eq!(input.target(), Vec2::new(95.0, 91.0));

        // A fresh contact is adopted once every finger is up.
        input.touch(4, TouchPhase::Started, Vec2::new(5.0, 6.0), normal);
        assert_eq!(input.tracked_touch(), Some(4));
        assert_eq!(input.target(), Vec2::new(5.0, 6.0));
    }

    #[test]
    fn test_untracked_touch_lifting_keeps_target() {
        let mut input = InputTracker::new(800.0, 600.0);
        let normal = AnimationState::Normal;
        input.touch(1, TouchPhase::Started, Vec2::new(10.0, 10.0), normal);
        input.touch(2, TouchPhase::Started, Vec2::new(50.0, 50.0), normal);
        input.touch(2, TouchPhase::Ended, Vec2::new(50.0, 50.0), normal);
        assert_eq!(input.tracked_touch(), Some(1));
        assert_eq!(input.target(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_handover_respects_gathering() {
        let mut input = InputTracker::new(800.0, 600.0);
        input.touch(1, TouchPhase::Started, Vec2::new(10.0, 10.0), AnimationState::Normal);
        input.touch(2, TouchPhase::Started, Vec2::new(50.0, 50.0), AnimationState::Normal);
        input.touch(1, TouchPhase::Ended, Vec2::new(10.0, 10.0), AnimationState::Gathering);
        assert_eq!(input.tracked_touch(), Some(2));
        assert_eq!(input.target(), Vec2::new(10.0, 10.0));
    }
}
