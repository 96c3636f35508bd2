//! Pointer samples to bar input signals
//!
//! Hosts feed one [`PointerSample`] per frame; the tracker turns button edges
//! and movement into the tap / drag signals on [`TickInput`].

use glam::Vec3;

use crate::sim::TickInput;

/// Default drag sensitivity (world units of bar per world unit of drag)
pub const DEFAULT_SENSITIVITY: f32 = 2.0;

/// One frame of raw pointer state
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerSample {
    pub pressed: bool,
    /// Pointer position projected onto the ground plane
    pub ground: Vec3,
    /// UI overlay claims the pointer
    pub over_ui: bool,
}

#[derive(Debug, Clone)]
pub struct PointerTracker {
    sensitivity: f32,
    was_pressed: bool,
    /// Ground position of the press that started the current drag
    start: Option<Vec3>,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY)
    }
}

impl PointerTracker {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            was_pressed: false,
            start: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.start.is_some()
    }

    /// Fold a sample into `input`. Only sets signals; clearing one-shots
    /// after a tick is the host's job.
    pub fn apply(&mut self, sample: PointerSample, input: &mut TickInput) {
        let pressed_now = sample.pressed && !self.was_pressed;
        let released_now = !sample.pressed && self.was_pressed;
        self.was_pressed = sample.pressed;

        input.pointer_over_ui = sample.over_ui;
        if sample.over_ui {
            // A press that lands on the UI never becomes a drag
            if pressed_now {
                self.start = None;
            }
            return;
        }

        if pressed_now {
            // Every press is both a tap and a drag start
            input.tap = true;
            input.drag_start = Some(sample.ground);
            input.drag_update = None;
            self.start = Some(sample.ground);
            return;
        }

        let Some(start) = self.start else {
            return;
        };
        if released_now {
            input.drag_end = true;
            input.drag_update = None;
            self.start = None;
        } else if sample.pressed {
            input.drag_update = Some((sample.ground - start) * self.sensitivity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(pressed: bool, x: f32, z: f32) -> PointerSample {
        PointerSample {
            pressed,
            ground: Vec3::new(x, 0.0, z),
            over_ui: false,
        }
    }

    #[test]
    fn test_press_drag_release() {
        let mut tracker = PointerTracker::default();
        let mut input = TickInput::default();

        tracker.apply(sample(true, 1.0, 1.0), &mut input);
        assert!(input.tap);
        assert_eq!(input.drag_start, Some(Vec3::new(1.0, 0.0, 1.0)));
        assert!(tracker.is_dragging());

        input = TickInput::default();
        tracker.apply(sample(true, 3.0, 1.0), &mut input);
        assert!(!input.tap);
        assert_eq!(input.drag_update, Some(Vec3::new(4.0, 0.0, 0.0)));

        input = TickInput::default();
        tracker.apply(sample(false, 3.0, 1.0), &mut input);
        assert!(input.drag_end);
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn test_custom_sensitivity() {
        let mut tracker = PointerTracker::new(1.0);
        let mut input = TickInput::default();
        tracker.apply(sample(true, 0.0, 0.0), &mut input);
        tracker.apply(sample(true, 0.0, 2.5), &mut input);
        assert_eq!(input.drag_update, Some(Vec3::new(0.0, 0.0, 2.5)));
    }

    #[test]
    fn test_ui_press_is_suppressed() {
        let mut tracker = PointerTracker::default();
        let mut input = TickInput::default();
        let on_ui = PointerSample {
            over_ui: true,
            ..sample(true, 1.0, 1.0)
        };
        tracker.apply(on_ui, &mut input);
        assert!(!input.tap);
        assert!(input.drag_start.is_none());
        assert!(input.pointer_over_ui);

        // Moving off the UI while still held does not start a drag
        tracker.apply(sample(true, 4.0, 1.0), &mut input);
        assert!(input.drag_update.is_none());
        tracker.apply(sample(false, 4.0, 1.0), &mut input);
        assert!(!input.drag_end);
    }

    #[test]
    fn test_idle_samples_emit_nothing() {
        let mut tracker = PointerTracker::default();
        let mut input = TickInput::default();
        for i in 0..5 {
            tracker.apply(sample(false, i as f32, 0.0), &mut input);
        }
        assert!(!input.tap && !input.drag_end);
        assert!(input.drag_start.is_none() && input.drag_update.is_none());
    }
}
