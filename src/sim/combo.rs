//! Decaying defeat streak

use serde::{Deserialize, Serialize};

use super::events::{Events, GameEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboCounter {
    count: u32,
    timer: f32,
    window: f32,
}

impl ComboCounter {
    pub fn new(window: f32) -> Self {
        Self {
            count: 0,
            timer: 0.0,
            window,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Seconds left before the streak resets
    pub fn remaining(&self) -> f32 {
        self.timer
    }

    /// A defeat extends the streak and refills the window
    pub fn register_defeat(&mut self, events: &mut Events) {
        self.count += 1;
        self.timer = self.window;
        events.push(GameEvent::ComboChanged(self.count));
    }

    pub fn advance(&mut self, dt: f32, events: &mut Events) {
        if self.count == 0 {
            return;
        }
        self.timer -= dt;
        if self.timer <= 0.0 {
            self.timer = 0.0;
            self.count = 0;
            events.push(GameEvent::ComboChanged(0));
        }
    }
}
