//! Player health

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::events::{Events, GameEvent};
use crate::audio::SoundEffect;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec3,
    health: i32,
    max_health: i32,
    invincible: bool,
}

impl Player {
    pub fn new(pos: Vec3, max_health: i32) -> Self {
        Self {
            pos,
            health: max_health,
            max_health,
            invincible: false,
        }
    }

    pub fn announce(&self, events: &mut Events) {
        events.push(GameEvent::PlayerHealthChanged(self.health));
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    pub fn set_invincible(&mut self, invincible: bool) {
        log::debug!("player invincible: {}", invincible);
        self.invincible = invincible;
    }

    /// Returns true if this hit killed the player
    pub fn take_damage(&mut self, amount: i32, events: &mut Events) -> bool {
        if self.is_dead() || self.invincible {
            return false;
        }
        self.health -= amount;
        events.push(GameEvent::PlayerHealthChanged(self.health));
        events.push(GameEvent::Sfx(SoundEffect::PlayerDamage));

        if self.is_dead() {
            log::info!("Player died");
            events.push(GameEvent::Sfx(SoundEffect::PlayerDeath));
            events.push(GameEvent::PlayerDied);
            return true;
        }
        false
    }
}
