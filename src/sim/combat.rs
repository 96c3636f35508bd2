//! Collision-to-damage dispatch
//!
//! The mediator owns no state besides the combat-active flag, which the bar
//! weapon flips on every transition into or out of a spinning state.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::enemy::{DamageOutcome, EnemyId, Enemies};
use super::events::Events;
use crate::horizontal;
use crate::tuning::CombatTuning;

/// A body the physics host can report in a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Body {
    /// The bar weapon's hitbox
    BarHitbox,
    /// The player's own body
    Player,
    /// An enemy (tagged with its id)
    Enemy(EnemyId),
    /// Anything else
    Scenery,
}

/// A contact-begin event between two bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Contact {
    pub a: Body,
    pub b: Body,
}

impl Contact {
    pub fn new(a: Body, b: Body) -> Self {
        Self { a, b }
    }

    /// If one side is `body`, return the other side
    pub fn other_than(&self, body: Body) -> Option<Body> {
        if self.a == body {
            Some(self.b)
        } else if self.b == body {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Knockback direction: flat direction from `origin` to `target`, tilted up by
/// `upward_ratio`, normalized.
pub fn knockback_direction(origin: Vec3, target: Vec3, upward_ratio: f32) -> Vec3 {
    let flat = horizontal(target - origin).normalize_or_zero();
    (flat + Vec3::Y * upward_ratio).normalize_or_zero()
}

/// Turns bar/enemy contacts into damage while combat is active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatMediator {
    active: bool,
    damage: i32,
    knockback_force: f32,
    upward_ratio: f32,
}

impl CombatMediator {
    pub fn new(tuning: &CombatTuning) -> Self {
        Self {
            active: false,
            damage: tuning.damage,
            knockback_force: tuning.knockback_force,
            upward_ratio: tuning.knockback_upward_ratio,
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn knockback_force(&self) -> f32 {
        self.knockback_force
    }

    /// Handle the bar touching `body`. Non-enemy bodies, destroyed enemies and
    /// inactive combat are all no-ops.
    pub fn process_hit(
        &self,
        origin: Vec3,
        body: Body,
        enemies: &mut Enemies,
        events: &mut Events,
    ) -> DamageOutcome {
        if !self.active {
            return DamageOutcome::Ignored;
        }
        let Body::Enemy(id) = body else {
            return DamageOutcome::Ignored;
        };
        let Some(enemy) = enemies.get(id) else {
            return DamageOutcome::Ignored;
        };

        let dir = knockback_direction(origin, enemy.pos, self.upward_ratio);
        let outcome = enemies.damage(id, self.damage, dir, self.knockback_force, events);
        log::debug!("bar hit {:?}: {:?}", id, outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyState;
    use crate::tuning::{EnemyArchetype, EnemyTuning};

    fn one_enemy(pos: Vec3) -> (Enemies, EnemyId) {
        let mut enemies = Enemies::new();
        let id = enemies.spawn(0, &EnemyArchetype::default(), &EnemyTuning::default(), pos);
        enemies.get_mut(id).unwrap().initialize(Some(Vec3::ZERO));
        (enemies, id)
    }

    #[test]
    fn test_knockback_direction_blends_up() {
        let dir = knockback_direction(Vec3::ZERO, Vec3::new(4.0, 3.0, 0.0), 0.5);
        let expected = Vec3::new(1.0, 0.5, 0.0).normalize();
        assert!((dir - expected).length() < 1e-6);
    }

    #[test]
    fn test_knockback_direction_on_origin_points_up() {
        assert_eq!(knockback_direction(Vec3::ZERO, Vec3::ZERO, 0.5), Vec3::Y);
    }

    #[test]
    fn test_inactive_mediator_ignores_hits() {
        let (mut enemies, id) = one_enemy(Vec3::new(2.0, 0.0, 0.0));
        let mediator = CombatMediator::new(&CombatTuning::default());
        let mut events = Events::new();
        let outcome = mediator.process_hit(Vec3::ZERO, Body::Enemy(id), &mut enemies, &mut events);
        assert_eq!(outcome, DamageOutcome::Ignored);
        assert_eq!(enemies.get(id).unwrap().state(), EnemyState::Moving);
    }

    #[test]
    fn test_active_mediator_damages_enemy_with_knockback() {
        let (mut enemies, id) = one_enemy(Vec3::new(2.0, 0.0, 0.0));
        let mut mediator = CombatMediator::new(&CombatTuning::default());
        mediator.set_active(true);
        let mut events = Events::new();
        let outcome = mediator.process_hit(Vec3::ZERO, Body::Enemy(id), &mut enemies, &mut events);
        assert_eq!(outcome, DamageOutcome::Killed);

        let enemy = enemies.get(id).unwrap();
        let expected = Vec3::new(1.0, 0.5, 0.0).normalize() * 10.0;
        assert!((enemy.vel - expected).length() < 1e-4);
    }

    #[test]
    fn test_non_enemy_body_ignored() {
        let (mut enemies, _) = one_enemy(Vec3::new(2.0, 0.0, 0.0));
        let mut mediator = CombatMediator::new(&CombatTuning::default());
        mediator.set_active(true);
        let mut events = Events::new();
        let outcome = mediator.process_hit(Vec3::ZERO, Body::Scenery, &mut enemies, &mut events);
        assert_eq!(outcome, DamageOutcome::Ignored);
        assert!(events.is_empty());
    }

    #[test]
    fn test_contact_other_than() {
        let contact = Contact::new(Body::Enemy(EnemyId(3)), Body::BarHitbox);
        assert_eq!(contact.other_than(Body::BarHitbox), Some(Body::Enemy(EnemyId(3))));
        assert_eq!(contact.other_than(Body::Player), None);
    }
}
