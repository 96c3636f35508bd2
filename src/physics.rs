//! Contact detection for headless hosts
//!
//! The simulation consumes contact-begin events; it never queries geometry
//! itself. This module is the reference provider: the bar hitbox is a thin
//! segment on the ground plane, enemies and the player are circles.

use std::collections::BTreeSet;

use glam::Vec3;

use crate::consts::{ENEMY_RADIUS, PLAYER_RADIUS};
use crate::horizontal;
use crate::sim::{Body, Contact, GameState};

/// Result of an overlap check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the shapes overlap
    pub hit: bool,
    /// Closest point on the first shape
    pub point: Vec3,
    /// Penetration depth
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec3::ZERO,
            penetration: 0.0,
        }
    }
}

/// Segment (a to b) against a circle on the ground plane. Height is ignored.
pub fn segment_circle_collision(a: Vec3, b: Vec3, center: Vec3, radius: f32) -> CollisionResult {
    let a = horizontal(a);
    let line = horizontal(b) - a;
    let to_center = horizontal(center) - a;
    let len_sq = line.length_squared();

    let t = if len_sq < 0.0001 {
        0.0 // Degenerate segment, treat as a point
    } else {
        (to_center.dot(line) / len_sq).clamp(0.0, 1.0)
    };
    let closest = a + line * t;
    let dist = (to_center + a - closest).length();

    if dist < radius {
        return CollisionResult {
            hit: true,
            point: closest,
            penetration: radius - dist,
        };
    }
    CollisionResult::miss()
}

/// Circle against circle on the ground plane
pub fn circle_circle_collision(a: Vec3, ra: f32, b: Vec3, rb: f32) -> CollisionResult {
    let delta = horizontal(b - a);
    let dist = delta.length();
    if dist < ra + rb {
        return CollisionResult {
            hit: true,
            point: horizontal(a) + delta.normalize_or_zero() * ra,
            penetration: ra + rb - dist,
        };
    }
    CollisionResult::miss()
}

/// Turns per-frame overlaps into contact-begin events
///
/// A pair reports once when it starts overlapping and again only after it
/// has separated.
#[derive(Debug, Default)]
pub struct ContactTracker {
    touching: BTreeSet<Contact>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs overlapping as of the last `update`
    pub fn touching(&self) -> usize {
        self.touching.len()
    }

    /// Check every pair against the current state and return the contacts
    /// that began since the last call, ordered by enemy id
    pub fn update(&mut self, state: &GameState) -> Vec<Contact> {
        let mut now = BTreeSet::new();
        let hitbox = state.bar.hitbox();
        let player = state.player.pos;

        for enemy in state.enemies.iter() {
            if !enemy.collider_enabled() {
                continue;
            }
            let body = Body::Enemy(enemy.id);

            if let Some((pivot, tip)) = hitbox {
                if segment_circle_collision(pivot, tip, enemy.pos, ENEMY_RADIUS).hit {
                    now.insert(Contact::new(Body::BarHitbox, body));
                }
            }
            if circle_circle_collision(enemy.pos, ENEMY_RADIUS, player, PLAYER_RADIUS).hit {
                now.insert(Contact::new(body, Body::Player));
            }
        }

        let began: Vec<Contact> = now.difference(&self.touching).copied().collect();
        self.touching = now;
        began
    }

    /// Forget every pair (e.g. after a restart)
    pub fn clear(&mut self) {
        self.touching.clear();
    }
}
