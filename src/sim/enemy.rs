//! Enemy entities and the live enemy population
//!
//! An enemy walks toward its target, reacts to hits with a short stun, and on
//! a lethal hit enters `Dying`: it gets knocked back (or stores the knockback
//! while frozen) and is removed after a fixed delay.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::events::{AnimTrigger, DefeatCause, Events, GameEvent, Tint};
use crate::audio::SoundEffect;
use crate::consts::{GRAVITY, KNOCKBACK_SPIN_FACTOR};
use crate::tuning::{EnemyArchetype, EnemyTuning};
use crate::{dir_to_yaw, horizontal, normalize_angle};

/// Stable enemy identity (ids are never reused within a session)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnemyId(pub u32);

/// Enemy lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyState {
    /// Created, not yet given a target
    Spawning,
    /// Walking toward the target
    Moving,
    /// Defeated; flying off until removal
    Dying,
}

/// Deferred action captured while frozen
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PendingAction {
    #[default]
    Absent,
    Knockback { direction: Vec3, force: f32 },
}

impl PendingAction {
    /// Take the pending action, leaving `Absent` behind
    pub fn take(&mut self) -> PendingAction {
        std::mem::take(self)
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, PendingAction::Absent)
    }
}

/// Result of a damage call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Enemy was already dying
    Ignored,
    /// Enemy survived with this much health
    Hurt { health: i32 },
    /// This hit moved the enemy into `Dying`
    Killed,
}

/// A recorded defeat, drained by the session each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defeat {
    pub id: EnemyId,
    pub cause: DefeatCause,
    pub score_value: u32,
}

/// A single enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EnemyId,
    /// Index into the archetype list it was created from
    pub archetype: usize,
    pub health: i32,
    pub pos: Vec3,
    pub vel: Vec3,
    /// Facing on the ground plane
    pub yaw: f32,
    /// Yaw spin picked up from knockback (radians/sec)
    pub spin: f32,
    pub move_speed: f32,
    pub score_value: u32,
    state: EnemyState,
    frozen: bool,
    pending: PendingAction,
    target: Option<Vec3>,
    stun_timer: f32,
    hit_stun: f32,
    despawn_delay: f32,
    despawn_timer: Option<f32>,
    collider_enabled: bool,
    tint: Tint,
}

impl Enemy {
    pub fn new(
        id: EnemyId,
        archetype: usize,
        data: &EnemyArchetype,
        tuning: &EnemyTuning,
        pos: Vec3,
    ) -> Self {
        Self {
            id,
            archetype,
            health: data.health,
            pos,
            vel: Vec3::ZERO,
            yaw: 0.0,
            spin: 0.0,
            move_speed: data.move_speed,
            score_value: data.score_value,
            state: EnemyState::Spawning,
            frozen: false,
            pending: PendingAction::Absent,
            target: None,
            stun_timer: 0.0,
            hit_stun: tuning.hit_stun,
            despawn_delay: tuning.despawn_delay,
            despawn_timer: None,
            collider_enabled: true,
            tint: Tint::Normal,
        }
    }

    pub fn state(&self) -> EnemyState {
        self.state
    }

    pub fn is_dying(&self) -> bool {
        self.state == EnemyState::Dying
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Frozen bodies ignore forces and impulses
    pub fn is_kinematic(&self) -> bool {
        self.frozen
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_timer > 0.0
    }

    pub fn collider_enabled(&self) -> bool {
        self.collider_enabled
    }

    pub fn pending(&self) -> PendingAction {
        self.pending
    }

    pub fn tint(&self) -> Tint {
        self.tint
    }

    pub fn target(&self) -> Option<Vec3> {
        self.target
    }

    /// Start moving toward `target`. Only the first call has an effect.
    ///
    /// A missing target is tolerated: the enemy enters `Moving` but stands still.
    pub fn initialize(&mut self, target: Option<Vec3>) {
        if self.state != EnemyState::Spawning {
            return;
        }
        self.target = target;
        self.state = EnemyState::Moving;
        if let Some(target) = target {
            let to_target = horizontal(target - self.pos);
            if to_target != Vec3::ZERO {
                self.yaw = dir_to_yaw(to_target);
            }
        }
    }

    /// Apply damage with the knockback to use if this hit is lethal
    pub fn take_damage(
        &mut self,
        amount: i32,
        knockback_dir: Vec3,
        knockback_force: f32,
        events: &mut Events,
    ) -> DamageOutcome {
        if self.state == EnemyState::Dying {
            return DamageOutcome::Ignored;
        }

        self.health -= amount;

        if self.health > 0 {
            events.push(GameEvent::Sfx(SoundEffect::EnemyDamage));
            events.push(GameEvent::Animation {
                id: self.id,
                trigger: AnimTrigger::Hit,
            });
            // Frozen tint overrides the damage cue and frozen bodies don't move anyway
            if !self.frozen {
                self.set_tint(Tint::Damaged, events);
                self.stun_timer = self.hit_stun;
                self.vel = Vec3::ZERO;
            }
            return DamageOutcome::Hurt {
                health: self.health,
            };
        }

        self.state = EnemyState::Dying;
        self.collider_enabled = false;
        self.stun_timer = 0.0;
        events.push(GameEvent::Sfx(SoundEffect::EnemyDeath));
        events.push(GameEvent::Animation {
            id: self.id,
            trigger: AnimTrigger::Die,
        });

        if self.frozen {
            self.pending = PendingAction::Knockback {
                direction: knockback_dir,
                force: knockback_force,
            };
        } else {
            self.apply_knockback(knockback_dir, knockback_force);
        }

        self.despawn_timer = Some(self.despawn_delay);
        DamageOutcome::Killed
    }

    /// Instant impulse (mass 1), replacing current velocity
    fn apply_knockback(&mut self, direction: Vec3, force: f32) {
        self.vel = direction.normalize_or_zero() * force;
        self.spin = force * KNOCKBACK_SPIN_FACTOR;
    }

    /// Continuous force for `dt` seconds; ignored while kinematic
    pub fn apply_force(&mut self, force: Vec3, dt: f32) {
        if self.is_kinematic() {
            return;
        }
        self.vel += force * dt;
    }

    /// Zero velocity; ignored while kinematic
    pub fn halt(&mut self) {
        if self.is_kinematic() {
            return;
        }
        self.vel = Vec3::ZERO;
    }

    /// Returns true if the enemy was not already frozen
    pub fn freeze(&mut self, events: &mut Events) -> bool {
        if self.frozen {
            return false;
        }
        self.frozen = true;
        self.set_tint(Tint::Frozen, events);
        true
    }

    /// Returns true if the enemy was frozen. Replays a pending knockback.
    pub fn unfreeze(&mut self, events: &mut Events) -> bool {
        if !self.frozen {
            return false;
        }
        self.frozen = false;
        self.set_tint(Tint::Normal, events);

        if let PendingAction::Knockback { direction, force } = self.pending.take() {
            self.apply_knockback(direction, force);
        }
        true
    }

    fn set_tint(&mut self, tint: Tint, events: &mut Events) {
        if self.tint == tint {
            return;
        }
        self.tint = tint;
        events.push(GameEvent::EnemyTint { id: self.id, tint });
    }

    /// Update stun and steering. Call before external forces for the tick.
    pub fn steer(&mut self, dt: f32, events: &mut Events) {
        if self.frozen {
            return;
        }

        if self.stun_timer > 0.0 {
            self.stun_timer -= dt;
            if self.stun_timer > 0.0 {
                return;
            }
            self.stun_timer = 0.0;
            if self.state != EnemyState::Dying {
                self.set_tint(Tint::Normal, events);
            }
        }

        if self.state != EnemyState::Moving {
            return;
        }
        let Some(target) = self.target else {
            return;
        };

        let dir = horizontal(target - self.pos).normalize_or_zero();
        self.vel = Vec3::new(dir.x * self.move_speed, self.vel.y, dir.z * self.move_speed);
        if dir != Vec3::ZERO {
            let delta = normalize_angle(dir_to_yaw(dir) - self.yaw);
            self.yaw = normalize_angle(self.yaw + delta * (dt * 10.0).min(1.0));
        }
    }

    /// Integrate motion and count down removal. Returns true once the enemy
    /// should be removed from the world.
    pub fn integrate(&mut self, dt: f32) -> bool {
        if let Some(timer) = self.despawn_timer.as_mut() {
            *timer -= dt;
            if *timer <= 0.0 {
                return true;
            }
        }

        if self.frozen {
            return false;
        }

        if self.state == EnemyState::Dying {
            self.vel.y -= GRAVITY * dt;
        }
        self.pos += self.vel * dt;
        if self.pos.y < 0.0 {
            self.pos.y = 0.0;
            self.vel.y = 0.0;
        }
        if self.spin != 0.0 {
            self.yaw = normalize_angle(self.yaw + self.spin * dt);
        }
        false
    }

    /// Death from walking into the player: no knockback, no death animation
    fn die_by_collision(&mut self) {
        self.state = EnemyState::Dying;
        self.collider_enabled = false;
    }
}

/// The live enemy population, kept sorted by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemies {
    list: Vec<Enemy>,
    next_id: u32,
    defeats: Vec<Defeat>,
}

impl Default for Enemies {
    fn default() -> Self {
        Self::new()
    }
}

impl Enemies {
    pub fn new() -> Self {
        Self {
            list: Vec::new(),
            next_id: 1,
            defeats: Vec::new(),
        }
    }

    /// Create an enemy in the `Spawning` state
    pub fn spawn(
        &mut self,
        archetype: usize,
        data: &EnemyArchetype,
        tuning: &EnemyTuning,
        pos: Vec3,
    ) -> EnemyId {
        let id = EnemyId(self.next_id);
        self.next_id += 1;
        self.list.push(Enemy::new(id, archetype, data, tuning, pos));
        id
    }

    fn index_of(&self, id: EnemyId) -> Option<usize> {
        self.list.binary_search_by_key(&id, |e| e.id).ok()
    }

    /// Look up an enemy; `None` if it was destroyed
    pub fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.index_of(id).map(|i| &self.list[i])
    }

    pub fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.index_of(id).map(|i| &mut self.list[i])
    }

    pub fn contains(&self, id: EnemyId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.list.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.list.iter_mut()
    }

    /// Snapshot of every id currently in the world
    pub fn ids(&self) -> Vec<EnemyId> {
        self.list.iter().map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Enemies in the world that are not dying
    pub fn alive_count(&self) -> usize {
        self.list.iter().filter(|e| !e.is_dying()).count()
    }

    /// Damage an enemy by id. Destroyed ids are ignored.
    pub fn damage(
        &mut self,
        id: EnemyId,
        amount: i32,
        knockback_dir: Vec3,
        knockback_force: f32,
        events: &mut Events,
    ) -> DamageOutcome {
        let Some(index) = self.index_of(id) else {
            return DamageOutcome::Ignored;
        };
        let enemy = &mut self.list[index];
        let outcome = enemy.take_damage(amount, knockback_dir, knockback_force, events);
        if outcome == DamageOutcome::Killed {
            self.defeats.push(Defeat {
                id,
                cause: DefeatCause::Combat,
                score_value: enemy.score_value,
            });
        }
        outcome
    }

    /// Remove an enemy that touched the player. Returns false if it was
    /// already dying or gone.
    pub fn collision_death(&mut self, id: EnemyId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if self.list[index].is_dying() {
            return false;
        }
        self.list[index].die_by_collision();
        let enemy = self.list.remove(index);
        self.defeats.push(Defeat {
            id,
            cause: DefeatCause::Collision,
            score_value: enemy.score_value,
        });
        true
    }

    /// Stun countdown and steering for every enemy
    pub fn steer(&mut self, dt: f32, events: &mut Events) {
        for enemy in &mut self.list {
            enemy.steer(dt, events);
        }
    }

    /// Move every enemy and drop the ones whose removal delay ran out
    pub fn integrate(&mut self, dt: f32) {
        self.list.retain_mut(|enemy| {
            let expired = enemy.integrate(dt);
            if expired {
                log::debug!("enemy {:?} removed", enemy.id);
            }
            !expired
        });
    }

    /// Defeats recorded since the last call, in the order they happened
    pub fn take_defeats(&mut self) -> Vec<Defeat> {
        std::mem::take(&mut self.defeats)
    }
}
