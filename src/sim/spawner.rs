//! Timed wave spawner
//!
//! A wave spawns `total` enemies one at a time, `spawn_interval` seconds
//! apart, on a circle around the target. The wave clears once spawning has
//! finished and every enemy it spawned has been defeated.

use std::collections::BTreeSet;
use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::{EnemyId, Enemies};
use super::events::{Events, GameEvent};
use crate::tuning::{EnemyTuning, SpawnerTuning};

/// Resumable spawn sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum SpawnPhase {
    Idle,
    Spawning { spawned: u32, until_next: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySpawner {
    tuning: SpawnerTuning,
    enemy_tuning: EnemyTuning,
    target: Option<Vec3>,
    phase: SpawnPhase,
    wave: u32,
    total: u32,
    alive: i32,
    defeated: u32,
    /// Enemies from this spawner not yet defeated
    owned: BTreeSet<EnemyId>,
    cleared: bool,
    disabled: bool,
}

impl EnemySpawner {
    pub fn new(tuning: &SpawnerTuning, enemy_tuning: &EnemyTuning, target: Option<Vec3>) -> Self {
        Self {
            tuning: tuning.clone(),
            enemy_tuning: enemy_tuning.clone(),
            target,
            phase: SpawnPhase::Idle,
            wave: 0,
            total: 0,
            alive: 0,
            defeated: 0,
            owned: BTreeSet::new(),
            cleared: false,
            disabled: false,
        }
    }

    pub fn is_spawning(&self) -> bool {
        matches!(self.phase, SpawnPhase::Spawning { .. })
    }

    /// Set after a configuration error; the spawner then never spawns
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// 1-based index of the latest wave (0 before the first)
    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn total_to_spawn(&self) -> u32 {
        self.total
    }

    pub fn defeated_count(&self) -> u32 {
        self.defeated
    }

    pub fn alive_count(&self) -> i32 {
        self.alive
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    pub fn set_target(&mut self, target: Option<Vec3>) {
        self.target = target;
    }

    /// Begin a wave of `count` enemies. No-op while a wave is still spawning.
    /// Returns true if a wave started.
    pub fn start_wave(&mut self, count: u32, events: &mut Events) -> bool {
        if self.disabled || self.is_spawning() {
            return false;
        }
        if self.enemy_tuning.archetypes.is_empty() {
            log::error!("Spawner has no enemy archetypes; disabling");
            self.disabled = true;
            return false;
        }
        if self.target.is_none() {
            log::error!("Spawner has no target; disabling");
            self.disabled = true;
            return false;
        }

        self.wave += 1;
        self.total = count;
        self.alive = 0;
        self.defeated = 0;
        self.owned.clear();
        self.cleared = false;
        log::info!("Wave {} started: {} enemies", self.wave, count);
        events.push(GameEvent::WaveStarted {
            wave: self.wave,
            total: count,
        });
        events.push(GameEvent::EnemyCountChanged {
            defeated: 0,
            total: count,
        });

        if count == 0 {
            self.fire_cleared(events);
        } else {
            self.phase = SpawnPhase::Spawning {
                spawned: 0,
                until_next: 0.0,
            };
        }
        true
    }

    /// Run the spawn sequence for `dt` seconds. Returns the ids spawned this
    /// call, in spawn order.
    pub fn advance<R: Rng>(
        &mut self,
        dt: f32,
        rng: &mut R,
        enemies: &mut Enemies,
        events: &mut Events,
    ) -> Vec<EnemyId> {
        let SpawnPhase::Spawning {
            mut spawned,
            mut until_next,
        } = self.phase
        else {
            return Vec::new();
        };

        let mut new_ids = Vec::new();
        until_next -= dt;
        while until_next <= 0.0 && spawned < self.total {
            new_ids.push(self.spawn_one(rng, enemies, events));
            spawned += 1;
            until_next += self.tuning.spawn_interval;
        }

        if spawned >= self.total {
            self.phase = SpawnPhase::Idle;
            log::debug!("Wave {} finished spawning", self.wave);
            if self.alive <= 0 {
                self.fire_cleared(events);
            }
        } else {
            self.phase = SpawnPhase::Spawning { spawned, until_next };
        }
        new_ids
    }

    fn spawn_one<R: Rng>(
        &mut self,
        rng: &mut R,
        enemies: &mut Enemies,
        events: &mut Events,
    ) -> EnemyId {
        let archetypes = &self.enemy_tuning.archetypes;
        let index = rng.random_range(0..archetypes.len());
        let angle = rng.random_range(0.0..TAU);
        let center = self.target.unwrap_or(Vec3::ZERO);
        let pos = center
            + Vec3::new(angle.cos(), 0.0, angle.sin()) * self.tuning.spawn_radius;

        let id = enemies.spawn(index, &archetypes[index], &self.enemy_tuning, pos);
        if let Some(enemy) = enemies.get_mut(id) {
            enemy.initialize(self.target);
        }
        self.owned.insert(id);
        self.alive += 1;
        events.push(GameEvent::EnemySpawned(id));
        id
    }

    /// Count a defeat. Ids this spawner did not create are ignored.
    /// Returns true if this defeat cleared the wave.
    pub fn on_enemy_defeated(&mut self, id: EnemyId, events: &mut Events) -> bool {
        if !self.owned.remove(&id) {
            return false;
        }
        self.alive -= 1;
        self.defeated += 1;
        events.push(GameEvent::EnemyCountChanged {
            defeated: self.defeated,
            total: self.total,
        });

        if !self.is_spawning() && self.alive <= 0 {
            return self.fire_cleared(events);
        }
        false
    }

    fn fire_cleared(&mut self, events: &mut Events) -> bool {
        if self.cleared {
            return false;
        }
        self.cleared = true;
        log::info!("Wave {} cleared", self.wave);
        events.push(GameEvent::WaveCleared { wave: self.wave });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn spawner(count: u32) -> EnemySpawner {
        let tuning = SpawnerTuning {
            enemies_to_spawn: count,
            ..Default::default()
        };
        EnemySpawner::new(&tuning, &EnemyTuning::default(), Some(Vec3::ZERO))
    }

    fn cleared_count(events: &Events) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::WaveCleared { .. }))
            .count()
    }

    #[test]
    fn test_spawns_at_interval_on_circle() {
        let mut s = spawner(3);
        let mut rng = Pcg32::seed_from_u64(7);
        let mut enemies = Enemies::new();
        let mut events = Events::new();
        assert!(s.start_wave(3, &mut events));

        assert_eq!(s.advance(0.0, &mut rng, &mut enemies, &mut events).len(), 1);
        assert_eq!(s.advance(0.5, &mut rng, &mut enemies, &mut events).len(), 0);
        assert_eq!(s.advance(0.5, &mut rng, &mut enemies, &mut events).len(), 1);
        assert!(s.is_spawning());
        assert_eq!(s.advance(1.0, &mut rng, &mut enemies, &mut events).len(), 1);
        assert!(!s.is_spawning());

        for enemy in enemies.iter() {
            assert!((enemy.pos.length() - 15.0).abs() < 1e-3);
            assert_eq!(enemy.pos.y, 0.0);
        }
        assert_eq!(s.alive_count(), 3);
    }

    #[test]
    fn test_start_wave_ignored_while_spawning() {
        let mut s = spawner(3);
        let mut events = Events::new();
        assert!(s.start_wave(3, &mut events));
        assert!(!s.start_wave(5, &mut events));
        assert_eq!(s.total_to_spawn(), 3);
        assert_eq!(s.wave(), 1);
    }

    #[test]
    fn test_wave_clears_once_after_last_spawn() {
        let mut s = spawner(2);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemies = Enemies::new();
        let mut events = Events::new();
        s.start_wave(2, &mut events);

        let first = s.advance(0.0, &mut rng, &mut enemies, &mut events)[0];
        // Alive count hits zero while still spawning: no clear yet
        assert!(!s.on_enemy_defeated(first, &mut events));
        assert_eq!(s.alive_count(), 0);
        assert_eq!(cleared_count(&events), 0);

        let second = s.advance(1.0, &mut rng, &mut enemies, &mut events)[0];
        assert!(!s.is_spawning());
        assert_eq!(cleared_count(&events), 0);

        assert!(s.on_enemy_defeated(second, &mut events));
        assert_eq!(cleared_count(&events), 1);
        assert_eq!(s.defeated_count(), 2);

        // Duplicate and foreign defeats change nothing
        assert!(!s.on_enemy_defeated(second, &mut events));
        assert!(!s.on_enemy_defeated(EnemyId(999), &mut events));
        assert_eq!(cleared_count(&events), 1);
    }

    #[test]
    fn test_missing_archetypes_disables_spawner() {
        let enemy_tuning = EnemyTuning {
            archetypes: Vec::new(),
            ..Default::default()
        };
        let mut s = EnemySpawner::new(&SpawnerTuning::default(), &enemy_tuning, Some(Vec3::ZERO));
        let mut events = Events::new();
        assert!(!s.start_wave(10, &mut events));
        assert!(s.is_disabled());
        assert!(events.is_empty());
        assert_eq!(s.total_to_spawn(), 0);
    }

    #[test]
    fn test_missing_target_disables_spawner() {
        let mut s = EnemySpawner::new(&SpawnerTuning::default(), &EnemyTuning::default(), None);
        let mut events = Events::new();
        assert!(!s.start_wave(10, &mut events));
        assert!(s.is_disabled());
    }

    #[test]
    fn test_same_seed_same_spawns() {
        let run = |seed| {
            let mut s = spawner(5);
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut enemies = Enemies::new();
            let mut events = Events::new();
            s.start_wave(5, &mut events);
            s.advance(10.0, &mut rng, &mut enemies, &mut events);
            enemies.iter().map(|e| (e.archetype, e.pos)).collect::<Vec<_>>()
        };
        assert_eq!(run(42).len(), 5);
        assert_eq!(run(42), run(42));
    }
}
