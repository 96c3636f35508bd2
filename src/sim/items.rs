//! Consumable items and their timed effects
//!
//! Time-stop and magnet-field are timed, at-most-one-active effects advanced
//! once per tick. Time-stop keeps a held set of frozen enemies that also
//! picks up every enemy spawned while it runs. Held ids may go stale when an
//! enemy is destroyed mid-effect; those are skipped on release.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::bar::BarWeapon;
use super::combat::knockback_direction;
use super::enemy::{EnemyId, Enemies};
use super::events::{EffectHandle, EffectKind, Events, GameEvent};
use crate::audio::SoundEffect;
use crate::horizontal;
use crate::tuning::ItemTuning;

/// Item catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    TimeStop,
    InstantFever,
    MagnetField,
    Bomb,
}

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [
        ItemKind::TimeStop,
        ItemKind::InstantFever,
        ItemKind::MagnetField,
        ItemKind::Bomb,
    ];
}

/// What a `use_item` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseOutcome {
    /// No charges left; nothing spent
    Empty,
    /// Charge spent and the effect ran
    Applied,
    /// Charge spent but the effect refused (already active, bar busy)
    Blocked,
}

/// Everything an item effect may touch during one call
pub struct ItemContext<'a> {
    pub enemies: &'a mut Enemies,
    pub bar: &'a mut BarWeapon,
    /// Player position; effects centred on the player need it
    pub target: Option<Vec3>,
    pub events: &'a mut Events,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimeStop {
    elapsed: f32,
    next_tick: f32,
    held: Vec<EnemyId>,
    effect: Option<EffectHandle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MagnetField {
    elapsed: f32,
    effect: Option<EffectHandle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCoordinator {
    tuning: ItemTuning,
    counts: BTreeMap<ItemKind, u32>,
    time_stop: Option<TimeStop>,
    magnet: Option<MagnetField>,
    next_effect: u32,
}

impl ItemCoordinator {
    pub fn new(tuning: &ItemTuning) -> Self {
        let counts = BTreeMap::from([
            (ItemKind::TimeStop, tuning.initial_time_stop),
            (ItemKind::InstantFever, tuning.initial_instant_fever),
            (ItemKind::MagnetField, tuning.initial_magnet_field),
            (ItemKind::Bomb, tuning.initial_bomb),
        ]);
        Self {
            tuning: tuning.clone(),
            counts,
            time_stop: None,
            magnet: None,
            next_effect: 1,
        }
    }

    /// Push the starting counters so observers can draw them
    pub fn announce(&self, events: &mut Events) {
        for (&kind, &count) in &self.counts {
            events.push(GameEvent::ItemCountChanged { kind, count });
        }
    }

    pub fn count(&self, kind: ItemKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_time_stop_active(&self) -> bool {
        self.time_stop.is_some()
    }

    pub fn is_magnet_active(&self) -> bool {
        self.magnet.is_some()
    }

    /// Ids currently held frozen by time-stop (may include destroyed ones)
    pub fn held(&self) -> &[EnemyId] {
        self.time_stop.as_ref().map(|t| t.held.as_slice()).unwrap_or(&[])
    }

    /// Add charges (pickups)
    pub fn add_item(&mut self, kind: ItemKind, amount: u32, events: &mut Events) {
        let count = self.counts.entry(kind).or_insert(0);
        *count = count.saturating_add(amount);
        events.push(GameEvent::ItemCountChanged { kind, count: *count });
    }

    /// Spend one charge of `kind` and run its effect. The charge is spent
    /// before the effect runs.
    pub fn use_item(&mut self, kind: ItemKind, ctx: ItemContext<'_>) -> UseOutcome {
        let Some(count) = self.counts.get_mut(&kind).filter(|c| **c > 0) else {
            return UseOutcome::Empty;
        };
        *count -= 1;
        let remaining = *count;
        ctx.events.push(GameEvent::ItemCountChanged {
            kind,
            count: remaining,
        });

        let applied = match kind {
            ItemKind::TimeStop => self.start_time_stop(ctx),
            ItemKind::InstantFever => ctx.bar.activate_fever(ctx.events),
            ItemKind::MagnetField => self.start_magnet(ctx),
            ItemKind::Bomb => {
                self.detonate(ctx);
                true
            }
        };
        log::info!("Used {:?} ({} left), applied={}", kind, remaining, applied);

        if applied {
            UseOutcome::Applied
        } else {
            UseOutcome::Blocked
        }
    }

    fn spawn_effect(
        &mut self,
        kind: EffectKind,
        pos: Vec3,
        radius: f32,
        events: &mut Events,
    ) -> EffectHandle {
        let handle = EffectHandle(self.next_effect);
        self.next_effect += 1;
        events.push(GameEvent::EffectSpawned {
            handle,
            kind,
            pos,
            radius,
        });
        handle
    }

    fn start_time_stop(&mut self, ctx: ItemContext<'_>) -> bool {
        if self.time_stop.is_some() {
            return false;
        }
        let effect = ctx
            .target
            .map(|pos| self.spawn_effect(EffectKind::TimeStop, pos, 0.0, ctx.events));

        let mut held = Vec::new();
        for enemy in ctx.enemies.iter_mut() {
            if enemy.freeze(ctx.events) {
                held.push(enemy.id);
            }
        }
        log::info!("Time stop: froze {} enemies", held.len());

        self.time_stop = Some(TimeStop {
            elapsed: 0.0,
            next_tick: 1.0,
            held,
            effect,
        });
        true
    }

    fn start_magnet(&mut self, ctx: ItemContext<'_>) -> bool {
        if self.magnet.is_some() {
            return false;
        }
        let radius = self.tuning.magnet_radius;
        let effect = ctx
            .target
            .map(|pos| self.spawn_effect(EffectKind::MagnetField, pos, radius, ctx.events));
        self.magnet = Some(MagnetField {
            elapsed: 0.0,
            effect,
        });
        true
    }

    fn detonate(&mut self, ctx: ItemContext<'_>) {
        let origin = ctx.target.unwrap_or(ctx.bar.origin());
        let damage = self.tuning.bomb_damage;
        let force = self.tuning.bomb_force;
        let upward = self.tuning.bomb_upward_ratio;

        ctx.events.push(GameEvent::Sfx(SoundEffect::BombExplosion));
        // Explosion visuals are fire-and-forget; the renderer owns their lifetime
        self.spawn_effect(EffectKind::Explosion, origin, 0.0, ctx.events);

        let mut hit = 0;
        for id in ctx.enemies.ids() {
            let Some(pos) = ctx.enemies.get(id).map(|e| e.pos) else {
                continue;
            };
            let dir = knockback_direction(origin, pos, upward);
            ctx.enemies.damage(id, damage, dir, force, ctx.events);
            hit += 1;
        }
        log::info!("Bomb hit {} enemies", hit);
    }

    /// A new enemy entered the world. Time-stop freezes and holds it.
    /// Returns true if it was frozen.
    pub fn on_enemy_spawned(
        &mut self,
        id: EnemyId,
        enemies: &mut Enemies,
        events: &mut Events,
    ) -> bool {
        let Some(time_stop) = self.time_stop.as_mut() else {
            return false;
        };
        if time_stop.held.contains(&id) {
            return false;
        }
        let Some(enemy) = enemies.get_mut(id) else {
            return false;
        };
        if enemy.freeze(events) {
            time_stop.held.push(id);
            return true;
        }
        false
    }

    /// Advance timed effects by `dt` seconds
    pub fn advance(
        &mut self,
        dt: f32,
        target: Option<Vec3>,
        enemies: &mut Enemies,
        events: &mut Events,
    ) {
        self.advance_time_stop(dt, enemies, events);
        self.advance_magnet(dt, target, enemies, events);
    }

    fn advance_time_stop(&mut self, dt: f32, enemies: &mut Enemies, events: &mut Events) {
        let Some(time_stop) = self.time_stop.as_mut() else {
            return;
        };
        time_stop.elapsed += dt;
        while time_stop.elapsed >= time_stop.next_tick
            && time_stop.next_tick < self.tuning.time_stop_duration
        {
            events.push(GameEvent::Sfx(SoundEffect::ClockTick));
            time_stop.next_tick += 1.0;
        }
        if time_stop.elapsed < self.tuning.time_stop_duration {
            return;
        }

        let mut released = 0;
        for id in time_stop.held.drain(..) {
            if let Some(enemy) = enemies.get_mut(id) {
                enemy.unfreeze(events);
                released += 1;
            }
        }
        if let Some(handle) = time_stop.effect.take() {
            events.push(GameEvent::EffectDespawned(handle));
        }
        log::info!("Time stop ended: released {} enemies", released);
        self.time_stop = None;
    }

    fn advance_magnet(
        &mut self,
        dt: f32,
        target: Option<Vec3>,
        enemies: &mut Enemies,
        events: &mut Events,
    ) {
        let Some(magnet) = self.magnet.as_mut() else {
            return;
        };
        if let Some(center) = target {
            pull_toward(center, &self.tuning, dt, enemies);
        }
        magnet.elapsed += dt;
        if magnet.elapsed < self.tuning.magnet_duration {
            return;
        }
        if let Some(handle) = magnet.effect.take() {
            events.push(GameEvent::EffectDespawned(handle));
        }
        log::info!("Magnet field ended");
        self.magnet = None;
    }
}

/// One tick of magnet pull on every live, non-kinematic enemy in range
fn pull_toward(center: Vec3, tuning: &ItemTuning, dt: f32, enemies: &mut Enemies) {
    for enemy in enemies.iter_mut() {
        if !enemy.collider_enabled() || enemy.is_kinematic() {
            continue;
        }
        let offset = horizontal(center - enemy.pos);
        let distance = offset.length();
        if distance > tuning.magnet_radius {
            continue;
        }
        if distance > tuning.magnet_safe_radius && distance > 0.0 {
            let strength = tuning.magnet_force * (1.0 - distance / tuning.magnet_radius);
            enemy.apply_force(offset / distance * strength, dt);
        } else {
            enemy.halt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::bar::BarState;
    use crate::sim::enemy::{EnemyState, PendingAction};
    use crate::tuning::{BarTuning, CombatTuning, EnemyArchetype, EnemyTuning};

    struct World {
        enemies: Enemies,
        bar: BarWeapon,
        events: Events,
        items: ItemCoordinator,
    }

    impl World {
        fn new() -> Self {
            Self {
                enemies: Enemies::new(),
                bar: BarWeapon::new(&BarTuning::default(), &CombatTuning::default(), Vec3::ZERO),
                events: Events::new(),
                items: ItemCoordinator::new(&ItemTuning::default()),
            }
        }

        fn spawn(&mut self, pos: Vec3, health: i32) -> EnemyId {
            let data = EnemyArchetype {
                health,
                ..Default::default()
            };
            let id = self.enemies.spawn(0, &data, &EnemyTuning::default(), pos);
            self.enemies.get_mut(id).unwrap().initialize(Some(Vec3::ZERO));
            self.items.on_enemy_spawned(id, &mut self.enemies, &mut self.events);
            id
        }

        fn use_item(&mut self, kind: ItemKind) -> UseOutcome {
            self.items.use_item(
                kind,
                ItemContext {
                    enemies: &mut self.enemies,
                    bar: &mut self.bar,
                    target: Some(Vec3::ZERO),
                    events: &mut self.events,
                },
            )
        }

        fn advance(&mut self, dt: f32) {
            self.items
                .advance(dt, Some(Vec3::ZERO), &mut self.enemies, &mut self.events);
        }

        fn frozen(&self, id: EnemyId) -> bool {
            self.enemies.get(id).is_some_and(|e| e.is_frozen())
        }
    }

    #[test]
    fn test_use_decrements_and_empty_is_noop() {
        let mut w = World::new();
        assert_eq!(w.use_item(ItemKind::Bomb), UseOutcome::Applied);
        assert_eq!(w.items.count(ItemKind::Bomb), 0);
        w.events.clear();
        assert_eq!(w.use_item(ItemKind::Bomb), UseOutcome::Empty);
        assert!(w.events.is_empty());

        w.items.add_item(ItemKind::Bomb, 2, &mut w.events);
        assert_eq!(w.items.count(ItemKind::Bomb), 2);
    }

    #[test]
    fn test_time_stop_covers_late_spawns_only_while_active() {
        let mut w = World::new();
        let early: Vec<_> = (0..3)
            .map(|i| w.spawn(Vec3::new(5.0 + i as f32, 0.0, 0.0), 1))
            .collect();
        assert_eq!(w.use_item(ItemKind::TimeStop), UseOutcome::Applied);

        w.advance(2.0);
        let late: Vec<_> = (0..2)
            .map(|i| w.spawn(Vec3::new(0.0, 0.0, 5.0 + i as f32), 1))
            .collect();

        for id in early.iter().chain(&late) {
            assert!(w.frozen(*id));
        }
        assert_eq!(w.items.held().len(), 5);

        w.advance(3.0);
        assert!(!w.items.is_time_stop_active());
        for id in early.iter().chain(&late) {
            assert!(!w.frozen(*id));
        }

        let after = w.spawn(Vec3::new(-5.0, 0.0, 0.0), 1);
        assert!(!w.frozen(after));

        let despawned = w
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::EffectDespawned(_)))
            .count();
        assert_eq!(despawned, 1);
    }

    #[test]
    fn test_time_stop_retrigger_spends_charge_but_is_blocked() {
        let mut w = World::new();
        w.spawn(Vec3::new(5.0, 0.0, 0.0), 1);
        assert_eq!(w.use_item(ItemKind::TimeStop), UseOutcome::Applied);
        assert_eq!(w.use_item(ItemKind::TimeStop), UseOutcome::Blocked);
        assert_eq!(w.items.count(ItemKind::TimeStop), 1);
        assert_eq!(w.items.held().len(), 1);
    }

    #[test]
    fn test_time_stop_skips_destroyed_enemies_on_release() {
        let mut w = World::new();
        let a = w.spawn(Vec3::new(5.0, 0.0, 0.0), 1);
        let b = w.spawn(Vec3::new(6.0, 0.0, 0.0), 1);
        w.use_item(ItemKind::TimeStop);
        assert!(w.enemies.collision_death(a));

        w.advance(5.0);
        assert!(!w.items.is_time_stop_active());
        assert!(!w.frozen(b));
        assert!(w.enemies.get(a).is_none());
    }

    #[test]
    fn test_time_stop_ticks_clock_each_second() {
        let mut w = World::new();
        w.use_item(ItemKind::TimeStop);
        for _ in 0..50 {
            w.advance(0.1);
        }
        let ticks = w
            .events
            .iter()
            .filter(|e| **e == GameEvent::Sfx(SoundEffect::ClockTick))
            .count();
        assert_eq!(ticks, 4);
    }

    #[test]
    fn test_bomb_kills_everything_with_heavy_knockback() {
        let mut w = World::new();
        let ids = [
            w.spawn(Vec3::new(3.0, 0.0, 0.0), 1),
            w.spawn(Vec3::new(0.0, 0.0, -4.0), 50),
            w.spawn(Vec3::new(-2.0, 0.0, 2.0), 500),
        ];
        // Frozen enemies die too, their knockback waits
        w.enemies.get_mut(ids[2]).unwrap().freeze(&mut w.events);

        assert_eq!(w.use_item(ItemKind::Bomb), UseOutcome::Applied);
        for id in ids {
            assert_eq!(w.enemies.get(id).unwrap().state(), EnemyState::Dying);
        }
        let bar_force = CombatTuning::default().knockback_force;
        assert!(w.enemies.get(ids[0]).unwrap().vel.length() > bar_force);
        assert!(w.enemies.get(ids[2]).unwrap().pending().is_present());
        assert_eq!(w.enemies.take_defeats().len(), 3);
    }

    #[test]
    fn test_instant_fever_forwards_to_bar() {
        let mut w = World::new();
        assert_eq!(w.use_item(ItemKind::InstantFever), UseOutcome::Applied);
        assert_eq!(w.bar.state(), BarState::Fever);
        // Bar busy: charge spent, effect blocked
        assert_eq!(w.use_item(ItemKind::InstantFever), UseOutcome::Blocked);
        assert_eq!(w.items.count(ItemKind::InstantFever), 0);
    }

    #[test]
    fn test_magnet_pulls_scaled_and_stops_inside_safe_radius() {
        let mut w = World::new();
        let near = w.spawn(Vec3::new(8.0, 0.0, 0.0), 1);
        let inside = w.spawn(Vec3::new(1.0, 0.0, 0.0), 1);
        let far = w.spawn(Vec3::new(20.0, 0.0, 0.0), 1);
        let frozen = w.spawn(Vec3::new(0.0, 0.0, 5.0), 1);
        w.enemies.get_mut(frozen).unwrap().freeze(&mut w.events);
        for enemy in w.enemies.iter_mut() {
            enemy.vel = Vec3::ZERO;
        }
        w.enemies.get_mut(inside).unwrap().vel = Vec3::new(-3.0, 0.0, 0.0);

        assert_eq!(w.use_item(ItemKind::MagnetField), UseOutcome::Applied);
        w.advance(0.1);

        // 15 * (1 - 8/10) * 0.1 = 0.3 toward the centre
        let v = w.enemies.get(near).unwrap().vel;
        assert!((v - Vec3::new(-0.3, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(w.enemies.get(inside).unwrap().vel, Vec3::ZERO);
        assert_eq!(w.enemies.get(far).unwrap().vel, Vec3::ZERO);
        assert_eq!(w.enemies.get(frozen).unwrap().vel, Vec3::ZERO);

        assert_eq!(w.use_item(ItemKind::MagnetField), UseOutcome::Blocked);
        w.advance(7.0);
        assert!(!w.items.is_magnet_active());

        let spawned = w.events.iter().find_map(|e| match e {
            GameEvent::EffectSpawned {
                handle,
                kind: EffectKind::MagnetField,
                ..
            } => Some(*handle),
            _ => None,
        });
        let handle = spawned.expect("magnet effect spawned");
        let despawned: Vec<_> = w
            .events
            .iter()
            .filter_map(|e| match e {
                GameEvent::EffectDespawned(h) => Some(*h),
                _ => None,
            })
            .collect();
        assert_eq!(despawned, vec![handle]);
    }

    #[test]
    fn test_bomb_during_time_stop_replays_knockback_on_release() {
        let mut w = World::new();
        let id = w.spawn(Vec3::new(4.0, 0.0, 0.0), 1);
        w.enemies.get_mut(id).unwrap().vel = Vec3::ZERO;
        assert_eq!(w.use_item(ItemKind::TimeStop), UseOutcome::Applied);
        assert!(w.frozen(id));

        assert_eq!(w.use_item(ItemKind::Bomb), UseOutcome::Applied);
        let enemy = w.enemies.get(id).unwrap();
        assert_eq!(enemy.state(), EnemyState::Dying);
        assert!(enemy.pending().is_present());
        assert_eq!(enemy.vel, Vec3::ZERO);

        w.advance(5.5);
        assert!(!w.items.is_time_stop_active());
        let enemy = w.enemies.get(id).unwrap();
        assert!(!w.frozen(id));
        assert_eq!(enemy.pending(), PendingAction::Absent);
        assert!(enemy.vel.length() > 0.0);
    }
}
