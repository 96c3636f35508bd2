//! Session state
//!
//! One `GameState` owns every subsystem and passes each the collaborators it
//! needs per call. Nothing reaches for globals.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bar::BarWeapon;
use super::combo::ComboCounter;
use super::enemy::Enemies;
use super::events::{Events, GameEvent};
use super::items::ItemCoordinator;
use super::player::Player;
use super::spawner::EnemySpawner;
use crate::audio::MusicTrack;
use crate::tuning::Tuning;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the first bar release before wave 1
    Tutorial,
    /// A wave is running
    Playing,
    /// Rest between a cleared wave and the next
    Breather,
    /// Game is paused
    Paused,
    /// Player died
    GameOver,
}

/// Complete session state (deterministic for a given seed and input stream)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub(crate) rng: Pcg32,
    pub phase: GamePhase,
    /// Phase to resume when unpausing
    pub(crate) resume_phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub score: u64,
    /// Seconds left in the current breather
    pub breather_timer: f32,
    pub player: Player,
    pub bar: BarWeapon,
    pub enemies: Enemies,
    pub spawner: EnemySpawner,
    pub items: ItemCoordinator,
    pub combo: ComboCounter,
    pub(crate) events: Events,
}

impl GameState {
    /// Create a session. Starts wave 1 right away unless the tutorial gate is on.
    ///
    /// Sections of `tuning` that fail validation are replaced by their
    /// defaults before any subsystem reads them.
    pub fn new(seed: u64, mut tuning: Tuning) -> Self {
        for problem in tuning.repair() {
            log::error!("{}; using default values for that section", problem);
        }

        let player = Player::new(glam::Vec3::ZERO, tuning.player.max_health);
        let bar = BarWeapon::new(&tuning.bar, &tuning.combat, player.pos);
        let spawner = EnemySpawner::new(&tuning.spawner, &tuning.enemies, Some(player.pos));
        let items = ItemCoordinator::new(&tuning.items);
        let combo = ComboCounter::new(tuning.combo.reset_time);

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            resume_phase: GamePhase::Playing,
            time_ticks: 0,
            score: 0,
            breather_timer: 0.0,
            player,
            bar,
            enemies: Enemies::new(),
            spawner,
            items,
            combo,
            events: Events::new(),
            tuning,
        };

        state.player.announce(&mut state.events);
        state.bar.announce(&mut state.events);
        state.items.announce(&mut state.events);
        state.events.push(GameEvent::Music {
            track: MusicTrack::Gameplay,
            fade_secs: state.tuning.session.music_fade_secs,
        });

        if state.tuning.session.tutorial {
            state.phase = GamePhase::Tutorial;
            state.bar.set_tutorial_override(true);
        } else {
            state.start_next_wave();
        }
        state
    }

    /// Enemy count for the next wave
    pub fn next_wave_size(&self) -> u32 {
        let growth = self.tuning.session.enemies_per_wave_growth;
        self.tuning.spawner.enemies_to_spawn + self.spawner.wave() * growth
    }

    pub(crate) fn start_next_wave(&mut self) {
        let count = self.next_wave_size();
        self.spawner.start_wave(count, &mut self.events);
        self.phase = GamePhase::Playing;
    }

    /// Leave the tutorial after the first successful bar release
    pub(crate) fn finish_tutorial(&mut self) {
        log::info!("Tutorial complete");
        self.bar.set_tutorial_override(false);
        self.start_next_wave();
    }

    /// Notifications queued since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take every queued notification
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::{ItemKind, TickInput, tick};

    #[test]
    fn test_new_session_announces_and_starts_wave() {
        let state = GameState::new(1, Tuning::default());
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.spawner.wave(), 1);
        let events = state.events();
        assert!(events.contains(&GameEvent::DeploymentsChanged(5)));
        assert!(events.contains(&GameEvent::PlayerHealthChanged(5)));
        assert!(events.contains(&GameEvent::WaveStarted { wave: 1, total: 10 }));
    }

    #[test]
    fn test_tutorial_defers_first_wave() {
        let mut tuning = Tuning::default();
        tuning.session.tutorial = true;
        let state = GameState::new(1, tuning);
        assert_eq!(state.phase, GamePhase::Tutorial);
        assert_eq!(state.spawner.wave(), 0);
        assert!(state.bar.tutorial_override());
    }

    #[test]
    fn test_bad_tuning_section_falls_back_to_defaults() {
        let mut tuning = Tuning::default();
        tuning.items.magnet_safe_radius = -1.0;
        tuning.bar.max_deployments = 7;
        let mut state = GameState::new(3, tuning);
        assert_eq!(state.tuning.items.magnet_safe_radius, 1.5);
        assert_eq!(state.tuning.bar.max_deployments, 7);

        // An enemy standing on the player under the magnet stays finite
        let data = state.tuning.enemies.archetypes[0].clone();
        state
            .enemies
            .spawn(0, &data, &state.tuning.enemies, glam::Vec3::ZERO);
        let input = TickInput {
            use_item: Some(ItemKind::MagnetField),
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(!state.enemies.is_empty());
        for enemy in state.enemies.iter() {
            assert!(enemy.pos.is_finite(), "enemy {:?} at {}", enemy.id, enemy.pos);
            assert!(enemy.vel.is_finite());
        }
    }

    #[test]
    fn test_state_json_roundtrip_continues_identically() {
        let mut a = GameState::new(11, Tuning::default());
        for _ in 0..90 {
            tick(&mut a, &TickInput::default(), SIM_DT);
        }
        let json = serde_json::to_string(&a).unwrap();
        let mut b: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(b.phase, a.phase);
        assert_eq!(b.time_ticks, a.time_ticks);

        // Same RNG position, so the next spawns land in the same places
        for _ in 0..120 {
            tick(&mut a, &TickInput::default(), SIM_DT);
            tick(&mut b, &TickInput::default(), SIM_DT);
        }
        let pos_a: Vec<_> = a.enemies.iter().map(|e| (e.id, e.pos)).collect();
        let pos_b: Vec<_> = b.enemies.iter().map(|e| (e.id, e.pos)).collect();
        assert_eq!(pos_a, pos_b);
    }

    #[test]
    fn test_wave_size_grows() {
        let state = GameState::new(1, Tuning::default());
        // Wave 1 already started with 10; wave 2 gets 10 + 1 * 2
        assert_eq!(state.next_wave_size(), 12);
    }
}
