//! Bar Sweep - headless runner
//!
//! Plays a scripted session on the fixed-step loop and logs what happens.
//!
//! Usage: `bar-sweep [tuning.json] [seconds]`

use bar_sweep::audio::{AudioSink, LogAudio};
use bar_sweep::consts::{MAX_SUBSTEPS, SIM_DT};
use bar_sweep::input::{PointerSample, PointerTracker};
use bar_sweep::physics::ContactTracker;
use bar_sweep::sim::{GameEvent, GamePhase, GameState, ItemKind, TickInput, tick};
use bar_sweep::{Tuning, horizontal};
use glam::Vec3;

/// Host frame time; coarser than the sim step so the accumulator does real work
const FRAME_DT: f32 = 1.0 / 30.0;
const DEFAULT_SECONDS: f32 = 90.0;
/// Length of one scripted attack cycle
const CYCLE_SECS: f32 = 9.0;

/// Scripted item presses (seconds into the run)
const ITEM_SCRIPT: [(f32, ItemKind); 4] = [
    (10.0, ItemKind::TimeStop),
    (20.0, ItemKind::Bomb),
    (30.0, ItemKind::MagnetField),
    (44.5, ItemKind::InstantFever),
];

/// Session plus the host-side adapters around it
struct Game {
    state: GameState,
    accumulator: f32,
    input: TickInput,
    pointer: PointerTracker,
    contacts: ContactTracker,
    audio: LogAudio,
    next_item: usize,
}

impl Game {
    fn new(seed: u64, tuning: Tuning) -> Self {
        let mut game = Self {
            state: GameState::new(seed, tuning),
            accumulator: 0.0,
            input: TickInput::default(),
            pointer: PointerTracker::default(),
            contacts: ContactTracker::new(),
            audio: LogAudio::new(),
            next_item: 0,
        };
        game.flush_events();
        game
    }

    /// Scripted pointer: press on the player, drag toward the nearest enemy,
    /// release, then tap once mid-spin to reverse.
    fn script_pointer(&self, time: f32) -> PointerSample {
        let phase = time % CYCLE_SECS;
        let origin = self.state.player.pos;
        let aim = self
            .state
            .enemies
            .iter()
            .filter(|e| !e.is_dying())
            .min_by(|a, b| {
                let da = (a.pos - origin).length_squared();
                let db = (b.pos - origin).length_squared();
                da.total_cmp(&db)
            })
            .map(|e| horizontal(e.pos - origin).normalize_or_zero())
            .unwrap_or(Vec3::X);

        let pressed = phase < 0.3 || (4.0..4.05).contains(&phase);
        let reach = (phase / 0.3).min(1.0) * 4.0;
        PointerSample {
            pressed,
            ground: origin + aim * reach,
            over_ui: false,
        }
    }

    fn update(&mut self, dt: f32, time: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let sample = self.script_pointer(time);
        self.pointer.apply(sample, &mut self.input);
        if let Some(&(at, kind)) = ITEM_SCRIPT.get(self.next_item) {
            if time >= at {
                self.input.use_item = Some(kind);
                self.next_item += 1;
            }
        }

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.input.contacts = self.contacts.update(&self.state);
            let input = self.input.clone();
            tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.clear_one_shots();
            self.flush_events();
        }
    }

    fn flush_events(&mut self) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::Sfx(effect) => self.audio.play_sfx(effect),
                GameEvent::Music { track, fade_secs } => self.audio.play_music(track, fade_secs),
                GameEvent::WaveStarted { wave, total } => {
                    log::info!("[hud] wave {} ({} enemies)", wave, total)
                }
                GameEvent::EnemyCountChanged { defeated, total } => {
                    log::info!("[hud] {}/{} defeated", defeated, total)
                }
                GameEvent::ItemCountChanged { kind, count } => {
                    log::info!("[hud] {:?} x{}", kind, count)
                }
                GameEvent::PlayerHealthChanged(health) => log::info!("[hud] health {}", health),
                GameEvent::PivotModeChanged(mode) => log::info!("[hud] pivot {:?}", mode),
                other => log::debug!("{:?}", other),
            }
        }
    }
}

fn load_tuning(path: Option<&str>) -> Tuning {
    let Some(path) = path else {
        return Tuning::default();
    };
    match Tuning::load(path) {
        Ok(tuning) => {
            log::info!("Loaded tuning from {}", path);
            tuning
        }
        Err(e) => {
            log::error!("Failed to load tuning from {}: {}; using defaults", path, e);
            Tuning::default()
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let tuning = load_tuning(args.first().map(String::as_str));
    let seconds = match args.get(1).map(|s| s.parse::<f32>()) {
        Some(Ok(s)) if s > 0.0 => s,
        Some(_) => {
            log::warn!("Invalid duration, running {}s", DEFAULT_SECONDS);
            DEFAULT_SECONDS
        }
        None => DEFAULT_SECONDS,
    };

    let seed = 0x5EED;
    log::info!("Bar Sweep (headless) starting, seed {:#x}, {}s", seed, seconds);
    let mut game = Game::new(seed, tuning);

    let mut time = 0.0;
    while time < seconds && game.state.phase != GamePhase::GameOver {
        game.update(FRAME_DT, time);
        time += FRAME_DT;
    }

    let state = &game.state;
    println!("Phase:     {:?}", state.phase);
    println!("Wave:      {}", state.spawner.wave());
    println!("Score:     {}", state.score);
    println!("Health:    {}/{}", state.player.health(), state.player.max_health());
    println!("Ticks:     {}", state.time_ticks);
    println!("Sfx cues:  {}", game.audio.sfx_played);
}
