//! Data-driven game balance
//!
//! Every section deserializes with defaults, so a JSON file only needs the
//! values it wants to override.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sim::bar::PivotMode;

/// Degrees-per-second to radians-per-second
const DEG: f32 = std::f32::consts::PI / 180.0;

/// Bar weapon balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarTuning {
    /// Deployments available at session start
    pub max_deployments: u32,
    /// Fever charges available at session start
    pub max_fever_charges: u32,
    /// Fever spin speed (radians/sec)
    pub fever_rotation_speed: f32,
    /// Full turns a fever activation lasts
    pub fever_rotations: u32,
    pub min_length: f32,
    pub max_length: f32,
    /// Spin speed numerator; actual speed is this divided by current length
    pub base_rotation_speed: f32,
    /// Shrink rate floor (length units/sec)
    pub shrink_rate: f32,
    /// Extra shrink per unit of deployed length
    pub length_to_shrink_bonus: f32,
    /// Length lost on each direction reversal
    pub reversal_length_penalty: f32,
    pub max_reversals: u32,
    /// Minimum seconds between two reversals
    pub reversal_cooldown: f32,
    /// Pivot mode at session start
    pub pivot_mode: PivotMode,
}

impl Default for BarTuning {
    fn default() -> Self {
        Self {
            max_deployments: 5,
            max_fever_charges: 2,
            fever_rotation_speed: 2000.0 * DEG,
            fever_rotations: 5,
            min_length: 1.0,
            max_length: 10.0,
            base_rotation_speed: 800.0 * DEG,
            shrink_rate: 0.5,
            length_to_shrink_bonus: 0.05,
            reversal_length_penalty: 0.5,
            max_reversals: 10,
            reversal_cooldown: 0.15,
            pivot_mode: PivotMode::EndPoint,
        }
    }
}

/// Bar hit parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub damage: i32,
    pub knockback_force: f32,
    /// Share of straight-up added to the horizontal knockback (0-1)
    pub knockback_upward_ratio: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            damage: 1,
            knockback_force: 10.0,
            knockback_upward_ratio: 0.5,
        }
    }
}

/// One kind of enemy the spawner can pick
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyArchetype {
    pub name: String,
    pub move_speed: f32,
    pub health: i32,
    pub score_value: u32,
}

impl Default for EnemyArchetype {
    fn default() -> Self {
        Self {
            name: "Enemy".to_string(),
            move_speed: 2.0,
            health: 1,
            score_value: 10,
        }
    }
}

/// Enemy behaviour shared by every archetype
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub archetypes: Vec<EnemyArchetype>,
    /// Seconds movement stays suspended after a non-lethal hit
    pub hit_stun: f32,
    /// Seconds a dying enemy stays in the world before removal
    pub despawn_delay: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            archetypes: vec![
                EnemyArchetype::default(),
                EnemyArchetype {
                    name: "Brute".to_string(),
                    move_speed: 1.2,
                    health: 3,
                    score_value: 30,
                },
            ],
            hit_stun: 0.2,
            despawn_delay: 3.0,
        }
    }
}

/// Wave spawner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerTuning {
    pub enemies_to_spawn: u32,
    /// Seconds between two spawns
    pub spawn_interval: f32,
    /// Distance from the target at which enemies appear
    pub spawn_radius: f32,
}

impl Default for SpawnerTuning {
    fn default() -> Self {
        Self {
            enemies_to_spawn: 10,
            spawn_interval: 1.0,
            spawn_radius: 15.0,
        }
    }
}

/// Consumable item settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTuning {
    pub initial_time_stop: u32,
    pub initial_instant_fever: u32,
    pub initial_magnet_field: u32,
    pub initial_bomb: u32,
    pub time_stop_duration: f32,
    pub magnet_duration: f32,
    pub magnet_radius: f32,
    pub magnet_force: f32,
    /// Inside this radius the magnet stops enemies instead of pulling
    pub magnet_safe_radius: f32,
    pub bomb_damage: i32,
    pub bomb_force: f32,
    pub bomb_upward_ratio: f32,
}

impl Default for ItemTuning {
    fn default() -> Self {
        Self {
            initial_time_stop: 3,
            initial_instant_fever: 2,
            initial_magnet_field: 2,
            initial_bomb: 1,
            time_stop_duration: 5.0,
            magnet_duration: 7.0,
            magnet_radius: 10.0,
            magnet_force: 15.0,
            magnet_safe_radius: 1.5,
            bomb_damage: 9999,
            bomb_force: 30.0,
            bomb_upward_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboTuning {
    /// Seconds without a defeat before the combo resets
    pub reset_time: f32,
}

impl Default for ComboTuning {
    fn default() -> Self {
        Self { reset_time: 2.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_health: i32,
    /// Damage taken when an enemy touches the player
    pub contact_damage: i32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: 5,
            contact_damage: 1,
        }
    }
}

/// Session flow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// Wait for the first bar release before starting wave 1
    pub tutorial: bool,
    /// Seconds between a cleared wave and the next (negative = never advance)
    pub breather_secs: f32,
    /// Extra enemies added per wave index
    pub enemies_per_wave_growth: u32,
    /// Music crossfade length when the session starts
    pub music_fade_secs: f32,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            tutorial: false,
            breather_secs: 3.0,
            enemies_per_wave_growth: 2,
            music_fade_secs: 1.0,
        }
    }
}

/// Complete balance sheet for a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub bar: BarTuning,
    pub combat: CombatTuning,
    pub enemies: EnemyTuning,
    pub spawner: SpawnerTuning,
    pub items: ItemTuning,
    pub combo: ComboTuning,
    pub player: PlayerTuning,
    pub session: SessionTuning,
}

/// Problems found while loading or checking a tuning file
#[derive(Debug)]
pub enum TuningError {
    /// File could not be read
    Io(std::io::Error),
    /// JSON was malformed or had wrong types
    Parse(serde_json::Error),
    /// A value is outside its allowed range
    Invalid(String),
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Io(e) => write!(f, "failed to read tuning file: {e}"),
            TuningError::Parse(e) => write!(f, "failed to parse tuning: {e}"),
            TuningError::Invalid(msg) => write!(f, "invalid tuning: {msg}"),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Io(e) => Some(e),
            TuningError::Parse(e) => Some(e),
            TuningError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for TuningError {
    fn from(e: std::io::Error) -> Self {
        TuningError::Io(e)
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}

fn invalid(msg: impl Into<String>) -> TuningError {
    TuningError::Invalid(msg.into())
}

impl Tuning {
    /// Parse and validate tuning from JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file on disk
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Serialize to pretty JSON (for writing a template file)
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges the simulation relies on.
    ///
    /// An empty archetype list is allowed here; the spawner reports it and
    /// disables itself instead.
    pub fn validate(&self) -> Result<(), TuningError> {
        self.check_bar()?;
        self.check_combat()?;
        self.check_spawner()?;
        self.check_items()?;
        self.check_combo()?;
        self.check_player()?;
        self.check_enemies()
    }

    /// Reset every section that fails its checks to the built-in defaults.
    /// Returns the problems found, one per replaced section.
    pub fn repair(&mut self) -> Vec<TuningError> {
        let mut problems = Vec::new();
        if let Err(e) = self.check_bar() {
            // Keep the chosen pivot; it has no invalid values
            let pivot_mode = self.bar.pivot_mode;
            self.bar = BarTuning {
                pivot_mode,
                ..BarTuning::default()
            };
            problems.push(e);
        }
        if let Err(e) = self.check_combat() {
            self.combat = CombatTuning::default();
            problems.push(e);
        }
        if let Err(e) = self.check_spawner() {
            self.spawner = SpawnerTuning::default();
            problems.push(e);
        }
        if let Err(e) = self.check_items() {
            self.items = ItemTuning::default();
            problems.push(e);
        }
        if let Err(e) = self.check_combo() {
            self.combo = ComboTuning::default();
            problems.push(e);
        }
        if let Err(e) = self.check_player() {
            self.player = PlayerTuning::default();
            problems.push(e);
        }
        if let Err(e) = self.check_enemies() {
            self.enemies = EnemyTuning::default();
            problems.push(e);
        }
        problems
    }

    // Comparisons are written so NaN fails them.

    fn check_bar(&self) -> Result<(), TuningError> {
        let bar = &self.bar;
        if !(bar.min_length > 0.0 && bar.max_length >= bar.min_length) {
            return Err(invalid(format!(
                "bar length range [{}, {}] is empty or non-positive",
                bar.min_length, bar.max_length
            )));
        }
        if !(bar.base_rotation_speed > 0.0 && bar.fever_rotation_speed > 0.0) {
            return Err(invalid("rotation speeds must be positive"));
        }
        if !(bar.shrink_rate > 0.0) {
            return Err(invalid("bar shrink_rate must be positive"));
        }
        Ok(())
    }

    fn check_combat(&self) -> Result<(), TuningError> {
        if !(0.0..=1.0).contains(&self.combat.knockback_upward_ratio) {
            return Err(invalid("knockback_upward_ratio must be within 0..=1"));
        }
        Ok(())
    }

    fn check_spawner(&self) -> Result<(), TuningError> {
        if self.spawner.enemies_to_spawn > 0 && !(self.spawner.spawn_interval >= 0.0) {
            return Err(invalid("spawn_interval must not be negative"));
        }
        Ok(())
    }

    fn check_items(&self) -> Result<(), TuningError> {
        let items = &self.items;
        if !(items.time_stop_duration > 0.0 && items.magnet_duration > 0.0) {
            return Err(invalid("item durations must be positive"));
        }
        if !(items.magnet_safe_radius >= 0.0) {
            return Err(invalid(format!(
                "magnet_safe_radius {} must not be negative",
                items.magnet_safe_radius
            )));
        }
        if !(items.magnet_radius > items.magnet_safe_radius) {
            return Err(invalid("magnet_radius must exceed magnet_safe_radius"));
        }
        Ok(())
    }

    fn check_combo(&self) -> Result<(), TuningError> {
        if !(self.combo.reset_time > 0.0) {
            return Err(invalid("combo reset_time must be positive"));
        }
        Ok(())
    }

    fn check_player(&self) -> Result<(), TuningError> {
        if self.player.max_health <= 0 {
            return Err(invalid("player max_health must be positive"));
        }
        Ok(())
    }

    fn check_enemies(&self) -> Result<(), TuningError> {
        for archetype in &self.enemies.archetypes {
            if archetype.health <= 0 {
                return Err(invalid(format!(
                    "archetype '{}' has non-positive health",
                    archetype.name
                )));
            }
        }
        Ok(())
    }
}
