//! Outbound notifications
//!
//! The simulation never calls into presentation. Everything a UI, renderer or
//! audio layer needs is pushed onto the session's event queue and drained by
//! the host once per frame.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::bar::{BarState, PivotMode};
use super::enemy::EnemyId;
use super::items::ItemKind;
use crate::audio::{MusicTrack, SoundEffect};

/// Animation triggers understood by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimTrigger {
    Hit,
    Die,
}

/// Tint an enemy should be drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tint {
    #[default]
    Normal,
    Damaged,
    Frozen,
}

/// Transient visual effect kinds spawned by items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    TimeStop,
    MagnetField,
    Explosion,
}

/// Opaque handle for a spawned visual effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectHandle(pub u32);

/// How an enemy was defeated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefeatCause {
    /// Bar hit or bomb
    Combat,
    /// Walked into the player
    Collision,
}

/// A single notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BarStateChanged(BarState),
    PivotModeChanged(PivotMode),
    DeploymentsChanged(u32),
    FeverChargesChanged(u32),
    ItemCountChanged { kind: ItemKind, count: u32 },
    WaveStarted { wave: u32, total: u32 },
    EnemySpawned(EnemyId),
    EnemyDefeated { id: EnemyId, cause: DefeatCause },
    EnemyCountChanged { defeated: u32, total: u32 },
    WaveCleared { wave: u32 },
    ComboChanged(u32),
    ScoreChanged(u64),
    PlayerHealthChanged(i32),
    PlayerDied,
    Animation { id: EnemyId, trigger: AnimTrigger },
    EnemyTint { id: EnemyId, tint: Tint },
    Sfx(SoundEffect),
    Music { track: MusicTrack, fade_secs: f32 },
    EffectSpawned { handle: EffectHandle, kind: EffectKind, pos: Vec3, radius: f32 },
    EffectDespawned(EffectHandle),
}

/// Per-session notification queue
pub type Events = Vec<GameEvent>;
