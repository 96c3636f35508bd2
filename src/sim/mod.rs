//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by enemy ID)
//! - No rendering, audio playback or platform dependencies
//!
//! Collaborators talk through [`GameEvent`]s queued on the state and drained
//! by the host once per tick.

pub mod bar;
pub mod combat;
pub mod combo;
pub mod enemy;
pub mod events;
pub mod items;
pub mod player;
pub mod spawner;
pub mod state;
pub mod tick;

pub use bar::{BarState, BarWeapon, PivotMode};
pub use combat::{Body, CombatMediator, Contact, knockback_direction};
pub use combo::ComboCounter;
pub use enemy::{DamageOutcome, Defeat, Enemies, Enemy, EnemyId, EnemyState, PendingAction};
pub use events::{AnimTrigger, DefeatCause, EffectHandle, EffectKind, Events, GameEvent, Tint};
pub use items::{ItemContext, ItemCoordinator, ItemKind, UseOutcome};
pub use player::Player;
pub use spawner::EnemySpawner;
pub use state::{GamePhase, GameState};
pub use tick::{TickInput, tick};
