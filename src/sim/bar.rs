//! The player's rotating bar weapon
//!
//! Lifecycle: `Idle -> Aiming -> Rotating -> Idle`, repeated while deployments
//! last, plus `Idle -> Fever -> Idle` for each fever charge.
//!
//! While rotating the bar shrinks linearly and spins at `base / length`, so a
//! short bar spins fast. Taps reverse the spin for a length penalty.

use std::f32::consts::TAU;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::combat::{Body, CombatMediator};
use super::enemy::{DamageOutcome, Enemies};
use super::events::{Events, GameEvent};
use crate::audio::SoundEffect;
use crate::tuning::{BarTuning, CombatTuning};
use crate::{dir_to_yaw, horizontal, normalize_angle, yaw_to_dir};

/// Bar weapon lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarState {
    /// Waiting for a drag
    Idle,
    /// Following the drag vector; no combat
    Aiming,
    /// Deployed: shrinking and spinning
    Rotating,
    /// Full-length power spin
    Fever,
}

impl BarState {
    /// Combat is enabled exactly while spinning
    pub fn is_combat(self) -> bool {
        matches!(self, BarState::Rotating | BarState::Fever)
    }
}

/// Where the bar sits relative to its pivot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PivotMode {
    /// Pivot at one end; the bar reaches `length` out from the origin
    #[default]
    EndPoint,
    /// Pivot at the middle; half the bar on each side of the origin
    Center,
}

impl PivotMode {
    pub fn toggled(self) -> Self {
        match self {
            PivotMode::EndPoint => PivotMode::Center,
            PivotMode::Center => PivotMode::EndPoint,
        }
    }
}

/// The bar weapon, pivoting around `origin`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarWeapon {
    tuning: BarTuning,
    state: BarState,
    origin: Vec3,
    yaw: f32,
    length: f32,
    /// Unclamped length of the current drag
    aim_length: f32,
    direction: f32,
    reversals_remaining: u32,
    deployments_remaining: u32,
    fever_charges: u32,
    shrink_rate: f32,
    /// Seconds spent in the current spinning state
    state_elapsed: f32,
    since_reversal: f32,
    fever_rotation: f32,
    pivot_mode: PivotMode,
    tutorial_override: bool,
    combat: CombatMediator,
}

impl BarWeapon {
    pub fn new(tuning: &BarTuning, combat: &CombatTuning, origin: Vec3) -> Self {
        Self {
            tuning: tuning.clone(),
            state: BarState::Idle,
            origin,
            yaw: 0.0,
            length: tuning.min_length,
            aim_length: 0.0,
            direction: 1.0,
            reversals_remaining: 0,
            deployments_remaining: tuning.max_deployments,
            fever_charges: tuning.max_fever_charges,
            shrink_rate: tuning.shrink_rate,
            state_elapsed: 0.0,
            since_reversal: 0.0,
            fever_rotation: 0.0,
            pivot_mode: tuning.pivot_mode,
            tutorial_override: false,
            combat: CombatMediator::new(combat),
        }
    }

    /// Push the starting counters so observers can draw them
    pub fn announce(&self, events: &mut Events) {
        events.push(GameEvent::DeploymentsChanged(self.deployments_remaining));
        events.push(GameEvent::FeverChargesChanged(self.fever_charges));
    }

    pub fn state(&self) -> BarState {
        self.state
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    /// +1 or -1
    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn reversals_remaining(&self) -> u32 {
        self.reversals_remaining
    }

    pub fn deployments_remaining(&self) -> u32 {
        self.deployments_remaining
    }

    pub fn fever_charges(&self) -> u32 {
        self.fever_charges
    }

    pub fn shrink_rate(&self) -> f32 {
        self.shrink_rate
    }

    pub fn state_elapsed(&self) -> f32 {
        self.state_elapsed
    }

    pub fn combat(&self) -> &CombatMediator {
        &self.combat
    }

    /// Nothing left to deploy and no fever to burn
    pub fn is_exhausted(&self) -> bool {
        self.deployments_remaining == 0 && self.fever_charges == 0
    }

    pub fn pivot_mode(&self) -> PivotMode {
        self.pivot_mode
    }

    /// Switch between end and centre pivot. Allowed in any state; the hitbox
    /// follows on the next query.
    pub fn toggle_pivot_mode(&mut self, events: &mut Events) -> PivotMode {
        self.pivot_mode = self.pivot_mode.toggled();
        log::debug!("bar pivot -> {:?}", self.pivot_mode);
        events.push(GameEvent::PivotModeChanged(self.pivot_mode));
        self.pivot_mode
    }

    /// Let a drag start with no deployments left
    pub fn set_tutorial_override(&mut self, enabled: bool) {
        self.tutorial_override = enabled;
    }

    pub fn tutorial_override(&self) -> bool {
        self.tutorial_override
    }

    /// Hitbox segment, or `None` while the bar is hidden
    pub fn hitbox(&self) -> Option<(Vec3, Vec3)> {
        if self.state == BarState::Idle {
            return None;
        }
        let reach = yaw_to_dir(self.yaw) * self.length;
        match self.pivot_mode {
            PivotMode::EndPoint => Some((self.origin, self.origin + reach)),
            PivotMode::Center => Some((self.origin - reach * 0.5, self.origin + reach * 0.5)),
        }
    }

    fn set_state(&mut self, state: BarState, events: &mut Events) {
        if self.state == state {
            return;
        }
        log::debug!("bar {:?} -> {:?}", self.state, state);
        self.state = state;
        self.state_elapsed = 0.0;
        self.combat.set_active(state.is_combat());
        events.push(GameEvent::BarStateChanged(state));
    }

    /// Drag began. Returns true if the bar entered `Aiming`.
    pub fn drag_start(&mut self, events: &mut Events) -> bool {
        if self.state != BarState::Idle {
            return false;
        }
        if self.deployments_remaining == 0 && !self.tutorial_override {
            return false;
        }
        self.aim_length = 0.0;
        self.length = self.tuning.min_length;
        self.set_state(BarState::Aiming, events);
        true
    }

    /// Drag moved; `vector` is the drag offset on the ground plane
    pub fn drag_update(&mut self, vector: Vec3) {
        if self.state != BarState::Aiming {
            return;
        }
        let flat = horizontal(vector);
        self.aim_length = flat.length();
        self.length = self
            .aim_length
            .clamp(self.tuning.min_length, self.tuning.max_length);
        if flat != Vec3::ZERO {
            self.yaw = dir_to_yaw(flat);
        }
    }

    /// Drag released. Returns the deployed length, or `None` if the drag was
    /// too short (or the bar was not aiming).
    pub fn drag_end(&mut self, events: &mut Events) -> Option<f32> {
        if self.state != BarState::Aiming {
            return None;
        }

        if self.aim_length < self.tuning.min_length {
            self.set_state(BarState::Idle, events);
            return None;
        }

        self.deployments_remaining = self.deployments_remaining.saturating_sub(1);
        events.push(GameEvent::DeploymentsChanged(self.deployments_remaining));

        self.direction = 1.0;
        self.shrink_rate =
            self.tuning.shrink_rate + self.length * self.tuning.length_to_shrink_bonus;
        self.reversals_remaining = self.tuning.max_reversals;
        self.since_reversal = self.tuning.reversal_cooldown;
        events.push(GameEvent::Sfx(SoundEffect::BarStretch));
        self.set_state(BarState::Rotating, events);
        Some(self.length)
    }

    /// Discrete tap. Reverses the spin while rotating. Returns true on a reversal.
    pub fn tap(&mut self, events: &mut Events) -> bool {
        if self.state != BarState::Rotating
            || self.reversals_remaining == 0
            || self.since_reversal < self.tuning.reversal_cooldown
        {
            return false;
        }
        self.direction = -self.direction;
        self.reversals_remaining -= 1;
        self.length -= self.tuning.reversal_length_penalty;
        self.since_reversal = 0.0;
        events.push(GameEvent::Sfx(SoundEffect::RotationChange));
        true
    }

    /// Start a fever spin. Only from `Idle` with a charge left.
    pub fn activate_fever(&mut self, events: &mut Events) -> bool {
        if self.state != BarState::Idle || self.fever_charges == 0 {
            return false;
        }
        self.fever_charges -= 1;
        events.push(GameEvent::FeverChargesChanged(self.fever_charges));
        self.fever_rotation = 0.0;
        self.length = self.tuning.max_length;
        self.set_state(BarState::Fever, events);
        true
    }

    /// Advance shrink and spin by `dt` seconds
    pub fn advance(&mut self, dt: f32, events: &mut Events) {
        match self.state {
            BarState::Idle | BarState::Aiming => {}
            BarState::Rotating => {
                self.state_elapsed += dt;
                self.since_reversal += dt;
                self.length -= self.shrink_rate * dt;
                if self.length <= self.tuning.min_length {
                    self.set_state(BarState::Idle, events);
                    return;
                }
                let speed = self.tuning.base_rotation_speed / self.length * self.direction;
                self.yaw = normalize_angle(self.yaw + speed * dt);
            }
            BarState::Fever => {
                self.state_elapsed += dt;
                let step = self.tuning.fever_rotation_speed * dt;
                self.yaw = normalize_angle(self.yaw + step);
                self.fever_rotation += step.abs();
                if self.fever_rotation >= self.tuning.fever_rotations as f32 * TAU {
                    self.set_state(BarState::Idle, events);
                }
            }
        }
    }

    /// Forward a bar contact to the combat mediator
    pub fn process_hit(
        &self,
        body: Body,
        enemies: &mut Enemies,
        events: &mut Events,
    ) -> DamageOutcome {
        self.combat.process_hit(self.origin, body, enemies, events)
    }
}
