//! Per-tick simulation driver
//!
//! Core game loop that advances a session by one step.

use glam::Vec3;

use super::combat::{Body, Contact};
use super::events::{DefeatCause, GameEvent};
use super::items::{ItemContext, ItemKind};
use super::state::{GamePhase, GameState};

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer pressed on the ground at this world position
    pub drag_start: Option<Vec3>,
    /// Current drag offset from the press point (world units)
    pub drag_update: Option<Vec3>,
    /// Pointer released after a drag
    pub drag_end: bool,
    /// Discrete press (reverses the spinning bar)
    pub tap: bool,
    /// UI overlay owns the pointer; pointer signals are ignored
    pub pointer_over_ui: bool,
    /// Item button pressed
    pub use_item: Option<ItemKind>,
    /// Pivot-mode button pressed
    pub toggle_pivot: bool,
    /// Contact-begin events reported by the physics host since the last tick
    pub contacts: Vec<Contact>,
    /// Pause toggle
    pub pause: bool,
}

impl TickInput {
    /// Reset everything except the held drag offset and UI focus
    pub fn clear_one_shots(&mut self) {
        self.drag_start = None;
        self.drag_end = false;
        self.tap = false;
        self.use_item = None;
        self.toggle_pivot = false;
        self.contacts.clear();
        self.pause = false;
    }
}

/// Advance the session by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Paused => {
                state.phase = state.resume_phase;
                return;
            }
            GamePhase::GameOver => {}
            phase => {
                state.resume_phase = phase;
                state.phase = GamePhase::Paused;
                return;
            }
        }
    }

    // Don't tick if paused or game over
    match state.phase {
        GamePhase::Paused | GamePhase::GameOver => return,
        _ => {}
    }

    state.time_ticks += 1;

    // Contacts were detected against last tick's state, so they see the
    // combat flag before any input below changes it
    for contact in &input.contacts {
        dispatch_contact(state, contact);
    }

    if let Some(kind) = input.use_item {
        state.items.use_item(
            kind,
            ItemContext {
                enemies: &mut state.enemies,
                bar: &mut state.bar,
                target: Some(state.player.pos),
                events: &mut state.events,
            },
        );
    }

    if input.toggle_pivot {
        state.bar.toggle_pivot_mode(&mut state.events);
    }

    if !input.pointer_over_ui {
        apply_pointer(state, input);
    }

    state.bar.advance(dt, &mut state.events);

    // Steering first so magnet forces stack on top of this tick's walk
    state.enemies.steer(dt, &mut state.events);
    let target = Some(state.player.pos);
    state
        .items
        .advance(dt, target, &mut state.enemies, &mut state.events);

    // Spawn after item expiry so nothing created post-expiry gets frozen
    let spawned = state
        .spawner
        .advance(dt, &mut state.rng, &mut state.enemies, &mut state.events);
    for id in spawned {
        state
            .items
            .on_enemy_spawned(id, &mut state.enemies, &mut state.events);
    }

    state.enemies.integrate(dt);

    state.combo.advance(dt, &mut state.events);
    route_defeats(state);

    update_phase(state, dt);
}

fn dispatch_contact(state: &mut GameState, contact: &Contact) {
    if let Some(body) = contact.other_than(Body::BarHitbox) {
        state
            .bar
            .process_hit(body, &mut state.enemies, &mut state.events);
        return;
    }

    if let Some(Body::Enemy(id)) = contact.other_than(Body::Player) {
        if state.enemies.collision_death(id) {
            log::debug!("enemy {:?} hit the player", id);
            let damage = state.tuning.player.contact_damage;
            state.player.take_damage(damage, &mut state.events);
        }
    }
}

fn apply_pointer(state: &mut GameState, input: &TickInput) {
    // A press is both a tap and a drag start; the bar's state decides which matters
    if input.tap {
        state.bar.tap(&mut state.events);
    }
    if input.drag_start.is_some() {
        state.bar.drag_start(&mut state.events);
    }
    if let Some(vector) = input.drag_update {
        state.bar.drag_update(vector);
    }
    if input.drag_end
        && state.bar.drag_end(&mut state.events).is_some()
        && state.phase == GamePhase::Tutorial
    {
        state.finish_tutorial();
    }
}

fn route_defeats(state: &mut GameState) {
    for defeat in state.enemies.take_defeats() {
        state.events.push(GameEvent::EnemyDefeated {
            id: defeat.id,
            cause: defeat.cause,
        });

        if defeat.cause == DefeatCause::Combat {
            state.score += u64::from(defeat.score_value);
            state.events.push(GameEvent::ScoreChanged(state.score));
        }

        state.combo.register_defeat(&mut state.events);
        state.spawner.on_enemy_defeated(defeat.id, &mut state.events);
    }
}

fn update_phase(state: &mut GameState, dt: f32) {
    if state.player.is_dead() {
        log::info!("Game over: score {}, wave {}", state.score, state.spawner.wave());
        state.phase = GamePhase::GameOver;
        return;
    }

    match state.phase {
        GamePhase::Playing => {
            let breather = state.tuning.session.breather_secs;
            if state.spawner.is_cleared() && breather >= 0.0 {
                state.breather_timer = breather;
                state.phase = GamePhase::Breather;
            }
        }
        GamePhase::Breather => {
            state.breather_timer -= dt;
            if state.breather_timer <= 0.0 {
                state.breather_timer = 0.0;
                state.start_next_wave();
            }
        }
        _ => {}
    }
}
