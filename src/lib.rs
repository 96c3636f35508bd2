//! Bar Sweep - a rotating-bar arcade brawler
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bar weapon, enemies, items, waves, combo)
//! - `tuning`: Data-driven game balance
//! - `input`: Pointer samples to bar input signals
//! - `physics`: Reference contact provider for headless hosts
//! - `audio`: Sound categories and audio sinks

pub mod audio;
pub mod input;
pub mod physics;
pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Collision radius of an enemy body
    pub const ENEMY_RADIUS: f32 = 0.5;
    /// Collision radius of the player body
    pub const PLAYER_RADIUS: f32 = 0.75;

    /// Downward acceleration applied to airborne (knocked back) enemies
    pub const GRAVITY: f32 = 9.81;
    /// Torque share of a knockback impulse (spin = force * factor)
    pub const KNOCKBACK_SPIN_FACTOR: f32 = 0.1;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Project a vector onto the ground plane (drop the up component)
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Unit direction on the ground plane for a yaw angle
#[inline]
pub fn yaw_to_dir(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), 0.0, yaw.sin())
}

/// Yaw angle of a ground-plane vector
#[inline]
pub fn dir_to_yaw(v: Vec3) -> f32 {
    v.z.atan2(v.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-5);
        assert!((normalize_angle(-3.5 * PI) - 0.5 * PI).abs() < 1e-5);
        assert!(normalize_angle(PI) < PI);
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_yaw_roundtrip() {
        let yaw = 0.7;
        assert!((dir_to_yaw(yaw_to_dir(yaw)) - yaw).abs() < 1e-6);
        assert_eq!(horizontal(Vec3::new(1.0, 5.0, 2.0)), Vec3::new(1.0, 0.0, 2.0));
    }
}
