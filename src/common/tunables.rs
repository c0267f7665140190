//! Tunable gameplay constants.
//!
//! Interaction extents are sized so that at the top (buffed) speed and the
//! fixed tick rate an entity moves a few pixels per tick at most, well inside
//! every radius. Overlap tests cannot tunnel.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    pub gravity: f32,

    // Player locomotion.
    pub base_speed: f32,
    pub buff_speed: f32,
    pub jump_speed: f32,
    pub knockback: Vec2,
    pub death_pop: f32,
    /// Fixed ticks of no horizontal input before the sit pose.
    pub sit_after_ticks: u32,
    /// Per-second horizontal decay factor on slippery ground.
    pub slippery_decay: f32,

    // Attack (bark).
    pub attack_radius: f32,
    pub attack_reach: f32,
    pub attack_window_secs: f32,
    pub attack_cooldown_secs: f32,

    // Timed windows.
    pub invulnerability_secs: f32,
    pub buff_secs: f32,
    pub stun_secs: f32,
    /// Wait after a bark hit before the automatic defeat attempt.
    pub defeat_grace_secs: f32,
    pub defeat_linger_secs: f32,
    pub rescue_linger_secs: f32,
    pub death_restart_secs: f32,

    // Interaction extents.
    pub pickup_radius: f32,
    pub contact_radius: f32,
    pub rescue_radius: f32,
    pub reveal_radius: f32,

    // Level geometry.
    pub level_end_margin: f32,
    pub world_height: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            gravity: 800.0,

            base_speed: 160.0,
            buff_speed: 300.0,
            jump_speed: 380.0,
            knockback: Vec2::new(200.0, 200.0),
            death_pop: 300.0,
            sit_after_ticks: 180,
            slippery_decay: 4.0,

            attack_radius: 60.0,
            attack_reach: 30.0,
            attack_window_secs: 0.2,
            attack_cooldown_secs: 0.5,

            invulnerability_secs: 2.0,
            buff_secs: 5.0,
            stun_secs: 2.0,
            defeat_grace_secs: 0.5,
            defeat_linger_secs: 1.0,
            rescue_linger_secs: 1.5,
            death_restart_secs: 1.0,

            pickup_radius: 30.0,
            contact_radius: 34.0,
            rescue_radius: 32.0,
            reveal_radius: 150.0,

            level_end_margin: 200.0,
            world_height: 600.0,
        }
    }
}
