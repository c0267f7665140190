//! Feature plugins.

use bevy::prelude::*;

pub mod collectibles;
pub mod core;
pub mod effects;
pub mod enemies;
pub mod interactions;
pub mod physics;
pub mod player;
pub mod progression;
pub mod rescue;
pub mod session;
pub mod world;

// Render-only
pub mod camera;
pub mod ui;

/// Register gameplay plugins that work in headless tests.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    physics::plugin(app);
    effects::plugin(app);
    progression::plugin(app);
    world::plugin(app);
    player::plugin(app);
    enemies::plugin(app);
    collectibles::plugin(app);
    rescue::plugin(app);
    interactions::plugin(app);
    session::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    camera::plugin(app);
    ui::plugin(app);
}

/// Register all plugins (full app).
pub fn register_all(app: &mut App) {
    register_gameplay(app);
    register_render(app);
}
