//! Sprite HUD and state backdrops (render-only, asset-free).
//!
//! Solid-color pips parented to the camera: hearts for health, pips for the
//! pickup streak, one pip per dog in the level. Score and timer readouts are
//! left to the outbound messages; the HUD stays text-free.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::camera::MainCamera;
use crate::plugins::progression::Progression;
use crate::plugins::world::ActiveLevel;

const HUD_Z: f32 = -500.0;

#[derive(Component)]
struct HeartPip(u32);

#[derive(Component)]
struct StreakPip(u32);

#[derive(Component)]
struct RescuePip(u32);

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_hud);
    app.add_systems(Update, refresh_hud.run_if(in_state(GameState::InGame)));

    app.add_systems(OnEnter(GameState::MainMenu), spawn_menu_backdrop);
    app.add_systems(OnEnter(GameState::GameOver), spawn_game_over_backdrop);
}

fn spawn_hud(
    mut commands: Commands,
    progression: Res<Progression>,
    level: Res<ActiveLevel>,
    q_cam: Query<Entity, With<MainCamera>>,
) {
    let Ok(cam) = q_cam.single() else {
        return;
    };

    let dogs = level.0.total_dogs();
    commands.entity(cam).with_children(|parent| {
        for i in 0..progression.max_health {
            parent.spawn((
                HeartPip(i),
                Sprite::from_color(Color::srgb(0.85, 0.15, 0.15), Vec2::splat(14.0)),
                Transform::from_xyz(-370.0 + i as f32 * 20.0, 272.0, HUD_Z),
                DespawnOnExit(GameState::InGame),
            ));
        }
        for i in 0..Progression::STREAK_TARGET {
            parent.spawn((
                StreakPip(i),
                Sprite::from_color(Color::srgb(0.25, 0.25, 0.25), Vec2::splat(10.0)),
                Transform::from_xyz(-370.0 + i as f32 * 16.0, 250.0, HUD_Z),
                DespawnOnExit(GameState::InGame),
            ));
        }
        for i in 0..dogs {
            parent.spawn((
                RescuePip(i),
                Sprite::from_color(Color::srgba(0.72, 0.52, 0.32, 0.4), Vec2::splat(12.0)),
                Transform::from_xyz(330.0 + i as f32 * 18.0, 272.0, HUD_Z),
                DespawnOnExit(GameState::InGame),
            ));
        }
    });
}

fn refresh_hud(
    progression: Res<Progression>,
    mut q_hearts: Query<(&HeartPip, &mut Sprite), (Without<StreakPip>, Without<RescuePip>)>,
    mut q_streak: Query<(&StreakPip, &mut Sprite), (Without<HeartPip>, Without<RescuePip>)>,
    mut q_rescue: Query<(&RescuePip, &mut Sprite), (Without<HeartPip>, Without<StreakPip>)>,
) {
    if !progression.is_changed() {
        return;
    }

    for (pip, mut sprite) in &mut q_hearts {
        sprite.color = if pip.0 < progression.health {
            Color::srgb(0.85, 0.15, 0.15)
        } else {
            Color::srgb(0.30, 0.30, 0.30)
        };
    }

    for (pip, mut sprite) in &mut q_streak {
        sprite.color = if progression.buff_active {
            Color::srgb(0.20, 0.90, 0.30)
        } else if pip.0 < progression.streak {
            Color::srgb(0.95, 0.90, 0.20)
        } else {
            Color::srgb(0.25, 0.25, 0.25)
        };
    }

    for (pip, mut sprite) in &mut q_rescue {
        sprite.color = if pip.0 < progression.dogs_rescued {
            Color::srgb(0.98, 0.78, 0.22)
        } else {
            Color::srgba(0.72, 0.52, 0.32, 0.4)
        };
    }
}

fn spawn_menu_backdrop(mut commands: Commands, tunables: Res<Tunables>) {
    commands.spawn((
        Name::new("MenuBackdrop"),
        Sprite::from_color(
            Color::srgb(0.16, 0.34, 0.22),
            Vec2::new(800.0, tunables.world_height),
        ),
        Transform::from_xyz(400.0, tunables.world_height * 0.5, 0.0),
        DespawnOnExit(GameState::MainMenu),
    ));
}

fn spawn_game_over_backdrop(mut commands: Commands, tunables: Res<Tunables>) {
    commands.spawn((
        Name::new("GameOverBackdrop"),
        Sprite::from_color(
            Color::srgb(0.18, 0.16, 0.22),
            Vec2::new(800.0, tunables.world_height),
        ),
        Transform::from_xyz(400.0, tunables.world_height * 0.5, 0.0),
        DespawnOnExit(GameState::GameOver),
    ));
}
