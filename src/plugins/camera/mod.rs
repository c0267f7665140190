//! Camera plugin (render-only).
//!
//! One persistent camera. During play it follows the player with exponential
//! smoothing, clamped to the level span; outside play it parks on the screen
//! center. Disjointness between the player and camera transform queries is
//! encoded with `Without<...>` filters.

use bevy::prelude::*;

use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::player::Player;
use crate::plugins::world::ActiveLevel;

const HALF_VIEW_WIDTH: f32 = 400.0;

#[derive(Component)]
pub struct MainCamera {
    pub responsiveness: f32,
}

pub fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_camera);
    app.add_systems(
        PostUpdate,
        follow_player
            .before(TransformSystems::Propagate)
            .run_if(in_state(GameState::InGame)),
    );
    app.add_systems(OnExit(GameState::InGame), recenter);
}

fn spawn_camera(mut commands: Commands, tunables: Res<Tunables>) {
    commands.spawn((
        Name::new("MainCamera"),
        Camera2d,
        MainCamera {
            responsiveness: 5.0,
        },
        Transform::from_xyz(HALF_VIEW_WIDTH, tunables.world_height * 0.5, 999.0),
    ));
}

fn follow_player(
    time: Res<Time>,
    tunables: Res<Tunables>,
    level: Res<ActiveLevel>,
    q_player: Query<&Transform, (With<Player>, Without<MainCamera>)>,
    mut q_cam: Query<(&mut Transform, &MainCamera), Without<Player>>,
) {
    let Ok(tf_player) = q_player.single() else {
        return;
    };
    let Ok((mut tf_cam, cam)) = q_cam.single_mut() else {
        return;
    };

    let alpha = 1.0 - (-cam.responsiveness * time.delta_secs()).exp();
    let max_x = (level.0.world_width - HALF_VIEW_WIDTH).max(HALF_VIEW_WIDTH);
    let target_x = tf_player.translation.x.clamp(HALF_VIEW_WIDTH, max_x);
    let target_y = tunables.world_height * 0.5;

    tf_cam.translation.x += (target_x - tf_cam.translation.x) * alpha;
    tf_cam.translation.y += (target_y - tf_cam.translation.y) * alpha;
}

fn recenter(tunables: Res<Tunables>, mut q_cam: Query<&mut Transform, With<MainCamera>>) {
    let Ok(mut tf) = q_cam.single_mut() else {
        return;
    };
    tf.translation.x = HALF_VIEW_WIDTH;
    tf.translation.y = tunables.world_height * 0.5;
}
