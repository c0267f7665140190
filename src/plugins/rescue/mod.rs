//! Lost dogs hidden around the level.
//!
//! Hidden -> Revealed fires at most once, when the player first sniffs close
//! enough. Revealed -> Rescued is terminal; the entity lingers briefly for
//! presentation before the scheduler removes it.

use bevy::ecs::message::{MessageWriter, Messages};
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::effects::{self, Effect};
use crate::plugins::progression::Progression;
use crate::plugins::world::ActiveLevel;

#[derive(Component, Debug)]
pub struct RescueTarget;

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RescueState {
    Hidden,
    Revealed,
    Rescued,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct TargetRevealed {
    pub entity: Entity,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct TargetRescued {
    pub entity: Entity,
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Messages<TargetRevealed>>();
    app.init_resource::<Messages<TargetRescued>>();
    app.add_systems(PostUpdate, update_messages);

    app.add_systems(OnEnter(GameState::InGame), spawn_from_level);
    app.add_systems(Update, shade_by_state.run_if(in_state(GameState::InGame)));
}

pub fn spawn_from_level(mut commands: Commands, level: Res<ActiveLevel>) {
    for (i, spawn) in level.0.lost_dogs.iter().enumerate() {
        commands.spawn((
            Name::new(format!("LostDog{i}")),
            RescueTarget,
            RescueState::Hidden,
            Sprite {
                color: Color::srgba(0.72, 0.52, 0.32, 0.3),
                custom_size: Some(Vec2::splat(30.0)),
                ..default()
            },
            Transform::from_xyz(spawn.x, spawn.y, 1.0),
            DespawnOnExit(GameState::InGame),
        ));
    }
}

/// Reveal a hidden target. Re-entering proximity later is a no-op.
pub fn reveal_target(
    entity: Entity,
    state: &mut RescueState,
    revealed: &mut MessageWriter<TargetRevealed>,
) {
    if *state != RescueState::Hidden {
        return;
    }
    *state = RescueState::Revealed;
    revealed.write(TargetRevealed { entity });
}

/// Rescue a revealed target. Terminal; the ledger credits exactly once.
pub fn rescue_target(
    commands: &mut Commands,
    tunables: &Tunables,
    progression: &mut Progression,
    entity: Entity,
    state: &mut RescueState,
    rescued: &mut MessageWriter<TargetRescued>,
) {
    if *state != RescueState::Revealed {
        return;
    }
    *state = RescueState::Rescued;
    progression.rescue_dog();
    rescued.write(TargetRescued { entity });
    effects::schedule(commands, entity, Effect::Remove, tunables.rescue_linger_secs);
}

fn shade_by_state(mut q_targets: Query<(&RescueState, &mut Sprite), Changed<RescueState>>) {
    for (state, mut sprite) in &mut q_targets {
        sprite.color = match state {
            RescueState::Hidden => Color::srgba(0.72, 0.52, 0.32, 0.3),
            RescueState::Revealed => Color::srgba(0.72, 0.52, 0.32, 1.0),
            RescueState::Rescued => Color::srgba(0.55, 0.85, 0.45, 1.0),
        };
    }
}

/// Messages are double-buffered; `update()` advances buffers.
fn update_messages(
    mut revealed: ResMut<Messages<TargetRevealed>>,
    mut rescued: ResMut<Messages<TargetRescued>>,
) {
    revealed.update();
    rescued.update();
}
