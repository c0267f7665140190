//! Enemies plugin: patrolling park critters.
//!
//! Lifecycle: Patrolling -> (bark hit) Stunned -> back to Patrolling when the
//! stun elapses, unless a defeat lands first. Defeated is terminal and
//! guards every transition, so the ledger's defeat counter can only move once
//! per enemy.
//!
//! Patrol is a deterministic triangle wave around the spawn anchor, not
//! pathfinding; enemies own their transforms and never touch the physics
//! world.

use bevy::ecs::message::{MessageReader, MessageWriter, Messages};
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use serde::Deserialize;

use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::effects::{self, Effect, EffectFired, EffectHandle};
use crate::plugins::progression::Progression;
use crate::plugins::world::ActiveLevel;

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyKind {
    Squirrel,
    Raccoon,
}

impl EnemyKind {
    #[inline]
    pub fn patrol_speed(self) -> f32 {
        match self {
            EnemyKind::Squirrel => 60.0,
            EnemyKind::Raccoon => 90.0,
        }
    }

    #[inline]
    pub fn patrol_half_width(self) -> f32 {
        match self {
            EnemyKind::Squirrel => 150.0,
            EnemyKind::Raccoon => 200.0,
        }
    }

    fn body_size(self) -> Vec2 {
        match self {
            EnemyKind::Squirrel => Vec2::splat(24.0),
            EnemyKind::Raccoon => Vec2::splat(32.0),
        }
    }

    fn color(self) -> Color {
        match self {
            EnemyKind::Squirrel => Color::srgb(0.62, 0.42, 0.26),
            EnemyKind::Raccoon => Color::srgb(0.42, 0.42, 0.48),
        }
    }
}

#[derive(Component, Debug)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub anchor_x: f32,
    pub half_width: f32,
    /// Patrol direction sign, +1 or -1.
    pub dir: f32,
    /// Outstanding stun-recovery timer, cancelled on defeat.
    pub pending_end_stun: Option<EffectHandle>,
}

impl Enemy {
    pub fn new(kind: EnemyKind, anchor_x: f32) -> Self {
        Self {
            kind,
            anchor_x,
            half_width: kind.patrol_half_width(),
            dir: 1.0,
            pending_end_stun: None,
        }
    }
}

/// Lifecycle state machine. Defeated is terminal.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyState {
    Patrolling,
    Stunned,
    Defeated,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct EnemyStunned {
    pub entity: Entity,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct EnemyDefeated {
    pub entity: Entity,
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Messages<EnemyStunned>>();
    app.init_resource::<Messages<EnemyDefeated>>();
    app.add_systems(PostUpdate, update_messages);

    app.add_systems(OnEnter(GameState::InGame), spawn_from_level);

    app.add_systems(
        FixedUpdate,
        (apply_timed_effects, patrol, defeat_spin)
            .chain()
            .after(effects::tick_pending_effects)
            .run_if(in_state(GameState::InGame)),
    );

    app.add_systems(Update, tint_by_state.run_if(in_state(GameState::InGame)));
}

pub fn spawn_from_level(mut commands: Commands, level: Res<ActiveLevel>) {
    for (i, spawn) in level.0.enemies.iter().enumerate() {
        commands.spawn((
            Name::new(format!("Enemy{i}")),
            Enemy::new(spawn.kind, spawn.x),
            EnemyState::Patrolling,
            Sprite {
                color: spawn.kind.color(),
                custom_size: Some(spawn.kind.body_size()),
                ..default()
            },
            Transform::from_xyz(spawn.x, spawn.y, 1.0),
            DespawnOnExit(GameState::InGame),
        ));
    }
}

/// Triangle-wave patrol: flip when displacement past the anchor exceeds the
/// half-width, measured along the current direction so the flip cannot
/// oscillate.
pub fn patrol(
    time: Res<Time<Fixed>>,
    mut q_enemies: Query<(&mut Enemy, &EnemyState, &mut Transform, &mut Sprite)>,
) {
    let dt = time.delta_secs();

    for (mut enemy, state, mut tf, mut sprite) in &mut q_enemies {
        if *state != EnemyState::Patrolling {
            continue;
        }

        if (tf.translation.x - enemy.anchor_x) * enemy.dir > enemy.half_width {
            enemy.dir = -enemy.dir;
        }
        tf.translation.x += enemy.kind.patrol_speed() * enemy.dir * dt;
        sprite.flip_x = enemy.dir < 0.0;
    }
}

/// Stun a patrolling enemy. No-op in any other state.
pub fn stun_enemy(
    commands: &mut Commands,
    tunables: &Tunables,
    entity: Entity,
    enemy: &mut Enemy,
    state: &mut EnemyState,
    stunned: &mut MessageWriter<EnemyStunned>,
) {
    if *state != EnemyState::Patrolling {
        return;
    }

    *state = EnemyState::Stunned;
    enemy.pending_end_stun = Some(effects::schedule(
        commands,
        entity,
        Effect::EndStun,
        tunables.stun_secs,
    ));
    stunned.write(EnemyStunned { entity });
}

/// Defeat an enemy. Terminal: the ledger increments exactly once and the
/// entity's outstanding stun timer is cancelled before the linger removal.
pub fn defeat_enemy(
    commands: &mut Commands,
    tunables: &Tunables,
    progression: &mut Progression,
    entity: Entity,
    enemy: &mut Enemy,
    state: &mut EnemyState,
    defeated: &mut MessageWriter<EnemyDefeated>,
) {
    if *state == EnemyState::Defeated {
        return;
    }

    *state = EnemyState::Defeated;
    if let Some(handle) = enemy.pending_end_stun.take() {
        effects::cancel(commands, handle);
    }
    progression.defeat_enemy();
    defeated.write(EnemyDefeated { entity });
    effects::schedule(commands, entity, Effect::Remove, tunables.defeat_linger_secs);
}

/// Consume scheduler firings that target an enemy.
pub fn apply_timed_effects(
    mut commands: Commands,
    tunables: Res<Tunables>,
    mut progression: ResMut<Progression>,
    mut fired: MessageReader<EffectFired>,
    mut q_enemies: Query<(&mut Enemy, &mut EnemyState)>,
    mut defeated: MessageWriter<EnemyDefeated>,
) {
    for msg in fired.read() {
        let Ok((mut enemy, mut state)) = q_enemies.get_mut(msg.target) else {
            continue;
        };

        match msg.effect {
            Effect::EndStun => {
                if *state == EnemyState::Stunned {
                    *state = EnemyState::Patrolling;
                    enemy.pending_end_stun = None;
                }
            }
            Effect::DefeatIfStillStunned => {
                if *state == EnemyState::Stunned {
                    defeat_enemy(
                        &mut commands,
                        &tunables,
                        &mut progression,
                        msg.target,
                        &mut enemy,
                        &mut state,
                        &mut defeated,
                    );
                }
            }
            _ => {}
        }
    }
}

/// Defeated critters tumble up and away until the linger removal lands.
pub fn defeat_spin(
    time: Res<Time<Fixed>>,
    mut q_enemies: Query<(&EnemyState, &mut Transform), With<Enemy>>,
) {
    let dt = time.delta_secs();
    for (state, mut tf) in &mut q_enemies {
        if *state == EnemyState::Defeated {
            tf.translation.y += 200.0 * dt;
            tf.rotate_z(7.0 * dt);
        }
    }
}

fn tint_by_state(mut q_enemies: Query<(&Enemy, &EnemyState, &mut Sprite), Changed<EnemyState>>) {
    for (enemy, state, mut sprite) in &mut q_enemies {
        sprite.color = match state {
            EnemyState::Patrolling => enemy.kind.color(),
            EnemyState::Stunned => Color::srgb(0.67, 0.67, 0.67),
            EnemyState::Defeated => Color::srgb(0.53, 0.53, 0.53),
        };
    }
}

/// Messages are double-buffered; `update()` advances buffers.
fn update_messages(
    mut stunned: ResMut<Messages<EnemyStunned>>,
    mut defeated: ResMut<Messages<EnemyDefeated>>,
) {
    stunned.update();
    defeated.update();
}
