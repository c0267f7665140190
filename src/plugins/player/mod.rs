//! Player plugin.
//!
//! Pipeline:
//! - Update: sample the keyboard into the normalized `ActionState` resource
//! - FixedUpdate: consume timed effects, then movement/jump, then the bark
//!   attack, then pose derivation
//! - FixedPostUpdate: ground-contact tracking from physics messages, world
//!   span clamping
//!
//! Gameplay truth lives in the `Player` flags (`alive`, `invulnerable`,
//! `buffed`, `attack_cooldown`); `PlayerPose` is derived presentation state.
//! Health itself is ledger-owned.

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::ecs::message::{MessageReader, MessageWriter, Messages};
use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::effects::{self, Effect, EffectFired};
use crate::plugins::progression::Progression;
use crate::plugins::world::ActiveLevel;

pub const PLAYER_HALF_WIDTH: f32 = 14.0;
pub const PLAYER_HALF_HEIGHT: f32 = 16.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

#[derive(Component, Debug)]
pub struct Player {
    pub facing: Facing,
    pub alive: bool,
    pub invulnerable: bool,
    pub buffed: bool,
    pub attack_cooldown: bool,
    pub attacking: bool,
    /// Fixed ticks without horizontal input. Drives the sit pose only.
    pub idle_ticks: u32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            facing: Facing::Right,
            alive: true,
            invulnerable: false,
            buffed: false,
            attack_cooldown: false,
            attacking: false,
            idle_ticks: 0,
        }
    }
}

/// Current platform contacts, maintained from collision start/end messages.
#[derive(Component, Debug, Default)]
pub struct Grounded {
    contacts: HashSet<Entity>,
}

impl Grounded {
    #[inline]
    pub fn is_grounded(&self) -> bool {
        !self.contacts.is_empty()
    }
}

/// Presentation-facing state, derived every fixed tick.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerPose {
    Idle,
    Sitting,
    Moving,
    Airborne,
    Attacking,
}

/// Normalized per-tick action set. The attack press is latched until a fixed
/// tick consumes it so a press between ticks is never lost.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct ActionState {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub attack: bool,
}

// -----------------------------------------------------------------------------
// Outbound messages
// -----------------------------------------------------------------------------

/// World-space bark hit region, consumed by the interaction resolver.
#[derive(Message, Clone, Copy, Debug)]
pub struct AttackPerformed {
    pub origin: Vec2,
    pub radius: f32,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct PlayerDamaged {
    pub remaining_health: u32,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct PlayerDied;

#[derive(Message, Clone, Copy, Debug)]
pub struct BuffActivated;

#[derive(Message, Clone, Copy, Debug)]
pub struct BuffExpired;

pub fn plugin(app: &mut App) {
    app.insert_resource(ActionState::default());

    app.init_resource::<Messages<AttackPerformed>>();
    app.init_resource::<Messages<PlayerDamaged>>();
    app.init_resource::<Messages<PlayerDied>>();
    app.init_resource::<Messages<BuffActivated>>();
    app.init_resource::<Messages<BuffExpired>>();
    app.add_systems(PostUpdate, update_messages);

    app.add_systems(OnEnter(GameState::InGame), spawn);
    app.add_systems(Update, sample_input.run_if(in_state(GameState::InGame)));

    app.add_systems(
        FixedUpdate,
        (apply_timed_effects, apply_movement, perform_attacks, derive_pose)
            .chain()
            .after(effects::tick_pending_effects)
            .run_if(in_state(GameState::InGame)),
    );

    app.add_systems(
        FixedPostUpdate,
        (
            track_ground_contacts.after(CollisionEventSystems),
            clamp_to_world,
        )
            .run_if(in_state(GameState::InGame)),
    );
}

pub fn spawn(mut commands: Commands, level: Res<ActiveLevel>) {
    let start = level.0.player_start;

    commands.spawn((
        Name::new("Player"),
        Player::default(),
        Grounded::default(),
        PlayerPose::Idle,
        Sprite {
            color: Color::srgb(0.93, 0.78, 0.36),
            custom_size: Some(Vec2::new(
                PLAYER_HALF_WIDTH * 2.0,
                PLAYER_HALF_HEIGHT * 2.0,
            )),
            ..default()
        },
        Transform::from_xyz(start.x, start.y, 1.0),
        RigidBody::Dynamic,
        Collider::rectangle(PLAYER_HALF_WIDTH * 2.0, PLAYER_HALF_HEIGHT * 2.0),
        CollisionLayers::new(Layer::Player, [Layer::World]),
        LockedAxes::ROTATION_LOCKED,
        Friction::ZERO,
        LinearVelocity::ZERO,
        CollisionEventsEnabled,
        DespawnOnExit(GameState::InGame),
    ));
}

pub fn sample_input(keys: Option<Res<ButtonInput<KeyCode>>>, mut actions: ResMut<ActionState>) {
    let Some(keys) = keys else {
        return;
    };

    actions.left = keys.pressed(KeyCode::ArrowLeft) || keys.pressed(KeyCode::KeyA);
    actions.right = keys.pressed(KeyCode::ArrowRight) || keys.pressed(KeyCode::KeyD);
    actions.jump = keys.pressed(KeyCode::ArrowUp)
        || keys.pressed(KeyCode::KeyW)
        || keys.pressed(KeyCode::Space);
    actions.attack |= keys.just_pressed(KeyCode::KeyX);
}

/// Horizontal drive, jump, and the idle counter.
pub fn apply_movement(
    tunables: Res<Tunables>,
    actions: Res<ActionState>,
    level: Res<ActiveLevel>,
    time: Res<Time<Fixed>>,
    mut q_player: Query<(&mut Player, &mut LinearVelocity, &Grounded)>,
) {
    let Ok((mut player, mut vel, grounded)) = q_player.single_mut() else {
        return;
    };
    if !player.alive {
        return;
    }

    let speed = if player.buffed {
        tunables.buff_speed
    } else {
        tunables.base_speed
    };

    if actions.left != actions.right {
        if actions.left {
            vel.0.x = -speed;
            player.facing = Facing::Left;
        } else {
            vel.0.x = speed;
            player.facing = Facing::Right;
        }
        player.idle_ticks = 0;
    } else {
        if level.0.slippery {
            // Wet ground: glide to a stop instead of snapping.
            let decay = (tunables.slippery_decay * time.delta_secs()).min(1.0);
            vel.0.x -= vel.0.x * decay;
        } else {
            vel.0.x = 0.0;
        }
        player.idle_ticks = player.idle_ticks.saturating_add(1);
    }

    if actions.jump && grounded.is_grounded() {
        vel.0.y = tunables.jump_speed;
    }
}

/// Bark. Ignored while on cooldown; the press is consumed either way.
pub fn perform_attacks(
    tunables: Res<Tunables>,
    mut actions: ResMut<ActionState>,
    mut commands: Commands,
    mut q_player: Query<(Entity, &mut Player, &Transform)>,
    mut attacks: MessageWriter<AttackPerformed>,
) {
    if !actions.attack {
        return;
    }
    actions.attack = false;

    let Ok((entity, mut player, tf)) = q_player.single_mut() else {
        return;
    };
    if !player.alive || player.attack_cooldown {
        return;
    }

    player.attacking = true;
    player.attack_cooldown = true;

    let origin =
        tf.translation.truncate() + Vec2::X * player.facing.sign() * tunables.attack_reach;
    attacks.write(AttackPerformed {
        origin,
        radius: tunables.attack_radius,
    });

    effects::schedule(
        &mut commands,
        entity,
        Effect::EndAttackWindow,
        tunables.attack_window_secs,
    );
    effects::schedule(
        &mut commands,
        entity,
        Effect::ClearAttackCooldown,
        tunables.attack_cooldown_secs,
    );
}

/// Apply one hit to the player.
///
/// No-op while invulnerable or dead. Death is terminal: the died message is
/// emitted in place of knockback and invulnerability.
pub fn damage_player(
    commands: &mut Commands,
    tunables: &Tunables,
    progression: &mut Progression,
    entity: Entity,
    player: &mut Player,
    vel: &mut LinearVelocity,
    damaged: &mut MessageWriter<PlayerDamaged>,
    died: &mut MessageWriter<PlayerDied>,
) {
    if !player.alive || player.invulnerable {
        return;
    }

    if progression.take_damage() {
        vel.0 = Vec2::new(
            -player.facing.sign() * tunables.knockback.x,
            tunables.knockback.y,
        );
        player.invulnerable = true;
        effects::schedule(
            commands,
            entity,
            Effect::ClearInvulnerability,
            tunables.invulnerability_secs,
        );
        damaged.write(PlayerDamaged {
            remaining_health: progression.health,
        });
    } else {
        player.alive = false;
        vel.0 = Vec2::new(0.0, tunables.death_pop);
        died.write(PlayerDied);
    }
}

/// Consume scheduler firings that target the player.
pub fn apply_timed_effects(
    mut fired: MessageReader<EffectFired>,
    mut progression: ResMut<Progression>,
    mut q_player: Query<&mut Player>,
    mut expired: MessageWriter<BuffExpired>,
) {
    for msg in fired.read() {
        // Stale target: the player this timer was armed for is gone.
        let Ok(mut player) = q_player.get_mut(msg.target) else {
            continue;
        };

        match msg.effect {
            Effect::ClearInvulnerability => player.invulnerable = false,
            Effect::EndAttackWindow => player.attacking = false,
            Effect::ClearAttackCooldown => player.attack_cooldown = false,
            Effect::EndSpeedBuff => {
                if player.buffed {
                    player.buffed = false;
                    progression.end_buff();
                    expired.write(BuffExpired);
                }
            }
            _ => {}
        }
    }
}

pub fn derive_pose(
    tunables: Res<Tunables>,
    mut q_player: Query<(&Player, &LinearVelocity, &Grounded, &mut PlayerPose)>,
) {
    let Ok((player, vel, grounded, mut pose)) = q_player.single_mut() else {
        return;
    };

    *pose = if player.attacking {
        PlayerPose::Attacking
    } else if !grounded.is_grounded() {
        PlayerPose::Airborne
    } else if vel.0.x.abs() > 1.0 {
        PlayerPose::Moving
    } else if player.idle_ticks > tunables.sit_after_ticks {
        PlayerPose::Sitting
    } else {
        PlayerPose::Idle
    };
}

/// Maintain the platform contact set from physics messages.
pub fn track_ground_contacts(
    mut started: MessageReader<CollisionStart>,
    mut ended: MessageReader<CollisionEnd>,
    q_layers: Query<&CollisionLayers>,
    mut q_player: Query<(Entity, &mut Grounded), With<Player>>,
) {
    let Ok((player_e, mut grounded)) = q_player.single_mut() else {
        return;
    };

    for ev in started.read() {
        if let Some(other) = other_collider(ev.collider1, ev.collider2, player_e) {
            if in_world_layer(&q_layers, other) {
                grounded.contacts.insert(other);
            }
        }
    }
    for ev in ended.read() {
        if let Some(other) = other_collider(ev.collider1, ev.collider2, player_e) {
            grounded.contacts.remove(&other);
        }
    }
}

#[inline]
fn other_collider(a: Entity, b: Entity, player: Entity) -> Option<Entity> {
    if a == player {
        Some(b)
    } else if b == player {
        Some(a)
    } else {
        None
    }
}

#[inline]
fn in_world_layer(q_layers: &Query<&CollisionLayers>, e: Entity) -> bool {
    q_layers
        .get(e)
        .is_ok_and(|layers| layers.memberships.has_all(Layer::World))
}

/// Keep the player inside the level span, as if the world had walls.
pub fn clamp_to_world(
    level: Res<ActiveLevel>,
    mut q_player: Query<(&mut Transform, &mut LinearVelocity), With<Player>>,
) {
    let Ok((mut tf, mut vel)) = q_player.single_mut() else {
        return;
    };

    let max_x = level.0.world_width - PLAYER_HALF_WIDTH;
    if tf.translation.x < PLAYER_HALF_WIDTH {
        tf.translation.x = PLAYER_HALF_WIDTH;
        vel.0.x = vel.0.x.max(0.0);
    } else if tf.translation.x > max_x {
        tf.translation.x = max_x;
        vel.0.x = vel.0.x.min(0.0);
    }
}

/// Messages are double-buffered; `update()` advances buffers.
fn update_messages(
    mut attacks: ResMut<Messages<AttackPerformed>>,
    mut damaged: ResMut<Messages<PlayerDamaged>>,
    mut died: ResMut<Messages<PlayerDied>>,
    mut activated: ResMut<Messages<BuffActivated>>,
    mut expired: ResMut<Messages<BuffExpired>>,
) {
    attacks.update();
    damaged.update();
    died.update();
    activated.update();
    expired.update();
}
