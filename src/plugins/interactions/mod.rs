//! Interaction resolver.
//!
//! Runs once per fixed tick, after the player and enemy movement systems, and
//! tests player-vs-entity overlap per category with plain circle tests. Every
//! test applies a guard predicate (Active / Patrolling / Revealed / alive)
//! before invoking a transition; the transitions flip their own state flag
//! synchronously, so a second query in the same tick is a no-op even if a
//! guard were to slip.
//!
//! Extents live in `Tunables` and are sized well above the per-tick
//! displacement at top speed; overlap tests cannot tunnel.

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

use avian2d::prelude::LinearVelocity;

use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::collectibles::{self, Collectible, ItemCollected, ItemState};
use crate::plugins::effects::{self, Effect};
use crate::plugins::enemies::{self, Enemy, EnemyState, EnemyStunned};
use crate::plugins::player::{
    self, AttackPerformed, BuffActivated, Player, PlayerDamaged, PlayerDied,
};
use crate::plugins::progression::Progression;
use crate::plugins::rescue::{self, RescueState, RescueTarget, TargetRescued, TargetRevealed};

pub fn plugin(app: &mut App) {
    app.add_systems(
        FixedUpdate,
        (
            resolve_pickups,
            resolve_attack_hits,
            resolve_enemy_contacts,
            reveal_nearby_targets,
            resolve_rescues,
        )
            .chain()
            .after(player::perform_attacks)
            .after(enemies::patrol)
            .run_if(in_state(GameState::InGame)),
    );
}

/// Player-vs-item overlap: collect and request destruction.
pub fn resolve_pickups(
    tunables: Res<Tunables>,
    mut commands: Commands,
    mut progression: ResMut<Progression>,
    mut q_player: Query<(Entity, &Transform, &mut Player)>,
    mut q_items: Query<(Entity, &Transform, &Collectible, &mut ItemState), Without<Player>>,
    mut collected: MessageWriter<ItemCollected>,
    mut buff_activated: MessageWriter<BuffActivated>,
) {
    let Ok((player_e, player_tf, mut player)) = q_player.single_mut() else {
        return;
    };
    if !player.alive {
        return;
    }
    let player_pos = player_tf.translation.truncate();

    for (item_e, item_tf, item, mut state) in &mut q_items {
        if *state != ItemState::Active {
            continue;
        }
        if player_pos.distance(item_tf.translation.truncate()) > tunables.pickup_radius {
            continue;
        }

        let buff_started =
            collectibles::collect_item(&mut progression, item.category, &mut state, &mut collected);
        commands.entity(item_e).despawn();

        if buff_started && !player.buffed {
            player.buffed = true;
            effects::schedule(
                &mut commands,
                player_e,
                Effect::EndSpeedBuff,
                tunables.buff_secs,
            );
            buff_activated.write(BuffActivated);
        }
    }
}

/// Bark hit regions against every live enemy.
///
/// A hit stuns a patrolling enemy; any hit on a currently stunned enemy also
/// schedules the delayed defeat attempt. Repeated hits cannot double-award:
/// defeat is terminal and the grace consumer re-checks the state.
pub fn resolve_attack_hits(
    tunables: Res<Tunables>,
    mut commands: Commands,
    mut attacks: MessageReader<AttackPerformed>,
    mut q_enemies: Query<(Entity, &Transform, &mut Enemy, &mut EnemyState)>,
    mut stunned: MessageWriter<EnemyStunned>,
) {
    for attack in attacks.read() {
        for (entity, tf, mut enemy, mut state) in &mut q_enemies {
            if *state == EnemyState::Defeated {
                continue;
            }
            if tf.translation.truncate().distance(attack.origin) >= attack.radius {
                continue;
            }

            enemies::stun_enemy(
                &mut commands,
                &tunables,
                entity,
                &mut enemy,
                &mut state,
                &mut stunned,
            );

            if *state == EnemyState::Stunned {
                effects::schedule(
                    &mut commands,
                    entity,
                    Effect::DefeatIfStillStunned,
                    tunables.defeat_grace_secs,
                );
            }
        }
    }
}

/// Touching a patrolling enemy hurts. Stunned and defeated enemies are safe.
pub fn resolve_enemy_contacts(
    tunables: Res<Tunables>,
    mut commands: Commands,
    mut progression: ResMut<Progression>,
    mut q_player: Query<(Entity, &Transform, &mut Player, &mut LinearVelocity)>,
    q_enemies: Query<(&Transform, &EnemyState), (With<Enemy>, Without<Player>)>,
    mut damaged: MessageWriter<PlayerDamaged>,
    mut died: MessageWriter<PlayerDied>,
) {
    let Ok((player_e, player_tf, mut player, mut vel)) = q_player.single_mut() else {
        return;
    };
    if !player.alive || player.invulnerable {
        return;
    }
    let player_pos = player_tf.translation.truncate();

    for (enemy_tf, state) in &q_enemies {
        if *state != EnemyState::Patrolling {
            continue;
        }
        if player_pos.distance(enemy_tf.translation.truncate()) > tunables.contact_radius {
            continue;
        }

        player::damage_player(
            &mut commands,
            &tunables,
            &mut progression,
            player_e,
            &mut player,
            &mut vel,
            &mut damaged,
            &mut died,
        );
        // One hit per tick; invulnerability gates the rest of the window.
        break;
    }
}

/// Hidden dogs reveal when the player sniffs close enough. Idempotent.
pub fn reveal_nearby_targets(
    tunables: Res<Tunables>,
    q_player: Query<&Transform, With<Player>>,
    mut q_targets: Query<(Entity, &Transform, &mut RescueState), (With<RescueTarget>, Without<Player>)>,
    mut revealed: MessageWriter<TargetRevealed>,
) {
    let Ok(player_tf) = q_player.single() else {
        return;
    };
    let player_pos = player_tf.translation.truncate();

    for (entity, tf, mut state) in &mut q_targets {
        if *state != RescueState::Hidden {
            continue;
        }
        if player_pos.distance(tf.translation.truncate()) < tunables.reveal_radius {
            rescue::reveal_target(entity, &mut state, &mut revealed);
        }
    }
}

/// Touching a revealed dog rescues it.
pub fn resolve_rescues(
    tunables: Res<Tunables>,
    mut commands: Commands,
    mut progression: ResMut<Progression>,
    q_player: Query<(&Transform, &Player)>,
    mut q_targets: Query<(Entity, &Transform, &mut RescueState), (With<RescueTarget>, Without<Player>)>,
    mut rescued: MessageWriter<TargetRescued>,
) {
    let Ok((player_tf, player)) = q_player.single() else {
        return;
    };
    if !player.alive {
        return;
    }
    let player_pos = player_tf.translation.truncate();

    for (entity, tf, mut state) in &mut q_targets {
        if *state != RescueState::Revealed {
            continue;
        }
        if player_pos.distance(tf.translation.truncate()) > tunables.rescue_radius {
            continue;
        }

        rescue::rescue_target(
            &mut commands,
            &tunables,
            &mut progression,
            entity,
            &mut state,
            &mut rescued,
        );
    }
}
