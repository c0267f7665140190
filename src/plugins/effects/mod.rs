//! Timed effect scheduler.
//!
//! Every entity timer in the simulation (cooldown, invulnerability, stun,
//! buff, delayed removal) goes through `schedule`, which spawns a
//! `PendingEffect` entity and returns its id as the cancellation handle.
//! A fixed-tick system drains finished timers into `EffectFired` messages,
//! exactly once each, and the plugin owning the target's components consumes
//! them.
//!
//! Liveness rules:
//! - a pending effect whose target entity no longer exists is reaped without
//!   firing (despawning an entity cancels its outstanding timers);
//! - consumers look the target up through a query, so a fired effect whose
//!   target died in the same tick is a no-op (generational `Entity` ids never
//!   resolve to a recycled slot).

use bevy::ecs::message::{MessageReader, MessageWriter, Messages};
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::state::GameState;

/// Closed set of delayed actions.
///
/// A data enum instead of boxed closures: the consumer re-resolves the target
/// at fire time, so nothing here can dangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    ClearInvulnerability,
    EndSpeedBuff,
    EndAttackWindow,
    ClearAttackCooldown,
    EndStun,
    DefeatIfStillStunned,
    Remove,
}

#[derive(Component, Debug)]
pub struct PendingEffect {
    pub target: Entity,
    pub effect: Effect,
    pub timer: Timer,
}

/// Handle for a scheduled effect; pass to [`cancel`] to revoke it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectHandle(pub Entity);

#[derive(Message, Clone, Copy, Debug)]
pub struct EffectFired {
    pub target: Entity,
    pub effect: Effect,
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Messages<EffectFired>>();
    app.add_systems(PostUpdate, update_messages);

    app.add_systems(
        FixedUpdate,
        (tick_pending_effects, apply_removals.after(tick_pending_effects))
            .run_if(in_state(GameState::InGame)),
    );
}

/// Schedule `effect` to fire at `target` after `delay_secs`.
pub fn schedule(
    commands: &mut Commands,
    target: Entity,
    effect: Effect,
    delay_secs: f32,
) -> EffectHandle {
    let e = commands
        .spawn((
            PendingEffect {
                target,
                effect,
                timer: Timer::from_seconds(delay_secs, TimerMode::Once),
            },
            DespawnOnExit(GameState::InGame),
        ))
        .id();
    EffectHandle(e)
}

/// Revoke a not-yet-fired effect. Revoking an already-fired handle is a no-op.
pub fn cancel(commands: &mut Commands, handle: EffectHandle) {
    commands.entity(handle.0).try_despawn();
}

/// Advance pending timers; fire finished ones exactly once.
///
/// Runs before every effect consumer in the fixed tick so a fired effect is
/// visible the same tick it elapses.
pub fn tick_pending_effects(
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    live: Query<()>,
    mut pending: Query<(Entity, &mut PendingEffect)>,
    mut fired: MessageWriter<EffectFired>,
) {
    for (e, mut p) in &mut pending {
        if !live.contains(p.target) {
            // Target destroyed: cancel instead of firing.
            commands.entity(e).despawn();
            continue;
        }

        p.timer.tick(time.delta());
        if p.timer.is_finished() {
            fired.write(EffectFired {
                target: p.target,
                effect: p.effect,
            });
            commands.entity(e).despawn();
        }
    }
}

/// The scheduler consumes `Effect::Remove` itself: despawn the target.
pub fn apply_removals(
    mut commands: Commands,
    live: Query<()>,
    mut fired: MessageReader<EffectFired>,
) {
    for msg in fired.read() {
        if msg.effect == Effect::Remove && live.contains(msg.target) {
            commands.entity(msg.target).despawn();
        }
    }
}

/// Messages are double-buffered; `update()` advances buffers.
fn update_messages(mut msgs: ResMut<Messages<EffectFired>>) {
    msgs.update();
}

#[cfg(test)]
mod tests;
