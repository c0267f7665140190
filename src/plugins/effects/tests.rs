#![cfg(test)]

use super::*;
use crate::common::test_utils::{fixed_time_with_delta, run_system_once};
use bevy::ecs::message::Messages;

fn world_with_messages() -> World {
    let mut world = World::new();
    world.init_resource::<Messages<EffectFired>>();
    world
}

fn drain_fired(world: &mut World) -> Vec<EffectFired> {
    world
        .resource_mut::<Messages<EffectFired>>()
        .drain()
        .collect()
}

fn schedule_in(world: &mut World, target: Entity, effect: Effect, delay: f32) -> EffectHandle {
    run_system_once(world, move |mut commands: Commands| {
        schedule(&mut commands, target, effect, delay)
    })
}

#[test]
fn fires_exactly_once_after_delay() {
    let mut world = world_with_messages();
    let target = world.spawn_empty().id();
    schedule_in(&mut world, target, Effect::EndStun, 1.0);

    // Not yet elapsed.
    world.insert_resource(fixed_time_with_delta(0.5));
    run_system_once(&mut world, tick_pending_effects);
    assert!(drain_fired(&mut world).is_empty());

    // Crosses the deadline.
    world.insert_resource(fixed_time_with_delta(0.6));
    run_system_once(&mut world, tick_pending_effects);
    let fired = drain_fired(&mut world);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].target, target);
    assert_eq!(fired[0].effect, Effect::EndStun);

    // The pending entity is consumed; further ticks fire nothing.
    assert_eq!(world.query::<&PendingEffect>().iter(&world).count(), 0);
    world.insert_resource(fixed_time_with_delta(5.0));
    run_system_once(&mut world, tick_pending_effects);
    assert!(drain_fired(&mut world).is_empty());
}

#[test]
fn cancel_prevents_firing() {
    let mut world = world_with_messages();
    let target = world.spawn_empty().id();
    let handle = schedule_in(&mut world, target, Effect::ClearAttackCooldown, 0.2);

    run_system_once(&mut world, move |mut commands: Commands| {
        cancel(&mut commands, handle);
    });

    world.insert_resource(fixed_time_with_delta(1.0));
    run_system_once(&mut world, tick_pending_effects);
    assert!(drain_fired(&mut world).is_empty());
}

#[test]
fn destroyed_target_is_reaped_without_firing() {
    let mut world = world_with_messages();
    let target = world.spawn_empty().id();
    schedule_in(&mut world, target, Effect::EndSpeedBuff, 0.1);

    world.despawn(target);

    world.insert_resource(fixed_time_with_delta(1.0));
    run_system_once(&mut world, tick_pending_effects);
    assert!(drain_fired(&mut world).is_empty());
    assert_eq!(world.query::<&PendingEffect>().iter(&world).count(), 0);
}

#[test]
fn remove_effect_despawns_its_target() {
    let mut world = world_with_messages();
    let target = world.spawn_empty().id();
    schedule_in(&mut world, target, Effect::Remove, 0.1);

    world.insert_resource(fixed_time_with_delta(0.2));
    run_system_once(&mut world, tick_pending_effects);
    run_system_once(&mut world, apply_removals);

    assert!(world.get_entity(target).is_err());
}

#[test]
fn independent_timers_fire_independently() {
    let mut world = world_with_messages();
    let a = world.spawn_empty().id();
    let b = world.spawn_empty().id();
    schedule_in(&mut world, a, Effect::EndStun, 0.3);
    schedule_in(&mut world, b, Effect::DefeatIfStillStunned, 0.9);

    world.insert_resource(fixed_time_with_delta(0.5));
    run_system_once(&mut world, tick_pending_effects);
    let fired = drain_fired(&mut world);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].target, a);

    world.insert_resource(fixed_time_with_delta(0.5));
    run_system_once(&mut world, tick_pending_effects);
    let fired = drain_fired(&mut world);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].target, b);
}
