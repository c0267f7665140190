#![cfg(test)]

use super::*;
use crate::common::test_utils::run_system_once;
use crate::plugins::world::{LevelDescriptor, Platform, Spawn};
use bevy::ecs::message::MessageWriter;

fn base_world() -> World {
    let mut world = World::new();
    world.insert_resource(Progression::default());
    world.init_resource::<Messages<ItemCollected>>();
    world
}

fn spawn_item(world: &mut World, category: ItemCategory) -> Entity {
    world
        .spawn((
            Collectible::new(category, 100.0),
            ItemState::Active,
            Transform::from_xyz(100.0, 100.0, 1.0),
        ))
        .id()
}

fn run_collect(world: &mut World, item: Entity) -> bool {
    run_system_once(
        world,
        move |mut progression: ResMut<Progression>,
              mut q_items: Query<(&Collectible, &mut ItemState)>,
              mut collected: MessageWriter<ItemCollected>| {
            let Ok((collectible, mut state)) = q_items.get_mut(item) else {
                return false;
            };
            collect_item(
                &mut progression,
                collectible.category,
                &mut state,
                &mut collected,
            )
        },
    )
}

fn drain_collected(world: &mut World) -> Vec<ItemCollected> {
    world
        .resource_mut::<Messages<ItemCollected>>()
        .drain()
        .collect()
}

#[test]
fn collect_applies_exactly_once_no_matter_how_often_called() {
    let mut world = base_world();
    let item = spawn_item(&mut world, ItemCategory::Bone);

    for _ in 0..4 {
        run_collect(&mut world, item);
    }

    assert_eq!(
        world.resource::<Progression>().score,
        Progression::SMALL_ITEM_SCORE
    );
    assert_eq!(drain_collected(&mut world).len(), 1);
    assert_eq!(
        *world.get::<ItemState>(item).unwrap(),
        ItemState::Collecting
    );
}

#[test]
fn bone_scores_and_breaks_the_streak() {
    let mut world = base_world();
    world.resource_mut::<Progression>().streak = 2;
    let item = spawn_item(&mut world, ItemCategory::Bone);

    let buffed = run_collect(&mut world, item);

    assert!(!buffed);
    let p = world.resource::<Progression>();
    assert_eq!(p.score, 10);
    assert_eq!(p.streak, 0);

    let collected = drain_collected(&mut world);
    assert_eq!(collected[0].category, ItemCategory::Bone);
    assert_eq!(collected[0].points, 10);
}

#[test]
fn tennis_ball_scores_and_advances_the_streak() {
    let mut world = base_world();
    let item = spawn_item(&mut world, ItemCategory::TennisBall);

    let buffed = run_collect(&mut world, item);

    assert!(!buffed);
    let p = world.resource::<Progression>();
    assert_eq!(p.score, 25);
    assert_eq!(p.streak, 1);
}

#[test]
fn third_tennis_ball_reports_buff_activation() {
    let mut world = base_world();
    world.resource_mut::<Progression>().streak = 2;
    let item = spawn_item(&mut world, ItemCategory::TennisBall);

    let buffed = run_collect(&mut world, item);

    assert!(buffed);
    let p = world.resource::<Progression>();
    assert!(p.buff_active);
    assert_eq!(p.streak, 0);
    assert_eq!(p.score, 25 + Progression::STREAK_BONUS);
}

#[test]
fn treat_heals_to_full_scores_nothing_and_breaks_the_streak() {
    let mut world = base_world();
    {
        let mut p = world.resource_mut::<Progression>();
        p.health = 1;
        p.streak = 2;
    }
    let item = spawn_item(&mut world, ItemCategory::Treat);

    run_collect(&mut world, item);

    let p = world.resource::<Progression>();
    assert_eq!(p.health, p.max_health);
    assert_eq!(p.score, 0);
    assert_eq!(p.streak, 0);

    let collected = drain_collected(&mut world);
    assert_eq!(collected[0].points, 0);
}

#[test]
fn spawn_from_level_places_every_category() {
    let mut world = base_world();
    world.insert_resource(ActiveLevel(LevelDescriptor {
        name: "Test Strip".into(),
        world_width: 1000.0,
        time_goal: 60.0,
        slippery: false,
        player_start: Spawn { x: 50.0, y: 100.0 },
        platforms: vec![Platform {
            x: 0.0,
            y: 32.0,
            width: 1000.0,
        }],
        bones: vec![Spawn { x: 100.0, y: 80.0 }, Spawn { x: 200.0, y: 80.0 }],
        tennis_balls: vec![Spawn { x: 300.0, y: 80.0 }],
        treats: vec![Spawn { x: 400.0, y: 80.0 }],
        enemies: vec![],
        lost_dogs: vec![],
    }));

    run_system_once(&mut world, spawn_from_level);

    let mut by_category = (0, 0, 0);
    for (item, state) in world.query::<(&Collectible, &ItemState)>().iter(&world) {
        assert_eq!(*state, ItemState::Active);
        match item.category {
            ItemCategory::Bone => by_category.0 += 1,
            ItemCategory::TennisBall => by_category.1 += 1,
            ItemCategory::Treat => by_category.2 += 1,
        }
    }
    assert_eq!(by_category, (2, 1, 1));
}
