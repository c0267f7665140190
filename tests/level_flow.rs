//! End-to-end fixed-tick runs of the simulation layer, driven headless at
//! the World level so the clock is fully deterministic.

use bevy::ecs::message::Messages;
use bevy::prelude::*;

use rescue_run::common::state::GameState;
use rescue_run::plugins::effects;
use rescue_run::plugins::enemies::{self, EnemyKind, EnemyState};
use rescue_run::plugins::interactions;
use rescue_run::plugins::player::{self, ActionState, Player, PlayerDied};
use rescue_run::plugins::progression::Progression;
use rescue_run::plugins::session::{self, LevelCompleted};
use rescue_run::plugins::world::{ActiveLevel, EnemySpawn, LevelDescriptor, Platform, Spawn};

mod common;

const TICK: f32 = 1.0 / 64.0;

fn test_level(enemies: Vec<EnemySpawn>, lost_dogs: Vec<Spawn>) -> ActiveLevel {
    ActiveLevel(LevelDescriptor {
        name: "Proving Ground".into(),
        world_width: 1000.0,
        time_goal: 60.0,
        slippery: false,
        player_start: Spawn { x: 50.0, y: 100.0 },
        platforms: vec![Platform {
            x: 0.0,
            y: 32.0,
            width: 1000.0,
        }],
        bones: vec![],
        tennis_balls: vec![],
        treats: vec![],
        enemies,
        lost_dogs,
    })
}

/// One simulation tick in schedule order, with an explicit delta.
fn sim_tick(world: &mut World, dt: f32) {
    world.insert_resource(common::fixed_time_with_delta(dt));

    common::run_system_once(world, effects::tick_pending_effects);
    common::run_system_once(world, player::apply_timed_effects);
    common::run_system_once(world, enemies::apply_timed_effects);
    common::run_system_once(world, effects::apply_removals);

    common::run_system_once(world, player::apply_movement);
    common::run_system_once(world, player::perform_attacks);
    common::run_system_once(world, enemies::patrol);

    common::run_system_once(world, interactions::resolve_pickups);
    common::run_system_once(world, interactions::resolve_attack_hits);
    common::run_system_once(world, interactions::resolve_enemy_contacts);
    common::run_system_once(world, interactions::reveal_nearby_targets);
    common::run_system_once(world, interactions::resolve_rescues);

    common::run_system_once(world, session::tick_level_clock);
    common::run_system_once(world, session::handle_player_death);
    common::run_system_once(world, session::tick_game_over_countdown);
    common::run_system_once(world, session::check_completion);
}

fn teleport_player(world: &mut World, x: f32, y: f32) {
    let mut q = world.query_filtered::<&mut Transform, With<Player>>();
    let mut tf = q.single_mut(world).expect("player");
    tf.translation.x = x;
    tf.translation.y = y;
}

fn player_alive(world: &mut World) -> bool {
    let mut q = world.query::<&Player>();
    q.single(world).expect("player").alive
}

#[test]
fn rescuing_everything_quickly_and_cleanly_earns_all_bonuses() {
    let mut app = common::app_headless();
    let world = app.world_mut();

    world.insert_resource(test_level(
        vec![],
        vec![
            Spawn { x: 300.0, y: 100.0 },
            Spawn { x: 500.0, y: 100.0 },
        ],
    ));
    common::run_system_once(world, player::spawn);
    common::run_system_once(world, rescue_run::plugins::rescue::spawn_from_level);
    common::run_system_once(world, session::begin_level);
    assert_eq!(world.resource::<Progression>().total_dogs, 2);

    // Walk up to each dog: proximity reveals it, overlap rescues it.
    teleport_player(world, 300.0, 100.0);
    sim_tick(world, TICK);
    assert_eq!(world.resource::<Progression>().dogs_rescued, 1);

    teleport_player(world, 500.0, 100.0);
    sim_tick(world, TICK);
    assert_eq!(world.resource::<Progression>().dogs_rescued, 2);

    // Cross the finish margin well under the time goal, untouched.
    teleport_player(world, 850.0, 100.0);
    sim_tick(world, TICK);

    let completed: Vec<LevelCompleted> = world
        .resource_mut::<Messages<LevelCompleted>>()
        .drain()
        .collect();
    assert_eq!(completed.len(), 1);
    let bonuses = completed[0].bonuses;
    assert!(bonuses.perfect_rescue);
    assert!(bonuses.speed_bonus);
    assert!(bonuses.clean_pass);
    assert_eq!(bonuses.total, 950);

    // Two rescues plus the full bonus sweep.
    assert_eq!(world.resource::<Progression>().score, 2 * 150 + 950);
    assert_eq!(world.resource::<Progression>().level, 2);
    assert!(matches!(
        *world.resource::<NextState<GameState>>(),
        NextState::Pending(GameState::Loading)
    ));
}

#[test]
fn three_spaced_hits_kill_the_player_and_hand_off_to_game_over() {
    let mut app = common::app_headless();
    let world = app.world_mut();

    world.insert_resource(test_level(
        vec![EnemySpawn {
            kind: EnemyKind::Squirrel,
            x: 300.0,
            y: 100.0,
        }],
        vec![],
    ));
    common::run_system_once(world, player::spawn);
    common::run_system_once(world, enemies::spawn_from_level);
    common::run_system_once(world, session::begin_level);

    teleport_player(world, 300.0, 100.0);
    assert_eq!(world.resource::<Progression>().health, 3);

    // Keep the enemy on top of the player; each invulnerability window must
    // fully elapse before the next hit lands.
    let mut healths = vec![];
    for _ in 0..500 {
        {
            let player_x = {
                let mut q = world.query_filtered::<&Transform, With<Player>>();
                q.single(world).expect("player").translation.x
            };
            let mut q = world.query_filtered::<&mut Transform, With<enemies::Enemy>>();
            if let Ok(mut tf) = q.single_mut(world) {
                tf.translation.x = player_x;
                tf.translation.y = 100.0;
            }
        }
        sim_tick(world, TICK);

        let health = world.resource::<Progression>().health;
        if healths.last() != Some(&health) {
            healths.push(health);
        }
        if !player_alive(world) {
            break;
        }
    }

    assert_eq!(healths, vec![2, 1, 0]);
    assert!(!player_alive(world));

    let died: Vec<PlayerDied> = world
        .resource_mut::<Messages<PlayerDied>>()
        .drain()
        .collect();
    assert_eq!(died.len(), 1);

    // The countdown armed by the death hands off to GameOver.
    for _ in 0..70 {
        sim_tick(world, TICK);
    }
    assert!(matches!(
        *world.resource::<NextState<GameState>>(),
        NextState::Pending(GameState::GameOver)
    ));
}

#[test]
fn bark_stun_grace_defeat_removes_the_enemy_and_scores_once() {
    let mut app = common::app_headless();
    let world = app.world_mut();

    world.insert_resource(test_level(
        vec![EnemySpawn {
            kind: EnemyKind::Squirrel,
            x: 300.0,
            y: 100.0,
        }],
        vec![],
    ));
    common::run_system_once(world, player::spawn);
    common::run_system_once(world, enemies::spawn_from_level);
    common::run_system_once(world, session::begin_level);

    let enemy = {
        let mut q = world.query_filtered::<Entity, With<enemies::Enemy>>();
        q.single(world).expect("enemy")
    };

    // Bark in range: the enemy is stunned, not yet defeated.
    teleport_player(world, 280.0, 100.0);
    world.resource_mut::<ActionState>().attack = true;
    sim_tick(world, TICK);

    assert_eq!(*world.get::<EnemyState>(enemy).unwrap(), EnemyState::Stunned);
    assert_eq!(world.resource::<Progression>().enemies_defeated, 0);

    // The grace delay elapses: the automatic defeat lands exactly once.
    sim_tick(world, 0.6);
    assert_eq!(*world.get::<EnemyState>(enemy).unwrap(), EnemyState::Defeated);
    assert_eq!(world.resource::<Progression>().enemies_defeated, 1);
    assert_eq!(world.resource::<Progression>().score, 50);

    // The linger removal cleans the entity up; the score stays settled.
    sim_tick(world, 1.1);
    assert!(world.get_entity(enemy).is_err());
    assert_eq!(world.resource::<Progression>().enemies_defeated, 1);
    assert_eq!(world.resource::<Progression>().score, 50);
}
