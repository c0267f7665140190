//! Level session driver.
//!
//! Owns the flow around the simulation: descriptor loading and validation in
//! the `Loading` state, the level clock, the completion check and bonus
//! payout, the death countdown into `GameOver`, the menu-boundary ledger
//! reset, and the leaderboard submission at the game-over boundary.

use bevy::ecs::message::{MessageReader, MessageWriter, Messages};
use bevy::prelude::*;

use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::interactions;
use crate::plugins::player::{Player, PlayerDied};
use crate::plugins::progression::{Leaderboard, LevelBonuses, Progression};
use crate::plugins::world::{self, ActiveLevel, LevelDescriptor};

#[derive(Message, Clone, Copy, Debug)]
pub struct LevelCompleted {
    pub bonuses: LevelBonuses,
}

/// Initials submitted to the leaderboard at the game-over boundary.
#[derive(Resource, Debug, Clone)]
pub struct PlayerName(pub String);

impl Default for PlayerName {
    fn default() -> Self {
        Self("PUP".into())
    }
}

/// Armed by the death message; hands off to GameOver when it elapses.
#[derive(Resource, Debug)]
pub struct GameOverCountdown(pub Timer);

pub fn plugin(app: &mut App) {
    app.insert_resource(PlayerName::default());
    app.init_resource::<Messages<LevelCompleted>>();
    app.add_systems(PostUpdate, update_messages);

    app.add_systems(OnEnter(GameState::Loading), load_level);
    app.add_systems(OnEnter(GameState::InGame), begin_level);
    app.add_systems(OnEnter(GameState::GameOver), submit_score);

    app.add_systems(
        Update,
        start_from_menu.run_if(in_state(GameState::MainMenu)),
    );
    app.add_systems(Update, leave_game_over.run_if(in_state(GameState::GameOver)));

    app.add_systems(
        FixedUpdate,
        (
            tick_level_clock,
            handle_player_death.after(interactions::resolve_enemy_contacts),
            tick_game_over_countdown,
            check_completion.after(interactions::resolve_rescues),
        )
            .run_if(in_state(GameState::InGame)),
    );
}

/// Parse and validate the next descriptor. A bad descriptor aborts to the
/// menu before anything spawns.
pub fn load_level(
    mut commands: Commands,
    progression: Res<Progression>,
    mut next: ResMut<NextState<GameState>>,
) {
    match LevelDescriptor::load(progression.level) {
        Ok(level) => {
            info!("level {} `{}` loaded", progression.level, level.name);
            commands.insert_resource(ActiveLevel(level));
            next.set(GameState::InGame);
        }
        Err(err) => {
            error!("level {} failed to load: {err}", progression.level);
            next.set(GameState::MainMenu);
        }
    }
}

/// Reset the per-level ledger counters against the freshly loaded descriptor.
pub fn begin_level(level: Res<ActiveLevel>, mut progression: ResMut<Progression>) {
    let index = progression.level;
    progression.start_level(index, level.0.total_dogs());
}

pub fn tick_level_clock(time: Res<Time<Fixed>>, mut progression: ResMut<Progression>) {
    progression.level_elapsed += time.delta_secs();
}

/// Completion: past the finish margin, alive, and no transition pending.
pub fn check_completion(
    tunables: Res<Tunables>,
    level: Res<ActiveLevel>,
    mut progression: ResMut<Progression>,
    q_player: Query<(&Transform, &Player)>,
    mut completed: MessageWriter<LevelCompleted>,
    mut next: ResMut<NextState<GameState>>,
) {
    if matches!(*next, NextState::Pending(_)) {
        return;
    }
    let Ok((tf, player)) = q_player.single() else {
        return;
    };
    if !player.alive {
        return;
    }
    if tf.translation.x <= level.0.world_width - tunables.level_end_margin {
        return;
    }

    let bonuses = progression.finish_level(level.0.time_goal);
    completed.write(LevelCompleted { bonuses });

    if progression.level < world::level_count() {
        progression.level += 1;
        next.set(GameState::Loading);
    } else {
        next.set(GameState::GameOver);
    }
}

/// Arm the game-over countdown when the player dies.
pub fn handle_player_death(
    mut commands: Commands,
    tunables: Res<Tunables>,
    mut died: MessageReader<PlayerDied>,
    countdown: Option<Res<GameOverCountdown>>,
) {
    if died.is_empty() {
        return;
    }
    died.clear();

    if countdown.is_none() {
        commands.insert_resource(GameOverCountdown(Timer::from_seconds(
            tunables.death_restart_secs,
            TimerMode::Once,
        )));
    }
}

pub fn tick_game_over_countdown(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    countdown: Option<ResMut<GameOverCountdown>>,
    mut next: ResMut<NextState<GameState>>,
) {
    let Some(mut countdown) = countdown else {
        return;
    };

    countdown.0.tick(time.delta());
    if countdown.0.is_finished() {
        commands.remove_resource::<GameOverCountdown>();
        next.set(GameState::GameOver);
    }
}

/// Persist the run at the game-over boundary. Best-effort by design.
pub fn submit_score(
    progression: Res<Progression>,
    board: Res<Leaderboard>,
    name: Res<PlayerName>,
) {
    let ranked = board.submit(&name.0, progression.score, progression.level);
    let rank = ranked
        .iter()
        .position(|entry| entry.score == progression.score)
        .map(|i| i + 1);
    match rank {
        Some(rank) => info!("final score {} (rank {rank})", progression.score),
        None => info!("final score {} (off the board)", progression.score),
    }
}

/// Main-menu boundary: the only place the ledger fully resets.
pub fn start_from_menu(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut progression: ResMut<Progression>,
    mut next: ResMut<NextState<GameState>>,
) {
    let Some(keys) = keys else {
        return;
    };
    if keys.just_pressed(KeyCode::Enter) || keys.just_pressed(KeyCode::Space) {
        progression.reset();
        next.set(GameState::Loading);
    }
}

pub fn leave_game_over(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut next: ResMut<NextState<GameState>>,
) {
    let Some(keys) = keys else {
        return;
    };
    if keys.just_pressed(KeyCode::Enter) {
        next.set(GameState::MainMenu);
    }
}

/// Messages are double-buffered; `update()` advances buffers.
fn update_messages(mut completed: ResMut<Messages<LevelCompleted>>) {
    completed.update();
}
