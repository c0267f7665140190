//! Global state machine.
//!
//! `Loading` sits between level transitions: the next descriptor is parsed
//! and validated there, so `OnEnter(InGame)` spawn systems always see a valid
//! `ActiveLevel` and `DespawnOnExit(InGame)` has already cleared the old one.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    MainMenu,
    Loading,
    InGame,
    GameOver,
}
