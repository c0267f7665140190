//! Level data and static geometry.
//!
//! Levels are RON descriptors embedded at build time. A descriptor is parsed
//! and validated as a whole before anything spawns; a bad descriptor aborts
//! level construction instead of building a partial world.
//!
//! Coordinates are world pixels, y up, ground plane at y = 0. `Platform.y` is
//! the top surface height and `Platform.x` the left edge.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use serde::Deserialize;
use thiserror::Error;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::enemies::EnemyKind;

const LEVEL_SOURCES: &[&str] = &[
    include_str!("levels/sunny_start.ron"),
    include_str!("levels/rainy_chase.ron"),
];

pub const PLATFORM_THICKNESS: f32 = 32.0;

/// Number of authored levels.
pub fn level_count() -> u32 {
    LEVEL_SOURCES.len() as u32
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Spawn {
    pub x: f32,
    pub y: f32,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Platform {
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LevelDescriptor {
    pub name: String,
    pub world_width: f32,
    /// Seconds to beat for the speed bonus.
    pub time_goal: f32,
    pub slippery: bool,
    pub player_start: Spawn,
    pub platforms: Vec<Platform>,
    pub bones: Vec<Spawn>,
    pub tennis_balls: Vec<Spawn>,
    pub treats: Vec<Spawn>,
    pub enemies: Vec<EnemySpawn>,
    pub lost_dogs: Vec<Spawn>,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("no level with index {0}")]
    UnknownLevel(u32),
    #[error("level data failed to parse: {0}")]
    Parse(#[from] ron::de::SpannedError),
    #[error("level `{name}`: {field} must be positive")]
    NonPositive { name: String, field: &'static str },
    #[error("level `{name}` has no platforms")]
    NoPlatforms { name: String },
    #[error("level `{name}`: {what} at x = {x} is outside the world span")]
    OutOfBounds {
        name: String,
        what: &'static str,
        x: f32,
    },
}

impl LevelDescriptor {
    /// Parse and validate the level with the given 1-based index.
    pub fn load(index: u32) -> Result<Self, LevelError> {
        let slot = (index as usize)
            .checked_sub(1)
            .ok_or(LevelError::UnknownLevel(index))?;
        let source = LEVEL_SOURCES
            .get(slot)
            .ok_or(LevelError::UnknownLevel(index))?;
        Self::from_source(source)
    }

    /// Parse and validate a single RON descriptor.
    pub fn from_source(source: &str) -> Result<Self, LevelError> {
        let descriptor: Self = ron::de::from_str(source)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn total_dogs(&self) -> u32 {
        self.lost_dogs.len() as u32
    }

    fn validate(&self) -> Result<(), LevelError> {
        if self.world_width <= 0.0 {
            return Err(self.non_positive("world_width"));
        }
        if self.time_goal <= 0.0 {
            return Err(self.non_positive("time_goal"));
        }
        if self.platforms.is_empty() {
            return Err(LevelError::NoPlatforms {
                name: self.name.clone(),
            });
        }

        self.check_span("player start", std::iter::once(self.player_start.x))?;
        self.check_span("bone", self.bones.iter().map(|s| s.x))?;
        self.check_span("tennis ball", self.tennis_balls.iter().map(|s| s.x))?;
        self.check_span("treat", self.treats.iter().map(|s| s.x))?;
        self.check_span("enemy", self.enemies.iter().map(|s| s.x))?;
        self.check_span("lost dog", self.lost_dogs.iter().map(|s| s.x))?;
        Ok(())
    }

    fn check_span(
        &self,
        what: &'static str,
        xs: impl Iterator<Item = f32>,
    ) -> Result<(), LevelError> {
        for x in xs {
            if x < 0.0 || x > self.world_width {
                return Err(LevelError::OutOfBounds {
                    name: self.name.clone(),
                    what,
                    x,
                });
            }
        }
        Ok(())
    }

    fn non_positive(&self, field: &'static str) -> LevelError {
        LevelError::NonPositive {
            name: self.name.clone(),
            field,
        }
    }
}

/// The validated descriptor of the level currently being played.
#[derive(Resource, Debug, Clone)]
pub struct ActiveLevel(pub LevelDescriptor);

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_platforms);
}

/// Spawn the level's static colliders.
pub fn spawn_platforms(mut commands: Commands, level: Res<ActiveLevel>) {
    // Slippery levels barely grip; the player plugin also softens its stop.
    let friction = if level.0.slippery {
        Friction::new(0.05)
    } else {
        Friction::new(0.8)
    };

    for (i, p) in level.0.platforms.iter().enumerate() {
        let size = Vec2::new(p.width, PLATFORM_THICKNESS);
        let color = if p.y <= PLATFORM_THICKNESS {
            Color::srgb(0.36, 0.28, 0.18)
        } else {
            Color::srgb(0.30, 0.48, 0.26)
        };

        commands.spawn((
            Name::new(format!("Platform{i}")),
            Sprite {
                color,
                custom_size: Some(size),
                ..default()
            },
            Transform::from_xyz(p.x + p.width * 0.5, p.y - PLATFORM_THICKNESS * 0.5, 0.0),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            CollisionLayers::new(Layer::World, [Layer::Player]),
            friction,
            DespawnOnExit(GameState::InGame),
        ));
    }
}
