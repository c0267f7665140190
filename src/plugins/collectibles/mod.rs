//! Collectibles: bones, tennis balls, treats.
//!
//! One tagged component per item instead of a subclass per category; the
//! category carries the score/effect table. `ItemState` flips to Collecting
//! synchronously inside [`collect_item`], so an item can pay out at most once
//! no matter how many overlap queries see it before the despawn applies.

use bevy::ecs::message::{MessageWriter, Messages};
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::state::GameState;
use crate::plugins::progression::Progression;
use crate::plugins::world::ActiveLevel;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemCategory {
    /// Small score item.
    Bone,
    /// Large score item; feeds the streak.
    TennisBall,
    /// Heal item.
    Treat,
}

impl ItemCategory {
    #[inline]
    pub fn points(self) -> u32 {
        match self {
            ItemCategory::Bone => Progression::SMALL_ITEM_SCORE,
            ItemCategory::TennisBall => Progression::LARGE_ITEM_SCORE,
            ItemCategory::Treat => 0,
        }
    }

    fn color(self) -> Color {
        match self {
            ItemCategory::Bone => Color::srgb(0.95, 0.92, 0.84),
            ItemCategory::TennisBall => Color::srgb(0.84, 0.93, 0.25),
            ItemCategory::Treat => Color::srgb(0.95, 0.45, 0.70),
        }
    }
}

#[derive(Component, Debug)]
pub struct Collectible {
    pub category: ItemCategory,
    base_y: f32,
    phase: f32,
}

impl Collectible {
    pub fn new(category: ItemCategory, base_y: f32) -> Self {
        Self {
            category,
            base_y,
            phase: 0.0,
        }
    }
}

/// Single-use latch. Collecting is set synchronously on first acceptance.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemState {
    Active,
    Collecting,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct ItemCollected {
    pub category: ItemCategory,
    pub points: u32,
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Messages<ItemCollected>>();
    app.add_systems(PostUpdate, update_messages);

    app.add_systems(OnEnter(GameState::InGame), spawn_from_level);
    app.add_systems(Update, bob.run_if(in_state(GameState::InGame)));
}

pub fn spawn_from_level(mut commands: Commands, level: Res<ActiveLevel>) {
    let groups = [
        (ItemCategory::Bone, &level.0.bones),
        (ItemCategory::TennisBall, &level.0.tennis_balls),
        (ItemCategory::Treat, &level.0.treats),
    ];

    for (category, spawns) in groups {
        for (i, spawn) in spawns.iter().enumerate() {
            commands.spawn((
                Collectible {
                    category,
                    base_y: spawn.y,
                    phase: i as f32 * 0.7,
                },
                ItemState::Active,
                Sprite {
                    color: category.color(),
                    custom_size: Some(Vec2::splat(16.0)),
                    ..default()
                },
                Transform::from_xyz(spawn.x, spawn.y, 1.0),
                DespawnOnExit(GameState::InGame),
            ));
        }
    }
}

/// Apply one pickup to the ledger. Returns true when this pickup newly
/// activated the streak buff. No-op unless the item is still Active.
pub fn collect_item(
    progression: &mut Progression,
    category: ItemCategory,
    state: &mut ItemState,
    collected: &mut MessageWriter<ItemCollected>,
) -> bool {
    if *state != ItemState::Active {
        return false;
    }
    *state = ItemState::Collecting;

    let buff_started = match category {
        ItemCategory::Bone => {
            progression.collect_small();
            false
        }
        ItemCategory::TennisBall => progression.collect_large(),
        ItemCategory::Treat => {
            progression.collect_heal();
            false
        }
    };

    collected.write(ItemCollected {
        category,
        points: category.points(),
    });
    buff_started
}

/// Gentle float around the spawn height. Cosmetic.
fn bob(time: Res<Time>, mut q_items: Query<(&Collectible, &ItemState, &mut Transform)>) {
    let t = time.elapsed_secs();
    for (item, state, mut tf) in &mut q_items {
        if *state != ItemState::Active {
            continue;
        }
        tf.translation.y = item.base_y + (t * 3.0 + item.phase).sin() * 5.0;
    }
}

/// Messages are double-buffered; `update()` advances buffers.
fn update_messages(mut collected: ResMut<Messages<ItemCollected>>) {
    collected.update();
}

#[cfg(test)]
mod tests;
