//! Progression ledger: one session-scoped record of score, health, streak,
//! rescue counters, and the level clock.
//!
//! Every cross-entity effect (damage, scoring, rescue credit) funnels through
//! this resource from tick-driven transition handlers. It is passed
//! explicitly as a system parameter; nothing else owns score or health.

use bevy::prelude::*;

pub mod leaderboard;

pub use leaderboard::{Leaderboard, ScoreEntry};

#[derive(Resource, Debug, Clone)]
pub struct Progression {
    pub score: u32,
    pub health: u32,
    pub max_health: u32,
    /// Consecutive large-item pickups since the last reset event.
    pub streak: u32,
    pub buff_active: bool,
    pub dogs_rescued: u32,
    pub total_dogs: u32,
    pub damage_taken: bool,
    /// Fixed-tick seconds since `start_level`.
    pub level_elapsed: f32,
    pub level: u32,
    pub enemies_defeated: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            score: 0,
            health: 3,
            max_health: 3,
            streak: 0,
            buff_active: false,
            dogs_rescued: 0,
            total_dogs: 0,
            damage_taken: false,
            level_elapsed: 0.0,
            level: 1,
            enemies_defeated: 0,
        }
    }
}

/// End-of-level bonus breakdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelBonuses {
    pub perfect_rescue: bool,
    pub speed_bonus: bool,
    pub clean_pass: bool,
    pub total: u32,
}

impl Progression {
    pub const SMALL_ITEM_SCORE: u32 = 10;
    pub const LARGE_ITEM_SCORE: u32 = 25;
    pub const STREAK_TARGET: u32 = 3;
    pub const STREAK_BONUS: u32 = 100;
    pub const DAMAGE_PENALTY: u32 = 25;
    pub const RESCUE_SCORE: u32 = 150;
    pub const DEFEAT_SCORE: u32 = 50;
    pub const PERFECT_RESCUE_BONUS: u32 = 500;
    pub const SPEED_BONUS: u32 = 250;
    pub const CLEAN_PASS_BONUS: u32 = 200;

    pub fn add_score(&mut self, points: u32) {
        self.score += points;
    }

    /// Score never goes below zero.
    pub fn subtract_score(&mut self, points: u32) {
        self.score = self.score.saturating_sub(points);
    }

    /// Small item: worth a little, breaks the streak.
    pub fn collect_small(&mut self) {
        self.add_score(Self::SMALL_ITEM_SCORE);
        self.streak = 0;
    }

    /// Large item: scores and advances the streak. Returns true when this
    /// pickup crossed the streak threshold and newly activated the buff
    /// (flat bonus added, streak reset).
    pub fn collect_large(&mut self) -> bool {
        self.streak += 1;
        self.add_score(Self::LARGE_ITEM_SCORE);

        if self.streak >= Self::STREAK_TARGET && !self.buff_active {
            self.buff_active = true;
            self.add_score(Self::STREAK_BONUS);
            self.streak = 0;
            return true;
        }
        false
    }

    /// Heal item: back to full health, breaks the streak.
    pub fn collect_heal(&mut self) {
        self.health = self.max_health;
        self.streak = 0;
    }

    pub fn end_buff(&mut self) {
        self.buff_active = false;
    }

    /// One hit of damage. Returns whether the player is still alive.
    pub fn take_damage(&mut self) -> bool {
        self.health = self.health.saturating_sub(1);
        self.damage_taken = true;
        self.subtract_score(Self::DAMAGE_PENALTY);
        self.health > 0
    }

    pub fn rescue_dog(&mut self) {
        self.dogs_rescued += 1;
        self.add_score(Self::RESCUE_SCORE);
    }

    pub fn defeat_enemy(&mut self) {
        self.enemies_defeated += 1;
        self.add_score(Self::DEFEAT_SCORE);
    }

    /// Reset per-level counters. Cumulative score and health carry over.
    pub fn start_level(&mut self, level: u32, total_dogs: u32) {
        self.level = level;
        self.total_dogs = total_dogs;
        self.dogs_rescued = 0;
        self.damage_taken = false;
        self.level_elapsed = 0.0;
    }

    /// Compute end-of-level bonuses against `time_goal` seconds and add the
    /// total to the score.
    pub fn finish_level(&mut self, time_goal: f32) -> LevelBonuses {
        let mut bonuses = LevelBonuses::default();

        if self.total_dogs > 0 && self.dogs_rescued == self.total_dogs {
            bonuses.perfect_rescue = true;
            bonuses.total += Self::PERFECT_RESCUE_BONUS;
        }
        if self.level_elapsed < time_goal {
            bonuses.speed_bonus = true;
            bonuses.total += Self::SPEED_BONUS;
        }
        if !self.damage_taken {
            bonuses.clean_pass = true;
            bonuses.total += Self::CLEAN_PASS_BONUS;
        }

        self.add_score(bonuses.total);
        bonuses
    }

    /// Fresh-game state. Only the main-menu boundary calls this.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub fn plugin(app: &mut App) {
    app.insert_resource(Progression::default());
    app.insert_resource(Leaderboard::default_location());
}
