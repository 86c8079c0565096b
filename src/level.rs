/*!
 * Levels 1 to 6 and the mix of difficulties each one asks for.
 *
 *   Level 1: easy questions only
 *   Level 2: easy, with some medium questions mixed in
 *   Level 3: easy and medium
 *   Level 4: medium, with some hard questions mixed in
 *   Level 5: medium and hard
 *   Level 6: hard questions only
 *
 * "Some" means each such question is let in with probability 0.3, decided afresh on
 * every call. Two quizzes at level 2 can therefore draw from different pools.
 */
use std::cmp;
use std::collections::HashSet;

use log::info;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};

use super::catalog::{Difficulty, QuizQuestion};
use super::persistence::{now_millis, StatsMap};
use super::repetition::{
    choose_questions_with, LevelDistribution, RandomizationConfig, Selection,
};


pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 6;

// Chance that a question one step above a level's usual difficulty is let in.
const PARTIAL_ADMISSION: f64 = 0.3;

const LEVEL_DISTRIBUTIONS: [LevelDistribution; 6] = [
    LevelDistribution::new(1.0, 0.0, 0.0),
    LevelDistribution::new(0.7, 0.3, 0.0),
    LevelDistribution::new(0.5, 0.5, 0.0),
    LevelDistribution::new(0.2, 0.5, 0.3),
    LevelDistribution::new(0.0, 0.5, 0.5),
    LevelDistribution::new(0.0, 0.3, 0.7),
];

// Session score needed to move up a level.
const UP_THRESHOLD: f64 = 0.9;
// Session score at or below which the learner moves down a level.
const DOWN_THRESHOLD: f64 = 0.4;


pub fn clamp_level(level: u8) -> u8 {
    cmp::min(cmp::max(level, MIN_LEVEL), MAX_LEVEL)
}


/// Return `true` if `question` may be asked at `level`. Levels 2 and 4 flip a coin
/// for questions of the next difficulty up.
pub fn is_appropriate<R: Rng + ?Sized>(question: &QuizQuestion, level: u8, rng: &mut R) -> bool {
    match (clamp_level(level), question.difficulty) {
        (1, Difficulty::Easy) => true,
        (2, Difficulty::Easy) => true,
        (2, Difficulty::Medium) => rng.gen_bool(PARTIAL_ADMISSION),
        (3, Difficulty::Easy) | (3, Difficulty::Medium) => true,
        (4, Difficulty::Medium) => true,
        (4, Difficulty::Hard) => rng.gen_bool(PARTIAL_ADMISSION),
        (5, Difficulty::Medium) | (5, Difficulty::Hard) => true,
        (6, Difficulty::Hard) => true,
        _ => false,
    }
}


pub fn level_distribution(level: u8) -> LevelDistribution {
    LEVEL_DISTRIBUTIONS[usize::from(clamp_level(level) - MIN_LEVEL)]
}


/// Higher levels tolerate less repetition.
pub fn max_reuse_count(level: u8) -> u32 {
    let level = u32::from(clamp_level(level));
    cmp::max(1, 4 - level / 2)
}


pub fn level_config(level: u8) -> RandomizationConfig {
    RandomizationConfig {
        max_reuse_count: max_reuse_count(level),
        level_distribution: level_distribution(level),
        ..Default::default()
    }
}


/// Choose up to `count` questions suitable for `level`.
pub fn choose_questions_for_level<'a, I>(
    questions: I,
    level: u8,
    count: usize,
    used_ids: &HashSet<String>,
    stats: &StatsMap,
) -> Selection<'a>
where
    I: IntoIterator<Item = &'a QuizQuestion>,
{
    let mut rng = thread_rng();
    choose_questions_for_level_with(
        questions, level, count, used_ids, stats, now_millis(), &mut rng,
    )
}


pub fn choose_questions_for_level_with<'a, I, R>(
    questions: I,
    level: u8,
    count: usize,
    used_ids: &HashSet<String>,
    stats: &StatsMap,
    now: i64,
    rng: &mut R,
) -> Selection<'a>
where
    I: IntoIterator<Item = &'a QuizQuestion>,
    R: Rng + ?Sized,
{
    let mut eligible = Vec::new();
    for question in questions {
        if is_appropriate(question, level, rng) {
            eligible.push(question);
        }
    }

    let config = level_config(level);
    choose_questions_with(eligible, count, used_ids, stats, &config, now, rng)
}


/// The learner's current level, stored alongside the usage statistics.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelProgress {
    pub level: u8,
    pub sessions_completed: u32,
    /// Fraction of questions answered correctly in the most recent session.
    pub last_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelChange {
    Up,
    Down,
    Unchanged,
}

impl Default for LevelProgress {
    fn default() -> Self {
        LevelProgress { level: MIN_LEVEL, sessions_completed: 0, last_score: None }
    }
}

impl LevelProgress {
    /// Record a finished session and move the level up or down if the score calls
    /// for it. Sessions with no answered questions are ignored.
    pub fn record_session(&mut self, correct: usize, total: usize) -> LevelChange {
        if total == 0 {
            return LevelChange::Unchanged;
        }

        let score = correct as f64 / total as f64;
        self.sessions_completed += 1;
        self.last_score = Some(score);

        let old_level = clamp_level(self.level);
        let new_level = if score >= UP_THRESHOLD {
            clamp_level(old_level + 1)
        } else if score <= DOWN_THRESHOLD {
            clamp_level(old_level - 1)
        } else {
            old_level
        };
        self.level = new_level;

        if new_level > old_level {
            info!("level up: {} -> {}", old_level, new_level);
            LevelChange::Up
        } else if new_level < old_level {
            info!("level down: {} -> {}", old_level, new_level);
            LevelChange::Down
        } else {
            LevelChange::Unchanged
        }
    }
}
