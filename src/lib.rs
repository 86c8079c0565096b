/*!
 * Bible quizzes that remember what you have been asked.
 *
 * Questions come from a `catalog::Catalog`. `repetition` weighs them by how often and
 * how recently they were asked and how well they went, `level` narrows them to the
 * learner's level, and `persistence` keeps the history between runs.
 */
#[macro_use]
pub mod iohelper;
pub mod catalog;
pub mod common;
pub mod level;
pub mod persistence;
pub mod quiz;
pub mod repetition;
pub mod ui;

pub use catalog::{Catalog, Category, Difficulty, QuizQuestion, Testament};
pub use common::{QuizError, Result};
pub use level::{choose_questions_for_level, LevelProgress};
pub use persistence::{QuestionStats, StatsMap, UsageLedger};
pub use repetition::{choose_questions, RandomizationConfig, Selection};
