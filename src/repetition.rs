/*!
 * Choose which questions to ask based on how often and how recently they have been
 * asked, and how well the learner has done on them.
 *
 * Every candidate gets a weight:
 *
 *   - 1 / (times used + 1), so fresh questions are preferred;
 *   - suppressed by up to 80% while the question is cooling down after being shown,
 *     fading linearly to no suppression when the cooldown period ends;
 *   - boosted by 20% if the learner gets it right less than half the time;
 *   - scaled by the configured factor for its difficulty and for its category.
 *
 * The heaviest candidates that are not in the used set and not over the reuse limit
 * are taken first. If that does not produce enough questions, the rest are filled
 * in with the least recently used questions, so a quiz is never cut short just
 * because everything has been seen lately.
 */
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use log::debug;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

use super::catalog::{Category, Difficulty, QuizQuestion};
use super::persistence::{now_millis, QuestionStats, StatsMap};


pub const DEFAULT_MAX_REUSE_COUNT: u32 = 3;
pub const DEFAULT_COOLDOWN_PERIOD: i64 = 24 * 60 * 60 * 1000;
// How much of a question's weight is taken away right after it is shown.
const COOLDOWN_SUPPRESSION: f64 = 0.8;
// Questions answered correctly less often than this get a boost.
const STRUGGLING_ACCURACY: f64 = 0.5;
const STRUGGLING_BOOST: f64 = 1.2;
const DEFAULT_CATEGORY_FACTOR: f64 = 0.1;


/// Weight factors for each difficulty. They are multipliers, not quotas: a factor of
/// zero keeps that difficulty out of the first pass entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelDistribution {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

impl LevelDistribution {
    pub const fn new(easy: f64, medium: f64, hard: f64) -> Self {
        LevelDistribution { easy, medium, hard }
    }

    pub fn factor(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}


#[derive(Debug, Clone)]
pub struct RandomizationConfig {
    /// Questions used this many times are skipped until the backfill.
    pub max_reuse_count: u32,
    /// Milliseconds after being shown during which a question's weight is suppressed.
    pub cooldown_period: i64,
    pub level_distribution: LevelDistribution,
    /// Weight factor per category. A category missing from the map has factor zero.
    pub category_distribution: HashMap<Category, f64>,
}

impl Default for RandomizationConfig {
    fn default() -> Self {
        RandomizationConfig {
            max_reuse_count: DEFAULT_MAX_REUSE_COUNT,
            cooldown_period: DEFAULT_COOLDOWN_PERIOD,
            level_distribution: LevelDistribution::new(0.4, 0.4, 0.2),
            category_distribution: Category::ALL
                .iter()
                .map(|c| (*c, DEFAULT_CATEGORY_FACTOR))
                .collect(),
        }
    }
}

impl RandomizationConfig {
    pub fn category_factor(&self, category: Category) -> f64 {
        self.category_distribution.get(&category).copied().unwrap_or(0.0)
    }
}


/// The questions chosen for a quiz, in the order they should be asked.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub questions: Vec<&'a QuizQuestion>,
    /// How many of `questions` only made it in through the backfill, i.e. were
    /// recently used, over the reuse limit, or weighted out.
    pub backfilled: usize,
}

impl<'a> Selection<'a> {
    pub fn empty() -> Self {
        Selection { questions: Vec::new(), backfilled: 0 }
    }

    /// `true` if the selection had to fall back on questions it would rather not ask.
    pub fn is_degraded(&self) -> bool {
        self.backfilled > 0
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.questions.iter().map(|q| q.id.as_str()).collect()
    }
}


/// Compute the selection weight of `question` at time `now` (epoch milliseconds).
/// `stats` is `None` for questions that have never been shown.
pub fn question_weight(
    question: &QuizQuestion,
    stats: Option<&QuestionStats>,
    config: &RandomizationConfig,
    now: i64,
) -> f64 {
    let mut weight = 1.0;

    if let Some(stats) = stats {
        weight /= f64::from(stats.times_used) + 1.0;

        let elapsed = now - stats.last_used;
        if stats.last_used > 0 && config.cooldown_period > 0 && elapsed < config.cooldown_period {
            let cooldown_factor = (config.cooldown_period - elapsed) as f64
                / config.cooldown_period as f64;
            // A timestamp from the future counts as just used.
            let cooldown_factor = cooldown_factor.min(1.0);
            weight *= 1.0 - cooldown_factor * COOLDOWN_SUPPRESSION;
        }

        if let Some(accuracy) = stats.accuracy() {
            if accuracy < STRUGGLING_ACCURACY {
                weight *= STRUGGLING_BOOST;
            }
        }
    }

    weight
        * config.level_distribution.factor(question.difficulty)
        * config.category_factor(question.category)
}


/// Choose up to `count` distinct questions from `questions`.
pub fn choose_questions<'a, I>(
    questions: I,
    count: usize,
    used_ids: &HashSet<String>,
    stats: &StatsMap,
    config: &RandomizationConfig,
) -> Selection<'a>
where
    I: IntoIterator<Item = &'a QuizQuestion>,
{
    let mut rng = thread_rng();
    choose_questions_with(questions, count, used_ids, stats, config, now_millis(), &mut rng)
}


/// Like `choose_questions`, with the clock and random number generator supplied by
/// the caller.
///
/// The result has `min(count, number of distinct questions)` entries and never
/// contains the same id twice. Questions in `used_ids` are only returned when there
/// are not enough other questions.
pub fn choose_questions_with<'a, I, R>(
    questions: I,
    count: usize,
    used_ids: &HashSet<String>,
    stats: &StatsMap,
    config: &RandomizationConfig,
    now: i64,
    rng: &mut R,
) -> Selection<'a>
where
    I: IntoIterator<Item = &'a QuizQuestion>,
    R: Rng + ?Sized,
{
    let mut candidates: Vec<(&'a QuizQuestion, f64)> = questions
        .into_iter()
        .map(|q| (q, question_weight(q, stats.get(&q.id), config, now)))
        .collect();

    if count == 0 || candidates.is_empty() {
        return Selection::empty();
    }

    // Shuffle before the stable sort so that ties come out in random order.
    candidates.shuffle(rng);
    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut chosen = Vec::new();
    let mut chosen_ids: HashSet<&'a str> = HashSet::new();
    for &(question, weight) in candidates.iter() {
        if chosen.len() >= count {
            break;
        }

        if weight <= 0.0
            || chosen_ids.contains(question.id.as_str())
            || used_ids.contains(&question.id)
            || times_used(stats, question) >= config.max_reuse_count
        {
            continue;
        }

        chosen_ids.insert(question.id.as_str());
        chosen.push(question);
    }

    let mut backfilled = 0;
    if chosen.len() < count {
        let mut remaining: Vec<&'a QuizQuestion> = candidates
            .iter()
            .map(|&(q, _)| q)
            .filter(|q| !chosen_ids.contains(q.id.as_str()))
            .collect();
        // Questions outside the used set go first, and within each group the least
        // recently used.
        remaining.sort_by_key(|q| (used_ids.contains(&q.id), last_used(stats, q)));

        for question in remaining {
            if chosen.len() >= count {
                break;
            }
            if chosen_ids.insert(question.id.as_str()) {
                chosen.push(question);
                backfilled += 1;
            }
        }

        debug!(
            "backfilled {} of {} requested question(s) from {} candidate(s)",
            backfilled,
            count,
            candidates.len()
        );
    }

    chosen.shuffle(rng);
    Selection { questions: chosen, backfilled }
}


fn times_used(stats: &StatsMap, question: &QuizQuestion) -> u32 {
    stats.get(&question.id).map_or(0, |s| s.times_used)
}


fn last_used(stats: &StatsMap, question: &QuizQuestion) -> i64 {
    stats.get(&question.id).map_or(0, |s| s.last_used)
}
