/*!
 * Taking a quiz: choosing the questions, asking them, grading the answers and
 * recording how it went.
 */
use std::cmp::Ordering;
use std::io;

use log::{debug, warn};

use super::catalog::{Catalog, QuizQuestion};
use super::common::{QuizError, Result, SortOrder, TakeOptions};
use super::iohelper::MyReadline;
use super::level::{self, LevelChange};
use super::persistence::{KeyValueStore, QuestionStats, StatsMap, UsageLedger};
use super::repetition::{self, RandomizationConfig, Selection};
use super::ui::CmdUI;


/// Represents the results of taking a quiz on a particular occasion.
#[derive(Debug)]
pub struct QuizResult {
    /// Number of questions answered, which is less than the number chosen if the
    /// input ended early.
    pub total: usize,
    pub total_correct: usize,
    pub total_incorrect: usize,
    /// Fraction of questions answered correctly.
    pub score: f64,
    /// `false` if the quiz ended before every chosen question was answered.
    pub finished: bool,
    /// Set when the level moved because of this quiz.
    pub level_change: Option<(LevelChange, u8)>,
}


/// Choose questions for a quiz according to `options` and the ledger's history.
pub fn choose_questions<'a, S: KeyValueStore>(
    catalog: &'a Catalog,
    ledger: &UsageLedger<S>,
    options: &TakeOptions,
) -> Selection<'a> {
    let candidates = catalog.filter_questions(&options.filter_opts);
    let used_ids = ledger.load_used_ids();
    let stats = ledger.load_stats();

    let selection = if options.any_level {
        repetition::choose_questions(
            candidates,
            options.num_to_ask,
            &used_ids,
            &stats,
            &RandomizationConfig::default(),
        )
    } else {
        let level = match options.level {
            Some(level) => level::clamp_level(level),
            None => ledger.load_level_progress().level,
        };
        level::choose_questions_for_level(candidates, level, options.num_to_ask, &used_ids, &stats)
    };

    if selection.is_degraded() {
        debug!(
            "{} of {} question(s) were recently used or over the reuse limit",
            selection.backfilled,
            selection.len()
        );
    }
    selection
}


/// Take a quiz: choose the questions, ask them, and unless `options.no_save` is set,
/// record every answer in the ledger and update the learner's level.
///
/// Failures to write to the ledger are reported as warnings and do not stop the quiz.
pub fn take<W, R, S>(
    ui: &mut CmdUI<W, R>,
    catalog: &Catalog,
    ledger: &mut UsageLedger<S>,
    options: &TakeOptions,
) -> Result<QuizResult>
where
    W: io::Write,
    R: MyReadline,
    S: KeyValueStore,
{
    let selection = choose_questions(catalog, ledger, options);
    if selection.is_empty() {
        return Err(QuizError::EmptyQuiz);
    }

    let save = !options.no_save;
    if save {
        if let Err(e) = ledger.mark_used(selection.ids()) {
            warn!("could not save used questions ({})", e);
        }
    }

    let mut answers = Vec::new();
    for question in selection.questions.iter() {
        ui.next();
        let correct = match ask(ui, question) {
            Ok(Some(correct)) => correct,
            Ok(None) | Err(QuizError::ReadlineInterrupted) => break,
            Err(e) => return Err(e),
        };

        if save {
            if let Err(e) = ledger.record_presentation(question, correct) {
                warn!("could not save result for '{}' ({})", question.id, e);
                ui.warning("your answer could not be saved")?;
            }
        }
        answers.push(correct);
    }

    let mut quiz_result = summarize(&answers, selection.len());
    // Only finished quizzes at the saved level count towards moving it.
    if save && quiz_result.finished && !options.any_level && options.level.is_none() {
        let mut progress = ledger.load_level_progress();
        let change = progress.record_session(quiz_result.total_correct, quiz_result.total);
        if let Err(e) = ledger.save_level_progress(&progress) {
            warn!("could not save level progress ({})", e);
        }
        if change != LevelChange::Unchanged {
            quiz_result.level_change = Some((change, progress.level));
        }
    }

    ui.results(&quiz_result)?;
    match quiz_result.level_change {
        Some((LevelChange::Up, level)) => {
            ui.status(&format!("\nWell done! You are now on level {}.", level))?;
        }
        Some((LevelChange::Down, level)) => {
            ui.status(&format!("\nYou are now on level {}.", level))?;
        }
        _ => {}
    }
    Ok(quiz_result)
}


/// Ask a single question and return whether it was answered correctly. `Ok(None)`
/// means the input ended before an answer was given.
fn ask<W: io::Write, R: MyReadline>(
    ui: &mut CmdUI<W, R>,
    question: &QuizQuestion,
) -> Result<Option<bool>> {
    ui.question(question)?;
    let response = match ui.prompt_choice(question.options.len())? {
        Some(response) => response,
        None => return Ok(None),
    };

    let correct = question.is_correct(response);
    if correct {
        ui.correct()?;
    } else {
        ui.incorrect(question.correct_option())?;
    }
    if let Some(reference) = &question.reference {
        ui.reference(reference)?;
    }

    Ok(Some(correct))
}


fn summarize(answers: &[bool], num_chosen: usize) -> QuizResult {
    let total = answers.len();
    let total_correct = answers.iter().filter(|correct| **correct).count();
    let score = if total > 0 {
        total_correct as f64 / total as f64
    } else {
        0.0
    };
    QuizResult {
        total,
        total_correct,
        total_incorrect: total - total_correct,
        score,
        finished: total == num_chosen,
        level_change: None,
    }
}


/// One line of the `stats` report.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsLine {
    /// Percentage of correct answers.
    pub score: f64,
    pub attempts: u32,
    /// The question's text, or its id if the catalog no longer has it.
    pub text: String,
}


/// Collect the answered questions in `stats`, ordered by `sort`.
pub fn stats_report(catalog: &Catalog, stats: &StatsMap, sort: SortOrder) -> Vec<StatsLine> {
    let mut lines: Vec<StatsLine> = stats
        .iter()
        .filter_map(|(id, s)| stats_line(catalog, id, s))
        .collect();

    match sort {
        SortOrder::Best => lines.sort_by(cmp_lines_best),
        SortOrder::Worst => lines.sort_by(cmp_lines_worst),
        SortOrder::Most => lines.sort_by(cmp_lines_most),
        SortOrder::Least => lines.sort_by(cmp_lines_least),
    }
    lines
}


fn stats_line(catalog: &Catalog, id: &str, stats: &QuestionStats) -> Option<StatsLine> {
    let accuracy = stats.accuracy()?;
    let text = catalog
        .get(id)
        .map(|q| q.question.clone())
        .unwrap_or_else(|| id.to_string());
    Some(StatsLine { score: 100.0 * accuracy, attempts: stats.total_answers, text })
}


/// Comparison function that sorts stats lines such that the best results come
/// first, with ties going to the most attempted.
fn cmp_lines_best(a: &StatsLine, b: &StatsLine) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| cmp_lines_most(a, b))
        .then_with(|| a.text.cmp(&b.text))
}


fn cmp_lines_worst(a: &StatsLine, b: &StatsLine) -> Ordering {
    a.score
        .partial_cmp(&b.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| cmp_lines_most(a, b))
        .then_with(|| a.text.cmp(&b.text))
}


fn cmp_lines_most(a: &StatsLine, b: &StatsLine) -> Ordering {
    b.attempts.cmp(&a.attempts)
}


fn cmp_lines_least(a: &StatsLine, b: &StatsLine) -> Ordering {
    a.attempts.cmp(&b.attempts).then_with(|| a.text.cmp(&b.text))
}


#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    use super::super::catalog::Difficulty;
    use super::super::persistence::MemoryStore;

    struct Scripted(VecDeque<String>);

    impl MyReadline for Scripted {
        fn read_line(&mut self, _prompt: &str) -> Result<String> {
            self.0.pop_front().ok_or(QuizError::ReadlineEof)
        }
    }

    #[test]
    fn can_take_quiz_and_record_results() {
        let catalog = one_question_catalog();
        let mut ledger = UsageLedger::new(MemoryStore::new());
        let mut ui = ui(&["Moses", "b"]);

        let result = take(&mut ui, &catalog, &mut ledger, &options(1)).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.total_correct, 1);
        assert_eq!(result.score, 1.0);

        let stats = ledger.load_stats();
        assert_eq!(stats["ark"].times_used, 1);
        assert_eq!(stats["ark"].correct_answers, 1);
        assert!(ledger.load_used_ids().contains("ark"));
        assert_eq!(ledger.load_level_progress().sessions_completed, 1);

        let out = String::from_utf8(ui.into_writer()).unwrap();
        assert!(out.contains("(1) Who built the ark?"));
        assert!(out.contains("Please enter a letter."));
        assert!(out.contains("Correct!"));
        assert!(out.contains("See Genesis 6:14"));
    }

    #[test]
    fn wrong_answers_show_the_correction() {
        let catalog = one_question_catalog();
        let mut ledger = UsageLedger::new(MemoryStore::new());
        let mut ui = ui(&["a"]);

        let result = take(&mut ui, &catalog, &mut ledger, &options(1)).unwrap();
        assert_eq!(result.total_incorrect, 1);
        assert_eq!(ledger.load_stats()["ark"].correct_answers, 0);

        let out = String::from_utf8(ui.into_writer()).unwrap();
        assert!(out.contains("Incorrect. The correct answer was Noah."));
    }

    #[test]
    fn no_save_leaves_the_ledger_alone() {
        let catalog = one_question_catalog();
        let mut ledger = UsageLedger::new(MemoryStore::new());
        let mut ui = ui(&["b"]);
        let mut opts = options(1);
        opts.no_save = true;

        take(&mut ui, &catalog, &mut ledger, &opts).unwrap();
        assert!(ledger.load_stats().is_empty());
        assert!(ledger.load_used_ids().is_empty());
    }

    #[test]
    fn end_of_input_stops_the_quiz() {
        let catalog = Catalog::builtin().unwrap();
        let mut ledger = UsageLedger::new(MemoryStore::new());
        let mut ui = ui(&["a"]);

        let result = take(&mut ui, &catalog, &mut ledger, &options(5)).unwrap();
        assert_eq!(result.total, 1);
        assert!(!result.finished);
        assert_eq!(ledger.load_stats().len(), 1);
        // All five were chosen, so all five count as used.
        assert_eq!(ledger.load_used_ids().len(), 5);
    }

    #[test]
    fn unfinished_quiz_does_not_move_the_level() {
        let catalog = Catalog::new(vec![
            QuizQuestion::new("ark", "Who built the ark?", &["Noah", "Moses"], 0),
            QuizQuestion::new("sea", "Who parted the sea?", &["Moses", "Noah"], 0),
        ])
        .unwrap();
        let mut ledger = UsageLedger::new(MemoryStore::new());
        let mut ui = ui(&["a"]);

        let result = take(&mut ui, &catalog, &mut ledger, &options(2)).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.score, 1.0);
        assert!(!result.finished);
        assert_eq!(result.level_change, None);

        let progress = ledger.load_level_progress();
        assert_eq!(progress.level, 1);
        assert_eq!(progress.sessions_completed, 0);
        // The answer itself is still recorded.
        assert_eq!(ledger.load_stats().len(), 1);
    }

    #[test]
    fn saved_level_decides_the_difficulty() {
        let catalog = Catalog::builtin().unwrap();
        let ledger = UsageLedger::new(MemoryStore::new());

        let selection = choose_questions(&catalog, &ledger, &options(10));
        assert_eq!(selection.len(), 10);
        assert!(selection.questions.iter().all(|q| q.difficulty == Difficulty::Easy));
    }

    #[test]
    fn empty_filter_is_an_error() {
        let catalog = one_question_catalog();
        let mut ledger = UsageLedger::new(MemoryStore::new());
        let mut ui = ui(&[]);
        let mut opts = options(1);
        opts.filter_opts.keywords.push(String::from("whale"));

        match take(&mut ui, &catalog, &mut ledger, &opts) {
            Err(QuizError::EmptyQuiz) => {}
            other => panic!("expected empty quiz, got {:?}", other.map(|r| r.total)),
        }
    }

    #[test]
    fn stats_report_orders_lines() {
        let catalog = one_question_catalog();
        let ark = catalog.get("ark").unwrap();
        let mut stats = StatsMap::new();

        let mut good = QuestionStats::new(ark);
        good.correct_answers = 3;
        good.total_answers = 3;
        stats.insert(String::from("ark"), good);

        let mut bad = QuestionStats::new(ark);
        bad.correct_answers = 1;
        bad.total_answers = 4;
        stats.insert(String::from("retired"), bad);

        stats.insert(String::from("never"), QuestionStats::new(ark));

        let best = stats_report(&catalog, &stats, SortOrder::Best);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].text, "Who built the ark?");
        assert_eq!(best[0].score, 100.0);
        assert_eq!(best[1].text, "retired");

        let most = stats_report(&catalog, &stats, SortOrder::Most);
        assert_eq!(most[0].attempts, 4);

        let worst = stats_report(&catalog, &stats, SortOrder::Worst);
        assert_eq!(worst[0].score, 25.0);
    }

    fn one_question_catalog() -> Catalog {
        let mut q = QuizQuestion::new("ark", "Who built the ark?", &["Moses", "Noah", "David"], 1);
        q.reference = Some(String::from("Genesis 6:14"));
        Catalog::new(vec![q]).unwrap()
    }

    fn options(n: usize) -> TakeOptions {
        let mut options = TakeOptions::new();
        options.num_to_ask = n;
        options
    }

    fn ui(lines: &[&str]) -> CmdUI<Vec<u8>, Scripted> {
        colored::control::set_override(false);
        let lines = lines.iter().map(|l| String::from(*l)).collect();
        CmdUI::new(Vec::new(), Scripted(lines))
    }
}
