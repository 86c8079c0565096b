use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;

use versequiz::catalog::{Catalog, Difficulty};
use versequiz::level::choose_questions_for_level_with;
use versequiz::persistence::{MemoryStore, UsageLedger};
use versequiz::repetition::{choose_questions_with, RandomizationConfig};


const NOW: i64 = 1_571_000_000_000;
const HOUR: i64 = 60 * 60 * 1000;


#[test]
fn builtin_catalog_supports_every_level() {
    let catalog = Catalog::builtin().unwrap();
    let ledger = UsageLedger::new(MemoryStore::new());
    let mut rng = StdRng::seed_from_u64(11);

    for level in 1..=6 {
        let selection = choose_questions_for_level_with(
            catalog.questions(),
            level,
            5,
            &ledger.load_used_ids(),
            &ledger.load_stats(),
            NOW,
            &mut rng,
        );
        assert_eq!(selection.len(), 5, "level {}", level);

        let ids: HashSet<&str> = selection.ids().into_iter().collect();
        assert_eq!(ids.len(), 5);

        if level == 1 {
            assert!(selection.questions.iter().all(|q| q.difficulty == Difficulty::Easy));
        }
        if level == 6 {
            assert!(selection.questions.iter().all(|q| q.difficulty == Difficulty::Hard));
        }
    }
}


#[test]
fn consecutive_quizzes_do_not_repeat_until_the_catalog_runs_out() {
    let catalog = Catalog::builtin().unwrap();
    let mut ledger = UsageLedger::new(MemoryStore::new());
    let config = RandomizationConfig::default();
    let mut rng = StdRng::seed_from_u64(12);

    let mut seen = HashSet::new();
    for session in 0..3 {
        let now = NOW + session * HOUR;
        let selection = choose_questions_with(
            catalog.questions(),
            10,
            &ledger.load_used_ids(),
            &ledger.load_stats(),
            &config,
            now,
            &mut rng,
        );
        assert_eq!(selection.len(), 10);
        assert!(!selection.is_degraded());

        for question in selection.questions.iter() {
            assert!(seen.insert(question.id.clone()), "{} was repeated", question.id);
            ledger.record_presentation_at(question, true, now).unwrap();
        }
        ledger.mark_used(selection.ids()).unwrap();
    }

    // Only six unused questions are left, so four have to come back.
    let selection = choose_questions_with(
        catalog.questions(),
        10,
        &ledger.load_used_ids(),
        &ledger.load_stats(),
        &config,
        NOW + 3 * HOUR,
        &mut rng,
    );
    assert_eq!(selection.len(), 10);
    assert_eq!(selection.backfilled, 4);
    let fresh = selection.questions.iter().filter(|q| !seen.contains(&q.id)).count();
    assert_eq!(fresh, 6);
}


#[test]
fn reset_makes_every_question_fresh_again() {
    let catalog = Catalog::builtin().unwrap();
    let mut ledger = UsageLedger::new(MemoryStore::new());
    let ids: Vec<&str> = catalog.questions().iter().map(|q| q.id.as_str()).collect();
    ledger.mark_used(ids).unwrap();

    let mut rng = StdRng::seed_from_u64(13);
    let config = RandomizationConfig::default();
    let before = choose_questions_with(
        catalog.questions(), 5, &ledger.load_used_ids(), &ledger.load_stats(), &config, NOW,
        &mut rng,
    );
    assert_eq!(before.len(), 5);
    assert_eq!(before.backfilled, 5);

    ledger.reset().unwrap();
    let after = choose_questions_with(
        catalog.questions(), 5, &ledger.load_used_ids(), &ledger.load_stats(), &config, NOW,
        &mut rng,
    );
    assert_eq!(after.len(), 5);
    assert!(!after.is_degraded());
}
