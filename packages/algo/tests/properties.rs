//! Property-Based Tests for the scoring core
//!
//! Invariants:
//! - Fewer than five records: the policy always answers easy
//! - Accuracy in [0, 100], velocity in [-100, 100]
//! - Streak multiplier ordering
//! - Review dates are in the future and non-decreasing in review count
//! - Fresh selection never re-serves an attempted question
//! - Totals increment exactly once per submission
//! - Q-values move with the sign of the reward

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use neuro_algo::difficulty::streak_multiplier;
use neuro_algo::rl::RlTracker;
use neuro_algo::scheduler::{next_review_at, review_interval_days};
use neuro_algo::{
    calculate_next_difficulty, calculate_performance_metrics, select_next_question,
    update_user_profile, Difficulty, EngineConfig, Question, QuestionType, RlAction, RlState,
    SchedulerConfig, SelectionReason, Submission, UserProfile, UserProgress,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Easy),
        Just(Difficulty::Medium),
        Just(Difficulty::Hard),
    ]
}

fn arb_progress() -> impl Strategy<Value = UserProgress> {
    (
        0u32..500,            // id
        any::<bool>(),        // correct
        0.0f64..3600.0,       // time_spent
        0.0f64..=100.0,       // confidence
        arb_difficulty(),
    )
        .prop_map(|(id, correct, time_spent, confidence, difficulty)| UserProgress {
            question_id: format!("q{id}"),
            topic: "Loops".to_string(),
            attempts: 1,
            time_spent,
            correct,
            submitted_code: String::new(),
            timestamp: 0,
            next_review_at: None,
            review_count: 0,
            difficulty,
            confidence,
            hints_used: 0,
            concepts: vec!["loops".to_string()],
            error_type: None,
            time_to_first_attempt: time_spent,
            attempt_sequence: Vec::new(),
            solution_viewed: false,
            solution_viewed_at: None,
            estimated_time: 300.0,
        })
}

fn arb_history(max: usize) -> impl Strategy<Value = Vec<UserProgress>> {
    prop::collection::vec(arb_progress(), 0..max)
}

fn question(id: usize, difficulty: Difficulty) -> Question {
    Question {
        id: format!("q{id}"),
        topic: "Loops".to_string(),
        subtopic: String::new(),
        difficulty,
        question_type: QuestionType::CodeWriting,
        title: format!("Question {id}"),
        description: String::new(),
        starter_code: String::new(),
        solution_code: None,
        test_cases: Vec::new(),
        hints: Vec::new(),
        tags: vec!["loops".to_string()],
        estimated_time: 300.0,
    }
}

fn with_history(history: Vec<UserProgress>, tier: Difficulty) -> UserProfile {
    let mut profile = UserProfile::new(0);
    profile.progress_history = history;
    profile.current_difficulty = tier;
    profile
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_short_history_is_easy(history in arb_history(5), tier in arb_difficulty()) {
        let config = EngineConfig::default();
        let profile = with_history(history, tier);
        prop_assert_eq!(
            calculate_next_difficulty(&profile, &config.metrics, &config.policy),
            Difficulty::Easy
        );
    }

    #[test]
    fn prop_metric_bounds(history in arb_history(80)) {
        let metrics = calculate_performance_metrics(&history, &EngineConfig::default().metrics);
        prop_assert!((0.0..=100.0).contains(&metrics.accuracy));
        prop_assert!((0.0..=100.0).contains(&metrics.speed));
        prop_assert!((0.0..=100.0).contains(&metrics.consistency));
        prop_assert!((-100.0..=100.0).contains(&metrics.learning_velocity));
        if history.is_empty() {
            prop_assert_eq!(metrics.accuracy, 0.0);
        }
    }

    #[test]
    fn prop_streak_multiplier_ordering(history in arb_history(20)) {
        let mut winning = history.clone();
        for mut record in history.iter().take(1).cloned().cycle().take(5) {
            record.correct = true;
            winning.push(record);
        }
        let mut losing = history.clone();
        for mut record in history.iter().take(1).cloned().cycle().take(3) {
            record.correct = false;
            losing.push(record);
        }
        if !history.is_empty() {
            prop_assert!(streak_multiplier(&winning) > 1.0);
            prop_assert!(streak_multiplier(&losing) < 1.0);
        }
    }

    #[test]
    fn prop_review_in_future_and_monotonic(
        history in arb_history(30),
        now in 0i64..4_000_000_000_000,
        count in 0u32..12,
    ) {
        let config = SchedulerConfig::default();
        prop_assert!(next_review_at(count, &history, now, &config) > now);
        prop_assert!(
            next_review_at(count + 1, &history, now, &config) >= next_review_at(count, &history, now, &config)
        );
        prop_assert!(review_interval_days(count + 1, &config) >= review_interval_days(count, &config));
    }

    #[test]
    fn prop_fresh_selection_never_repeats(
        attempted in prop::collection::btree_set(0usize..12, 0..12),
        tier in arb_difficulty(),
        seed in any::<u64>(),
    ) {
        let catalog: Vec<Question> = (0..12).map(|i| question(i, Difficulty::ALL[i % 3])).collect();
        let mut profile = UserProfile::new(0);
        profile.current_difficulty = tier;
        for &i in &attempted {
            profile.progress_history.push(UserProgress {
                question_id: format!("q{i}"),
                topic: "Loops".to_string(),
                attempts: 1,
                time_spent: 60.0,
                correct: true,
                submitted_code: String::new(),
                timestamp: 0,
                next_review_at: None,
                review_count: 0,
                difficulty: tier,
                confidence: 50.0,
                hints_used: 0,
                concepts: Vec::new(),
                error_type: None,
                time_to_first_attempt: 60.0,
                attempt_sequence: Vec::new(),
                solution_viewed: false,
                solution_viewed_at: None,
                estimated_time: 300.0,
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let selection = select_next_question(&catalog, &profile, "Loops", 0, &EngineConfig::default().selector, &mut rng);
        match selection {
            Some(s) => {
                prop_assert_ne!(s.reason, SelectionReason::DueReview);
                prop_assert!(!profile.has_attempted(&s.question.id));
            }
            None => prop_assert_eq!(attempted.len(), 12),
        }
    }

    #[test]
    fn prop_totals_increment_once(
        picks in prop::collection::vec((0usize..6, any::<bool>(), 0.0f64..900.0), 1..25),
    ) {
        let config = EngineConfig::default();
        let catalog: Vec<Question> = (0..6).map(|i| question(i, Difficulty::Easy)).collect();
        let mut profile = UserProfile::new(0);
        for (step, (idx, correct, time_spent)) in picks.iter().enumerate() {
            let before = profile.total_questions_attempted;
            let submission = Submission { correct: *correct, time_spent: *time_spent, ..Submission::default() };
            profile = update_user_profile(&profile, &catalog[*idx], &submission, step as i64 * 60_000, &config);
            prop_assert_eq!(profile.total_questions_attempted, before + 1);
            prop_assert!(profile.correct_answers <= profile.total_questions_attempted);
            prop_assert!((1..=10).contains(&profile.adaptive_level));
        }
        let distinct: std::collections::BTreeSet<_> = picks.iter().map(|p| p.0).collect();
        prop_assert_eq!(profile.progress_history.len(), distinct.len());
    }

    #[test]
    fn prop_q_update_follows_reward_sign(
        start in -50.0f64..50.0,
        reward in 1.0f64..100.0,
    ) {
        let config = EngineConfig::default();
        let tracker = RlTracker::with_seed(config.rl.clone(), 5);

        let mut seeded = RlState::new(&config.rl);
        seeded.q_table.entry("s".to_string()).or_default().insert(RlAction::Maintain, start);

        let mut up = seeded.clone();
        tracker.update(&mut up, "s", RlAction::Maintain, reward, "terminal");
        let mut down = seeded.clone();
        tracker.update(&mut down, "s", RlAction::Maintain, -reward, "terminal");

        prop_assert!(up.value("s", RlAction::Maintain) > down.value("s", RlAction::Maintain));
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_due_review_beats_empty_filter() {
    let catalog = vec![question(0, Difficulty::Hard)];
    let mut profile = UserProfile::new(0);
    let config = EngineConfig::default();
    profile = update_user_profile(
        &profile,
        &catalog[0],
        &Submission { correct: true, time_spent: 100.0, ..Submission::default() },
        0,
        &config,
    );
    let due = profile.progress_history[0].next_review_at.expect("scheduled");

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let pick = select_next_question(&catalog, &profile, "Loops", due, &config.selector, &mut rng)
        .expect("due review");
    assert_eq!(pick.reason, SelectionReason::DueReview);
    assert_eq!(pick.question.id, "q0");
}

#[test]
fn scenario_four_wrong_submissions_signal_downgrade() {
    let mut log = neuro_algo::WrongSubmissionLog::new();
    for _ in 0..4 {
        log.track_wrong("q0", Some("logic"), 30.0, None);
    }
    assert!(log.should_downgrade_difficulty("q0"));
}
