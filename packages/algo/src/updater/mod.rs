//! Profile Updater
//!
//! One submission in, one new profile out. The input profile is never
//! mutated; callers replace the aggregate they hold.
//!
//! Order of work:
//! 1. locate or create the progress record, append the attempt and move it
//!    to the tail so the history stays ordered by last attempt
//! 2. totals
//! 3. on a correct answer: schedule the next review and re-run the policy
//! 4. topic stats, metrics, streak, analytics
//!
//! Incorrect answers leave review scheduling and the tier alone; the wrong
//! streak is tracked by `WrongSubmissionLog` in the caller.

use serde::{Deserialize, Serialize};

use crate::analytics::{
    adaptive_level, completed_topics, compute_learning_analytics, daily_goal, next_streak_count,
};
use crate::config::EngineConfig;
use crate::difficulty::calculate_next_difficulty;
use crate::metrics::calculate_performance_metrics;
use crate::rl::{RlState, RlStep, RlTracker};
use crate::sanitize::{clamp_percent, safe_ratio, sanitize_seconds};
use crate::scheduler::next_review_at;
use crate::types::{
    AttemptRecord, Question, UserProfile, UserProgress, DEFAULT_CONFIDENCE, MASTERY_SCALE,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub correct: bool,
    /// Seconds
    pub time_spent: f64,
    #[serde(default)]
    pub submitted_code: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub error_type: Option<String>,
    /// Falls back to the question's tags when absent or empty
    #[serde(default)]
    pub concepts: Option<Vec<String>>,
    #[serde(default)]
    pub solution_viewed: bool,
    #[serde(default)]
    pub hints_used: u32,
}

fn upsert_progress(
    profile: &mut UserProfile,
    question: &Question,
    submission: &Submission,
    time_spent: f64,
    concepts: Vec<String>,
    now_ms: i64,
) -> usize {
    let confidence = clamp_percent(submission.confidence.unwrap_or(DEFAULT_CONFIDENCE));
    let error_type = if submission.correct {
        None
    } else {
        submission.error_type.clone()
    };
    let attempt = AttemptRecord {
        correct: submission.correct,
        time_spent,
    };

    if let Some(idx) = profile
        .progress_history
        .iter()
        .position(|p| p.question_id == question.id)
    {
        let record = &mut profile.progress_history[idx];
        record.attempts += 1;
        record.time_spent += (time_spent - record.time_spent) / record.attempts as f64;
        record.correct = submission.correct;
        record.submitted_code = submission.submitted_code.clone();
        record.timestamp = now_ms;
        record.difficulty = question.difficulty;
        record.confidence = confidence;
        record.hints_used += submission.hints_used;
        record.concepts = concepts;
        record.error_type = error_type;
        record.attempt_sequence.push(attempt);
        if submission.solution_viewed && !record.solution_viewed {
            record.solution_viewed = true;
            record.solution_viewed_at = Some(now_ms);
        }
        record.estimated_time = question.expected_seconds();
        let record = profile.progress_history.remove(idx);
        profile.progress_history.push(record);
        return profile.progress_history.len() - 1;
    }

    profile.progress_history.push(UserProgress {
        question_id: question.id.clone(),
        topic: question.topic.clone(),
        attempts: 1,
        time_spent,
        correct: submission.correct,
        submitted_code: submission.submitted_code.clone(),
        timestamp: now_ms,
        next_review_at: None,
        review_count: 0,
        difficulty: question.difficulty,
        confidence,
        hints_used: submission.hints_used,
        concepts,
        error_type,
        time_to_first_attempt: time_spent,
        attempt_sequence: vec![attempt],
        solution_viewed: submission.solution_viewed,
        solution_viewed_at: submission.solution_viewed.then_some(now_ms),
        estimated_time: question.expected_seconds(),
    });
    profile.progress_history.len() - 1
}

fn update_topic_stats(
    profile: &mut UserProfile,
    question: &Question,
    correct: bool,
    time_spent: f64,
    concepts: &[String],
    now_ms: i64,
) {
    let stats = profile.topic_stats.entry(question.topic.clone()).or_default();
    stats.questions_attempted += 1;
    if correct {
        stats.questions_correct += 1;
    }
    let attempted = stats.questions_attempted as f64;
    stats.average_accuracy =
        clamp_percent(safe_ratio(stats.questions_correct as f64, attempted) * 100.0);
    stats.average_time += (time_spent - stats.average_time) / attempted;
    stats.mastery_level = (stats.average_accuracy * MASTERY_SCALE).min(100.0);
    for concept in concepts {
        let tally = stats.concept_breakdown.entry(concept.clone()).or_default();
        tally.attempted += 1;
        if correct {
            tally.correct += 1;
        }
    }
    *stats.difficulty_attempts.entry(question.difficulty).or_insert(0) += 1;
    stats.last_attempt_at = now_ms;
}

pub fn update_user_profile(
    profile: &UserProfile,
    question: &Question,
    submission: &Submission,
    now_ms: i64,
    config: &EngineConfig,
) -> UserProfile {
    let mut next = profile.clone();
    let time_spent = sanitize_seconds(submission.time_spent);
    let concepts = match &submission.concepts {
        Some(c) if !c.is_empty() => c.clone(),
        _ => question.tags.clone(),
    };
    let previous_activity = profile.last_activity_at;

    let idx = upsert_progress(&mut next, question, submission, time_spent, concepts.clone(), now_ms);

    next.total_questions_attempted += 1;
    if submission.correct {
        next.correct_answers += 1;
    }
    next.total_time_spent += time_spent;
    next.average_time_per_question = safe_ratio(
        next.total_time_spent,
        next.total_questions_attempted as f64,
    );

    if submission.correct {
        let review_count = next.progress_history[idx].review_count;
        let due = next_review_at(review_count, &next.progress_history, now_ms, &config.scheduler);
        let record = &mut next.progress_history[idx];
        record.next_review_at = Some(due);
        record.review_count += 1;
    }

    update_topic_stats(&mut next, question, submission.correct, time_spent, &concepts, now_ms);
    next.performance_metrics = calculate_performance_metrics(&next.progress_history, &config.metrics);

    if submission.correct {
        next.current_difficulty = calculate_next_difficulty(&next, &config.metrics, &config.policy);
    }

    next.streak_count = next_streak_count(profile.streak_count, previous_activity, now_ms);
    next.last_activity_at = now_ms;
    next.topics_completed = completed_topics(&next.topic_stats, &config.analytics);

    let analytics =
        compute_learning_analytics(&next, previous_activity, time_spent, now_ms, &config.analytics);
    next.learning_style = analytics.learning_style;
    next.recommended_daily_goal = daily_goal(analytics.learning_style);
    next.learning_analytics = analytics;
    next.adaptive_level = adaptive_level(&next.performance_metrics, next.current_difficulty);
    next.last_analytics_update = now_ms;

    next
}

/// Same as `update_user_profile`, then one Q-learning episode on the
/// before/after pair. The returned step carries the tracker's suggested tier;
/// the profile keeps the policy's tier.
pub fn update_user_profile_with_rl(
    profile: &UserProfile,
    question: &Question,
    submission: &Submission,
    now_ms: i64,
    config: &EngineConfig,
    rl_state: &mut RlState,
    tracker: &mut RlTracker,
) -> (UserProfile, RlStep) {
    let updated = update_user_profile(profile, question, submission, now_ms, config);
    let step = tracker.step(
        rl_state,
        profile,
        &updated,
        &question.topic,
        submission.correct,
        sanitize_seconds(submission.time_spent),
    );
    (updated, step)
}
