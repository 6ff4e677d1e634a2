//! Learning analytics derived after each submission: sessions, weak and
//! strong topics, focus areas, learning style, peak time, mastery estimate.

use std::collections::BTreeMap;

use chrono::{DateTime, Timelike, Utc};

use crate::config::AnalyticsConfig;
use crate::metrics::recent_window;
use crate::sanitize::{mean, safe_ratio};
use crate::types::{
    Difficulty, LearningAnalytics, LearningStyle, PeakTime, PerformanceMetrics, TopicStats,
    UserProfile, UserProgress, MS_PER_DAY,
};

/// Records needed before a learner is classified as anything but steady
const MIN_STYLE_RECORDS: usize = 5;

const MAX_AREAS: usize = 3;
const MAX_FOCUS_AREAS: usize = 5;

fn utc(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

// ==================== Streak ====================

/// Daily streak after an activity at `now_ms`
pub fn next_streak_count(streak: u32, last_activity_ms: i64, now_ms: i64) -> u32 {
    let same_day = match (utc(last_activity_ms), utc(now_ms)) {
        (Some(last), Some(now)) => last.date_naive() == now.date_naive(),
        _ => false,
    };
    if same_day {
        streak.max(1)
    } else if now_ms - last_activity_ms < MS_PER_DAY {
        streak + 1
    } else {
        1
    }
}

// ==================== Topics ====================

fn attempted_topics(stats: &BTreeMap<String, TopicStats>) -> Vec<(&String, &TopicStats)> {
    stats.iter().filter(|(_, s)| s.questions_attempted > 0).collect()
}

/// Lowest-accuracy topics under the strong threshold, at most three
pub fn weak_areas(stats: &BTreeMap<String, TopicStats>, config: &AnalyticsConfig) -> Vec<String> {
    let mut topics = attempted_topics(stats);
    topics.retain(|(_, s)| s.average_accuracy < config.strong_topic_accuracy);
    topics.sort_by(|a, b| a.1.average_accuracy.total_cmp(&b.1.average_accuracy));
    topics.into_iter().take(MAX_AREAS).map(|(t, _)| t.clone()).collect()
}

/// Highest-accuracy topics at or above the strong threshold, at most three
pub fn strong_areas(stats: &BTreeMap<String, TopicStats>, config: &AnalyticsConfig) -> Vec<String> {
    let mut topics = attempted_topics(stats);
    topics.retain(|(_, s)| s.average_accuracy >= config.strong_topic_accuracy);
    topics.sort_by(|a, b| b.1.average_accuracy.total_cmp(&a.1.average_accuracy));
    topics.into_iter().take(MAX_AREAS).map(|(t, _)| t.clone()).collect()
}

pub fn focus_areas(weak: &[String], concept_mastery: &BTreeMap<String, f64>, config: &AnalyticsConfig) -> Vec<String> {
    let mut weak_concepts: Vec<(&String, f64)> = concept_mastery
        .iter()
        .filter(|(_, m)| **m < config.strong_topic_accuracy)
        .map(|(c, m)| (c, *m))
        .collect();
    weak_concepts.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut focus: Vec<String> = Vec::new();
    let candidates = weak.iter().chain(weak_concepts.into_iter().map(|(c, _)| c));
    for area in candidates {
        if focus.len() == MAX_FOCUS_AREAS {
            break;
        }
        if !focus.contains(area) {
            focus.push(area.clone());
        }
    }
    focus
}

/// Topics with enough attempts at mastery, in topic order
pub fn completed_topics(stats: &BTreeMap<String, TopicStats>, config: &AnalyticsConfig) -> Vec<String> {
    stats
        .iter()
        .filter(|(_, s)| {
            s.mastery_level >= config.completion_mastery
                && s.questions_attempted >= config.completion_min_attempts
        })
        .map(|(t, _)| t.clone())
        .collect()
}

// ==================== Learner ====================

pub fn classify_learning_style(metrics: &PerformanceMetrics, history: &[UserProgress]) -> LearningStyle {
    if history.len() < MIN_STYLE_RECORDS {
        return LearningStyle::SteadyLearner;
    }
    let window = recent_window(history, 50);
    let times: Vec<f64> = window.iter().map(|r| r.time_spent).collect();
    let estimates: Vec<f64> = window.iter().map(|r| r.expected_seconds()).collect();
    let on_pace = mean(&times) <= mean(&estimates);

    if metrics.accuracy >= 80.0 && metrics.learning_velocity >= 0.0 && on_pace {
        LearningStyle::FastLearner
    } else if metrics.accuracy < 50.0 || metrics.learning_velocity <= -20.0 {
        LearningStyle::Struggling
    } else {
        LearningStyle::SteadyLearner
    }
}

/// Bucket with the most correct answers by UTC hour
pub fn peak_performance_time(history: &[UserProgress]) -> PeakTime {
    let order = [PeakTime::Morning, PeakTime::Afternoon, PeakTime::Evening, PeakTime::Night];
    let mut counts = [0u32; 4];
    for record in history.iter().filter(|r| r.correct) {
        let Some(at) = utc(record.timestamp) else {
            continue;
        };
        let idx = match at.hour() {
            5..=11 => 0,
            12..=16 => 1,
            17..=21 => 2,
            _ => 3,
        };
        counts[idx] += 1;
    }

    let mut best = None;
    for (i, &count) in counts.iter().enumerate() {
        if count > 0 && best.map_or(true, |b: usize| count > counts[b]) {
            best = Some(i);
        }
    }
    best.map(|i| order[i]).unwrap_or_default()
}

/// Adaptive level 1-10 from accuracy, consistency and tier
pub fn adaptive_level(metrics: &PerformanceMetrics, tier: Difficulty) -> u8 {
    let score = 0.5 * (metrics.accuracy / 100.0)
        + 0.2 * (metrics.consistency / 100.0)
        + 0.3 * (tier.rank() as f64 / 2.0);
    let level = 1.0 + (9.0 * score.clamp(0.0, 1.0)).round();
    level.clamp(1.0, 10.0) as u8
}

pub fn daily_goal(style: LearningStyle) -> u32 {
    match style {
        LearningStyle::Struggling => 3,
        LearningStyle::SteadyLearner => 5,
        LearningStyle::FastLearner => 8,
    }
}

/// `now` plus the days needed to lift every attempted topic to full mastery
pub fn estimated_mastery_date(
    stats: &BTreeMap<String, TopicStats>,
    goal: u32,
    now_ms: i64,
    config: &AnalyticsConfig,
) -> i64 {
    let remaining: f64 = attempted_topics(stats)
        .iter()
        .map(|(_, s)| ((100.0 - s.mastery_level).max(0.0) / 10.0).ceil())
        .sum();
    let days = (safe_ratio(remaining, goal.max(1) as f64).ceil() as i64).clamp(1, config.max_mastery_days);
    now_ms.saturating_add(days * MS_PER_DAY)
}

// ==================== Aggregate ====================

/// Recompute analytics for a profile whose history, topic stats and metrics
/// already reflect the latest submission.
pub fn compute_learning_analytics(
    profile: &UserProfile,
    previous_activity_ms: i64,
    time_spent: f64,
    now_ms: i64,
    config: &AnalyticsConfig,
) -> LearningAnalytics {
    let prev = &profile.learning_analytics;
    let gap_ms = config.session_gap_minutes * 60_000;
    let new_session = prev.sessions_completed == 0 || now_ms - previous_activity_ms > gap_ms;
    let sessions_completed = prev.sessions_completed + u32::from(new_session);
    let total_session_time = prev.total_session_time + time_spent.max(0.0);

    let style = classify_learning_style(&profile.performance_metrics, &profile.progress_history);
    let weak = weak_areas(&profile.topic_stats, config);
    let focus = focus_areas(&weak, &profile.performance_metrics.concept_mastery, config);

    LearningAnalytics {
        total_session_time,
        sessions_completed,
        average_session_duration: safe_ratio(total_session_time, sessions_completed as f64),
        peak_performance_time: peak_performance_time(&profile.progress_history),
        strong_areas: strong_areas(&profile.topic_stats, config),
        weak_areas: weak,
        recommended_focus_areas: focus,
        estimated_mastery_date: estimated_mastery_date(&profile.topic_stats, daily_goal(style), now_ms, config),
        learning_style: style,
    }
}
