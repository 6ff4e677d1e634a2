//! Difficulty Policy
//!
//! Deterministic tier transition from recent performance. A weighted base
//! score (accuracy, speed, consistency, positive velocity) is scaled by three
//! independent multipliers and compared against tier-specific thresholds:
//!
//! | from   | to     | condition      |
//! |--------|--------|----------------|
//! | easy   | medium | score >= 0.80  |
//! | medium | hard   | score >= 0.85  |
//! | medium | easy   | score <  0.55  |
//! | hard   | medium | score <  0.60  |
//!
//! Profiles with fewer than five progress records always get `Easy`.

use serde::{Deserialize, Serialize};

use crate::config::{MetricsConfig, PolicyConfig};
use crate::metrics::{accuracy_of, calculate_performance_metrics, recent_window};
use crate::sanitize::{mean, safe_ratio};
use crate::types::{Difficulty, UserProfile, UserProgress};

/// Trailing run of identical outcomes at the end of the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streak {
    pub correct: u32,
    pub wrong: u32,
}

pub fn trailing_streak(history: &[UserProgress]) -> Streak {
    let mut streak = Streak::default();
    let Some(last) = history.last() else {
        return streak;
    };
    let run = history
        .iter()
        .rev()
        .take_while(|r| r.correct == last.correct)
        .count() as u32;
    if last.correct {
        streak.correct = run;
    } else {
        streak.wrong = run;
    }
    streak
}

pub fn streak_multiplier(history: &[UserProgress]) -> f64 {
    let streak = trailing_streak(history);
    match streak {
        Streak { correct, .. } if correct >= 5 => 1.3,
        Streak { correct, .. } if correct >= 3 => 1.15,
        Streak { correct, .. } if correct >= 1 => 1.05,
        Streak { wrong, .. } if wrong >= 3 => 0.7,
        Streak { wrong, .. } if wrong >= 2 => 0.85,
        _ => 1.0,
    }
}

/// Penalises solve times well over the estimate, rewards fast accurate work
pub fn time_multiplier(recent: &[UserProgress]) -> f64 {
    if recent.is_empty() {
        return 1.0;
    }
    let times: Vec<f64> = recent.iter().map(|r| r.time_spent.max(0.0)).collect();
    let estimates: Vec<f64> = recent.iter().map(|r| r.expected_seconds()).collect();
    let ratio = safe_ratio(mean(&times), mean(&estimates));
    let accuracy = accuracy_of(recent);

    if ratio > 2.0 {
        0.8
    } else if ratio > 1.5 {
        0.9
    } else if accuracy > 80.0 && ratio < 0.7 {
        1.2
    } else {
        1.0
    }
}

pub fn confidence_multiplier(recent: &[UserProgress]) -> f64 {
    if recent.is_empty() {
        return 1.0;
    }
    let values: Vec<f64> = recent.iter().map(|r| r.confidence).collect();
    let confidence = mean(&values);

    if confidence < 30.0 {
        0.75
    } else if confidence < 50.0 {
        0.9
    } else if confidence > 80.0 {
        1.2
    } else if confidence > 70.0 {
        1.1
    } else {
        1.0
    }
}

/// Weighted base score in [0, 1] before multipliers
pub fn base_score(history: &[UserProgress], metrics: &MetricsConfig, policy: &PolicyConfig) -> f64 {
    let m = calculate_performance_metrics(history, metrics);
    let w = &policy.weights;
    w.accuracy * (m.accuracy / 100.0)
        + w.speed * (m.speed / 100.0)
        + w.consistency * (m.consistency / 100.0)
        + w.velocity * (m.learning_velocity.max(0.0) / 100.0)
}

pub fn difficulty_score(profile: &UserProfile, metrics: &MetricsConfig, policy: &PolicyConfig) -> f64 {
    let history = &profile.progress_history;
    let recent = recent_window(history, policy.recent_window);
    base_score(history, metrics, policy)
        * streak_multiplier(history)
        * time_multiplier(recent)
        * confidence_multiplier(recent)
}

pub fn calculate_next_difficulty(
    profile: &UserProfile,
    metrics: &MetricsConfig,
    policy: &PolicyConfig,
) -> Difficulty {
    if profile.progress_history.len() < policy.min_attempts {
        return Difficulty::Easy;
    }

    let score = difficulty_score(profile, metrics, policy);
    match profile.current_difficulty {
        Difficulty::Easy if score >= policy.easy_to_medium => Difficulty::Medium,
        Difficulty::Medium if score >= policy.medium_to_hard => Difficulty::Hard,
        Difficulty::Medium if score < policy.medium_to_easy => Difficulty::Easy,
        Difficulty::Hard if score < policy.hard_to_medium => Difficulty::Medium,
        current => current,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Momentum {
    pub trend: Trend,
    /// Newer-half accuracy minus older-half accuracy over the last 10 records
    pub delta: f64,
}

pub fn performance_momentum(profile: &UserProfile) -> Momentum {
    let recent = recent_window(&profile.progress_history, 10);
    if recent.len() < 2 {
        return Momentum {
            trend: Trend::Stable,
            delta: 0.0,
        };
    }
    let (older, newer) = recent.split_at(recent.len() / 2);
    let delta = accuracy_of(newer) - accuracy_of(older);
    let trend = if delta > 10.0 {
        Trend::Improving
    } else if delta < -10.0 {
        Trend::Declining
    } else {
        Trend::Stable
    };
    Momentum { trend, delta }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: usize, correct: bool, time_spent: f64, confidence: f64) -> UserProgress {
        UserProgress {
            question_id: format!("q{id}"),
            topic: "basics".to_string(),
            attempts: 1,
            time_spent,
            correct,
            submitted_code: String::new(),
            timestamp: 0,
            next_review_at: None,
            review_count: 0,
            difficulty: Difficulty::Easy,
            confidence,
            hints_used: 0,
            concepts: Vec::new(),
            error_type: None,
            time_to_first_attempt: time_spent,
            attempt_sequence: Vec::new(),
            solution_viewed: false,
            solution_viewed_at: None,
            estimated_time: 300.0,
        }
    }

    fn profile_with(history: Vec<UserProgress>, tier: Difficulty) -> UserProfile {
        let mut profile = UserProfile::new(0);
        profile.current_difficulty = tier;
        profile.progress_history = history;
        profile
    }

    fn next(profile: &UserProfile) -> Difficulty {
        calculate_next_difficulty(profile, &MetricsConfig::default(), &PolicyConfig::default())
    }

    #[test]
    fn test_too_few_attempts_is_easy() {
        let history: Vec<_> = (0..4).map(|i| record(i, true, 60.0, 95.0)).collect();
        assert_eq!(next(&profile_with(history, Difficulty::Hard)), Difficulty::Easy);
    }

    #[test]
    fn test_streak_multiplier_ordering() {
        let winning: Vec<_> = (0..5).map(|i| record(i, true, 60.0, 50.0)).collect();
        let losing: Vec<_> = (0..3).map(|i| record(i, false, 60.0, 50.0)).collect();
        let single_wrong = vec![record(0, true, 60.0, 50.0), record(1, false, 60.0, 50.0)];

        assert_eq!(streak_multiplier(&winning), 1.3);
        assert_eq!(streak_multiplier(&losing), 0.7);
        assert_eq!(streak_multiplier(&single_wrong), 1.0);
        assert_eq!(streak_multiplier(&[]), 1.0);
    }

    #[test]
    fn test_trailing_streak_counts_run() {
        let history = vec![
            record(0, false, 60.0, 50.0),
            record(1, true, 60.0, 50.0),
            record(2, true, 60.0, 50.0),
        ];
        assert_eq!(trailing_streak(&history), Streak { correct: 2, wrong: 0 });
    }

    #[test]
    fn test_time_multiplier_bands() {
        let slow: Vec<_> = (0..5).map(|i| record(i, true, 700.0, 50.0)).collect();
        assert_eq!(time_multiplier(&slow), 0.8);
        let sluggish: Vec<_> = (0..5).map(|i| record(i, true, 500.0, 50.0)).collect();
        assert_eq!(time_multiplier(&sluggish), 0.9);
        let quick: Vec<_> = (0..5).map(|i| record(i, true, 100.0, 50.0)).collect();
        assert_eq!(time_multiplier(&quick), 1.2);
        let quick_but_wrong: Vec<_> = (0..5).map(|i| record(i, i % 2 == 0, 100.0, 50.0)).collect();
        assert_eq!(time_multiplier(&quick_but_wrong), 1.0);
    }

    #[test]
    fn test_confidence_multiplier_bands() {
        let bands = [(20.0, 0.75), (40.0, 0.9), (60.0, 1.0), (75.0, 1.1), (90.0, 1.2)];
        for (confidence, expected) in bands {
            let recent = vec![record(0, true, 60.0, confidence)];
            assert_eq!(confidence_multiplier(&recent), expected, "confidence {confidence}");
        }
    }

    #[test]
    fn test_consecutive_fast_correct_moves_to_medium() {
        let history: Vec<_> = (0..10).map(|i| record(i, true, 120.0, 90.0)).collect();
        assert_eq!(next(&profile_with(history, Difficulty::Easy)), Difficulty::Medium);
    }

    #[test]
    fn test_alternating_stays_easy() {
        let history: Vec<_> = (0..10).map(|i| record(i, i % 2 == 0, 120.0, 50.0)).collect();
        assert_eq!(next(&profile_with(history, Difficulty::Easy)), Difficulty::Easy);
    }

    #[test]
    fn test_hard_drops_to_medium_on_failures() {
        let history: Vec<_> = (0..10).map(|i| record(i, i < 3, 1000.0, 20.0)).collect();
        assert_eq!(next(&profile_with(history, Difficulty::Hard)), Difficulty::Medium);
    }

    #[test]
    fn test_no_skip_from_easy_to_hard() {
        let history: Vec<_> = (0..20).map(|i| record(i, true, 30.0, 100.0)).collect();
        assert_eq!(next(&profile_with(history, Difficulty::Easy)), Difficulty::Medium);
    }

    #[test]
    fn test_momentum_detects_improvement() {
        let history: Vec<_> = (0..10).map(|i| record(i, i >= 5, 60.0, 50.0)).collect();
        let momentum = performance_momentum(&profile_with(history, Difficulty::Easy));
        assert_eq!(momentum.trend, Trend::Improving);
        assert_eq!(momentum.delta, 100.0);
    }
}
