//! Spaced-Repetition Scheduler
//!
//! Interval table indexed by review count (0.5, 1, 3, 7, 14, 30, 90 days),
//! clamped to the last entry, scaled by recent accuracy.

use crate::config::SchedulerConfig;
use crate::metrics::{accuracy_of, recent_window};
use crate::types::{UserProgress, MS_PER_DAY};

/// Base interval in days for the given review count
pub fn review_interval_days(review_count: u32, config: &SchedulerConfig) -> f64 {
    let table = &config.intervals_days;
    if table.is_empty() {
        return 1.0;
    }
    let idx = (review_count as usize).min(table.len() - 1);
    table[idx]
}

pub fn accuracy_multiplier(recent_accuracy: f64, config: &SchedulerConfig) -> f64 {
    if recent_accuracy > config.high_accuracy {
        config.high_accuracy_multiplier
    } else if recent_accuracy < config.low_accuracy {
        config.low_accuracy_multiplier
    } else {
        1.0
    }
}

/// Epoch millis of the next review, always strictly after `now_ms`
pub fn next_review_at(
    review_count: u32,
    history: &[UserProgress],
    now_ms: i64,
    config: &SchedulerConfig,
) -> i64 {
    let accuracy = accuracy_of(recent_window(history, config.accuracy_window));
    let days = review_interval_days(review_count, config) * accuracy_multiplier(accuracy, config);
    let offset = (days * MS_PER_DAY as f64).round();
    let offset = if offset.is_finite() { offset as i64 } else { MS_PER_DAY };
    now_ms.saturating_add(offset.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Difficulty;

    fn record(correct: bool) -> UserProgress {
        UserProgress {
            question_id: "q".to_string(),
            topic: "basics".to_string(),
            attempts: 1,
            time_spent: 60.0,
            correct,
            submitted_code: String::new(),
            timestamp: 0,
            next_review_at: None,
            review_count: 0,
            difficulty: Difficulty::Easy,
            confidence: 50.0,
            hints_used: 0,
            concepts: Vec::new(),
            error_type: None,
            time_to_first_attempt: 60.0,
            attempt_sequence: Vec::new(),
            solution_viewed: false,
            solution_viewed_at: None,
            estimated_time: 300.0,
        }
    }

    #[test]
    fn test_interval_table_clamps() {
        let config = SchedulerConfig::default();
        assert_eq!(review_interval_days(0, &config), 0.5);
        assert_eq!(review_interval_days(3, &config), 7.0);
        assert_eq!(review_interval_days(6, &config), 90.0);
        assert_eq!(review_interval_days(40, &config), 90.0);
    }

    #[test]
    fn test_accuracy_multiplier() {
        let config = SchedulerConfig::default();
        assert_eq!(accuracy_multiplier(95.0, &config), 1.5);
        assert_eq!(accuracy_multiplier(90.0, &config), 1.0);
        assert_eq!(accuracy_multiplier(59.0, &config), 0.5);
    }

    #[test]
    fn test_next_review_uses_multiplier() {
        let config = SchedulerConfig::default();
        let now = 1_000_000;

        let strong: Vec<_> = (0..10).map(|_| record(true)).collect();
        assert_eq!(next_review_at(1, &strong, now, &config), now + MS_PER_DAY * 3 / 2);

        let mixed: Vec<_> = (0..10).map(|i| record(i % 4 != 0)).collect();
        assert_eq!(next_review_at(1, &mixed, now, &config), now + MS_PER_DAY);

        let weak: Vec<_> = (0..10).map(|i| record(i == 0)).collect();
        assert_eq!(next_review_at(2, &weak, now, &config), now + MS_PER_DAY * 3 / 2);
    }

    #[test]
    fn test_next_review_in_future_with_empty_history() {
        let config = SchedulerConfig::default();
        let now = 42;
        assert!(next_review_at(0, &[], now, &config) > now);
    }
}
