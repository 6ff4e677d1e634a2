//! Performance Metrics Calculator
//!
//! Derives accuracy, speed, consistency, learning velocity, confidence,
//! error patterns and concept mastery from the most recent progress records.
//!
//! All values are percentages except speed, which is a capped throughput
//! proxy. An empty window yields zeros with the default confidence of 50.

use std::collections::BTreeMap;

use crate::config::MetricsConfig;
use crate::sanitize::{clamp_percent, clamp_signed_percent, mean, safe_ratio, variance};
use crate::types::{PerformanceMetrics, UserProgress, DEFAULT_CONFIDENCE};

/// Tail of `history` holding at most `n` records
pub fn recent_window(history: &[UserProgress], n: usize) -> &[UserProgress] {
    let start = history.len().saturating_sub(n);
    &history[start..]
}

/// Share of records whose latest attempt was correct, in percent
pub fn accuracy_of(records: &[UserProgress]) -> f64 {
    let correct = records.iter().filter(|r| r.correct).count() as f64;
    clamp_percent(safe_ratio(correct, records.len() as f64) * 100.0)
}

pub fn calculate_performance_metrics(
    history: &[UserProgress],
    config: &MetricsConfig,
) -> PerformanceMetrics {
    let window = recent_window(history, config.window);
    if window.is_empty() {
        return PerformanceMetrics::default();
    }

    PerformanceMetrics {
        accuracy: accuracy_of(window),
        speed: speed(window),
        consistency: consistency(window, config.consistency_chunk),
        learning_velocity: learning_velocity(window),
        confidence_level: average_confidence(window),
        error_patterns: error_patterns(window),
        concept_mastery: concept_mastery(window),
    }
}

/// Attempts per hour of recorded solve time, times 100, capped at 100
fn speed(window: &[UserProgress]) -> f64 {
    let hours: f64 = window.iter().map(|r| r.time_spent.max(0.0)).sum::<f64>() / 3600.0;
    clamp_percent(safe_ratio(window.len() as f64, hours) * 100.0)
}

/// 100 minus the standard deviation of per-chunk accuracy
fn consistency(window: &[UserProgress], chunk: usize) -> f64 {
    let chunk_accuracies: Vec<f64> = window.chunks(chunk.max(1)).map(accuracy_of).collect();
    (100.0 - variance(&chunk_accuracies).sqrt()).max(0.0)
}

/// Second-half accuracy minus first-half accuracy
fn learning_velocity(window: &[UserProgress]) -> f64 {
    if window.len() < 2 {
        return 0.0;
    }
    let (first, second) = window.split_at(window.len() / 2);
    clamp_signed_percent(accuracy_of(second) - accuracy_of(first))
}

fn average_confidence(window: &[UserProgress]) -> f64 {
    if window.is_empty() {
        return DEFAULT_CONFIDENCE;
    }
    let values: Vec<f64> = window.iter().map(|r| r.confidence).collect();
    clamp_percent(mean(&values))
}

fn error_patterns(window: &[UserProgress]) -> BTreeMap<String, u32> {
    let mut patterns = BTreeMap::new();
    for record in window.iter().filter(|r| !r.correct) {
        if let Some(ref kind) = record.error_type {
            *patterns.entry(kind.clone()).or_insert(0) += 1;
        }
    }
    patterns
}

fn concept_mastery(window: &[UserProgress]) -> BTreeMap<String, f64> {
    let mut tallies: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for record in window {
        for concept in &record.concepts {
            let entry = tallies.entry(concept.as_str()).or_insert((0, 0));
            entry.1 += 1;
            if record.correct {
                entry.0 += 1;
            }
        }
    }

    tallies
        .into_iter()
        .map(|(concept, (correct, attempted))| {
            (
                concept.to_string(),
                clamp_percent(safe_ratio(correct as f64, attempted as f64) * 100.0),
            )
        })
        .collect()
}

/// Mean mastery over the given concepts that have a recorded value
pub fn concept_average(mastery: &BTreeMap<String, f64>, concepts: &[String]) -> f64 {
    let known: Vec<f64> = concepts
        .iter()
        .filter_map(|c| mastery.get(c).copied())
        .collect();
    mean(&known)
}
