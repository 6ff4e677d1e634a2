//! Question Selector
//!
//! Passes, first match wins:
//! 1. due review in the topic, lowest concept mastery first
//! 2. unattempted same-tier question tagged with a weak concept
//! 3. unattempted same-tier question
//! 4. first unattempted question in the topic, any tier
//!
//! `None` means the topic is exhausted; the caller recycles the history.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SelectorConfig;
use crate::metrics::concept_average;
use crate::types::{Question, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionReason {
    DueReview,
    WeakConcept,
    Fresh,
    TopicFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub question: &'a Question,
    pub reason: SelectionReason,
}

/// Concepts whose mastery is under the weak threshold
pub fn weak_concepts(profile: &UserProfile, config: &SelectorConfig) -> BTreeSet<String> {
    profile
        .performance_metrics
        .concept_mastery
        .iter()
        .filter(|(_, mastery)| **mastery < config.weak_concept_threshold)
        .map(|(concept, _)| concept.clone())
        .collect()
}

fn due_review<'a>(
    catalog: &'a [Question],
    profile: &UserProfile,
    topic: &str,
    now_ms: i64,
) -> Option<&'a Question> {
    let mastery = &profile.performance_metrics.concept_mastery;
    let mut best: Option<(&Question, f64)> = None;
    for record in &profile.progress_history {
        if record.topic != topic || !record.is_due(now_ms) {
            continue;
        }
        let Some(question) = catalog.iter().find(|q| q.id == record.question_id) else {
            continue;
        };
        let score = concept_average(mastery, &record.concepts);
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((question, score));
        }
    }
    best.map(|(q, _)| q)
}

pub fn select_next_question<'a, R: Rng + ?Sized>(
    catalog: &'a [Question],
    profile: &UserProfile,
    topic: &str,
    now_ms: i64,
    config: &SelectorConfig,
    rng: &mut R,
) -> Option<Selection<'a>> {
    if let Some(question) = due_review(catalog, profile, topic, now_ms) {
        return Some(Selection {
            question,
            reason: SelectionReason::DueReview,
        });
    }

    let tier = profile.current_difficulty;
    let fresh: Vec<&Question> = catalog
        .iter()
        .filter(|q| q.topic == topic && q.difficulty == tier && !profile.has_attempted(&q.id))
        .collect();

    let weak = weak_concepts(profile, config);
    if !weak.is_empty() {
        let targeted: Vec<&Question> = fresh
            .iter()
            .copied()
            .filter(|q| q.tags.iter().any(|t| weak.contains(t)))
            .collect();
        if let Some(&question) = targeted.choose(rng) {
            return Some(Selection {
                question,
                reason: SelectionReason::WeakConcept,
            });
        }
    }

    if let Some(&question) = fresh.choose(rng) {
        return Some(Selection {
            question,
            reason: SelectionReason::Fresh,
        });
    }

    catalog
        .iter()
        .find(|q| q.topic == topic && !profile.has_attempted(&q.id))
        .map(|question| Selection {
            question,
            reason: SelectionReason::TopicFallback,
        })
}

/// Another same-topic, same-tier question, ignoring review state
pub fn select_alternate_question<'a, R: Rng + ?Sized>(
    catalog: &'a [Question],
    profile: &UserProfile,
    topic: &str,
    exclude_id: &str,
    rng: &mut R,
) -> Option<&'a Question> {
    let tier = profile.current_difficulty;
    let candidates: Vec<&Question> = catalog
        .iter()
        .filter(|q| q.topic == topic && q.difficulty == tier && q.id != exclude_id)
        .collect();
    candidates.choose(rng).copied()
}
