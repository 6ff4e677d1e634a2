//! Per-question consecutive wrong submission log.
//!
//! Drives the hint / downgrade / skip signals the service reports alongside
//! each incorrect submission.

use serde::{Deserialize, Serialize};

pub const HINT_THRESHOLD: u32 = 2;
pub const DOWNGRADE_THRESHOLD: u32 = 4;
pub const SKIP_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongSubmissionContext {
    pub question_id: String,
    pub attempts: u32,
    pub consecutive_wrongs: u32,
    #[serde(default)]
    pub last_error_type: Option<String>,
    pub time_spent_total: f64,
    #[serde(default)]
    pub hints: Vec<String>,
}

impl WrongSubmissionContext {
    fn new(question_id: &str) -> Self {
        Self {
            question_id: question_id.to_string(),
            attempts: 0,
            consecutive_wrongs: 0,
            last_error_type: None,
            time_spent_total: 0.0,
            hints: Vec::new(),
        }
    }
}

/// Signals derived from a context, serialized in submission responses
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongStreakSignals {
    pub consecutive_wrongs: u32,
    pub provide_hint: bool,
    pub downgrade_difficulty: bool,
    pub skip_question: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WrongSubmissionLog {
    contexts: Vec<WrongSubmissionContext>,
}

impl WrongSubmissionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, question_id: &str) -> Option<&WrongSubmissionContext> {
        self.contexts.iter().find(|c| c.question_id == question_id)
    }

    pub fn contexts(&self) -> &[WrongSubmissionContext] {
        &self.contexts
    }

    pub fn track_wrong(
        &mut self,
        question_id: &str,
        error_type: Option<&str>,
        time_spent: f64,
        hint: Option<&str>,
    ) -> &WrongSubmissionContext {
        let idx = match self.contexts.iter().position(|c| c.question_id == question_id) {
            Some(idx) => idx,
            None => {
                self.contexts.push(WrongSubmissionContext::new(question_id));
                self.contexts.len() - 1
            }
        };
        let context = &mut self.contexts[idx];
        context.attempts += 1;
        context.consecutive_wrongs += 1;
        if let Some(kind) = error_type {
            context.last_error_type = Some(kind.to_string());
        }
        context.time_spent_total += time_spent.max(0.0);
        if let Some(hint) = hint {
            context.hints.push(hint.to_string());
        }
        &self.contexts[idx]
    }

    /// Called after a correct submission
    pub fn reset_streak(&mut self, question_id: &str) {
        if let Some(context) = self.contexts.iter_mut().find(|c| c.question_id == question_id) {
            context.consecutive_wrongs = 0;
        }
    }

    pub fn clear(&mut self) {
        self.contexts.clear();
    }

    fn streak(&self, question_id: &str) -> u32 {
        self.get(question_id).map_or(0, |c| c.consecutive_wrongs)
    }

    pub fn should_provide_hint(&self, question_id: &str) -> bool {
        self.streak(question_id) >= HINT_THRESHOLD
    }

    pub fn should_downgrade_difficulty(&self, question_id: &str) -> bool {
        self.streak(question_id) >= DOWNGRADE_THRESHOLD
    }

    pub fn should_skip_question(&self, question_id: &str) -> bool {
        self.streak(question_id) >= SKIP_THRESHOLD
    }

    pub fn adaptive_message(&self, question_id: &str) -> &'static str {
        match self.streak(question_id) {
            0 => "",
            1 => "Not quite. Give it another try.",
            2 => "Still failing. Hint: trace the control flow line by line.",
            3 => "Try a different approach and split the problem into smaller steps.",
            4 => "This one is tough. An easier problem might help.",
            _ => "Move on for now and come back to this problem later.",
        }
    }

    pub fn signals(&self, question_id: &str) -> WrongStreakSignals {
        WrongStreakSignals {
            consecutive_wrongs: self.streak(question_id),
            provide_hint: self.should_provide_hint(question_id),
            downgrade_difficulty: self.should_downgrade_difficulty(question_id),
            skip_question: self.should_skip_question(question_id),
            message: self.adaptive_message(question_id).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        let mut log = WrongSubmissionLog::new();
        assert!(!log.should_provide_hint("q1"));
        assert_eq!(log.adaptive_message("q1"), "");

        for _ in 0..2 {
            log.track_wrong("q1", Some("logic"), 30.0, None);
        }
        assert!(log.should_provide_hint("q1"));
        assert!(!log.should_downgrade_difficulty("q1"));

        for _ in 0..2 {
            log.track_wrong("q1", Some("logic"), 30.0, None);
        }
        assert!(log.should_downgrade_difficulty("q1"));
        assert!(!log.should_skip_question("q1"));

        log.track_wrong("q1", None, 30.0, Some("use a loop"));
        assert!(log.should_skip_question("q1"));

        let context = log.get("q1").expect("tracked");
        assert_eq!(context.attempts, 5);
        assert_eq!(context.time_spent_total, 150.0);
        assert_eq!(context.last_error_type.as_deref(), Some("logic"));
        assert_eq!(context.hints, vec!["use a loop"]);
    }

    #[test]
    fn test_reset_keeps_attempts() {
        let mut log = WrongSubmissionLog::new();
        log.track_wrong("q1", None, 10.0, None);
        log.track_wrong("q1", None, 10.0, None);
        log.reset_streak("q1");

        let signals = log.signals("q1");
        assert_eq!(signals.consecutive_wrongs, 0);
        assert!(!signals.provide_hint);
        assert_eq!(log.get("q1").map(|c| c.attempts), Some(2));
    }

    #[test]
    fn test_questions_tracked_independently() {
        let mut log = WrongSubmissionLog::new();
        for _ in 0..4 {
            log.track_wrong("a", None, 1.0, None);
        }
        log.track_wrong("b", None, 1.0, None);
        assert!(log.signals("a").downgrade_difficulty);
        assert!(!log.signals("b").provide_hint);
        assert_eq!(log.contexts().len(), 2);
    }

    #[test]
    fn test_serializes_as_list() {
        let mut log = WrongSubmissionLog::new();
        log.track_wrong("a", Some("syntax"), 1.0, None);
        let json = serde_json::to_value(&log).expect("serialize");
        assert!(json.is_array());
        assert_eq!(json[0]["consecutiveWrongs"], 1);
        let back: WrongSubmissionLog = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, log);
    }
}
