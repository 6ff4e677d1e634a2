//! Common Types and Constants
//!
//! Shared data structures used across all scoring modules. Field names are
//! serialized in camelCase so persisted blobs keep the shape the practice UI
//! reads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==================== Constants ====================

/// Milliseconds per hour
pub const MS_PER_HOUR: i64 = 3_600_000;

/// Milliseconds per day
pub const MS_PER_DAY: i64 = 86_400_000;

/// Confidence assumed when the learner gives none
pub const DEFAULT_CONFIDENCE: f64 = 50.0;

/// Topic mastery = accuracy scaled by this factor, capped at 100
pub const MASTERY_SCALE: f64 = 1.2;

// ==================== Question Catalog ====================

/// Difficulty tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn harder(&self) -> Self {
        match self {
            Self::Easy => Self::Medium,
            _ => Self::Hard,
        }
    }

    pub fn easier(&self) -> Self {
        match self {
            Self::Hard => Self::Medium,
            _ => Self::Easy,
        }
    }

    /// 0 for easy, 1 for medium, 2 for hard
    pub fn rank(&self) -> u8 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }

    /// Reward scale for a correct answer at this tier
    pub fn reward_multiplier(&self) -> f64 {
        match self {
            Self::Easy => 1.0,
            Self::Medium => 1.5,
            Self::Hard => 2.0,
        }
    }

    /// Target solve time in seconds
    pub fn target_seconds(&self) -> f64 {
        match self {
            Self::Easy => 300.0,
            Self::Medium => 600.0,
            Self::Hard => 900.0,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exercise format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    #[default]
    CodeWriting,
    CodeCompletion,
    Debugging,
    OutputPrediction,
}

/// One (input, expected output) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

/// Immutable catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub topic: String,
    #[serde(default)]
    pub subtopic: String,
    pub difficulty: Difficulty,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub starter_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_code: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Estimated solve time in seconds
    pub estimated_time: f64,
}

impl Question {
    /// Estimated time, falling back to the tier target when unset
    pub fn expected_seconds(&self) -> f64 {
        if self.estimated_time > 0.0 && self.estimated_time.is_finite() {
            self.estimated_time
        } else {
            self.difficulty.target_seconds()
        }
    }
}

// ==================== Progress ====================

/// One submission inside a progress record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub correct: bool,
    pub time_spent: f64,
}

/// Live record for one question (at most one per question id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub question_id: String,
    #[serde(default)]
    pub topic: String,
    pub attempts: u32,
    /// Mean seconds per attempt
    pub time_spent: f64,
    /// Outcome of the most recent attempt
    pub correct: bool,
    #[serde(default)]
    pub submitted_code: String,
    /// Epoch millis of the most recent attempt
    pub timestamp: i64,
    #[serde(default)]
    pub next_review_at: Option<i64>,
    #[serde(default)]
    pub review_count: u32,
    pub difficulty: Difficulty,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub hints_used: u32,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub time_to_first_attempt: f64,
    #[serde(default)]
    pub attempt_sequence: Vec<AttemptRecord>,
    #[serde(default)]
    pub solution_viewed: bool,
    #[serde(default)]
    pub solution_viewed_at: Option<i64>,
    /// Question estimate copied at attempt time, used by the time multiplier
    #[serde(default)]
    pub estimated_time: f64,
}

impl UserProgress {
    pub fn expected_seconds(&self) -> f64 {
        if self.estimated_time > 0.0 && self.estimated_time.is_finite() {
            self.estimated_time
        } else {
            self.difficulty.target_seconds()
        }
    }

    pub fn is_due(&self, now_ms: i64) -> bool {
        self.next_review_at.is_some_and(|at| at <= now_ms)
    }
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

// ==================== Aggregates ====================

/// Correct / attempted tally for one concept
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptTally {
    pub correct: u32,
    pub attempted: u32,
}

/// Per-topic aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStats {
    pub questions_attempted: u32,
    pub questions_correct: u32,
    pub average_accuracy: f64,
    pub average_time: f64,
    pub mastery_level: f64,
    #[serde(default)]
    pub concept_breakdown: BTreeMap<String, ConceptTally>,
    #[serde(default)]
    pub difficulty_attempts: BTreeMap<Difficulty, u32>,
    pub last_attempt_at: i64,
}

/// Derived snapshot, recomputed after every submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub accuracy: f64,
    pub speed: f64,
    pub consistency: f64,
    pub learning_velocity: f64,
    pub confidence_level: f64,
    #[serde(default)]
    pub error_patterns: BTreeMap<String, u32>,
    #[serde(default)]
    pub concept_mastery: BTreeMap<String, f64>,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            accuracy: 0.0,
            speed: 0.0,
            consistency: 0.0,
            learning_velocity: 0.0,
            confidence_level: DEFAULT_CONFIDENCE,
            error_patterns: BTreeMap::new(),
            concept_mastery: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LearningStyle {
    FastLearner,
    #[default]
    SteadyLearner,
    Struggling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakTime {
    Morning,
    #[default]
    Afternoon,
    Evening,
    Night,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningAnalytics {
    /// Seconds across all sessions
    pub total_session_time: f64,
    pub sessions_completed: u32,
    pub average_session_duration: f64,
    pub peak_performance_time: PeakTime,
    pub weak_areas: Vec<String>,
    pub strong_areas: Vec<String>,
    pub recommended_focus_areas: Vec<String>,
    pub estimated_mastery_date: i64,
    pub learning_style: LearningStyle,
}

impl LearningAnalytics {
    pub fn new(now_ms: i64) -> Self {
        Self {
            total_session_time: 0.0,
            sessions_completed: 0,
            average_session_duration: 0.0,
            peak_performance_time: PeakTime::default(),
            weak_areas: Vec::new(),
            strong_areas: Vec::new(),
            recommended_focus_areas: Vec::new(),
            estimated_mastery_date: now_ms + 30 * MS_PER_DAY,
            learning_style: LearningStyle::default(),
        }
    }
}

/// Ordered list of topics to work through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub id: String,
    pub name: String,
    pub description: String,
    pub topics: Vec<String>,
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub focus_areas: Vec<String>,
}

// ==================== Profile ====================

/// Root aggregate, persisted as one blob per learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub current_difficulty: Difficulty,
    pub total_questions_attempted: u32,
    pub correct_answers: u32,
    /// Seconds
    pub total_time_spent: f64,
    pub average_time_per_question: f64,
    pub progress_history: Vec<UserProgress>,
    pub topic_stats: BTreeMap<String, TopicStats>,
    #[serde(default)]
    pub topics_completed: Vec<String>,
    pub streak_count: u32,
    pub last_activity_at: i64,
    pub performance_metrics: PerformanceMetrics,
    pub learning_analytics: LearningAnalytics,
    pub adaptive_level: u8,
    pub learning_style: LearningStyle,
    pub recommended_daily_goal: u32,
    pub current_learning_path: String,
    #[serde(default)]
    pub custom_learning_paths: Vec<LearningPath>,
    pub last_path_generation_at: i64,
    pub last_analytics_update: i64,
}

impl UserProfile {
    /// Fresh profile for a first-time learner
    pub fn new(now_ms: i64) -> Self {
        Self {
            current_difficulty: Difficulty::Easy,
            total_questions_attempted: 0,
            correct_answers: 0,
            total_time_spent: 0.0,
            average_time_per_question: 0.0,
            progress_history: Vec::new(),
            topic_stats: BTreeMap::new(),
            topics_completed: Vec::new(),
            streak_count: 0,
            last_activity_at: now_ms,
            performance_metrics: PerformanceMetrics::default(),
            learning_analytics: LearningAnalytics::new(now_ms),
            adaptive_level: 1,
            learning_style: LearningStyle::SteadyLearner,
            recommended_daily_goal: 5,
            current_learning_path: "path-beginner".to_string(),
            custom_learning_paths: Vec::new(),
            last_path_generation_at: now_ms,
            last_analytics_update: now_ms,
        }
    }

    pub fn progress_for(&self, question_id: &str) -> Option<&UserProgress> {
        self.progress_history
            .iter()
            .find(|p| p.question_id == question_id)
    }

    pub fn has_attempted(&self, question_id: &str) -> bool {
        self.progress_for(question_id).is_some()
    }

    /// Forget attempted questions so the catalog can be offered again.
    /// Aggregates and the difficulty tier are kept.
    pub fn recycle_history(&mut self) {
        self.progress_history.clear();
    }
}
