use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Most recent progress records considered
    pub window: usize,
    /// Records per chunk in the consistency estimate
    pub consistency_chunk: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            window: 50,
            consistency_chunk: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyWeights {
    pub accuracy: f64,
    pub speed: f64,
    pub consistency: f64,
    pub velocity: f64,
}

impl Default for PolicyWeights {
    fn default() -> Self {
        Self {
            accuracy: 0.4,
            speed: 0.2,
            consistency: 0.25,
            velocity: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub min_attempts: usize,
    /// Records used by the time and confidence multipliers
    pub recent_window: usize,
    pub weights: PolicyWeights,
    pub easy_to_medium: f64,
    pub medium_to_hard: f64,
    pub medium_to_easy: f64,
    pub hard_to_medium: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_attempts: 5,
            recent_window: 10,
            weights: PolicyWeights::default(),
            easy_to_medium: 0.8,
            medium_to_hard: 0.85,
            medium_to_easy: 0.55,
            hard_to_medium: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Review interval in days, indexed by review count
    pub intervals_days: Vec<f64>,
    pub high_accuracy: f64,
    pub low_accuracy: f64,
    pub high_accuracy_multiplier: f64,
    pub low_accuracy_multiplier: f64,
    /// Records used for the accuracy multiplier
    pub accuracy_window: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            intervals_days: vec![0.5, 1.0, 3.0, 7.0, 14.0, 30.0, 90.0],
            high_accuracy: 90.0,
            low_accuracy: 60.0,
            high_accuracy_multiplier: 1.5,
            low_accuracy_multiplier: 0.5,
            accuracy_window: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RlConfig {
    pub discount: f64,
    pub initial_learning_rate: f64,
    pub min_learning_rate: f64,
    pub learning_rate_decay: f64,
    pub initial_exploration: f64,
    pub min_exploration: f64,
    pub exploration_decay: f64,
    /// Episodes between convergence recomputations
    pub convergence_interval: u64,
}

impl Default for RlConfig {
    fn default() -> Self {
        Self {
            discount: 0.95,
            initial_learning_rate: 0.2,
            min_learning_rate: 0.05,
            learning_rate_decay: 0.9995,
            initial_exploration: 0.3,
            min_exploration: 0.05,
            exploration_decay: 0.998,
            convergence_interval: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Concepts below this mastery are treated as weak
    pub weak_concept_threshold: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            weak_concept_threshold: 70.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Inactivity gap that starts a new session
    pub session_gap_minutes: i64,
    /// Topic accuracy separating weak from strong areas
    pub strong_topic_accuracy: f64,
    pub completion_mastery: f64,
    pub completion_min_attempts: u32,
    pub max_mastery_days: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            session_gap_minutes: 30,
            strong_topic_accuracy: 70.0,
            completion_mastery: 80.0,
            completion_min_attempts: 3,
            max_mastery_days: 365,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub metrics: MetricsConfig,
    pub policy: PolicyConfig,
    pub scheduler: SchedulerConfig,
    pub rl: RlConfig,
    pub selector: SelectorConfig,
    pub analytics: AnalyticsConfig,
}
