//! # neuro-algo - adaptive scoring core for coding practice
//!
//! Pure, synchronous scoring functions over a single learner profile:
//!
//! - **Performance metrics** - accuracy, speed, consistency, learning velocity
//! - **Difficulty policy** - weighted score with streak / time / confidence multipliers
//! - **Spaced repetition** - interval table scaled by recent accuracy
//! - **Q-learning tracker** - tabular state/action values as a second tier signal
//! - **Question selection** - due reviews, weak concepts, fresh questions
//! - **Profile updater** - runs everything above for one submission
//!
//! Nothing here performs I/O, logs or reads the clock. Timestamps are epoch
//! milliseconds passed in by the caller; randomness comes from a caller
//! supplied `rand::Rng`.
//!
//! ## Module layout
//!
//! - [`metrics`] - performance metrics over the recent window
//! - [`difficulty`] - tier transitions and momentum
//! - [`scheduler`] - next review timestamps
//! - [`rl`] - Q-learning state tracker
//! - [`selector`] - next / alternate question
//! - [`updater`] - submission orchestrator
//! - [`analytics`] - sessions, weak areas, learning style
//! - [`wrong_streak`] - consecutive wrong submission log
//! - [`paths`] - learning paths
//! - [`catalog`] - seed questions and catalog merging
//! - [`persist`] - versioned JSON envelopes
//! - [`sanitize`] - numeric guards
//! - [`types`] - shared data model
//!
//! ## Example
//!
//! ```rust
//! use neuro_algo::{catalog, updater, EngineConfig, Submission, UserProfile};
//!
//! let config = EngineConfig::default();
//! let questions = catalog::seed_questions();
//! let profile = UserProfile::new(0);
//! let submission = Submission { correct: true, time_spent: 90.0, ..Submission::default() };
//! let next = updater::update_user_profile(&profile, &questions[0], &submission, 1_000, &config);
//! assert_eq!(next.total_questions_attempted, 1);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod difficulty;
pub mod metrics;
pub mod paths;
pub mod persist;
pub mod rl;
pub mod sanitize;
pub mod scheduler;
pub mod selector;
pub mod types;
pub mod updater;
pub mod wrong_streak;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use config::{
    AnalyticsConfig, EngineConfig, MetricsConfig, PolicyConfig, PolicyWeights, RlConfig,
    SchedulerConfig, SelectorConfig,
};
pub use difficulty::{calculate_next_difficulty, performance_momentum, Momentum, Trend};
pub use metrics::calculate_performance_metrics;
pub use paths::LearnerLevel;
pub use persist::DecodeError;
pub use rl::{RlAction, RlState, RlStep, RlTracker, StateKey};
pub use selector::{select_alternate_question, select_next_question, Selection, SelectionReason};
pub use updater::{update_user_profile, update_user_profile_with_rl, Submission};
pub use wrong_streak::{WrongStreakSignals, WrongSubmissionContext, WrongSubmissionLog};
