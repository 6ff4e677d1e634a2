//! Practice orchestration: wires the scoring core to storage, the catalog,
//! the AI provider and the clock.
//!
//! Read-modify-write sequences on the stored aggregates are serialized by a
//! single async lock. Profile, RL state and wrong-submission log are saved
//! one after the other; a failure part-way leaves the earlier writes in place.

use std::sync::Arc;

use neuro_algo::metrics::{accuracy_of, recent_window};
use neuro_algo::paths::{
    available_paths, find_path, learner_level, reorder_by_progress, should_regenerate,
};
use neuro_algo::selector::weak_concepts;
use neuro_algo::wrong_streak::{DOWNGRADE_THRESHOLD, HINT_THRESHOLD};
use neuro_algo::{
    performance_momentum, select_alternate_question, select_next_question, update_user_profile,
    update_user_profile_with_rl, Difficulty, EngineConfig, LearnerLevel, LearningPath,
    LearningStyle, Momentum, PerformanceMetrics, Question, RlAction, RlState, RlStep, RlTracker,
    SelectionReason, StateKey, Submission, TestCase, UserProfile, WrongStreakSignals,
};
use parking_lot::{Mutex, RwLock};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::DifficultyAuthority;
use crate::services::ai_provider::{AiError, CodeVerdict, PathRequest, QuestionGenerator, QuestionRequest};
use crate::services::catalog::QuestionCatalog;
use crate::services::repository::{PracticeRepository, RepositoryError};
use crate::store::keys;

const FALLBACK_TOPIC: &str = "Basics";
const GENERATED_TOPIC: &str = "general";
const WEAK_PATTERN_LIMIT: usize = 3;

#[derive(Debug, Error)]
pub enum PracticeError {
    #[error("question not found: {0}")]
    UnknownQuestion(String),
    #[error("learning path not found: {0}")]
    UnknownPath(String),
    #[error("topic not found: {0}")]
    UnknownTopic(String),
    #[error("no question available for topic {topic}")]
    NoQuestionAvailable { topic: String },
    #[error("{0}")]
    Invalid(String),
    #[error("AI provider unavailable")]
    AiUnavailable(#[source] AiError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// ==================== Requests / responses ====================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub question_id: String,
    #[serde(flatten)]
    pub submission: Submission,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub current_difficulty: Difficulty,
    pub total_questions_attempted: u32,
    pub correct_answers: u32,
    pub streak_count: u32,
    pub adaptive_level: u8,
    pub learning_style: LearningStyle,
    pub recommended_daily_goal: u32,
    pub topics_completed: Vec<String>,
    pub performance_metrics: PerformanceMetrics,
}

impl From<&UserProfile> for ProfileSummary {
    fn from(profile: &UserProfile) -> Self {
        Self {
            current_difficulty: profile.current_difficulty,
            total_questions_attempted: profile.total_questions_attempted,
            correct_answers: profile.correct_answers,
            streak_count: profile.streak_count,
            adaptive_level: profile.adaptive_level,
            learning_style: profile.learning_style,
            recommended_daily_goal: profile.recommended_daily_goal,
            topics_completed: profile.topics_completed.clone(),
            performance_metrics: profile.performance_metrics.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub profile: ProfileSummary,
    /// Tier chosen by the deterministic policy
    pub policy_difficulty: Difficulty,
    /// Tier stored on the profile
    pub applied_difficulty: Difficulty,
    pub authority: &'static str,
    pub recommendation: Option<RlStep>,
    pub wrong_streak: WrongStreakSignals,
    pub hint: Option<String>,
    pub momentum: Momentum,
    pub next_review_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestion {
    pub topic: String,
    pub question: Question,
    pub reason: SelectionReason,
    /// History was cleared because the topic was exhausted
    pub recycled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSource {
    Ai,
    Catalog,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedOutcome {
    pub source: QuestionSource,
    pub question: Question,
    pub reason: Option<SelectionReason>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    #[serde(default)]
    pub question_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RlSummary {
    pub enabled: bool,
    pub authority: &'static str,
    pub state_key: String,
    pub recommended_action: RlAction,
    pub suggested_difficulty: Difficulty,
    pub episode_count: u64,
    pub state_count: usize,
    pub exploration_rate: f64,
    pub learning_rate: f64,
    pub total_reward: f64,
    pub average_reward: f64,
    pub convergence_score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsOverview {
    pub current: String,
    pub level: LearnerLevel,
    pub should_regenerate: bool,
    pub paths: Vec<LearningPath>,
}

// ==================== Service ====================

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub engine: EngineConfig,
    pub authority: DifficultyAuthority,
    pub rl_enabled: bool,
    /// Fixes both the exploration and the selection RNG
    pub seed: Option<u64>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            authority: DifficultyAuthority::Policy,
            rl_enabled: true,
            seed: None,
        }
    }
}

pub struct PracticeService {
    repo: PracticeRepository,
    catalog: RwLock<QuestionCatalog>,
    generator: Arc<dyn QuestionGenerator>,
    clock: Arc<dyn Clock>,
    engine: EngineConfig,
    authority: DifficultyAuthority,
    rl_enabled: bool,
    tracker: Mutex<RlTracker>,
    rng: Mutex<ChaCha8Rng>,
    writes: tokio::sync::Mutex<()>,
}

impl PracticeService {
    pub fn new(
        repo: PracticeRepository,
        catalog: QuestionCatalog,
        generator: Arc<dyn QuestionGenerator>,
        clock: Arc<dyn Clock>,
        options: ServiceOptions,
    ) -> Self {
        let seed = options.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let tracker = RlTracker::with_seed(options.engine.rl.clone(), seed);

        Self {
            repo,
            catalog: RwLock::new(catalog),
            generator,
            clock,
            engine: options.engine,
            authority: options.authority,
            rl_enabled: options.rl_enabled,
            tracker: Mutex::new(tracker),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed.wrapping_add(1))),
            writes: tokio::sync::Mutex::new(()),
        }
    }

    pub fn catalog_size(&self) -> usize {
        self.catalog.read().len()
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    pub fn store_name(&self) -> &'static str {
        self.repo.store_name()
    }

    // ==================== Profile ====================

    pub async fn profile(&self) -> Result<UserProfile, PracticeError> {
        Ok(self.repo.load_profile(self.clock.now_ms()).await?)
    }

    /// Clears progress and the wrong-submission log. RL state is kept.
    pub async fn reset_profile(&self) -> Result<UserProfile, PracticeError> {
        let _guard = self.writes.lock().await;
        self.repo.remove(keys::PROFILE).await?;
        self.repo.remove(keys::WRONG_SUBMISSIONS).await?;
        info!("profile reset");
        Ok(UserProfile::new(self.clock.now_ms()))
    }

    // ==================== Submissions ====================

    pub async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionOutcome, PracticeError> {
        let SubmissionRequest {
            question_id,
            submission,
        } = request;
        if !submission.time_spent.is_finite() || submission.time_spent < 0.0 {
            return Err(PracticeError::Invalid(
                "timeSpent must be a non-negative number of seconds".to_string(),
            ));
        }
        let question = self
            .catalog
            .read()
            .find(&question_id)
            .cloned()
            .ok_or_else(|| PracticeError::UnknownQuestion(question_id.clone()))?;

        let _guard = self.writes.lock().await;
        let now = self.clock.now_ms();
        let profile = self.repo.load_profile(now).await?;
        let mut wrong_log = self.repo.load_wrong_log().await?;

        let (mut updated, step, rl_state) = if self.rl_enabled {
            let mut rl_state = self.repo.load_rl_state(&self.engine.rl).await?;
            let (updated, step) = {
                let mut tracker = self.tracker.lock();
                update_user_profile_with_rl(
                    &profile,
                    &question,
                    &submission,
                    now,
                    &self.engine,
                    &mut rl_state,
                    &mut tracker,
                )
            };
            (updated, Some(step), Some(rl_state))
        } else {
            let updated = update_user_profile(&profile, &question, &submission, now, &self.engine);
            (updated, None, None)
        };

        let policy_difficulty = updated.current_difficulty;
        if self.authority == DifficultyAuthority::Reinforcement {
            if let Some(step) = &step {
                updated.current_difficulty = step.suggested_difficulty;
            }
        }

        let mut hint = None;
        if submission.correct {
            wrong_log.reset_streak(&question.id);
        } else {
            let upcoming = wrong_log
                .get(&question.id)
                .map_or(0, |c| c.consecutive_wrongs)
                + 1;
            if upcoming >= HINT_THRESHOLD {
                let index = (upcoming - HINT_THRESHOLD) as usize;
                hint = question
                    .hints
                    .get(index)
                    .or_else(|| question.hints.last())
                    .cloned();
            }
            let context = wrong_log.track_wrong(
                &question.id,
                submission.error_type.as_deref(),
                submission.time_spent,
                hint.as_deref(),
            );
            if context.consecutive_wrongs == DOWNGRADE_THRESHOLD {
                let from = updated.current_difficulty;
                updated.current_difficulty = from.easier();
                info!(
                    question_id = %question.id,
                    from = %from,
                    to = %updated.current_difficulty,
                    "difficulty lowered after repeated wrong submissions"
                );
            }
        }
        let signals = wrong_log.signals(&question.id);

        self.repo.save_profile(&updated).await?;
        if let Some(rl_state) = &rl_state {
            self.repo.save_rl_state(rl_state).await?;
        }
        self.repo.save_wrong_log(&wrong_log).await?;

        info!(
            question_id = %question.id,
            correct = submission.correct,
            difficulty = %updated.current_difficulty,
            total = updated.total_questions_attempted,
            "submission recorded"
        );

        Ok(SubmissionOutcome {
            profile: ProfileSummary::from(&updated),
            policy_difficulty,
            applied_difficulty: updated.current_difficulty,
            authority: self.authority.as_str(),
            next_review_at: updated
                .progress_for(&question.id)
                .and_then(|p| p.next_review_at),
            momentum: performance_momentum(&updated),
            recommendation: step,
            wrong_streak: signals,
            hint,
        })
    }

    // ==================== Selection ====================

    pub async fn next_question(&self, topic: Option<&str>) -> Result<NextQuestion, PracticeError> {
        let _guard = self.writes.lock().await;
        let now = self.clock.now_ms();
        let mut profile = self.repo.load_profile(now).await?;
        let topic = self.resolve_topic(&profile, topic)?;

        if let Some((question, reason)) = self.pick(&profile, &topic, now) {
            return Ok(NextQuestion {
                topic,
                question,
                reason,
                recycled: false,
            });
        }

        // Topic exhausted: forget attempts and try again
        profile.recycle_history();
        self.repo.save_profile(&profile).await?;
        info!(topic = %topic, "question history recycled");

        match self.pick(&profile, &topic, now) {
            Some((question, reason)) => Ok(NextQuestion {
                topic,
                question,
                reason,
                recycled: true,
            }),
            None => Err(PracticeError::NoQuestionAvailable { topic }),
        }
    }

    pub async fn alternate_question(
        &self,
        topic: Option<&str>,
        exclude_id: &str,
    ) -> Result<Question, PracticeError> {
        let profile = self.profile().await?;
        let topic = self.resolve_topic(&profile, topic)?;
        let catalog = self.catalog.read();
        let mut rng = self.rng.lock();
        select_alternate_question(catalog.questions(), &profile, &topic, exclude_id, &mut *rng)
            .cloned()
            .ok_or(PracticeError::NoQuestionAvailable { topic })
    }

    fn pick(&self, profile: &UserProfile, topic: &str, now: i64) -> Option<(Question, SelectionReason)> {
        let catalog = self.catalog.read();
        let mut rng = self.rng.lock();
        select_next_question(
            catalog.questions(),
            profile,
            topic,
            now,
            &self.engine.selector,
            &mut *rng,
        )
        .map(|s| (s.question.clone(), s.reason))
    }

    /// Catalog spelling of the requested topic, or the first topic of the
    /// current learning path the catalog knows about.
    fn resolve_topic(&self, profile: &UserProfile, requested: Option<&str>) -> Result<String, PracticeError> {
        let known = self.catalog.read().topics();
        let lookup = |wanted: &str| {
            known
                .iter()
                .find(|t| t.eq_ignore_ascii_case(wanted.trim()))
                .cloned()
        };

        if let Some(wanted) = requested.filter(|t| !t.trim().is_empty()) {
            return lookup(wanted).ok_or_else(|| PracticeError::UnknownTopic(wanted.to_string()));
        }

        let from_path = find_path(profile, &profile.current_learning_path)
            .map(|path| reorder_by_progress(profile, &path))
            .and_then(|path| path.topics.iter().find_map(|t| lookup(t.as_str())));
        Ok(from_path
            .or_else(|| lookup(FALLBACK_TOPIC))
            .or_else(|| known.first().cloned())
            .unwrap_or_else(|| FALLBACK_TOPIC.to_string()))
    }

    // ==================== AI ====================

    pub async fn generate_question(&self, request: GenerateRequest) -> Result<GeneratedOutcome, PracticeError> {
        let profile = self.profile().await?;
        let difficulty = request.difficulty.unwrap_or(profile.current_difficulty);
        let recent = recent_window(&profile.progress_history, self.engine.metrics.window);

        let mut patterns: Vec<(&String, &u32)> = profile.performance_metrics.error_patterns.iter().collect();
        patterns.sort_by(|a, b| b.1.cmp(a.1));
        let mut weak: Vec<String> = patterns
            .into_iter()
            .take(WEAK_PATTERN_LIMIT)
            .map(|(kind, _)| kind.clone())
            .collect();
        for concept in weak_concepts(&profile, &self.engine.selector) {
            if weak.len() >= WEAK_PATTERN_LIMIT * 2 {
                break;
            }
            if !weak.contains(&concept) {
                weak.push(concept);
            }
        }

        let ai_request = QuestionRequest {
            difficulty,
            topic: request.topic.clone().filter(|t| !t.trim().is_empty()),
            recent_accuracy: accuracy_of(recent),
            weak_concepts: weak,
        };

        match self.generator.generate_question(&ai_request).await {
            Ok(generated) => {
                let topic = ai_request
                    .topic
                    .clone()
                    .or_else(|| generated.tags.first().cloned())
                    .unwrap_or_else(|| GENERATED_TOPIC.to_string());
                let mut test_cases = generated.test_cases;
                if test_cases.is_empty() {
                    if let Some(expected) = generated.expected_output.filter(|e| !e.is_empty()) {
                        test_cases.push(TestCase {
                            input: String::new(),
                            expected_output: expected,
                        });
                    }
                }
                let question = Question {
                    id: format!("ai-{}", Uuid::new_v4()),
                    subtopic: generated.tags.get(1).cloned().unwrap_or_else(|| topic.clone()),
                    topic,
                    difficulty,
                    question_type: Default::default(),
                    title: generated.title,
                    description: generated.description,
                    starter_code: generated.starter_code,
                    solution_code: generated.solution_code,
                    test_cases,
                    hints: generated.hints,
                    tags: generated.tags,
                    estimated_time: difficulty.target_seconds(),
                };
                self.remember_ai_question(question.clone()).await?;
                info!(question_id = %question.id, difficulty = %difficulty, "AI question generated");
                Ok(GeneratedOutcome {
                    source: QuestionSource::Ai,
                    question,
                    reason: None,
                })
            }
            Err(err) => {
                warn!(error = %err, "AI generation failed, falling back to catalog");
                let next = self.next_question(request.topic.as_deref()).await?;
                Ok(GeneratedOutcome {
                    source: QuestionSource::Catalog,
                    question: next.question,
                    reason: Some(next.reason),
                })
            }
        }
    }

    async fn remember_ai_question(&self, question: Question) -> Result<(), PracticeError> {
        let _guard = self.writes.lock().await;
        let cached: Vec<Question> = {
            let mut catalog = self.catalog.write();
            catalog.insert(question);
            catalog
                .questions()
                .iter()
                .filter(|q| q.id.starts_with("ai-"))
                .cloned()
                .collect()
        };
        self.repo.save_ai_questions(&cached).await?;
        Ok(())
    }

    pub async fn validate_code(&self, request: ValidateRequest) -> Result<CodeVerdict, PracticeError> {
        if request.code.trim().is_empty() {
            return Err(PracticeError::Invalid("code must not be empty".to_string()));
        }
        let description = match (&request.question_id, &request.description) {
            (Some(id), _) => self
                .catalog
                .read()
                .find(id)
                .map(|q| q.description.clone())
                .ok_or_else(|| PracticeError::UnknownQuestion(id.clone()))?,
            (None, Some(description)) if !description.trim().is_empty() => description.clone(),
            _ => {
                return Err(PracticeError::Invalid(
                    "questionId or description is required".to_string(),
                ))
            }
        };

        self.generator
            .validate_code(&description, &request.code)
            .await
            .map_err(PracticeError::AiUnavailable)
    }

    // ==================== RL ====================

    pub async fn rl_summary(&self, topic: Option<&str>) -> Result<RlSummary, PracticeError> {
        let profile = self.profile().await?;
        let state = self.repo.load_rl_state(&self.engine.rl).await?;
        let topic = self.resolve_topic(&profile, topic)?;
        Ok(self.summarize(&profile, &state, &topic))
    }

    pub async fn reset_rl(&self) -> Result<RlSummary, PracticeError> {
        let _guard = self.writes.lock().await;
        self.repo.remove(keys::RL_STATE).await?;
        info!("rl state reset");
        let profile = self.repo.load_profile(self.clock.now_ms()).await?;
        let topic = self.resolve_topic(&profile, None)?;
        Ok(self.summarize(&profile, &RlState::new(&self.engine.rl), &topic))
    }

    fn summarize(&self, profile: &UserProfile, state: &RlState, topic: &str) -> RlSummary {
        let state_key = StateKey::from_profile(profile, topic).encode();
        let action = state.best_action(&state_key);
        RlSummary {
            enabled: self.rl_enabled,
            authority: self.authority.as_str(),
            suggested_difficulty: action.apply_to(profile.current_difficulty),
            recommended_action: action,
            state_key,
            episode_count: state.episode_count,
            state_count: state.state_count(),
            exploration_rate: state.exploration_rate,
            learning_rate: state.learning_rate,
            total_reward: state.total_reward,
            average_reward: state.average_reward,
            convergence_score: state.convergence_score,
        }
    }

    // ==================== Learning paths ====================

    pub async fn paths(&self) -> Result<PathsOverview, PracticeError> {
        let profile = self.profile().await?;
        Ok(self.overview(&profile))
    }

    fn overview(&self, profile: &UserProfile) -> PathsOverview {
        PathsOverview {
            current: profile.current_learning_path.clone(),
            level: learner_level(profile),
            should_regenerate: should_regenerate(profile, self.clock.now_ms()),
            paths: available_paths(profile)
                .iter()
                .map(|path| reorder_by_progress(profile, path))
                .collect(),
        }
    }

    pub async fn set_current_path(&self, path_id: &str) -> Result<PathsOverview, PracticeError> {
        let _guard = self.writes.lock().await;
        let mut profile = self.repo.load_profile(self.clock.now_ms()).await?;
        if find_path(&profile, path_id).is_none() {
            return Err(PracticeError::UnknownPath(path_id.to_string()));
        }
        profile.current_learning_path = path_id.to_string();
        self.repo.save_profile(&profile).await?;
        info!(path_id, "learning path selected");
        Ok(self.overview(&profile))
    }

    pub async fn generate_path(&self) -> Result<LearningPath, PracticeError> {
        let profile = self.profile().await?;
        let request = PathRequest {
            level: learner_level(&profile),
            weak_areas: profile.learning_analytics.weak_areas.clone(),
            strong_areas: profile.learning_analytics.strong_areas.clone(),
        };
        let generated = self
            .generator
            .generate_learning_path(&request)
            .await
            .map_err(PracticeError::AiUnavailable)?;

        let topics: Vec<String> = generated
            .topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.is_empty() {
            return Err(PracticeError::AiUnavailable(AiError::MissingJson));
        }
        let path = LearningPath {
            id: format!("custom-{}", Uuid::new_v4()),
            name: generated.name,
            description: generated.description,
            topics,
            is_custom: true,
            estimated_hours: generated.estimated_hours.filter(|h| h.is_finite() && *h > 0.0),
            focus_areas: generated.focus_areas,
        };

        // Reload under the lock so submissions made during the AI call survive
        let _guard = self.writes.lock().await;
        let now = self.clock.now_ms();
        let mut profile = self.repo.load_profile(now).await?;
        profile.custom_learning_paths.push(path.clone());
        profile.current_learning_path = path.id.clone();
        profile.last_path_generation_at = now;
        self.repo.save_profile(&profile).await?;
        info!(path_id = %path.id, topics = path.topics.len(), "custom learning path generated");
        Ok(path)
    }
}
