//! AI question generation, code review and learning-path drafting through a
//! local Ollama server. Every call goes through an explicit `RetryPolicy`;
//! whatever is still failing after the last attempt surfaces as
//! `AiError::Unavailable` and callers fall back to the catalog.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use neuro_algo::{Difficulty, LearnerLevel, TestCase};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::AiConfig;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_DELAY_MS: u64 = 1_000;
const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Topics the path generator may draw from
pub const PATH_TOPICS: [&str; 12] = [
    "basics",
    "control-flow",
    "loops",
    "functions",
    "lists",
    "dictionaries",
    "strings",
    "file-io",
    "oop",
    "error-handling",
    "algorithms",
    "data-structures",
];

// ==================== Errors ====================

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI provider disabled")]
    Disabled,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: reqwest::StatusCode, body: String },
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("model reply contained no JSON object")]
    MissingJson,
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("AI provider unavailable after {attempts} attempt(s): {source}")]
    Unavailable {
        attempts: u32,
        #[source]
        source: Box<AiError>,
    },
}

impl AiError {
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Request(_) | AiError::Timeout(_) => true,
            AiError::MissingJson | AiError::Json(_) => true,
            AiError::HttpStatus { status, .. } => is_retryable(*status),
            AiError::Disabled | AiError::Unavailable { .. } => false,
        }
    }
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

// ==================== Retry policy ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    Linear,
    Exponential,
}

impl Backoff {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fixed" => Some(Self::Fixed),
            "linear" => Some(Self::Linear),
            "exponential" => Some(Self::Exponential),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
    /// Per attempt
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            backoff: Backoff::Linear,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl RetryPolicy {
    /// Pause after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Linear => self.delay.saturating_mul(attempt),
            Backoff::Exponential => self
                .delay
                .saturating_mul(2u32.saturating_pow(attempt - 1)),
        }
    }

    /// Run `call` until it succeeds, fails with a non-retryable error or the
    /// attempts run out. Each attempt is bounded by `timeout`.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, AiError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AiError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, call(attempt)).await {
                Ok(result) => result,
                Err(_) => Err(AiError::Timeout(self.timeout)),
            };
            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if attempt >= max_attempts || !err.is_retryable() {
                return Err(AiError::Unavailable {
                    attempts: attempt,
                    source: Box::new(err),
                });
            }

            let pause = self.delay_for(attempt);
            warn!(operation, attempt, error = %err, ?pause, "AI call failed, retrying");
            sleep(pause).await;
            attempt += 1;
        }
    }
}

// ==================== Requests / replies ====================

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRequest {
    pub difficulty: Difficulty,
    pub topic: Option<String>,
    /// Accuracy over the recent window, 0..=100
    pub recent_accuracy: f64,
    pub weak_concepts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub starter_code: String,
    #[serde(default)]
    pub solution_code: Option<String>,
    #[serde(default)]
    pub expected_output: Option<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathRequest {
    pub level: LearnerLevel,
    pub weak_areas: Vec<String>,
    pub strong_areas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPath {
    pub name: String,
    pub description: String,
    pub topics: Vec<String>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub focus_areas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeVerdict {
    pub passed: bool,
    #[serde(default)]
    pub message: String,
}

// ==================== Trait ====================

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate_question(&self, request: &QuestionRequest) -> Result<GeneratedQuestion, AiError>;

    async fn validate_code(&self, description: &str, code: &str) -> Result<CodeVerdict, AiError>;

    async fn generate_learning_path(&self, request: &PathRequest) -> Result<GeneratedPath, AiError>;
}

/// Always unavailable. Used when `AI_ENABLED=false` and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledProvider;

impl DisabledProvider {
    fn unavailable() -> AiError {
        AiError::Unavailable {
            attempts: 0,
            source: Box::new(AiError::Disabled),
        }
    }
}

#[async_trait]
impl QuestionGenerator for DisabledProvider {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn generate_question(&self, _request: &QuestionRequest) -> Result<GeneratedQuestion, AiError> {
        Err(Self::unavailable())
    }

    async fn validate_code(&self, _description: &str, _code: &str) -> Result<CodeVerdict, AiError> {
        Err(Self::unavailable())
    }

    async fn generate_learning_path(&self, _request: &PathRequest) -> Result<GeneratedPath, AiError> {
        Err(Self::unavailable())
    }
}

// ==================== Ollama ====================

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    model: String,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: &AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.retry.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            retry: config.retry.clone(),
            client,
        }
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, AiError> {
        let url = format!("{}/api/generate", self.base_url);
        let payload = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": 0.7,
                "top_p": 0.9,
                "top_k": 40,
                "num_predict": 2000
            }
        });

        let resp = self.client.post(&url).json(&payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::HttpStatus { status, body });
        }
        let reply: GenerateResponse = resp.json().await?;
        Ok(reply.response)
    }

    /// Prompt the model and decode the first JSON object in the reply
    async fn ask<T>(&self, operation: &'static str, prompt: String) -> Result<T, AiError>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.retry
            .run(operation, |attempt| {
                let prompt = prompt.as_str();
                async move {
                    debug!(operation, attempt, model = %self.model, "calling ollama");
                    let content = self.generate_once(prompt).await?;
                    decode_reply(&content)
                }
            })
            .await
    }
}

#[async_trait]
impl QuestionGenerator for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn generate_question(&self, request: &QuestionRequest) -> Result<GeneratedQuestion, AiError> {
        self.ask("generate_question", question_prompt(request)).await
    }

    async fn validate_code(&self, description: &str, code: &str) -> Result<CodeVerdict, AiError> {
        self.ask("validate_code", validation_prompt(description, code)).await
    }

    async fn generate_learning_path(&self, request: &PathRequest) -> Result<GeneratedPath, AiError> {
        self.ask("generate_learning_path", path_prompt(request)).await
    }
}

// ==================== Prompt / reply helpers ====================

/// Slice from the first `{` to the last `}`
pub fn extract_json(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

pub fn decode_reply<T>(content: &str) -> Result<T, AiError>
where
    T: for<'de> Deserialize<'de>,
{
    let json = extract_json(content).ok_or(AiError::MissingJson)?;
    Ok(serde_json::from_str(json)?)
}

fn difficulty_guide(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "beginner-friendly, solvable in 2-5 minutes",
        Difficulty::Medium => "intermediate, solvable in 5-15 minutes",
        Difficulty::Hard => "advanced, solvable in 15-30 minutes",
    }
}

fn adaptive_guidance(recent_accuracy: f64) -> &'static str {
    if recent_accuracy >= 80.0 {
        "The learner is doing well; make the problem slightly more challenging."
    } else if recent_accuracy < 60.0 {
        "The learner is struggling; reinforce fundamentals with clear steps."
    } else {
        "Keep the challenge level steady."
    }
}

pub fn question_prompt(request: &QuestionRequest) -> String {
    let topic = request.topic.as_deref().unwrap_or("general Python programming");
    let weak = if request.weak_concepts.is_empty() {
        String::new()
    } else {
        format!(
            "Where it fits, exercise these weak concepts: {}.\n",
            request.weak_concepts.join(", ")
        )
    };
    format!(
        "Create one Python coding exercise about {topic}.\n\
         Difficulty: {} ({}).\n\
         {}\n\
         {weak}\
         Reply with a single JSON object with the fields \
         title, description, starterCode, solutionCode, expectedOutput, hints (array of strings), \
         testCases (array of {{\"input\", \"expectedOutput\"}}) and tags (array of strings). \
         No text outside the JSON object.",
        request.difficulty,
        difficulty_guide(request.difficulty),
        adaptive_guidance(request.recent_accuracy),
    )
}

pub fn validation_prompt(description: &str, code: &str) -> String {
    format!(
        "Review whether this Python code solves the task.\n\
         Task:\n{description}\n\n\
         Code:\n```python\n{code}\n```\n\n\
         Reply with a single JSON object {{\"passed\": boolean, \"message\": string}} where \
         message briefly explains the verdict."
    )
}

pub fn path_prompt(request: &PathRequest) -> String {
    let list = |items: &[String]| {
        if items.is_empty() {
            "none yet".to_string()
        } else {
            items.join(", ")
        }
    };
    format!(
        "Design a Python learning path for a {} learner.\n\
         Weak areas: {}.\n\
         Strong areas: {}.\n\
         Choose 3 to 6 topics, in order, from: {}.\n\
         Reply with a single JSON object with the fields name, description, \
         topics (array of strings), estimatedHours (number) and focusAreas (array of strings).",
        request.level.as_str(),
        list(&request.weak_areas),
        list(&request.strong_areas),
        PATH_TOPICS.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(1),
            backoff: Backoff::Fixed,
            timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_delay_for_backoff_modes() {
        let mut policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(3_000));

        policy.backoff = Backoff::Fixed;
        assert_eq!(policy.delay_for(3), Duration::from_millis(1_000));

        policy.backoff = Backoff::Exponential;
        assert_eq!(policy.delay_for(1), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4_000));
    }

    #[test]
    fn test_extract_json() {
        assert_eq!(
            extract_json("Sure! {\"passed\": true} hope that helps"),
            Some("{\"passed\": true}")
        );
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn test_decode_reply_question() {
        let reply = r#"Here you go:
        {"title": "Sum", "description": "Add two numbers", "starterCode": "def add(a, b):\n    pass",
         "testCases": [{"input": "1, 2", "expectedOutput": "3"}], "tags": ["functions"]}"#;
        let question: GeneratedQuestion = decode_reply(reply).unwrap();
        assert_eq!(question.title, "Sum");
        assert_eq!(question.test_cases.len(), 1);
        assert!(question.hints.is_empty());

        assert!(matches!(
            decode_reply::<CodeVerdict>("nothing"),
            Err(AiError::MissingJson)
        ));
        assert!(matches!(
            decode_reply::<CodeVerdict>("{\"message\": 1}"),
            Err(AiError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = quick_policy(3)
            .run("test", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(AiError::MissingJson)
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_is_unavailable() {
        let calls = AtomicU32::new(0);
        let result: Result<(), AiError> = quick_policy(3)
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AiError::MissingJson) }
            })
            .await;
        assert!(matches!(result, Err(AiError::Unavailable { attempts: 3, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), AiError> = quick_policy(5)
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AiError::Disabled) }
            })
            .await;
        assert!(matches!(result, Err(AiError::Unavailable { attempts: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempt_timeout_counts_as_failure() {
        let result: Result<(), AiError> = quick_policy(2)
            .run("test", |_| async {
                sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        match result {
            Err(AiError::Unavailable { attempts, source }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(*source, AiError::Timeout(_)));
            }
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_disabled_provider_is_unavailable() {
        let provider = DisabledProvider;
        let request = QuestionRequest {
            difficulty: Difficulty::Easy,
            topic: None,
            recent_accuracy: 0.0,
            weak_concepts: Vec::new(),
        };
        assert!(matches!(
            provider.generate_question(&request).await,
            Err(AiError::Unavailable { attempts: 0, .. })
        ));
    }

    #[test]
    fn test_prompts_carry_context() {
        let prompt = question_prompt(&QuestionRequest {
            difficulty: Difficulty::Hard,
            topic: Some("Loops".to_string()),
            recent_accuracy: 85.0,
            weak_concepts: vec!["range".to_string()],
        });
        assert!(prompt.contains("Loops"));
        assert!(prompt.contains("15-30 minutes"));
        assert!(prompt.contains("more challenging"));
        assert!(prompt.contains("range"));

        let prompt = path_prompt(&PathRequest {
            level: LearnerLevel::Beginner,
            weak_areas: Vec::new(),
            strong_areas: vec!["Loops".to_string()],
        });
        assert!(prompt.contains("beginner"));
        assert!(prompt.contains("none yet"));
        assert!(prompt.contains("data-structures"));
    }
}
