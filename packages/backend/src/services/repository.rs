//! Aggregate persistence over the injected key-value store. Profile, RL state,
//! wrong-submission log and AI question cache live under separate keys.
//! Unreadable stored values are replaced by fresh aggregates with a warning.

use std::sync::Arc;

use neuro_algo::persist::{decode_profile, decode_rl_state, encode_profile, encode_rl_state};
use neuro_algo::{Question, RlConfig, RlState, UserProfile, WrongSubmissionLog};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::store::{keys, KeyValueStore, StoreError};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct PracticeRepository {
    store: Arc<dyn KeyValueStore>,
}

impl PracticeRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    // ==================== Profile ====================

    pub async fn load_profile(&self, now_ms: i64) -> Result<UserProfile, RepositoryError> {
        let Some(raw) = self.store.get(keys::PROFILE).await? else {
            return Ok(UserProfile::new(now_ms));
        };
        match decode_profile(&raw) {
            Ok(profile) => Ok(profile),
            Err(err) => {
                warn!(key = keys::PROFILE, error = %err, "stored profile unreadable, starting fresh");
                Ok(UserProfile::new(now_ms))
            }
        }
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        let raw = encode_profile(profile)?;
        self.store.set(keys::PROFILE, &raw).await?;
        Ok(())
    }

    // ==================== RL state ====================

    pub async fn load_rl_state(&self, config: &RlConfig) -> Result<RlState, RepositoryError> {
        let Some(raw) = self.store.get(keys::RL_STATE).await? else {
            return Ok(RlState::new(config));
        };
        match decode_rl_state(&raw) {
            Ok(state) => Ok(state),
            Err(err) => {
                warn!(key = keys::RL_STATE, error = %err, "stored rl state unreadable, starting fresh");
                Ok(RlState::new(config))
            }
        }
    }

    pub async fn save_rl_state(&self, state: &RlState) -> Result<(), RepositoryError> {
        let raw = encode_rl_state(state)?;
        self.store.set(keys::RL_STATE, &raw).await?;
        Ok(())
    }

    // ==================== Wrong submissions ====================

    pub async fn load_wrong_log(&self) -> Result<WrongSubmissionLog, RepositoryError> {
        Ok(self.load_plain(keys::WRONG_SUBMISSIONS).await?.unwrap_or_default())
    }

    pub async fn save_wrong_log(&self, log: &WrongSubmissionLog) -> Result<(), RepositoryError> {
        self.save_plain(keys::WRONG_SUBMISSIONS, log).await
    }

    // ==================== AI question cache ====================

    pub async fn load_ai_questions(&self) -> Result<Vec<Question>, RepositoryError> {
        Ok(self.load_plain(keys::AI_QUESTIONS).await?.unwrap_or_default())
    }

    pub async fn save_ai_questions(&self, questions: &[Question]) -> Result<(), RepositoryError> {
        self.save_plain(keys::AI_QUESTIONS, &questions).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), RepositoryError> {
        self.store.remove(key).await?;
        Ok(())
    }

    async fn load_plain<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RepositoryError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, error = %err, "stored value unreadable, starting fresh");
                Ok(None)
            }
        }
    }

    async fn save_plain<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw).await?;
        Ok(())
    }
}
