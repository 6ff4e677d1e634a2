//! Versioned persistence envelopes for the two aggregates.
//!
//! ```json
//! { "version": 2, "profile": { ... } }
//! { "version": 1, "rl": { ... } }
//! ```
//!
//! Decoding never coerces: a wrong version, a missing field or a broken
//! invariant is reported as a `DecodeError` and the caller decides whether to
//! fall back to a fresh aggregate.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::rl::RlState;
use crate::types::UserProfile;

pub const PROFILE_SCHEMA_VERSION: u32 = 2;
pub const RL_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("missing schema version")]
    MissingVersion,

    #[error("unsupported schema version {found}, expected {expected}")]
    UnsupportedVersion { found: u64, expected: u32 },

    #[error("shape mismatch: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

#[derive(Serialize)]
struct ProfileEnvelopeRef<'a> {
    version: u32,
    profile: &'a UserProfile,
}

#[derive(Deserialize)]
struct ProfileEnvelope {
    profile: UserProfile,
}

#[derive(Serialize)]
struct RlEnvelopeRef<'a> {
    version: u32,
    rl: &'a RlState,
}

#[derive(Deserialize)]
struct RlEnvelope {
    rl: RlState,
}

fn check_version(raw: &str, expected: u32) -> Result<Value, DecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(DecodeError::Malformed)?;
    let found = value
        .get("version")
        .and_then(Value::as_u64)
        .ok_or(DecodeError::MissingVersion)?;
    if found != u64::from(expected) {
        return Err(DecodeError::UnsupportedVersion { found, expected });
    }
    Ok(value)
}

pub fn encode_profile(profile: &UserProfile) -> serde_json::Result<String> {
    serde_json::to_string(&ProfileEnvelopeRef {
        version: PROFILE_SCHEMA_VERSION,
        profile,
    })
}

pub fn decode_profile(raw: &str) -> Result<UserProfile, DecodeError> {
    let value = check_version(raw, PROFILE_SCHEMA_VERSION)?;
    let envelope: ProfileEnvelope = serde_json::from_value(value).map_err(DecodeError::Shape)?;
    let profile = envelope.profile;

    if profile.correct_answers > profile.total_questions_attempted {
        return Err(DecodeError::Invariant(format!(
            "correctAnswers {} exceeds totalQuestionsAttempted {}",
            profile.correct_answers, profile.total_questions_attempted
        )));
    }
    if !(1..=10).contains(&profile.adaptive_level) {
        return Err(DecodeError::Invariant(format!(
            "adaptiveLevel {} outside 1..=10",
            profile.adaptive_level
        )));
    }
    Ok(profile)
}

pub fn encode_rl_state(state: &RlState) -> serde_json::Result<String> {
    serde_json::to_string(&RlEnvelopeRef {
        version: RL_SCHEMA_VERSION,
        rl: state,
    })
}

pub fn decode_rl_state(raw: &str) -> Result<RlState, DecodeError> {
    let value = check_version(raw, RL_SCHEMA_VERSION)?;
    let envelope: RlEnvelope = serde_json::from_value(value).map_err(DecodeError::Shape)?;
    let state = envelope.rl;
    if !(0.0..=1.0).contains(&state.exploration_rate) {
        return Err(DecodeError::Invariant(format!(
            "explorationRate {} outside [0, 1]",
            state.exploration_rate
        )));
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RlConfig;
    use crate::rl::RlAction;

    #[test]
    fn test_profile_envelope_shape() {
        let profile = UserProfile::new(1_700_000_000_000);
        let raw = encode_profile(&profile).expect("encode");
        let value: Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["version"], 2);
        assert_eq!(value["profile"]["currentDifficulty"], "easy");
        assert_eq!(value["profile"]["currentLearningPath"], "path-beginner");

        let back = decode_profile(&raw).expect("decode");
        assert_eq!(back, profile);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_profile("{not json"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode_profile("{}"), Err(DecodeError::MissingVersion)));
        assert!(matches!(
            decode_profile(r#"{"version": 1, "profile": {}}"#),
            Err(DecodeError::UnsupportedVersion { found: 1, expected: 2 })
        ));
        assert!(matches!(
            decode_profile(r#"{"version": 2, "profile": {"currentDifficulty": "easy"}}"#),
            Err(DecodeError::Shape(_))
        ));
    }

    #[test]
    fn test_decode_rejects_broken_invariant() {
        let mut profile = UserProfile::new(0);
        profile.correct_answers = 3;
        let raw = encode_profile(&profile).expect("encode");
        assert!(matches!(decode_profile(&raw), Err(DecodeError::Invariant(_))));
    }

    #[test]
    fn test_rl_state_keys_actions_by_name() {
        let mut state = RlState::new(&RlConfig::default());
        state
            .q_table
            .entry("Loops|easy|a0|v2|c0|r0".to_string())
            .or_default()
            .insert(RlAction::FocusWeak, 1.5);
        let raw = encode_rl_state(&state).expect("encode");
        let value: Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["rl"]["qTable"]["Loops|easy|a0|v2|c0|r0"]["focusWeak"], 1.5);
        assert_eq!(decode_rl_state(&raw).expect("decode"), state);
    }

    #[test]
    fn test_rl_decode_rejects_wrong_version() {
        assert!(matches!(
            decode_rl_state(r#"{"version": 7, "rl": {}}"#),
            Err(DecodeError::UnsupportedVersion { found: 7, .. })
        ));
    }
}
