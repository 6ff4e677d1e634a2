use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::services::ai_provider::{Backoff, RetryPolicy};

/// Which signal owns `currentDifficulty` after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyAuthority {
    Policy,
    Reinforcement,
}

impl DifficultyAuthority {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "policy" => Some(Self::Policy),
            "reinforcement" | "rl" => Some(Self::Reinforcement),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::Reinforcement => "reinforcement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    Directory(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub retry: RetryPolicy,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".to_string(),
            model: "gpt-oss:120b-cloud".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub store: StoreLocation,
    pub catalog_csv: Option<PathBuf>,
    pub difficulty_authority: DifficultyAuthority,
    pub rl_enabled: bool,
    pub rl_seed: Option<u64>,
    pub ai: AiConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let store = match env_string("NEURO_DATA_DIR") {
            Some(value) if value.eq_ignore_ascii_case("memory") => StoreLocation::Memory,
            Some(value) => StoreLocation::Directory(PathBuf::from(value)),
            None => StoreLocation::Directory(default_data_dir()),
        };

        let difficulty_authority = env_string("NEURO_DIFFICULTY_AUTHORITY")
            .and_then(|value| DifficultyAuthority::parse(&value))
            .unwrap_or(DifficultyAuthority::Policy);

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: env_u64("AI_MAX_ATTEMPTS")
                .map(|v| v.clamp(1, 10) as u32)
                .unwrap_or(defaults.max_attempts),
            delay: env_u64("AI_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.delay),
            backoff: env_string("AI_BACKOFF")
                .and_then(|value| Backoff::parse(&value))
                .unwrap_or(defaults.backoff),
            timeout: env_u64("AI_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
        };

        let ai_defaults = AiConfig::default();
        let ai = AiConfig {
            enabled: env_bool("AI_ENABLED").unwrap_or(true),
            base_url: env_string("OLLAMA_BASE_URL").unwrap_or(ai_defaults.base_url),
            model: env_string("OLLAMA_MODEL").unwrap_or(ai_defaults.model),
            retry,
        };

        Self {
            host,
            port,
            log_level,
            store,
            catalog_csv: env_string("NEURO_CATALOG_CSV").map(PathBuf::from),
            difficulty_authority,
            rl_enabled: env_bool("NEURO_RL_ENABLED").unwrap_or(true),
            rl_seed: env_u64("NEURO_RL_SEED"),
            ai,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("neuro-practice")
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key).and_then(|v| v.parse::<u64>().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    env_string(key).and_then(|v| parse_bool(&v))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
