use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::audit::{PrivacyMode, RotationConfig};
use crate::provider::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_MS};
use crate::ratelimit::{
    RateLimitSettings, DEFAULT_CLIENT_LIMIT, DEFAULT_CLIENT_WINDOW_SECS, DEFAULT_GLOBAL_LIMIT,
    DEFAULT_GLOBAL_WINDOW_SECS,
};

const DEFAULT_MAX_REQUEST_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub privacy_mode: PrivacyMode,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model_timeout_ms: u64,
    pub rate: RateLimitSettings,
    pub trust_forwarded: bool,
    pub max_request_bytes: usize,
    pub audit_log_file: Option<String>,
    pub rotation: RotationConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let privacy_mode = env::var("FH_PRIVACY_MODE")
            .map(|v| PrivacyMode::from_value(&v))
            .unwrap_or(PrivacyMode::Strict);

        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model_timeout_ms =
            parse_optional_u64("FH_MODEL_TIMEOUT_MS")?.unwrap_or(DEFAULT_TIMEOUT_MS);

        let rate = RateLimitSettings {
            client_limit: parse_optional_u64("FH_CLIENT_LIMIT")?
                .unwrap_or(DEFAULT_CLIENT_LIMIT as u64) as u32,
            client_window: Duration::from_secs(
                parse_optional_u64("FH_CLIENT_WINDOW_SECS")?.unwrap_or(DEFAULT_CLIENT_WINDOW_SECS),
            ),
            global_limit: parse_optional_u64("FH_GLOBAL_LIMIT")?.unwrap_or(DEFAULT_GLOBAL_LIMIT),
            global_window: Duration::from_secs(
                parse_optional_u64("FH_GLOBAL_WINDOW_SECS")?.unwrap_or(DEFAULT_GLOBAL_WINDOW_SECS),
            ),
        };

        let trust_forwarded = parse_bool_env("FH_TRUST_FORWARDED")?.unwrap_or(false);
        let max_request_bytes = parse_optional_u64("FH_MAX_REQUEST_BYTES")?
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_MAX_REQUEST_BYTES);

        let audit_log_file = env::var("AUDIT_LOG_FILE").ok();
        let rotation = RotationConfig {
            max_bytes: parse_optional_u64("LOG_MAX_BYTES")?,
            keep: parse_optional_u64("LOG_ROTATE_KEEP")?.unwrap_or(1) as usize,
            compress: parse_bool_env("LOG_ROTATE_COMPRESS")?.unwrap_or(false),
        };

        Ok(Self {
            privacy_mode,
            model,
            api_key,
            base_url,
            model_timeout_ms,
            rate,
            trust_forwarded,
            max_request_bytes,
            audit_log_file,
            rotation,
        })
    }
}

fn parse_optional_u64(var: &str) -> Result<Option<u64>> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| anyhow!("{} must be a positive integer", var)),
        Ok(_) => Ok(None),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn parse_bool_env(var: &str) -> Result<Option<bool>> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => parse_bool(&value)
            .map(Some)
            .ok_or_else(|| anyhow!("{} must be a boolean (true/false/1/0)", var)),
        Ok(_) => Ok(None),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
