//! Engine configuration.
//!
//! `Settings` is loaded from a TOML file; every field has a default so an
//! empty file works. Secrets (API keys) are taken from the environment by
//! the binary, not from the file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Zakazflow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// A session untouched longer than this is discarded and replaced.
    #[serde(default = "default_max_silence_seconds")]
    pub max_silence_seconds: u64,

    /// Quiet window between a finalize trigger and finalization.
    #[serde(default = "default_quiet_window_seconds")]
    pub quiet_window_seconds: u64,

    /// How long the cancel affordance stays on a sent notice.
    #[serde(default = "default_keyboard_ttl_seconds")]
    pub keyboard_ttl_seconds: u64,

    /// LLM cooldown after a quota-exhaustion failure.
    #[serde(default = "default_quota_cooldown_seconds")]
    pub quota_cooldown_seconds: u64,

    /// LLM cooldown after a rate-limit failure.
    #[serde(default = "default_rate_limit_cooldown_seconds")]
    pub rate_limit_cooldown_seconds: u64,

    /// How many recent transcript messages the classifier sees as context.
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Known shop phone numbers, excluded from reconciled customer phones.
    #[serde(default)]
    pub shop_phones: Vec<String>,

    /// Persistence API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Optional Authorization header value for the persistence API.
    #[serde(default)]
    pub api_auth_token: Option<String>,

    /// Model for the LLM classifier and extractor.
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Channel receiving finalized order notices. None means reply in the
    /// source chat.
    #[serde(default)]
    pub order_channel_id: Option<i64>,

    /// Channel receiving definitively non-order messages.
    #[serde(default)]
    pub error_channel_id: Option<i64>,

    /// Channel receiving per-message classifier verdicts for review.
    #[serde(default)]
    pub ai_check_channel_id: Option<i64>,
}

fn default_max_silence_seconds() -> u64 {
    120
}

fn default_quiet_window_seconds() -> u64 {
    5
}

fn default_keyboard_ttl_seconds() -> u64 {
    30
}

fn default_quota_cooldown_seconds() -> u64 {
    30 * 60
}

fn default_rate_limit_cooldown_seconds() -> u64 {
    60
}

fn default_context_window() -> usize {
    5
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_openai_model() -> String {
    "gpt-4.1-mini".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_silence_seconds: default_max_silence_seconds(),
            quiet_window_seconds: default_quiet_window_seconds(),
            keyboard_ttl_seconds: default_keyboard_ttl_seconds(),
            quota_cooldown_seconds: default_quota_cooldown_seconds(),
            rate_limit_cooldown_seconds: default_rate_limit_cooldown_seconds(),
            context_window: default_context_window(),
            shop_phones: Vec::new(),
            api_base_url: default_api_base_url(),
            api_auth_token: None,
            openai_model: default_openai_model(),
            order_channel_id: None,
            error_channel_id: None,
            ai_check_channel_id: None,
        }
    }
}

impl Settings {
    pub fn max_silence(&self) -> Duration {
        Duration::from_secs(self.max_silence_seconds)
    }

    pub fn quiet_window(&self) -> Duration {
        Duration::from_secs(self.quiet_window_seconds)
    }

    pub fn keyboard_ttl(&self) -> Duration {
        Duration::from_secs(self.keyboard_ttl_seconds)
    }

    pub fn quota_cooldown(&self) -> Duration {
        Duration::from_secs(self.quota_cooldown_seconds)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.max_silence_seconds, 120);
        assert_eq!(settings.quiet_window_seconds, 5);
        assert_eq!(settings.quota_cooldown_seconds, 1800);
        assert_eq!(settings.rate_limit_cooldown_seconds, 60);
        assert_eq!(settings.context_window, 5);
        assert!(settings.shop_phones.is_empty());
    }

    #[test]
    fn test_settings_empty_toml_uses_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.quiet_window(), Duration::from_secs(5));
        assert_eq!(settings.api_base_url, "http://localhost:8000");
        assert!(settings.order_channel_id.is_none());
    }

    #[test]
    fn test_settings_toml_overrides() {
        let toml_str = r#"
max_silence_seconds = 300
quiet_window_seconds = 10
shop_phones = ["+998712000000"]
order_channel_id = -100123456
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.max_silence_seconds, 300);
        assert_eq!(settings.quiet_window(), Duration::from_secs(10));
        assert_eq!(settings.shop_phones, vec!["+998712000000".to_string()]);
        assert_eq!(settings.order_channel_id, Some(-100_123_456));
    }

    #[test]
    fn test_settings_serde_roundtrip() {
        let mut settings = Settings::default();
        settings.api_auth_token = Some("Token abc".to_string());
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.api_auth_token.as_deref(), Some("Token abc"));
    }
}
