use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crm::copy::OpenAiSettings;
use platform_authn::TokenConfig;
use platform_db::DatabaseSettings;

pub const DEFAULT_JWT_TTL_MINUTES: i64 = 1440;
pub const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 300;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub tokens: TokenConfig,
    pub cors_allowed_origins: Vec<String>,
    pub openai: OpenAiSettings,
    pub reminder_interval: Duration,
    pub reminders_enabled: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database = DatabaseSettings::from_lookup(&lookup)?;

        let secret = lookup("JWT_SECRET").ok_or_else(|| anyhow!("missing env JWT_SECRET"))?;
        let ttl_minutes = parse_or(&lookup, "JWT_TTL_MINUTES", DEFAULT_JWT_TTL_MINUTES)?;
        let tokens = TokenConfig::new(secret.trim(), ttl_minutes).context("invalid JWT_SECRET")?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        let mut openai = OpenAiSettings::default();
        if let Some(key) = lookup("OPENAI_API_KEY") {
            openai.api_key = key.trim().to_string();
        }
        if let Some(base_url) = lookup("OPENAI_BASE_URL").filter(|v| !v.trim().is_empty()) {
            openai.base_url = base_url.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|v| !v.trim().is_empty()) {
            openai.model = model.trim().to_string();
        }
        openai.max_tokens = parse_or(&lookup, "OPENAI_MAX_TOKENS", openai.max_tokens)?;
        openai.temperature = parse_or(&lookup, "OPENAI_TEMPERATURE", openai.temperature)?;

        let interval_secs =
            parse_or(&lookup, "REMINDER_INTERVAL_SECS", DEFAULT_REMINDER_INTERVAL_SECS)?;
        if interval_secs == 0 {
            return Err(anyhow!("REMINDER_INTERVAL_SECS must be greater than zero"));
        }
        let reminders_enabled = lookup("REMINDERS_ENABLED")
            .map(|val| matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(true);

        Ok(Self {
            database,
            tokens,
            cors_allowed_origins,
            openai,
            reminder_interval: Duration::from_secs(interval_secs),
            reminders_enabled,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("invalid value for {key}: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_values_are_set() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://crm@localhost/crm"),
            ("JWT_SECRET", SECRET),
        ]))
        .unwrap();
        assert_eq!(config.tokens.ttl_minutes, DEFAULT_JWT_TTL_MINUTES);
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.reminder_interval, Duration::from_secs(300));
        assert!(config.reminders_enabled);
        assert!(!config.openai.is_configured());
        assert_eq!(config.openai.model, "gpt-4o-mini");
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://crm@localhost/crm"),
            ("JWT_SECRET", SECRET),
            ("JWT_TTL_MINUTES", "30"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9000/v1/"),
            ("OPENAI_MAX_TOKENS", "800"),
            ("REMINDER_INTERVAL_SECS", "60"),
            ("REMINDERS_ENABLED", "false"),
        ]))
        .unwrap();
        assert_eq!(config.tokens.ttl_minutes, 30);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.openai.is_configured());
        assert_eq!(config.openai.base_url, "http://localhost:9000/v1");
        assert_eq!(config.openai.max_tokens, 800);
        assert_eq!(config.reminder_interval, Duration::from_secs(60));
        assert!(!config.reminders_enabled);
    }

    #[test]
    fn missing_or_weak_secret_fails() {
        let base = [("DATABASE_URL", "postgres://crm@localhost/crm")];
        assert!(AppConfig::from_lookup(lookup(&base)).is_err());
        assert!(
            AppConfig::from_lookup(lookup(&[base[0], ("JWT_SECRET", "short")])).is_err()
        );
    }

    #[test]
    fn bad_numbers_fail() {
        let result = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://crm@localhost/crm"),
            ("JWT_SECRET", SECRET),
            ("REMINDER_INTERVAL_SECS", "soon"),
        ]));
        assert!(result.is_err());
    }
}
