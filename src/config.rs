//! Runtime configuration.
//!
//! HTTP client settings, random-sampler budgets and suggestion debouncing.
//! Every value has a default; `from_env()` overrides them from `ROSETTE_*`
//! environment variables (a `.env` file is honoured when present).

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Default topic shown on first launch (Wikidata "Q8171", Word)
pub const DEFAULT_ENTITY_ID: &str = "Q8171";

/// Configuration for the reading core.
#[derive(Debug, Clone)]
pub struct RosetteConfig {
    /// HTTP client configuration.
    pub http: HttpConfig,

    /// Random-topic sampler configuration.
    pub random: RandomConfig,

    /// Quiet period before a suggestion query fires (milliseconds).
    pub suggest_debounce_ms: u64,

    /// Location of the JSON settings file, if file persistence is used.
    pub settings_path: Option<PathBuf>,
}

impl Default for RosetteConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            random: RandomConfig::default(),
            suggest_debounce_ms: 300,
            settings_path: None,
        }
    }
}

impl RosetteConfig {
    /// Load configuration from the environment on top of the defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(agent) = std::env::var("ROSETTE_USER_AGENT") {
            config.http.user_agent = agent;
        }
        if let Some(secs) = env_u64("ROSETTE_HTTP_TIMEOUT_SECS") {
            config.http.timeout_secs = secs;
        }
        if let Some(ms) = env_u64("ROSETTE_RATE_LIMIT_MS") {
            config.http.rate_limit_delay_ms = ms;
        }
        if let Some(attempts) = env_u64("ROSETTE_RANDOM_ATTEMPTS") {
            config.random.attempts_per_language = attempts as usize;
        }
        if let Some(ms) = env_u64("ROSETTE_RANDOM_ATTEMPT_DELAY_MS") {
            config.random.attempt_delay_ms = ms;
        }
        if let Some(ms) = env_u64("ROSETTE_RATE_LIMIT_COOLDOWN_MS") {
            config.random.rate_limit_cooldown_ms = ms;
        }
        if let Some(ms) = env_u64("ROSETTE_SUGGEST_DEBOUNCE_MS") {
            config.suggest_debounce_ms = ms;
        }
        if let Ok(path) = std::env::var("ROSETTE_SETTINGS_PATH") {
            config.settings_path = Some(PathBuf::from(path));
        }
        config
    }

    /// Set the random-sampler configuration.
    pub fn random(mut self, random: RandomConfig) -> Self {
        self.random = random;
        self
    }

    /// Set the suggestion debounce period.
    pub fn suggest_debounce_ms(mut self, ms: u64) -> Self {
        self.suggest_debounce_ms = ms;
        self
    }

    /// Use a JSON settings file at `path`.
    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    /// Get the suggestion debounce period as Duration.
    pub fn suggest_debounce(&self) -> Duration {
        Duration::from_millis(self.suggest_debounce_ms)
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// User-Agent sent with every request (Wikimedia requires one).
    pub user_agent: String,

    /// Request timeout (seconds).
    pub timeout_secs: u64,

    /// Minimum spacing between consecutive requests (milliseconds).
    pub rate_limit_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("rosette/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            rate_limit_delay_ms: 100,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }
}

/// Random-topic sampler configuration.
#[derive(Debug, Clone)]
pub struct RandomConfig {
    /// Draws per language before moving on to the next one.
    pub attempts_per_language: usize,

    /// Pause between two draws (milliseconds).
    pub attempt_delay_ms: u64,

    /// Pause after an HTTP 429 from the random-article source (milliseconds).
    pub rate_limit_cooldown_ms: u64,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            attempts_per_language: 10,
            attempt_delay_ms: 1000,
            rate_limit_cooldown_ms: 5000,
        }
    }
}

impl RandomConfig {
    /// No pauses at all; used by tests and batch tooling.
    pub fn immediate(attempts_per_language: usize) -> Self {
        Self {
            attempts_per_language,
            attempt_delay_ms: 0,
            rate_limit_cooldown_ms: 0,
        }
    }

    pub fn attempt_delay(&self) -> Duration {
        Duration::from_millis(self.attempt_delay_ms)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_millis(self.rate_limit_cooldown_ms)
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring non-numeric configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RosetteConfig::default();
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.random.attempts_per_language, 10);
        assert_eq!(config.random.rate_limit_cooldown(), Duration::from_secs(5));
        assert_eq!(config.suggest_debounce(), Duration::from_millis(300));
        assert!(config.settings_path.is_none());
    }

    #[test]
    fn test_immediate_random_config() {
        let random = RandomConfig::immediate(3);
        assert_eq!(random.attempts_per_language, 3);
        assert_eq!(random.attempt_delay(), Duration::ZERO);
        assert_eq!(random.rate_limit_cooldown(), Duration::ZERO);
    }

    #[test]
    fn test_builder_pattern() {
        let config = RosetteConfig::default()
            .suggest_debounce_ms(50)
            .random(RandomConfig::immediate(1))
            .with_settings_path(PathBuf::from("/tmp/rosette.json"));

        assert_eq!(config.suggest_debounce_ms, 50);
        assert_eq!(config.random.attempts_per_language, 1);
        assert_eq!(config.settings_path, Some(PathBuf::from("/tmp/rosette.json")));
    }
}
