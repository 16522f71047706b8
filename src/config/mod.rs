use std::env;
use std::fmt;

/// Distinguishes runtime behavior for different stages of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub matcher: MatcherConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let matcher = match env::var("APP_TITLE_SIMILARITY") {
            Ok(value) => {
                let threshold = value
                    .parse::<f32>()
                    .map_err(|_| ConfigError::InvalidThreshold {
                        value: value.clone(),
                    })?;
                MatcherConfig::new(threshold)
                    .ok_or(ConfigError::InvalidThreshold { value })?
            }
            Err(_) => MatcherConfig::default(),
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            matcher,
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

const DEFAULT_TITLE_SIMILARITY: f32 = 0.6;

/// Tuning for the duplicate matcher, passed explicitly to the store so the
/// threshold is never buried in matching code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatcherConfig {
    pub title_similarity_threshold: f32,
}

impl MatcherConfig {
    /// Build a config, rejecting thresholds outside `(0.0, 1.0]`.
    pub fn new(title_similarity_threshold: f32) -> Option<Self> {
        if title_similarity_threshold.is_finite()
            && title_similarity_threshold > 0.0
            && title_similarity_threshold <= 1.0
        {
            Some(Self {
                title_similarity_threshold,
            })
        } else {
            None
        }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            title_similarity_threshold: DEFAULT_TITLE_SIMILARITY,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidThreshold { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidThreshold { value } => {
                write!(
                    f,
                    "APP_TITLE_SIMILARITY must be a float in (0.0, 1.0], got '{}'",
                    value
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
