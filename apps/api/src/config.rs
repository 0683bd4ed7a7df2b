use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Deployment environment. Only non-production environments may substitute the
/// canned fallback review for a failed scoring call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Production,
    Development,
    Test,
}

impl AppEnvironment {
    pub fn allows_fallback(self) -> bool {
        !matches!(self, AppEnvironment::Production)
    }
}

impl FromStr for AppEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(AppEnvironment::Production),
            "development" | "dev" => Ok(AppEnvironment::Development),
            "test" => Ok(AppEnvironment::Test),
            other => Err(format!(
                "unknown environment '{other}' (expected production, development or test)"
            )),
        }
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AppEnvironment::Production => "production",
            AppEnvironment::Development => "development",
            AppEnvironment::Test => "test",
        })
    }
}

/// What the pipeline does when a supplied job posting cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobParseFailurePolicy {
    /// Fail the whole analysis.
    #[default]
    Abort,
    /// Log a warning and analyze the resume without job context.
    Continue,
}

impl FromStr for JobParseFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(JobParseFailurePolicy::Abort),
            "continue" => Ok(JobParseFailurePolicy::Continue),
            other => Err(format!(
                "unknown job parse failure policy '{other}' (expected abort or continue)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String },
    Memory,
}

/// Tunables for `ResumeAnalyzer`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub preprocess_threshold_chars: usize,
    pub preprocess_chunk_chars: usize,
    pub stored_content_max_chars: usize,
    pub max_resume_chars: usize,
    pub pipeline_timeout: Duration,
    pub max_validation_retries: u32,
    pub job_parse_failure: JobParseFailurePolicy,
    pub allow_fallback: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            preprocess_threshold_chars: 12_000,
            preprocess_chunk_chars: 6_000,
            stored_content_max_chars: 10_000,
            max_resume_chars: 100_000,
            pipeline_timeout: Duration::from_secs(180),
            max_validation_retries: 0,
            job_parse_failure: JobParseFailurePolicy::Abort,
            allow_fallback: false,
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub storage: StorageBackend,
    pub port: u16,
    pub rust_log: String,
    pub app_env: AppEnvironment,
    pub rate_limit_min_interval: Duration,
    pub analysis: AnalysisSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = AnalysisSettings::default();
        let app_env = parse_var(
            "APP_ENV",
            optional_env("APP_ENV"),
            AppEnvironment::Production,
        )?;

        let storage = match optional_env("STORAGE_BACKEND")
            .as_deref()
            .map(str::trim)
            .unwrap_or("postgres")
        {
            "postgres" => StorageBackend::Postgres {
                database_url: require_env("DATABASE_URL")?,
            },
            "memory" => StorageBackend::Memory,
            other => bail!("STORAGE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        };

        let analysis = AnalysisSettings {
            preprocess_threshold_chars: parse_var(
                "PREPROCESS_THRESHOLD_CHARS",
                optional_env("PREPROCESS_THRESHOLD_CHARS"),
                defaults.preprocess_threshold_chars,
            )?,
            preprocess_chunk_chars: parse_var(
                "PREPROCESS_CHUNK_CHARS",
                optional_env("PREPROCESS_CHUNK_CHARS"),
                defaults.preprocess_chunk_chars,
            )?,
            stored_content_max_chars: parse_var(
                "STORED_CONTENT_MAX_CHARS",
                optional_env("STORED_CONTENT_MAX_CHARS"),
                defaults.stored_content_max_chars,
            )?,
            max_resume_chars: parse_var(
                "MAX_RESUME_CHARS",
                optional_env("MAX_RESUME_CHARS"),
                defaults.max_resume_chars,
            )?,
            pipeline_timeout: Duration::from_secs(parse_var(
                "PIPELINE_TIMEOUT_SECS",
                optional_env("PIPELINE_TIMEOUT_SECS"),
                defaults.pipeline_timeout.as_secs(),
            )?),
            max_validation_retries: parse_var(
                "MAX_VALIDATION_RETRIES",
                optional_env("MAX_VALIDATION_RETRIES"),
                defaults.max_validation_retries,
            )?,
            job_parse_failure: parse_var(
                "JOB_PARSE_FAILURE",
                optional_env("JOB_PARSE_FAILURE"),
                defaults.job_parse_failure,
            )?,
            allow_fallback: app_env.allows_fallback(),
        };

        if analysis.preprocess_chunk_chars == 0 {
            bail!("PREPROCESS_CHUNK_CHARS must be greater than zero");
        }

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            storage,
            port: parse_var("PORT", optional_env("PORT"), 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            app_env,
            rate_limit_min_interval: Duration::from_millis(parse_var(
                "RATE_LIMIT_MIN_INTERVAL_MS",
                optional_env("RATE_LIMIT_MIN_INTERVAL_MS"),
                300u64,
            )?),
            analysis,
        })
    }

    /// Memory-backed configuration for router tests.
    #[cfg(test)]
    pub fn for_tests(analysis: AnalysisSettings) -> Self {
        Config {
            anthropic_api_key: "test-key".to_string(),
            storage: StorageBackend::Memory,
            port: 0,
            rust_log: "debug".to_string(),
            app_env: AppEnvironment::Test,
            rate_limit_min_interval: Duration::ZERO,
            analysis,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parses an optional variable, falling back to `default` when unset.
fn parse_var<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has invalid value '{value}': {e}")),
    }
}
