use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_COUNTRY: &str = "India";
const DEFAULT_OUTPUT_DIR: &str = "data/output";
const MAX_DELAY: Duration = Duration::from_secs(600);
const MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set (required for the selected search engine)")]
    Missing(&'static str),

    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EngineKind {
    /// Google organic results through SerpAPI
    Serpapi,
    /// Gemini grounding with Google Search
    Gemini,
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serpapi" => Ok(EngineKind::Serpapi),
            "gemini" => Ok(EngineKind::Gemini),
            other => Err(format!("expected 'serpapi' or 'gemini', got '{other}'")),
        }
    }
}

#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Settings for one process, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub engine: EngineKind,
    pub serpapi_key: Option<Secret>,
    pub gemini_key: Option<Secret>,
    pub gemini_model: Option<String>,
    pub country: String,
    pub results_per_query: usize,
    pub search_delay: Duration,
    pub search_jitter: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub relevance_threshold: f64,
    pub min_records: usize,
    pub min_queries: usize,
    pub max_queries: usize,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineKind::Serpapi,
            serpapi_key: None,
            gemini_key: None,
            gemini_model: None,
            country: DEFAULT_COUNTRY.to_string(),
            results_per_query: 15,
            search_delay: Duration::from_secs(1),
            search_jitter: Duration::ZERO,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(20),
            relevance_threshold: 0.6,
            min_records: 5,
            min_queries: 5,
            max_queries: 50,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parses values only; call [`Config::validate`] once CLI overrides are applied.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let config = Self {
            engine: parse_or(&get, "SEARCH_ENGINE", defaults.engine)?,
            serpapi_key: get("SERPAPI_KEY").map(Secret::new),
            gemini_key: get("GEMINI_API_KEY").map(Secret::new),
            gemini_model: get("GEMINI_MODEL"),
            country: get("TARGET_COUNTRY").unwrap_or(defaults.country),
            results_per_query: parse_or(&get, "RESULTS_PER_QUERY", defaults.results_per_query)?,
            search_delay: millis_or(&get, "SEARCH_DELAY_MS", defaults.search_delay)?,
            search_jitter: millis_or(&get, "SEARCH_JITTER_MS", defaults.search_jitter)?,
            max_retries: parse_or(&get, "MAX_RETRIES", defaults.max_retries)?,
            retry_delay: millis_or(&get, "RETRY_DELAY_MS", defaults.retry_delay)?,
            request_timeout: Duration::from_secs(parse_or(
                &get,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            relevance_threshold: parse_or(
                &get,
                "RELEVANCE_THRESHOLD",
                defaults.relevance_threshold,
            )?,
            min_records: parse_or(&get, "MIN_RECORDS", defaults.min_records)?,
            min_queries: parse_or(&get, "MIN_QUERIES", defaults.min_queries)?,
            max_queries: parse_or(&get, "MAX_QUERIES", defaults.max_queries)?,
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        };
        Ok(config)
    }

    /// Checks ranges and engine credentials. Runs before any network activity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_ranges()?;
        match self.engine {
            EngineKind::Serpapi if self.serpapi_key.is_none() => {
                Err(ConfigError::Missing("SERPAPI_KEY"))
            }
            EngineKind::Gemini if self.gemini_key.is_none() => {
                Err(ConfigError::Missing("GEMINI_API_KEY"))
            }
            _ => Ok(()),
        }
    }

    /// Numeric checks only; enough for commands that never touch the network.
    pub fn validate_ranges(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.relevance_threshold) {
            return Err(invalid(
                "RELEVANCE_THRESHOLD",
                self.relevance_threshold,
                "must be within 0.0..=1.0",
            ));
        }
        if self.results_per_query == 0 {
            return Err(invalid("RESULTS_PER_QUERY", 0, "must be at least 1"));
        }
        if self.min_queries == 0 || self.min_queries > self.max_queries {
            return Err(invalid(
                "MIN_QUERIES",
                self.min_queries,
                "must be at least 1 and not above MAX_QUERIES",
            ));
        }
        if self.request_timeout.is_zero() || self.request_timeout > MAX_DELAY {
            return Err(invalid(
                "REQUEST_TIMEOUT_SECS",
                self.request_timeout.as_secs(),
                "must be within 1..=600",
            ));
        }
        if self.max_retries > MAX_ATTEMPTS {
            return Err(invalid("MAX_RETRIES", self.max_retries, "must be at most 10"));
        }
        for (key, value) in [
            ("SEARCH_DELAY_MS", self.search_delay),
            ("SEARCH_JITTER_MS", self.search_jitter),
            ("RETRY_DELAY_MS", self.retry_delay),
        ] {
            if value > MAX_DELAY {
                return Err(invalid(key, value.as_millis(), "must be at most 600000"));
            }
        }
        Ok(())
    }

    /// Creates `output_dir` up front so an unusable path fails before any search.
    pub fn prepare_output_dir(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            invalid("OUTPUT_DIR", self.output_dir.display(), &e.to_string())
        })
    }

    pub fn clamp_query_count(&self, count: usize) -> usize {
        count.clamp(self.min_queries, self.max_queries)
    }
}

fn invalid(key: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn millis_or(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let ms: u64 = parse_or(get, key, default.as_millis() as u64)?;
    Ok(Duration::from_millis(ms))
}
