use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_BATCH_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub count: usize,
    pub max_concurrency: Option<usize>,
    pub attempt_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub batch: BatchConfig,
    pub output_dir: PathBuf,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_json: bool,
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            api_base: None,
            model: None,
            timeout_secs: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = non_empty_env("GEMINI_API_KEY")
            .or_else(|| non_empty_env("API_KEY"))
            .or_else(|| non_empty_env("GOOGLE_API_KEY"));
        let api_base = non_empty_env("GEMINI_API_BASE");
        let model = non_empty_env("GEMINI_IMAGE_MODEL");
        let timeout_secs = non_empty_env("GEMINI_TIMEOUT_SECS").and_then(|s| s.parse().ok());

        GeminiConfig {
            api_key,
            api_base,
            model,
            timeout_secs,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn api_base(&self) -> String {
        self.api_base
            .as_deref()
            .map(|base| base.trim().trim_end_matches('/').to_string())
            .filter(|base| !base.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            count: DEFAULT_BATCH_SIZE,
            max_concurrency: None,
            attempt_timeout: None,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let count = non_empty_env("MOODWALL_BATCH_SIZE")
            .and_then(|s| s.parse().ok())
            .filter(|count: &usize| *count > 0)
            .unwrap_or(DEFAULT_BATCH_SIZE);
        let max_concurrency = non_empty_env("MOODWALL_MAX_CONCURRENCY")
            .and_then(|s| s.parse().ok())
            .filter(|limit: &usize| *limit > 0);
        let attempt_timeout = non_empty_env("MOODWALL_ATTEMPT_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .map(Duration::from_secs);

        BatchConfig {
            count,
            max_concurrency,
            attempt_timeout,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gemini: GeminiConfig::default(),
            batch: BatchConfig::default(),
            output_dir: PathBuf::from("wallpapers"),
            log_level: None,
            log_file: None,
            log_json: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let output_dir = non_empty_env("MOODWALL_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("wallpapers"));

        Config {
            gemini: GeminiConfig::from_env(),
            batch: BatchConfig::from_env(),
            output_dir,
            log_level: non_empty_env("MOODWALL_LOG_LEVEL"),
            log_file: non_empty_env("MOODWALL_LOG_FILE").map(PathBuf::from),
            log_json: non_empty_env("MOODWALL_LOG_JSON")
                .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_batch(mut self, config: BatchConfig) -> Self {
        self.batch = config;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn with_log_json(mut self, enabled: bool) -> Self {
        self.log_json = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // The process environment is shared by every test thread.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "GEMINI_API_KEY",
        "API_KEY",
        "GOOGLE_API_KEY",
        "GEMINI_API_BASE",
        "GEMINI_IMAGE_MODEL",
        "GEMINI_TIMEOUT_SECS",
        "MOODWALL_BATCH_SIZE",
        "MOODWALL_MAX_CONCURRENCY",
        "MOODWALL_ATTEMPT_TIMEOUT_SECS",
        "MOODWALL_OUTPUT_DIR",
        "MOODWALL_LOG_LEVEL",
        "MOODWALL_LOG_FILE",
        "MOODWALL_LOG_JSON",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_from_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = Config::from_env();
        assert!(config.gemini.api_key.is_none());
        assert_eq!(config.batch.count, DEFAULT_BATCH_SIZE);
        assert_eq!(config.output_dir, PathBuf::from("wallpapers"));
        assert!(config.log_file.is_none());
        assert!(!config.log_json);

        // API key fallback order.
        env::set_var("GOOGLE_API_KEY", "google");
        assert_eq!(GeminiConfig::from_env().api_key.as_deref(), Some("google"));
        env::set_var("API_KEY", "generic");
        assert_eq!(GeminiConfig::from_env().api_key.as_deref(), Some("generic"));
        env::set_var("GEMINI_API_KEY", "  gemini  ");
        assert_eq!(GeminiConfig::from_env().api_key.as_deref(), Some("gemini"));
        env::set_var("GEMINI_API_KEY", "   ");
        assert_eq!(GeminiConfig::from_env().api_key.as_deref(), Some("generic"));

        env::set_var("GEMINI_TIMEOUT_SECS", "45");
        env::set_var("GEMINI_IMAGE_MODEL", "gemini-3-pro-image-preview");
        let gemini = GeminiConfig::from_env();
        assert_eq!(gemini.timeout(), Duration::from_secs(45));
        assert_eq!(gemini.model(), "gemini-3-pro-image-preview");

        // Zero values fall back to their defaults.
        env::set_var("MOODWALL_BATCH_SIZE", "0");
        env::set_var("MOODWALL_MAX_CONCURRENCY", "0");
        env::set_var("MOODWALL_ATTEMPT_TIMEOUT_SECS", "0");
        let batch = BatchConfig::from_env();
        assert_eq!(batch.count, DEFAULT_BATCH_SIZE);
        assert!(batch.max_concurrency.is_none());
        assert!(batch.attempt_timeout.is_none());

        env::set_var("MOODWALL_BATCH_SIZE", "6");
        env::set_var("MOODWALL_MAX_CONCURRENCY", "2");
        env::set_var("MOODWALL_ATTEMPT_TIMEOUT_SECS", "30");
        let batch = BatchConfig::from_env();
        assert_eq!(batch.count, 6);
        assert_eq!(batch.max_concurrency, Some(2));
        assert_eq!(batch.attempt_timeout, Some(Duration::from_secs(30)));

        env::set_var("MOODWALL_BATCH_SIZE", "many");
        assert_eq!(BatchConfig::from_env().count, DEFAULT_BATCH_SIZE);

        env::set_var("MOODWALL_OUTPUT_DIR", "/tmp/moods");
        env::set_var("MOODWALL_LOG_LEVEL", "debug");
        env::set_var("MOODWALL_LOG_FILE", "/tmp/moodwall.log");
        env::set_var("MOODWALL_LOG_JSON", "TRUE");
        let config = Config::from_env();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/moods"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/moodwall.log")));
        assert!(config.log_json);

        clear_env();
    }

    #[test]
    fn test_gemini_defaults() {
        let config = GeminiConfig::new();
        assert_eq!(config.api_base(), DEFAULT_API_BASE);
        assert_eq!(config.model(), DEFAULT_IMAGE_MODEL);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_gemini_builder_trims_base() {
        let config = GeminiConfig::new()
            .with_api_key("key")
            .with_api_base("http://localhost:9000/v1beta/ ")
            .with_model("gemini-3-pro-image-preview")
            .with_timeout_secs(5);

        assert_eq!(config.api_key.as_deref(), Some("key"));
        assert_eq!(config.api_base(), "http://localhost:9000/v1beta");
        assert_eq!(config.model(), "gemini-3-pro-image-preview");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_batch_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.count, 4);
        assert!(config.max_concurrency.is_none());
        assert!(config.attempt_timeout.is_none());

        let limited = BatchConfig::new()
            .with_count(8)
            .with_max_concurrency(2)
            .with_attempt_timeout(Duration::from_secs(30));
        assert_eq!(limited.count, 8);
        assert_eq!(limited.max_concurrency, Some(2));
        assert_eq!(limited.attempt_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_config_output_dir() {
        let config = Config::new().with_output_dir("/tmp/walls");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/walls"));
        assert_eq!(Config::default().output_dir, PathBuf::from("wallpapers"));
    }
}
