use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "PlantCare";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Square input edge expected by the MobileNetV2 classifier.
pub const IMG_SIZE: u32 = 224;

/// Maximum accepted upload body (16 MB).
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

const DEFAULT_BIND: &str = "127.0.0.1:5000";
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_LLM_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "plantcare_lib=info,plantcare=info,tower_http=warn"
}

/// Get the application data directory.
/// ~/PlantCare/ unless `PLANTCARE_HOME` overrides it.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from(APP_NAME))
}

/// Load `.env` from the working directory (or a parent) into the process
/// environment. A missing file is not an error. Existing variables win.
pub fn load_dotenv() -> Result<(), dotenvy::Error> {
    ignore_missing(dotenvy::dotenv().map(|_| ()))
}

/// Same as [`load_dotenv`] for an explicit file.
pub fn load_dotenv_from(path: &Path) -> Result<(), dotenvy::Error> {
    ignore_missing(dotenvy::from_path(path))
}

fn ignore_missing(result: Result<(), dotenvy::Error>) -> Result<(), dotenvy::Error> {
    match result {
        Err(e) if e.not_found() => Ok(()),
        other => other,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Settings for the hosted chat-completion service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub connect_timeout: Duration,
    /// Token cap for single-shot panel answers.
    pub learn_max_tokens: u32,
    /// Token cap for streamed follow-up answers.
    pub chat_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_LLM_URL.to_string(),
            api_key: None,
            model: DEFAULT_LLM_MODEL.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_LLM_CONNECT_TIMEOUT_SECS),
            learn_max_tokens: 1500,
            chat_max_tokens: 1024,
        }
    }
}

/// Process-wide configuration, built once at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub base_dir: PathBuf,
    pub model_path: PathBuf,
    pub class_names_path: PathBuf,
    pub session_ttl: Duration,
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Defaults rooted at `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let models = base_dir.join("models");
        Self {
            // Constant literal, always parses
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            model_path: models.join("mobilenetv2_best.onnx"),
            class_names_path: models.join("class_names.json"),
            base_dir,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            llm: LlmConfig::default(),
        }
    }

    /// Build from the process environment. Call [`load_dotenv`] first so
    /// `.env` values are visible.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Split out so tests need not touch
    /// the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_dir = lookup("PLANTCARE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(app_data_dir);
        let mut config = Self::with_base_dir(base_dir);

        let bind = lookup("PLANTCARE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        config.bind_addr = bind.parse().map_err(|_| ConfigError::InvalidValue {
            var: "PLANTCARE_BIND",
            value: bind.clone(),
        })?;

        if let Some(path) = lookup("PLANTCARE_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("PLANTCARE_CLASS_NAMES") {
            config.class_names_path = PathBuf::from(path);
        }
        if let Some(ttl) = lookup("PLANTCARE_SESSION_TTL_SECS") {
            let secs: u64 = ttl.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PLANTCARE_SESSION_TTL_SECS",
                value: ttl.clone(),
            })?;
            config.session_ttl = Duration::from_secs(secs);
        }

        config.llm.api_key = lookup("GROQ_API_KEY").filter(|k| !k.trim().is_empty());
        if let Some(url) = lookup("PLANTCARE_LLM_URL") {
            config.llm.api_url = url;
        }
        if let Some(model) = lookup("PLANTCARE_LLM_MODEL") {
            config.llm.model = model;
        }

        Ok(config)
    }

    /// Directory holding re-saved upload images, served under `/static/images`.
    pub fn static_images_dir(&self) -> PathBuf {
        self.static_dir().join("images")
    }

    /// Root of the `/static` mount.
    pub fn static_dir(&self) -> PathBuf {
        self.base_dir.join("static")
    }

    /// Resolve a session-relative image path (`images/upload_x.jpg`) on disk.
    pub fn resolve_static(&self, relative: &Path) -> PathBuf {
        self.static_dir().join(relative)
    }
}
