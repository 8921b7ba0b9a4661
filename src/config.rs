use crate::utils::constants::{
    DEFAULT_CONVERTER_WORKERS, DEFAULT_IMAGE_EXTENSIONS, DEFAULT_LLM_TIMEOUT_SECS,
    DEFAULT_MARKITDOWN_BIN, DEFAULT_MAX_CONTENT_LENGTH, DEFAULT_PORT,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_UPLOAD_FOLDER, MB, OPENAI_BASE_URL, OPENAI_MODEL,
};
use crate::utils::get_env::{env_var_to_vec, get_optional_env_var, parse_env_var_or};
use anyhow::{Context, Error};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

/// Deployment profile selected through `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Development,
    Production,
    Test,
}

impl Profile {
    /// Unknown names fall back to development.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Profile::Production,
            "test" | "testing" => Profile::Test,
            _ => Profile::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Development => "development",
            Profile::Production => "production",
            Profile::Test => "test",
        }
    }
}

/// Process-wide settings, read once at start-up and shared read-only afterwards.
#[derive(Clone)]
pub struct AppConfig {
    pub profile: Profile,
    pub debug: bool,
    pub host: IpAddr,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_content_length: usize,
    /// Lowercase, dot-prefixed.
    pub image_extensions: Vec<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    /// Bounds remote downloads only.
    pub request_timeout: Duration,
    pub llm_timeout: Duration,
    /// Zero selects synchronous handling on the request task.
    pub converter_workers: usize,
    pub markitdown_bin: String,
    pub use_system_proxy: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("profile", &self.profile)
            .field("debug", &self.debug)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("upload_dir", &self.upload_dir)
            .field("max_content_length", &self.max_content_length)
            .field("image_extensions", &self.image_extensions)
            .field("has_api_key", &self.has_api_key())
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("llm_timeout", &self.llm_timeout)
            .field("converter_workers", &self.converter_workers)
            .field("markitdown_bin", &self.markitdown_bin)
            .finish()
    }
}

impl AppConfig {
    /// Built-in defaults for a profile, without consulting the environment.
    pub fn for_profile(profile: Profile) -> Self {
        let (debug, upload_dir, converter_workers, use_system_proxy) = match profile {
            Profile::Development => (
                true,
                PathBuf::from(DEFAULT_UPLOAD_FOLDER),
                DEFAULT_CONVERTER_WORKERS,
                true,
            ),
            Profile::Production => (
                false,
                PathBuf::from(DEFAULT_UPLOAD_FOLDER),
                DEFAULT_CONVERTER_WORKERS,
                true,
            ),
            Profile::Test => (
                false,
                std::env::temp_dir().join("markitdown-web-uploads"),
                0,
                false,
            ),
        };

        Self {
            profile,
            debug,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            upload_dir,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            openai_api_key: None,
            openai_model: OPENAI_MODEL.to_string(),
            openai_base_url: OPENAI_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            converter_workers,
            markitdown_bin: DEFAULT_MARKITDOWN_BIN.to_string(),
            use_system_proxy,
        }
    }

    /// Profile from `APP_ENV`, then per-variable overrides (`.env` honoured).
    pub fn from_env() -> Result<Self, Error> {
        let profile = get_optional_env_var("APP_ENV")
            .map(|name| Profile::parse(&name))
            .unwrap_or(Profile::Development);
        let mut config = Self::for_profile(profile);

        if let Some(host) = get_optional_env_var("HOST") {
            config.host = host
                .parse()
                .with_context(|| format!("invalid value for HOST: {host:?}"))?;
        }
        config.port = parse_env_var_or("PORT", config.port)?;

        if let Some(dir) = get_optional_env_var("UPLOAD_FOLDER") {
            config.upload_dir = PathBuf::from(dir);
        }
        config.max_content_length =
            parse_env_var_or("MAX_CONTENT_LENGTH", config.max_content_length)?;

        let extensions = env_var_to_vec("IMAGE_EXTENSIONS");
        if !extensions.is_empty() {
            config.image_extensions = normalize_extensions(extensions);
        }

        config.openai_api_key = get_optional_env_var("OPENAI_API_KEY");
        if let Some(base_url) = get_optional_env_var("OPENAI_BASE_URL") {
            config.openai_base_url = base_url;
        }

        config.request_timeout = Duration::from_secs(parse_env_var_or(
            "REQUEST_TIMEOUT",
            config.request_timeout.as_secs(),
        )?);
        config.llm_timeout =
            Duration::from_secs(parse_env_var_or("LLM_TIMEOUT", config.llm_timeout.as_secs())?);
        config.converter_workers =
            parse_env_var_or("CONVERTER_WORKERS", config.converter_workers)?;
        if let Some(bin) = get_optional_env_var("MARKITDOWN_BIN") {
            config.markitdown_bin = bin;
        }

        Ok(config)
    }

    pub fn has_api_key(&self) -> bool {
        self.openai_api_key.is_some()
    }

    /// Rounded up, so a limit under or between whole MiB is never reported low.
    pub fn max_content_length_mb(&self) -> usize {
        self.max_content_length.div_ceil(MB)
    }

    /// Default tracing directive when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

/// Lowercases and dot-prefixes extension entries.
pub fn normalize_extensions(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|ext| {
            let ext = ext.trim().to_ascii_lowercase();
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{ext}")
            }
        })
        .collect()
}
