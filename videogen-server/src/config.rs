use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use global_constants::{DEFAULT_BACKEND_TIMEOUT_SECS, DEFAULT_PORT};
use strum::IntoEnumIterator;
use videogen_common::{BackendSettings, Profile};

/// Server configuration, read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub profile: Profile,
    pub host: String,
    pub port: u16,
    /// Overrides the profile's default model when registered
    pub default_model: Option<String>,
    /// Space used by the basic profile instead of the built-in one
    pub space_override: Option<String>,
    pub backend: BackendSettings,
    /// Connect the default model's backend at startup
    pub warmup_default_model: bool,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let profile = parse::<Profile>(get("VIDEOGEN_PROFILE"), "VIDEOGEN_PROFILE")
            .with_context(|| {
                let known: Vec<String> = Profile::iter().map(|p| p.to_string()).collect();
                format!("expected one of: {}", known.join(", "))
            })?
            .unwrap_or_default();
        let port = parse::<u16>(get("PORT"), "PORT")?.unwrap_or(DEFAULT_PORT);
        let timeout_secs = parse::<u64>(get("BACKEND_TIMEOUT_SECS"), "BACKEND_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(anyhow!("BACKEND_TIMEOUT_SECS must be positive"));
        }

        let defaults = BackendSettings::default();
        let backend = BackendSettings {
            hf_token: get("HF_TOKEN"),
            replicate_api_token: get("REPLICATE_API_TOKEN"),
            timeout: Duration::from_secs(timeout_secs),
            pipeline_command: get("LOCAL_PIPELINE_COMMAND").unwrap_or(defaults.pipeline_command),
            ffmpeg_path: get("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        };

        Ok(Self {
            profile,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            default_model: get("DEFAULT_MODEL"),
            space_override: get("HF_SPACE_URL"),
            backend,
            warmup_default_model: get("WARMUP_DEFAULT_MODEL")
                .map(|v| parse_flag(&v))
                .transpose()
                .context("WARMUP_DEFAULT_MODEL")?
                .unwrap_or(false),
            log_file: get("LOG_FILE").map(PathBuf::from),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(value: Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| anyhow!("invalid {key} value {v:?}: {e}"))
        })
        .transpose()
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("expected a boolean, got {other:?}")),
    }
}
