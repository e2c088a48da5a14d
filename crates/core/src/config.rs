//! Settings resolution: defaults, then the `.env` file, then the process
//! environment. Key matching is case-insensitive.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::debug;

pub const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub gemini_api_key: String,
    pub mem0_api_url: String,
    pub mem0_api_key: String,
    pub user_id: String,
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub applicationinsights_connection_string: String,
    pub input_device_name: String,
    pub output_device_name: String,
    /// Origins allowed by the CORS layer. Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            mem0_api_url: "http://localhost:8765".into(),
            mem0_api_key: String::new(),
            user_id: "default_user".into(),
            host: "0.0.0.0".into(),
            port: 8000,
            debug: false,
            applicationinsights_connection_string: String::new(),
            input_device_name: String::new(),
            output_device_name: String::new(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {field}: expected {expected}")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("failed to read env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

impl Settings {
    /// Merges key/value pairs over the defaults. `env` is applied after
    /// `file`, so environment values win.
    pub fn from_sources<F, E>(file: F, env: E) -> Result<Self, ConfigError>
    where
        F: IntoIterator<Item = (String, String)>,
        E: IntoIterator<Item = (String, String)>,
    {
        let mut settings = Settings::default();
        for (key, value) in file.into_iter().chain(env) {
            settings.apply(&key, value)?;
        }
        Ok(settings)
    }

    fn apply(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key.to_ascii_lowercase().as_str() {
            "gemini_api_key" => self.gemini_api_key = value,
            "mem0_api_url" => self.mem0_api_url = value,
            "mem0_api_key" => self.mem0_api_key = value,
            "user_id" => self.user_id = value,
            "host" => self.host = value,
            "port" => self.port = parse_port(value)?,
            "debug" => self.debug = parse_bool("debug", value)?,
            "applicationinsights_connection_string" => {
                self.applicationinsights_connection_string = value
            }
            "input_device_name" => self.input_device_name = value,
            "output_device_name" => self.output_device_name = value,
            "cors_allowed_origins" => {
                self.cors_allowed_origins = value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            }
            _ => {}
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn telemetry_enabled(&self) -> bool {
        !self.applicationinsights_connection_string.is_empty()
    }
}

fn parse_port(value: String) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            field: "port",
            value,
            expected: "an integer between 0 and 65535",
        })
}

fn parse_bool(field: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field,
            value,
            expected: "a boolean",
        }),
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "<redacted>" }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("mem0_api_url", &self.mem0_api_url)
            .field("mem0_api_key", &redact(&self.mem0_api_key))
            .field("user_id", &self.user_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("debug", &self.debug)
            .field(
                "applicationinsights_connection_string",
                &redact(&self.applicationinsights_connection_string),
            )
            .field("input_device_name", &self.input_device_name)
            .field("output_device_name", &self.output_device_name)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

type EnvironmentSource = Box<dyn Fn() -> Vec<(String, String)> + Send + Sync>;

/// Resolves [`Settings`] once and hands out the same `Arc` afterwards.
pub struct SettingsResolver {
    env_file: PathBuf,
    environment: EnvironmentSource,
    resolved: OnceLock<Arc<Settings>>,
}

impl SettingsResolver {
    pub fn new(env_file: impl Into<PathBuf>) -> Self {
        Self::with_environment(env_file, process_environment)
    }

    /// Like [`SettingsResolver::new`], reading environment pairs from
    /// `environment` instead of the process.
    pub fn with_environment<F>(env_file: impl Into<PathBuf>, environment: F) -> Self
    where
        F: Fn() -> Vec<(String, String)> + Send + Sync + 'static,
    {
        Self {
            env_file: env_file.into(),
            environment: Box::new(environment),
            resolved: OnceLock::new(),
        }
    }

    pub fn resolve(&self) -> Result<Arc<Settings>, ConfigError> {
        if let Some(settings) = self.resolved.get() {
            return Ok(settings.clone());
        }

        let file = read_env_file(&self.env_file)?;
        let settings = Arc::new(Settings::from_sources(file, (self.environment)())?);
        Ok(self.resolved.get_or_init(|| settings).clone())
    }
}

fn process_environment() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

fn read_env_file(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    let env_file_error = |source: dotenvy::Error| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => {
            debug!(path = %path.display(), "env file not found, skipping");
            return Ok(Vec::new());
        }
        Err(e) => return Err(env_file_error(e)),
    };

    iter.collect::<Result<Vec<_>, _>>().map_err(env_file_error)
}
