//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast on malformed values.
//! Sensitive values wrapped in secrecy::SecretString to prevent log leaks.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PROCESSING_TIMEOUT: Duration = Duration::from_secs(45);
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);
pub const DEFAULT_TEMPLATE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_MODEL_ID: &str = "example-model-large";
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(15);

const TEMPLATES_FILE: &str = "data/analysis_templates.json";

#[derive(Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub processing_timeout: Duration,
    pub shutdown_grace: Duration,
    pub generator: GeneratorConfig,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

/// Which report generator to run.
#[derive(Debug)]
pub enum GeneratorConfig {
    Template { path: PathBuf, delay: Duration },
    Remote(RemoteConfig),
}

#[derive(Debug)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub request_timeout: Duration,
    pub prompt_catalog: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars(&lookup);

        let listen_addr = match vars.get("AI_ENGINE_ADDR") {
            Some(addr) => addr
                .parse()
                .map_err(|e| Error::Config(format!("AI_ENGINE_ADDR={addr:?}: {e}")))?,
            None => {
                let port = vars.parse::<u16>("PORT")?.unwrap_or(DEFAULT_PORT);
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let processing_timeout = vars
            .parse::<u64>("AI_PROCESSING_TIMEOUT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_PROCESSING_TIMEOUT);

        let shutdown_grace = vars
            .parse::<u64>("AI_SHUTDOWN_GRACE_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SHUTDOWN_GRACE);

        let generator = match vars.get("AI_GENERATOR").as_deref().map(str::trim) {
            None | Some("") | Some("template") => GeneratorConfig::Template {
                path: vars
                    .get("ANALYSIS_TEMPLATES_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_templates_path),
                delay: vars
                    .parse::<u64>("AI_TEMPLATE_DELAY_MS")?
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_TEMPLATE_DELAY),
            },
            Some("remote") => GeneratorConfig::Remote(RemoteConfig {
                endpoint: vars.required("LLM_API_URL")?,
                api_key: vars.get("LLM_API_KEY").map(SecretString::from),
                model: vars
                    .get("LLM_MODEL_ID")
                    .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
                request_timeout: vars
                    .parse::<u64>("LLM_TIMEOUT_SECS")?
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_LLM_TIMEOUT),
                prompt_catalog: vars.get("PROMPT_FILE_PATH").map(PathBuf::from),
            }),
            Some(other) => {
                return Err(Error::Config(format!(
                    "AI_GENERATOR must be \"template\" or \"remote\", got {other:?}"
                )));
            }
        };

        Ok(Self {
            listen_addr,
            processing_timeout,
            shutdown_grace,
            generator,
            otel_endpoint: vars.get("OTEL_ENDPOINT"),
            log_level: vars.get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Variable lookup that treats blank values as unset.
struct Vars<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, name: &str) -> Result<String> {
        self.get(name)
            .ok_or_else(|| Error::Config(format!("required environment variable {name} is not set")))
    }

    fn parse<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(name)
            .map(|raw| {
                raw.trim()
                    .parse()
                    .map_err(|e| Error::Config(format!("{name}={raw:?}: {e}")))
            })
            .transpose()
    }
}

/// `data/analysis_templates.json` relative to the working directory, else
/// next to the executable.
fn default_templates_path() -> PathBuf {
    let local = PathBuf::from(TEMPLATES_FILE);
    if local.exists() {
        return local;
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(TEMPLATES_FILE)))
        .filter(|candidate| candidate.exists())
        .unwrap_or(local)
}
