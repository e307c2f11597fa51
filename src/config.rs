use config_rs::Config as ConfigRs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::{env, str::FromStr as _};
use strum::{Display, EnumString};
use tracing::trace;

const ENVIRONMENT_VARIABLE: &str = "APP_ENVIRONMENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub tracing: TracingConfig,
    pub app: AppConfig,
    pub reddit: RedditConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Config {
    /// User agent sent to Reddit, derived from the configured application
    /// name and this crate's version.
    #[must_use]
    pub fn user_agent(&self) -> String {
        format!("{} v{}", self.app.name, env!("CARGO_PKG_VERSION"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TracingConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Public base URL of the deployment; the OAuth redirect URI is derived
    /// from it and must therefore be HTTPS-reachable.
    pub url: String,
    pub name: String,
    /// Issue-tracker URL linked from user-facing error messages.
    #[serde(default = "default_project_url")]
    pub project: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory where the archiver collaborator writes artifacts and the
    /// retention sweep deletes them.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Throughput value used before the first recalibration has run.
    #[serde(default = "default_average")]
    pub default_average: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_average: default_average(),
        }
    }
}

fn default_project_url() -> String {
    "https://github.com/yourusername/redditarchiver-core".to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output")
}

const fn default_average() -> f64 {
    crate::jobs::estimate::DEFAULT_AVERAGE
}

/// Environment selection via `APP_ENVIRONMENT`, defaulting to development.
#[must_use]
pub fn set_environment() -> Environment {
    env::var(ENVIRONMENT_VARIABLE)
        .ok()
        .and_then(|s| Environment::from_str(&s).ok())
        .unwrap_or_default()
}

/// Read the configuration for an environment from `config/{environment}`,
/// with `APP_*` environment variables taking precedence.
#[must_use]
pub fn read_config(environment: &Environment) -> Config {
    let config_file_name = format!("config/{environment}");

    trace!("Reading configuration from: {}", config_file_name);

    ConfigRs::builder()
        .add_source(config_rs::File::with_name(&config_file_name))
        .add_source(config_rs::Environment::with_prefix("APP").separator("__"))
        .build()
        .expect("Failed to read configuration")
        .try_deserialize()
        .expect("Failed to deserialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_from_snake_case() {
        assert_eq!(
            Environment::from_str("production").unwrap(),
            Environment::Production
        );
        assert_eq!(Environment::from_str("test").unwrap(), Environment::Test);
        assert!(Environment::from_str("staging").is_err());
    }

    #[test]
    fn runtime_defaults_match_the_fallback_average() {
        let runtime = RuntimeConfig::default();
        assert!((runtime.default_average - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn user_agent_carries_name_and_version() {
        let config = crate::tests::support::test_config();
        let agent = config.user_agent();
        assert!(agent.starts_with(&config.app.name));
        assert!(agent.contains(env!("CARGO_PKG_VERSION")));
    }
}
