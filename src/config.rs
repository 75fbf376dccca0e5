use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::core::{gate::DEFAULT_MESSAGE_CAP, matcher::DEFAULT_ACCEPTANCE_THRESHOLD};
use crate::models::ScoringWeights;
use crate::services::moderation::{ModerationRule, DEFAULT_VALID_MAJORS};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub moderation: ModerationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps, state is lost on restart
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    pub capacity: Option<u64>,
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f64,
    #[serde(default = "default_message_cap")]
    pub message_cap: u32,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            acceptance_threshold: default_acceptance_threshold(),
            message_cap: default_message_cap(),
        }
    }
}

fn default_acceptance_threshold() -> f64 { DEFAULT_ACCEPTANCE_THRESHOLD }
fn default_message_cap() -> u32 { DEFAULT_MESSAGE_CAP }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_modules_weight")]
    pub modules: f64,
    #[serde(default = "default_year_weight")]
    pub year: f64,
    #[serde(default = "default_major_weight")]
    pub major: f64,
    #[serde(default = "default_mediums_weight")]
    pub mediums: f64,
    #[serde(default = "default_description_weight")]
    pub description: f64,
    #[serde(default = "default_keyword_cap")]
    pub keyword_cap: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            modules: default_modules_weight(),
            year: default_year_weight(),
            major: default_major_weight(),
            mediums: default_mediums_weight(),
            description: default_description_weight(),
            keyword_cap: default_keyword_cap(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            modules: config.modules,
            year: config.year,
            major: config.major,
            mediums: config.mediums,
            description: config.description,
            keyword_cap: config.keyword_cap,
        }
    }
}

fn default_modules_weight() -> f64 { 4.0 }
fn default_year_weight() -> f64 { 1.0 }
fn default_major_weight() -> f64 { 1.0 }
fn default_mediums_weight() -> f64 { 1.5 }
fn default_description_weight() -> f64 { 3.5 }
fn default_keyword_cap() -> f64 { 0.8 }

/// Moderation rules, evaluated in order; empty means the built-in set
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationSettings {
    #[serde(default)]
    pub rules: Vec<ModerationRule>,
    /// Accepted majors, case-insensitive; an empty list accepts any major
    #[serde(default = "default_valid_majors")]
    pub valid_majors: Vec<String>,
}

impl Default for ModerationSettings {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            valid_majors: default_valid_majors(),
        }
    }
}

fn default_valid_majors() -> Vec<String> {
    DEFAULT_VALID_MAJORS.iter().map(|m| m.to_string()).collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with STUDY_BUDDY__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., STUDY_BUDDY__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("STUDY_BUDDY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("STUDY_BUDDY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights::from(&self.scoring.weights)
    }
}

/// Apply well-known environment variables that do not follow the prefix scheme
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.modules, 4.0);
        assert_eq!(weights.year, 1.0);
        assert_eq!(weights.major, 1.0);
        assert_eq!(weights.mediums, 1.5);
        assert_eq!(weights.description, 3.5);
        assert_eq!(weights.keyword_cap, 0.8);
        assert_eq!(ScoringWeights::from(&weights), ScoringWeights::default());
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::default();
        assert_eq!(settings.storage.backend, StorageBackend::Memory);
        assert_eq!(settings.matching.message_cap, 2);
        assert_eq!(settings.matching.acceptance_threshold, 1.5);
        assert!(settings.moderation.rules.is_empty());
        assert!(settings.moderation.valid_majors.iter().any(|m| m == "computer science"));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("study-buddy-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
            [server]
            port = 9090

            [storage]
            backend = "postgres"

            [matching]
            message_cap = 3

            [moderation]
            valid_majors = ["Astronomy", "Physics"]

            [[moderation.rules]]
            pattern = "homework"
            action = "warn"
            message = "Keep it honest"
            "#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.storage.backend, StorageBackend::Postgres);
        assert_eq!(settings.matching.message_cap, 3);
        assert_eq!(settings.matching.acceptance_threshold, 1.5);
        assert_eq!(settings.moderation.rules.len(), 1);
        assert_eq!(settings.moderation.valid_majors, vec!["Astronomy", "Physics"]);
    }
}
