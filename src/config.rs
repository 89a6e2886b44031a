use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value:?} ({source})")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("configuration failed validation: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

pub const DEFAULT_SHORTEST_PATH_MAX_DEPTH: u32 = 12;

/// Switches that shape emitted SQL and shortest-path arguments.
#[derive(Clone, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Replace every literal in emitted SQL with `$STRIPPED`
    pub strip_literals: bool,

    /// Maximum traversal depth reported for all-shortest-paths queries
    #[validate(range(
        min = 1,
        max = 1000,
        message = "Shortest path max depth must be between 1 and 1000"
    ))]
    pub shortest_path_max_depth: u32,

    /// Allocate ids for unknown kinds instead of rejecting the query
    pub assert_kinds: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            strip_literals: false,
            shortest_path_max_depth: DEFAULT_SHORTEST_PATH_MAX_DEPTH,
            assert_kinds: false,
        }
    }
}

impl TranslatorConfig {
    /// Read `CYPHER_PGSQL_*` variables, defaulting any that are unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            strip_literals: parse_env_var("CYPHER_PGSQL_STRIP_LITERALS", "false")?,
            shortest_path_max_depth: parse_env_var("CYPHER_PGSQL_SHORTEST_PATH_MAX_DEPTH", "12")?,
            assert_kinds: parse_env_var("CYPHER_PGSQL_ASSERT_KINDS", "false")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load a YAML document. Absent fields take their defaults.
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| parse_error("yaml_file", "unreadable file", e))?;

        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| parse_error("yaml_content", &content, e))?;

        config.validate()?;
        Ok(config)
    }

    pub fn with_strip_literals(mut self, strip_literals: bool) -> Self {
        self.strip_literals = strip_literals;
        self
    }

    pub fn with_assert_kinds(mut self, assert_kinds: bool) -> Self {
        self.assert_kinds = assert_kinds;
        self
    }
}

fn parse_error(
    field: &str,
    value: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> ConfigError {
    ConfigError::Parse {
        field: field.to_string(),
        value: value.to_string(),
        source: Box::new(source),
    }
}

/// Read `key` from the environment, falling back to `default` when unset.
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| parse_error(key, &value, e))
}
