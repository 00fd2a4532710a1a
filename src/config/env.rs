//! Environment variable configuration source.

use toml::Value;

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// Maps `PREFIX<sep>A<sep>B=value` variables to the property `a.b`.
///
/// Values are kept as strings; accessors convert them through the
/// [`Decoder`](super::Decoder) on read, so `"8080"` serves an integer accessor
/// and a string accessor alike.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
    lowercase: bool,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
            lowercase: true,
        }
    }

    /// Keeps path segments as written, for camelCase property names such as
    /// `APP__maxConnections`.
    pub fn keep_case(mut self) -> Self {
        self.lowercase = false;
        self
    }

    fn segments(&self, path: &str) -> Vec<String> {
        path.split(&self.separator)
            .map(|s| if self.lowercase { s.to_lowercase() } else { s.to_string() })
            .collect()
    }
}

impl ConfigSource for EnvSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);

        let mut vars: Vec<(String, String)> = std::env::vars()
            .filter(|(key, _)| key.len() > prefix_with_sep.len() && key.starts_with(&prefix_with_sep))
            .collect();
        // Stable merge order when two variables map onto overlapping paths.
        vars.sort();

        Ok(vars
            .into_iter()
            .map(|(key, value)| {
                let path = self.segments(&key[prefix_with_sep.len()..]);
                ConfigEntry::at_path(path, Value::String(value))
            })
            .collect())
    }
}
