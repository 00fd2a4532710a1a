//! In-memory TOML configuration source.

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// A configuration source holding TOML text.
///
/// The text is parsed every time entries are requested, so a source can be
/// registered before it is known to be valid; parse failures surface when the
/// source is first loaded.
#[derive(Debug, Clone)]
pub struct TomlSource {
    name: String,
    text: String,
}

impl TomlSource {
    /// Creates a new source. `name` only appears in error messages.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

impl ConfigSource for TomlSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let table = toml::from_str(&self.text).map_err(|e| ConfigError::ParseError {
            name: self.name.clone(),
            source: e,
        })?;
        Ok(vec![ConfigEntry::root(table)])
    }
}
