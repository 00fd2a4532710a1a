use toml::Value;

use super::env::EnvSource;
use super::source::{ConfigEntry, ConfigSource};
use super::store::MemoryStore;
use super::text::TomlSource;
use super::ConfigError;

/// Builder that layers configuration sources into a [`MemoryStore`].
///
/// Sources are merged in registration order, with later sources overriding
/// earlier ones. Nested tables are merged recursively; other values
/// (including arrays) are replaced entirely.
///
/// ## Variable References
///
/// String values can reference other properties using `${path.to.field}`
/// syntax. References are resolved when a value is read, not when the store
/// is built, so they follow later changes to the referenced key:
///
/// ```toml
/// [server]
/// host = "localhost"
/// port = 8080
/// url = "http://${server.host}:${server.port}/api"
/// ```
///
/// Use `$$` to escape a literal `$` (e.g., `$${VAR}` becomes `${VAR}`).
///
/// ## Example
///
/// ```
/// use dragon_proxy::config::{MemoryStore, PropertyStore};
///
/// let store = MemoryStore::builder()
///     .with_toml("defaults", "[server]\nport = 8080")
///     .with_value("server.host", "localhost")
///     .build()?;
///
/// assert_eq!(store.lookup("server.port")?, Some(toml::Value::Integer(8080)));
/// # Ok::<(), dragon_proxy::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct StoreBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl StoreBuilder {
    /// Adds TOML text. `name` identifies the source in parse errors.
    pub fn with_toml(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_source(TomlSource::new(name, text))
    }

    /// Loads properties from environment variables with the given prefix.
    ///
    /// Environment variables are mapped to property keys by:
    /// 1. Removing the prefix and separator
    /// 2. Splitting remaining segments on the separator
    /// 3. Converting path segments to lowercase
    ///
    /// Sources are applied in registration order. This allows flexible layering:
    ///
    /// ```no_run
    /// # use dragon_proxy::config::MemoryStore;
    /// // defaults -> env overrides -> explicit overrides
    /// let store = MemoryStore::builder()
    ///     .with_toml("defaults", "[database]\nport = 5432")
    ///     .with_env("MYAPP", "__")
    ///     .with_value("database.port", 6543_i64)
    ///     .build()?;
    /// # Ok::<(), dragon_proxy::ConfigError>(())
    /// ```
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    /// Sets a single property.
    pub fn with_value(self, key: &str, value: impl Into<Value>) -> Self {
        self.with_source(Fixed(ConfigEntry::at_key(key, value.into())))
    }

    /// Adds any other source.
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Reads every source in order and merges the results into a new store.
    pub fn build(self) -> Result<MemoryStore, ConfigError> {
        let store = MemoryStore::new();
        for source in &self.sources {
            store.merge(source.entries()?);
        }
        tracing::debug!(sources = self.sources.len(), "built property store");
        Ok(store)
    }
}

#[derive(Debug)]
struct Fixed(ConfigEntry);

impl ConfigSource for Fixed {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        Ok(vec![self.0.clone()])
    }
}
