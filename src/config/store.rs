//! Property stores and the handles accessors read through.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use toml::{Table, Value};

use super::builder::StoreBuilder;
use super::decode::{Decoder, ValueKind};
use super::resolve::{has_references, interpolate};
use super::source::{self, ConfigEntry};
use super::ConfigError;

/// Reference chains deeper than this are treated as cycles.
const MAX_REFERENCE_DEPTH: usize = 32;

/// A key-value configuration backend queried by dotted property key.
///
/// Stores may change after a value is first read; dynamic accessors observe
/// those changes on their next call. Implementations must be safe for
/// concurrent use and must not block on reads.
pub trait PropertyStore: Send + Sync + fmt::Debug {
    /// Returns the current value under `key`, with string references resolved.
    fn lookup(&self, key: &str) -> Result<Option<Value>, ConfigError>;

    /// Resolves references inside `literal` as if it were the value of a key
    /// that is never present in the store.
    fn interpolate(&self, literal: &str) -> Result<String, ConfigError>;
}

/// A store backed by an in-memory TOML table.
///
/// Keys address nested tables by their dotted path, so `server.port` reads
/// `port` inside `[server]`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: Table) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Creates a builder that layers sources into a new store.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    /// Sets `key` to `value`, creating intermediate tables as needed.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let path = source::split_key(key);
        source::merge_at_path(&mut self.table.write(), &path, value.into());
    }

    /// Removes `key`, returning its previous raw value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let path = source::split_key(key);
        source::remove_at_path(&mut self.table.write(), &path)
    }

    /// Deep-merges entries into the store in order.
    pub fn merge(&self, entries: Vec<ConfigEntry>) {
        let mut table = self.table.write();
        for entry in entries {
            source::merge_at_path(&mut table, &entry.path, entry.value);
        }
    }

    /// Returns a copy of the raw, unresolved contents.
    pub fn snapshot(&self) -> Table {
        self.table.read().clone()
    }

    fn lookup_at_depth(&self, key: &str, depth: usize) -> Result<Option<Value>, ConfigError> {
        if depth > MAX_REFERENCE_DEPTH {
            return Err(ConfigError::CircularReference(key.to_string()));
        }
        // Clone out so the read guard is released before following references.
        let raw = source::lookup_path(&self.table.read(), key).cloned();
        match raw {
            Some(Value::String(s)) if has_references(&s) => {
                let resolved = interpolate(&s, |path| self.lookup_at_depth(path, depth + 1))?;
                Ok(Some(Value::String(resolved)))
            }
            other => Ok(other),
        }
    }
}

impl PropertyStore for MemoryStore {
    fn lookup(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        self.lookup_at_depth(key, 0)
    }

    fn interpolate(&self, literal: &str) -> Result<String, ConfigError> {
        interpolate(literal, |path| self.lookup_at_depth(path, 1))
    }
}

/// A typed view of one property key.
///
/// Holds no value itself; every [`get`](Self::get) reads the store.
#[derive(Debug, Clone)]
pub struct PropertyHandle {
    store: Arc<dyn PropertyStore>,
    decoder: Arc<dyn Decoder>,
    key: String,
    kind: ValueKind,
    default: Option<String>,
}

impl PropertyHandle {
    /// Scopes a handle to `key`, converting reads to `kind`.
    ///
    /// `default` is a literal used when the key is absent. It is interpolated
    /// through the store and then decoded, so it may reference other keys.
    pub fn resolve(
        store: Arc<dyn PropertyStore>,
        decoder: Arc<dyn Decoder>,
        key: impl Into<String>,
        kind: ValueKind,
        default: Option<String>,
    ) -> Self {
        Self {
            store,
            decoder,
            key: key.into(),
            kind,
            default,
        }
    }

    /// Returns the current typed value.
    pub fn get(&self) -> Result<Value, ConfigError> {
        if let Some(value) = self.store.lookup(&self.key)? {
            tracing::trace!(key = %self.key, "resolved from store");
            return self.decoder.convert(self.kind, value);
        }
        match &self.default {
            Some(literal) => {
                tracing::trace!(key = %self.key, "resolved from default");
                let literal = self.store.interpolate(literal)?;
                self.decoder.decode(self.kind, &literal)
            }
            None => Err(ConfigError::MissingProperty(self.key.clone())),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}
