//! Loading of named configuration sources requested by interfaces.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use super::source::ConfigSource;
use super::store::MemoryStore;
use super::ConfigError;

/// Names of configuration sources an interface needs before it is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDirective {
    names: Vec<String>,
}

impl SourceDirective {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Loads the sources named by a [`SourceDirective`] into the backing store.
pub trait SourceLoader: Send + Sync + fmt::Debug {
    fn load(&self, directive: &SourceDirective) -> Result<(), ConfigError>;
}

/// A loader for setups where every source is already in the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLoader;

impl SourceLoader for NoopLoader {
    fn load(&self, _directive: &SourceDirective) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Registry of named sources that merges each into a [`MemoryStore`] once.
///
/// ```
/// use std::sync::Arc;
/// use dragon_proxy::config::{Libraries, MemoryStore, PropertyStore, SourceDirective, SourceLoader, TomlSource};
///
/// let store = Arc::new(MemoryStore::new());
/// let libraries = Libraries::new(store.clone())
///     .register("billing", TomlSource::new("billing", "[billing]\ncurrency = \"EUR\""));
///
/// libraries.load(&SourceDirective::new(["billing"]))?;
/// assert!(store.lookup("billing.currency")?.is_some());
/// # Ok::<(), dragon_proxy::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct Libraries {
    store: Arc<MemoryStore>,
    sources: HashMap<String, Library>,
}

/// One registered source and its load-once state.
#[derive(Debug)]
struct Library {
    source: Box<dyn ConfigSource>,
    loaded: OnceLock<()>,
    init: Mutex<()>,
}

impl Libraries {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            sources: HashMap::new(),
        }
    }

    /// Makes `source` loadable under `name`.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, source: impl ConfigSource + 'static) -> Self {
        let library = Library {
            source: Box::new(source),
            loaded: OnceLock::new(),
            init: Mutex::new(()),
        };
        self.sources.insert(name.into(), library);
        self
    }

    /// Whether the named source has been merged into the store.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.sources
            .get(name)
            .is_some_and(|library| library.loaded.get().is_some())
    }
}

impl SourceLoader for Libraries {
    fn load(&self, directive: &SourceDirective) -> Result<(), ConfigError> {
        for name in directive.names() {
            let library = self
                .sources
                .get(name)
                .ok_or_else(|| ConfigError::UnknownSource(name.clone()))?;
            if library.loaded.get().is_some() {
                continue;
            }

            // Only loads of the same source wait on each other.
            let _guard = library.init.lock();
            if library.loaded.get().is_some() {
                continue;
            }
            self.store.merge(library.source.entries()?);
            let _ = library.loaded.set(());
            tracing::debug!(source = %name, "loaded configuration source");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigEntry, PropertyStore, TomlSource};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use toml::Value;

    #[derive(Debug, Default)]
    struct Counting {
        reads: AtomicUsize,
    }

    impl ConfigSource for Arc<Counting> {
        fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ConfigEntry::at_key("lib.value", Value::Integer(1))])
        }
    }

    #[test]
    fn test_each_source_loads_once() {
        let store = Arc::new(MemoryStore::new());
        let counting = Arc::new(Counting::default());
        let libraries = Libraries::new(store.clone()).register("lib", counting.clone());
        let directive = SourceDirective::new(["lib"]);

        libraries.load(&directive).unwrap();
        libraries.load(&directive).unwrap();

        assert_eq!(counting.reads.load(Ordering::SeqCst), 1);
        assert!(libraries.is_loaded("lib"));
        assert_eq!(store.lookup("lib.value").unwrap(), Some(Value::Integer(1)));
    }

    #[test]
    fn test_concurrent_loads_merge_once() {
        const THREADS: usize = 8;

        let store = Arc::new(MemoryStore::new());
        let counting = Arc::new(Counting::default());
        let libraries = Arc::new(
            Libraries::new(store.clone())
                .register("lib", counting.clone())
                .register("other", TomlSource::new("other", "[other]\nflag = true")),
        );
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let libraries = libraries.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    let name = if i % 2 == 0 { "lib" } else { "other" };
                    barrier.wait();
                    libraries.load(&SourceDirective::new([name])).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counting.reads.load(Ordering::SeqCst), 1);
        assert!(libraries.is_loaded("lib"));
        assert!(libraries.is_loaded("other"));
        assert!(!libraries.is_loaded("missing"));
    }

    #[test]
    fn test_unknown_source() {
        let libraries = Libraries::new(Arc::new(MemoryStore::new()));
        let err = libraries.load(&SourceDirective::new(["nope"])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSource(ref n) if n == "nope"));
    }

    #[test]
    fn test_failed_source_is_not_marked_loaded() {
        let libraries = Libraries::new(Arc::new(MemoryStore::new()))
            .register("bad", TomlSource::new("bad", "= 1"));
        assert!(libraries.load(&SourceDirective::new(["bad"])).is_err());
        assert!(!libraries.is_loaded("bad"));
    }
}
