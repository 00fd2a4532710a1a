//! Application context wiring a store and its collaborators into a factory.

use std::sync::Arc;

use crate::config::{ConfigSource, Decoder, DefaultDecoder, Libraries, MemoryStore};
use crate::proxy::{ConfigInterface, ProxyFactory};
use crate::Error;

/// Central application context holding the property store and a
/// [`ProxyFactory`] bound to it.
///
/// Configuration interfaces are bound through [`proxy()`](Self::proxy); each
/// call binds afresh, so applications normally bind once and share the result.
///
/// ## Example
///
/// ```
/// use dragon_proxy::config::MemoryStore;
/// use dragon_proxy::{AppContext, ConfigInterface, Interface, Method, Proxy, ValueKind};
///
/// struct Database(Proxy);
///
/// impl ConfigInterface for Database {
///     fn interface() -> Interface {
///         Interface::new("Database")
///             .prefix("database")
///             .method(Method::new("getPort").value(ValueKind::Integer).default_value("5432"))
///     }
///
///     fn from_proxy(proxy: Proxy) -> Self {
///         Database(proxy)
///     }
/// }
///
/// let ctx = AppContext::builder()
///     .with_store(MemoryStore::builder().with_toml("defaults", "[database]\nport = 6543").build()?)
///     .build()?;
///
/// let db: Database = ctx.proxy()?;
/// assert_eq!(db.0.get::<u16>("getPort")?, 6543);
/// # Ok::<(), dragon_proxy::Error>(())
/// ```
#[derive(Debug)]
pub struct AppContext {
    store: Arc<MemoryStore>,
    factory: ProxyFactory,
}

impl AppContext {
    /// Creates a new builder for constructing an `AppContext`.
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::default()
    }

    /// The backing store, for reading or changing properties directly.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn factory(&self) -> &ProxyFactory {
        &self.factory
    }

    /// Binds `T` with its declared prefix and immutable flag.
    pub fn proxy<T: ConfigInterface>(&self) -> Result<T, Error> {
        self.factory.new_proxy()
    }
}

/// Builder for constructing an [`AppContext`].
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct AppContextBuilder {
    store: Option<Arc<MemoryStore>>,
    decoder: Option<Arc<dyn Decoder>>,
    libraries: Vec<(String, Box<dyn ConfigSource>)>,
}

impl AppContextBuilder {
    /// Attaches the property store, typically built with
    /// [`MemoryStore::builder()`](crate::config::MemoryStore::builder).
    pub fn with_store(self, store: MemoryStore) -> Self {
        self.with_shared_store(Arc::new(store))
    }

    /// Attaches a store that is also held elsewhere.
    pub fn with_shared_store(mut self, store: Arc<MemoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replaces the [`DefaultDecoder`].
    pub fn with_decoder(mut self, decoder: impl Decoder + 'static) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// Registers a named source that interfaces can request through their
    /// source directive. It is merged into the store the first time one does.
    pub fn with_library(mut self, name: impl Into<String>, source: impl ConfigSource + 'static) -> Self {
        let source: Box<dyn ConfigSource> = Box::new(source);
        self.libraries.push((name.into(), source));
        self
    }

    /// Builds the `AppContext`.
    ///
    /// Returns an error if no store was provided.
    pub fn build(self) -> Result<AppContext, Error> {
        let store = self.store.ok_or(Error::MissingStore)?;
        let decoder: Arc<dyn Decoder> = match self.decoder {
            Some(decoder) => decoder,
            None => Arc::new(DefaultDecoder),
        };
        let libraries = self
            .libraries
            .into_iter()
            .fold(Libraries::new(store.clone()), |libraries, (name, source)| {
                libraries.register(name, source)
            });

        let factory = ProxyFactory::with_collaborators(store.clone(), decoder, Arc::new(libraries));
        Ok(AppContext { store, factory })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SourceDirective, TomlSource};
    use crate::proxy::{Interface, Method, Proxy};

    struct Billing(Proxy);

    impl ConfigInterface for Billing {
        fn interface() -> Interface {
            Interface::new("Billing")
                .prefix("billing")
                .source(SourceDirective::new(["billing"]))
                .method(Method::new("getCurrency"))
        }

        fn from_proxy(proxy: Proxy) -> Self {
            Billing(proxy)
        }
    }

    #[test]
    fn test_missing_store() {
        let result = AppContext::builder().build();
        assert!(matches!(result, Err(Error::MissingStore)));
    }

    #[test]
    fn test_library_loaded_on_bind() {
        let ctx = AppContext::builder()
            .with_store(MemoryStore::new())
            .with_library("billing", TomlSource::new("billing", "[billing]\ncurrency = \"EUR\""))
            .build()
            .unwrap();

        let billing: Billing = ctx.proxy().unwrap();
        assert_eq!(billing.0.get::<String>("getCurrency").unwrap(), "EUR");
    }

    #[test]
    fn test_unregistered_library_fails_bind() {
        let ctx = AppContext::builder().with_store(MemoryStore::new()).build().unwrap();
        let err = ctx.proxy::<Billing>().err().unwrap();
        assert!(matches!(err, Error::SourceLoad { ref interface, .. } if interface == "Billing"));
    }
}
