use std::sync::Arc;

use super::binder::{self, BindContext};
use super::decl::{ConfigInterface, InterfaceType};
use super::dispatch::Proxy;
use crate::config::{Decoder, DefaultDecoder, NoopLoader, PropertyStore, SourceLoader};
use crate::Error;

/// Binds configuration interfaces to a property store.
///
/// Accessors are mapped to property keys by naming convention: under the
/// prefix `http.`, `getTimeout` reads `http.timeout` and `isEnabled` reads
/// `http.enabled`. A method's property name override replaces the derived
/// part.
///
/// Leaves are dynamic by default and follow changes to the store. Declaring
/// an interface immutable (or binding it with [`new_proxy_with`]) makes each
/// leaf keep the first value it reads.
///
/// ```
/// use std::sync::Arc;
/// use dragon_proxy::config::MemoryStore;
/// use dragon_proxy::{ConfigInterface, Interface, Method, Proxy, ProxyFactory, ValueKind};
///
/// struct Foo(Proxy);
///
/// impl ConfigInterface for Foo {
///     fn interface() -> Interface {
///         Interface::new("Foo")
///             .prefix("foo")
///             .method(Method::new("getTimeout").value(ValueKind::Integer))
///             .method(Method::new("getName"))
///     }
///
///     fn from_proxy(proxy: Proxy) -> Self {
///         Foo(proxy)
///     }
/// }
///
/// let store = Arc::new(MemoryStore::new());
/// store.set("foo.timeout", 5_i64);
/// store.set("foo.name", "x");
///
/// let factory = ProxyFactory::new(store);
/// let foo: Foo = factory.new_proxy()?;
/// assert_eq!(foo.0.get::<i64>("getTimeout")?, 5);
/// assert_eq!(foo.0.to_string(), "Foo[timeout='5', name='x']");
/// # Ok::<(), dragon_proxy::Error>(())
/// ```
///
/// [`new_proxy_with`]: Self::new_proxy_with
#[derive(Debug, Clone)]
pub struct ProxyFactory {
    ctx: Arc<BindContext>,
}

impl ProxyFactory {
    /// Uses [`DefaultDecoder`] and loads no sources.
    pub fn new(store: Arc<dyn PropertyStore>) -> Self {
        Self::with_collaborators(store, Arc::new(DefaultDecoder), Arc::new(NoopLoader))
    }

    pub fn with_collaborators(
        store: Arc<dyn PropertyStore>,
        decoder: Arc<dyn Decoder>,
        loader: Arc<dyn SourceLoader>,
    ) -> Self {
        Self {
            ctx: Arc::new(BindContext::new(store, decoder, loader)),
        }
    }

    /// Binds `T` with its declared prefix and immutable flag.
    pub fn new_proxy<T: ConfigInterface>(&self) -> Result<T, Error> {
        self.bind(InterfaceType::of::<T>(), None, None).map(T::from_proxy)
    }

    /// Binds `T` under `prefix` instead of its declared one.
    pub fn new_proxy_with_prefix<T: ConfigInterface>(&self, prefix: &str) -> Result<T, Error> {
        self.bind(InterfaceType::of::<T>(), Some(prefix), None).map(T::from_proxy)
    }

    /// Binds `T` with both prefix and immutable flag overridden. A `None`
    /// prefix keeps the declared one.
    pub fn new_proxy_with<T: ConfigInterface>(&self, prefix: Option<&str>, immutable: bool) -> Result<T, Error> {
        self.bind(InterfaceType::of::<T>(), prefix, Some(immutable)).map(T::from_proxy)
    }

    /// Untyped form of the constructors above.
    pub fn bind(&self, ty: InterfaceType, prefix: Option<&str>, immutable: Option<bool>) -> Result<Proxy, Error> {
        binder::bind(&self.ctx, ty, prefix, immutable)
    }
}
