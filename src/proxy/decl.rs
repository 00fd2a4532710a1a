//! Declarations describing a configuration interface.
//!
//! An interface is a named set of accessor methods. Each method has a return
//! type and optional metadata: a property name override (or, for methods with
//! parameters, a key template) and a default literal. The interface itself may
//! carry a prefix, an immutable flag and a source directive.

use std::any::TypeId;
use std::fmt;

use super::Proxy;
use crate::config::{SourceDirective, ValueKind};

/// A Rust type that exposes configuration through a bound [`Proxy`].
///
/// Implementors are thin facades: `interface` declares the accessors and each
/// accessor method delegates to the proxy handed to `from_proxy`.
///
/// ```
/// use dragon_proxy::{ConfigInterface, Interface, Method, Proxy, ValueKind};
///
/// struct Http(Proxy);
///
/// impl ConfigInterface for Http {
///     fn interface() -> Interface {
///         Interface::new("Http")
///             .prefix("http")
///             .method(Method::new("getTimeout").value(ValueKind::Integer).default_value("30"))
///     }
///
///     fn from_proxy(proxy: Proxy) -> Self {
///         Http(proxy)
///     }
/// }
///
/// impl Http {
///     fn timeout(&self) -> dragon_proxy::Result<i64> {
///         self.0.get("getTimeout")
///     }
/// }
/// ```
pub trait ConfigInterface: 'static {
    fn interface() -> Interface;

    fn from_proxy(proxy: Proxy) -> Self;
}

/// Identity and declaration of an interface type.
#[derive(Clone, Copy)]
pub struct InterfaceType {
    id: TypeId,
    type_name: &'static str,
    declare: fn() -> Interface,
}

impl InterfaceType {
    pub fn of<T: ConfigInterface>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            declare: T::interface,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn declare(&self) -> Interface {
        (self.declare)()
    }
}

impl fmt::Debug for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InterfaceType").field(&self.type_name).finish()
    }
}

impl PartialEq for InterfaceType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for InterfaceType {}

/// What an accessor returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    /// A leaf value read from one property.
    Value(ValueKind),
    /// A nested interface bound under this accessor's key.
    Interface(InterfaceType),
    /// String-keyed interfaces, each bound under `<key>.<map key>`.
    Map(InterfaceType),
}

/// Declared metadata for one interface.
#[derive(Debug, Clone)]
#[must_use]
pub struct Interface {
    pub(crate) name: String,
    pub(crate) prefix: Option<String>,
    pub(crate) immutable: bool,
    pub(crate) source: Option<SourceDirective>,
    pub(crate) methods: Vec<Method>,
}

impl Interface {
    /// Starts a declaration. `name` is the simple name shown by the display
    /// operation and in errors.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            immutable: false,
            source: None,
            methods: Vec::new(),
        }
    }

    /// Prefix for every key, unless one is given at bind time.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Leaves resolve once and keep their first value.
    pub fn immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }

    /// Sources to load before this interface is bound.
    pub fn source(mut self, directive: SourceDirective) -> Self {
        self.source = Some(directive);
        self
    }

    /// Adds an accessor. Declaration order is display order.
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }
}

/// One accessor method.
#[derive(Debug, Clone)]
#[must_use]
pub struct Method {
    pub(crate) name: String,
    pub(crate) params: usize,
    pub(crate) returns: ReturnType,
    pub(crate) property_name: Option<String>,
    pub(crate) default_value: Option<String>,
}

impl Method {
    /// A zero-parameter accessor returning a string until told otherwise.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: 0,
            returns: ReturnType::Value(ValueKind::String),
            property_name: None,
            default_value: None,
        }
    }

    pub fn returns(mut self, returns: ReturnType) -> Self {
        self.returns = returns;
        self
    }

    pub fn value(self, kind: ValueKind) -> Self {
        self.returns(ReturnType::Value(kind))
    }

    pub fn interface<T: ConfigInterface>(self) -> Self {
        self.returns(ReturnType::Interface(InterfaceType::of::<T>()))
    }

    pub fn map_of<T: ConfigInterface>(self) -> Self {
        self.returns(ReturnType::Map(InterfaceType::of::<T>()))
    }

    /// Number of call arguments. Methods with parameters need a
    /// [`property_name`](Self::property_name) template using `${N}`.
    pub fn params(mut self, params: usize) -> Self {
        self.params = params;
        self
    }

    /// Overrides the derived name, or gives the key template for methods
    /// with parameters.
    pub fn property_name(mut self, name: impl Into<String>) -> Self {
        self.property_name = Some(name.into());
        self
    }

    /// Literal used when the property is absent. May reference other
    /// properties with `${key}`.
    pub fn default_value(mut self, literal: impl Into<String>) -> Self {
        self.default_value = Some(literal.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
