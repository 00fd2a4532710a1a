//! Binding of configuration interfaces to property stores.

mod binder;
mod decl;
mod dispatch;
mod error;
mod factory;
mod key;
mod resolver;
mod template;

pub use binder::AccessorBinding;
pub use decl::{ConfigInterface, Interface, InterfaceType, Method, ReturnType};
pub use dispatch::{Proxy, ProxyMap, Resolved, DISPLAY_METHOD};
pub use error::{BindingFault, TemplateError};
pub use factory::ProxyFactory;
pub use key::{derive_key, normalize_prefix};
pub use resolver::Strategy;
pub use template::substitute;
