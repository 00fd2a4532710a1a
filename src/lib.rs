pub mod config;
pub mod context;
mod error;
pub mod proxy;

pub use config::{ConfigError, ValueKind};
pub use context::AppContext;
pub use error::Error;
pub use proxy::{ConfigInterface, Interface, Method, Proxy, ProxyFactory, ProxyMap, Resolved};

pub type Result<T, E = Error> = std::result::Result<T, E>;
