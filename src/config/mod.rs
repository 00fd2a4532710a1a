//! Property stores and the collaborators proxies resolve through.

mod builder;
mod decode;
mod env;
mod error;
mod library;
mod resolve;
mod source;
mod store;
mod text;

pub use builder::StoreBuilder;
pub use decode::{Decoder, DefaultDecoder, ValueKind};
pub use env::EnvSource;
pub use error::ConfigError;
pub use library::{Libraries, NoopLoader, SourceDirective, SourceLoader};
pub use resolve::interpolate;
pub use source::{ConfigEntry, ConfigSource};
pub use store::{MemoryStore, PropertyHandle, PropertyStore};
pub use text::TomlSource;

pub(crate) use resolve::expand_placeholders;
