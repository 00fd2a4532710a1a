use std::sync::Arc;

use dragon_proxy::config::{MemoryStore, SourceDirective, TomlSource};
use dragon_proxy::{AppContext, ConfigInterface, Interface, Method, Proxy, ValueKind};

struct AppConfig(Proxy);

impl ConfigInterface for AppConfig {
    fn interface() -> Interface {
        Interface::new("AppConfig")
            .prefix("app")
            .method(Method::new("getName"))
            .method(Method::new("isDebug").value(ValueKind::Boolean).default_value("false"))
            .method(Method::new("getDatabase").interface::<DatabaseConfig>())
    }

    fn from_proxy(proxy: Proxy) -> Self {
        AppConfig(proxy)
    }
}

impl AppConfig {
    fn name(&self) -> dragon_proxy::Result<String> {
        self.0.get("getName")
    }

    fn debug(&self) -> dragon_proxy::Result<bool> {
        self.0.get("isDebug")
    }

    fn database(&self) -> dragon_proxy::Result<DatabaseConfig> {
        self.0.nested("getDatabase")
    }
}

struct DatabaseConfig(Proxy);

impl ConfigInterface for DatabaseConfig {
    fn interface() -> Interface {
        Interface::new("DatabaseConfig")
            .source(SourceDirective::new(["database"]))
            .method(Method::new("getHost"))
            .method(Method::new("getPort").value(ValueKind::Integer))
            .method(Method::new("getUrl").default_value("postgres://${app.database.host}:${app.database.port}"))
    }

    fn from_proxy(proxy: Proxy) -> Self {
        DatabaseConfig(proxy)
    }
}

impl DatabaseConfig {
    fn url(&self) -> dragon_proxy::Result<String> {
        self.0.get("getUrl")
    }
}

fn main() -> Result<(), dragon_proxy::Error> {
    let store = Arc::new(
        MemoryStore::builder()
            .with_toml("defaults", "[app]\nname = \"demo\"")
            .with_env("DEMO", "__")
            .build()?,
    );

    let ctx = AppContext::builder()
        .with_shared_store(store.clone())
        .with_library(
            "database",
            TomlSource::new("database", "[app.database]\nhost = \"localhost\"\nport = 5432"),
        )
        .build()?;

    // Bind once; accessors read the live store on every call.
    let config: AppConfig = ctx.proxy()?;

    println!("App: {} (debug={})", config.name()?, config.debug()?);
    println!("Database URL: {}", config.database()?.url()?);

    store.set("app.database.port", 6432_i64);
    println!("Database URL after change: {}", config.database()?.url()?);
    println!("{}", config.0);

    Ok(())
}
