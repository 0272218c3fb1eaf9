use boxoffice_catalog::VenueSpec;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub event: EventConfig,
    pub venue: VenueSpec,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BusinessRules {
    /// How long an unconfirmed hold keeps its seats
    pub hold_minutes: u32,
    /// Lifetime of the per-event mutation lease
    pub lease_ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EventConfig {
    pub id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig { port: 8080 },
            event: EventConfig {
                id: "main_event".to_string(),
            },
            venue: VenueSpec::default(),
            business_rules: BusinessRules {
                hold_minutes: 2,
                lease_ttl_seconds: 10,
            },
        }
    }
}

impl Config {
    /// Load using `RUN_MODE` and the process environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Self::load_from(&run_mode, None)
    }

    /// Load for `run_mode`. `vars` replaces the process environment when given.
    pub fn load_from(
        run_mode: &str,
        vars: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let s = config::Config::builder()
            // Built-in defaults, so every file below is optional
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::with_name("config/default").required(false))
            // Per-environment overrides, e.g. config/production.toml
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local, uncommitted overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `BOXOFFICE__BUSINESS_RULES__HOLD_MINUTES=5`
            .add_source(
                config::Environment::with_prefix("BOXOFFICE")
                    .separator("__")
                    .source(vars),
            )
            .build()?;

        s.try_deserialize()
    }
}
