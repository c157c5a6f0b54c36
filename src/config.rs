use std::sync::{Arc, Mutex};

use rocket::{
    fairing::{self, Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::address::Address;
use crate::clock::Clock;
use crate::registry::Registry;

/// Application configuration, read from `Rocket.toml` and `ROCKET_*`
/// environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    owner: Address,
}

impl Config {
    /// The only identity allowed to create elections, add candidates
    /// and end elections. Configured via `ROCKET_OWNER`.
    pub fn owner(&self) -> Address {
        self.owner
    }
}

/// Loads the config and places it, together with a fresh registry owned by
/// the configured owner, into managed state.
pub struct RegistryFairing {
    clock: Arc<dyn Clock>,
}

impl RegistryFairing {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        RegistryFairing { clock }
    }
}

#[rocket::async_trait]
impl Fairing for RegistryFairing {
    fn info(&self) -> Info {
        Info {
            name: "Election registry",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> fairing::Result {
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load registry config: {e}");
                return Err(rocket);
            }
        };
        tracing::info!(owner = %config.owner(), "registry online");

        let registry = Registry::with_clock(config.owner(), self.clock.clone());
        Ok(rocket.manage(config).manage(Mutex::new(registry)))
    }
}
