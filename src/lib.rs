#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::{figment::Figment, Build, Rocket};

use clock::{Clock, SystemClock};
use config::RegistryFairing;

/// Run a block returning `anyhow::Result` and turn any error into a
/// response carrying the matching HTTP status.
#[macro_export]
macro_rules! execute {
    ($block:block) => {
        {
            let res = || -> ::anyhow::Result<_> {
                $block
            };
            res().map_err(|e| ::rocket::response::status::Custom($crate::error::status_of(&e), e.to_string()))
        }
    };
}

pub mod address;
pub mod api;
pub mod clock;
pub mod config;
pub mod demo;
pub mod error;
pub mod events;
pub mod registry;

pub use address::Address;
pub use error::Error;
pub use events::{Event, EventLog, LoggedEvent};
pub use registry::{Candidate, ElectionView, Ledger, Registry, Winner};

/// Assemble the server from the default Rocket figment and the wall clock.
pub fn build() -> Rocket<Build> {
    build_with(rocket::Config::figment(), Arc::new(SystemClock))
}

pub fn build_with(figment: Figment, clock: Arc<dyn Clock>) -> Rocket<Build> {
    rocket::custom(figment)
        .mount("/", api::routes())
        .attach(RegistryFairing::new(clock))
}
