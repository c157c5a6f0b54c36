//! Scripted election run by the `demo` shell command.

use crate::address::Address;
use crate::error::Error;
use crate::events::LoggedEvent;
use crate::registry::{Registry, Winner};

pub const TITLE: &str = "Presidential Election";
pub const DURATION: u64 = 86400;
pub const CANDIDATES: [&str; 3] = ["Tinubu", "Atiku", "Peter Obi"];

/// Create an election, have `owner` and `voter` both vote for the third
/// candidate, end it and compute the winner.
pub fn run(owner: Address, voter: Address) -> Result<(Vec<LoggedEvent>, Winner), Error> {
    let mut registry = Registry::new(owner);

    let id = registry.create_election(&owner, TITLE, DURATION)?;
    for name in CANDIDATES {
        registry.add_candidate(&owner, id, name)?;
    }
    registry.vote(&owner, id, 2)?;
    registry.vote(&voter, id, 2)?;
    registry.end_election(&owner, id)?;
    let winner = registry.update_winner(id, 0)?;

    Ok((registry.events().all().to_vec(), winner))
}
