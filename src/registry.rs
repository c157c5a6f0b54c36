//! The election registry: elections, candidates and votes under a single owner.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::address::Address;
use crate::clock::{Clock, SystemClock};
use crate::error::Error;
use crate::events::{Event, EventLog};

pub type ElectionId = usize;
pub type CandidateId = usize;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub vote_count: u64,
}

/// Result of the most recent winner scan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Winner {
    pub name: String,
    pub vote_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Election {
    title: String,
    duration: u64,
    created_at: i64,
    is_active: bool,
    candidates: Vec<Candidate>,
    voters: BTreeSet<Address>,
    winner: Option<Winner>,
}

impl Election {
    fn new(title: String, duration: u64, created_at: i64) -> Self {
        Election {
            title,
            duration,
            created_at,
            is_active: true,
            candidates: Vec::new(),
            voters: BTreeSet::new(),
            winner: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Nominal end of voting. Informational only: votes are gated by `is_active`.
    pub fn closes_at(&self) -> i64 {
        self.created_at.saturating_add_unsigned(self.duration)
    }

    fn view(&self) -> ElectionView {
        ElectionView {
            title: self.title.clone(),
            duration: self.duration,
            is_active: self.is_active,
            candidate_count: self.candidates.len(),
            created_at: self.created_at,
            closes_at: self.closes_at(),
        }
    }
}

/// What `get_election` reports about an election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ElectionView {
    pub title: String,
    pub duration: u64,
    pub is_active: bool,
    pub candidate_count: usize,
    pub created_at: i64,
    pub closes_at: i64,
}

/// All registry state. Two ledgers compare equal iff every election,
/// candidate, voter and logged event matches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Ledger {
    owner: Address,
    elections: Vec<Election>,
    events: EventLog,
}

impl Ledger {
    pub fn elections(&self) -> &[Election] {
        &self.elections
    }
}

#[derive(Debug)]
pub struct Registry {
    ledger: Ledger,
    clock: Arc<dyn Clock>,
}

impl Registry {
    pub fn new(owner: Address) -> Self {
        Self::with_clock(owner, Arc::new(SystemClock))
    }

    pub fn with_clock(owner: Address, clock: Arc<dyn Clock>) -> Self {
        Registry {
            ledger: Ledger {
                owner,
                elections: Vec::new(),
                events: EventLog::new(),
            },
            clock,
        }
    }

    pub fn owner(&self) -> Address {
        self.ledger.owner
    }

    pub fn election_count(&self) -> usize {
        self.ledger.elections.len()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn events(&self) -> &EventLog {
        &self.ledger.events
    }

    fn only_owner(&self, caller: &Address) -> Result<()> {
        if *caller != self.ledger.owner {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    fn election(&self, id: ElectionId) -> Result<&Election> {
        self.ledger
            .elections
            .get(id)
            .ok_or(Error::ElectionNotFound(id))
    }

    fn election_mut(&mut self, id: ElectionId) -> Result<&mut Election> {
        self.ledger
            .elections
            .get_mut(id)
            .ok_or(Error::ElectionNotFound(id))
    }

    fn emit(&mut self, event: Event) {
        let seq = self.ledger.events.push(event);
        tracing::debug!(seq, "event logged");
    }

    pub fn create_election(
        &mut self,
        caller: &Address,
        title: &str,
        duration: u64,
    ) -> Result<ElectionId> {
        self.only_owner(caller).inspect_err(|e| rejected("create_election", e))?;

        let id = self.ledger.elections.len();
        let now = self.clock.now();
        self.ledger
            .elections
            .push(Election::new(title.to_string(), duration, now));
        tracing::info!(election = id, title, duration, "election created");
        self.emit(Event::ElectionCreated {
            election_id: id,
            title: title.to_string(),
            duration,
        });
        Ok(id)
    }

    /// Candidates may be added at any time, even once the election has ended.
    pub fn add_candidate(
        &mut self,
        caller: &Address,
        election_id: ElectionId,
        name: &str,
    ) -> Result<CandidateId> {
        self.only_owner(caller).inspect_err(|e| rejected("add_candidate", e))?;
        let election = self
            .election_mut(election_id)
            .inspect_err(|e| rejected("add_candidate", e))?;

        let id = election.candidates.len();
        election.candidates.push(Candidate {
            name: name.to_string(),
            vote_count: 0,
        });
        tracing::info!(election = election_id, candidate = id, name, "candidate added");
        self.emit(Event::CandidateAdded {
            election_id,
            candidate_id: id,
            name: name.to_string(),
        });
        Ok(id)
    }

    /// Record `caller`'s vote. Only the active flag closes voting; the
    /// nominal duration is never consulted here.
    pub fn vote(
        &mut self,
        caller: &Address,
        election_id: ElectionId,
        candidate_id: CandidateId,
    ) -> Result<()> {
        let election = self
            .election_mut(election_id)
            .inspect_err(|e| rejected("vote", e))?;
        let check = if !election.is_active {
            Err(Error::VotingClosed)
        } else if candidate_id >= election.candidates.len() {
            Err(Error::InvalidCandidate)
        } else if election.voters.contains(caller) {
            Err(Error::AlreadyVoted)
        } else {
            Ok(())
        };
        check.inspect_err(|e| rejected("vote", e))?;

        election.candidates[candidate_id].vote_count += 1;
        election.voters.insert(*caller);
        tracing::info!(election = election_id, candidate = candidate_id, voter = %caller, "vote cast");
        self.emit(Event::VoteCast {
            election_id,
            candidate_id,
            voter: *caller,
        });
        Ok(())
    }

    pub fn end_election(&mut self, caller: &Address, election_id: ElectionId) -> Result<()> {
        self.only_owner(caller).inspect_err(|e| rejected("end_election", e))?;
        let election = self
            .election_mut(election_id)
            .inspect_err(|e| rejected("end_election", e))?;
        if !election.is_active {
            let err = Error::NotActive(election_id);
            rejected("end_election", &err);
            return Err(err);
        }

        election.is_active = false;
        tracing::info!(election = election_id, "election ended");
        self.emit(Event::ElectionEnded { election_id });
        Ok(())
    }

    /// Compute the winner over candidates `[start_index, len)` and store it,
    /// replacing any earlier result.
    ///
    /// Each call stands alone: nothing is carried over from a previous scan.
    /// A candidate takes the lead only with a strictly higher count, so the
    /// earliest candidate wins a tie and a scan that finds no votes at all
    /// (including an empty range) stores the empty winner.
    pub fn update_winner(&mut self, election_id: ElectionId, start_index: usize) -> Result<Winner> {
        let election = self
            .election_mut(election_id)
            .inspect_err(|e| rejected("update_winner", e))?;
        if election.is_active {
            let err = Error::VotingStillActive;
            rejected("update_winner", &err);
            return Err(err);
        }

        let mut winner = Winner::default();
        for candidate in election.candidates.iter().skip(start_index) {
            if candidate.vote_count > winner.vote_count {
                winner = Winner {
                    name: candidate.name.clone(),
                    vote_count: candidate.vote_count,
                };
            }
        }
        election.winner = Some(winner.clone());

        tracing::info!(
            election = election_id,
            start_index,
            winner = %winner.name,
            votes = winner.vote_count,
            "winner updated"
        );
        self.emit(Event::WinnerUpdated {
            election_id,
            winner_name: winner.name.clone(),
            vote_count: winner.vote_count,
        });
        Ok(winner)
    }

    pub fn get_election(&self, election_id: ElectionId) -> Result<ElectionView> {
        Ok(self.election(election_id)?.view())
    }

    pub fn get_candidate(
        &self,
        election_id: ElectionId,
        candidate_id: CandidateId,
    ) -> Result<Candidate> {
        self.election(election_id)?
            .candidates
            .get(candidate_id)
            .cloned()
            .ok_or(Error::CandidateNotFound(election_id, candidate_id))
    }

    /// The stored winner, or the empty winner if none was computed yet.
    pub fn get_winner(&self, election_id: ElectionId) -> Result<Winner> {
        Ok(self
            .election(election_id)?
            .winner
            .clone()
            .unwrap_or_default())
    }

    pub fn has_voted(&self, election_id: ElectionId, voter: &Address) -> Result<bool> {
        Ok(self.election(election_id)?.voters.contains(voter))
    }
}

fn rejected(op: &str, err: &Error) {
    tracing::debug!(op, error = %err, "rejected");
}
