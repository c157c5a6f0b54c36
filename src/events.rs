//! Append-only record of every state change made to the registry.

use serde::Serialize;

use crate::address::Address;
use crate::registry::{CandidateId, ElectionId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    ElectionCreated {
        election_id: ElectionId,
        title: String,
        duration: u64,
    },
    CandidateAdded {
        election_id: ElectionId,
        candidate_id: CandidateId,
        name: String,
    },
    VoteCast {
        election_id: ElectionId,
        candidate_id: CandidateId,
        voter: Address,
    },
    ElectionEnded {
        election_id: ElectionId,
    },
    WinnerUpdated {
        election_id: ElectionId,
        winner_name: String,
        vote_count: u64,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ElectionCreated { .. } => "ElectionCreated",
            Event::CandidateAdded { .. } => "CandidateAdded",
            Event::VoteCast { .. } => "VoteCast",
            Event::ElectionEnded { .. } => "ElectionEnded",
            Event::WinnerUpdated { .. } => "WinnerUpdated",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoggedEvent {
    pub seq: u64,
    #[serde(flatten)]
    pub event: Event,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EventLog {
    records: Vec<LoggedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, returning its sequence number.
    pub fn push(&mut self, event: Event) -> u64 {
        let seq = self.records.len() as u64;
        self.records.push(LoggedEvent { seq, event });
        seq
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn all(&self) -> &[LoggedEvent] {
        &self.records
    }

    /// Records with `seq >= since`.
    pub fn since(&self, since: u64) -> &[LoggedEvent] {
        let start = usize::try_from(since)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    pub fn last(&self) -> Option<&LoggedEvent> {
        self.records.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ended(id: ElectionId) -> Event {
        Event::ElectionEnded { election_id: id }
    }

    #[test]
    fn sequence_numbers_follow_insertion() {
        let mut log = EventLog::new();
        assert!(log.is_empty());
        assert_eq!(log.push(ended(0)), 0);
        assert_eq!(log.push(ended(1)), 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().map(|r| r.seq), Some(1));
    }

    #[test]
    fn since_clamps_to_the_end() {
        let mut log = EventLog::new();
        for id in 0..3 {
            log.push(ended(id));
        }
        assert_eq!(log.since(0).len(), 3);
        assert_eq!(log.since(2)[0].event, ended(2));
        assert!(log.since(3).is_empty());
        assert!(log.since(u64::MAX).is_empty());
    }

    #[test]
    fn serialized_with_type_tag() {
        let mut log = EventLog::new();
        log.push(Event::ElectionCreated {
            election_id: 0,
            title: "Test Election".into(),
            duration: 3600,
        });
        let json = serde_json::to_value(&log.all()[0]).unwrap();
        assert_eq!(json["seq"], 0);
        assert_eq!(json["type"], "ElectionCreated");
        assert_eq!(json["title"], "Test Election");
        assert_eq!(log.all()[0].event.name(), "ElectionCreated");
    }
}
