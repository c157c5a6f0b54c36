//! State machine properties of the registry over random operation sequences.

use std::sync::Arc;

use election_registry::{clock::ManualClock, Address, Error, Registry};
use proptest::prelude::*;

const OWNER: u8 = 0;

fn addr(n: u8) -> Address {
    Address::new([n; 20])
}

#[derive(Clone, Debug)]
enum Op {
    Create { caller: u8, duration: u64 },
    Add { caller: u8, election: usize },
    Vote { caller: u8, election: usize, candidate: usize },
    End { caller: u8, election: usize },
    Winner { election: usize, start: usize },
    Tick(i64),
}

fn op() -> impl Strategy<Value = Op> {
    // caller 0 is the owner; a few others act as voters
    let caller = 0u8..4;
    prop_oneof![
        1 => (caller.clone(), 0u64..10_000).prop_map(|(caller, duration)| Op::Create { caller, duration }),
        1 => (caller.clone(), 0usize..4).prop_map(|(caller, election)| Op::Add { caller, election }),
        3 => (caller.clone(), 0usize..4, 0usize..5)
            .prop_map(|(caller, election, candidate)| Op::Vote { caller, election, candidate }),
        1 => (caller, 0usize..4).prop_map(|(caller, election)| Op::End { caller, election }),
        1 => (0usize..4, 0usize..5).prop_map(|(election, start)| Op::Winner { election, start }),
        1 => (0i64..5_000).prop_map(Op::Tick),
    ]
}

fn apply(reg: &mut Registry, clock: &ManualClock, op: &Op) -> Result<(), Error> {
    match *op {
        Op::Create { caller, duration } => reg.create_election(&addr(caller), "E", duration).map(drop),
        Op::Add { caller, election } => reg.add_candidate(&addr(caller), election, "C").map(drop),
        Op::Vote { caller, election, candidate } => reg.vote(&addr(caller), election, candidate),
        Op::End { caller, election } => reg.end_election(&addr(caller), election),
        Op::Winner { election, start } => reg.update_winner(election, start).map(drop),
        Op::Tick(secs) => {
            clock.advance(secs);
            Ok(())
        }
    }
}

proptest! {
    #[test]
    fn failed_operations_change_nothing(ops in prop::collection::vec(op(), 1..60)) {
        let clock = Arc::new(ManualClock::new(0));
        let mut reg = Registry::with_clock(addr(OWNER), clock.clone());

        for op in &ops {
            let before = reg.ledger().clone();
            let events = reg.events().len();
            match apply(&mut reg, &clock, op) {
                Ok(()) => {
                    if !matches!(op, Op::Tick(_)) {
                        prop_assert_eq!(reg.events().len(), events + 1);
                    }
                }
                Err(_) => {
                    prop_assert_eq!(reg.ledger(), &before);
                }
            }
        }
    }

    #[test]
    fn counts_only_grow_and_match_voters(ops in prop::collection::vec(op(), 1..60)) {
        let clock = Arc::new(ManualClock::new(0));
        let mut reg = Registry::with_clock(addr(OWNER), clock.clone());

        for op in &ops {
            let before: Vec<Vec<u64>> = reg
                .ledger()
                .elections()
                .iter()
                .map(|e| e.candidates().iter().map(|c| c.vote_count).collect())
                .collect();
            let _ = apply(&mut reg, &clock, op);

            let elections = reg.ledger().elections();
            prop_assert!(elections.len() >= before.len());
            for (id, (old, election)) in before.iter().zip(elections).enumerate() {
                let counts: Vec<u64> = election.candidates().iter().map(|c| c.vote_count).collect();
                prop_assert!(counts.len() >= old.len());
                for (o, n) in old.iter().zip(&counts) {
                    prop_assert!(n >= o);
                }
                let voted = (0..4u8)
                    .filter(|n| reg.has_voted(id, &addr(*n)).unwrap_or(false))
                    .count() as u64;
                prop_assert_eq!(counts.iter().sum::<u64>(), voted);
            }
        }
    }

    #[test]
    fn second_vote_always_fails(candidate in 0usize..3, second in 0usize..3) {
        let mut reg = Registry::new(addr(OWNER));
        reg.create_election(&addr(OWNER), "E", 60).unwrap();
        for name in ["A", "B", "C"] {
            reg.add_candidate(&addr(OWNER), 0, name).unwrap();
        }
        reg.vote(&addr(1), 0, candidate).unwrap();
        let before = reg.ledger().clone();
        prop_assert_eq!(reg.vote(&addr(1), 0, second), Err(Error::AlreadyVoted));
        prop_assert_eq!(reg.ledger(), &before);
    }

    #[test]
    fn ended_elections_reject_votes(elapsed in 0i64..100_000, candidate in 0usize..4) {
        let clock = Arc::new(ManualClock::new(0));
        let mut reg = Registry::with_clock(addr(OWNER), clock.clone());
        reg.create_election(&addr(OWNER), "E", 3600).unwrap();
        reg.add_candidate(&addr(OWNER), 0, "A").unwrap();
        reg.end_election(&addr(OWNER), 0).unwrap();
        clock.advance(elapsed);
        prop_assert_eq!(reg.vote(&addr(1), 0, candidate), Err(Error::VotingClosed));
    }

    #[test]
    fn winner_is_first_maximum(votes in prop::collection::vec(0u64..4, 1..6)) {
        let mut reg = Registry::new(addr(OWNER));
        reg.create_election(&addr(OWNER), "E", 60).unwrap();
        for (i, _) in votes.iter().enumerate() {
            reg.add_candidate(&addr(OWNER), 0, &format!("C{i}")).unwrap();
        }
        let mut voter = 1u8;
        for (candidate, count) in votes.iter().enumerate() {
            for _ in 0..*count {
                reg.vote(&addr(voter), 0, candidate).unwrap();
                voter += 1;
            }
        }
        reg.end_election(&addr(OWNER), 0).unwrap();

        let max = *votes.iter().max().unwrap();
        let winner = reg.update_winner(0, 0).unwrap();
        prop_assert_eq!(winner.vote_count, max);
        if max > 0 {
            let first = votes.iter().position(|v| *v == max).unwrap();
            prop_assert_eq!(winner.name, format!("C{first}"));
        } else {
            prop_assert_eq!(winner.name, "");
        }
    }
}
