//! Errors raised by the election registry.

use rocket::http::Status;
use thiserror::Error;

use crate::registry::{CandidateId, ElectionId};

/// A rejected registry operation. None of these leave partial effects behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Caller is not the registry owner.
    #[error("Only owner can call this function")]
    Unauthorized,

    #[error("election {0} not found")]
    ElectionNotFound(ElectionId),

    #[error("candidate {1} not found in election {0}")]
    CandidateNotFound(ElectionId, CandidateId),

    /// Vote for a candidate id outside the election's candidate list.
    #[error("Invalid candidate")]
    InvalidCandidate,

    #[error("Already voted")]
    AlreadyVoted,

    /// Vote against an election that has been ended.
    #[error("Election is not active")]
    VotingClosed,

    /// End requested for an election that has already been ended.
    #[error("election {0} is not active")]
    NotActive(ElectionId),

    #[error("Voting period is still active")]
    VotingStillActive,

    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    /// Malformed numeric query parameter.
    #[error("invalid {0}: {1:?}")]
    InvalidQuery(&'static str, String),
}

impl Error {
    /// HTTP status reported for this error.
    pub fn status(&self) -> Status {
        match self {
            Error::Unauthorized => Status::Forbidden,
            Error::ElectionNotFound(_) | Error::CandidateNotFound(..) => Status::NotFound,
            Error::InvalidCandidate | Error::InvalidAddress(_) | Error::InvalidQuery(..) => {
                Status::BadRequest
            }
            Error::AlreadyVoted
            | Error::VotingClosed
            | Error::NotActive(_)
            | Error::VotingStillActive => Status::Conflict,
        }
    }
}

/// Pick the status for an error coming out of a request handler.
pub fn status_of(err: &anyhow::Error) -> Status {
    err.downcast_ref::<Error>()
        .map(Error::status)
        .unwrap_or(Status::InternalServerError)
}
