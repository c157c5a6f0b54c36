use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome, Request},
    response::status::Custom,
    serde::json::Json,
    Route, State,
};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::config::Config;
use crate::error::Error;
use crate::events::LoggedEvent;
use crate::registry::{Candidate, CandidateId, ElectionId, ElectionView, Registry, Winner};

/// Header carrying the caller's address.
pub const CALLER_HEADER: &str = "X-Caller";

pub type SharedRegistry = Mutex<Registry>;

type Reply<T> = std::result::Result<Json<T>, Custom<String>>;

pub fn routes() -> Vec<Route> {
    routes![
        owner,
        election_count,
        create_election,
        get_election,
        add_candidate,
        get_candidate,
        vote,
        has_voted,
        end_election,
        update_winner,
        get_winner,
        events,
    ]
}

/// The identity a request acts as.
pub struct Caller(pub Address);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Caller {
    type Error = String;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(value) = req.headers().get_one(CALLER_HEADER) else {
            return Outcome::Error((Status::Unauthorized, format!("missing {CALLER_HEADER} header")));
        };
        match value.parse() {
            Ok(address) => Outcome::Success(Caller(address)),
            Err(e) => Outcome::Error((Status::BadRequest, format!("{e}"))),
        }
    }
}

fn lock(registry: &SharedRegistry) -> Result<MutexGuard<'_, Registry>> {
    registry
        .lock()
        .map_err(|_| anyhow!("registry lock poisoned"))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Owner {
    pub owner: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ElectionCount {
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewElection {
    pub title: String,
    pub duration: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewCandidate {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Ballot {
    pub candidate: CandidateId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoterStatus {
    pub voted: bool,
}

#[get("/owner")]
fn owner(config: &State<Config>) -> Json<Owner> {
    Json(Owner {
        owner: config.owner(),
    })
}

#[get("/elections")]
fn election_count(registry: &State<SharedRegistry>) -> Reply<ElectionCount> {
    execute!({
        let registry = lock(registry)?;
        Ok(Json(ElectionCount {
            count: registry.election_count(),
        }))
    })
}

#[post("/elections", data = "<body>", format = "json")]
fn create_election(
    caller: Caller,
    body: Json<NewElection>,
    registry: &State<SharedRegistry>,
) -> Reply<Created> {
    execute!({
        let mut registry = lock(registry)?;
        let id = registry.create_election(&caller.0, &body.title, body.duration)?;
        Ok(Json(Created { id }))
    })
}

#[get("/elections/<id>")]
fn get_election(id: ElectionId, registry: &State<SharedRegistry>) -> Reply<ElectionView> {
    execute!({
        let registry = lock(registry)?;
        Ok(Json(registry.get_election(id)?))
    })
}

#[post("/elections/<id>/candidates", data = "<body>", format = "json")]
fn add_candidate(
    caller: Caller,
    id: ElectionId,
    body: Json<NewCandidate>,
    registry: &State<SharedRegistry>,
) -> Reply<Created> {
    execute!({
        let mut registry = lock(registry)?;
        let candidate = registry.add_candidate(&caller.0, id, &body.name)?;
        Ok(Json(Created { id: candidate }))
    })
}

#[get("/elections/<id>/candidates/<candidate>")]
fn get_candidate(
    id: ElectionId,
    candidate: CandidateId,
    registry: &State<SharedRegistry>,
) -> Reply<Candidate> {
    execute!({
        let registry = lock(registry)?;
        Ok(Json(registry.get_candidate(id, candidate)?))
    })
}

#[post("/elections/<id>/votes", data = "<body>", format = "json")]
fn vote(
    caller: Caller,
    id: ElectionId,
    body: Json<Ballot>,
    registry: &State<SharedRegistry>,
) -> Reply<LoggedEvent> {
    execute!({
        let mut registry = lock(registry)?;
        registry.vote(&caller.0, id, body.candidate)?;
        last_event(&registry)
    })
}

#[get("/elections/<id>/voters/<voter>")]
fn has_voted(
    id: ElectionId,
    voter: &str,
    registry: &State<SharedRegistry>,
) -> Reply<VoterStatus> {
    execute!({
        let voter: Address = voter.parse()?;
        let registry = lock(registry)?;
        Ok(Json(VoterStatus {
            voted: registry.has_voted(id, &voter)?,
        }))
    })
}

#[post("/elections/<id>/end")]
fn end_election(
    caller: Caller,
    id: ElectionId,
    registry: &State<SharedRegistry>,
) -> Reply<LoggedEvent> {
    execute!({
        let mut registry = lock(registry)?;
        registry.end_election(&caller.0, id)?;
        last_event(&registry)
    })
}

#[post("/elections/<id>/winner?<start>")]
fn update_winner(
    id: ElectionId,
    start: Option<&str>,
    registry: &State<SharedRegistry>,
) -> Reply<Winner> {
    execute!({
        let start = parse_query::<usize>("start", start)?;
        let mut registry = lock(registry)?;
        Ok(Json(registry.update_winner(id, start.unwrap_or(0))?))
    })
}

#[get("/elections/<id>/winner")]
fn get_winner(id: ElectionId, registry: &State<SharedRegistry>) -> Reply<Winner> {
    execute!({
        let registry = lock(registry)?;
        Ok(Json(registry.get_winner(id)?))
    })
}

#[get("/events?<since>")]
fn events(since: Option<&str>, registry: &State<SharedRegistry>) -> Reply<Vec<LoggedEvent>> {
    execute!({
        let since = parse_query::<u64>("since", since)?;
        let registry = lock(registry)?;
        Ok(Json(registry.events().since(since.unwrap_or(0)).to_vec()))
    })
}

/// A query value that is present but malformed is an error.
fn parse_query<T: std::str::FromStr>(name: &'static str, value: Option<&str>) -> Result<Option<T>> {
    value
        .map(|v| v.parse::<T>().map_err(|_| Error::InvalidQuery(name, v.to_string())))
        .transpose()
        .map_err(Into::into)
}

fn last_event(registry: &Registry) -> Result<Json<LoggedEvent>> {
    registry
        .events()
        .last()
        .cloned()
        .map(Json)
        .ok_or_else(|| anyhow!("event log is empty"))
}
