//! Session management
//!
//! A [`Session`] owns exactly one [`Match`] and the [`RecordSink`] it writes
//! to, guarded by a single mutex held for the duration of each operation.
//! Its methods map one to one onto the operations a host exposes over HTTP
//! or any other transport, taking and returning plain JSON-shaped data.
//! [`Session::receive`] dispatches a whole [`Request`] and never fails:
//! errors are rendered into the [`Reply`] for the caller to show.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    Reply, Request,
    challenge::{self, ChallengeProvider, ChallengeView, QuestionBank},
    choice::{Choice, ParseChoiceError},
    game::{
        self, ChallengeOutcome, GameStateView, Match, Mode, PlayOutcome, Seat, SeatError, Setup,
        coerce_max_rounds,
    },
    records::{self, RecordSink, Records},
};

/// Errors that can occur while handling a request
#[derive(Error, Debug)]
pub enum Error {
    /// The match rejected the operation
    #[error(transparent)]
    Game(#[from] game::Error),
    /// The player number does not name a seat
    #[error(transparent)]
    Seat(#[from] SeatError),
    /// The submitted choice is not rock, paper or scissors
    #[error(transparent)]
    Choice(#[from] ParseChoiceError),
    /// A custom question bank could not be loaded
    #[error(transparent)]
    Bank(#[from] challenge::bank::Error),
    /// A record could not be written
    #[error(transparent)]
    Records(#[from] records::Error),
    /// The request could not be parsed
    #[error("invalid request: {0}")]
    Request(#[from] serde_json::Error),
}

/// Parameters of a start request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRequest {
    /// Mode string; unknown modes fall back to player versus easy CPU
    pub game_mode: Option<String>,
    /// Requested name for player 1
    pub player1_name: Option<String>,
    /// Requested name for player 2
    pub player2_name: Option<String>,
    /// Round limit in any JSON shape; see [`coerce_max_rounds`]
    pub max_rounds: Option<Value>,
}

/// Parameters of a play request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayRequest {
    /// `rock`, `paper` or `scissors`; absent for CPU-only rounds
    pub player_choice: Option<String>,
    /// Seat submitting the choice, defaults to 1
    pub player_number: Option<u8>,
}

/// Parameters of a challenge answer
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    /// Seat answering the challenge
    pub player_number: u8,
    /// The submitted letter or word
    #[serde(default)]
    pub answer: String,
}

/// Parameters of a record append
#[derive(Debug, Clone, Deserialize)]
pub struct SaveRecordRequest {
    /// Category to append to, created if unknown
    pub record_type: String,
    /// Opaque record payload
    pub data: Value,
}

/// Reply to a challenge lookup
///
/// `challenge` is `null` when nothing is pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeReply {
    /// The pending challenge without its answer
    pub challenge: Option<ChallengeView>,
    /// Player the challenge is addressed to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_player: Option<Seat>,
}

/// Acknowledgement for operations without a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusReply {
    /// Always `"success"`
    pub status: &'static str,
}

impl StatusReply {
    fn success() -> Self {
        Self { status: "success" }
    }
}

/// A structured failure payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReply {
    /// Human-readable description of the failure
    pub error: String,
}

impl From<Error> for ErrorReply {
    fn from(error: Error) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

struct Inner<S> {
    game: Match,
    sink: S,
}

/// One match and its record sink behind a single lock
pub struct Session<S: RecordSink> {
    inner: Mutex<Inner<S>>,
}

impl<S: RecordSink> Session<S> {
    /// Creates a session with an inactive match over the built-in question bank
    pub fn new(sink: S) -> Self {
        Self::from_match(Match::new(), sink)
    }

    /// Creates a session around an existing match
    pub fn from_match(game: Match, sink: S) -> Self {
        Self {
            inner: Mutex::new(Inner { game, sink }),
        }
    }

    /// Creates a session whose challenges come from a custom JSON question bank
    ///
    /// # Errors
    ///
    /// Returns `Error::Bank` if the bank is malformed or fails validation.
    pub fn with_question_bank(bank_json: &str, sink: S) -> Result<Self, Error> {
        let bank = QuestionBank::from_json(bank_json)?;
        let game = Match::with_provider(ChallengeProvider::new(bank), fastrand::Rng::new());
        Ok(Self::from_match(game, sink))
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new match, discarding the current one
    pub fn start(&self, request: StartRequest) -> GameStateView {
        let setup = Setup {
            mode: request
                .game_mode
                .as_deref()
                .map(Mode::from)
                .unwrap_or_default(),
            player1_name: request.player1_name,
            player2_name: request.player2_name,
            max_rounds: coerce_max_rounds(request.max_rounds.as_ref()),
        };
        self.lock().game.start(setup)
    }

    /// Submits a choice for a seat
    ///
    /// # Errors
    ///
    /// * `Error::Choice` - The choice string is not a valid choice
    /// * `Error::Seat` - The player number is not 1 or 2
    /// * `Error::Game` - The match is inactive or waiting on a challenge
    pub fn play_round(&self, request: PlayRequest) -> Result<PlayOutcome, Error> {
        let choice = request
            .player_choice
            .as_deref()
            .map(str::parse::<Choice>)
            .transpose()?;
        let seat = Seat::try_from(request.player_number.unwrap_or(1))?;

        let mut inner = self.lock();
        let Inner { game, sink } = &mut *inner;
        Ok(game.play_round(choice, seat, sink)?)
    }

    /// Client-safe view of the match
    pub fn get_game_state(&self) -> GameStateView {
        self.lock().game.game_state()
    }

    /// The pending challenge without its answer
    pub fn get_current_challenge(&self) -> ChallengeReply {
        match self.lock().game.current_challenge() {
            Some(ticket) => ChallengeReply {
                challenge: Some(ticket.challenge),
                for_player: Some(ticket.for_player),
            },
            None => ChallengeReply {
                challenge: None,
                for_player: None,
            },
        }
    }

    /// Grades a challenge answer
    ///
    /// # Errors
    ///
    /// * `Error::Seat` - The player number is not 1 or 2
    /// * `Error::Game` - No challenge is pending for that player
    pub fn submit_challenge(&self, request: SubmitRequest) -> Result<ChallengeOutcome, Error> {
        let seat = Seat::try_from(request.player_number)?;

        let mut inner = self.lock();
        let Inner { game, sink } = &mut *inner;
        Ok(game.submit_challenge_answer(seat, &request.answer, sink)?)
    }

    /// Returns the match to its inactive default; records are kept
    pub fn reset(&self) -> StatusReply {
        self.lock().game.reset();
        info!("Match reset");
        StatusReply::success()
    }

    /// Every stored record, keyed by category
    pub fn get_records(&self) -> Records {
        self.lock().sink.load()
    }

    /// Appends an arbitrary record, such as a tournament champion
    ///
    /// # Errors
    ///
    /// Returns `Error::Records` if the sink could not persist the record.
    pub fn save_record(&self, request: SaveRecordRequest) -> Result<StatusReply, Error> {
        self.lock()
            .sink
            .append(&request.record_type, request.data)?;
        Ok(StatusReply::success())
    }

    /// Dispatches a request to the matching operation
    ///
    /// Failures are rendered as [`ErrorReply`] payloads.
    pub fn receive(&self, request: Request) -> Reply {
        debug!(?request, "Request received");

        let reply = match request {
            Request::StartGame(request) => Ok(self.start(request).into()),
            Request::PlayRound(request) => self.play_round(request).map(Reply::from),
            Request::GetGameState => Ok(self.get_game_state().into()),
            Request::GetChallenge => Ok(self.get_current_challenge().into()),
            Request::SubmitChallenge(request) => self.submit_challenge(request).map(Reply::from),
            Request::ResetGame => Ok(self.reset().into()),
            Request::GetRecords => Ok(self.get_records().into()),
            Request::SaveRecord(request) => self.save_record(request).map(Reply::from),
        };

        reply.unwrap_or_else(|e| {
            debug!(error = %e, "Request failed");
            ErrorReply::from(e).into()
        })
    }

    /// Parses a raw JSON request, dispatches it and serializes the reply
    pub fn receive_message(&self, raw: &str) -> String {
        let reply = match serde_json::from_str::<Request>(raw) {
            Ok(request) => self.receive(request),
            Err(e) => ErrorReply::from(Error::from(e)).into(),
        };
        reply.to_message()
    }
}
