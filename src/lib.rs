//! # Roshambo Game Library
//!
//! This library provides the core game logic for a best-of-N
//! Rock-Paper-Scissors game. It handles match setup for human and CPU
//! players, round resolution, an adaptive CPU opponent, quiz and
//! word-guess challenges for players who lose a round, and a persistent
//! log of completed matches.
//!
//! Hosts drive a [`session::Session`] either through its typed methods or
//! by feeding it [`Request`]s and sending back the resulting [`Reply`].

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::large_enum_variant)]
use serde::{Deserialize, Serialize};

pub mod constants;

pub mod challenge;
pub mod choice;
pub mod cpu;
pub mod game;
pub mod match_id;
mod names;
pub mod records;
pub mod session;

/// Requests a host can forward to a session
///
/// Requests are tagged by their `action` field, with the remaining fields
/// carrying the operation's parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    /// Start a new match
    StartGame(session::StartRequest),
    /// Submit a choice for a seat
    PlayRound(session::PlayRequest),
    /// Fetch the client-safe match state
    GetGameState,
    /// Fetch the pending challenge
    GetChallenge,
    /// Answer the pending challenge
    SubmitChallenge(session::SubmitRequest),
    /// Discard the current match
    ResetGame,
    /// Fetch every stored record
    GetRecords,
    /// Append an arbitrary record
    SaveRecord(session::SaveRecordRequest),
}

/// Replies produced by a session
///
/// Each variant serializes as its payload alone, so clients see plain JSON
/// objects rather than an enum wrapper.
#[derive(Debug, Clone, Serialize, derive_more::From)]
#[serde(untagged)]
pub enum Reply {
    /// Match state after starting or on request
    State(game::GameStateView),
    /// Result of a submitted choice
    Play(game::PlayOutcome),
    /// The pending challenge, if any
    Challenge(session::ChallengeReply),
    /// Result of a challenge answer
    ChallengeResult(game::ChallengeOutcome),
    /// Every stored record
    Records(records::Records),
    /// Acknowledgement of a reset or a saved record
    Status(session::StatusReply),
    /// A failed operation
    Error(session::ErrorReply),
}

impl Reply {
    /// Converts the reply to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }

    /// Whether the reply reports a failure
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}
