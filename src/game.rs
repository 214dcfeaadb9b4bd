//! Core match logic and state management
//!
//! This module contains the [`Match`] engine that drives a best-of-N
//! Rock-Paper-Scissors contest between two seats. It records choices,
//! lets CPU seats pick through their [`CpuPolicy`], resolves rounds,
//! hands a challenge to any human who loses a round, and finalizes the
//! match once the round limit is exhausted and no challenge is pending.
//!
//! The match moves through explicit [`Phase`]s:
//!
//! ```text
//! Inactive --start--> Choosing --human loses--> Challenge --answer--> Choosing
//!                         |                         |
//!                         +--rounds exhausted--> Inactive <--rounds exhausted--+
//! ```

use std::{cmp::Ordering, fmt::Display};

use chrono::Utc;
use enum_map::{Enum, EnumMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    challenge::{Challenge, ChallengeProvider, ChallengeView},
    choice::{self, Choice, RoundResult},
    constants::{
        names::{DEFAULT_PLAYER1_NAME, DEFAULT_PLAYER2_NAME},
        rounds::{DEFAULT_MAX_ROUNDS, FIRST_ROUND},
    },
    cpu::{CpuPolicy, Difficulty, most_frequent},
    match_id::MatchId,
    names,
    records::{self, MatchRecord, RecordCategory, RecordSink},
};

/// Which seats are human and how the CPU plays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Both seats are human
    PlayerVsPlayer,
    /// Seat two is a CPU picking at random
    PlayerVsCpuEasy,
    /// Seat two is a CPU that adapts to the human's habits
    PlayerVsCpuHard,
    /// Both seats are CPUs picking at random
    CpuVsCpu,
    /// Unrecognised mode; plays like [`Mode::PlayerVsCpuEasy`]
    #[default]
    #[serde(other)]
    Unknown,
}

impl From<&str> for Mode {
    /// Maps a mode string onto a mode, unknown strings becoming [`Mode::Unknown`]
    fn from(raw: &str) -> Self {
        match raw.trim() {
            "player_vs_player" => Mode::PlayerVsPlayer,
            "player_vs_cpu_easy" => Mode::PlayerVsCpuEasy,
            "player_vs_cpu_hard" => Mode::PlayerVsCpuHard,
            "cpu_vs_cpu" => Mode::CpuVsCpu,
            _ => Mode::Unknown,
        }
    }
}

impl Mode {
    /// Whether `seat` is controlled by a human in this mode
    pub fn is_human(self, seat: Seat) -> bool {
        match (self, seat) {
            (Mode::PlayerVsPlayer, _) => true,
            (Mode::CpuVsCpu, _) => false,
            (_, Seat::One) => true,
            (_, Seat::Two) => false,
        }
    }

    /// The policy CPU seats use in this mode
    pub fn cpu_policy(self) -> CpuPolicy {
        match self {
            Mode::PlayerVsCpuHard => CpuPolicy::new(Difficulty::Hard),
            _ => CpuPolicy::new(Difficulty::Easy),
        }
    }

    /// The record category a completed match of this mode is written to, if any
    pub fn record_category(self) -> Option<RecordCategory> {
        match self {
            Mode::PlayerVsPlayer => Some(RecordCategory::PlayerVsPlayer),
            _ => None,
        }
    }
}

/// One of the two contestant positions
///
/// Seats serialize as the player numbers `1` and `2`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum Seat {
    /// Player 1
    One,
    /// Player 2
    Two,
}

/// Error returned for player numbers other than 1 and 2
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatError {
    /// The player number does not name a seat
    #[error("player number must be 1 or 2, got {0}")]
    Invalid(u8),
}

impl Seat {
    /// Both seats in order
    pub const ALL: [Seat; 2] = [Seat::One, Seat::Two];

    /// The player number of this seat
    pub fn number(self) -> u8 {
        match self {
            Seat::One => 1,
            Seat::Two => 2,
        }
    }

    /// The other seat
    pub fn opponent(self) -> Seat {
        match self {
            Seat::One => Seat::Two,
            Seat::Two => Seat::One,
        }
    }
}

impl From<Seat> for u8 {
    fn from(seat: Seat) -> Self {
        seat.number()
    }
}

impl TryFrom<u8> for Seat {
    type Error = SeatError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        match number {
            1 => Ok(Seat::One),
            2 => Ok(Seat::Two),
            other => Err(SeatError::Invalid(other)),
        }
    }
}

impl Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.number().fmt(f)
    }
}

/// Errors returned by match operations
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The match was never started or has already finished
    #[error("game not active")]
    NotActive,
    /// There is no pending challenge addressed to this player
    #[error("no challenge pending for player {0}")]
    NoChallengeForPlayer(Seat),
    /// A challenge must be answered before the next round can be played
    #[error("player {0} must answer the pending challenge first")]
    ChallengePending(Seat),
}

/// One contestant and their per-round state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSlot {
    name: String,
    score: u32,
    pending_choice: Option<Choice>,
    is_human: bool,
}

impl PlayerSlot {
    fn new(name: String, is_human: bool) -> Self {
        Self {
            name,
            score: 0,
            pending_choice: None,
            is_human,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rounds won plus points gained from failed opponent challenges
    pub fn score(&self) -> u32 {
        self.score
    }

    /// The choice made for the current round, if any
    pub fn pending_choice(&self) -> Option<Choice> {
        self.pending_choice
    }

    /// Whether a choice has been made for the current round
    pub fn choice_made(&self) -> bool {
        self.pending_choice.is_some()
    }

    /// Whether a human controls this slot
    pub fn is_human(&self) -> bool {
        self.is_human
    }
}

/// The step of the match protocol the match is in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Not started, reset, or finished
    #[default]
    Inactive,
    /// Waiting for one or both seats to choose
    Choosing,
    /// A human lost the last round and must answer a challenge
    Challenge {
        /// The challenged seat
        seat: Seat,
        /// The live challenge
        challenge: Challenge,
        /// Whether the match finalizes once the challenge is answered
        end_after: bool,
    },
}

/// Full mutable state of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchState {
    id: MatchId,
    mode: Mode,
    players: EnumMap<Seat, PlayerSlot>,
    draws: u32,
    current_round: u32,
    max_rounds: u32,
    history: Vec<Choice>,
    revealed: Vec<Choice>,
    phase: Phase,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            id: MatchId::new(),
            mode: Mode::default(),
            players: EnumMap::from_fn(|seat| match seat {
                Seat::One => PlayerSlot::new(DEFAULT_PLAYER1_NAME.to_string(), true),
                Seat::Two => PlayerSlot::new(DEFAULT_PLAYER2_NAME.to_string(), false),
            }),
            draws: 0,
            current_round: FIRST_ROUND,
            max_rounds: DEFAULT_MAX_ROUNDS,
            history: Vec::new(),
            revealed: Vec::new(),
            phase: Phase::Inactive,
        }
    }
}

impl MatchState {
    /// Identifier of the current match
    pub fn id(&self) -> MatchId {
        self.id
    }

    /// Mode the match was started in
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The slot sitting in `seat`
    pub fn player(&self, seat: Seat) -> &PlayerSlot {
        &self.players[seat]
    }

    /// Number of drawn rounds
    pub fn draws(&self) -> u32 {
        self.draws
    }

    /// Number of the round being played, starting at 1
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Number of rounds the match lasts
    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Choices made by human seats, oldest first
    pub fn history(&self) -> &[Choice] {
        &self.history
    }

    /// Final human picks of resolved rounds, oldest first
    ///
    /// Unlike [`MatchState::history`], replaced or withdrawn submissions
    /// never appear here.
    pub fn revealed(&self) -> &[Choice] {
        &self.revealed
    }

    /// Current protocol phase
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Whether rounds or challenges are still accepted
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Inactive)
    }

    /// Whether both seats have chosen for the current round
    pub fn both_ready(&self) -> bool {
        self.players.values().all(PlayerSlot::choice_made)
    }

    /// Whether completion is deferred until the pending challenge is answered
    pub fn end_after_challenge(&self) -> bool {
        matches!(self.phase, Phase::Challenge { end_after: true, .. })
    }

    /// The pending challenge and the seat it is addressed to
    pub fn pending_challenge(&self) -> Option<(Seat, &Challenge)> {
        match &self.phase {
            Phase::Challenge {
                seat, challenge, ..
            } => Some((*seat, challenge)),
            _ => None,
        }
    }
}

/// Parameters for starting a match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Setup {
    /// Which seats are human and how the CPU plays
    pub mode: Mode,
    /// Requested name for seat one
    pub player1_name: Option<String>,
    /// Requested name for seat two
    pub player2_name: Option<String>,
    /// Number of rounds; zero selects the default
    pub max_rounds: u32,
}

/// Coerces a client-supplied round count into a positive number of rounds
///
/// Positive integers are used as is, positive floats are truncated and
/// numeric strings are parsed. Anything else selects `DEFAULT_MAX_ROUNDS`.
pub fn coerce_max_rounds(raw: Option<&Value>) -> u32 {
    let requested = match raw {
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 1.).map(|f| f as u64)),
        Some(Value::String(text)) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    requested
        .filter(|rounds| *rounds > 0)
        .and_then(|rounds| u32::try_from(rounds).ok())
        .unwrap_or(DEFAULT_MAX_ROUNDS)
}

/// How a slot's choice is presented to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceDisplay {
    /// No choice made yet
    Waiting,
    /// A choice was made but is still hidden
    Ready,
    /// The round resolved and the choice is shown
    Revealed,
}

/// Client-safe view of one slot
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    /// Display name
    pub name: String,
    /// Current score
    pub score: u32,
    /// Whether a human controls the slot
    pub is_human: bool,
    /// Whether a choice was made this round
    pub choice_made: bool,
    /// Presentation state of the choice
    pub choice_display: ChoiceDisplay,
    /// Icon for the presentation state or revealed choice
    pub choice_emoji: String,
    /// Label for the presentation state or revealed choice
    pub choice_text: String,
    /// The choice itself, present only once revealed
    pub choice: Option<Choice>,
}

impl SlotView {
    fn new(slot: &PlayerSlot, reveal: bool) -> Self {
        let (choice_display, choice_emoji, choice_text, choice) =
            match (reveal, slot.pending_choice) {
                (true, Some(choice)) => (
                    ChoiceDisplay::Revealed,
                    choice.emoji().to_string(),
                    choice.text(),
                    Some(choice),
                ),
                (_, Some(_)) => (
                    ChoiceDisplay::Ready,
                    "✅".to_string(),
                    "Ready!".to_string(),
                    None,
                ),
                (_, None) => (
                    ChoiceDisplay::Waiting,
                    "❓".to_string(),
                    "Waiting...".to_string(),
                    None,
                ),
            };
        Self {
            name: slot.name.clone(),
            score: slot.score,
            is_human: slot.is_human,
            choice_made: slot.choice_made(),
            choice_display,
            choice_emoji,
            choice_text,
            choice,
        }
    }
}

/// Summary of the human picks of resolved rounds
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveStats {
    /// Number of revealed human moves
    pub total: usize,
    /// How often each choice was played
    pub counts: EnumMap<Choice, usize>,
    /// The most played choice, ties going to the lowest ordinal
    pub most_common: Option<Choice>,
}

impl MoveStats {
    fn from_moves(moves: &[Choice]) -> Self {
        let mut counts: EnumMap<Choice, usize> = EnumMap::default();
        for choice in moves {
            counts[*choice] += 1;
        }
        Self {
            total: moves.len(),
            counts,
            most_common: most_frequent(moves),
        }
    }
}

/// Client-safe projection of the match state
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameStateView {
    /// Identifier of the match
    pub match_id: MatchId,
    /// Mode the match was started in
    pub game_mode: Mode,
    /// Seat one
    pub player1: SlotView,
    /// Seat two
    pub player2: SlotView,
    /// Number of drawn rounds
    pub draws: u32,
    /// Number of the round being played
    pub current_round: u32,
    /// Number of rounds the match lasts
    pub max_rounds: u32,
    /// Whether rounds or challenges are still accepted
    pub game_active: bool,
    /// Whether both choices are revealed
    pub both_ready: bool,
    /// Whether a challenge is waiting for an answer
    pub challenge_pending: bool,
    /// Player the pending challenge is addressed to
    pub challenge_for: Option<Seat>,
    /// Whether the match completes once the challenge is answered
    pub end_after_challenge: bool,
    /// Summary of the human picks of resolved rounds
    pub history: MoveStats,
}

/// Final standing of a completed match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "standing", content = "seat", rename_all = "snake_case")]
pub enum Standing {
    /// The seat with the higher score
    Winner(Seat),
    /// Both seats finished level
    Tie,
}

/// Details attached to the reply that completed a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// Who won
    pub standing: Standing,
    /// Announcement of the champion or the tie
    pub message: String,
}

/// Result of a resolved round
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    /// Who won the round
    pub result: RoundResult,
    /// Headline naming the winner or the draw
    pub message: String,
    /// How the winning hand beat the losing one, empty on a draw
    pub victory_message: String,
    /// State after resolution with both choices revealed
    pub game_state: GameStateView,
    /// Always true: both choices were made
    pub both_ready: bool,
    /// Whether the losing human was handed a challenge
    pub challenge_issued: bool,
    /// Player the challenge is addressed to
    pub challenge_for: Option<Seat>,
    /// Whether this round completed the match
    pub game_complete: bool,
    /// Final standing when the match completed
    pub completion: Option<Completion>,
}

/// Reply to a submitted choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlayOutcome {
    /// The other seat still has to choose
    Waiting {
        /// Current state with choices hidden
        game_state: GameStateView,
        /// Player whose submission was recorded
        player_ready: Seat,
        /// Always false while waiting
        both_ready: bool,
    },
    /// Both seats chose and the round was resolved
    Resolved(RoundReport),
}

/// The pending challenge as shown to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeTicket {
    /// The challenge without its answer
    pub challenge: ChallengeView,
    /// Player the challenge is addressed to
    pub for_player: Seat,
}

/// Result of grading a challenge answer
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeOutcome {
    /// Whether the answer was accepted
    pub correct: bool,
    /// The accepted answer, revealed after grading
    pub solution: String,
    /// Human-readable verdict
    pub message: String,
    /// Player who gained a point because the answer was wrong
    pub point_to: Option<Seat>,
    /// State after grading
    pub game_state: GameStateView,
    /// Whether this answer completed the match
    pub game_complete: bool,
    /// Final standing when the match completed
    pub completion: Option<Completion>,
}

/// A single best-of-N match
///
/// The match owns its state, the challenge provider and the random source
/// used for CPU picks and challenge draws. Record writes go through the
/// sink passed to the operations that may complete the match.
#[derive(Debug, Clone)]
pub struct Match {
    state: MatchState,
    provider: ChallengeProvider,
    rng: fastrand::Rng,
}

impl Default for Match {
    fn default() -> Self {
        Self::new()
    }
}

impl Match {
    /// Creates an inactive match using the built-in question bank
    pub fn new() -> Self {
        Self::with_provider(ChallengeProvider::default(), fastrand::Rng::new())
    }

    /// Creates an inactive match whose random choices are reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self::with_provider(ChallengeProvider::default(), fastrand::Rng::with_seed(seed))
    }

    /// Creates an inactive match with a custom challenge provider and random source
    pub fn with_provider(provider: ChallengeProvider, rng: fastrand::Rng) -> Self {
        Self {
            state: MatchState::default(),
            provider,
            rng,
        }
    }

    /// Current state
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Whether rounds or challenges are still accepted
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Discards the current match, leaving an inactive default
    pub fn reset(&mut self) {
        self.state = MatchState::default();
    }

    /// Starts a new match, discarding any previous one
    pub fn start(&mut self, setup: Setup) -> GameStateView {
        let Setup {
            mode,
            player1_name,
            player2_name,
            max_rounds,
        } = setup;

        if mode == Mode::Unknown {
            warn!("Unrecognised game mode, seat two falls back to an easy CPU");
        }

        let max_rounds = if max_rounds == 0 {
            DEFAULT_MAX_ROUNDS
        } else {
            max_rounds
        };

        self.state = MatchState {
            id: MatchId::new(),
            mode,
            players: EnumMap::from_fn(|seat| {
                let name = match seat {
                    Seat::One => names::sanitize(player1_name.as_deref(), DEFAULT_PLAYER1_NAME),
                    Seat::Two => names::sanitize(player2_name.as_deref(), DEFAULT_PLAYER2_NAME),
                };
                PlayerSlot::new(name, mode.is_human(seat))
            }),
            draws: 0,
            current_round: FIRST_ROUND,
            max_rounds,
            history: Vec::new(),
            revealed: Vec::new(),
            phase: Phase::Choosing,
        };

        info!(match_id = %self.state.id, ?mode, max_rounds, "Match started");

        self.game_state()
    }

    /// Records a choice for `seat` and resolves the round once both seats have chosen
    ///
    /// CPU seats without a choice pick immediately, so a single call can
    /// resolve a round against a CPU or between two CPUs. Passing `None`
    /// withdraws the seat's choice.
    ///
    /// # Errors
    ///
    /// * `Error::NotActive` - The match is not running
    /// * `Error::ChallengePending` - A challenge must be answered first
    pub fn play_round<S: RecordSink>(
        &mut self,
        choice: Option<Choice>,
        seat: Seat,
        sink: &mut S,
    ) -> Result<PlayOutcome, Error> {
        match &self.state.phase {
            Phase::Inactive => {
                warn!(%seat, "Round played on an inactive match");
                return Err(Error::NotActive);
            }
            Phase::Challenge { seat: pending, .. } => return Err(Error::ChallengePending(*pending)),
            Phase::Choosing => {}
        }

        let slot = &mut self.state.players[seat];
        slot.pending_choice = choice;
        if slot.is_human {
            self.state.history.extend(choice);
        }

        let policy = self.state.mode.cpu_policy();
        for cpu_seat in Seat::ALL {
            let slot = &self.state.players[cpu_seat];
            if !slot.is_human && !slot.choice_made() {
                let pick = policy.choose(&self.state.history, &mut self.rng);
                self.state.players[cpu_seat].pending_choice = Some(pick);
            }
        }

        match (
            self.state.players[Seat::One].pending_choice,
            self.state.players[Seat::Two].pending_choice,
        ) {
            (Some(first), Some(second)) => Ok(PlayOutcome::Resolved(
                self.resolve_round(first, second, sink),
            )),
            _ => Ok(PlayOutcome::Waiting {
                game_state: self.game_state(),
                player_ready: seat,
                both_ready: false,
            }),
        }
    }

    /// Scores a round, advances the round counter and hands off to a challenge or completion
    fn resolve_round<S: RecordSink>(
        &mut self,
        first: Choice,
        second: Choice,
        sink: &mut S,
    ) -> RoundReport {
        let result = choice::resolve(first, second);
        let winner = match result {
            RoundResult::Player1 => Some(Seat::One),
            RoundResult::Player2 => Some(Seat::Two),
            RoundResult::Draw => None,
        };

        let (message, victory_message) = match winner {
            Some(seat) => {
                let slot = &mut self.state.players[seat];
                slot.score += 1;
                let (won, lost) = match seat {
                    Seat::One => (first, second),
                    Seat::Two => (second, first),
                };
                (
                    format!("{} WINS!", slot.name),
                    choice::victory_message(won, lost).to_string(),
                )
            }
            None => {
                self.state.draws += 1;
                ("It's a DRAW!".to_string(), String::new())
            }
        };

        debug!(
            match_id = %self.state.id,
            round = self.state.current_round,
            %first,
            %second,
            ?result,
            "Round resolved"
        );

        for (seat, pick) in [(Seat::One, first), (Seat::Two, second)] {
            if self.state.players[seat].is_human {
                self.state.revealed.push(pick);
            }
        }

        self.state.current_round += 1;
        let exhausted = self.state.current_round > self.state.max_rounds;

        let human_loser = winner
            .map(Seat::opponent)
            .filter(|loser| self.state.players[*loser].is_human);
        let challenged = human_loser.and_then(|loser| self.issue_challenge(loser, exhausted));

        let completion = match challenged {
            None if exhausted => Some(self.finalize(sink)),
            _ => None,
        };

        let game_state = self.project(true);

        for slot in self.state.players.values_mut() {
            slot.pending_choice = None;
        }

        RoundReport {
            result,
            message,
            victory_message,
            game_state,
            both_ready: true,
            challenge_issued: challenged.is_some(),
            challenge_for: challenged,
            game_complete: completion.is_some(),
            completion,
        }
    }

    fn issue_challenge(&mut self, loser: Seat, end_after: bool) -> Option<Seat> {
        let Some(challenge) = self.provider.draw(&mut self.rng) else {
            warn!(seat = %loser, "Question bank produced no challenge");
            return None;
        };
        info!(
            match_id = %self.state.id,
            seat = %loser,
            kind = ?challenge.kind(),
            end_after,
            "Challenge issued"
        );
        self.state.phase = Phase::Challenge {
            seat: loser,
            challenge,
            end_after,
        };
        Some(loser)
    }

    /// The pending challenge without its answer, if any
    pub fn current_challenge(&self) -> Option<ChallengeTicket> {
        self.state
            .pending_challenge()
            .map(|(seat, challenge)| ChallengeTicket {
                challenge: challenge.view(),
                for_player: seat,
            })
    }

    /// Grades the answer to the challenge addressed to `seat`
    ///
    /// The challenge is cleared whatever the verdict. A wrong answer gives
    /// the opponent a point. If the match was waiting on this challenge to
    /// complete, it completes now.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoChallengeForPlayer` if no challenge is pending for `seat`.
    pub fn submit_challenge_answer<S: RecordSink>(
        &mut self,
        seat: Seat,
        answer: &str,
        sink: &mut S,
    ) -> Result<ChallengeOutcome, Error> {
        let (challenge, end_after) = match std::mem::take(&mut self.state.phase) {
            Phase::Challenge {
                seat: pending,
                challenge,
                end_after,
            } if pending == seat => (challenge, end_after),
            other => {
                self.state.phase = other;
                return Err(Error::NoChallengeForPlayer(seat));
            }
        };

        let correct = ChallengeProvider::grade(Some(&challenge), answer);
        let solution = challenge.solution();

        let (point_to, message) = if correct {
            (None, "Correct! The round stands.".to_string())
        } else {
            let opponent = seat.opponent();
            let slot = &mut self.state.players[opponent];
            slot.score += 1;
            (
                Some(opponent),
                format!("Wrong! The answer was {solution}. {} gets an extra point.", slot.name),
            )
        };

        info!(match_id = %self.state.id, %seat, correct, "Challenge graded");

        let completion = if end_after {
            Some(self.finalize(sink))
        } else {
            self.state.phase = Phase::Choosing;
            None
        };

        Ok(ChallengeOutcome {
            correct,
            solution,
            message,
            point_to,
            game_state: self.game_state(),
            game_complete: completion.is_some(),
            completion,
        })
    }

    /// Ends the match and writes its record when the mode keeps one
    fn finalize<S: RecordSink>(&mut self, sink: &mut S) -> Completion {
        self.state.phase = Phase::Inactive;

        let one = &self.state.players[Seat::One];
        let two = &self.state.players[Seat::Two];
        let standing = match one.score.cmp(&two.score) {
            Ordering::Greater => Standing::Winner(Seat::One),
            Ordering::Less => Standing::Winner(Seat::Two),
            Ordering::Equal => Standing::Tie,
        };
        let message = match standing {
            Standing::Winner(seat) => {
                format!("🎊 {} is the CHAMPION! 🎊", self.state.players[seat].name)
            }
            Standing::Tie => "🏅 The game ended in a TIE!".to_string(),
        };

        info!(
            match_id = %self.state.id,
            player1 = one.score,
            player2 = two.score,
            ?standing,
            "Match complete"
        );

        if let Some(category) = self.state.mode.record_category() {
            let record = MatchRecord {
                label: format!("{} vs {}", one.name, two.name),
                winner: match standing {
                    Standing::Winner(seat) => Some(self.state.players[seat].name.clone()),
                    Standing::Tie => None,
                },
                scores: [one.score, two.score],
                date: Utc::now(),
            };
            let written = serde_json::to_value(&record)
                .map_err(records::Error::from)
                .and_then(|entry| sink.append(category.key(), entry));
            if let Err(e) = written {
                warn!(match_id = %self.state.id, error = %e, "Failed to write match record");
            }
        }

        Completion { standing, message }
    }

    /// Client-safe view of the current state
    ///
    /// Choices stay hidden unless both seats are ready, and the pending
    /// challenge is only reported by seat, never by content.
    pub fn game_state(&self) -> GameStateView {
        self.project(self.state.both_ready())
    }

    fn project(&self, reveal: bool) -> GameStateView {
        let challenge_for = self.state.pending_challenge().map(|(seat, _)| seat);
        GameStateView {
            match_id: self.state.id,
            game_mode: self.state.mode,
            player1: SlotView::new(&self.state.players[Seat::One], reveal),
            player2: SlotView::new(&self.state.players[Seat::Two], reveal),
            draws: self.state.draws,
            current_round: self.state.current_round,
            max_rounds: self.state.max_rounds,
            game_active: self.state.is_active(),
            both_ready: reveal,
            challenge_pending: challenge_for.is_some(),
            challenge_for,
            end_after_challenge: self.state.end_after_challenge(),
            history: MoveStats::from_moves(&self.state.revealed),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::records::MemorySink;
    use serde_json::json;

    fn setup(mode: Mode, max_rounds: u32) -> Setup {
        Setup {
            mode,
            player1_name: Some("Ann".to_string()),
            player2_name: Some("Bob".to_string()),
            max_rounds,
        }
    }

    fn started(mode: Mode, max_rounds: u32) -> Match {
        let mut game = Match::with_seed(17);
        game.start(setup(mode, max_rounds));
        game
    }

    fn play(game: &mut Match, sink: &mut MemorySink, first: Choice, second: Choice) -> RoundReport {
        let waiting = game.play_round(Some(first), Seat::One, sink).unwrap();
        assert!(matches!(waiting, PlayOutcome::Waiting { .. }));
        match game.play_round(Some(second), Seat::Two, sink).unwrap() {
            PlayOutcome::Resolved(report) => report,
            PlayOutcome::Waiting { .. } => panic!("round should have resolved"),
        }
    }

    fn pending_solution(game: &Match) -> String {
        game.state().pending_challenge().unwrap().1.solution()
    }

    #[test]
    fn test_start_defaults() {
        let mut game = Match::with_seed(1);
        let view = game.start(Setup {
            mode: Mode::PlayerVsCpuEasy,
            player1_name: None,
            player2_name: Some("   ".to_string()),
            max_rounds: 0,
        });

        assert_eq!(view.max_rounds, DEFAULT_MAX_ROUNDS);
        assert_eq!(view.current_round, 1);
        assert_eq!(view.player1.name, DEFAULT_PLAYER1_NAME);
        assert_eq!(view.player2.name, DEFAULT_PLAYER2_NAME);
        assert!(view.player1.is_human);
        assert!(!view.player2.is_human);
        assert!(view.game_active);
        assert!(!view.challenge_pending);
    }

    #[test]
    fn test_mode_humanity() {
        assert!(Mode::PlayerVsPlayer.is_human(Seat::Two));
        assert!(Mode::PlayerVsCpuHard.is_human(Seat::One));
        assert!(!Mode::PlayerVsCpuHard.is_human(Seat::Two));
        assert!(!Mode::CpuVsCpu.is_human(Seat::One));
        assert!(Mode::Unknown.is_human(Seat::One));
        assert!(!Mode::Unknown.is_human(Seat::Two));
        assert_eq!(Mode::from("cpu_vs_cpu"), Mode::CpuVsCpu);
        assert_eq!(Mode::from("battle_royale"), Mode::Unknown);
        assert_eq!(
            Mode::PlayerVsCpuHard.cpu_policy().difficulty(),
            Difficulty::Hard
        );
        assert_eq!(Mode::CpuVsCpu.cpu_policy().difficulty(), Difficulty::Easy);
    }

    #[test]
    fn test_seat_numbers() {
        assert_eq!(Seat::try_from(1), Ok(Seat::One));
        assert_eq!(Seat::try_from(2), Ok(Seat::Two));
        assert_eq!(Seat::try_from(3), Err(SeatError::Invalid(3)));
        assert_eq!(serde_json::to_value(Seat::Two).unwrap(), json!(2));
        assert_eq!(Seat::One.opponent(), Seat::Two);
    }

    #[test]
    fn test_play_requires_active_match() {
        let mut game = Match::with_seed(1);
        let mut sink = MemorySink::new();
        assert_eq!(
            game.play_round(Some(Choice::Rock), Seat::One, &mut sink),
            Err(Error::NotActive)
        );
    }

    #[test]
    fn test_waiting_hides_choice() {
        let mut game = started(Mode::PlayerVsPlayer, 3);
        let mut sink = MemorySink::new();

        let outcome = game
            .play_round(Some(Choice::Rock), Seat::One, &mut sink)
            .unwrap();
        let PlayOutcome::Waiting {
            game_state,
            player_ready,
            both_ready,
        } = outcome
        else {
            panic!("expected waiting");
        };

        assert_eq!(player_ready, Seat::One);
        assert!(!both_ready);
        assert_eq!(game_state.player1.choice_display, ChoiceDisplay::Ready);
        assert_eq!(game_state.player1.choice, None);
        assert_eq!(game_state.player2.choice_display, ChoiceDisplay::Waiting);

        let json = serde_json::to_value(game.game_state()).unwrap();
        assert!(json["player1"].get("choice").is_none());
        assert_eq!(json["player1"]["choice_text"], "Ready!");
        assert_eq!(json["history"]["total"], 0);
        assert!(json["history"].get("most_common").is_none());
    }

    #[test]
    fn test_withdrawing_a_choice() {
        let mut game = started(Mode::PlayerVsPlayer, 3);
        let mut sink = MemorySink::new();

        game.play_round(Some(Choice::Rock), Seat::One, &mut sink)
            .unwrap();
        game.play_round(None, Seat::One, &mut sink).unwrap();

        assert!(!game.state().player(Seat::One).choice_made());
        assert_eq!(game.state().history(), &[Choice::Rock]);
    }

    #[test]
    fn test_stats_ignore_superseded_picks() {
        let mut game = started(Mode::PlayerVsPlayer, 3);
        let mut sink = MemorySink::new();

        game.play_round(Some(Choice::Scissors), Seat::One, &mut sink)
            .unwrap();
        game.play_round(Some(Choice::Paper), Seat::One, &mut sink)
            .unwrap();
        let stats = game.game_state().history;
        assert_eq!(stats.total, 0);
        assert_eq!(stats.most_common, None);

        game.play_round(None, Seat::One, &mut sink).unwrap();
        assert_eq!(game.game_state().history.total, 0);

        let report = play(&mut game, &mut sink, Choice::Rock, Choice::Rock);
        assert_eq!(report.game_state.history.total, 2);
        assert_eq!(report.game_state.history.counts[Choice::Scissors], 0);
        assert_eq!(report.game_state.history.counts[Choice::Paper], 0);
        assert_eq!(game.state().revealed(), &[Choice::Rock, Choice::Rock]);
    }

    #[test]
    fn test_projection_is_idempotent() {
        let mut game = started(Mode::PlayerVsPlayer, 3);
        let mut sink = MemorySink::new();
        game.play_round(Some(Choice::Paper), Seat::Two, &mut sink)
            .unwrap();
        assert_eq!(game.game_state(), game.game_state());
    }

    #[test]
    fn test_scenario_a_deferred_finalization() {
        let mut game = started(Mode::PlayerVsPlayer, 1);
        let mut sink = MemorySink::new();

        let report = play(&mut game, &mut sink, Choice::Rock, Choice::Scissors);

        assert_eq!(report.result, RoundResult::Player1);
        assert_eq!(report.message, "Ann WINS!");
        assert_eq!(report.victory_message, "Rock crushes Scissors! 💥");
        assert!(report.challenge_issued);
        assert_eq!(report.challenge_for, Some(Seat::Two));
        assert!(!report.game_complete);
        assert_eq!(report.game_state.player1.score, 1);
        assert_eq!(report.game_state.current_round, 2);
        assert_eq!(report.game_state.player1.choice, Some(Choice::Rock));
        assert_eq!(report.game_state.player2.choice, Some(Choice::Scissors));
        assert!(game.is_active());
        assert!(game.state().end_after_challenge());
        assert!(sink.load().get("player_vs_player").is_empty());

        let solution = pending_solution(&game);
        let outcome = game
            .submit_challenge_answer(Seat::Two, &solution, &mut sink)
            .unwrap();

        assert!(outcome.correct);
        assert!(outcome.game_complete);
        assert_eq!(
            outcome.completion.map(|c| c.standing),
            Some(Standing::Winner(Seat::One))
        );
        assert!(!game.is_active());
        assert!(!game.state().end_after_challenge());

        let records = sink.load();
        let pvp = records.get("player_vs_player");
        assert_eq!(pvp.len(), 1);
        assert_eq!(pvp[0]["match"], "Ann vs Bob");
        assert_eq!(pvp[0]["winner"], "Ann");
    }

    #[test]
    fn test_scenario_b_cpu_vs_cpu_auto_resolves() {
        let mut game = started(Mode::CpuVsCpu, 3);
        let mut sink = MemorySink::new();

        for round in 1..=3 {
            let seat = if round % 2 == 0 { Seat::Two } else { Seat::One };
            let PlayOutcome::Resolved(report) = game.play_round(None, seat, &mut sink).unwrap()
            else {
                panic!("cpu rounds resolve immediately");
            };
            assert!(!report.challenge_issued);
            assert_eq!(report.game_complete, round == 3);
        }

        assert!(!game.is_active());
        assert_eq!(game.state().current_round(), 4);
        assert!(game.state().history().is_empty());
        assert_eq!(sink.load(), crate::records::Records::default());
        assert_eq!(
            game.play_round(None, Seat::One, &mut sink),
            Err(Error::NotActive)
        );
    }

    #[test]
    fn test_scenario_c_no_challenge_for_player() {
        let mut game = started(Mode::PlayerVsPlayer, 3);
        let mut sink = MemorySink::new();
        assert_eq!(
            game.submit_challenge_answer(Seat::One, "a", &mut sink),
            Err(Error::NoChallengeForPlayer(Seat::One))
        );
    }

    #[test]
    fn test_wrong_player_cannot_answer() {
        let mut game = started(Mode::PlayerVsPlayer, 3);
        let mut sink = MemorySink::new();
        play(&mut game, &mut sink, Choice::Paper, Choice::Rock);

        assert_eq!(
            game.submit_challenge_answer(Seat::One, "a", &mut sink),
            Err(Error::NoChallengeForPlayer(Seat::One))
        );
        assert_eq!(
            game.current_challenge().map(|t| t.for_player),
            Some(Seat::Two)
        );
    }

    #[test]
    fn test_failed_challenge_rewards_opponent() {
        let mut game = started(Mode::PlayerVsPlayer, 3);
        let mut sink = MemorySink::new();
        play(&mut game, &mut sink, Choice::Scissors, Choice::Paper);

        let outcome = game
            .submit_challenge_answer(Seat::Two, "definitely wrong", &mut sink)
            .unwrap();

        assert!(!outcome.correct);
        assert_eq!(outcome.point_to, Some(Seat::One));
        assert!(outcome.message.contains(&outcome.solution));
        assert_eq!(game.state().player(Seat::One).score(), 2);
        assert_eq!(game.state().player(Seat::Two).score(), 0);
        assert!(!outcome.game_complete);
        assert_eq!(game.state().phase(), &Phase::Choosing);
        assert!(game.current_challenge().is_none());
    }

    #[test]
    fn test_play_blocked_while_challenge_pending() {
        let mut game = started(Mode::PlayerVsPlayer, 3);
        let mut sink = MemorySink::new();
        play(&mut game, &mut sink, Choice::Rock, Choice::Paper);

        assert_eq!(
            game.play_round(Some(Choice::Rock), Seat::Two, &mut sink),
            Err(Error::ChallengePending(Seat::One))
        );

        let solution = pending_solution(&game);
        game.submit_challenge_answer(Seat::One, &solution, &mut sink)
            .unwrap();
        assert!(
            game.play_round(Some(Choice::Rock), Seat::Two, &mut sink)
                .is_ok()
        );
    }

    #[test]
    fn test_round_counter_counts_resolved_rounds() {
        let mut game = started(Mode::PlayerVsPlayer, 5);
        let mut sink = MemorySink::new();

        for _ in 0..3 {
            let report = play(&mut game, &mut sink, Choice::Rock, Choice::Rock);
            assert_eq!(report.result, RoundResult::Draw);
            assert_eq!(report.message, "It's a DRAW!");
            assert_eq!(report.victory_message, "");
            assert!(!report.challenge_issued);
        }

        assert_eq!(game.state().current_round(), 4);
        assert_eq!(game.state().draws(), 3);
        assert!(!game.state().both_ready());
    }

    #[test]
    fn test_challenge_issued_only_for_human_losers() {
        let mut game = started(Mode::PlayerVsCpuEasy, 200);
        let mut sink = MemorySink::new();
        let mut human_losses = 0;
        let mut cpu_losses = 0;

        for _ in 0..60 {
            let PlayOutcome::Resolved(report) = game
                .play_round(Some(Choice::Rock), Seat::One, &mut sink)
                .unwrap()
            else {
                panic!("human versus cpu resolves in one call");
            };
            match report.result {
                RoundResult::Player2 => {
                    human_losses += 1;
                    assert!(report.challenge_issued);
                    assert_eq!(report.challenge_for, Some(Seat::One));
                    let solution = pending_solution(&game);
                    game.submit_challenge_answer(Seat::One, &solution, &mut sink)
                        .unwrap();
                }
                RoundResult::Player1 => {
                    cpu_losses += 1;
                    assert!(!report.challenge_issued);
                }
                RoundResult::Draw => assert!(!report.challenge_issued),
            }
        }

        assert!(human_losses > 0);
        assert!(cpu_losses > 0);
        assert_eq!(game.state().history().len(), 60);
    }

    #[test]
    fn test_final_round_without_challenge_completes() {
        let mut game = started(Mode::PlayerVsPlayer, 1);
        let mut sink = MemorySink::new();

        let report = play(&mut game, &mut sink, Choice::Paper, Choice::Paper);

        assert!(report.game_complete);
        assert!(!report.game_state.game_active);
        let completion = report.completion.unwrap();
        assert_eq!(completion.standing, Standing::Tie);
        assert_eq!(completion.message, "🏅 The game ended in a TIE!");

        let records = sink.load();
        let pvp = records.get("player_vs_player");
        assert_eq!(pvp.len(), 1);
        assert!(pvp[0].get("winner").is_none());
        assert_eq!(pvp[0]["scores"], json!([0, 0]));
    }

    #[test]
    fn test_deferred_finalization_after_failed_challenge() {
        let mut game = started(Mode::PlayerVsPlayer, 1);
        let mut sink = MemorySink::new();
        play(&mut game, &mut sink, Choice::Rock, Choice::Scissors);

        let outcome = game
            .submit_challenge_answer(Seat::Two, "?", &mut sink)
            .unwrap();

        assert!(outcome.game_complete);
        assert_eq!(outcome.game_state.player1.score, 2);
        assert_eq!(
            outcome.completion.unwrap().message,
            "🎊 Ann is the CHAMPION! 🎊"
        );
        assert_eq!(sink.load().get("player_vs_player").len(), 1);
    }

    #[test]
    fn test_cpu_matches_write_no_records() {
        let mut game = started(Mode::PlayerVsCpuHard, 1);
        let mut sink = MemorySink::new();

        game.play_round(Some(Choice::Rock), Seat::One, &mut sink)
            .unwrap();
        if let Some((seat, challenge)) = game.state().pending_challenge() {
            let solution = challenge.solution();
            game.submit_challenge_answer(seat, &solution, &mut sink)
                .unwrap();
        }

        assert!(!game.is_active());
        assert_eq!(sink.load(), crate::records::Records::default());
    }

    #[test]
    fn test_current_challenge_hides_answer() {
        let mut game = started(Mode::PlayerVsPlayer, 3);
        let mut sink = MemorySink::new();
        assert!(game.current_challenge().is_none());

        play(&mut game, &mut sink, Choice::Rock, Choice::Paper);
        let ticket = game.current_challenge().unwrap();
        assert_eq!(ticket.for_player, Seat::One);

        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["for_player"], 1);
        assert!(json["challenge"].get("correct_letter").is_none());
        assert!(json["challenge"].get("secret_word").is_none());

        let state = serde_json::to_value(game.game_state()).unwrap();
        assert_eq!(state["challenge_pending"], true);
        assert_eq!(state["challenge_for"], 1);
        assert!(state.get("challenge").is_none());
    }

    #[test]
    fn test_history_records_only_humans() {
        let mut game = started(Mode::PlayerVsPlayer, 5);
        let mut sink = MemorySink::new();
        play(&mut game, &mut sink, Choice::Rock, Choice::Rock);
        play(&mut game, &mut sink, Choice::Paper, Choice::Paper);

        assert_eq!(
            game.state().history(),
            &[Choice::Rock, Choice::Rock, Choice::Paper, Choice::Paper]
        );
        let stats = game.game_state().history;
        assert_eq!(stats.total, 4);
        assert_eq!(stats.counts[Choice::Paper], 2);
        assert_eq!(stats.most_common, Some(Choice::Rock));
    }

    #[test]
    fn test_unknown_mode_falls_back() {
        let mut game = Match::with_seed(5);
        let view = game.start(setup(Mode::Unknown, 2));
        assert!(view.player1.is_human);
        assert!(!view.player2.is_human);

        let mut sink = MemorySink::new();
        let outcome = game
            .play_round(Some(Choice::Rock), Seat::One, &mut sink)
            .unwrap();
        assert!(matches!(outcome, PlayOutcome::Resolved(_)));
    }

    #[test]
    fn test_start_discards_previous_match() {
        let mut game = started(Mode::PlayerVsPlayer, 3);
        let mut sink = MemorySink::new();
        play(&mut game, &mut sink, Choice::Rock, Choice::Paper);
        let first_id = game.state().id();

        game.start(setup(Mode::PlayerVsPlayer, 3));

        assert_ne!(game.state().id(), first_id);
        assert!(game.current_challenge().is_none());
        assert_eq!(game.state().player(Seat::Two).score(), 0);
        assert!(game.state().history().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut game = started(Mode::PlayerVsPlayer, 3);
        game.reset();
        assert!(!game.is_active());
        assert_eq!(game.state().phase(), &Phase::Inactive);
    }

    #[test]
    fn test_coerce_max_rounds() {
        assert_eq!(coerce_max_rounds(Some(&json!(7))), 7);
        assert_eq!(coerce_max_rounds(Some(&json!(3.9))), 3);
        assert_eq!(coerce_max_rounds(Some(&json!(" 4 "))), 4);
        assert_eq!(coerce_max_rounds(Some(&json!(0))), DEFAULT_MAX_ROUNDS);
        assert_eq!(coerce_max_rounds(Some(&json!(-2))), DEFAULT_MAX_ROUNDS);
        assert_eq!(coerce_max_rounds(Some(&json!(0.5))), DEFAULT_MAX_ROUNDS);
        assert_eq!(coerce_max_rounds(Some(&json!("many"))), DEFAULT_MAX_ROUNDS);
        assert_eq!(coerce_max_rounds(Some(&json!(null))), DEFAULT_MAX_ROUNDS);
        assert_eq!(coerce_max_rounds(None), DEFAULT_MAX_ROUNDS);
    }
}
