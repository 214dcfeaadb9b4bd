//! Hand choices and round resolution
//!
//! This module defines the three hands a slot can throw, the fixed
//! beats-table that decides a round, and the display text shown to
//! clients once a round's choices are revealed.

use std::{fmt::Display, str::FromStr};

use enum_map::Enum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A hand thrown by a slot in a single round
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    /// Beats scissors
    Rock,
    /// Beats rock
    Paper,
    /// Beats paper
    Scissors,
}

/// Error returned when a string does not name a [`Choice`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown choice `{0}`, expected rock, paper or scissors")]
pub struct ParseChoiceError(String);

impl Choice {
    /// Every choice, in ordinal order
    pub const ALL: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissors];

    /// Whether this choice wins against `other`
    pub fn beats(self, other: Choice) -> bool {
        matches!(
            (self, other),
            (Choice::Rock, Choice::Scissors)
                | (Choice::Scissors, Choice::Paper)
                | (Choice::Paper, Choice::Rock)
        )
    }

    /// The choice that beats this one
    pub fn counter(self) -> Choice {
        match self {
            Choice::Rock => Choice::Paper,
            Choice::Paper => Choice::Scissors,
            Choice::Scissors => Choice::Rock,
        }
    }

    /// Picks a choice uniformly at random
    pub fn random(rng: &mut fastrand::Rng) -> Choice {
        Self::ALL[rng.usize(..Self::ALL.len())]
    }

    /// Icon shown when the choice is revealed
    pub fn emoji(self) -> &'static str {
        match self {
            Choice::Rock => "🪨",
            Choice::Paper => "📄",
            Choice::Scissors => "✂️",
        }
    }

    /// Upper-case label shown when the choice is revealed
    pub fn text(self) -> String {
        self.to_string().to_uppercase()
    }
}

impl Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Choice::Rock => "rock",
            Choice::Paper => "paper",
            Choice::Scissors => "scissors",
        })
    }
}

impl FromStr for Choice {
    type Err = ParseChoiceError;

    /// Parses a choice, ignoring case and surrounding whitespace
    ///
    /// # Errors
    ///
    /// Returns a `ParseChoiceError` if the string is not one of the three hands.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rock" => Ok(Choice::Rock),
            "paper" => Ok(Choice::Paper),
            "scissors" => Ok(Choice::Scissors),
            _ => Err(ParseChoiceError(s.to_string())),
        }
    }
}

/// Outcome of a single round from the match's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundResult {
    /// The first seat won the round
    #[serde(rename = "player1")]
    Player1,
    /// The second seat won the round
    #[serde(rename = "player2")]
    Player2,
    /// Both seats threw the same hand
    #[serde(rename = "draw")]
    Draw,
}

/// Resolves a round against the fixed beats-table
///
/// Exactly one of the three results holds for every pair of choices.
pub fn resolve(first: Choice, second: Choice) -> RoundResult {
    if first == second {
        RoundResult::Draw
    } else if first.beats(second) {
        RoundResult::Player1
    } else {
        RoundResult::Player2
    }
}

/// Flavour line describing how `winner` defeated `loser`
///
/// Returns an empty string when `winner` does not beat `loser`.
pub fn victory_message(winner: Choice, loser: Choice) -> &'static str {
    match (winner, loser) {
        (Choice::Rock, Choice::Scissors) => "Rock crushes Scissors! 💥",
        (Choice::Scissors, Choice::Paper) => "Scissors cut Paper! ✂️📄",
        (Choice::Paper, Choice::Rock) => "Paper covers Rock! 📄🪨",
        _ => "",
    }
}
