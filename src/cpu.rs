//! CPU opponent policy
//!
//! A CPU-controlled slot picks its hand through a [`CpuPolicy`]. The easy
//! policy throws uniformly at random. The hard policy watches the most
//! recent human moves and, most of the time, throws the counter to the
//! move the human favours.

use std::cmp::Reverse;

use enum_map::EnumMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    choice::Choice,
    constants::cpu::{COUNTER_PROBABILITY, HISTORY_WINDOW, MIN_HISTORY},
};

/// How hard the CPU tries to beat the human
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Uniformly random picks
    #[default]
    Easy,
    /// Counters the human's most frequent recent move
    Hard,
}

/// Picks hands for CPU-controlled slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuPolicy {
    difficulty: Difficulty,
}

impl CpuPolicy {
    /// Creates a policy for the given difficulty
    pub fn new(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }

    /// The difficulty this policy plays at
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Chooses a hand given the human move history (oldest first)
    pub fn choose(&self, history: &[Choice], rng: &mut fastrand::Rng) -> Choice {
        let pick = match self.difficulty {
            Difficulty::Easy => Choice::random(rng),
            Difficulty::Hard => Self::adaptive(history, rng),
        };
        debug!(difficulty = ?self.difficulty, %pick, "CPU pick");
        pick
    }

    fn adaptive(history: &[Choice], rng: &mut fastrand::Rng) -> Choice {
        if history.len() >= MIN_HISTORY {
            let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
            if let Some(favourite) = most_frequent(recent) {
                if rng.f64() < COUNTER_PROBABILITY {
                    return favourite.counter();
                }
            }
        }
        Choice::random(rng)
    }
}

/// Most frequent choice in `moves`, ties going to the lowest ordinal
///
/// Returns `None` for an empty slice.
pub fn most_frequent(moves: &[Choice]) -> Option<Choice> {
    if moves.is_empty() {
        return None;
    }
    let mut counts: EnumMap<Choice, usize> = EnumMap::default();
    for choice in moves {
        counts[*choice] += 1;
    }
    Choice::ALL
        .into_iter()
        .max_by_key(|choice| (counts[*choice], Reverse(*choice)))
}
