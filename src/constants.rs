//! Configuration constants for the match engine
//!
//! This module contains the defaults and limits used throughout the crate
//! so that round handling, CPU behaviour, name sanitising, challenge content,
//! and record persistence share one set of boundaries.

/// Round configuration constants
pub mod rounds {
    /// Number of rounds used when the requested count is missing or not positive
    pub const DEFAULT_MAX_ROUNDS: u32 = 5;
    /// Round number every match starts on
    pub const FIRST_ROUND: u32 = 1;
}

/// CPU opponent configuration constants
pub mod cpu {
    /// Minimum number of recorded human moves before the hard policy adapts
    pub const MIN_HISTORY: usize = 3;
    /// Number of most recent human moves inspected by the hard policy
    pub const HISTORY_WINDOW: usize = 5;
    /// Probability that the hard policy plays the counter to the most common move
    pub const COUNTER_PROBABILITY: f64 = 0.7;
}

/// Player name configuration constants
pub mod names {
    /// Maximum length of a player name in characters
    pub const MAX_LENGTH: usize = 30;
    /// Name given to the first seat when none is supplied
    pub const DEFAULT_PLAYER1_NAME: &str = "Player 1";
    /// Name given to the second seat when none is supplied
    pub const DEFAULT_PLAYER2_NAME: &str = "CPU";
}

/// Challenge configuration constants
pub mod challenge {
    /// Number of lettered options on a quiz question
    pub const OPTION_COUNT: usize = 4;
    /// Maximum length of any question, option, clue, hint or word
    pub const MAX_TEXT_LENGTH: usize = 200;
}

/// Record store configuration constants
pub mod records {
    /// File the JSON record sink uses when no path is configured
    pub const DEFAULT_FILE: &str = "game_records.json";
}
