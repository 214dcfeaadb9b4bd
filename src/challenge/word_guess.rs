//! Word-guess challenges
//!
//! The challenged player is shown a clue and a hint and must type the
//! secret word.

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::constants::challenge::MAX_TEXT_LENGTH;

use super::clean_answer;

/// A word-guess entry as it is stored in the question bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct WordItem {
    /// Description of the word
    #[garde(length(chars, min = 1, max = MAX_TEXT_LENGTH))]
    pub clue: String,
    /// Extra help, usually the first letter
    #[garde(length(chars, max = MAX_TEXT_LENGTH))]
    pub hint: String,
    /// The word to guess
    #[garde(length(chars, min = 1, max = MAX_TEXT_LENGTH))]
    pub word: String,
}

/// A drawn word-guess puzzle, including its secret word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    clue: String,
    hint: String,
    secret_word: String,
}

/// A puzzle as shown to the challenged player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PuzzleView {
    /// Description of the word
    pub clue: String,
    /// Extra help
    pub hint: String,
}

impl From<&WordItem> for Puzzle {
    fn from(item: &WordItem) -> Self {
        Self {
            clue: item.clue.clone(),
            hint: item.hint.clone(),
            secret_word: item.word.trim().to_string(),
        }
    }
}

impl Puzzle {
    /// The word that solves the puzzle
    pub fn secret_word(&self) -> &str {
        &self.secret_word
    }

    /// The puzzle with its secret word removed
    pub fn view(&self) -> PuzzleView {
        PuzzleView {
            clue: self.clue.clone(),
            hint: self.hint.clone(),
        }
    }

    /// Whether `answer` is the secret word, ignoring case and surrounding whitespace
    pub fn is_correct(&self, answer: &str) -> bool {
        clean_answer(answer) == clean_answer(&self.secret_word)
    }
}
