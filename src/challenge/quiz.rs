//! Multiple choice quiz challenges
//!
//! Quiz items are stored as a question, up to four raw option strings and
//! the letter of the correct option. When a quiz is drawn the options are
//! normalised into a letter-keyed map and the correct letter is kept
//! server-side for grading.

use enum_map::{Enum, EnumMap};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::constants::challenge::{MAX_TEXT_LENGTH, OPTION_COUNT};

use super::clean_answer;

type ValidationResult = garde::Result;

/// Letter labelling one of the four quiz options
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionLetter {
    /// First option
    A,
    /// Second option
    B,
    /// Third option
    C,
    /// Fourth option
    D,
}

impl OptionLetter {
    /// All letters in display order
    pub const ALL: [OptionLetter; OPTION_COUNT] = [
        OptionLetter::A,
        OptionLetter::B,
        OptionLetter::C,
        OptionLetter::D,
    ];

    /// The lower-case letter
    pub fn as_char(self) -> char {
        match self {
            OptionLetter::A => 'a',
            OptionLetter::B => 'b',
            OptionLetter::C => 'c',
            OptionLetter::D => 'd',
        }
    }

    /// Parses a letter, ignoring case and surrounding whitespace
    pub fn parse(raw: &str) -> Option<OptionLetter> {
        let cleaned = clean_answer(raw);
        Self::ALL
            .into_iter()
            .find(|letter| cleaned.len() == 1 && cleaned.starts_with(letter.as_char()))
    }
}

/// Validates that the stored correct answer names one of the option letters
fn validate_letter(value: &str) -> ValidationResult {
    if OptionLetter::parse(value).is_some() {
        Ok(())
    } else {
        Err(garde::Error::new("correct answer must be one of a, b, c or d"))
    }
}

/// A quiz entry as it is stored in the question bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuizItem {
    /// What is being asked
    #[garde(length(chars, min = 1, max = MAX_TEXT_LENGTH))]
    pub question: String,
    /// Raw options, optionally prefixed with `"a) "` style labels
    #[garde(length(min = 1, max = OPTION_COUNT), inner(length(chars, max = MAX_TEXT_LENGTH)))]
    pub options: Vec<String>,
    /// Letter of the correct option
    #[garde(custom(|v, _| validate_letter(v)))]
    pub correct_answer: String,
}

/// Strips a leading `"<letter>) "` label from a raw option
fn normalize_option(raw: &str) -> String {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), Some(')')) if letter.is_ascii_alphabetic() => {
            chars.as_str().trim().to_string()
        }
        _ => raw.trim().to_string(),
    }
}

/// A drawn quiz question, including its correct letter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    question: String,
    options: EnumMap<OptionLetter, String>,
    correct_letter: OptionLetter,
}

/// A quiz question as shown to the challenged player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    /// What is being asked
    pub question: String,
    /// Option text keyed by letter
    pub options: EnumMap<OptionLetter, String>,
}

impl Question {
    /// Builds a playable question from a bank entry
    ///
    /// Returns `None` if the entry's correct letter is not one of a–d.
    pub fn from_item(item: &QuizItem) -> Option<Self> {
        let correct_letter = OptionLetter::parse(&item.correct_answer)?;
        let options = EnumMap::from_fn(|letter: OptionLetter| {
            item.options
                .get(letter.into_usize())
                .map(|raw| normalize_option(raw))
                .unwrap_or_default()
        });
        Some(Self {
            question: item.question.clone(),
            options,
            correct_letter,
        })
    }

    /// The letter that answers this question
    pub fn correct_letter(&self) -> OptionLetter {
        self.correct_letter
    }

    /// The question with its correct letter removed
    pub fn view(&self) -> QuestionView {
        QuestionView {
            question: self.question.clone(),
            options: self.options.clone(),
        }
    }

    /// Whether `answer` names the correct letter
    pub fn is_correct(&self, answer: &str) -> bool {
        clean_answer(answer) == self.correct_letter.as_char().to_string()
    }
}
