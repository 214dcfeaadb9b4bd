//! Question bank backing the challenge provider
//!
//! The bank holds the two read-only challenge collections. A built-in
//! bank ships with the crate; hosts may load their own from JSON, which
//! is validated before use so that every drawn challenge is gradable.

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{quiz::QuizItem, word_guess::WordItem};

/// Errors that can occur while loading a custom question bank
#[derive(Error, Debug)]
pub enum Error {
    /// The JSON could not be parsed into a bank
    #[error("malformed question bank: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The bank parsed but failed validation
    #[error("invalid question bank: {0}")]
    Invalid(#[from] garde::Report),
}

/// The two challenge collections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuestionBank {
    /// Multiple choice quiz items
    #[garde(length(min = 1), dive)]
    quiz: Vec<QuizItem>,
    /// Word-guess items
    #[garde(length(min = 1), dive)]
    word_guess: Vec<WordItem>,
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::builtin()
    }
}

impl QuestionBank {
    /// The bank that ships with the crate
    pub fn builtin() -> Self {
        Self {
            quiz: QUIZ
                .iter()
                .map(|(question, options, correct)| QuizItem {
                    question: (*question).to_string(),
                    options: options.iter().map(ToString::to_string).collect_vec(),
                    correct_answer: (*correct).to_string(),
                })
                .collect_vec(),
            word_guess: WORDS
                .iter()
                .map(|(clue, hint, word)| WordItem {
                    clue: (*clue).to_string(),
                    hint: (*hint).to_string(),
                    word: (*word).to_string(),
                })
                .collect_vec(),
        }
    }

    /// Builds a validated bank from item lists
    ///
    /// # Errors
    ///
    /// Returns `Error::Invalid` if either list is empty or an item fails validation.
    pub fn new(quiz: Vec<QuizItem>, word_guess: Vec<WordItem>) -> Result<Self, Error> {
        let bank = Self { quiz, word_guess };
        bank.validate()?;
        Ok(bank)
    }

    /// Parses and validates a bank from JSON
    ///
    /// The expected shape is `{"quiz": [...], "word_guess": [...]}`.
    ///
    /// # Errors
    ///
    /// * `Error::Malformed` - The JSON does not describe a bank
    /// * `Error::Invalid` - The bank failed validation
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let bank: Self = serde_json::from_str(json)?;
        bank.validate()?;
        Ok(bank)
    }

    /// Quiz items
    pub fn quiz(&self) -> &[QuizItem] {
        &self.quiz
    }

    /// Word-guess items
    pub fn word_guess(&self) -> &[WordItem] {
        &self.word_guess
    }
}

const QUIZ: [(&str, [&str; 4], &str); 25] = [
    (
        "What is the past tense of 'go'?",
        ["a) went", "b) goied", "c) going", "d) goes"],
        "a",
    ),
    (
        "Which word means 'muy bien' in English?",
        ["a) very bad", "b) very good", "c) very small", "d) very big"],
        "b",
    ),
    (
        "Complete: I ___ to the park every day.",
        ["a) go", "b) goes", "c) going", "d) went"],
        "a",
    ),
    (
        "What is the plural of 'child'?",
        ["a) childs", "b) children", "c) childes", "d) childen"],
        "b",
    ),
    (
        "Which sentence is correct?",
        ["a) She don't like pizza", "b) She doesn't like pizza", "c) She not like pizza", "d) She doesn't likes pizza"],
        "b",
    ),
    (
        "What is the opposite of 'expensive'?",
        ["a) cheap", "b) rich", "c) valuable", "d) costly"],
        "a",
    ),
    (
        "Complete: There ___ many books on the table.",
        ["a) is", "b) are", "c) be", "d) am"],
        "b",
    ),
    (
        "Which word is a vegetable?",
        ["a) apple", "b) carrot", "c) banana", "d) orange"],
        "b",
    ),
    (
        "What is the past tense of 'eat'?",
        ["a) eated", "b) ate", "c) eaten", "d) eating"],
        "b",
    ),
    (
        "Which is the correct greeting for morning?",
        ["a) Good night", "b) Good afternoon", "c) Good evening", "d) Good morning"],
        "d",
    ),
    (
        "What is the English word for 'biblioteca'?",
        ["a) bookcase", "b) bookstore", "c) library", "d) librarian"],
        "c",
    ),
    (
        "Complete: My brother ___ 25 years old.",
        ["a) have", "b) has", "c) is", "d) are"],
        "c",
    ),
    (
        "Which word means 'feliz' in English?",
        ["a) sad", "b) angry", "c) happy", "d) tired"],
        "c",
    ),
    (
        "What is the capital of England?",
        ["a) Paris", "b) London", "c) New York", "d) Madrid"],
        "b",
    ),
    (
        "Which is the correct question form?",
        ["a) Where you live?", "b) Where do you live?", "c) Where does you live?", "d) Where are you live?"],
        "b",
    ),
    (
        "What is the English word for 'jugar'?",
        ["a) play", "b) work", "c) run", "d) jump"],
        "a",
    ),
    (
        "Complete: I can ___ very fast.",
        ["a) run", "b) running", "c) ran", "d) runs"],
        "a",
    ),
    (
        "Which word is a color?",
        ["a) big", "b) red", "c) happy", "d) fast"],
        "b",
    ),
    (
        "What is the opposite of 'hot'?",
        ["a) warm", "b) cold", "c) cool", "d) freezing"],
        "b",
    ),
    (
        "Which sentence is in future tense?",
        ["a) I go to school", "b) I went to school", "c) I will go to school", "d) I am going to school"],
        "c",
    ),
    (
        "What is the English word for 'familia'?",
        ["a) familiar", "b) family", "c) familiar", "d) famility"],
        "b",
    ),
    (
        "Complete: She ___ to music right now.",
        ["a) listen", "b) listens", "c) is listening", "d) are listening"],
        "c",
    ),
    (
        "Which word is an animal?",
        ["a) tree", "b) river", "c) dog", "d) mountain"],
        "c",
    ),
    (
        "What is the past tense of 'see'?",
        ["a) saw", "b) seen", "c) seeed", "d) seeing"],
        "a",
    ),
    (
        "Which is the correct way to say 'adiós'?",
        ["a) Hello", "b) Goodbye", "c) Please", "d) Thank you"],
        "b",
    ),
];

const WORDS: [(&str, &str, &str); 20] = [
    ("It's an animal that says 'meow'", "Starts with 'c'", "cat"),
    ("You use it to write on paper", "Starts with 'p'", "pencil"),
    ("The color of the sky", "Starts with 'b'", "blue"),
    ("You sit on it", "Starts with 'c'", "chair"),
    ("You drink water from it", "Starts with 'g'", "glass"),
    ("It tells you the time", "Starts with 'c'", "clock"),
    ("You use it to open doors", "Starts with 'k'", "key"),
    ("You read it", "Starts with 'b'", "book"),
    ("You wear it on your wrist to tell time", "Starts with 'w'", "watch"),
    ("A large gray animal with a trunk", "Starts with 'e'", "elephant"),
    ("The season with snow", "Starts with 'w'", "winter"),
    ("The opposite of 'day'", "Starts with 'n'", "night"),
    ("You use it to cut paper", "Starts with 's'", "scissors"),
    ("A place where you buy food", "Starts with 's'", "supermarket"),
    ("The meal you eat in the morning", "Starts with 'b'", "breakfast"),
    ("A person who teaches students", "Starts with 't'", "teacher"),
    ("You use it when it's raining", "Starts with 'u'", "umbrella"),
    ("The planet we live on", "Starts with 'e'", "earth"),
    ("A sweet red fruit", "Starts with 's'", "strawberry"),
    ("You sleep on it", "Starts with 'b'", "bed"),
];

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_bank_is_valid() {
        let bank = QuestionBank::builtin();
        assert!(bank.validate().is_ok());
        assert_eq!(bank.quiz().len(), 25);
        assert_eq!(bank.word_guess().len(), 20);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "quiz": [{"question": "2 + 2?", "options": ["a) 3", "b) 4"], "correct_answer": "b"}],
            "word_guess": [{"clue": "Opposite of cold", "hint": "h", "word": "hot"}]
        }"#;
        let bank = QuestionBank::from_json(json).unwrap();
        assert_eq!(bank.quiz()[0].correct_answer, "b");
        assert_eq!(bank.word_guess()[0].word, "hot");
    }

    #[test]
    fn test_from_json_rejects_empty_category() {
        let json = r#"{"quiz": [], "word_guess": [{"clue": "c", "hint": "", "word": "w"}]}"#;
        assert!(matches!(
            QuestionBank::from_json(json),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_bad_letter() {
        let json = r#"{
            "quiz": [{"question": "q", "options": ["a) x"], "correct_answer": "z"}],
            "word_guess": [{"clue": "c", "hint": "", "word": "w"}]
        }"#;
        assert!(matches!(
            QuestionBank::from_json(json),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            QuestionBank::from_json("{not json"),
            Err(Error::Malformed(_))
        ));
    }
}
