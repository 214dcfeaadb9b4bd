//! Challenge mini-games
//!
//! A human who loses a round must answer a challenge before the match may
//! continue. This module contains the two challenge kinds (a lettered quiz
//! and a word guess), the answer-free views sent to clients, and the
//! [`ChallengeProvider`] that draws challenges from a [`QuestionBank`] and
//! grades submitted answers.

pub mod bank;
pub mod quiz;
pub mod word_guess;

use serde::{Deserialize, Serialize};

pub use bank::QuestionBank;

/// Normalizes an answer for comparison (trimmed and lowercased)
pub(crate) fn clean_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// The kind of challenge without its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    /// Lettered multiple choice question
    Quiz,
    /// Clue-and-hint word guess
    WordGuess,
}

/// A live challenge, including the value needed to grade it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Challenge {
    /// Multiple choice quiz question
    Quiz(quiz::Question),
    /// Word-guess puzzle
    WordGuess(word_guess::Puzzle),
}

/// A challenge with its answer stripped, safe to send to the challenged player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChallengeView {
    /// Multiple choice quiz question
    Quiz(quiz::QuestionView),
    /// Word-guess puzzle
    WordGuess(word_guess::PuzzleView),
}

impl Challenge {
    /// The kind of this challenge
    pub fn kind(&self) -> ChallengeKind {
        match self {
            Challenge::Quiz(_) => ChallengeKind::Quiz,
            Challenge::WordGuess(_) => ChallengeKind::WordGuess,
        }
    }

    /// The challenge without its answer
    pub fn view(&self) -> ChallengeView {
        match self {
            Challenge::Quiz(question) => ChallengeView::Quiz(question.view()),
            Challenge::WordGuess(puzzle) => ChallengeView::WordGuess(puzzle.view()),
        }
    }

    /// The accepted answer: the correct letter for a quiz, the secret word for a word guess
    pub fn solution(&self) -> String {
        match self {
            Challenge::Quiz(question) => question.correct_letter().as_char().to_string(),
            Challenge::WordGuess(puzzle) => puzzle.secret_word().to_string(),
        }
    }

    /// Whether `answer` solves the challenge, ignoring case and surrounding whitespace
    pub fn is_correct(&self, answer: &str) -> bool {
        match self {
            Challenge::Quiz(question) => question.is_correct(answer),
            Challenge::WordGuess(puzzle) => puzzle.is_correct(answer),
        }
    }
}

/// Draws challenges from a question bank and grades answers
#[derive(Debug, Clone, Default)]
pub struct ChallengeProvider {
    bank: QuestionBank,
}

impl ChallengeProvider {
    /// Creates a provider over the given bank
    pub fn new(bank: QuestionBank) -> Self {
        Self { bank }
    }

    /// The bank challenges are drawn from
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Draws a challenge: a uniform pick of category, then a uniform pick within it
    ///
    /// Returns `None` only if the chosen category has no usable item, which a
    /// validated bank rules out.
    pub fn draw(&self, rng: &mut fastrand::Rng) -> Option<Challenge> {
        if rng.bool() {
            let item = rng.choice(self.bank.quiz())?;
            quiz::Question::from_item(item).map(Challenge::Quiz)
        } else {
            let item = rng.choice(self.bank.word_guess())?;
            Some(Challenge::WordGuess(item.into()))
        }
    }

    /// Grades an answer against a challenge
    ///
    /// A missing challenge never grades as correct.
    pub fn grade(challenge: Option<&Challenge>, answer: &str) -> bool {
        challenge.is_some_and(|challenge| challenge.is_correct(answer))
    }
}
