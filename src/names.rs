//! Player name sanitising
//!
//! Names arrive straight from clients. Starting a match never fails on a
//! bad name, so instead of rejecting input this module trims it, caps its
//! length, censors inappropriate content and falls back to a seat default.

use rustrict::CensorStr;

use crate::constants::names::MAX_LENGTH;

/// Cleans a requested player name
///
/// # Arguments
///
/// * `requested` - The name supplied by the client, if any
/// * `fallback` - The name to use when nothing usable was supplied
///
/// # Returns
///
/// A trimmed, censored name of at most `MAX_LENGTH` characters
pub fn sanitize(requested: Option<&str>, fallback: &str) -> String {
    let trimmed = rustrict::trim_whitespace(requested.unwrap_or_default());
    if trimmed.is_empty() {
        return fallback.to_string();
    }
    let capped: String = trimmed.chars().take(MAX_LENGTH).collect();
    let censored = capped.trim().censor();
    if censored.is_empty() {
        fallback.to_string()
    } else {
        censored
    }
}
