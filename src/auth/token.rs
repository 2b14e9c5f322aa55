//! Session tokens
//!
//! Opaque mock tokens of the form `<prefix>_token_<unix millis>_<random>`.

use jiff::Timestamp;
use rand::{Rng, distributions::Alphanumeric};

/// Length of the random token suffix.
pub const TOKEN_SUFFIX_LEN: usize = 9;

/// Tokens this short or shorter are rejected on restore.
pub const MIN_TOKEN_LEN: usize = 10;

/// Token issued by an email login or signup.
pub fn issue(now: Timestamp) -> String {
    format!("token_{}_{}", now.as_millisecond(), random_suffix())
}

/// Token issued by a social login; the provider id prefixes the token.
pub fn issue_for_provider(provider: &str, now: Timestamp) -> String {
    format!("{provider}_{}", issue(now))
}

/// Token issued by a refresh.
pub fn issue_refreshed(now: Timestamp) -> String {
    format!("refreshed_{}", issue(now))
}

/// Whether a stored token is worth restoring a session for.
pub fn is_plausible_token(token: &str) -> bool {
    token.len() > MIN_TOKEN_LEN
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_SUFFIX_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect()
}
