//! Tolerant decoding of generated JSON.
//!
//! Generated text is untrusted. It may be wrapped in markdown fences, carry
//! extra prose, or not be JSON at all. Callers get a [`Decoded`] outcome and
//! pick their own named fallback instead of handling an error.

use serde::de::DeserializeOwned;

/// Outcome of decoding generated text into `T`.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Parsed(T),
    Fallback { reason: String },
}

impl<T> Decoded<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Decoded::Fallback { .. })
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Decoded<U> {
        match self {
            Decoded::Parsed(value) => Decoded::Parsed(f(value)),
            Decoded::Fallback { reason } => Decoded::Fallback { reason },
        }
    }

    /// Keep a parsed value only if `check` accepts it.
    pub fn and_then<U, F>(self, check: F) -> Decoded<U>
    where
        F: FnOnce(T) -> std::result::Result<U, String>,
    {
        match self {
            Decoded::Parsed(value) => match check(value) {
                Ok(v) => Decoded::Parsed(v),
                Err(reason) => Decoded::Fallback { reason },
            },
            Decoded::Fallback { reason } => Decoded::Fallback { reason },
        }
    }

    pub fn unwrap_or_else<F: FnOnce(&str) -> T>(self, fallback: F) -> T {
        match self {
            Decoded::Parsed(value) => value,
            Decoded::Fallback { reason } => fallback(&reason),
        }
    }
}

/// Remove markdown code fence markers (```` ```json ```` and ```` ``` ````).
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Decode generated text as JSON after stripping code fences.
pub fn decode_json<T: DeserializeOwned>(raw: &str) -> Decoded<T> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str(&cleaned) {
        Ok(value) => Decoded::Parsed(value),
        Err(e) => Decoded::Fallback {
            reason: format!("invalid JSON ({}): {}", e, preview(&cleaned)),
        },
    }
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 80;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
