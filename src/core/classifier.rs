//! Key classification.

use crate::collector::types::KeyType;

/// Classify a key symbol.
///
/// Rules, first match wins:
/// 1. a single Latin letter is `Alpha`
/// 2. a single decimal digit is `Numeric`
/// 3. anything longer than one character is a named `Command` key
/// 4. everything else (punctuation, space, empty) is `Special`
///
/// The physical `code` does not take part in classification.
pub fn classify(key: &str, _code: &str) -> KeyType {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => KeyType::Alpha,
        (Some(c), None) if c.is_ascii_digit() => KeyType::Numeric,
        (Some(_), Some(_)) => KeyType::Command,
        _ => KeyType::Special,
    }
}
