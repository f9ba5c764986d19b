//! Destination naming helpers.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Prefix of compact destination names; names must start with a letter.
pub const COMPACT_NAME_PREFIX: &str = "ANX";

/// Map a stream name to a destination name (`.` becomes `_`).
pub fn stream_to_destination(stream: &str) -> String {
    stream.replace('.', "_")
}

/// 32-bit string hash over UTF-16 code units (`h = 31 * h + c`, wrapping).
///
/// Matches the hash other components of the platform use for table names,
/// so compact names agree across implementations.
pub fn destination_hash(name: &str) -> i32 {
    name.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Short, identifier-safe name for a destination.
///
/// `"ANX"` followed by the base64 of the big-endian [`destination_hash`],
/// with `=`, `+` and `/` replaced by `_`. The result is always 11 ASCII
/// characters, which fits the tightest RDBMS identifier limits.
/// Distinct names can collide; the probability is low but not zero.
pub fn compact_destination_name(name: &str) -> String {
    let encoded = BASE64.encode(destination_hash(name).to_be_bytes());
    let safe: String = encoded
        .chars()
        .map(|c| match c {
            '=' | '+' | '/' => '_',
            other => other,
        })
        .collect();
    format!("{}{}", COMPACT_NAME_PREFIX, safe)
}
