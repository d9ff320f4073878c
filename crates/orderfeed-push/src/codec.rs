//! Compact key encoding.
//!
//! Keys travel as URL-safe base64 without padding. Decoding restores the
//! padding and the standard alphabet before decoding, so keys copied from
//! either alphabet decode the same way.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

use orderfeed_core::error::{AppError, ErrorKind};
use orderfeed_core::result::AppResult;

/// Decode a compact key into raw bytes.
pub fn decode_key(compact: &str) -> AppResult<Vec<u8>> {
    let trimmed = compact.trim();
    let padding = (4 - trimmed.len() % 4) % 4;

    let mut standard = String::with_capacity(trimmed.len() + padding);
    for c in trimmed.chars() {
        standard.push(match c {
            '-' => '+',
            '_' => '/',
            other => other,
        });
    }
    standard.extend(std::iter::repeat_n('=', padding));

    STANDARD.decode(standard.as_bytes()).map_err(|e| {
        AppError::with_source(ErrorKind::Format, "Malformed key encoding", e)
    })
}

/// Encode raw key bytes in the compact form.
pub fn encode_key(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}
