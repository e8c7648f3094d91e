//! RFC 4648 Base32 projection of shared secrets.
//!
//! Secrets travel as Base32 text in key URIs and on screen, and as raw
//! bytes when they key the HMAC. The text side is lenient about case and
//! display grouping but strict about the alphabet and padding structure.

use data_encoding::BASE32;

use crate::error::{Error, Result};

/// Width of a display block produced by [`format_secret`].
const GROUP_WIDTH: usize = 4;

/// Encode raw bytes as padded, uppercase Base32.
pub fn encode(bytes: &[u8]) -> String {
    BASE32.encode(bytes)
}

/// Decode Base32 text back into raw bytes.
///
/// Whitespace is ignored and lowercase is accepted. Text without any `=` is
/// padded to a full block first, so secrets copied out of a key URI decode
/// as-is. Text that already carries padding must carry the right amount.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let mut s = canonicalize(text);
    if !s.contains('=') {
        pad_string_to_base32(&mut s);
    }

    BASE32
        .decode(s.as_bytes())
        .map_err(|_| Error::InvalidEncoding)
}

/// Uppercase the text and drop any whitespace.
pub fn canonicalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Canonical form without trailing padding, as embedded in key URIs.
pub fn unpadded(text: &str) -> String {
    let mut s = canonicalize(text);
    let len = s.trim_end_matches('=').len();
    s.truncate(len);
    s
}

/// Group a Base32 secret into blocks of four for manual entry.
///
/// The grouping is cosmetic: [`decode`] strips it again.
pub fn format_secret(text: &str) -> String {
    let chars: Vec<char> = unpadded(text).chars().collect();
    chars
        .chunks(GROUP_WIDTH)
        .map(|block| block.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pad the secret to have the length divisible by 8 for it to be
/// decoded as base32.
fn pad_string_to_base32(s: &mut String) {
    let mut pad_len = 0;
    if s.len() % 8 != 0 {
        pad_len = 8 - s.len() % 8;
    }

    for _ in 0..pad_len {
        s.push('=');
    }
}
