//! Counter based one-time passwords (RFC 4226).

use ring::hmac;

use crate::error::{Error, Result};

pub const DEFAULT_DIGITS: u32 = 6;
pub const MIN_DIGITS: u32 = 6;
pub const MAX_DIGITS: u32 = 8;

/// Compute the HOTP value of `secret` at `counter`, zero padded to
/// `digits` characters.
pub fn hotp(secret: &[u8], counter: u64, digits: u32) -> Result<String> {
    if secret.is_empty() {
        return Err(Error::InvalidSecretLength);
    }
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
        return Err(Error::InvalidDigits { digits });
    }

    // At the moment, only SHA1 is supported.
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret);
    let tag = hmac::sign(&key, &counter.to_be_bytes());

    let h = truncate(tag.as_ref());

    // Format the otp with left padding if the modulo is less than
    // the required digits.
    Ok(format!(
        "{:0w$}",
        h % 10u32.pow(digits),
        w = digits as usize
    ))
}

/// Dynamic truncation: the low 4 bits of the last byte select a 4-byte
/// window whose top bit is masked off, giving a 31-bit value.
fn truncate(digest: &[u8]) -> u32 {
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;

    u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ])
}
