//! One-time passwords for a family enrollment: shared secrets, Base32,
//! HOTP/TOTP codes and `otpauth://` key URIs.

#![forbid(unsafe_code)]

pub mod base32;
pub mod config;
pub mod enrollment;
pub mod error;
pub mod hotp;
pub mod qrcode;
pub mod secret;
pub mod totp;
pub mod uri;

pub use config::Config;
pub use enrollment::{Enrollment, Member, MemberId, Provisioned, SecretPolicy};
pub use error::{Error, Result};
pub use secret::{generate_os_secret, generate_secret, EntropySource, Secret};
pub use totp::{Clock, FixedClock, SecretRef, SystemClock, Totp};
pub use uri::{build_uri, KeyUri, KeyUriParams};

/// Format a Base32 secret for manual entry.
pub fn format_secret(secret: &str) -> String {
    base32::format_secret(secret)
}

/// Current six digit code for `secret`.
pub fn generate_code<'a>(secret: impl Into<SecretRef<'a>>) -> Result<String> {
    Totp::new().generate_code(secret)
}

/// Seconds before the current code expires, in `1..=30`.
pub fn remaining_seconds() -> u64 {
    Totp::new().remaining_seconds()
}

/// Check `candidate` against the current code, tolerating one window of
/// clock skew either way.
pub fn verify<'a>(secret: impl Into<SecretRef<'a>>, candidate: &str) -> Result<bool> {
    Totp::new().verify(secret, candidate, totp::DEFAULT_WINDOW)
}
