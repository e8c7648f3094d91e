//! Time based one-time passwords (RFC 6238) on top of [`crate::hotp`].

use constant_time_eq::constant_time_eq;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::base32;
use crate::error::{Error, Result};
use crate::hotp::{hotp, DEFAULT_DIGITS};
use crate::secret::Secret;

/// Length of one code window in seconds.
pub const TIME_STEP: u64 = 30;

/// Windows checked on either side of the current one by [`Totp::verify`].
pub const DEFAULT_WINDOW: u64 = 1;

/// Widest skew tolerance [`verify_at`] accepts.
pub const MAX_WINDOW: u64 = 10;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now(&self) -> u64;
}

/// Clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        // A clock set before 1970 reads as the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|t| t.as_secs())
            .unwrap_or_default()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

/// Clock frozen at a given timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

/// A secret as callers hold it: Base32 text or raw key bytes.
#[derive(Debug, Clone, Copy)]
pub enum SecretRef<'a> {
    Encoded(&'a str),
    Raw(&'a [u8]),
}

impl<'a> SecretRef<'a> {
    fn key_bytes(self) -> Result<Vec<u8>> {
        match self {
            SecretRef::Encoded(text) => base32::decode(text).map_err(|_| Error::InvalidSecret),
            SecretRef::Raw(bytes) => Ok(bytes.to_vec()),
        }
    }
}

impl<'a> From<&'a str> for SecretRef<'a> {
    fn from(text: &'a str) -> Self {
        SecretRef::Encoded(text)
    }
}

impl<'a> From<&'a String> for SecretRef<'a> {
    fn from(text: &'a String) -> Self {
        SecretRef::Encoded(text.as_str())
    }
}

impl<'a> From<&'a [u8]> for SecretRef<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        SecretRef::Raw(bytes)
    }
}

impl<'a> From<&'a Secret> for SecretRef<'a> {
    fn from(secret: &'a Secret) -> Self {
        SecretRef::Raw(secret.as_bytes())
    }
}

/// Get the counter value at `unix_secs` as the interval number which
/// will be used to calculate the hash for the HOTP.
pub fn counter_for(unix_secs: u64) -> u64 {
    unix_secs / TIME_STEP
}

/// Seconds left in the window containing `unix_secs`, in `1..=30`.
pub fn remaining_seconds_at(unix_secs: u64) -> u64 {
    TIME_STEP - unix_secs % TIME_STEP
}

/// Six digit code for `secret` in the window containing `unix_secs`.
pub fn generate_code_at<'a>(secret: impl Into<SecretRef<'a>>, unix_secs: u64) -> Result<String> {
    let key = secret.into().key_bytes()?;
    hotp(&key, counter_for(unix_secs), DEFAULT_DIGITS)
}

/// Check `candidate` against the windows `[c - window, c + window]` around
/// `unix_secs`. Every comparison runs in constant time.
///
/// Windows wider than [`MAX_WINDOW`] are rejected.
pub fn verify_at<'a>(
    secret: impl Into<SecretRef<'a>>,
    candidate: &str,
    unix_secs: u64,
    window: u64,
) -> Result<bool> {
    check_window(window)?;
    let key = secret.into().key_bytes()?;
    let current = counter_for(unix_secs);

    let first = current.saturating_sub(window);
    let last = current.saturating_add(window);
    for counter in first..=last {
        let expected = hotp(&key, counter, DEFAULT_DIGITS)?;
        if constant_time_eq(expected.as_bytes(), candidate.as_bytes()) {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Reject skew windows wider than [`MAX_WINDOW`].
pub fn check_window(window: u64) -> Result<()> {
    if window > MAX_WINDOW {
        return Err(Error::WindowTooWide {
            window,
            max: MAX_WINDOW,
        });
    }
    Ok(())
}

/// TOTP engine reading the current time from a [`Clock`].
#[derive(Debug, Default, Clone)]
pub struct Totp<C = SystemClock> {
    clock: C,
}

impl Totp<SystemClock> {
    pub fn new() -> Self {
        Totp { clock: SystemClock }
    }
}

impl<C: Clock> Totp<C> {
    pub fn with_clock(clock: C) -> Self {
        Totp { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current counter value.
    pub fn counter(&self) -> u64 {
        counter_for(self.clock.now())
    }

    /// Code for the current window.
    pub fn generate_code<'a>(&self, secret: impl Into<SecretRef<'a>>) -> Result<String> {
        generate_code_at(secret, self.clock.now())
    }

    /// Seconds until the current code expires. Never reports zero.
    pub fn remaining_seconds(&self) -> u64 {
        remaining_seconds_at(self.clock.now())
    }

    /// Accept `candidate` if it matches the current window or one of the
    /// `window` windows on either side of it.
    pub fn verify<'a>(
        &self,
        secret: impl Into<SecretRef<'a>>,
        candidate: &str,
        window: u64,
    ) -> Result<bool> {
        verify_at(secret, candidate, self.clock.now(), window)
    }
}

/// Split a code into blocks of three for display, e.g. `287 082`.
pub fn format_code(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    chars
        .chunks(3)
        .map(|block| block.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}
