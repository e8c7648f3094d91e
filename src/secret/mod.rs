//! Shared secrets and the secure random source they are drawn from.

use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;

use crate::base32;
use crate::error::{Error, Result};

/// Secret length in bytes, matching the HMAC-SHA1 output size.
pub const SECRET_LEN: usize = 20;

/// Source of cryptographically secure random bytes.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` entirely or fail. Implementations must never fall back
    /// to a weaker generator.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

impl EntropySource for SystemRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        SecureRandom::fill(self, dest).map_err(|_| Error::EntropyUnavailable)
    }
}

/// Immutable key material shared between a member and their authenticator.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Wrap existing key material. Empty secrets are rejected.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(Error::InvalidSecretLength);
        }
        Ok(Secret(bytes))
    }

    /// Decode a Base32 secret, as typed by a user or read from a key URI.
    pub fn from_base32(text: &str) -> Result<Self> {
        let bytes = base32::decode(text).map_err(|_| Error::InvalidSecret)?;
        Secret::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Padded Base32 projection of the secret.
    pub fn to_base32(&self) -> String {
        base32::encode(&self.0)
    }

    /// Base32 grouped in blocks of four, for manual entry.
    pub fn to_display(&self) -> String {
        base32::format_secret(&self.to_base32())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&"[REDACTED]").finish()
    }
}

/// Draw a fresh [`SECRET_LEN`]-byte secret from `source`.
pub fn generate_secret(source: &dyn EntropySource) -> Result<Secret> {
    let mut bytes = vec![0u8; SECRET_LEN];
    source.fill(&mut bytes)?;
    Ok(Secret(bytes))
}

/// Draw a fresh secret from the operating system's CSPRNG.
pub fn generate_os_secret() -> Result<Secret> {
    generate_secret(&SystemRandom::new())
}

#[cfg(test)]
pub(crate) struct BrokenSource;

#[cfg(test)]
impl EntropySource for BrokenSource {
    fn fill(&self, _dest: &mut [u8]) -> Result<()> {
        Err(Error::EntropyUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_secret_has_expected_length() {
        let secret = generate_os_secret().unwrap();
        assert_eq!(secret.as_bytes().len(), SECRET_LEN);
        assert_eq!(secret.to_base32().len(), 32);
    }

    #[test]
    fn generated_secrets_do_not_repeat() {
        let rng = SystemRandom::new();
        let mut seen = HashSet::new();
        for _ in 0..256 {
            let secret = generate_secret(&rng).unwrap();
            assert!(seen.insert(secret.as_bytes().to_vec()));
        }
    }

    #[test]
    fn entropy_failure_propagates() {
        let err = generate_secret(&BrokenSource).unwrap_err();
        assert!(matches!(err, Error::EntropyUnavailable));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            Secret::from_bytes(Vec::new()),
            Err(Error::InvalidSecretLength)
        ));
        assert!(matches!(
            Secret::from_base32(""),
            Err(Error::InvalidSecretLength)
        ));
    }

    #[test]
    fn base32_projection_round_trips() {
        let secret = Secret::from_bytes(&b"12345678901234567890"[..]).unwrap();
        assert_eq!(secret.to_base32(), "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ");
        assert_eq!(Secret::from_base32(&secret.to_display()).unwrap(), secret);
    }

    #[test]
    fn invalid_base32_is_an_invalid_secret() {
        assert!(matches!(
            Secret::from_base32("not base32!"),
            Err(Error::InvalidSecret)
        ));
    }

    #[test]
    fn debug_output_is_redacted() {
        let secret = Secret::from_bytes(vec![0xde, 0xad]).unwrap();
        assert_eq!(format!("{:?}", secret), "Secret(\"[REDACTED]\")");
    }
}
