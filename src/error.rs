use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Core errors
    #[error("secure random source is unavailable")]
    EntropyUnavailable,

    #[error("invalid base32 encoding")]
    InvalidEncoding,

    #[error("secret is not valid base32")]
    InvalidSecret,

    #[error("secret must not be empty")]
    InvalidSecretLength,

    #[error("digits must be between 6 and 8, got {digits}")]
    InvalidDigits { digits: u32 },

    #[error("verification window {window} exceeds the maximum of {max}")]
    WindowTooWide { window: u64, max: u64 },

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    // Key URI errors
    #[error("invalid key uri: {reason}")]
    InvalidUri { reason: String },

    #[error("unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("failed to read QR code: {reason}")]
    QrCode { reason: String },

    // Enrollment errors
    #[error("an enrollment needs at least {min} members")]
    TooFewMembers { min: usize },

    #[error("an enrollment accepts at most {max} members")]
    TooManyMembers { max: usize },

    #[error("no member with id {id}")]
    UnknownMember { id: u32 },

    #[error("member {id} has an empty name")]
    EmptyMemberName { id: u32 },

    // Configuration errors
    #[error("failed to parse config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
