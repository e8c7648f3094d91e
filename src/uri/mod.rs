//! `otpauth://` key URIs, as understood by authenticator apps.
//!
//! Sample url
//! otpauth://totp/otplib-website:otplib-demo-user?
//! secret=H4ZWJCQZEREL2IE2&period=30&digits=6
//! &algorithm=SHA1&issuer=otplib-website

use std::borrow::Cow::Borrowed;
use url::Url;

use crate::base32;
use crate::error::{Error, Result};
use crate::hotp::{hotp, DEFAULT_DIGITS, MAX_DIGITS, MIN_DIGITS};
use crate::secret::Secret;
use crate::totp::{Clock, SecretRef, TIME_STEP};

const SCHEME: &str = "otpauth";
const ALGORITHM: &str = "SHA1";

/// Inputs of [`build_uri`].
#[derive(Debug, Clone, Copy)]
pub struct KeyUriParams<'a> {
    pub secret: SecretRef<'a>,
    pub issuer: &'a str,
    pub account: &'a str,
}

/// Build the key URI provisioning `account` at `issuer` with `secret`.
///
/// The label and the issuer parameter are percent-encoded per RFC 3986, so a
/// colon inside the account cannot be mistaken for the label separator.
pub fn build_uri(params: KeyUriParams<'_>) -> Result<String> {
    let issuer = params.issuer.trim();
    if issuer.is_empty() {
        return Err(Error::MissingField { field: "issuer" });
    }
    let account = params.account.trim();
    if account.is_empty() {
        return Err(Error::MissingField { field: "account" });
    }

    let secret = match params.secret {
        SecretRef::Encoded(text) => {
            base32::decode(text).map_err(|_| Error::InvalidSecret)?;
            base32::unpadded(text)
        }
        SecretRef::Raw(bytes) => base32::unpadded(&base32::encode(bytes)),
    };
    if secret.is_empty() {
        return Err(Error::InvalidSecretLength);
    }

    let issuer = urlencoding::encode(issuer);
    let account = urlencoding::encode(account);

    Ok(format!(
        "{SCHEME}://totp/{issuer}:{account}?secret={secret}&issuer={issuer}\
         &algorithm={ALGORITHM}&digits={DEFAULT_DIGITS}&period={TIME_STEP}"
    ))
}

/// A parsed `otpauth://totp/` key URI.
///
/// Fields are only reachable through getters, so `period` is never zero
/// and `digits` always lies in `6..=8`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyUri {
    secret: Secret,
    issuer: Option<String>,
    account: String,
    digits: u32,
    period: u64,
}

impl KeyUri {
    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn parse(input: &str) -> Result<Self> {
        let u = Url::parse(input).map_err(|e| Error::InvalidUri {
            reason: e.to_string(),
        })?;
        KeyUri::from_url(&u)
    }

    /// Read a key URI from an already parsed [`Url`].
    ///
    /// Out of range `digits` fall back to 6 and a zero or unreadable
    /// `period` falls back to 30, the way authenticator apps treat them.
    pub fn from_url(u: &Url) -> Result<Self> {
        if u.scheme() != SCHEME {
            return Err(Error::InvalidUri {
                reason: format!("unexpected scheme `{}`", u.scheme()),
            });
        }
        if u.host_str() != Some("totp") {
            return Err(Error::InvalidUri {
                reason: String::from("only totp key uris are supported"),
            });
        }

        let (label_issuer, account) = parse_label(u.path())?;

        let mut secret = None;
        let mut issuer = label_issuer;
        let mut digits = DEFAULT_DIGITS;
        let mut period = TIME_STEP;

        for qs in u.query_pairs() {
            match qs {
                (Borrowed("secret"), x) => {
                    secret = Some(Secret::from_base32(&x)?);
                }
                (Borrowed("period"), x) => {
                    period = x.parse().ok().filter(|p| *p > 0).unwrap_or(TIME_STEP);
                }
                (Borrowed("algorithm"), x) => {
                    if !x.eq_ignore_ascii_case(ALGORITHM) {
                        return Err(Error::UnsupportedAlgorithm {
                            algorithm: x.into_owned(),
                        });
                    }
                }
                (Borrowed("digits"), x) => {
                    digits = x
                        .parse()
                        .ok()
                        .filter(|d| (MIN_DIGITS..=MAX_DIGITS).contains(d))
                        .unwrap_or(DEFAULT_DIGITS);
                }
                (Borrowed("issuer"), x) => {
                    if !x.trim().is_empty() {
                        issuer = Some(x.into_owned());
                    }
                }
                (_, _) => {}
            }
        }

        let secret = secret.ok_or(Error::MissingField { field: "secret" })?;

        Ok(KeyUri {
            secret,
            issuer,
            account,
            digits,
            period,
        })
    }

    /// Code at `unix_secs` using this URI's period and digit count.
    pub fn code_at(&self, unix_secs: u64) -> Result<String> {
        hotp(self.secret.as_bytes(), unix_secs / self.period, self.digits)
    }

    /// Utility method that reads the clock and generates the current token.
    pub fn current_code(&self, clock: &dyn Clock) -> Result<String> {
        self.code_at(clock.now())
    }

    /// Seconds left before [`KeyUri::current_code`] changes.
    pub fn remaining_seconds(&self, clock: &dyn Clock) -> u64 {
        self.period - clock.now() % self.period
    }
}

/// Split `/issuer:account` on the first literal colon and percent-decode
/// both halves. Encoded colons (`%3A`) stay inside their half.
fn parse_label(path: &str) -> Result<(Option<String>, String)> {
    let label = path.trim_start_matches('/');

    let (issuer, account) = match label.split_once(':') {
        Some((issuer, account)) => (Some(decode_component(issuer)?), account),
        None => (None, label),
    };

    let account = decode_component(account)?;
    if account.trim().is_empty() {
        return Err(Error::MissingField { field: "account" });
    }

    Ok((issuer.filter(|i| !i.trim().is_empty()), account))
}

fn decode_component(raw: &str) -> Result<String> {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .map_err(|e| Error::InvalidUri {
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::totp::FixedClock;

    fn params<'a>(secret: &'a str, issuer: &'a str, account: &'a str) -> KeyUriParams<'a> {
        KeyUriParams {
            secret: SecretRef::Encoded(secret),
            issuer,
            account,
        }
    }

    #[test]
    fn builds_standard_key_uri() {
        let uri = build_uri(params("JBSWY3DPEHPK3PXP", "AuthFam", "Alice Doe")).unwrap();
        assert!(uri.starts_with("otpauth://totp/AuthFam:Alice%20Doe?"));
        assert_eq!(
            uri,
            "otpauth://totp/AuthFam:Alice%20Doe?secret=JBSWY3DPEHPK3PXP&issuer=AuthFam\
             &algorithm=SHA1&digits=6&period=30"
        );
    }

    #[test]
    fn colon_in_account_is_encoded() {
        let uri = build_uri(params("JBSWY3DPEHPK3PXP", "Auth Fam", "bob:work")).unwrap();
        assert!(uri.starts_with("otpauth://totp/Auth%20Fam:bob%3Awork?"));
        assert!(uri.contains("issuer=Auth%20Fam"));
    }

    #[test]
    fn display_grouping_is_not_embedded() {
        let uri = build_uri(params("jbsw y3dp ehpk 3pxp", "AuthFam", "alice")).unwrap();
        assert!(uri.contains("secret=JBSWY3DPEHPK3PXP&"));
    }

    #[test]
    fn raw_secret_is_encoded_without_padding() {
        let uri = build_uri(KeyUriParams {
            secret: SecretRef::Raw(b"foobar"),
            issuer: "AuthFam",
            account: "alice",
        })
        .unwrap();
        assert!(uri.contains("secret=MZXW6YTBOI&"));
    }

    #[test]
    fn empty_fields_are_rejected() {
        assert!(matches!(
            build_uri(params("JBSWY3DPEHPK3PXP", "  ", "alice")),
            Err(Error::MissingField { field: "issuer" })
        ));
        assert!(matches!(
            build_uri(params("JBSWY3DPEHPK3PXP", "AuthFam", "")),
            Err(Error::MissingField { field: "account" })
        ));
    }

    #[test]
    fn malformed_secret_is_rejected() {
        assert!(matches!(
            build_uri(params("12345", "AuthFam", "alice")),
            Err(Error::InvalidSecret)
        ));
    }

    #[test]
    fn parse_reverses_build() {
        let uri = build_uri(params("JBSWY3DPEHPK3PXP", "Auth Fam", "bob:work")).unwrap();
        let key = KeyUri::parse(&uri).unwrap();
        assert_eq!(key.issuer(), Some("Auth Fam"));
        assert_eq!(key.account(), "bob:work");
        assert_eq!(*key.secret(), Secret::from_base32("JBSWY3DPEHPK3PXP").unwrap());
        assert_eq!(key.digits(), 6);
        assert_eq!(key.period(), 30);
    }

    #[test]
    fn totp_test_with_url() {
        let key = KeyUri::parse("otpauth://totp/test:user?secret=JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(key.code_at(53_273_637 * 30).unwrap(), "927328");
        assert_eq!(key.issuer(), Some("test"));
        assert_eq!(key.account(), "user");
    }

    #[test]
    fn totp_spec_parse_falls_back_on_bad_values() {
        let key =
            KeyUri::parse("otpauth://totp/test:user?digits=3&period=0&secret=JBSWY3DPEHPK3PXP")
                .unwrap();
        assert_eq!(key.digits(), 6);
        assert_eq!(key.period(), 30);
    }

    #[test]
    fn parse_honours_digits_and_period() {
        let key = KeyUri::parse(
            "otpauth://totp/ACME:alice?secret=GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ&digits=8&period=60",
        )
        .unwrap();
        assert_eq!(key.code_at(119).unwrap(), "94287082");

        let clock = FixedClock(119);
        assert_eq!(key.current_code(&clock).unwrap(), "94287082");
        assert_eq!(key.remaining_seconds(&clock), 1);
    }

    #[test]
    fn parse_rejects_other_kinds() {
        assert!(matches!(
            KeyUri::parse("otpauth://hotp/a:b?secret=JBSWY3DPEHPK3PXP"),
            Err(Error::InvalidUri { .. })
        ));
        assert!(matches!(
            KeyUri::parse("https://totp/a:b?secret=JBSWY3DPEHPK3PXP"),
            Err(Error::InvalidUri { .. })
        ));
        assert!(matches!(
            KeyUri::parse("not a uri"),
            Err(Error::InvalidUri { .. })
        ));
    }

    #[test]
    fn parse_requires_supported_algorithm_and_secret() {
        assert!(matches!(
            KeyUri::parse("otpauth://totp/a:b?secret=JBSWY3DPEHPK3PXP&algorithm=SHA256"),
            Err(Error::UnsupportedAlgorithm { .. })
        ));
        assert!(matches!(
            KeyUri::parse("otpauth://totp/a:b?issuer=a"),
            Err(Error::MissingField { field: "secret" })
        ));
        assert!(matches!(
            KeyUri::parse("otpauth://totp/a:b?secret=12345"),
            Err(Error::InvalidSecret)
        ));
    }

    #[test]
    fn zero_period_never_reaches_division() {
        let key =
            KeyUri::parse("otpauth://totp/a:b?secret=JBSWY3DPEHPK3PXP&period=0").unwrap();
        assert_eq!(key.period(), 30);
        assert!(key.code_at(59).is_ok());
        assert_eq!(key.remaining_seconds(&FixedClock(59)), 1);
    }

    #[test]
    fn label_without_issuer_is_an_account() {
        let key = KeyUri::parse("otpauth://totp/alice?secret=JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(key.issuer(), None);
        assert_eq!(key.account(), "alice");
    }
}
