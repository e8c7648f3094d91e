//! Enrollment of a small group of members into one issuer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::secret::{generate_secret, EntropySource, Secret};
use crate::totp::SecretRef;
use crate::uri::{build_uri, KeyUriParams};

pub const MIN_MEMBERS: usize = 2;
pub const MAX_MEMBERS: usize = 12;

/// How secrets are handed out when an enrollment is issued.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretPolicy {
    /// Every member receives the same secret, so all of their
    /// authenticators show the same code.
    #[default]
    Shared,
    /// Every member receives an independent secret.
    PerMember,
}

pub type MemberId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}

/// What a single member needs to set up an authenticator.
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub member: Member,
    pub secret: Secret,
    pub uri: String,
}

impl Provisioned {
    /// Secret grouped for manual entry.
    pub fn display_secret(&self) -> String {
        self.secret.to_display()
    }
}

/// Member roster of one enrollment session.
#[derive(Debug, Clone)]
pub struct Enrollment {
    issuer: String,
    members: Vec<Member>,
    next_id: MemberId,
}

impl Enrollment {
    pub fn new(issuer: impl Into<String>) -> Self {
        Enrollment {
            issuer: issuer.into(),
            members: Vec::new(),
            next_id: 1,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Add a member and return its id. Ids are never reused within a session.
    pub fn add_member(&mut self, name: impl Into<String>) -> Result<MemberId> {
        if self.members.len() >= MAX_MEMBERS {
            return Err(Error::TooManyMembers { max: MAX_MEMBERS });
        }

        let id = self.next_id;
        self.next_id += 1;
        self.members.push(Member {
            id,
            name: name.into(),
        });
        Ok(id)
    }

    pub fn remove_member(&mut self, id: MemberId) -> Result<()> {
        let index = self.position(id)?;
        if self.members.len() <= MIN_MEMBERS {
            return Err(Error::TooFewMembers { min: MIN_MEMBERS });
        }
        self.members.remove(index);
        Ok(())
    }

    pub fn rename_member(&mut self, id: MemberId, name: impl Into<String>) -> Result<()> {
        let index = self.position(id)?;
        self.members[index].name = name.into();
        Ok(())
    }

    /// Draw secrets according to `policy` and build one key URI per member.
    ///
    /// Names are trimmed first; nothing is drawn unless every member has a
    /// name and the roster holds at least [`MIN_MEMBERS`].
    pub fn issue(
        &self,
        source: &dyn EntropySource,
        policy: SecretPolicy,
    ) -> Result<Vec<Provisioned>> {
        let members = self.validated_members()?;

        let shared = match policy {
            SecretPolicy::Shared => Some(generate_secret(source)?),
            SecretPolicy::PerMember => None,
        };

        let provisioned = members
            .into_iter()
            .map(|member| -> Result<Provisioned> {
                let secret = match &shared {
                    Some(secret) => secret.clone(),
                    None => generate_secret(source)?,
                };
                let uri = build_uri(KeyUriParams {
                    secret: SecretRef::from(&secret),
                    issuer: &self.issuer,
                    account: &member.name,
                })?;
                Ok(Provisioned {
                    member,
                    secret,
                    uri,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            members = provisioned.len(),
            ?policy,
            "issued enrollment secrets"
        );
        Ok(provisioned)
    }

    fn validated_members(&self) -> Result<Vec<Member>> {
        let members: Vec<Member> = self
            .members
            .iter()
            .map(|m| Member {
                id: m.id,
                name: m.name.trim().to_owned(),
            })
            .collect();

        if let Some(empty) = members.iter().find(|m| m.name.is_empty()) {
            return Err(Error::EmptyMemberName { id: empty.id });
        }
        if members.len() < MIN_MEMBERS {
            return Err(Error::TooFewMembers { min: MIN_MEMBERS });
        }
        Ok(members)
    }

    fn position(&self, id: MemberId) -> Result<usize> {
        self.members
            .iter()
            .position(|m| m.id == id)
            .ok_or(Error::UnknownMember { id })
    }
}
