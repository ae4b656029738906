use serde::{Deserialize, Serialize};

use crate::{
  arn::{Arn, IdentityKind},
  error::{Error, Result},
};

/// An IAM role or user mapped to a Kubernetes username and groups.
///
/// Entries are stored under `mapRoles` with a `rolearn` key or under
/// `mapUsers` with a `userarn` key; which one is decided from the ARN
/// every time the mappings are written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "StoredIdentity")]
pub struct MapIdentity {
  pub arn: Arn,
  pub username: String,
  pub groups: Vec<String>,
}

impl MapIdentity {
  /// Builds a mapping, rejecting ARNs that are neither roles nor users.
  pub fn new(arn: Arn, username: impl Into<String>, groups: Vec<String>) -> Result<Self> {
    arn.classify()?;
    Ok(MapIdentity {
      arn,
      username: username.into(),
      groups,
    })
  }

  pub fn parse(arn: &str, username: impl Into<String>, groups: Vec<String>) -> Result<Self> {
    MapIdentity::new(Arn::parse(arn)?, username, groups)
  }

  pub fn kind(&self) -> Option<IdentityKind> {
    self.arn.kind()
  }
}

#[derive(Deserialize)]
struct StoredIdentity {
  rolearn: Option<Arn>,
  userarn: Option<Arn>,
  username: Option<String>,
  groups: Option<Vec<String>>,
}

impl TryFrom<StoredIdentity> for MapIdentity {
  type Error = Error;

  fn try_from(stored: StoredIdentity) -> Result<Self> {
    Ok(MapIdentity {
      arn: stored.rolearn.or(stored.userarn).ok_or(Error::MissingArn)?,
      username: stored.username.unwrap_or_default(),
      groups: stored.groups.unwrap_or_default(),
    })
  }
}

/// `mapRoles` entry.
#[derive(Serialize)]
pub(crate) struct RoleEntry<'a> {
  rolearn: &'a Arn,
  username: &'a str,
  groups: &'a [String],
}

impl<'a> From<&'a MapIdentity> for RoleEntry<'a> {
  fn from(identity: &'a MapIdentity) -> Self {
    RoleEntry {
      rolearn: &identity.arn,
      username: &identity.username,
      groups: &identity.groups,
    }
  }
}

/// `mapUsers` entry.
#[derive(Serialize)]
pub(crate) struct UserEntry<'a> {
  userarn: &'a Arn,
  username: &'a str,
  groups: &'a [String],
}

impl<'a> From<&'a MapIdentity> for UserEntry<'a> {
  fn from(identity: &'a MapIdentity) -> Self {
    UserEntry {
      userarn: &identity.arn,
      username: &identity.username,
      groups: &identity.groups,
    }
  }
}
