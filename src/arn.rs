use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

/// The kind of IAM entity an ARN refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKind {
  Role,
  User,
}

/// An ARN split into its segments, as described by
/// https://docs.aws.amazon.com/general/latest/gr/aws-arns-and-namespaces.html
///
/// ```text
/// arn:partition:service:region:account-id:resource
/// arn:partition:service:region:account-id:resourcetype/resource
/// arn:partition:service:region:account-id:resourcetype/resource/qualifier
/// arn:partition:service:region:account-id:resourcetype/resource:qualifier
/// arn:partition:service:region:account-id:resourcetype:resource
/// arn:partition:service:region:account-id:resourcetype:resource:qualifier
/// ```
///
/// Everything past the fifth colon is kept verbatim in `resource`, so
/// formatting a parsed ARN yields the input string byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Arn {
  scheme: String,
  partition: String,
  service: String,
  region: String,
  account_id: String,
  resource: String,
}

impl Arn {
  pub fn parse(s: &str) -> Result<Self> {
    let mut segments = s.splitn(6, ':');
    let mut next = || segments.next().map(str::to_string);
    match (next(), next(), next(), next(), next(), next()) {
      (Some(scheme), Some(partition), Some(service), Some(region), Some(account_id), Some(resource)) => Ok(Arn {
        scheme,
        partition,
        service,
        region,
        account_id,
        resource,
      }),
      _ => Err(Error::MalformedArn(s.to_string())),
    }
  }

  pub fn partition(&self) -> &str {
    &self.partition
  }

  pub fn service(&self) -> &str {
    &self.service
  }

  pub fn region(&self) -> &str {
    &self.region
  }

  pub fn account_id(&self) -> &str {
    &self.account_id
  }

  /// The resource portion, including any resource type and qualifier.
  pub fn resource(&self) -> &str {
    &self.resource
  }

  /// The leading part of the resource, up to the first `/` or `:`.
  pub fn resource_type(&self) -> &str {
    self.resource.split(|c: char| c == '/' || c == ':').next().unwrap_or_default()
  }

  pub fn kind(&self) -> Option<IdentityKind> {
    match self.resource_type() {
      "role" => Some(IdentityKind::Role),
      "user" => Some(IdentityKind::User),
      _ => None,
    }
  }

  /// Like [`Arn::kind`], but an ARN that is neither a role nor a user is an error.
  pub fn classify(&self) -> Result<IdentityKind> {
    self.kind().ok_or_else(|| Error::UnclassifiedArn {
      arn: self.to_string(),
      resource_type: self.resource_type().to_string(),
    })
  }
}

impl fmt::Display for Arn {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}:{}:{}:{}:{}:{}",
      self.scheme, self.partition, self.service, self.region, self.account_id, self.resource
    )
  }
}

impl FromStr for Arn {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Arn::parse(s)
  }
}

impl Serialize for Arn {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Arn {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    Arn::parse(&s).map_err(serde::de::Error::custom)
  }
}
