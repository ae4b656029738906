use log::info;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};

use crate::{
  arn::{Arn, IdentityKind},
  error::{Error, Result},
  identity::{MapIdentity, RoleEntry, UserEntry},
};

pub const ROLES_DATA: &str = "mapRoles";
pub const USERS_DATA: &str = "mapUsers";
pub const ACCOUNTS_DATA: &str = "mapAccounts";

/// Decoded view of the auth ConfigMap data.
///
/// Every mutation consumes the snapshot and hands back the changed one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingSnapshot {
  identities: Vec<MapIdentity>,
  accounts: Vec<String>,
}

impl MappingSnapshot {
  /// Decodes `mapRoles`, `mapUsers` and `mapAccounts`. A missing or empty key
  /// is an empty list.
  pub fn decode(data: &BTreeMap<String, String>) -> Result<Self> {
    let mut identities: Vec<MapIdentity> = decode_key(data, ROLES_DATA)?;
    identities.extend(decode_key::<MapIdentity>(data, USERS_DATA)?);
    let accounts = decode_key(data, ACCOUNTS_DATA)?;
    Ok(MappingSnapshot { identities, accounts })
  }

  /// Roles followed by users, each in stored order.
  pub fn identities(&self) -> &[MapIdentity] {
    &self.identities
  }

  pub fn accounts(&self) -> &[String] {
    &self.accounts
  }

  /// All mappings for `arn`. The format tolerates duplicates, and at the
  /// moment aws-iam-authenticator only honours the last one.
  pub fn matching(&self, arn: &str) -> Vec<&MapIdentity> {
    self.identities.iter().filter(|i| i.arn.to_string() == arn).collect()
  }

  /// Every mapping, or only those for `arn` when given. A filter that
  /// matches nothing is an error.
  pub fn lookup(&self, arn: Option<&Arn>) -> Result<Vec<&MapIdentity>> {
    match arn {
      None => Ok(self.identities.iter().collect()),
      Some(arn) => {
        let found: Vec<_> = self.identities.iter().filter(|i| &i.arn == arn).collect();
        if found.is_empty() {
          return Err(Error::NoMatchingIdentity(arn.to_string()));
        }
        Ok(found)
      }
    }
  }

  /// Appends a mapping. Mappings for an ARN that is already present are not
  /// merged or replaced.
  pub fn add_identity(mut self, identity: MapIdentity) -> Self {
    info!("adding identity {:?} to auth ConfigMap", identity.arn.to_string());
    self.identities.push(identity);
    self
  }

  /// Removes the first mapping for `arn`, failing if there is none. With
  /// `all`, removes every mapping for `arn` and never fails.
  pub fn remove_identity(mut self, arn: &Arn, all: bool) -> Result<Self> {
    if all {
      self.identities.retain(|identity| {
        let matched = &identity.arn == arn;
        if matched {
          log_removal(identity);
        }
        !matched
      });
      return Ok(self);
    }

    let idx = self
      .identities
      .iter()
      .position(|identity| &identity.arn == arn)
      .ok_or_else(|| Error::IdentityNotFound(arn.to_string()))?;
    log_removal(&self.identities.remove(idx));
    Ok(self)
  }

  /// Adds an account. The resulting list is deduplicated and sorted.
  pub fn add_account(mut self, account: impl Into<String>) -> Self {
    let account = account.into();
    info!("adding account {:?} to auth ConfigMap", account);
    self.accounts.push(account);
    self.accounts = self.accounts.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
    self
  }

  pub fn remove_account(mut self, account: &str) -> Result<Self> {
    let before = self.accounts.len();
    self.accounts.retain(|acc| acc != account);
    if self.accounts.len() == before {
      return Err(Error::AccountNotFound(account.to_string()));
    }
    info!("removing account {:?} from auth ConfigMap", account);
    Ok(self)
  }

  /// Splits the identities into `mapRoles` and `mapUsers`, classifying each
  /// ARN again. An ARN that is neither a role nor a user fails the encode.
  pub fn encode_identities(&self) -> Result<(String, String)> {
    let mut roles = Vec::new();
    let mut users = Vec::new();
    for identity in &self.identities {
      match identity.arn.classify()? {
        IdentityKind::Role => roles.push(RoleEntry::from(identity)),
        IdentityKind::User => users.push(UserEntry::from(identity)),
      }
    }
    Ok((encode_key(ROLES_DATA, &roles)?, encode_key(USERS_DATA, &users)?))
  }

  pub fn encode_accounts(&self) -> Result<String> {
    encode_key(ACCOUNTS_DATA, &self.accounts)
  }
}

fn log_removal(identity: &MapIdentity) {
  info!(
    "removing identity {:?} from auth ConfigMap (username = {:?}, groups = {:?})",
    identity.arn.to_string(),
    identity.username,
    identity.groups
  );
}

fn decode_key<T: DeserializeOwned>(data: &BTreeMap<String, String>, key: &'static str) -> Result<Vec<T>> {
  match data.get(key) {
    Some(raw) if !raw.trim().is_empty() => serde_yaml::from_str::<Option<Vec<T>>>(raw)
      .map(Option::unwrap_or_default)
      .map_err(|source| Error::Decode { key, source }),
    _ => Ok(Vec::new()),
  }
}

fn encode_key<T: serde::Serialize + ?Sized>(key: &'static str, value: &T) -> Result<String> {
  serde_yaml::to_string(value).map_err(|source| Error::Encode { key, source })
}
