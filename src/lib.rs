//! Maintains the EKS auth ConfigMap (`kube-system/aws-auth`), which maps IAM
//! roles and users to Kubernetes usernames and groups.
//!
//! See:
//! - https://docs.aws.amazon.com/eks/latest/userguide/add-user-role.html
//! - https://github.com/kubernetes-sigs/aws-iam-authenticator/blob/master/README.md#full-configuration-format

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod arn;
pub mod config;
pub mod error;
pub mod identity;
pub mod nodegroup;
pub mod snapshot;
pub mod store;

pub use arn::{Arn, IdentityKind};
pub use error::Error;
pub use identity::MapIdentity;
pub use snapshot::MappingSnapshot;
pub use store::{AuthConfigMap, ConfigMapClient};

/// Map a role in AWS IAM to Kubernetes groups
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(group = "aws-auth.controlant.com", version = "v1", kind = "MapRole", namespaced)]
pub struct MapRoleSpec {
  /// ARN of the AWS Role
  pub rolearn: String,
  /// Username inside kube
  pub username: String,
  /// Groups in kube
  pub groups: Vec<String>,
}

impl MapRoleSpec {
  pub fn to_identity(&self) -> error::Result<MapIdentity> {
    MapIdentity::parse(&self.rolearn, self.username.clone(), self.groups.clone())
  }

  /// The ARN this resource can have a mapping for. `None` when the ARN is
  /// malformed or neither a role nor a user, as no mapping was ever written.
  pub fn mapped_arn(&self) -> Option<Arn> {
    Arn::parse(&self.rolearn).ok().filter(|arn| arn.kind().is_some())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn spec(rolearn: &str) -> MapRoleSpec {
    MapRoleSpec {
      rolearn: rolearn.to_string(),
      username: "admin".to_string(),
      groups: vec![nodegroup::GROUP_MASTERS.to_string()],
    }
  }

  #[test]
  fn mapped_arn_of_valid_role() {
    let spec = spec("arn:aws:iam::1:role/admin");
    assert_eq!(spec.mapped_arn(), Some(spec.to_identity().unwrap().arn));
  }

  #[test]
  fn unmappable_arns_have_nothing_to_clean_up() {
    for rolearn in ["arn:aws:iam::1:instance-profile/x", "arn:aws:iam", ""] {
      let spec = spec(rolearn);
      assert!(spec.to_identity().is_err());
      assert_eq!(spec.mapped_arn(), None, "{}", rolearn);
    }
  }
}
