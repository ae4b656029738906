//! Mapping for the IAM instance role of a nodegroup, added when the
//! nodegroup is created and removed when it is deleted.

use log::debug;

use crate::{
  arn::Arn,
  error::{Error, Result},
  identity::MapIdentity,
  store::{AuthConfigMap, ConfigMapClient},
};

/// Admin group, also granted automatically to the IAM role that created the cluster.
pub const GROUP_MASTERS: &str = "system:masters";

/// Username for a nodegroup role mapping.
pub const ROLE_NODE_GROUP_USERNAME: &str = "system:node:{{EC2PrivateDNSName}}";

/// Groups the instance role of a nodegroup needs to join the cluster.
pub const ROLE_NODE_GROUP_GROUPS: [&str; 2] = ["system:bootstrappers", "system:nodes"];

/// The mapping a nodegroup instance role gets.
pub fn node_identity(instance_role_arn: &str) -> Result<MapIdentity> {
  MapIdentity::parse(
    instance_role_arn,
    ROLE_NODE_GROUP_USERNAME,
    ROLE_NODE_GROUP_GROUPS.iter().map(|g| g.to_string()).collect(),
  )
}

/// Fetches the auth ConfigMap, adds the nodegroup mapping and saves it.
pub async fn add_mapping_for_principal<C: ConfigMapClient>(client: &C, instance_role_arn: &str) -> Result<()> {
  let identity = node_identity(instance_role_arn)?;
  AuthConfigMap::fetch(client)
    .await?
    .add_identity(identity)?
    .save(client)
    .await?;
  debug!("saved auth ConfigMap for {:?}", instance_role_arn);
  Ok(())
}

/// Fetches the auth ConfigMap, removes the first mapping for the instance
/// role and saves it. Fails if there was no such mapping.
pub async fn remove_mapping_for_principal<C: ConfigMapClient>(client: &C, instance_role_arn: &str) -> Result<()> {
  if instance_role_arn.is_empty() {
    return Err(Error::MissingInstanceRoleArn);
  }
  let arn = Arn::parse(instance_role_arn)?;
  AuthConfigMap::fetch(client)
    .await?
    .remove_identity(&arn, false)?
    .save(client)
    .await?;
  debug!("updated auth ConfigMap for {:?}", instance_role_arn);
  Ok(())
}
