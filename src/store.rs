use async_trait::async_trait;
use k8s_openapi::{api::core::v1::ConfigMap, apimachinery::pkg::apis::meta::v1::ObjectMeta};
use kube::{
  api::{Api, PostParams},
  error::ErrorResponse,
  Client,
};
use log::debug;

use crate::{
  arn::Arn,
  error::{Error, Result},
  identity::MapIdentity,
  snapshot::{MappingSnapshot, ACCOUNTS_DATA, ROLES_DATA, USERS_DATA},
};

/// Kubernetes name of the auth ConfigMap.
pub const OBJECT_NAME: &str = "aws-auth";
/// Namespace the auth ConfigMap lives in.
pub const OBJECT_NAMESPACE: &str = "kube-system";

/// The calls the auth ConfigMap needs from the API server.
#[async_trait]
pub trait ConfigMapClient: Send + Sync {
  /// `Ok(None)` when the ConfigMap does not exist.
  async fn get_config_map(&self, name: &str) -> Result<Option<ConfigMap>, kube::Error>;
  async fn create_config_map(&self, cm: &ConfigMap) -> Result<ConfigMap, kube::Error>;
  async fn replace_config_map(&self, name: &str, cm: &ConfigMap) -> Result<ConfigMap, kube::Error>;
}

#[async_trait]
impl ConfigMapClient for Api<ConfigMap> {
  async fn get_config_map(&self, name: &str) -> Result<Option<ConfigMap>, kube::Error> {
    match self.get(name).await {
      Ok(cm) => Ok(Some(cm)),
      Err(kube::Error::Api(ErrorResponse { code: 404, .. })) => Ok(None),
      Err(e) => Err(e),
    }
  }

  async fn create_config_map(&self, cm: &ConfigMap) -> Result<ConfigMap, kube::Error> {
    self.create(&PostParams::default(), cm).await
  }

  async fn replace_config_map(&self, name: &str, cm: &ConfigMap) -> Result<ConfigMap, kube::Error> {
    self.replace(name, &PostParams::default(), cm).await
  }
}

/// Api for the namespace holding the auth ConfigMap.
pub fn api(client: Client) -> Api<ConfigMap> {
  Api::namespaced(client, OBJECT_NAMESPACE)
}

/// Metadata for a new auth ConfigMap.
pub fn object_meta() -> ObjectMeta {
  ObjectMeta {
    name: Some(OBJECT_NAME.to_string()),
    namespace: Some(OBJECT_NAMESPACE.to_string()),
    ..ObjectMeta::default()
  }
}

/// The auth ConfigMap (aws-auth), which maps IAM entities to Kubernetes
/// users and groups.
///
/// Mutations decode the stored lists, change them, and write back only the
/// keys they touched. Nothing reaches the cluster until [`AuthConfigMap::save`].
#[derive(Debug, Clone)]
pub struct AuthConfigMap {
  cm: ConfigMap,
}

impl AuthConfigMap {
  /// Wraps a fetched ConfigMap, or starts a new one if there is none.
  pub fn new(cm: Option<ConfigMap>) -> Self {
    let mut cm = cm.unwrap_or_else(|| ConfigMap {
      metadata: object_meta(),
      ..ConfigMap::default()
    });
    cm.data.get_or_insert_with(Default::default);
    AuthConfigMap { cm }
  }

  /// Fetches the auth ConfigMap. It is fine for it not to exist.
  pub async fn fetch<C: ConfigMapClient>(client: &C) -> Result<Self> {
    let cm = client.get_config_map(OBJECT_NAME).await.map_err(Error::Fetch)?;
    debug!("aws-auth = {:?}", cm);
    Ok(AuthConfigMap::new(cm))
  }

  pub fn config_map(&self) -> &ConfigMap {
    &self.cm
  }

  /// Whether the ConfigMap already exists in the cluster.
  pub fn is_created(&self) -> bool {
    self.cm.metadata.uid.as_deref().map_or(false, |uid| !uid.is_empty())
  }

  pub fn snapshot(&self) -> Result<MappingSnapshot> {
    MappingSnapshot::decode(self.cm.data.as_ref().unwrap_or(&Default::default()))
  }

  /// IAM users and roles in the ConfigMap, roles first.
  pub fn identities(&self) -> Result<Vec<MapIdentity>> {
    Ok(self.snapshot()?.identities().to_vec())
  }

  /// Identities for `arn` only, if given. Fails when a filter matches nothing.
  pub fn lookup(&self, arn: Option<&Arn>) -> Result<Vec<MapIdentity>> {
    Ok(self.snapshot()?.lookup(arn)?.into_iter().cloned().collect())
  }

  /// Maps an IAM role or user to a Kubernetes username and groups. For a
  /// nodegroup instance role use the defaults in [`crate::nodegroup`].
  pub fn add_identity(self, identity: MapIdentity) -> Result<Self> {
    let snapshot = self.snapshot()?.add_identity(identity);
    self.set_identities(&snapshot)
  }

  /// Removes the first identity for `arn`, failing if there is none. With
  /// `all` set, removes every identity for `arn` and tolerates there being none.
  pub fn remove_identity(self, arn: &Arn, all: bool) -> Result<Self> {
    let snapshot = self.snapshot()?.remove_identity(arn, all)?;
    self.set_identities(&snapshot)
  }

  /// Adds an IAM account to `mapAccounts`, deduplicating and sorting.
  pub fn add_account(self, account: &str) -> Result<Self> {
    let snapshot = self.snapshot()?.add_account(account);
    self.set_accounts(&snapshot)
  }

  pub fn remove_account(self, account: &str) -> Result<Self> {
    let snapshot = self.snapshot()?.remove_account(account)?;
    self.set_accounts(&snapshot)
  }

  fn set_identities(mut self, snapshot: &MappingSnapshot) -> Result<Self> {
    let (roles, users) = snapshot.encode_identities()?;
    let data = self.cm.data.get_or_insert_with(Default::default);
    data.insert(ROLES_DATA.to_string(), roles);
    data.insert(USERS_DATA.to_string(), users);
    Ok(self)
  }

  fn set_accounts(mut self, snapshot: &MappingSnapshot) -> Result<Self> {
    let accounts = snapshot.encode_accounts()?;
    self
      .cm
      .data
      .get_or_insert_with(Default::default)
      .insert(ACCOUNTS_DATA.to_string(), accounts);
    Ok(self)
  }

  /// Persists the ConfigMap, creating it when it has no UID yet and
  /// replacing it otherwise. A replace carries the fetched resourceVersion,
  /// so a concurrent change is rejected by the API server rather than
  /// merged; that rejection is returned as is.
  pub async fn save<C: ConfigMapClient>(self, client: &C) -> Result<Self> {
    let cm = if self.is_created() {
      debug!("updating auth ConfigMap {:?}", self.cm.metadata.resource_version);
      client
        .replace_config_map(OBJECT_NAME, &self.cm)
        .await
        .map_err(Error::Update)?
    } else {
      debug!("creating auth ConfigMap");
      client.create_config_map(&self.cm).await.map_err(Error::Create)?
    };
    Ok(AuthConfigMap::new(Some(cm)))
  }
}
