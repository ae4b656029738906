use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed ARN {0:?}: expected at least six colon-separated segments")]
  MalformedArn(String),
  #[error("ARN {arn:?} has resource type {resource_type:?}, expected \"role\" or \"user\"")]
  UnclassifiedArn { arn: String, resource_type: String },
  #[error("identity mapping has neither rolearn nor userarn")]
  MissingArn,

  #[error("unmarshalling {key:?}: {source}")]
  Decode {
    key: &'static str,
    #[source]
    source: serde_yaml::Error,
  },
  #[error("marshalling {key:?}: {source}")]
  Encode {
    key: &'static str,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("instance identity ARN {0:?} not found in auth ConfigMap")]
  IdentityNotFound(String),
  #[error("account {0:?} not found in auth ConfigMap")]
  AccountNotFound(String),
  #[error("no iamidentitymapping with arn {0:?} found")]
  NoMatchingIdentity(String),
  #[error("nodegroup instance role ARN is not set")]
  MissingInstanceRoleArn,

  #[error("getting auth ConfigMap: {0}")]
  Fetch(#[source] kube::Error),
  #[error("creating auth ConfigMap: {0}")]
  Create(#[source] kube::Error),
  #[error("updating auth ConfigMap: {0}")]
  Update(#[source] kube::Error),
}
