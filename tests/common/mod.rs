use async_trait::async_trait;
use aws_auth::ConfigMapClient;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::error::ErrorResponse;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Mutex,
};

/// Single-object stand-in for the API server. Assigns a UID on create and
/// bumps the resourceVersion on every write, rejecting stale replaces.
#[derive(Default)]
pub struct FakeConfigMaps {
  stored: Mutex<Option<ConfigMap>>,
  version: AtomicUsize,
  creates: AtomicUsize,
  replaces: AtomicUsize,
}

impl FakeConfigMaps {
  pub fn stored(&self) -> Option<ConfigMap> {
    self.stored.lock().unwrap().clone()
  }

  /// Simulates a write by another client.
  pub fn touch(&self) {
    if let Some(cm) = self.stored.lock().unwrap().as_mut() {
      cm.metadata.resource_version = Some(self.next_version());
    }
  }

  pub fn creates(&self) -> usize {
    self.creates.load(Ordering::SeqCst)
  }

  pub fn replaces(&self) -> usize {
    self.replaces.load(Ordering::SeqCst)
  }

  fn next_version(&self) -> String {
    (self.version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
  }
}

pub fn api_error(code: u16, reason: &str) -> kube::Error {
  kube::Error::Api(ErrorResponse {
    status: "Failure".to_string(),
    message: format!("configmaps \"aws-auth\": {}", reason),
    reason: reason.to_string(),
    code,
  })
}

#[async_trait]
impl ConfigMapClient for FakeConfigMaps {
  async fn get_config_map(&self, _name: &str) -> Result<Option<ConfigMap>, kube::Error> {
    Ok(self.stored())
  }

  async fn create_config_map(&self, cm: &ConfigMap) -> Result<ConfigMap, kube::Error> {
    let mut stored = self.stored.lock().unwrap();
    if stored.is_some() {
      return Err(api_error(409, "AlreadyExists"));
    }
    let mut cm = cm.clone();
    cm.metadata.uid = Some("0b5c7c4e-aws-auth".to_string());
    cm.metadata.resource_version = Some(self.next_version());
    *stored = Some(cm.clone());
    self.creates.fetch_add(1, Ordering::SeqCst);
    Ok(cm)
  }

  async fn replace_config_map(&self, _name: &str, cm: &ConfigMap) -> Result<ConfigMap, kube::Error> {
    let mut stored = self.stored.lock().unwrap();
    let current = stored.as_ref().ok_or_else(|| api_error(404, "NotFound"))?;
    if current.metadata.resource_version != cm.metadata.resource_version {
      return Err(api_error(409, "Conflict"));
    }
    let mut cm = cm.clone();
    cm.metadata.resource_version = Some(self.next_version());
    *stored = Some(cm.clone());
    self.replaces.fetch_add(1, Ordering::SeqCst);
    Ok(cm)
  }
}
