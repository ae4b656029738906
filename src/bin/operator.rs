use futures_util::StreamExt;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{
  api::{Api, ListParams},
  runtime::{
    controller::{self, Action, Controller},
    finalizer,
  },
  Client, ResourceExt,
};
use log::{debug, error, info};
use std::{sync::Arc, time::Duration};
use thiserror::Error;

use aws_auth::{config, store, AuthConfigMap, MapRole};

#[derive(Debug, Error)]
enum AppError {
  #[error("auth ConfigMap error: {0}")]
  Store(#[from] aws_auth::Error),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  env_logger::init();

  let client = config::client().await?;
  let crd = Api::<MapRole>::all(client.clone());

  Controller::new(crd, ListParams::default())
    .run(
      reconcile,
      |_, _| Action::requeue(Duration::from_secs(60)),
      Arc::new(client),
    )
    .for_each(|res| async move {
      match res {
        Ok(o) => {
          info!("Reconciled {:?}", o);
        }
        Err(controller::Error::ObjectNotFound(or)) => {
          info!("Object not found: {:?}", or);
        }
        Err(e) => {
          error!("Reconcile failed: {:?}", e);
        }
      }
    })
    .await;

  Ok(())
}

async fn reconcile(maprole: Arc<MapRole>, client: Arc<Client>) -> Result<Action, finalizer::Error<AppError>> {
  debug!("Reconcile for: {:?}", &maprole);

  let namespace = maprole.namespace().unwrap_or_else(|| "default".to_string());
  let mr_api = Api::<MapRole>::namespaced(client.as_ref().clone(), &namespace);
  let sys_api = store::api(client.as_ref().clone());
  finalizer::finalizer(&mr_api, "aws-auth-operator.controlant.com", maprole, |ev| async {
    match ev {
      finalizer::Event::Apply(mr) => apply(mr, &sys_api).await,
      finalizer::Event::Cleanup(mr) => cleanup(mr, &sys_api).await,
    }
  })
  .await
}

async fn apply(mr: Arc<MapRole>, api: &Api<ConfigMap>) -> Result<Action, AppError> {
  let desired = mr.spec.to_identity()?;
  let acm = AuthConfigMap::fetch(api).await?;

  let current = acm.snapshot()?;
  let existing = current.matching(&desired.arn.to_string());
  if existing.len() == 1 && existing[0] == &desired {
    return Ok(Action::requeue(Duration::from_secs(60)));
  }

  // replace whatever is stored for this ARN with exactly the desired entry
  let arn = desired.arn.clone();
  acm.remove_identity(&arn, true)?.add_identity(desired)?.save(api).await?;

  Ok(Action::requeue(Duration::from_secs(300)))
}

async fn cleanup(mr: Arc<MapRole>, api: &Api<ConfigMap>) -> Result<Action, AppError> {
  let arn = match mr.spec.mapped_arn() {
    Some(arn) => arn,
    None => {
      info!("No mapping to remove for {:?}", mr.spec.rolearn);
      return Ok(Action::await_change());
    }
  };
  let acm = AuthConfigMap::fetch(api).await?;

  if !acm.snapshot()?.matching(&arn.to_string()).is_empty() {
    acm.remove_identity(&arn, true)?.save(api).await?;
  }

  Ok(Action::await_change())
}
