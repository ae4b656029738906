use anyhow::{bail, Context as _};
use kube::{config::KubeConfigOptions, Client};
use std::convert::TryFrom;

/// Env var naming a kubeconfig context, used when no default client can be made.
pub const KUBE_CONTEXT_ENV: &str = "KUBE_CTX";

/// Connects with the in-cluster or default kubeconfig, falling back to the
/// context in `KUBE_CTX`, which is what Terraform sets.
pub async fn client() -> anyhow::Result<Client> {
  match Client::try_default().await {
    Ok(c) => Ok(c),
    _ => match std::env::var(KUBE_CONTEXT_ENV) {
      Ok(ctx) => Client::try_from(
        kube::Config::from_kubeconfig(&KubeConfigOptions {
          context: Some(ctx),
          ..KubeConfigOptions::default()
        })
        .await?,
      )
      .context("Failed to load KUBE_CTX context"),

      _ => bail!("Failed to create client"),
    },
  }
}
