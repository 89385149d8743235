use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::ResultsStore;
use crate::error::StoreError;
use crate::results::Snapshot;

/// Client for a results store exposed over HTTP (`/api/resultados`).
///
/// The base URL is fixed at construction; build a second client to talk to
/// another server.
#[derive(Clone)]
pub struct RemoteStore {
    http: Client,
    endpoint: Url,
}

/// Body of a POST reply, and of a failed GET.
#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    sucesso: Option<bool>,
    #[serde(default)]
    erro: Option<String>,
}

impl RemoteStore {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url).with_context(|| format!("Invalid store URL: {}", base_url))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("api/resultados")
            .context("Failed to build results endpoint URL")?;
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(RemoteStore { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ResultsStore for RemoteStore {
    async fn get(&self) -> Result<Snapshot, StoreError> {
        debug!("Fetching snapshot: {}", self.endpoint);
        let resp = self.http.get(self.endpoint.clone()).send().await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(StoreError::Unavailable(error_message(status, &body)));
        }
        Snapshot::from_json(&body)
    }

    async fn put(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&snapshot)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(StoreError::Unavailable(error_message(status, &body)));
        }
        match serde_json::from_slice::<Reply>(&body) {
            Ok(Reply { sucesso: Some(true), .. }) => {
                info!(
                    "Published {} results to {}",
                    snapshot.resultados.len(),
                    self.endpoint
                );
                Ok(())
            }
            Ok(reply) => Err(StoreError::Unavailable(
                reply.erro.unwrap_or_else(|| "store did not confirm the write".into()),
            )),
            Err(e) => Err(StoreError::Unavailable(format!(
                "unexpected reply from store: {}",
                e
            ))),
        }
    }

    fn name(&self) -> &str {
        "remote"
    }
}

fn error_message(status: reqwest::StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<Reply>(body) {
        Ok(Reply { erro: Some(erro), .. }) => format!("{}: {}", status, erro),
        _ => format!("{}: {}", status, String::from_utf8_lossy(body)),
    }
}
