//! Remote hook registry client

use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::error::{HookError, Result};
use crate::hook::HookKind;

/// Metadata the registry serves for one hook.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteHook {
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<HookKind>,
    #[serde(default)]
    pub description: Option<String>,
}

/// HTTP client for the hook registry.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    remote_url: String,
}

impl RegistryClient {
    pub fn new(remote_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            remote_url: remote_url.into(),
        }
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    /// Fetch metadata for a named hook.
    ///
    /// A registry answer with `exists != true` maps to
    /// [`HookError::RemoteLookupFailed`].
    pub async fn hook_details(&self, name: &str) -> Result<RemoteHook> {
        let url = format!("{}/api/hooks/{}.json", self.remote_url, name);
        let response = self
            .client
            .get(&url)
            .header("User-Agent", "hookpack")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HookError::RemoteLookupFailed {
                name: name.to_string(),
            });
        }

        let remote: RemoteHook = response.json().await?;
        if !remote.exists {
            return Err(HookError::RemoteLookupFailed {
                name: name.to_string(),
            });
        }
        Ok(remote)
    }

    /// Bump the registry's download counter. Best-effort: a failure is logged
    /// and never fails the surrounding install.
    pub async fn notify_download(&self, name: &str) {
        let url = format!("{}/downloads", self.remote_url);
        let result = self
            .client
            .post(&url)
            .header("User-Agent", "hookpack")
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await;
        if let Err(err) = result {
            warn!(name = %name, error = %err, "download notification failed");
        }
    }
}
