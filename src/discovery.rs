//! §6 External Interfaces: the browser discovery HTTP endpoint
//! (`/json/version`, `/json/new`, `/json/list`) used to obtain the
//! browser-level WebSocket URL and to open new targets when the `Target`
//! domain path isn't available.

use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub target_type: String,
    pub url: String,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub web_socket_debugger_url: Option<String>,
}

pub struct Discovery {
    http: reqwest::Client,
    base_url: String,
}

impl Discovery {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn version(&self) -> Result<VersionInfo> {
        let resp = self
            .http
            .get(format!("{}/json/version", self.base_url))
            .send()
            .await
            .map_err(|e| crate::error::CdpError::msg(e.to_string()))?;
        Ok(resp
            .json()
            .await
            .map_err(|e| crate::error::CdpError::msg(e.to_string()))?)
    }

    pub async fn list(&self) -> Result<Vec<TargetDescriptor>> {
        let resp = self
            .http
            .get(format!("{}/json/list", self.base_url))
            .send()
            .await
            .map_err(|e| crate::error::CdpError::msg(e.to_string()))?;
        Ok(resp
            .json()
            .await
            .map_err(|e| crate::error::CdpError::msg(e.to_string()))?)
    }

    pub async fn new_tab(&self, url: &str) -> Result<TargetDescriptor> {
        let resp = self
            .http
            .put(format!("{}/json/new?{}", self.base_url, url))
            .send()
            .await
            .map_err(|e| crate::error::CdpError::msg(e.to_string()))?;
        Ok(resp
            .json()
            .await
            .map_err(|e| crate::error::CdpError::msg(e.to_string()))?)
    }
}
