//! Connection diagnostics for the configured provider
//!
//! Reachability of the provider's endpoints and, where the provider offers
//! one, a key validation call. Used by the `status` command.

use super::LlmError;
use crate::config::{Config, ProviderKind};
use crate::utils::http::{
    create_client, map_transport_error, HeaderBuilder, SharedHttpConfig, ERROR_BODY_PREFIX,
};
use crate::utils::text::truncate;
use reqwest::Client;
use std::time::{Duration, Instant};

/// Per-request bound for every diagnostic call
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a plain GET against one endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum Reachability {
    /// Any HTTP response counts, whatever its status
    Reached { status: u16, elapsed: Duration },
    Unreachable { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointCheck {
    pub url: String,
    pub reachability: Reachability,
}

/// Result of asking the provider whether the key is accepted
#[derive(Debug, Clone, PartialEq)]
pub enum KeyCheck {
    Valid { details: serde_json::Value },
    Rejected { status: u16, message: String },
}

/// Diagnostic client for one provider
pub struct ConnectionDiagnostics {
    client: Client,
    provider: String,
    kind: ProviderKind,
    base_url: String,
}

impl ConnectionDiagnostics {
    pub fn new(provider: &str, kind: ProviderKind, base_url: &str) -> Result<Self, LlmError> {
        let http = SharedHttpConfig {
            timeout: PROBE_TIMEOUT,
            ..SharedHttpConfig::default()
        };
        Ok(Self {
            client: create_client(&http)?,
            provider: provider.to_string(),
            kind,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Diagnostics for the active provider
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let name = &config.active_provider;
        let kind = ProviderKind::for_provider(name, config.active_provider_config());
        Self::new(name, kind, &config.base_url_for(name))
    }

    /// Whether the provider exposes a key validation endpoint
    pub fn supports_key_validation(&self) -> bool {
        self.provider.eq_ignore_ascii_case("openrouter")
    }

    /// Host root, API base and completion endpoint, without duplicates
    pub fn endpoints(&self) -> Vec<String> {
        let completion = match self.kind {
            ProviderKind::OpenAiCompatible => format!("{}/chat/completions", self.base_url),
            ProviderKind::Gemini => format!("{}/models", self.base_url),
        };

        let mut endpoints = Vec::new();
        for url in [origin(&self.base_url).to_string(), self.base_url.clone(), completion] {
            if !endpoints.contains(&url) {
                endpoints.push(url);
            }
        }
        endpoints
    }

    /// GET one URL and time the response
    pub async fn check_endpoint(&self, url: &str) -> EndpointCheck {
        let started = Instant::now();
        let reachability = match self.client.get(url).send().await {
            Ok(response) => Reachability::Reached {
                status: response.status().as_u16(),
                elapsed: started.elapsed(),
            },
            Err(e) => Reachability::Unreachable {
                error: map_transport_error(e, PROBE_TIMEOUT).to_string(),
            },
        };
        EndpointCheck {
            url: url.to_string(),
            reachability,
        }
    }

    /// Check every endpoint in turn
    pub async fn check_endpoints(&self) -> Vec<EndpointCheck> {
        let mut checks = Vec::new();
        for url in self.endpoints() {
            checks.push(self.check_endpoint(&url).await);
        }
        checks
    }

    /// `GET {base}/auth/key` with the key as bearer token
    pub async fn validate_key(&self, api_key: &str) -> Result<KeyCheck, LlmError> {
        let headers = HeaderBuilder::new()
            .json_content_type()
            .bearer_auth(api_key)
            .map_err(|_| LlmError::MissingCredential {
                provider: self.provider.clone(),
            })?
            .build();

        let response = self
            .client
            .get(format!("{}/auth/key", self.base_url))
            .headers(headers)
            .send()
            .await
            .map_err(|e| map_transport_error(e, PROBE_TIMEOUT))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(LlmError::Network)?;
        if status != 200 {
            return Ok(KeyCheck::Rejected {
                status,
                message: truncate(body.trim(), ERROR_BODY_PREFIX),
            });
        }

        let details = serde_json::from_str(&body).map_err(|e| LlmError::InvalidResponse {
            message: format!("Key validation returned invalid JSON: {}", e),
        })?;
        Ok(KeyCheck::Valid { details })
    }
}

/// `scheme://host[:port]` part of a URL
fn origin(url: &str) -> &str {
    let host_start = url.find("://").map_or(0, |i| i + 3);
    match url[host_start..].find('/') {
        Some(i) => &url[..host_start + i],
        None => url,
    }
}
