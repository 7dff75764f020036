// # cPanel HTTP Client
//
// This crate provides the HTTP implementation of `CpanelApi` for both cPanel
// JSON interfaces (UAPI and API2).
//
// ## Behavior
//
// - ✅ Exactly one GET per submitted call
// - ✅ `Authorization: cpanel <user>:<token>` on every request
// - ✅ Per-request timeout (default 30 seconds)
// - ✅ Optional TLS verification bypass for self-signed hosts
// - ✅ Status mapping: 401/403 become `ApiRejected`; other non-2xx bodies are
//   still interpreted so cPanel's own reason survives
// - ❌ NO retry or backoff (a failed call is surfaced immediately)
// - ❌ NO caching between calls
//
// ## Security Requirements
//
// - API token NEVER appears in logs, error messages, or Debug output
// - The token only travels in the Authorization header, never in the URL
//
// ## API Reference
//
// - UAPI: GET `/execute/<Module>/<function>?<params>`
// - API2: GET `/json-api/cpanel?cpanel_jsonapi_user=..&cpanel_jsonapi_apiversion=2&cpanel_jsonapi_module=..&cpanel_jsonapi_func=..&<params>`

use async_trait::async_trait;
use cpanel_core::api::ApiCall;
use cpanel_core::config::ConnectionConfig;
use cpanel_core::traits::CpanelApi;
use cpanel_core::{Error, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;

/// Reason reported when the host refuses the credentials
pub const AUTHENTICATION_FAILED: &str = "authentication failed";

/// HTTP client for one cPanel account
///
/// Cheap to share: wrap it in an `Arc` and hand it to every resource.
/// Nothing inside changes after construction.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct CpanelClient {
    /// Validated connection settings
    /// ⚠️ Holds the API token; NEVER log this value
    config: ConnectionConfig,

    /// `https://host:port`, or a test server URL
    base_url: String,

    /// HTTP client for API requests
    http: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CpanelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpanelClient")
            .field("base_url", &self.base_url)
            .field("username", &self.config.username)
            .field("api_token", &"<REDACTED>")
            .field("insecure", &self.config.insecure())
            .finish()
    }
}

impl CpanelClient {
    /// Create a client without contacting the host
    ///
    /// # Errors
    ///
    /// - `Error::Config`: The configuration is incomplete or the HTTP client
    ///   could not be built
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.insecure())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        if config.insecure() {
            tracing::warn!(
                "TLS certificate verification is disabled for {}",
                config.host
            );
        }

        Ok(Self {
            base_url: config.base_url(),
            config,
            http,
        })
    }

    /// Create a client and verify the credentials with a harmless read
    ///
    /// Any failure here aborts before a resource operation is attempted.
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.verify().await?;

        tracing::info!(
            "Connected to {} as {}",
            client.base_url,
            client.config.username
        );
        Ok(client)
    }

    /// Point the client at a different base URL
    ///
    /// Exists for tests that run against a local mock server.
    #[doc(hidden)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, call: &ApiCall) -> Result<reqwest::Url> {
        let pairs = call.query_pairs(&self.config.username)?;

        let mut url = reqwest::Url::parse(&format!("{}{}", self.base_url, call.path()))
            .map_err(|e| Error::config(format!("Invalid cPanel URL {}: {e}", self.base_url)))?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(&pairs);
        }
        Ok(url)
    }
}

#[async_trait]
impl CpanelApi for CpanelClient {
    async fn submit(&self, call: &ApiCall) -> Result<Value> {
        let url = self.url_for(call)?;
        tracing::debug!("{} {} -> {}", call.dialect(), call, url.path());

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, self.config.authorization())
            .send()
            .await
            .map_err(|e| Error::transport(format!("{call}: {}", e.without_url())))?;

        let status = response.status();
        if matches!(status.as_u16(), 401 | 403) {
            return Err(Error::rejected(call.to_string(), AUTHENTICATION_FAILED));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("{call}: failed to read body: {}", e.without_url())))?;

        if status.is_success() {
            return call.interpret(&body);
        }

        // Error statuses still carry the dialect envelope when cPanel itself answered
        match call.interpret(&body) {
            Ok(_) => Err(Error::rejected(
                call.to_string(),
                format!("HTTP {}", status.as_u16()),
            )),
            Err(Error::MalformedResponse(detail)) => Err(Error::malformed(format!(
                "HTTP {}: {detail}",
                status.as_u16()
            ))),
            Err(e) => Err(e),
        }
    }
}
