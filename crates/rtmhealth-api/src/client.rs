// Controller HTTP client
//
// Wraps `reqwest::Client` with token-header injection, tenant-scoped URL
// construction, and status/body handling. Endpoint groups (auth,
// directory, flows) are implemented as inherent methods in separate files
// to keep this module focused on transport mechanics.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

const AUTH_HEADER: &str = "x-auth-token";

/// A non-error HTTP response: the status line plus the raw body.
pub(crate) struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP client for the controller API.
///
/// Every request carries the `X-Auth-Token` header. Tenant-scoped
/// endpoints require a prior successful
/// [`authenticate()`](Self::authenticate), which records the tenant id.
pub struct ControllerClient {
    http: reqwest::Client,
    base_url: Url,
    tenant_id: Option<String>,
}

impl ControllerClient {
    /// Create a client that authenticates with `token`.
    ///
    /// `base_url` is the controller root, e.g.
    /// `https://api.elcapitan.cloudgenix.com`.
    pub fn new(
        base_url: Url,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut value = HeaderValue::from_str(token.expose_secret()).map_err(|_| {
            Error::Authentication {
                message: "token contains characters not allowed in an HTTP header".into(),
            }
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTH_HEADER, value);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for whatever auth headers the controller
    /// expects. Used by tests against a mock server.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            tenant_id: None,
        }
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The tenant this client is bound to, once authenticated.
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub(crate) fn set_tenant_id(&mut self, tenant_id: String) {
        self.tenant_id = Some(tenant_id);
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/{version}/api/{path}` for controller-level endpoints.
    pub(crate) fn api_url(&self, version: &str, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{version}/api/{path}"))?)
    }

    /// `{base}/{version}/api/tenants/{tenant}/{path}` for tenant-scoped endpoints.
    pub(crate) fn tenant_url(&self, version: &str, path: &str) -> Result<Url, Error> {
        let tenant = self.tenant_id.as_deref().ok_or(Error::NotAuthenticated)?;
        self.api_url(version, &format!("tenants/{tenant}/{path}"))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let raw = Self::check_status(resp).await?;
        decode(&raw.body)
    }

    /// Send a POST request with a JSON body, returning the raw response.
    ///
    /// Callers decide how to decode: the flow endpoint needs the HTTP
    /// status alongside the payload.
    pub(crate) async fn post_raw(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<RawResponse, Error> {
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::check_status(resp).await
    }

    /// Map 401/403 to `Authentication` and other non-2xx to `Api`.
    async fn check_status(resp: reqwest::Response) -> Result<RawResponse, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("controller rejected the token (HTTP {status}): {body}"),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Decode a JSON body, keeping a preview of the payload on failure.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}
