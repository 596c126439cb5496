//! HTTP client for the cluster API
//!
//! Provides a thin client that handles:
//! - Joining API paths onto the base URL
//! - JSON request bodies on GET and DELETE
//! - TLS verification modes and optional gzip
//! - Basic auth taken from the base URL credentials

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

// ============================================================================
// Transport contract
// ============================================================================

/// Raw response of a transport call
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response body, untouched
    pub body: Bytes,
}

impl Response {
    /// Create a response
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 200 OK
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }

    /// Body as (lossy) text, for error reporting
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body on 200 OK
    ///
    /// Any other status yields [`Error::HttpStatus`] carrying the raw body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if !self.is_ok() {
            return Err(Error::http_status(self.status, self.text()));
        }
        serde_json::from_slice(&self.body).map_err(|e| {
            Error::decode(format!("Failed to parse response body {}: {e}", self.text()))
        })
    }
}

/// Requests against the cluster, relative to its base URL
///
/// A non-200 status is a successful call returning that status. Only
/// transport-level problems are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request
    async fn get(&self, path: &str, body: Option<String>) -> Result<Response>;

    /// Issue a DELETE request
    async fn delete(&self, path: &str, body: Option<String>) -> Result<Response>;
}

// ============================================================================
// Configuration
// ============================================================================

/// How the server certificate is verified
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VerifyMode {
    /// System root certificates
    #[default]
    System,
    /// Skip all verification
    Insecure,
    /// System roots plus the PEM certificate(s) in this file
    CaFile(PathBuf),
}

impl VerifyMode {
    /// Parse the `--verify` flag value
    pub fn parse(value: &str) -> Self {
        match value {
            "" => Self::System,
            "no" => Self::Insecure,
            path => Self::CaFile(PathBuf::from(path)),
        }
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<Url>,
    /// Request timeout (none = wait forever)
    pub timeout: Option<Duration>,
    /// Accept gzip-compressed responses
    pub compression: bool,
    /// Certificate verification
    pub verify: VerifyMode,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: None,
            compression: true,
            verify: VerifyMode::System,
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: Url) -> Self {
        self.config.base_url = Some(url);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Enable or disable gzip
    pub fn compression(mut self, enabled: bool) -> Self {
        self.config.compression = enabled;
        self
    }

    /// Set certificate verification mode
    pub fn verify(mut self, verify: VerifyMode) -> Self {
        self.config.verify = verify;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

// ============================================================================
// Client
// ============================================================================

#[derive(Clone)]
struct BasicAuth {
    username: String,
    password: Option<String>,
}

/// reqwest-backed [`Transport`]
pub struct HttpClient {
    client: Client,
    base_url: Option<Url>,
    auth: Option<BasicAuth>,
    timeout: Option<Duration>,
}

impl HttpClient {
    /// Create a client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .min_tls_version(reqwest::tls::Version::TLS_1_2);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if !config.compression {
            builder = builder.no_gzip();
        }

        match &config.verify {
            VerifyMode::System => {}
            VerifyMode::Insecure => {
                info!("skipping TLS verification");
                builder = builder.danger_accept_invalid_certs(true);
            }
            VerifyMode::CaFile(path) => match std::fs::read(path) {
                Ok(pem) => {
                    for cert in reqwest::Certificate::from_pem_bundle(&pem)? {
                        builder = builder.add_root_certificate(cert);
                    }
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "unable to read CA cert");
                }
            },
        }

        let client = builder.build()?;

        let (base_url, auth) = match config.base_url {
            Some(url) => {
                let (url, auth) = split_credentials(url);
                (Some(url), auth)
            }
            None => (None, None),
        };

        Ok(Self {
            client,
            base_url,
            auth,
            timeout: config.timeout,
        })
    }

    /// Make a request and buffer the whole response body
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Response> {
        let full_url = self.build_url(path);
        let mut req = self.client.request(method.clone(), &full_url);

        if let Some(auth) = &self.auth {
            req = req.basic_auth(&auth.username, auth.password.as_deref());
        }
        if let Some(body) = body {
            req = req
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = req.send().await.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        debug!(%method, url = %full_url, status, bytes = body.len(), "request complete");
        Ok(Response { status, body })
    }

    fn classify(&self, e: reqwest::Error) -> Error {
        match (e.is_timeout(), self.timeout) {
            (true, Some(timeout)) => Error::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            },
            _ => Error::Http(e),
        }
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.base_url {
            Some(base) => {
                let base = base.as_str().trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, path: &str, body: Option<String>) -> Result<Response> {
        self.request(Method::GET, path, body).await
    }

    async fn delete(&self, path: &str, body: Option<String>) -> Result<Response> {
        self.request(Method::DELETE, path, body).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("has_auth", &self.auth.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Move URL userinfo into basic auth credentials
fn split_credentials(mut url: Url) -> (Url, Option<BasicAuth>) {
    if url.username().is_empty() {
        return (url, None);
    }
    let auth = BasicAuth {
        username: url.username().to_string(),
        password: url.password().map(str::to_string),
    };
    // Only fails for cannot-be-a-base URLs, which never carry credentials.
    let _ = url.set_username("");
    let _ = url.set_password(None);
    (url, Some(auth))
}

/// Resolve the base URL host and report whether every address is loopback
pub async fn is_loopback(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = url.port_or_known_default().unwrap_or(0);
    match tokio::net::lookup_host((host, port)).await {
        Ok(addrs) => {
            let addrs: Vec<_> = addrs.collect();
            !addrs.is_empty() && addrs.iter().all(|a| a.ip().is_loopback())
        }
        Err(_) => false,
    }
}
