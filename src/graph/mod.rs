pub mod auth;
pub mod request;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::ConnectionConfig;
use auth::GraphAuth;
use request::{Method, RequestDescriptor};
use reqwest::Client;
use std::time::Duration;

/// Attempts per request when the service throttles with 429
const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// A rejected call: the HTTP status (absent for connection failures) and the raw body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub status: Option<u16>,
    pub body: String,
}

impl TransportError {
    pub fn new(status: Option<u16>, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Human readable reason: the translated error body, or the status when
    /// the service sent no body
    pub fn message(&self) -> String {
        match self.status {
            Some(status) if self.body.trim().is_empty() => {
                format!("Request failed with status code {}", status)
            }
            _ => crate::error::translate_odata_error(&self.body),
        }
    }
}

/// Issues one request and hands back the raw response body
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: &RequestDescriptor) -> std::result::Result<String, TransportError>;
}

/// How `HttpTransport` authorizes requests
pub enum Credentials {
    None,
    /// A fixed bearer token for every origin
    Bearer(String),
    /// Tokens acquired per origin for the signed-in connection
    Connection {
        auth: GraphAuth,
        connection: ConnectionConfig,
    },
}

impl Credentials {
    async fn token_for(&self, url: &str) -> crate::error::Result<Option<String>> {
        match self {
            Credentials::None => Ok(None),
            Credentials::Bearer(token) => Ok(Some(token.clone())),
            Credentials::Connection { auth, connection } => {
                let resource = resource_for(url)?;
                Ok(Some(auth.access_token(connection, &resource).await?))
            }
        }
    }
}

/// Origin of a URL, the resource a token has to be issued for
pub fn resource_for(url: &str) -> crate::error::Result<String> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| crate::error::M365Error::ConfigError(format!("Invalid URL {}: {}", url, e)))?;
    Ok(parsed.origin().ascii_serialization())
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    credentials: Credentials,
}

impl HttpTransport {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
        }
    }

    pub fn with_bearer(token: impl Into<String>) -> Self {
        Self::new(Credentials::Bearer(token.into()))
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> std::result::Result<String, TransportError> {
        let token = if request.anonymous {
            None
        } else {
            self.credentials
                .token_for(&request.url)
                .await
                .map_err(|e| TransportError::new(None, e.to_string()))?
        };

        let mut attempt = 1;
        loop {
            tracing::debug!("{} {}", request.method, request.url);

            let mut builder = match request.method {
                Method::Get => self.client.get(&request.url),
                Method::Post => self.client.post(&request.url),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(token) = &token {
                builder = builder.bearer_auth(token);
            }
            builder = match &request.body {
                Some(body) => builder.json(body),
                // SharePoint rejects body-less POSTs without a Content-Length
                None if request.method == Method::Post => builder.body(String::new()),
                None => builder,
            };

            let response = builder
                .send()
                .await
                .map_err(|e| TransportError::new(None, e.to_string()))?;
            let status = response.status();
            tracing::debug!("{} {} -> {}", request.method, request.url, status);

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS && attempt < MAX_ATTEMPTS {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

                tracing::warn!(
                    "Request throttled (429). Retrying in {} seconds... (attempt {}/{})",
                    retry_after,
                    attempt,
                    MAX_ATTEMPTS
                );
                tokio::time::sleep(Duration::from_secs(retry_after)).await;
                attempt += 1;
                continue;
            }

            let body = response
                .text()
                .await
                .map_err(|e| TransportError::new(Some(status.as_u16()), e.to_string()))?;

            if !status.is_success() {
                return Err(TransportError::new(Some(status.as_u16()), body));
            }

            return Ok(body);
        }
    }
}
