//! HTTP transport for the built-in providers.
//!
//! Maps HTTP status codes into the four-way failure classification; the
//! orchestrator never sees status codes or response bodies from failures.

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};

use switchboard_types::{AiRequest, ProviderId};

use super::{ProviderResponse, ProviderTransport, TransportError};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api";

/// How a provider expects its API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthStyle {
    /// `Authorization: Bearer <secret>`
    Bearer,
    /// Named request header carrying the bare key
    Header(&'static str),
}

/// reqwest-backed transport for one provider.
pub struct HttpTransport {
    client: Client,
    provider: ProviderId,
    base_url: String,
    auth: AuthStyle,
}

impl HttpTransport {
    /// Transport for a built-in provider, with an optional base URL override.
    pub fn for_provider(provider: ProviderId, base_url: Option<String>) -> Self {
        let (default_base, auth) = match provider {
            ProviderId::Gemini => (GEMINI_BASE_URL, AuthStyle::Header("x-goog-api-key")),
            ProviderId::Openrouter => (OPENROUTER_BASE_URL, AuthStyle::Bearer),
        };
        let base_url =
            base_url.unwrap_or_else(|| default_base.to_string()).trim_end_matches('/').to_string();

        Self { client: Client::new(), provider, base_url, auth }
    }

    fn request_url(&self, model: &str) -> String {
        match self.provider {
            ProviderId::Gemini => {
                format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
            },
            ProviderId::Openrouter => format!("{}/v1/chat/completions", self.base_url),
        }
    }

    fn probe_url(&self) -> String {
        match self.provider {
            ProviderId::Gemini => format!("{}/v1beta/models", self.base_url),
            ProviderId::Openrouter => format!("{}/v1/models", self.base_url),
        }
    }

    fn apply_auth(&self, builder: RequestBuilder, secret: &str) -> RequestBuilder {
        match self.auth {
            AuthStyle::Bearer => builder.header(header::AUTHORIZATION, format!("Bearer {secret}")),
            AuthStyle::Header(name) => builder.header(name, secret),
        }
    }

    async fn dispatch(
        &self,
        builder: RequestBuilder,
        started: Instant,
    ) -> Result<reqwest::Response, TransportError> {
        match builder.send().await {
            Ok(response) => Ok(response),
            Err(e) if e.is_timeout() => {
                Err(TransportError::Timeout { elapsed: started.elapsed() })
            },
            Err(e) => Err(TransportError::Unavailable { message: e.to_string() }),
        }
    }
}

fn parse_retry_after(headers: &header::HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn classify_status(status: StatusCode, retry_after: Option<Duration>) -> TransportError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => TransportError::RateLimited { retry_after },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TransportError::Auth { message: format!("upstream returned {}", status.as_u16()) }
        },
        StatusCode::REQUEST_TIMEOUT => TransportError::Timeout { elapsed: Duration::ZERO },
        _ => TransportError::Unavailable { message: format!("upstream returned {}", status.as_u16()) },
    }
}

#[async_trait]
impl ProviderTransport for HttpTransport {
    async fn send(
        &self,
        secret: &str,
        request: &AiRequest,
        timeout: Duration,
    ) -> Result<ProviderResponse, TransportError> {
        let url = self.request_url(&request.model);
        let started = Instant::now();
        let builder = self
            .apply_auth(self.client.post(&url).timeout(timeout), secret)
            .json(&request.payload);

        let response = self.dispatch(builder, started).await?;
        let status = response.status();
        if status.is_success() {
            let payload = response.json::<Value>().await.map_err(|e| {
                TransportError::Unavailable { message: format!("invalid response body: {e}") }
            })?;
            return Ok(ProviderResponse { payload });
        }

        let retry_after = parse_retry_after(response.headers());
        tracing::debug!(
            provider = %self.provider,
            status = status.as_u16(),
            "upstream returned error status"
        );
        Err(classify_status(status, retry_after))
    }

    async fn probe(&self, secret: &str, timeout: Duration) -> Result<(), TransportError> {
        let started = Instant::now();
        let builder = self.apply_auth(self.client.get(self.probe_url()).timeout(timeout), secret);
        let response = self.dispatch(builder, started).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let retry_after = parse_retry_after(response.headers());
        Err(classify_status(status, retry_after))
    }
}
