use std::time::Duration;

use async_trait::async_trait;
use courier_core::transport::{RemoteCall, RemoteResult, Transport, TransportError};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::BuildError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct HttpOptions {
    pub timeout: Duration,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub token: Option<SecretString>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            token: None,
        }
    }
}

/// Posts each call's request envelope to `<base_url>/invoke` and reads one result back.
///
/// A non-2xx response whose body is a failure result counts as a backend
/// rejection; any other non-2xx response is a [`TransportError::Status`].
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    token: Option<SecretString>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: &str, options: HttpOptions) -> Result<Self, BuildError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join("invoke")?;

        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(BuildError::Client)?;

        Ok(Self {
            client,
            endpoint,
            token: options.token,
            timeout: options.timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn map_send_error(&self, command: &str, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                command: command.to_string(),
                after: self.timeout,
            }
        } else {
            TransportError::Unavailable(format!("request to {} failed: {}", self.endpoint, e))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn invoke(&self, call: RemoteCall) -> Result<RemoteResult, TransportError> {
        tracing::debug!(call_id = %call.id(), command = call.command(), "POST {}", self.endpoint);

        let mut request = self.client.post(self.endpoint.clone()).json(&call);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_send_error(call.command(), e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(call.command(), e))?;

        if status.is_success() {
            return RemoteResult::from_slice(call.command(), &body);
        }

        if let Ok(failure @ RemoteResult::Failure { .. }) = RemoteResult::from_slice(call.command(), &body) {
            tracing::debug!("Backend answered '{}' with {} and a failure result", call.command(), status);
            return Ok(failure);
        }

        let body_text = String::from_utf8_lossy(&body);
        tracing::warn!("Backend answered '{}' with {}", call.command(), status);
        Err(TransportError::Status {
            status: status.as_u16(),
            body: body_text.chars().take(200).collect(),
        })
    }
}
