// HTTP transport for the streaming generateContent endpoint.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::config::Settings;
use crate::error::Error;
use crate::wire::GenerateRequest;

/// Client for one model's `streamGenerateContent` endpoint.
pub struct ChatClient {
    api_key: SecretString,
    base_url: String,
    model: String,
    http_client: reqwest::Client,
    stream_read_timeout: Duration,
}

impl ChatClient {
    /// Build from settings, wiring the connect and total-request timeouts
    /// into the underlying HTTP client.
    pub fn new(settings: &Settings) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs_f64(settings.timeout.connect))
            .timeout(Duration::from_secs_f64(settings.timeout.request))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            http_client,
            stream_read_timeout: Duration::from_secs_f64(settings.timeout.stream_read),
        }
    }

    /// Per-chunk read timeout for consuming the response body.
    pub fn stream_read_timeout(&self) -> Duration {
        self.stream_read_timeout
    }

    /// URL for the streaming request, without the key query parameter.
    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent",
            self.base_url, self.model
        )
    }

    /// POST the request and hand back the response with its body unread.
    ///
    /// Connection failures are Network errors. A non-success status is
    /// surfaced as an error carrying the code and its reason phrase; the
    /// body is not parsed in that case.
    pub async fn stream_generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<reqwest::Response, Error> {
        let response = self
            .http_client
            .post(self.stream_url())
            .query(&[("alt", "sse"), ("key", self.api_key.expose_secret())])
            .header("content-type", "application/json; charset=utf-8")
            .json(request)
            .send()
            .await
            .map_err(|e| Error::network(format!("HTTP request failed: {e}"), e))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(Error::from_http_status(status));
        }
        Ok(response)
    }
}
