//! HTTP client for the pomf, catbox and litterbox upload APIs

use anyhow::{Context, Result};
use async_trait::async_trait;
use fatbox_core::{Destination, ForwardRequest, HostingEndpoints, UpstreamConfig};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::{Duration, Instant};
use tokio_util::io::ReaderStream;

use crate::forwarder::{ForwardError, Forwarder};
use crate::retry::RetryPolicy;

const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct PomfResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    files: Vec<PomfFile>,
}

#[derive(Debug, Deserialize)]
struct PomfFile {
    url: Option<String>,
}

/// Pull the first file URL out of a pomf response. The error is a short reason;
/// callers attach the raw body.
fn parse_pomf_response(body: &str) -> std::result::Result<String, String> {
    let parsed: PomfResponse =
        serde_json::from_str(body).map_err(|e| format!("invalid JSON response: {}", e))?;

    if !parsed.success {
        return Err("success flag was false".to_string());
    }

    parsed
        .files
        .into_iter()
        .next()
        .and_then(|f| f.url)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| "response did not contain a file URL".to_string())
}

/// Uploads files to the external hosts
///
/// The multipart form is rebuilt for every attempt and the file is streamed
/// from disk, so retries never hold the whole file in memory.
#[derive(Clone)]
pub struct HostingClient {
    http_client: Client,
    endpoints: HostingEndpoints,
    timeout: Duration,
    retry: RetryPolicy,
}

impl Debug for HostingClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("HostingClient")
            .field("endpoints", &self.endpoints)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl HostingClient {
    pub fn new(endpoints: HostingEndpoints, upstream: &UpstreamConfig) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(upstream.timeout))
            .build()
            .context("Failed to create HTTP client for hosting services")?;

        Ok(Self {
            http_client,
            endpoints,
            timeout: upstream.timeout,
            retry: RetryPolicy::from(upstream),
        })
    }

    fn endpoint(&self, destination: Destination) -> &str {
        match destination {
            Destination::Pomf => &self.endpoints.pomf_upload_url,
            Destination::Catbox => &self.endpoints.catbox_api_url,
            Destination::Litterbox => &self.endpoints.litterbox_api_url,
        }
    }

    async fn file_part(&self, request: &ForwardRequest) -> std::result::Result<Part, ForwardError> {
        let file_error = |source| ForwardError::File {
            path: request.path.clone(),
            source,
        };

        let file = tokio::fs::File::open(&request.path)
            .await
            .map_err(file_error)?;
        let length = file.metadata().await.map_err(file_error)?.len();
        let body = Body::wrap_stream(ReaderStream::new(file));

        Ok(Part::stream_with_length(body, length).file_name(request.display_name.clone()))
    }

    async fn build_form(&self, request: &ForwardRequest) -> std::result::Result<Form, ForwardError> {
        let part = self.file_part(request).await?;

        let destination = request.destination;
        let mut form = match destination {
            Destination::Pomf => Form::new().part("files[]", part),
            Destination::Catbox | Destination::Litterbox => Form::new()
                .text("reqtype", "fileupload")
                .part("fileToUpload", part),
        };

        if let Some(userhash) = request.userhash.as_ref().filter(|_| destination.accepts_userhash()) {
            form = form.text("userhash", userhash.clone());
        }
        if destination.accepts_time() {
            form = form.text("time", request.time.clone());
        }

        Ok(form)
    }

    /// One complete attempt: send the form and read the whole response.
    async fn attempt(&self, request: &ForwardRequest) -> std::result::Result<String, ForwardError> {
        let destination = request.destination;
        let transport = |source| ForwardError::Transport {
            destination,
            source,
        };

        let form = self.build_form(request).await?;
        let response = self
            .http_client
            .post(self.endpoint(destination))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            return Err(ForwardError::Status {
                destination,
                status: status.as_u16(),
                body,
            });
        }

        match destination {
            Destination::Pomf => parse_pomf_response(&body).map_err(|reason| {
                ForwardError::Rejected {
                    destination,
                    reason,
                    body,
                }
            }),
            Destination::Catbox | Destination::Litterbox => Ok(body),
        }
    }
}

#[async_trait]
impl Forwarder for HostingClient {
    async fn forward(&self, request: &ForwardRequest) -> std::result::Result<String, ForwardError> {
        let destination = request.destination;
        let start = Instant::now();

        tracing::debug!(
            destination = %destination,
            path = %request.path.display(),
            display_name = %request.display_name,
            "Forwarding file"
        );

        let result = self
            .retry
            .run(destination, |attempt| async move {
                match tokio::time::timeout(self.timeout, self.attempt(request)).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(
                            destination = %destination,
                            attempt = attempt,
                            timeout_secs = self.timeout.as_secs(),
                            "Upstream attempt timed out"
                        );
                        Err(ForwardError::Timeout {
                            destination,
                            timeout_secs: self.timeout.as_secs(),
                        })
                    }
                }
            })
            .await;

        match &result {
            Ok(_) => tracing::info!(
                destination = %destination,
                display_name = %request.display_name,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Upload forwarded"
            ),
            Err(e) => tracing::warn!(
                destination = %destination,
                error = %e,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Upload forwarding failed"
            ),
        }

        result
    }
}
