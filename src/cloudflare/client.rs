use crate::cloudflare::requests::Request;
use crate::errors::{from_transport, ErrorKind, MeasurementError};
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, RequestBuilder};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

pub static BASE_URL: &str = "https://speed.cloudflare.com";

/// Timing of a single request against the speed test endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transfer {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    /// Time to the response headers.
    pub ttfb: Duration,
    /// Time until the whole body was read.
    pub total: Duration,
    /// Processing time the server reported in `server-timing`.
    pub server_time: Duration,
}

#[derive(Debug, Clone)]
pub struct Client {
    client: ReqwestClient,
    base_url: Url,
}

impl Client {
    pub fn new(
        base_url: Url,
        request_timeout: Duration,
    ) -> Result<Self, MeasurementError> {
        let client = ReqwestClient::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                MeasurementError::config(format!(
                    "Failed to build HTTP client: {}",
                    e
                ))
                .with_source(e)
            })?;

        Ok(Client { client, base_url: with_trailing_slash(base_url) })
    }

    /// Host name measurements run against.
    pub fn host(&self) -> String {
        match (self.base_url.host_str(), self.base_url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => "unknown".to_string(),
        }
    }

    /// Send a request and decode its JSON response.
    ///
    /// Failures are reported with `fallback` as their kind unless they are
    /// timeouts.
    pub async fn send<R: Request>(
        &self,
        request: R,
        fallback: ErrorKind,
    ) -> Result<R::Response, MeasurementError> {
        let context = format!("{} {}", R::METHOD, request.endpoint());

        let response = self
            .build(&request)?
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| from_transport(e, &context, fallback))?;

        response
            .json::<R::Response>()
            .await
            .map_err(|e| from_transport(e, &context, fallback))
    }

    /// Send a request, read the whole body and time it.
    pub async fn transfer<R: Request>(
        &self,
        request: &R,
    ) -> Result<Transfer, MeasurementError> {
        let context = format!("{} {}", R::METHOD, request.endpoint());
        let builder = self.build(request)?;

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                from_transport(e, &context, ErrorKind::ProbeFailure)
            })?;
        let ttfb = started.elapsed();
        let server_time = server_timing(response.headers());

        let body = response.bytes().await.map_err(|e| {
            from_transport(e, &context, ErrorKind::ProbeFailure)
        })?;
        let total = started.elapsed();

        Ok(Transfer {
            bytes_sent: request.body_len(),
            bytes_received: body.len() as u64,
            ttfb,
            total,
            server_time,
        })
    }

    fn build<R: Request>(
        &self,
        request: &R,
    ) -> Result<RequestBuilder, MeasurementError> {
        let endpoint = request.endpoint();
        let url =
            self.base_url.join(endpoint.trim_start_matches('/')).map_err(|e| {
                MeasurementError::config(format!(
                    "Invalid endpoint {}: {}",
                    endpoint, e
                ))
            })?;

        let builder =
            self.client.request(R::METHOD, url).headers(request.headers());

        Ok(match request.body() {
            Some(body) => builder.body(body),
            None => builder,
        })
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Server processing time from a `server-timing` header such as
/// `cfRequestDuration;dur=12.3`. Zero when absent or malformed.
pub fn server_timing(headers: &HeaderMap) -> Duration {
    headers
        .get_all("server-timing")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split([';', ',']))
        .filter_map(|part| part.trim().strip_prefix("dur="))
        .filter_map(|ms| ms.trim().parse::<f64>().ok())
        .find(|ms| ms.is_finite() && *ms >= 0.0)
        .map(|ms| Duration::from_secs_f64(ms / 1000.0))
        .unwrap_or_default()
}
