use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use tracing::debug;

use super::Transport;
use super::TransportError;
use super::TransportResponse;
use crate::request::CommandRequest;
use crate::request::Method;

/// Real HTTP transport implementation using reqwest
///
/// Sends each request exactly once. Non-2xx responses become
/// [`TransportError::Status`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(None)
    }

    /// Create a transport whose requests fail after `timeout`
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Post => reqwest::Method::POST,
        Method::Patch => reqwest::Method::PATCH,
    }
}

fn to_header_map(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = |reason: String| TransportError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: CommandRequest) -> Result<TransportResponse, TransportError> {
        let body = request.body.encode()?;
        let headers = to_header_map(&request.headers)?;

        debug!("Sending {} {}", request.method, request.url);
        let response = self
            .client
            .request(to_reqwest_method(request.method), &request.url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await?;
        debug!("{} {} returned {}", request.method, request.url, status);

        if !status.is_success() {
            return Err(TransportError::Status {
                method: request.method,
                url: request.url,
                status: status.as_u16(),
                body,
            });
        }

        Ok(TransportResponse {
            status: status.as_u16(),
            headers: response_headers,
            body,
        })
    }
}
