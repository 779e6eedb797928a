use std::time::Duration;

use async_std::future::timeout;
use async_trait::async_trait;
use core_types::{CapabilityId, TechnologyId};
use serde::Deserialize;
use surf::{Client, RequestBuilder, StatusCode, Url, http::Method};

use crate::{GatewayError, ops::CapabilityResourceOps};

pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

#[derive(Debug, Clone)]
pub struct CapabilityClientConfig {
    /// Base URL of the capability service, for example `http://capability:8080`
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: String,
    /// Upper bound for a single request including reading the response body
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct TechnologyRef {
    id: TechnologyId,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

/// HTTP implementation of [`CapabilityResourceOps`].
pub struct HttpCapabilityClient {
    client: Client,
    base_url: Url,
    token: String,
    timeout: Duration,
}

impl std::fmt::Debug for HttpCapabilityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCapabilityClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpCapabilityClient {
    pub fn new(config: CapabilityClientConfig) -> Result<Self, GatewayError> {
        // without the trailing slash Url::join would replace the last path segment
        let mut base_url = config.base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url).map_err(|e| {
            GatewayError::Rejected(format!(
                "Invalid capability service URL {}: {}",
                config.base_url, e
            ))
        })?;

        Ok(Self {
            client: Client::new(),
            base_url,
            token: config.token,
            timeout: config.timeout,
        })
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        trace_id: &str,
    ) -> Result<String, GatewayError> {
        let url = self.base_url.join(path).map_err(|e| {
            GatewayError::Rejected(format!("Invalid request path {}: {}", path, e))
        })?;
        let request = RequestBuilder::new(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header(TRACE_ID_HEADER, trace_id)
            .build();

        tracing::debug!(trace_id, "{} {}", method, path);

        let exchange = async {
            let mut response = self.client.send(request).await?;
            let body = response.body_string().await?;
            Ok::<_, surf::Error>((response.status(), body))
        };

        let (status, body) = match timeout(self.timeout, exchange).await {
            Err(_) => {
                tracing::warn!(trace_id, "{} {} timed out", method, path);
                return Err(GatewayError::Unreachable(format!(
                    "{} {} timed out after {} ms",
                    method,
                    path,
                    self.timeout.as_millis()
                )));
            }
            Ok(Err(e)) => {
                tracing::warn!(trace_id, "{} {} failed: {}", method, path, e);
                return Err(GatewayError::Unreachable(format!(
                    "{} {} failed: {}",
                    method, path, e
                )));
            }
            Ok(Ok(exchange)) => exchange,
        };

        classify_response(status, &body, &format!("{} {}", method, path))?;
        Ok(body)
    }
}

/// Maps a response status to the gateway error taxonomy.
///
/// 404 is `NotFound`; timeouts, throttling and server errors are `Unreachable`; any other
/// non-success status is a `Rejected` business rule violation.
pub fn classify_response(
    status: StatusCode,
    body: &str,
    operation: &str,
) -> Result<(), GatewayError> {
    if status.is_success() {
        return Ok(());
    }

    if status == StatusCode::NotFound {
        return Err(GatewayError::NotFound(operation.to_string()));
    }

    if status.is_server_error()
        || status == StatusCode::RequestTimeout
        || status == StatusCode::TooManyRequests
    {
        return Err(GatewayError::Unreachable(format!(
            "{} returned {}",
            operation, status
        )));
    }

    Err(GatewayError::Rejected(rejection_reason(status, body)))
}

fn rejection_reason(status: StatusCode, body: &str) -> String {
    if let Ok(ErrorResponse {
        message: Some(message),
    }) = serde_json::from_str::<ErrorResponse>(body)
    {
        return message;
    }
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}

fn parse_technology_ids(body: &str) -> Result<Vec<TechnologyId>, GatewayError> {
    let technologies: Vec<TechnologyRef> = serde_json::from_str(body).map_err(|e| {
        GatewayError::Unreachable(format!("Failed to decode technology list: {}", e))
    })?;
    Ok(technologies.into_iter().map(|t| t.id).collect())
}

fn parse_count(body: &str) -> Result<i64, GatewayError> {
    let response: CountResponse = serde_json::from_str(body).map_err(|e| {
        GatewayError::Unreachable(format!("Failed to decode usage count: {}", e))
    })?;
    Ok(response.count)
}

#[async_trait]
impl CapabilityResourceOps for HttpCapabilityClient {
    async fn technology_ids_of(
        &self,
        capability_id: CapabilityId,
        trace_id: &str,
    ) -> Result<Vec<TechnologyId>, GatewayError> {
        let path = format!("api/v1/capabilities/{}/technologies", capability_id);
        let body = self.execute(Method::Get, &path, trace_id).await?;
        parse_technology_ids(&body)
    }

    async fn technology_usage_count(
        &self,
        technology_id: TechnologyId,
        trace_id: &str,
    ) -> Result<i64, GatewayError> {
        let path = format!("api/v1/technologies/{}/capabilities/count", technology_id);
        let body = self.execute(Method::Get, &path, trace_id).await?;
        parse_count(&body)
    }

    async fn delete_capability(
        &self,
        capability_id: CapabilityId,
        trace_id: &str,
    ) -> Result<(), GatewayError> {
        let path = format!("api/v1/capabilities/{}", capability_id);
        self.execute(Method::Delete, &path, trace_id).await?;
        Ok(())
    }

    async fn delete_technology(
        &self,
        technology_id: TechnologyId,
        trace_id: &str,
    ) -> Result<(), GatewayError> {
        let path = format!("api/v1/technologies/{}", technology_id);
        self.execute(Method::Delete, &path, trace_id).await?;
        Ok(())
    }
}
