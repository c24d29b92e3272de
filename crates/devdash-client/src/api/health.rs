//! Health API.

use crate::client::DevdashClient;
use crate::error::{Error, Result};

/// Health API client.
///
/// The health endpoint lives at the server root, outside `dashboard/api`,
/// and does not require authentication.
pub struct HealthApi {
    client: DevdashClient,
}

impl HealthApi {
    pub(crate) fn new(client: DevdashClient) -> Self {
        Self { client }
    }

    /// Check the backend liveness endpoint.
    pub async fn check(&self) -> Result<()> {
        let inner = self.client.inner();
        let url = inner.base_url.join("healthz").map_err(Error::from)?;

        let response = inner.http.get(url).timeout(inner.timeout).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Api {
                status: response.status().as_u16(),
                code: "health_check_failed".to_string(),
                message: "Health check failed".to_string(),
            })
        }
    }

    /// Simple connectivity check - returns true if the server is reachable.
    pub async fn is_healthy(&self) -> bool {
        self.check().await.is_ok()
    }
}
