pub mod diagnostics;
pub mod http_gateway;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::app::FetchError;
use crate::domain::QueryParams;

pub use diagnostics::{Diagnostics, ErrorReport, TracingDiagnostics};
pub use http_gateway::HttpGateway;

/// Issues GET requests against the news API.
///
/// Implementations make a single attempt per call and do no caching.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn get_bytes(&self, path: &str, params: &QueryParams) -> Result<Vec<u8>, FetchError>;
}

impl dyn Gateway {
    /// Fetches `path` and decodes the JSON body into `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<T, FetchError> {
        let body = self.get_bytes(path, params).await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}
