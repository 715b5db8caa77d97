use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::app::{FetchError, Result};
use crate::gateway::{Diagnostics, ErrorReport, Gateway, TracingDiagnostics};
use crate::domain::QueryParams;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const API_KEY_PARAM: &str = "apiKey";

/// Error body returned by the news API alongside non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
    api_key: String,
    diagnostics: Arc<dyn Diagnostics>,
}

impl HttpGateway {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Self::with_options(base_url, api_key, DEFAULT_TIMEOUT, Arc::new(TracingDiagnostics))
    }

    pub fn with_options(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self> {
        // Fail early on a malformed base URL rather than on the first request.
        Url::parse(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("headliner/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            diagnostics,
        })
    }

    fn request_url(&self, path: &str, params: &QueryParams) -> std::result::Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params.iter() {
                pairs.append_pair(name, value);
            }
            pairs.append_pair(API_KEY_PARAM, &self.api_key);
        }
        Ok(url)
    }

    async fn send(&self, path: &str, url: Url) -> std::result::Result<Vec<u8>, FetchError> {
        let network_error = |e: reqwest::Error| FetchError::Network {
            path: path.to_string(),
            message: if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            },
        };

        let response = self.client.get(url).send().await.map_err(network_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(network_error)?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            return Err(FetchError::Http {
                status: status.as_u16(),
                path: path.to_string(),
                message,
            });
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get_bytes(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        let url = self.request_url(path, params)?;
        tracing::debug!("GET {}?{}", path, params);

        let result = self.send(path, url).await;
        if let Err(e) = &result {
            self.diagnostics.report(&ErrorReport {
                service: "HttpGateway",
                method: "GET",
                url: format!("{}{}", self.base_url, path),
                params: params.clone(),
                status: e.status(),
                message: e.to_string(),
            });
        }
        result
    }
}
