//! In-memory gateway for tests: serves canned pages and counts requests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::app::FetchError;
use crate::domain::article::tests::article;
use crate::domain::{QueryParams, ResultPage};
use crate::gateway::Gateway;

#[derive(Debug, Clone)]
pub(crate) struct Request {
    pub path: String,
    pub params: QueryParams,
}

#[derive(Default)]
struct State {
    requests: Vec<Request>,
    failures: VecDeque<FetchError>,
}

/// Answers every request with a page of `total` results split into pages of
/// the requested `pageSize`.
pub(crate) struct FakeGateway {
    total: u32,
    latency: Duration,
    state: Mutex<State>,
}

impl FakeGateway {
    pub fn new(total: u32) -> Arc<Self> {
        Self::with_latency(total, Duration::ZERO)
    }

    pub fn with_latency(total: u32, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            total,
            latency,
            state: Mutex::new(State::default()),
        })
    }

    /// Makes the next request fail with `error`.
    pub fn fail_next(&self, error: FetchError) {
        self.state.lock().unwrap().failures.push_back(error);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn page(total: u32, page_size: u32, page: u32, tag: &str) -> ResultPage {
        let start = page_size * (page - 1);
        let end = (start + page_size).min(total);
        let articles = (start..end.max(start))
            .map(|i| article(&format!("https://news.test/{tag}/{i}")))
            .collect();
        ResultPage {
            status: "ok".into(),
            total_results: total,
            articles,
        }
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn get_bytes(&self, path: &str, params: &QueryParams) -> Result<Vec<u8>, FetchError> {
        let failure = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(Request {
                path: path.to_string(),
                params: params.clone(),
            });
            state.failures.pop_front()
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(error) = failure {
            return Err(error);
        }

        let page_size = params
            .get("pageSize")
            .and_then(|p| p.parse().ok())
            .unwrap_or(20);
        let page = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        let tag = params.get("q").unwrap_or("top");

        let body = Self::page(self.total, page_size, page, tag);
        Ok(serde_json::to_vec(&body).unwrap())
    }
}

pub(crate) fn server_error(path: &str) -> FetchError {
    FetchError::Http {
        status: 500,
        path: path.to_string(),
        message: None,
    }
}
