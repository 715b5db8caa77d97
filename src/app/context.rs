use std::sync::Arc;

use tracing::warn;

use crate::app::error::Result;
use crate::config::Config;
use crate::gateway::{Gateway, HttpGateway, TracingDiagnostics};
use crate::repository::ArticleRepository;
use crate::search::SearchController;
use crate::service::{CachePolicy, NewsService};

pub struct AppContext {
    pub config: Config,
    pub service: Arc<NewsService>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        if config.api.api_key.trim().is_empty() {
            warn!("No API key configured; requests will be rejected by the news API");
        }

        let gateway = HttpGateway::with_options(
            &config.api.base_url,
            &config.api.api_key,
            config.api.timeout(),
            Arc::new(TracingDiagnostics),
        )?;
        Ok(Self::with_gateway(config, Arc::new(gateway)))
    }

    /// Builds the context over any gateway, e.g. a mock server in tests.
    pub fn with_gateway(config: Config, gateway: Arc<dyn Gateway>) -> Self {
        let repository = Arc::new(ArticleRepository::new(gateway));
        let service = Arc::new(NewsService::new(
            repository,
            CachePolicy::from(&config.cache),
        ));
        Self { config, service }
    }

    pub fn search_controller(&self) -> SearchController {
        SearchController::new(self.service.clone(), &self.config.search)
    }
}
