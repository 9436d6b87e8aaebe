use std::sync::Arc;

use hop_service::LinkApi;

#[derive(Clone)]
pub struct AppState {
    links: Arc<dyn LinkApi>,
    base_url: String,
}

impl AppState {
    pub fn new(links: Arc<dyn LinkApi>, public_base_url: impl Into<String>) -> Self {
        Self {
            links,
            base_url: public_base_url.into(),
        }
    }

    pub fn links(&self) -> &dyn LinkApi {
        self.links.as_ref()
    }

    /// Base URL short links are published under.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
