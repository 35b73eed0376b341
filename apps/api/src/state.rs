use std::sync::Arc;

use crate::config::Config;
use crate::layout::{PageSetup, StyleCatalog};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Read-only after startup; shared with the blocking render tasks.
    pub styles: Arc<StyleCatalog>,
    pub page: PageSetup,
}

impl AppState {
    pub fn new(config: Config, styles: StyleCatalog) -> Self {
        let page = PageSetup::with_size(config.page_size);
        Self {
            config,
            styles: Arc::new(styles),
            page,
        }
    }
}
