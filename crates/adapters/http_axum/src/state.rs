//! Shared application state for axum handlers.

use std::sync::Arc;

use sitehub_app::ports::{GroupRepository, SiteRepository};
use sitehub_app::services::{GroupService, SiteService};

/// Application state shared across all axum handlers.
///
/// Generic over the repository types to avoid dynamic dispatch.
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<G, S> {
    /// Group CRUD service.
    pub group_service: Arc<GroupService<G, S>>,
    /// Site CRUD service.
    pub site_service: Arc<SiteService<S, G>>,
}

impl<G, S> Clone for AppState<G, S> {
    fn clone(&self) -> Self {
        Self {
            group_service: Arc::clone(&self.group_service),
            site_service: Arc::clone(&self.site_service),
        }
    }
}

impl<G, S> AppState<G, S>
where
    G: GroupRepository + Send + Sync + 'static,
    S: SiteRepository + Send + Sync + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(group_service: GroupService<G, S>, site_service: SiteService<S, G>) -> Self {
        Self {
            group_service: Arc::new(group_service),
            site_service: Arc::new(site_service),
        }
    }
}
