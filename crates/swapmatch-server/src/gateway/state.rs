use std::sync::Arc;

use swapmatch::catalog::CatalogStore;
use swapmatch::pipeline::SubstitutionPipeline;
use swapmatch::quota::QuotaGuard;
use swapmatch::retrieval::IndexAdmin;

/// Shared handler state. Every collaborator is constructed once at startup
/// and injected here; handlers never reach for ambient globals.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<SubstitutionPipeline>,

    pub quota: Arc<QuotaGuard>,

    pub catalog: Arc<dyn CatalogStore>,

    pub index: Arc<dyn IndexAdmin>,
}
