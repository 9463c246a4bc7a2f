use std::sync::Arc;

use moviefinder_availability::StreamingAvailabilityClient;
use moviefinder_store::StoreClient;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared secret for the protected endpoint.
    pub auth_token: String,
    pub store: Arc<dyn StoreClient>,
    pub availability: Arc<StreamingAvailabilityClient>,
}
