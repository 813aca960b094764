use std::sync::Arc;

use dp_pipeline::Pipeline;

pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Shared secret for the refresh trigger; requests are rejected when it
    /// is unset.
    pub update_key: Option<String>,
}
