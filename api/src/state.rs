use std::sync::Arc;

use crate::dataset::ReferenceDataset;
use crate::oracle::OracleClient;

/// Shared per-process state. Everything here is built once at startup and
/// never mutated afterwards, so concurrent requests share it without
/// locking.
#[derive(Clone)]
pub struct AppState {
    pub oracle: Arc<dyn OracleClient>,
    pub oracle_model: String,
    pub dataset: Arc<ReferenceDataset>,
}
