//! Application state shared by all handlers.

use pixvault_core::Config;
use pixvault_processing::{MediaValidationGate, VariantResolver};
use pixvault_storage::AssetStore;

pub struct AppState {
    pub config: Config,
    pub store: AssetStore,
    pub gate: MediaValidationGate,
    pub resolver: VariantResolver,
}
