use crate::domain::{AlertService, CommandService, IngestionService, SeriesStore};
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SeriesStore>,
    pub ingestion: Arc<IngestionService>,
    pub alerts: Arc<AlertService>,
    pub commands: Arc<CommandService>,
}
