mod alert_policy;
mod alert_service;
mod command;
mod command_service;
mod ingestion_service;
mod query;
pub mod reports;
mod series;
mod series_checkpointer;
mod series_store;
mod smoothing;

pub use alert_policy::*;
pub use alert_service::*;
pub use command::*;
pub use command_service::*;
pub use ingestion_service::*;
pub use query::*;
pub use series::*;
pub use series_checkpointer::*;
pub use series_store::*;
pub use smoothing::*;
