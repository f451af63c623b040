mod alert;
mod habitat_envelope;
mod plot;
mod reading;
mod result;
mod series_repository;

pub use alert::*;
pub use habitat_envelope::*;
pub use plot::*;
pub use reading::*;
pub use result::*;
pub use series_repository::*;
