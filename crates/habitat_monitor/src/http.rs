mod error;
mod handlers;
mod router;
mod server;
mod state;

pub use error::*;
pub use handlers::*;
pub use router::*;
pub use server::*;
pub use state::*;
