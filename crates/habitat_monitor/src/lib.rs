pub mod domain;
pub mod habitat_monitor;
pub mod http;
pub mod json_file;
pub mod notify;
pub mod render;

pub use domain::*;
pub use habitat_monitor::*;
pub use http::*;
pub use json_file::*;
pub use notify::*;
pub use render::*;
