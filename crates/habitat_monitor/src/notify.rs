mod log_message_sink;
mod webhook_message_sink;

pub use log_message_sink::*;
pub use webhook_message_sink::*;
