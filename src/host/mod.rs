//! Process host exposing the contact tools over stdin/stdout.

pub mod contract;
pub mod stdio;

pub use contract::{Method, RequestEnvelope, ResponseEnvelope, handle_line};
pub use stdio::{run_bridge, run_stdio_bridge};
