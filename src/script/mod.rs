//! The AppleScript bridge: escaping, script generation, execution and reply
//! decoding.
//!
//! # Architecture
//!
//! ```text
//! request ──► builder::ContactScript ──render──► source text
//!                                                  │ (escape::quote for every literal)
//!                                                  ▼
//!                                 executor::ScriptExecutor (osascript, stdin)
//!                                                  │
//!                                                  ▼
//!             parser ◄── wire (sentinel framing) ◄── raw reply
//! ```

pub mod builder;
pub mod escape;
pub mod executor;
pub mod parser;
pub mod wire;

pub use builder::ContactScript;
pub use escape::{escape, quote};
pub use executor::{OsascriptExecutor, ScriptExecutor};
