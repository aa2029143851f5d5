//! Contacts bridge: typed access to the macOS Contacts.app through generated
//! AppleScript.
//!
//! Each operation is compiled into a script, run through `osascript`, and
//! the delimited text reply is decoded back into typed records.
//!
//! # Architecture
//!
//! - **Directory** ([`directory`]): validates and clamps requests, runs the
//!   scripts, applies best-effort updates field by field
//! - **Script** ([`script`]): literal escaping, script generation, the
//!   interpreter process, and the sentinel-framed wire format
//! - **Tools** ([`tools`]): JSON tools with mode gating, the error boundary
//! - **Host** ([`host`]): newline-delimited JSON over stdin/stdout
//! - **Mock** ([`mock`]): in-memory executors for tests

pub mod config;
pub mod directory;
pub mod error;
pub mod host;
pub mod mock;
pub mod model;
pub mod script;
pub mod tools;

pub use config::{ContactsConfig, ToolMode};
pub use directory::ContactDirectory;
pub use error::{ContactsError, ExecutionError, Result};
pub use model::{
    ContactField, ContactPatch, ContactQuery, ContactRecord, ContactSummary, ContactUrl,
    NewContact, RecentContact, RecentKind, RecentQuery, UpdateReport,
};
pub use script::{OsascriptExecutor, ScriptExecutor};
pub use tools::{ToolRegistry, ToolResult, build_registry};
