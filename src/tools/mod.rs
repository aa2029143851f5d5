//! Tool surface over the contact directory.
//!
//! Each operation is exposed as a [`Tool`] taking JSON arguments and
//! returning a JSON payload. [`ToolRegistry`] gates mutation tools by
//! [`ToolMode`](crate::config::ToolMode) and is the error boundary.

pub mod contacts;
pub mod registry;
pub mod types;

use std::sync::Arc;

pub use contacts::{
    CreateContactTool, GetContactTool, RecentContactsTool, SearchContactsTool, UpdateContactTool,
};
pub use registry::ToolRegistry;
pub use types::{Tool, ToolResult};

use crate::config::ToolMode;
use crate::directory::ContactDirectory;

/// All contact tools, backed by one directory.
pub fn contact_tools(directory: Arc<ContactDirectory>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(SearchContactsTool::new(Arc::clone(&directory))),
        Arc::new(GetContactTool::new(Arc::clone(&directory))),
        Arc::new(CreateContactTool::new(Arc::clone(&directory))),
        Arc::new(UpdateContactTool::new(Arc::clone(&directory))),
        Arc::new(RecentContactsTool::new(directory)),
    ]
}

/// A registry in `mode` with every contact tool registered.
pub fn build_registry(directory: Arc<ContactDirectory>, mode: ToolMode) -> ToolRegistry {
    let mut registry = ToolRegistry::new(mode);
    for tool in contact_tools(directory) {
        registry.register(tool);
    }
    registry
}
