//! Contacts tools backed by a [`ContactDirectory`].
//!
//! - [`SearchContactsTool`]: search by name or organization (read-only)
//! - [`GetContactTool`]: full details by identifier or exact name (read-only)
//! - [`RecentContactsTool`]: recently created/modified contacts (read-only)
//! - [`CreateContactTool`]: create a contact (requires `ToolMode::Full`)
//! - [`UpdateContactTool`]: best-effort partial update (requires `ToolMode::Full`)
//!
//! Every tool answers with a JSON document carrying a `success` flag.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ToolMode;
use crate::directory::ContactDirectory;
use crate::error::ContactsError;
use crate::model::{
    ContactPatch, ContactQuery, ContactRecord, ContactSummary, ContactUrl, NewContact,
    RecentContact, RecentKind, RecentQuery,
};

use super::types::{Tool, ToolResult};

/// Default number of search results.
const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Decode tool arguments. A missing (`null`) argument object is treated as
/// empty.
fn parse_args<T: DeserializeOwned + Default>(args: serde_json::Value) -> Result<T, ContactsError> {
    if args.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(args)
        .map_err(|e| ContactsError::Validation(format!("invalid arguments: {e}")))
}

/// Optional fields shared by create and update.
fn contact_field_properties() -> serde_json::Map<String, serde_json::Value> {
    let props = serde_json::json!({
        "organization": {"type": "string", "description": "Organization or company name"},
        "jobTitle": {"type": "string", "description": "Job title"},
        "emails": {
            "type": "array",
            "items": {"type": "string"},
            "description": "Email addresses; labelled home, work, then email3, email4, ..."
        },
        "phones": {
            "type": "array",
            "items": {"type": "string"},
            "description": "Phone numbers; labelled home, work, then phone3, phone4, ..."
        },
        "urls": {
            "type": "array",
            "items": {
                "type": "object",
                "required": ["value"],
                "properties": {
                    "label": {"type": "string"},
                    "value": {"type": "string"}
                }
            },
            "description": "Labelled URLs, e.g. {\"label\": \"LinkedIn\", \"value\": \"https://...\"}"
        },
        "note": {"type": "string", "description": "Free-form note"}
    });
    match props {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

// ─── SearchContactsTool ───────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct SearchArgs {
    query: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse<'a> {
    success: bool,
    count: usize,
    contacts: &'a [ContactSummary],
}

/// Read-only tool that searches contacts by name or organization.
///
/// # Arguments (JSON)
///
/// - `query` (string, optional): substring; omitted lists the first contacts
/// - `limit` (integer, optional): max results (default 20)
pub struct SearchContactsTool {
    directory: Arc<ContactDirectory>,
}

impl SearchContactsTool {
    pub fn new(directory: Arc<ContactDirectory>) -> Self {
        Self { directory }
    }
}

impl Tool for SearchContactsTool {
    fn name(&self) -> &str {
        "search_contacts"
    }

    fn description(&self) -> &str {
        "Search contacts whose name or organization contains the query. \
         Without a query, lists the first contacts in the address book. \
         Use get_contact to fetch full details for a result."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Substring matched against contact name and organization"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of contacts to return (default 20)",
                    "minimum": 1,
                    "maximum": self.directory.limits().search_max
                }
            }
        })
    }

    fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ContactsError> {
        let args: SearchArgs = parse_args(args)?;
        let contacts = self.directory.search(&ContactQuery {
            query: args.query,
            limit: args.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
        })?;
        ToolResult::json(&SearchResponse {
            success: true,
            count: contacts.len(),
            contacts: &contacts,
        })
    }

    fn allowed_in_mode(&self, _mode: ToolMode) -> bool {
        true
    }
}

// ─── GetContactTool ───────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct GetArgs {
    #[serde(default)]
    identifier: String,
}

#[derive(Serialize)]
struct ContactResponse<'a> {
    success: bool,
    contact: &'a ContactRecord,
}

/// Read-only tool that fetches full contact details.
///
/// # Arguments (JSON)
///
/// - `identifier` (string, required): contact id, or an exact full name
pub struct GetContactTool {
    directory: Arc<ContactDirectory>,
}

impl GetContactTool {
    pub fn new(directory: Arc<ContactDirectory>) -> Self {
        Self { directory }
    }
}

impl Tool for GetContactTool {
    fn name(&self) -> &str {
        "get_contact"
    }

    fn description(&self) -> &str {
        "Get the full details of a contact: name, organization, job title, note, \
         emails, phones, URLs and timestamps. Accepts a contact identifier from \
         search_contacts or an exact full name."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["identifier"],
            "properties": {
                "identifier": {
                    "type": "string",
                    "description": "Contact identifier, or the contact's exact full name"
                }
            }
        })
    }

    fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ContactsError> {
        let args: GetArgs = parse_args(args)?;
        match self.directory.fetch(&args.identifier)? {
            Some(contact) => ToolResult::json(&ContactResponse {
                success: true,
                contact: &contact,
            }),
            None => Ok(ToolResult::failure("Contact not found")),
        }
    }

    fn allowed_in_mode(&self, _mode: ToolMode) -> bool {
        true
    }
}

// ─── CreateContactTool ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateArgs {
    #[serde(default)]
    name: String,
    organization: Option<String>,
    job_title: Option<String>,
    #[serde(default)]
    emails: Vec<String>,
    #[serde(default)]
    phones: Vec<String>,
    #[serde(default)]
    urls: Vec<ContactUrl>,
    note: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse<'a> {
    success: bool,
    contact_id: &'a str,
    contact: &'a ContactRecord,
}

/// Write tool that creates a new contact.
///
/// The display name is split at its first whitespace into first and last
/// name.
pub struct CreateContactTool {
    directory: Arc<ContactDirectory>,
}

impl CreateContactTool {
    pub fn new(directory: Arc<ContactDirectory>) -> Self {
        Self { directory }
    }
}

impl Tool for CreateContactTool {
    fn name(&self) -> &str {
        "create_contact"
    }

    fn description(&self) -> &str {
        "Create a new contact. Requires a full name; the first word becomes the \
         first name and the rest the last name. Returns the new contact's identifier."
    }

    fn schema(&self) -> serde_json::Value {
        let mut properties = contact_field_properties();
        properties.insert(
            "name".to_owned(),
            serde_json::json!({"type": "string", "description": "Full name (required)"}),
        );
        serde_json::json!({
            "type": "object",
            "required": ["name"],
            "properties": properties
        })
    }

    fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ContactsError> {
        let args: CreateArgs = parse_args(args)?;
        let created = self.directory.create(&NewContact {
            name: args.name,
            organization: args.organization,
            job_title: args.job_title,
            emails: args.emails,
            phones: args.phones,
            urls: args.urls,
            note: args.note,
        })?;
        ToolResult::json(&CreateResponse {
            success: true,
            contact_id: &created.id,
            contact: &created.contact,
        })
    }

    fn allowed_in_mode(&self, mode: ToolMode) -> bool {
        mode == ToolMode::Full
    }
}

// ─── UpdateContactTool ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateArgs {
    #[serde(default)]
    identifier: String,
    name: Option<String>,
    organization: Option<String>,
    job_title: Option<String>,
    emails: Option<Vec<String>>,
    phones: Option<Vec<String>>,
    urls: Option<Vec<ContactUrl>>,
    note: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse<'a> {
    success: bool,
    contact_id: &'a str,
    updated_fields: Vec<&'static str>,
    failed_fields: Vec<FailedField<'a>>,
}

#[derive(Serialize)]
struct FailedField<'a> {
    field: &'static str,
    error: &'a str,
}

/// Write tool that applies a best-effort partial update.
///
/// Each supplied field is written independently; lists replace the stored
/// list. Fields that fail are reported in `failedFields` without failing the
/// call.
pub struct UpdateContactTool {
    directory: Arc<ContactDirectory>,
}

impl UpdateContactTool {
    pub fn new(directory: Arc<ContactDirectory>) -> Self {
        Self { directory }
    }
}

impl Tool for UpdateContactTool {
    fn name(&self) -> &str {
        "update_contact"
    }

    fn description(&self) -> &str {
        "Update fields of an existing contact. Only supplied fields change; \
         emails, phones and urls replace the existing lists entirely. \
         Returns which fields were updated and which failed."
    }

    fn schema(&self) -> serde_json::Value {
        let mut properties = contact_field_properties();
        properties.insert(
            "identifier".to_owned(),
            serde_json::json!({
                "type": "string",
                "description": "Contact identifier, or the contact's exact full name"
            }),
        );
        properties.insert(
            "name".to_owned(),
            serde_json::json!({"type": "string", "description": "New full name"}),
        );
        serde_json::json!({
            "type": "object",
            "required": ["identifier"],
            "properties": properties
        })
    }

    fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ContactsError> {
        let args: UpdateArgs = parse_args(args)?;
        let patch = ContactPatch {
            name: args.name,
            organization: args.organization,
            job_title: args.job_title,
            note: args.note,
            emails: args.emails,
            phones: args.phones,
            urls: args.urls,
        };
        let report = self.directory.update(&args.identifier, &patch)?;
        ToolResult::json(&UpdateResponse {
            success: true,
            contact_id: &report.contact_id,
            updated_fields: report
                .updated_fields()
                .into_iter()
                .map(|f| f.as_str())
                .collect(),
            failed_fields: report
                .failed_fields()
                .into_iter()
                .map(|(field, error)| FailedField {
                    field: field.as_str(),
                    error,
                })
                .collect(),
        })
    }

    fn allowed_in_mode(&self, mode: ToolMode) -> bool {
        mode == ToolMode::Full
    }
}

// ─── RecentContactsTool ───────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentArgs {
    days_back: Option<u32>,
    #[serde(rename = "type")]
    kind: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct RecentResponse<'a> {
    success: bool,
    count: usize,
    contacts: &'a [RecentContact],
}

/// Read-only tool listing contacts created or modified recently, newest
/// first.
pub struct RecentContactsTool {
    directory: Arc<ContactDirectory>,
}

impl RecentContactsTool {
    pub fn new(directory: Arc<ContactDirectory>) -> Self {
        Self { directory }
    }
}

impl Tool for RecentContactsTool {
    fn name(&self) -> &str {
        "recent_contacts"
    }

    fn description(&self) -> &str {
        "List contacts created and/or modified within the last N days, newest first."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "daysBack": {
                    "type": "integer",
                    "description": "How many days to look back (default 30)",
                    "minimum": 1,
                    "maximum": self.directory.limits().max_days_back
                },
                "type": {
                    "type": "string",
                    "enum": ["created", "modified", "both"],
                    "description": "Which timestamp to filter on (default modified)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of contacts to return (default 20)",
                    "minimum": 1,
                    "maximum": self.directory.limits().recent_max
                }
            }
        })
    }

    fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ContactsError> {
        let args: RecentArgs = parse_args(args)?;
        let defaults = RecentQuery::default();
        let kind = match args.kind.as_deref() {
            Some(raw) => raw.parse::<RecentKind>()?,
            None => defaults.kind,
        };
        let contacts = self.directory.recent(&RecentQuery {
            days_back: args.days_back.unwrap_or(defaults.days_back),
            kind,
            limit: args.limit.unwrap_or(defaults.limit),
        })?;
        ToolResult::json(&RecentResponse {
            success: true,
            count: contacts.len(),
            contacts: &contacts,
        })
    }

    fn allowed_in_mode(&self, _mode: ToolMode) -> bool {
        true
    }
}
