//! Integration tests for contact tool registration and the JSON contract
//! callers see through [`ToolRegistry::invoke`].
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use contacts_bridge::config::Limits;
use contacts_bridge::error::ExecutionError;
use contacts_bridge::mock::{CannedExecutor, MockContactsApp};
use contacts_bridge::tools::contact_tools;
use contacts_bridge::{ContactDirectory, ToolMode, ToolRegistry, build_registry};
use serde_json::{Value, json};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn registry_with(app: Arc<MockContactsApp>, mode: ToolMode) -> ToolRegistry {
    let directory = Arc::new(ContactDirectory::new(app, Limits::default()));
    build_registry(directory, mode)
}

fn call(registry: &ToolRegistry, tool: &str, args: Value) -> (bool, Value) {
    let result = registry.invoke(tool, args);
    (result.success, serde_json::from_str(&result.content).unwrap())
}

// ─── Registration ────────────────────────────────────────────────────────────

#[test]
fn all_five_tools_are_registered_in_full_mode() {
    let registry = registry_with(Arc::new(MockContactsApp::new()), ToolMode::Full);
    assert_eq!(
        registry.list_available(),
        vec![
            "create_contact",
            "get_contact",
            "recent_contacts",
            "search_contacts",
            "update_contact"
        ]
    );
}

#[test]
fn read_only_mode_hides_create_and_update() {
    let registry = registry_with(Arc::new(MockContactsApp::new()), ToolMode::ReadOnly);
    assert!(registry.is_blocked_by_mode("create_contact"));
    assert!(registry.is_blocked_by_mode("update_contact"));

    let (success, body) = call(&registry, "create_contact", json!({"name": "Ada"}));
    assert!(!success);
    assert_eq!(body["success"], false);
}

#[test]
fn every_tool_has_description_and_object_schema() {
    let directory = Arc::new(ContactDirectory::new(
        Arc::new(MockContactsApp::new()),
        Limits::default(),
    ));
    for tool in contact_tools(directory) {
        assert!(!tool.description().is_empty(), "{} lacks a description", tool.name());
        let schema = tool.schema();
        assert_eq!(schema["type"], "object", "{} schema", tool.name());
        assert!(schema["properties"].is_object(), "{} properties", tool.name());
    }
}

// ─── Contract ────────────────────────────────────────────────────────────────

#[test]
fn search_on_empty_store() {
    let registry = registry_with(Arc::new(MockContactsApp::new()), ToolMode::Full);
    let (success, body) = call(&registry, "search_contacts", json!({"query": "NoSuchOrg123"}));
    assert!(success);
    assert_eq!(body, json!({"success": true, "count": 0, "contacts": []}));
}

#[test]
fn get_nonexistent_contact() {
    let registry = registry_with(Arc::new(MockContactsApp::new()), ToolMode::Full);
    let (success, body) = call(&registry, "get_contact", json!({"identifier": "nonexistent-id"}));
    assert!(!success);
    assert_eq!(body, json!({"success": false, "message": "Contact not found"}));
}

#[test]
fn create_then_get_then_update() {
    let app = Arc::new(MockContactsApp::new());
    let registry = registry_with(Arc::clone(&app), ToolMode::Full);

    let (success, created) = call(
        &registry,
        "create_contact",
        json!({
            "name": "Ada Lovelace",
            "organization": "Analytical Engines",
            "emails": ["ada@example.com"],
            "urls": []
        }),
    );
    assert!(success);
    let id = created["contactId"].as_str().unwrap().to_owned();

    let (_, fetched) = call(&registry, "get_contact", json!({"identifier": id.as_str()}));
    assert_eq!(fetched["contact"]["name"], "Ada Lovelace");
    assert_eq!(fetched["contact"]["organization"], "Analytical Engines");
    assert_eq!(fetched["contact"]["emails"], json!(["ada@example.com"]));
    assert_eq!(fetched["contact"]["urls"], json!([]));

    app.fail_kind("set_note");
    let (success, updated) = call(
        &registry,
        "update_contact",
        json!({"identifier": id.as_str(), "organization": "Royal Society", "note": "x"}),
    );
    assert!(success);
    assert_eq!(updated["updatedFields"], json!(["organization"]));
    assert_eq!(updated["failedFields"][0]["field"], "note");
}

#[test]
fn update_unknown_contact_reports_not_found_code() {
    let registry = registry_with(Arc::new(MockContactsApp::new()), ToolMode::Full);
    let (success, body) = call(
        &registry,
        "update_contact",
        json!({"identifier": "ghost", "note": "boo"}),
    );
    assert!(!success);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[test]
fn missing_required_arguments_are_validation_failures() {
    let registry = registry_with(Arc::new(MockContactsApp::new()), ToolMode::Full);
    for (tool, args) in [
        ("create_contact", json!({})),
        ("get_contact", json!({"identifier": "  "})),
        ("update_contact", json!({"note": "x"})),
        ("recent_contacts", json!({"type": "yesterday"})),
    ] {
        let (success, body) = call(&registry, tool, args);
        assert!(!success, "{tool} should fail");
        assert_eq!(body["code"], "VALIDATION_FAILED", "{tool}");
    }
}

#[test]
fn interpreter_failure_becomes_execution_error_payload() {
    let exec = Arc::new(CannedExecutor::new(vec![Err(ExecutionError::Failed {
        code: Some(1),
        stderr: "Contacts got an error: Not authorized to send Apple events".into(),
    })]));
    let directory = Arc::new(ContactDirectory::new(exec, Limits::default()));
    let registry = build_registry(directory, ToolMode::Full);

    let result = registry.invoke("search_contacts", json!({"query": "Ada"}));
    assert!(!result.success);
    assert!(result.error.unwrap().contains("Not authorized"));
    let body: Value = serde_json::from_str(&result.content).unwrap();
    assert_eq!(body["code"], "EXECUTION_FAILED");
}
