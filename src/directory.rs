//! Directory operations over Contacts.app.
//!
//! [`ContactDirectory`] validates requests, clamps bounds, builds the
//! scripts, runs them through a [`ScriptExecutor`] and decodes the replies.
//! Calls are synchronous and one interpreter process runs at a time.

use std::sync::Arc;

use crate::config::Limits;
use crate::error::{ContactsError, Result};
use crate::model::{
    ContactField, ContactPatch, ContactQuery, ContactRecord, ContactSummary, CreatedContact,
    FieldOutcome, NewContact, RecentContact, RecentKind, RecentQuery, UpdateReport,
};
use crate::script::{ContactScript, ScriptExecutor, parser};

/// Typed contact directory backed by generated AppleScript.
pub struct ContactDirectory {
    executor: Arc<dyn ScriptExecutor>,
    limits: Limits,
}

impl ContactDirectory {
    /// Create a directory that runs scripts through `executor`.
    pub fn new(executor: Arc<dyn ScriptExecutor>, limits: Limits) -> Self {
        Self { executor, limits }
    }

    /// The bounds applied to every request.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    fn run(&self, script: &ContactScript) -> Result<String> {
        tracing::debug!(script = script.kind(), "running contacts script");
        self.executor.run(script).map_err(|e| {
            tracing::debug!(script = script.kind(), error = %e, "contacts script failed");
            ContactsError::from(e)
        })
    }

    /// Search contacts by name or organization substring.
    ///
    /// With no (or a blank) query the first people in the store are listed,
    /// bounded by `limits.browse_window`.
    ///
    /// # Errors
    ///
    /// Returns [`ContactsError::Execution`] or [`ContactsError::Decode`].
    pub fn search(&self, query: &ContactQuery) -> Result<Vec<ContactSummary>> {
        let needle = query
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_owned);
        let cap = if needle.is_some() {
            self.limits.search_max
        } else {
            self.limits.browse_window
        };
        let limit = query.limit.clamp(1, cap.max(1));

        let raw = self.run(&ContactScript::Search {
            query: needle,
            limit,
        })?;
        let mut hits = parser::parse_search(&raw)?;
        hits.truncate(limit);
        Ok(hits)
    }

    /// Fetch a contact by identifier, falling back to an exact name match.
    ///
    /// Returns `Ok(None)` when neither resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ContactsError::Validation`] for a blank identifier, or
    /// [`ContactsError::Execution`] / [`ContactsError::Decode`].
    pub fn fetch(&self, identifier: &str) -> Result<Option<ContactRecord>> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ContactsError::Validation(
                "identifier is required and cannot be empty".to_owned(),
            ));
        }
        let raw = self.run(&ContactScript::Fetch {
            identifier: identifier.to_owned(),
        })?;
        parser::parse_fetch(&raw)
    }

    /// Create a contact and return it with its store-assigned identifier.
    ///
    /// Blank emails, phones and url values are dropped before the script is
    /// built.
    ///
    /// # Errors
    ///
    /// Returns [`ContactsError::Validation`] for a blank name, or
    /// [`ContactsError::Execution`] / [`ContactsError::Decode`].
    pub fn create(&self, contact: &NewContact) -> Result<CreatedContact> {
        let contact = normalize_new(contact)?;
        let raw = self.run(&ContactScript::Create(contact.clone()))?;
        let (id, creation_date) = parser::parse_created(&raw)?;
        tracing::info!(contact_id = %id, "contact created");

        let record = ContactRecord {
            id: id.clone(),
            name: contact.name,
            organization: contact.organization.filter(|v| !v.is_empty()),
            job_title: contact.job_title.filter(|v| !v.is_empty()),
            note: contact.note.filter(|v| !v.is_empty()),
            emails: contact.emails,
            phones: contact.phones,
            urls: contact.urls,
            creation_date,
            modification_date: creation_date,
        };
        Ok(CreatedContact {
            id,
            contact: record,
        })
    }

    /// Apply a partial update, one independent script (or clear/append pair)
    /// per field.
    ///
    /// The contact is resolved first; after that, a failing field is recorded
    /// in the report and the remaining fields still run. A report with no
    /// updated fields is still `Ok`.
    ///
    /// # Errors
    ///
    /// Returns [`ContactsError::Validation`] for a blank identifier or name,
    /// [`ContactsError::NotFound`] when the contact does not resolve, or the
    /// resolution's execution/decode error.
    pub fn update(&self, identifier: &str, patch: &ContactPatch) -> Result<UpdateReport> {
        let patch = normalize_patch(patch)?;
        let existing = self
            .fetch(identifier)?
            .ok_or_else(|| ContactsError::NotFound(identifier.trim().to_owned()))?;
        let contact_id = existing.id;

        let mut outcomes = Vec::new();
        for field in patch.fields() {
            let outcome = self.apply_field(&contact_id, field, &patch);
            if let FieldOutcome::Failed(reason) = &outcome {
                tracing::warn!(
                    contact_id = %contact_id,
                    field = field.as_str(),
                    reason = %reason,
                    "field update failed; continuing with remaining fields"
                );
            }
            outcomes.push((field, outcome));
        }

        let report = UpdateReport {
            contact_id,
            outcomes,
        };
        tracing::info!(
            contact_id = %report.contact_id,
            updated = report.updated_fields().len(),
            failed = report.failed_fields().len(),
            "contact update finished"
        );
        Ok(report)
    }

    /// Run the scripts for one field, stopping at the first failure.
    fn apply_field(&self, id: &str, field: ContactField, patch: &ContactPatch) -> FieldOutcome {
        for script in ContactScript::for_field(id, field, patch) {
            if let Err(e) = self.run(&script) {
                return FieldOutcome::Failed(e.to_string());
            }
        }
        FieldOutcome::Updated
    }

    /// List contacts created and/or modified within `days_back` days, newest
    /// first.
    ///
    /// The script returns at most `limits.recent_max` matches in store order
    /// and the newest-first sort happens afterwards. When more contacts than
    /// that match, the window may miss some of the newest ones; raise
    /// `recent_max` to widen it.
    ///
    /// # Errors
    ///
    /// Returns [`ContactsError::Execution`] or [`ContactsError::Decode`].
    pub fn recent(&self, query: &RecentQuery) -> Result<Vec<RecentContact>> {
        let window = self.limits.recent_max.max(1);
        let days_back = query.days_back.clamp(1, self.limits.max_days_back.max(1));
        let limit = query.limit.clamp(1, window);

        let raw = self.run(&ContactScript::Recent {
            days_back,
            kind: query.kind,
            limit: window,
        })?;
        let mut contacts = parser::parse_recent(&raw)?;
        if contacts.len() >= window {
            tracing::debug!(
                kind = query.kind.as_str(),
                window,
                "recent window full; newer contacts beyond it are not considered"
            );
        }
        contacts.sort_by(|a, b| sort_key(b, query.kind).cmp(&sort_key(a, query.kind)));
        contacts.truncate(limit);
        Ok(contacts)
    }
}

fn sort_key(contact: &RecentContact, kind: RecentKind) -> Option<chrono::NaiveDateTime> {
    match kind {
        RecentKind::Created => contact.creation_date,
        RecentKind::Modified => contact.modification_date,
        RecentKind::Both => contact.creation_date.max(contact.modification_date),
    }
}

fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

fn clean_urls(urls: &[crate::model::ContactUrl]) -> Vec<crate::model::ContactUrl> {
    urls.iter()
        .filter(|u| !u.value.trim().is_empty())
        .map(|u| crate::model::ContactUrl::new(u.label.trim(), u.value.trim()))
        .collect()
}

fn normalize_new(contact: &NewContact) -> Result<NewContact> {
    let name = contact.name.trim();
    if name.is_empty() {
        return Err(ContactsError::Validation(
            "name is required and cannot be empty".to_owned(),
        ));
    }
    Ok(NewContact {
        name: name.to_owned(),
        organization: contact.organization.clone(),
        job_title: contact.job_title.clone(),
        emails: clean_list(&contact.emails),
        phones: clean_list(&contact.phones),
        urls: clean_urls(&contact.urls),
        note: contact.note.clone(),
    })
}

fn normalize_patch(patch: &ContactPatch) -> Result<ContactPatch> {
    let name = match patch.name.as_deref().map(str::trim) {
        Some("") => {
            return Err(ContactsError::Validation(
                "name cannot be empty".to_owned(),
            ));
        }
        other => other.map(str::to_owned),
    };
    Ok(ContactPatch {
        name,
        organization: patch.organization.clone(),
        job_title: patch.job_title.clone(),
        note: patch.note.clone(),
        emails: patch.emails.as_deref().map(clean_list),
        phones: patch.phones.as_deref().map(clean_list),
        urls: patch.urls.as_deref().map(clean_urls),
    })
}
