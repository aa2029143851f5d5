//! Domain types for the contact directory.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ContactsError;

// ─── Records ─────────────────────────────────────────────────────────────────

/// A labelled URL attached to a contact (e.g. `LinkedIn`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactUrl {
    /// Blank labels are replaced by a positional one on write.
    #[serde(default)]
    pub label: String,
    pub value: String,
}

impl ContactUrl {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A full contact as held by Contacts.app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    /// Store-assigned identifier; empty until the contact exists in the store.
    pub id: String,
    /// Display name.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub urls: Vec<ContactUrl>,
    /// Maintained by the store, local time.
    pub creation_date: Option<NaiveDateTime>,
    /// Maintained by the store, local time.
    pub modification_date: Option<NaiveDateTime>,
}

/// Search hit: just enough to pick a contact and fetch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: String,
    pub name: String,
    pub organization: Option<String>,
}

/// Entry of a recently created/modified listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentContact {
    pub id: String,
    pub name: String,
    pub creation_date: Option<NaiveDateTime>,
    pub modification_date: Option<NaiveDateTime>,
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// Parameters for a contact search.
#[derive(Debug, Clone, Default)]
pub struct ContactQuery {
    /// Substring matched against name and organization. `None` browses.
    pub query: Option<String>,
    /// Maximum results; clamped by the directory before use.
    pub limit: usize,
}

/// Data for creating a new contact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub organization: Option<String>,
    pub job_title: Option<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub urls: Vec<ContactUrl>,
    pub note: Option<String>,
}

impl NewContact {
    /// Minimal create request with just a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update. `None` leaves a field untouched; `Some` replaces it
/// (collections are replaced whole, never merged).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub job_title: Option<String>,
    pub note: Option<String>,
    pub emails: Option<Vec<String>>,
    pub phones: Option<Vec<String>>,
    pub urls: Option<Vec<ContactUrl>>,
}

impl ContactPatch {
    /// Fields present in this patch, in the fixed order they are applied.
    pub fn fields(&self) -> Vec<ContactField> {
        ContactField::UPDATE_ORDER
            .into_iter()
            .filter(|field| match field {
                ContactField::Name => self.name.is_some(),
                ContactField::Organization => self.organization.is_some(),
                ContactField::JobTitle => self.job_title.is_some(),
                ContactField::Note => self.note.is_some(),
                ContactField::Emails => self.emails.is_some(),
                ContactField::Phones => self.phones.is_some(),
                ContactField::Urls => self.urls.is_some(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

/// Split a display name into first name and remainder.
///
/// Contacts.app stores first and last names separately. The first
/// whitespace-separated token becomes the first name and everything after it
/// the last name. This is lossy: "Dr. Grace Hopper" yields first name
/// "Dr." and last name "Grace Hopper", and "Jean Paul Sartre" cannot keep
/// "Jean Paul" as a given name.
pub fn split_name(name: &str) -> (String, Option<String>) {
    let trimmed = name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => {
            let rest = rest.trim();
            let last = (!rest.is_empty()).then(|| rest.to_owned());
            (first.to_owned(), last)
        }
        None => (trimmed.to_owned(), None),
    }
}

// ─── Fields and collections ──────────────────────────────────────────────────

/// An updatable contact field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    Name,
    Organization,
    JobTitle,
    Note,
    Emails,
    Phones,
    Urls,
}

impl ContactField {
    /// Order in which update scripts run.
    pub const UPDATE_ORDER: [ContactField; 7] = [
        ContactField::Name,
        ContactField::Organization,
        ContactField::JobTitle,
        ContactField::Note,
        ContactField::Emails,
        ContactField::Phones,
        ContactField::Urls,
    ];

    /// Name used in responses (`updatedFields`).
    pub fn as_str(self) -> &'static str {
        match self {
            ContactField::Name => "name",
            ContactField::Organization => "organization",
            ContactField::JobTitle => "jobTitle",
            ContactField::Note => "note",
            ContactField::Emails => "emails",
            ContactField::Phones => "phones",
            ContactField::Urls => "urls",
        }
    }
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A multi-valued contact property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Emails,
    Phones,
    Urls,
}

impl Collection {
    /// AppleScript element class (`email`, `phone`, `url`).
    pub fn element(self) -> &'static str {
        match self {
            Collection::Emails => "email",
            Collection::Phones => "phone",
            Collection::Urls => "url",
        }
    }

    /// AppleScript plural element name (`emails`, `phones`, `urls`).
    pub fn plural(self) -> &'static str {
        match self {
            Collection::Emails => "emails",
            Collection::Phones => "phones",
            Collection::Urls => "urls",
        }
    }

    /// Label synthesized from an entry's position: `home`, `work`, then
    /// `email3`, `email4`, ... (or `phone3`, `url3`, ...).
    pub fn positional_label(self, index: usize) -> String {
        match index {
            0 => "home".to_owned(),
            1 => "work".to_owned(),
            n => format!("{}{}", self.element(), n + 1),
        }
    }
}

/// One labelled value to append to a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEntry {
    pub label: String,
    pub value: String,
}

impl CollectionEntry {
    /// Entries for plain values, labelled by position.
    pub fn positional(collection: Collection, values: &[String]) -> Vec<CollectionEntry> {
        values
            .iter()
            .enumerate()
            .map(|(i, value)| CollectionEntry {
                label: collection.positional_label(i),
                value: value.clone(),
            })
            .collect()
    }

    /// Entries for URLs; a blank label falls back to the positional one.
    pub fn from_urls(urls: &[ContactUrl]) -> Vec<CollectionEntry> {
        urls.iter()
            .enumerate()
            .map(|(i, url)| CollectionEntry {
                label: if url.label.trim().is_empty() {
                    Collection::Urls.positional_label(i)
                } else {
                    url.label.clone()
                },
                value: url.value.clone(),
            })
            .collect()
    }
}

// ─── Recent listing ──────────────────────────────────────────────────────────

/// Which timestamp a recent listing filters on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecentKind {
    Created,
    #[default]
    Modified,
    Both,
}

impl RecentKind {
    /// Name accepted by the `type` argument.
    pub fn as_str(self) -> &'static str {
        match self {
            RecentKind::Created => "created",
            RecentKind::Modified => "modified",
            RecentKind::Both => "both",
        }
    }
}

impl FromStr for RecentKind {
    type Err = ContactsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" => Ok(RecentKind::Created),
            "modified" => Ok(RecentKind::Modified),
            "both" => Ok(RecentKind::Both),
            other => Err(ContactsError::Validation(format!(
                "type must be one of created, modified, both (got \"{other}\")"
            ))),
        }
    }
}

/// Parameters for listing recently touched contacts.
#[derive(Debug, Clone)]
pub struct RecentQuery {
    pub days_back: u32,
    pub kind: RecentKind,
    pub limit: usize,
}

impl Default for RecentQuery {
    fn default() -> Self {
        Self {
            days_back: 30,
            kind: RecentKind::Modified,
            limit: 20,
        }
    }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// A freshly created contact and the identifier the store assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedContact {
    pub id: String,
    pub contact: ContactRecord,
}

/// Outcome of one field's mutation during an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    Updated,
    Failed(String),
}

/// Per-field results of a best-effort update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Identifier the update was applied to (resolved from id or name).
    pub contact_id: String,
    pub outcomes: Vec<(ContactField, FieldOutcome)>,
}

impl UpdateReport {
    /// Fields whose scripts all succeeded, in application order.
    pub fn updated_fields(&self) -> Vec<ContactField> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == FieldOutcome::Updated)
            .map(|(field, _)| *field)
            .collect()
    }

    /// Fields that failed, with the reason reported by the interpreter.
    pub fn failed_fields(&self) -> Vec<(ContactField, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(field, outcome)| match outcome {
                FieldOutcome::Failed(reason) => Some((*field, reason.as_str())),
                FieldOutcome::Updated => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn split_two_word_name() {
        assert_eq!(
            split_name("Ada Lovelace"),
            ("Ada".to_owned(), Some("Lovelace".to_owned()))
        );
    }

    #[test]
    fn split_single_word_name_has_no_last_name() {
        assert_eq!(split_name("  Cher "), ("Cher".to_owned(), None));
    }

    #[test]
    fn split_multi_part_name_keeps_remainder_together() {
        assert_eq!(
            split_name("Dr. Grace  Brewster Hopper"),
            ("Dr.".to_owned(), Some("Grace  Brewster Hopper".to_owned()))
        );
    }

    #[test]
    fn positional_labels() {
        assert_eq!(Collection::Emails.positional_label(0), "home");
        assert_eq!(Collection::Emails.positional_label(1), "work");
        assert_eq!(Collection::Emails.positional_label(2), "email3");
        assert_eq!(Collection::Phones.positional_label(4), "phone5");
    }

    #[test]
    fn url_entries_keep_supplied_labels() {
        let entries = CollectionEntry::from_urls(&[
            ContactUrl::new("LinkedIn", "https://linkedin.com/in/ada"),
            ContactUrl::new(" ", "https://ada.example.com"),
        ]);
        assert_eq!(entries[0].label, "LinkedIn");
        assert_eq!(entries[1].label, "work");
    }

    #[test]
    fn patch_fields_follow_update_order() {
        let patch = ContactPatch {
            note: Some("n".into()),
            emails: Some(vec![]),
            name: Some("A B".into()),
            ..ContactPatch::default()
        };
        assert_eq!(
            patch.fields(),
            vec![ContactField::Name, ContactField::Note, ContactField::Emails]
        );
        assert!(ContactPatch::default().is_empty());
    }

    #[test]
    fn recent_kind_parses_case_insensitively() {
        assert_eq!("Created".parse::<RecentKind>().unwrap(), RecentKind::Created);
        assert_eq!("both".parse::<RecentKind>().unwrap(), RecentKind::Both);
        assert!("yesterday".parse::<RecentKind>().is_err());
        for kind in [RecentKind::Created, RecentKind::Modified, RecentKind::Both] {
            assert_eq!(kind.as_str().parse::<RecentKind>().unwrap(), kind);
        }
    }

    #[test]
    fn update_report_partitions_outcomes() {
        let report = UpdateReport {
            contact_id: "x".into(),
            outcomes: vec![
                (ContactField::Organization, FieldOutcome::Updated),
                (ContactField::Note, FieldOutcome::Failed("boom".into())),
            ],
        };
        assert_eq!(report.updated_fields(), vec![ContactField::Organization]);
        assert_eq!(report.failed_fields(), vec![(ContactField::Note, "boom")]);
    }
}
