//! In-memory [`ScriptExecutor`] doubles.
//!
//! These exercise the directory and tool layers without macOS or
//! Contacts.app:
//!
//! - [`MockContactsApp`] interprets typed [`ContactScript`]s against an
//!   in-memory address book and answers in the real wire format.
//! - [`CannedExecutor`] returns queued raw replies and records every rendered
//!   source it was asked to run.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Local, NaiveDateTime};

use crate::error::ExecutionError;
use crate::model::{
    Collection, CollectionEntry, ContactRecord, NewContact, RecentKind, split_name,
};
use crate::script::parser::format_timestamp;
use crate::script::wire::{self, NOT_FOUND};
use crate::script::{ContactScript, ScriptExecutor};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ─── CannedExecutor ──────────────────────────────────────────────────────────

/// Replays queued replies in order. Runs past the end of the queue fail with
/// [`ExecutionError::Unsupported`].
#[derive(Default)]
pub struct CannedExecutor {
    replies: Mutex<VecDeque<Result<String, ExecutionError>>>,
    sources: Mutex<Vec<String>>,
}

impl CannedExecutor {
    pub fn new(replies: Vec<Result<String, ExecutionError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            sources: Mutex::new(Vec::new()),
        }
    }

    /// Every source executed so far, oldest first.
    pub fn sources(&self) -> Vec<String> {
        lock(&self.sources).clone()
    }
}

impl ScriptExecutor for CannedExecutor {
    fn execute(&self, source: &str) -> Result<String, ExecutionError> {
        lock(&self.sources).push(source.to_owned());
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Err(ExecutionError::Unsupported("no canned reply left".into())))
    }
}

// ─── MockContactsApp ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Person {
    id: String,
    first: String,
    last: String,
    organization: String,
    job_title: String,
    note: String,
    emails: Vec<CollectionEntry>,
    phones: Vec<CollectionEntry>,
    urls: Vec<CollectionEntry>,
    created: NaiveDateTime,
    modified: NaiveDateTime,
}

impl Person {
    /// Contacts.app derives the display name from first and last name.
    fn name(&self) -> String {
        match (self.first.is_empty(), self.last.is_empty()) {
            (_, true) => self.first.clone(),
            (true, false) => self.last.clone(),
            (false, false) => format!("{} {}", self.first, self.last),
        }
    }

    fn collection_mut(&mut self, collection: Collection) -> &mut Vec<CollectionEntry> {
        match collection {
            Collection::Emails => &mut self.emails,
            Collection::Phones => &mut self.phones,
            Collection::Urls => &mut self.urls,
        }
    }

    fn values(entries: &[CollectionEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.value.as_str()).collect()
    }
}

#[derive(Default)]
struct AppState {
    people: Vec<Person>,
    next_id: u64,
    failing: HashSet<&'static str>,
    ran: Vec<&'static str>,
}

impl AppState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("MOCK-{}:ABPerson", self.next_id)
    }

    fn person_mut(&mut self, id: &str) -> Result<&mut Person, ExecutionError> {
        self.people
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ExecutionError::Failed {
                code: Some(1),
                stderr: format!("Contacts got an error: Can't get person id \"{id}\". (-1728)"),
            })
    }
}

/// An in-memory Contacts.app that answers generated scripts.
///
/// Name and organization matching is case-insensitive, as AppleScript's
/// `contains` and `is` are by default. Individual script kinds (see
/// [`ContactScript::kind`]) can be made to fail with [`fail_kind`].
///
/// [`fail_kind`]: MockContactsApp::fail_kind
#[derive(Default)]
pub struct MockContactsApp {
    state: Mutex<AppState>,
}

impl MockContactsApp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the address book. Records without an id get one assigned;
    /// missing dates default to now.
    pub fn with_people(people: Vec<ContactRecord>) -> Self {
        let app = Self::new();
        {
            let mut state = lock(&app.state);
            let seeded_at = now();
            for record in people {
                let id = if record.id.is_empty() {
                    state.allocate_id()
                } else {
                    record.id.clone()
                };
                let (first, last) = split_name(&record.name);
                let created = record.creation_date.unwrap_or(seeded_at);
                state.people.push(Person {
                    id,
                    first,
                    last: last.unwrap_or_default(),
                    organization: record.organization.unwrap_or_default(),
                    job_title: record.job_title.unwrap_or_default(),
                    note: record.note.unwrap_or_default(),
                    emails: CollectionEntry::positional(Collection::Emails, &record.emails),
                    phones: CollectionEntry::positional(Collection::Phones, &record.phones),
                    urls: CollectionEntry::from_urls(&record.urls),
                    created,
                    modified: record.modification_date.unwrap_or(created),
                });
            }
        }
        app
    }

    /// Make every subsequent script of `kind` exit non-zero.
    pub fn fail_kind(&self, kind: &'static str) {
        lock(&self.state).failing.insert(kind);
    }

    /// Kinds of the scripts run so far, oldest first.
    pub fn ran(&self) -> Vec<&'static str> {
        lock(&self.state).ran.clone()
    }

    /// Labels currently stored for a collection, for asserting on
    /// label synthesis.
    pub fn labels(&self, id: &str, collection: Collection) -> Vec<String> {
        let mut state = lock(&self.state);
        state
            .person_mut(id)
            .map(|p| {
                p.collection_mut(collection)
                    .iter()
                    .map(|e| e.label.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl ScriptExecutor for MockContactsApp {
    fn execute(&self, _source: &str) -> Result<String, ExecutionError> {
        Err(ExecutionError::Unsupported(
            "MockContactsApp interprets typed scripts only".into(),
        ))
    }

    fn run(&self, script: &ContactScript) -> Result<String, ExecutionError> {
        let mut state = lock(&self.state);
        let kind = script.kind();
        state.ran.push(kind);
        if state.failing.contains(kind) {
            return Err(ExecutionError::Failed {
                code: Some(1),
                stderr: format!("injected failure for {kind}"),
            });
        }

        match script {
            ContactScript::Search { query, limit } => Ok(search(&state, query.as_deref(), *limit)),
            ContactScript::Fetch { identifier } => Ok(fetch(&state, identifier)),
            ContactScript::Create(contact) => create(&mut state, contact),
            ContactScript::SetName { id, name } => {
                let (first, last) = split_name(name);
                mutate(&mut state, id, |p| {
                    p.first = first;
                    p.last = last.unwrap_or_default();
                })
            }
            ContactScript::SetOrganization { id, value } => {
                mutate(&mut state, id, |p| p.organization = value.clone())
            }
            ContactScript::SetJobTitle { id, value } => {
                mutate(&mut state, id, |p| p.job_title = value.clone())
            }
            ContactScript::SetNote { id, value } => {
                mutate(&mut state, id, |p| p.note = value.clone())
            }
            ContactScript::ClearCollection { id, collection } => {
                mutate(&mut state, id, |p| p.collection_mut(*collection).clear())
            }
            ContactScript::AppendCollection {
                id,
                collection,
                entries,
            } => mutate(&mut state, id, |p| {
                p.collection_mut(*collection).extend(entries.iter().cloned())
            }),
            ContactScript::Recent {
                days_back,
                kind,
                limit,
            } => Ok(recent(&state, *days_back, *kind, *limit)),
        }
    }
}

fn search(state: &AppState, query: Option<&str>, limit: usize) -> String {
    let needle = query.map(str::to_lowercase);
    let rows: Vec<Vec<String>> = state
        .people
        .iter()
        .filter(|p| match &needle {
            Some(n) => {
                p.name().to_lowercase().contains(n) || p.organization.to_lowercase().contains(n)
            }
            None => true,
        })
        .take(limit)
        .map(|p| vec![p.id.clone(), p.name(), p.organization.clone()])
        .collect();
    wire::encode_records(&rows)
}

fn fetch(state: &AppState, identifier: &str) -> String {
    let person = state
        .people
        .iter()
        .find(|p| p.id == identifier)
        .or_else(|| {
            state
                .people
                .iter()
                .find(|p| p.name().to_lowercase() == identifier.to_lowercase())
        });
    let Some(p) = person else {
        return NOT_FOUND.to_owned();
    };

    let urls: Vec<(&str, &str)> = p
        .urls
        .iter()
        .map(|u| (u.label.as_str(), u.value.as_str()))
        .collect();
    wire::encode_record(&[
        p.id.clone(),
        p.name(),
        p.organization.clone(),
        p.job_title.clone(),
        p.note.clone(),
        wire::join_native_list(Person::values(&p.emails).as_slice()),
        wire::join_native_list(Person::values(&p.phones).as_slice()),
        wire::encode_pairs(urls.as_slice()),
        format_timestamp(&p.created),
        format_timestamp(&p.modified),
    ])
}

fn create(state: &mut AppState, contact: &NewContact) -> Result<String, ExecutionError> {
    let (first, last) = split_name(&contact.name);
    let id = state.allocate_id();
    let created = now();
    state.people.push(Person {
        id: id.clone(),
        first,
        last: last.unwrap_or_default(),
        organization: contact.organization.clone().unwrap_or_default(),
        job_title: contact.job_title.clone().unwrap_or_default(),
        note: contact.note.clone().unwrap_or_default(),
        emails: CollectionEntry::positional(Collection::Emails, &contact.emails),
        phones: CollectionEntry::positional(Collection::Phones, &contact.phones),
        urls: CollectionEntry::from_urls(&contact.urls),
        created,
        modified: created,
    });
    wire::encode_pipe_record(&[id, format_timestamp(&created)])
        .map_err(|e| ExecutionError::Unsupported(e.to_string()))
}

fn mutate(
    state: &mut AppState,
    id: &str,
    apply: impl FnOnce(&mut Person),
) -> Result<String, ExecutionError> {
    let person = state.person_mut(id)?;
    apply(person);
    person.modified = now();
    Ok("ok".to_owned())
}

fn recent(state: &AppState, days_back: u32, kind: RecentKind, limit: usize) -> String {
    let cutoff = now() - Duration::days(i64::from(days_back));
    let rows: Vec<Vec<String>> = state
        .people
        .iter()
        .filter(|p| match kind {
            RecentKind::Created => p.created > cutoff,
            RecentKind::Modified => p.modified > cutoff,
            RecentKind::Both => p.created > cutoff || p.modified > cutoff,
        })
        .take(limit)
        .map(|p| {
            vec![
                p.id.clone(),
                p.name(),
                format_timestamp(&p.created),
                format_timestamp(&p.modified),
            ]
        })
        .collect();
    wire::encode_records(&rows)
}
