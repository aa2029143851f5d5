//! Decoding of interpreter replies into domain records.

use chrono::NaiveDateTime;

use crate::error::ContactsError;
use crate::model::{ContactRecord, ContactSummary, ContactUrl, RecentContact};

use super::wire::{self, NOT_FOUND, layout};

/// Timestamp format produced by the scripts' `iso` handler.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Empty string → `None`.
fn optional(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Parse a script timestamp; empty or unparseable values become `None`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        Ok(ts) => Some(ts),
        Err(e) => {
            tracing::debug!(value = raw, error = %e, "ignoring unparseable timestamp");
            None
        }
    }
}

/// Render a timestamp the way the scripts do.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Decode a search reply.
///
/// # Errors
///
/// Returns [`ContactsError::Decode`] if the reply violates the wire format.
pub fn parse_search(raw: &str) -> Result<Vec<ContactSummary>, ContactsError> {
    Ok(wire::decode_records(raw, layout::SUMMARY.len())?
        .into_iter()
        .map(|fields| {
            let [id, name, organization] = take_fields(fields);
            ContactSummary {
                id,
                name,
                organization: optional(organization),
            }
        })
        .collect())
}

/// Decode a fetch reply. [`NOT_FOUND`] decodes to `None`.
///
/// # Errors
///
/// Returns [`ContactsError::Decode`] if the reply is neither the not-found
/// sentinel nor exactly one contact record.
pub fn parse_fetch(raw: &str) -> Result<Option<ContactRecord>, ContactsError> {
    if raw.trim() == NOT_FOUND {
        return Ok(None);
    }
    let mut records = wire::decode_records(raw, layout::CONTACT.len())?;
    if records.len() != 1 {
        return Err(ContactsError::Decode(format!(
            "fetch returned {} records, expected 1",
            records.len()
        )));
    }
    let [
        id,
        name,
        organization,
        job_title,
        note,
        emails,
        phones,
        urls,
        created,
        modified,
    ] = take_fields(records.remove(0));

    let urls = wire::decode_pairs(&urls)?
        .into_iter()
        .map(|(label, value)| ContactUrl { label, value })
        .collect();

    Ok(Some(ContactRecord {
        id,
        name,
        organization: optional(organization),
        job_title: optional(job_title),
        note: optional(note),
        emails: wire::split_native_list(&emails),
        phones: wire::split_native_list(&phones),
        urls,
        creation_date: parse_timestamp(&created),
        modification_date: parse_timestamp(&modified),
    }))
}

/// Decode a create reply: the new identifier and its creation date.
///
/// # Errors
///
/// Returns [`ContactsError::Decode`] if the reply is not an `id|date` pair
/// or the identifier is empty.
pub fn parse_created(raw: &str) -> Result<(String, Option<NaiveDateTime>), ContactsError> {
    let [id, created] = take_fields(wire::decode_pipe_record(raw, layout::CREATED.len())?);
    if id.trim().is_empty() {
        return Err(ContactsError::Decode(
            "create returned an empty identifier".to_owned(),
        ));
    }
    Ok((id.trim().to_owned(), parse_timestamp(&created)))
}

/// Decode a recent-contacts reply.
///
/// # Errors
///
/// Returns [`ContactsError::Decode`] if the reply violates the wire format.
pub fn parse_recent(raw: &str) -> Result<Vec<RecentContact>, ContactsError> {
    Ok(wire::decode_records(raw, layout::RECENT.len())?
        .into_iter()
        .map(|fields| {
            let [id, name, created, modified] = take_fields(fields);
            RecentContact {
                id,
                name,
                creation_date: parse_timestamp(&created),
                modification_date: parse_timestamp(&modified),
            }
        })
        .collect())
}

/// Move decoded fields into a fixed-size array. Arity is checked by the
/// decoder, so missing slots only happen on a layout/arity mismatch and are
/// filled with empty strings.
fn take_fields<const N: usize>(fields: Vec<String>) -> [String; N] {
    let mut iter = fields.into_iter();
    std::array::from_fn(|_| iter.next().unwrap_or_default())
}
