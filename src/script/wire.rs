//! Text wire format between generated scripts and the parser.
//!
//! AppleScript can only hand back a single string, so structured replies are
//! flattened with reserved sentinels:
//!
//! - [`RECORD_END`] terminates every record in a record list.
//! - [`FIELD_SEP`] separates the positional fields of a record.
//! - [`ITEM_SEP`] / [`PAIR_SEP`] frame a nested list of `(label, value)`
//!   pairs inside one field.
//!
//! Every field value is encoded with [`encode_value`] before it is framed
//! (the generated scripts carry an `enc` handler doing the same thing). All
//! sentinels contain `@@` and encoded values never contain `@`, so free text
//! can never be mistaken for a delimiter. Nested framing is layered: the pairs
//! string is itself encoded as a field, then decoded again by
//! [`decode_pairs`].
//!
//! Two simpler conventions are also supported:
//!
//! - pipe records ([`PIPE_SEP`]) for small fixed replies whose fields can
//!   never contain `|` (identifiers, timestamps);
//! - native lists, AppleScript's own `", "` list-to-text join, used for
//!   email and phone values.

use crate::error::ContactsError;

/// Terminates one record of a record list.
pub const RECORD_END: &str = "@@END@@";
/// Separates fields within a record.
pub const FIELD_SEP: &str = "@@FS@@";
/// Separates items of a nested pair list.
pub const ITEM_SEP: &str = "@@IS@@";
/// Separates label and value within a nested pair.
pub const PAIR_SEP: &str = "@@PS@@";
/// Separator of the pipe-joined scalar record.
pub const PIPE_SEP: char = '|';
/// Separator AppleScript uses when a list is coerced to text.
pub const NATIVE_LIST_SEP: &str = ", ";
/// Reply of a lookup that resolved nothing.
pub const NOT_FOUND: &str = "NOT_FOUND";

/// Positional field layouts of each record kind.
pub mod layout {
    /// Search hit.
    pub const SUMMARY: [&str; 3] = ["id", "name", "organization"];
    /// Full contact.
    pub const CONTACT: [&str; 10] = [
        "id",
        "name",
        "organization",
        "jobTitle",
        "note",
        "emails",
        "phones",
        "urls",
        "creationDate",
        "modificationDate",
    ];
    /// Recent listing entry.
    pub const RECENT: [&str; 4] = ["id", "name", "creationDate", "modificationDate"];
    /// Reply of a create script (pipe record).
    pub const CREATED: [&str; 2] = ["id", "creationDate"];
}

/// Encode a value so it cannot contain any sentinel.
pub fn encode_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '@' => out.push_str("%40"),
            other => out.push(other),
        }
    }
    out
}

/// Reverse [`encode_value`]. Unknown `%` sequences are kept verbatim.
pub fn decode_value(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut rest = encoded;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("%25") {
            out.push('%');
            rest = &tail[3..];
        } else if tail.starts_with("%40") {
            out.push('@');
            rest = &tail[3..];
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Encode one record: encoded fields joined by [`FIELD_SEP`], terminated by
/// [`RECORD_END`].
pub fn encode_record<S: AsRef<str>>(fields: &[S]) -> String {
    let mut out = fields
        .iter()
        .map(|f| encode_value(f.as_ref()))
        .collect::<Vec<_>>()
        .join(FIELD_SEP);
    out.push_str(RECORD_END);
    out
}

/// Encode a record list.
pub fn encode_records<S: AsRef<str>>(records: &[Vec<S>]) -> String {
    records.iter().map(|r| encode_record(r.as_slice())).collect()
}

/// Decode a record list whose records all have `arity` fields.
///
/// Empty input is an empty list. Whitespace after the final terminator is
/// ignored.
///
/// # Errors
///
/// Returns [`ContactsError::Decode`] when a record has the wrong number of
/// fields or the reply has trailing data without a terminator.
pub fn decode_records(raw: &str, arity: usize) -> Result<Vec<Vec<String>>, ContactsError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    let Some(body) = raw.strip_suffix(RECORD_END) else {
        return Err(ContactsError::Decode(format!(
            "record list is not terminated by {RECORD_END}"
        )));
    };

    body.split(RECORD_END)
        .enumerate()
        .map(|(index, record)| {
            let fields: Vec<String> = record.split(FIELD_SEP).map(decode_value).collect();
            if fields.len() != arity {
                return Err(ContactsError::Decode(format!(
                    "record {index} has {} fields, expected {arity}",
                    fields.len()
                )));
            }
            Ok(fields)
        })
        .collect()
}

/// Encode `(label, value)` pairs as a nested list.
pub fn encode_pairs<L: AsRef<str>, V: AsRef<str>>(pairs: &[(L, V)]) -> String {
    pairs
        .iter()
        .map(|(label, value)| {
            format!(
                "{}{PAIR_SEP}{}",
                encode_value(label.as_ref()),
                encode_value(value.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join(ITEM_SEP)
}

/// Decode a nested pair list produced by [`encode_pairs`].
///
/// # Errors
///
/// Returns [`ContactsError::Decode`] when an item lacks its [`PAIR_SEP`].
pub fn decode_pairs(raw: &str) -> Result<Vec<(String, String)>, ContactsError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    raw.split(ITEM_SEP)
        .map(|item| {
            item.split_once(PAIR_SEP)
                .map(|(label, value)| (decode_value(label), decode_value(value)))
                .ok_or_else(|| {
                    ContactsError::Decode(format!("pair item without {PAIR_SEP}: {item}"))
                })
        })
        .collect()
}

/// Join values the way AppleScript coerces a list to text.
pub fn join_native_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(NATIVE_LIST_SEP)
}

/// Split an AppleScript list-to-text join. Elements are trimmed and blanks
/// dropped, so an empty reply is an empty list.
///
/// An element that itself contains `", "` cannot be recovered; this is only
/// used for email addresses and phone numbers.
pub fn split_native_list(raw: &str) -> Vec<String> {
    raw.split(NATIVE_LIST_SEP)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Encode a pipe record.
///
/// # Errors
///
/// Returns [`ContactsError::Decode`] when a field contains the separator,
/// since the format has no escaping.
pub fn encode_pipe_record<S: AsRef<str>>(fields: &[S]) -> Result<String, ContactsError> {
    if let Some(bad) = fields.iter().find(|f| f.as_ref().contains(PIPE_SEP)) {
        return Err(ContactsError::Decode(format!(
            "pipe record field contains '{PIPE_SEP}': {}",
            bad.as_ref()
        )));
    }
    Ok(fields
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(&PIPE_SEP.to_string()))
}

/// Decode a pipe record with exactly `arity` positional fields.
///
/// # Errors
///
/// Returns [`ContactsError::Decode`] on a field-count mismatch.
pub fn decode_pipe_record(raw: &str, arity: usize) -> Result<Vec<String>, ContactsError> {
    let fields: Vec<String> = raw.trim().split(PIPE_SEP).map(str::to_owned).collect();
    if fields.len() != arity {
        return Err(ContactsError::Decode(format!(
            "expected {arity} '{PIPE_SEP}'-separated fields, got {}: {raw}",
            fields.len()
        )));
    }
    Ok(fields)
}
