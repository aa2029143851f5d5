//! AppleScript generation for each directory operation.
//!
//! [`ContactScript`] is the typed form of one interpreter invocation;
//! [`ContactScript::render`] turns it into source text. Every string taken
//! from a request is embedded through [`quote`], and every value the script
//! sends back is framed according to [`super::wire`].

use crate::model::{
    Collection, CollectionEntry, ContactField, ContactPatch, NewContact, RecentKind, split_name,
};

use super::escape::quote;
use super::wire::{FIELD_SEP, ITEM_SEP, NOT_FOUND, PAIR_SEP, PIPE_SEP, RECORD_END, layout};

/// Handlers shared by every script that returns data.
///
/// `enc` mirrors [`super::wire::encode_value`]; `iso` renders a date as
/// `YYYY-MM-DDTHH:MM:SS` in local time.
const HANDLERS: &str = r#"
on enc(t)
	if t is missing value then return ""
	set t to t as text
	set t to my rep(t, "%", "%25")
	return my rep(t, "@", "%40")
end enc

on rep(t, needle, replacement)
	set saved to AppleScript's text item delimiters
	set AppleScript's text item delimiters to needle
	set parts to text items of t
	set AppleScript's text item delimiters to replacement
	set t to parts as text
	set AppleScript's text item delimiters to saved
	return t
end rep

on joinList(xs, sep)
	set saved to AppleScript's text item delimiters
	set AppleScript's text item delimiters to sep
	set t to xs as text
	set AppleScript's text item delimiters to saved
	return t
end joinList

on pad(n)
	if n < 10 then return "0" & (n as text)
	return n as text
end pad

on iso(d)
	if d is missing value then return ""
	set secs to (time of d) as integer
	return ((year of d) as integer as text) & "-" & my pad((month of d) as integer) & "-" & my pad((day of d) as integer) & "T" & my pad(secs div 3600) & ":" & my pad((secs mod 3600) div 60) & ":" & my pad(secs mod 60)
end iso
"#;

/// One interpreter invocation against Contacts.app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactScript {
    /// Substring filter when `query` is set, bounded enumeration otherwise.
    Search { query: Option<String>, limit: usize },
    /// Id lookup, then exact-name lookup, else [`NOT_FOUND`].
    Fetch { identifier: String },
    /// Create a person and return `id|creation-date`.
    Create(NewContact),
    /// Replace first/last name from a display name.
    SetName { id: String, name: String },
    SetOrganization { id: String, value: String },
    SetJobTitle { id: String, value: String },
    SetNote { id: String, value: String },
    /// Delete every entry of a collection.
    ClearCollection { id: String, collection: Collection },
    /// Append entries, in order, to a collection.
    AppendCollection {
        id: String,
        collection: Collection,
        entries: Vec<CollectionEntry>,
    },
    /// People created and/or modified within the last `days_back` days.
    Recent {
        days_back: u32,
        kind: RecentKind,
        limit: usize,
    },
}

impl ContactScript {
    /// Scripts that apply `field` from `patch` to contact `id`, in run order.
    ///
    /// Scalars map to a single script. Collections map to a clear script
    /// followed by an append script (omitted when the new list is empty).
    /// Returns an empty list when the patch does not carry `field`.
    pub fn for_field(id: &str, field: ContactField, patch: &ContactPatch) -> Vec<ContactScript> {
        let id = id.to_owned();
        match field {
            ContactField::Name => patch
                .name
                .iter()
                .map(|name| ContactScript::SetName {
                    id: id.clone(),
                    name: name.clone(),
                })
                .collect(),
            ContactField::Organization => patch
                .organization
                .iter()
                .map(|value| ContactScript::SetOrganization {
                    id: id.clone(),
                    value: value.clone(),
                })
                .collect(),
            ContactField::JobTitle => patch
                .job_title
                .iter()
                .map(|value| ContactScript::SetJobTitle {
                    id: id.clone(),
                    value: value.clone(),
                })
                .collect(),
            ContactField::Note => patch
                .note
                .iter()
                .map(|value| ContactScript::SetNote {
                    id: id.clone(),
                    value: value.clone(),
                })
                .collect(),
            ContactField::Emails => patch
                .emails
                .as_ref()
                .map(|values| {
                    Self::replace_collection(
                        &id,
                        Collection::Emails,
                        CollectionEntry::positional(Collection::Emails, values),
                    )
                })
                .unwrap_or_default(),
            ContactField::Phones => patch
                .phones
                .as_ref()
                .map(|values| {
                    Self::replace_collection(
                        &id,
                        Collection::Phones,
                        CollectionEntry::positional(Collection::Phones, values),
                    )
                })
                .unwrap_or_default(),
            ContactField::Urls => patch
                .urls
                .as_ref()
                .map(|urls| {
                    Self::replace_collection(
                        &id,
                        Collection::Urls,
                        CollectionEntry::from_urls(urls),
                    )
                })
                .unwrap_or_default(),
        }
    }

    fn replace_collection(
        id: &str,
        collection: Collection,
        entries: Vec<CollectionEntry>,
    ) -> Vec<ContactScript> {
        let mut scripts = vec![ContactScript::ClearCollection {
            id: id.to_owned(),
            collection,
        }];
        if !entries.is_empty() {
            scripts.push(ContactScript::AppendCollection {
                id: id.to_owned(),
                collection,
                entries,
            });
        }
        scripts
    }

    /// Short stable name used in logs and by test doubles.
    pub fn kind(&self) -> &'static str {
        match self {
            ContactScript::Search { .. } => "search",
            ContactScript::Fetch { .. } => "fetch",
            ContactScript::Create(_) => "create",
            ContactScript::SetName { .. } => "set_name",
            ContactScript::SetOrganization { .. } => "set_organization",
            ContactScript::SetJobTitle { .. } => "set_job_title",
            ContactScript::SetNote { .. } => "set_note",
            ContactScript::ClearCollection { collection, .. } => match collection {
                Collection::Emails => "clear_emails",
                Collection::Phones => "clear_phones",
                Collection::Urls => "clear_urls",
            },
            ContactScript::AppendCollection { collection, .. } => match collection {
                Collection::Emails => "append_emails",
                Collection::Phones => "append_phones",
                Collection::Urls => "append_urls",
            },
            ContactScript::Recent { .. } => "recent",
        }
    }

    /// Render the AppleScript source.
    pub fn render(&self) -> String {
        match self {
            ContactScript::Search { query, limit } => render_search(query.as_deref(), *limit),
            ContactScript::Fetch { identifier } => render_fetch(identifier),
            ContactScript::Create(contact) => render_create(contact),
            ContactScript::SetName { id, name } => {
                let (first, last) = split_name(name);
                render_mutation(
                    id,
                    &[
                        format!("set first name of p to {}", quote(&first)),
                        format!(
                            "set last name of p to {}",
                            quote(last.as_deref().unwrap_or(""))
                        ),
                    ],
                )
            }
            ContactScript::SetOrganization { id, value } => render_mutation(
                id,
                &[format!("set organization of p to {}", quote(value))],
            ),
            ContactScript::SetJobTitle { id, value } => {
                render_mutation(id, &[format!("set job title of p to {}", quote(value))])
            }
            ContactScript::SetNote { id, value } => {
                render_mutation(id, &[format!("set note of p to {}", quote(value))])
            }
            ContactScript::ClearCollection { id, collection } => render_mutation(
                id,
                &[format!("delete every {} of p", collection.element())],
            ),
            ContactScript::AppendCollection {
                id,
                collection,
                entries,
            } => {
                let statements: Vec<String> = entries
                    .iter()
                    .map(|entry| make_entry(*collection, entry))
                    .collect();
                render_mutation(id, &statements)
            }
            ContactScript::Recent {
                days_back,
                kind,
                limit,
            } => render_recent(*days_back, *kind, *limit),
        }
    }
}

// ─── Rendering ───────────────────────────────────────────────────────────────

/// Line-oriented source accumulator with tab indentation.
#[derive(Default)]
struct Source {
    lines: Vec<String>,
}

impl Source {
    fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        self.lines
            .push(format!("{}{}", "\t".repeat(depth), text.as_ref()));
    }

    fn finish(self, with_handlers: bool) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        if with_handlers {
            out.push_str(HANDLERS);
        }
        out
    }
}

/// AppleScript expression producing the named layout field for person `p`.
///
/// `emails`, `phones` and `urls` refer to locals the fetch script prepares
/// before returning.
fn field_source(field: &str) -> Option<&'static str> {
    Some(match field {
        "id" => "id of p",
        "name" => "name of p",
        "organization" => "organization of p",
        "jobTitle" => "job title of p",
        "note" => "note of p",
        "emails" => "emailText",
        "phones" => "phoneText",
        "urls" => "urlText",
        "creationDate" => "my iso(creation date of p)",
        "modificationDate" => "my iso(modification date of p)",
        _ => return None,
    })
}

/// `my enc(a) & FS & my enc(b) & ... & END`, the framing of one record laid
/// out as `fields`.
fn record_expr(fields: &[&str]) -> String {
    let mut expr = fields
        .iter()
        .map(|f| format!("my enc({})", field_source(f).unwrap_or("missing value")))
        .collect::<Vec<_>>()
        .join(&format!(" & {} & ", quote(FIELD_SEP)));
    expr.push_str(&format!(" & {}", quote(RECORD_END)));
    expr
}

fn make_entry(collection: Collection, entry: &CollectionEntry) -> String {
    format!(
        "make new {} at end of {} of p with properties {{label:{}, value:{}}}",
        collection.element(),
        collection.plural(),
        quote(&entry.label),
        quote(&entry.value)
    )
}

fn render_search(query: Option<&str>, limit: usize) -> String {
    let mut src = Source::default();
    src.line(0, "tell application \"Contacts\"");
    match query {
        Some(q) => {
            let q = quote(q);
            src.line(
                1,
                format!(
                    "set matches to every person whose (name contains {q}) or (organization contains {q})"
                ),
            );
            src.line(1, "set total to count of matches");
        }
        None => src.line(1, "set total to count of people"),
    }
    src.line(1, format!("if total > {limit} then set total to {limit}"));
    src.line(1, "set out to \"\"");
    src.line(1, "repeat with i from 1 to total");
    match query {
        Some(_) => src.line(2, "set p to item i of matches"),
        None => src.line(2, "set p to person i"),
    }
    src.line(
        2,
        format!(
            "set out to out & {}",
            record_expr(&layout::SUMMARY)
        ),
    );
    src.line(1, "end repeat");
    src.line(1, "return out");
    src.line(0, "end tell");
    src.finish(true)
}

fn render_fetch(identifier: &str) -> String {
    let ident = quote(identifier);
    let mut src = Source::default();
    src.line(0, "tell application \"Contacts\"");
    src.line(1, "set p to missing value");
    src.line(1, "try");
    src.line(2, format!("set p to person id {ident}"));
    src.line(2, "get id of p");
    src.line(1, "on error");
    src.line(2, "set p to missing value");
    src.line(1, "end try");
    src.line(1, "if p is missing value then");
    src.line(2, "try");
    src.line(3, format!("set p to first person whose name is {ident}"));
    src.line(2, "on error");
    src.line(3, "set p to missing value");
    src.line(2, "end try");
    src.line(1, "end if");
    src.line(1, format!("if p is missing value then return {}", quote(NOT_FOUND)));
    src.line(
        1,
        "set emailText to my joinList(value of every email of p, \", \")",
    );
    src.line(
        1,
        "set phoneText to my joinList(value of every phone of p, \", \")",
    );
    src.line(1, "set urlItems to {}");
    src.line(1, "repeat with u in (every url of p)");
    src.line(
        2,
        format!(
            "set end of urlItems to my enc(label of u) & {} & my enc(value of u)",
            quote(PAIR_SEP)
        ),
    );
    src.line(1, "end repeat");
    src.line(
        1,
        format!("set urlText to my joinList(urlItems, {})", quote(ITEM_SEP)),
    );
    src.line(
        1,
        format!(
            "return {}",
            record_expr(&layout::CONTACT)
        ),
    );
    src.line(0, "end tell");
    src.finish(true)
}

fn render_create(contact: &NewContact) -> String {
    let (first, last) = split_name(&contact.name);
    let mut props = format!("first name:{}", quote(&first));
    if let Some(last) = last.as_deref() {
        props.push_str(&format!(", last name:{}", quote(last)));
    }

    let mut src = Source::default();
    src.line(0, "tell application \"Contacts\"");
    src.line(
        1,
        format!("set p to make new person with properties {{{props}}}"),
    );
    let scalars = [
        ("organization", contact.organization.as_deref()),
        ("job title", contact.job_title.as_deref()),
        ("note", contact.note.as_deref()),
    ];
    for (property, value) in scalars {
        // Only non-empty values; empty strings would overwrite store defaults.
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            src.line(1, format!("set {property} of p to {}", quote(value)));
        }
    }
    for entry in CollectionEntry::positional(Collection::Emails, &contact.emails) {
        src.line(1, make_entry(Collection::Emails, &entry));
    }
    for entry in CollectionEntry::positional(Collection::Phones, &contact.phones) {
        src.line(1, make_entry(Collection::Phones, &entry));
    }
    for entry in CollectionEntry::from_urls(&contact.urls) {
        src.line(1, make_entry(Collection::Urls, &entry));
    }
    src.line(1, "save");
    src.line(
        1,
        format!(
            "return (id of p) & {} & my iso(creation date of p)",
            quote(&PIPE_SEP.to_string())
        ),
    );
    src.line(0, "end tell");
    src.finish(true)
}

fn render_mutation(id: &str, statements: &[String]) -> String {
    let mut src = Source::default();
    src.line(0, "tell application \"Contacts\"");
    src.line(1, format!("set p to person id {}", quote(id)));
    for statement in statements {
        src.line(1, statement);
    }
    src.line(1, "save");
    src.line(1, "return \"ok\"");
    src.line(0, "end tell");
    src.finish(false)
}

fn render_recent(days_back: u32, kind: RecentKind, limit: usize) -> String {
    let filter = match kind {
        RecentKind::Created => "creation date > cutoff",
        RecentKind::Modified => "modification date > cutoff",
        RecentKind::Both => "(creation date > cutoff) or (modification date > cutoff)",
    };
    let mut src = Source::default();
    src.line(0, "tell application \"Contacts\"");
    src.line(1, format!("set cutoff to (current date) - ({days_back} * days)"));
    src.line(1, format!("set matches to every person whose {filter}"));
    src.line(1, "set total to count of matches");
    src.line(1, format!("if total > {limit} then set total to {limit}"));
    src.line(1, "set out to \"\"");
    src.line(1, "repeat with i from 1 to total");
    src.line(2, "set p to item i of matches");
    src.line(
        2,
        format!(
            "set out to out & {}",
            record_expr(&layout::RECENT)
        ),
    );
    src.line(1, "end repeat");
    src.line(1, "return out");
    src.line(0, "end tell");
    src.finish(true)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::model::ContactUrl;

    fn ada() -> NewContact {
        NewContact {
            name: "Ada Lovelace".into(),
            organization: Some("Analytical Engines".into()),
            job_title: None,
            emails: vec!["ada@example.com".into(), "al@example.org".into(), "x@y.z".into()],
            phones: vec!["+44 20 7946 0000".into()],
            urls: vec![ContactUrl::new("LinkedIn", "https://linkedin.com/in/ada")],
            note: Some(String::new()),
        }
    }

    /// The `my enc(...)` arguments of the returned record, in order.
    fn encoded_fields(src: &str) -> Vec<String> {
        let line = src
            .lines()
            .find(|l| l.contains(RECORD_END) && l.contains("my enc("))
            .unwrap();
        line.split("my enc(")
            .skip(1)
            .map(|part| {
                let mut depth = 1;
                let end = part
                    .char_indices()
                    .find(|(_, c)| {
                        match *c {
                            '(' => depth += 1,
                            ')' => depth -= 1,
                            _ => {}
                        }
                        depth == 0
                    })
                    .map(|(i, _)| i)
                    .unwrap();
                part[..end].to_owned()
            })
            .collect()
    }

    fn expected_fields(fields: &[&str]) -> Vec<String> {
        fields
            .iter()
            .map(|f| field_source(f).unwrap().to_owned())
            .collect()
    }

    #[test]
    fn every_layout_field_has_a_source() {
        for field in layout::SUMMARY
            .iter()
            .chain(&layout::CONTACT)
            .chain(&layout::RECENT)
        {
            assert!(field_source(field).is_some(), "no source for {field}");
        }
    }

    #[test]
    fn returned_records_follow_their_layouts() {
        let fetch = ContactScript::Fetch {
            identifier: "ID-1".into(),
        }
        .render();
        assert_eq!(encoded_fields(&fetch), expected_fields(&layout::CONTACT));
        let fetched = encoded_fields(&fetch);
        assert_eq!(fetched[3], "job title of p");
        assert_eq!(fetched[4], "note of p");

        for query in [Some("Ada".to_owned()), None] {
            let search = ContactScript::Search { query, limit: 5 }.render();
            assert_eq!(encoded_fields(&search), expected_fields(&layout::SUMMARY));
        }

        let recent = ContactScript::Recent {
            days_back: 7,
            kind: RecentKind::Both,
            limit: 5,
        }
        .render();
        assert_eq!(encoded_fields(&recent), expected_fields(&layout::RECENT));
    }

    #[test]
    fn search_with_query_uses_native_filter() {
        let src = ContactScript::Search {
            query: Some("Acme \"Labs\"".into()),
            limit: 20,
        }
        .render();
        assert!(src.contains(r#"whose (name contains "Acme \"Labs\"")"#));
        assert!(src.contains("if total > 20 then set total to 20"));
        assert!(src.contains("set p to item i of matches"));
        assert!(src.contains("on enc(t)"));
    }

    #[test]
    fn search_without_query_enumerates_bounded_window() {
        let src = ContactScript::Search {
            query: None,
            limit: 50,
        }
        .render();
        assert!(!src.contains("whose"));
        assert!(src.contains("set total to count of people"));
        assert!(src.contains("if total > 50 then set total to 50"));
        assert!(src.contains("set p to person i"));
    }

    #[test]
    fn fetch_falls_back_to_name_and_reports_not_found() {
        let src = ContactScript::Fetch {
            identifier: "ABC:ABPerson".into(),
        }
        .render();
        let by_id = src.find("person id \"ABC:ABPerson\"").unwrap();
        let by_name = src.find("whose name is \"ABC:ABPerson\"").unwrap();
        assert!(by_id < by_name);
        assert!(src.contains("return \"NOT_FOUND\""));
        assert!(src.contains("\"@@FS@@\""));
        assert!(src.contains("\"@@END@@\""));
    }

    #[test]
    fn create_splits_name_and_skips_empty_scalars() {
        let src = ContactScript::Create(ada()).render();
        assert!(src.contains(
            r#"make new person with properties {first name:"Ada", last name:"Lovelace"}"#
        ));
        assert!(src.contains(r#"set organization of p to "Analytical Engines""#));
        assert!(!src.contains("set note of p"));
        assert!(!src.contains("set job title of p"));
        assert!(src.contains("save"));
        assert!(src.contains(r#"return (id of p) & "|" & my iso(creation date of p)"#));
    }

    #[test]
    fn create_labels_entries_by_position() {
        let src = ContactScript::Create(ada()).render();
        assert!(src.contains(r#"{label:"home", value:"ada@example.com"}"#));
        assert!(src.contains(r#"{label:"work", value:"al@example.org"}"#));
        assert!(src.contains(r#"{label:"email3", value:"x@y.z"}"#));
        assert!(src.contains(r#"make new phone at end of phones of p with properties {label:"home""#));
        assert!(src.contains(r#"{label:"LinkedIn", value:"https://linkedin.com/in/ada"}"#));
    }

    #[test]
    fn single_word_name_sets_only_first_name() {
        let src = ContactScript::Create(NewContact::named("Cher")).render();
        assert!(src.contains(r#"{first name:"Cher"}"#));
        assert!(!src.contains("last name"));
    }

    #[test]
    fn hostile_strings_stay_inside_literals() {
        let contact = NewContact {
            name: "Robert\" & (do shell script \"id\") & \"".into(),
            note: Some("line1\nline2\\".into()),
            ..NewContact::default()
        };
        let src = ContactScript::Create(contact).render();
        assert!(src.contains(r#"first name:"Robert\""#));
        assert!(src.contains(r#"set note of p to "line1\nline2\\""#));
        // The only raw line breaks are the ones the builder emitted.
        assert!(src.lines().all(|l| !l.starts_with("line2")));
    }

    #[test]
    fn update_collection_is_clear_then_append() {
        let patch = ContactPatch {
            emails: Some(vec!["new@example.com".into()]),
            ..ContactPatch::default()
        };
        let scripts = ContactScript::for_field("ID-1", ContactField::Emails, &patch);
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0].kind(), "clear_emails");
        assert_eq!(scripts[1].kind(), "append_emails");
        assert!(scripts[0].render().contains("delete every email of p"));
        assert!(scripts[1].render().contains(r#"{label:"home", value:"new@example.com"}"#));
    }

    #[test]
    fn update_with_empty_collection_only_clears() {
        let patch = ContactPatch {
            urls: Some(vec![]),
            ..ContactPatch::default()
        };
        let scripts = ContactScript::for_field("ID-1", ContactField::Urls, &patch);
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].kind(), "clear_urls");
    }

    #[test]
    fn absent_field_builds_nothing() {
        let scripts = ContactScript::for_field("ID-1", ContactField::Note, &ContactPatch::default());
        assert!(scripts.is_empty());
    }

    #[test]
    fn set_name_clears_last_name_for_single_word() {
        let src = ContactScript::SetName {
            id: "ID-1".into(),
            name: "Prince".into(),
        }
        .render();
        assert!(src.contains(r#"set p to person id "ID-1""#));
        assert!(src.contains(r#"set first name of p to "Prince""#));
        assert!(src.contains(r#"set last name of p to """#));
        assert!(!src.contains("on enc(t)"));
    }

    #[test]
    fn recent_filters_on_selected_dates() {
        let created = ContactScript::Recent {
            days_back: 7,
            kind: RecentKind::Created,
            limit: 100,
        }
        .render();
        assert!(created.contains("(current date) - (7 * days)"));
        assert!(created.contains("whose creation date > cutoff"));

        let both = ContactScript::Recent {
            days_back: 30,
            kind: RecentKind::Both,
            limit: 100,
        }
        .render();
        assert!(both.contains("(creation date > cutoff) or (modification date > cutoff)"));
    }
}
