//! CRM vs Surfe reconciliation.
//!
//! Joins the CRM export with the enriched people on `externalID` and flags,
//! per row, which fields disagree and whether the CRM email survived Surfe's
//! validation.

use crate::models::{DiffRecord, EnrichedContact, SourceContact};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static LINKEDIN_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/in/(\w+)/?").expect("LinkedIn handle regex is valid"));

type FieldGetter<T> = fn(&T) -> Option<&str>;

/// Source fields compared with [`null_aware_inequality`]: every CRM field
/// except `externalID`, `email` and `linkedInUrl`.
const COMPARED_FIELDS: [(&str, FieldGetter<SourceContact>, FieldGetter<EnrichedContact>); 2] = [
    (
        "firstName",
        |c| c.first_name.as_deref(),
        |p| p.first_name.as_deref(),
    ),
    (
        "lastName",
        |c| c.last_name.as_deref(),
        |p| p.last_name.as_deref(),
    ),
];

/// Inequality where two missing values are equal and a missing value
/// differs from any present one.
pub fn null_aware_inequality<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
    a != b
}

/// Inequality over extracted values where a missing value on either side
/// always counts as different, including when both are missing.
pub fn strict_extracted_inequality(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a != b,
        _ => true,
    }
}

/// Extracts the profile handle from a LinkedIn URL (`/in/<handle>`).
pub fn linkedin_handle(url: &str) -> Option<&str> {
    LINKEDIN_HANDLE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Groups enriched people by `externalID`, keeping their original order.
/// People without an id are left out.
pub fn index_by_external_id(enriched: &[EnrichedContact]) -> HashMap<&str, Vec<&EnrichedContact>> {
    let mut index: HashMap<&str, Vec<&EnrichedContact>> = HashMap::new();
    for person in enriched {
        if let Some(id) = person.external_id.as_deref() {
            index.entry(id).or_default().push(person);
        }
    }
    index
}

/// Deliverable Surfe emails for one `externalID`, with their statuses.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DeliverableEmails {
    pub emails: Vec<String>,
    pub statuses: Vec<String>,
}

impl DeliverableEmails {
    fn extend_from(&mut self, person: &EnrichedContact) {
        for email in person.emails.iter().filter(|e| e.validation_status.is_deliverable()) {
            self.emails.push(email.email.clone());
            self.statuses.push(email.validation_status.to_string());
        }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.iter().any(|e| e == email)
    }
}

/// Collects deliverable emails per key over every joined row, in joined-row
/// order. A Surfe person joined to several CRM rows contributes once per row.
pub fn deliverable_emails_by_key<'a>(
    joined: &[(&'a SourceContact, &'a EnrichedContact)],
) -> HashMap<&'a str, DeliverableEmails> {
    let mut grouped: HashMap<&str, DeliverableEmails> = HashMap::new();
    for &(contact, person) in joined {
        grouped
            .entry(contact.external_id.as_str())
            .or_default()
            .extend_from(person);
    }
    grouped
}

/// Computes one [`DiffRecord`] per joined (CRM, Surfe) pair.
///
/// Rows without a counterpart on the other side are dropped. A key that
/// appears more than once on either side yields every combination for that
/// key. Output follows CRM order, then Surfe order within a key. Every row
/// of a key carries the same deliverable email list, gathered across all
/// joined rows of that key.
pub fn compute_diff(source: &[SourceContact], enriched: &[EnrichedContact]) -> Vec<DiffRecord> {
    let index = index_by_external_id(enriched);

    for (id, people) in &index {
        if people.len() > 1 {
            tracing::warn!("externalID {} returned {} times by Surfe", id, people.len());
        }
    }

    let mut seen = HashSet::new();
    let mut unmatched = 0usize;
    let mut joined = Vec::new();

    for contact in source {
        let id = contact.external_id.as_str();
        if !seen.insert(id) {
            tracing::warn!("externalID {} appears more than once in the CRM export", id);
        }

        match index.get(id) {
            Some(people) => joined.extend(people.iter().map(|person| (contact, *person))),
            None => unmatched += 1,
        }
    }

    if unmatched > 0 {
        tracing::info!("{} CRM contacts had no Surfe result and were dropped", unmatched);
    }

    let emails = deliverable_emails_by_key(&joined);
    let empty = DeliverableEmails::default();
    let records: Vec<DiffRecord> = joined
        .iter()
        .map(|&(contact, person)| {
            let deliverable = emails.get(contact.external_id.as_str()).unwrap_or(&empty);
            diff_record(contact, person, deliverable)
        })
        .collect();

    tracing::debug!(
        "Computed {} diff rows ({} with differences)",
        records.len(),
        records.iter().filter(|r| r.has_diff).count()
    );

    records
}

fn diff_record(
    contact: &SourceContact,
    person: &EnrichedContact,
    deliverable: &DeliverableEmails,
) -> DiffRecord {
    let crm_email_in_surfe_results = contact
        .email
        .as_deref()
        .is_some_and(|email| deliverable.contains(email));

    let mut differing_fields: Vec<&'static str> = COMPARED_FIELDS
        .iter()
        .filter(|(_, crm, surfe)| null_aware_inequality(crm(contact), surfe(person)))
        .map(|(name, _, _)| *name)
        .collect();

    if strict_extracted_inequality(
        contact.linkedin_url.as_deref().and_then(linkedin_handle),
        person.linkedin_url.as_deref().and_then(linkedin_handle),
    ) {
        differing_fields.push("linkedInUrl");
    }

    DiffRecord {
        source: contact.clone(),
        enriched: person.clone(),
        crm_email_in_surfe_results,
        has_diff: !differing_fields.is_empty(),
        emails_surfe: deliverable.emails.clone(),
        validation_statuses: deliverable.statuses.clone(),
        differing_fields,
    }
}
