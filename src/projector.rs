//! Output selection and CSV emission for diff rows.

use crate::errors::{AppError, ResultExt};
use crate::models::DiffRecord;
use serde_json::Value;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

/// Columns kept when cleaning is requested.
pub const DEFAULT_CLEAN_COLUMNS: [&str; 17] = [
    "externalID",
    "firstName",
    "lastName",
    "email",
    "linkedInUrl",
    "firstName_surfe",
    "lastName_surfe",
    "companyName",
    "companyDomain",
    "linkedInUrl_surfe",
    "jobTitle",
    "country",
    "status",
    "crm_email_in_surfe_results",
    "has_diff",
    "emails_surfe",
    "emails_surfeValidationStatus",
];

/// Columns every full projection starts with, before provider extras.
const FULL_COLUMNS: [&str; 18] = [
    "externalID",
    "firstName",
    "lastName",
    "email",
    "linkedInUrl",
    "firstName_surfe",
    "lastName_surfe",
    "companyName",
    "companyDomain",
    "linkedInUrl_surfe",
    "jobTitle",
    "country",
    "status",
    "crm_email_in_surfe_results",
    "has_diff",
    "emails_surfe",
    "emails_surfeValidationStatus",
    "diff_fields",
];

const LIST_SEPARATOR: &str = ";";

#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Keep only rows with a difference whose CRM email Surfe confirmed.
    pub diffs_only: bool,
    /// Emit only `clean_columns`.
    pub clean: bool,
    pub clean_columns: Vec<String>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            diffs_only: false,
            clean: false,
            clean_columns: DEFAULT_CLEAN_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

pub struct OutputProjector {
    options: OutputOptions,
}

impl OutputProjector {
    pub fn new(options: OutputOptions) -> Self {
        Self { options }
    }

    /// Rows that make it into the output.
    pub fn select<'a>(&self, records: &'a [DiffRecord]) -> Vec<&'a DiffRecord> {
        records
            .iter()
            .filter(|r| !self.options.diffs_only || (r.has_diff && r.crm_email_in_surfe_results))
            .collect()
    }

    /// Output header for the given rows.
    pub fn columns<'a>(&self, records: impl IntoIterator<Item = &'a DiffRecord>) -> Vec<String> {
        if self.options.clean {
            return self.options.clean_columns.clone();
        }

        let extras: BTreeSet<&str> = records
            .into_iter()
            .flat_map(|r| r.enriched.extra.keys().map(String::as_str))
            .filter(|key| !FULL_COLUMNS.contains(key))
            .collect();

        FULL_COLUMNS
            .iter()
            .copied()
            .chain(extras)
            .map(str::to_string)
            .collect()
    }

    /// Writes the selected rows to `path`.
    pub fn write_csv(&self, path: &Path, records: &[DiffRecord]) -> Result<usize, AppError> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let written = self
            .write_to(file, records)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Wrote {} rows to {}", written, path.display());
        Ok(written)
    }

    /// Writes the selected rows as CSV and returns how many were written.
    pub fn write_to<W: Write>(&self, writer: W, records: &[DiffRecord]) -> Result<usize, AppError> {
        let selected = self.select(records);
        let columns = self.columns(selected.iter().copied());

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&columns)?;
        for record in &selected {
            wtr.write_record(columns.iter().map(|col| cell(record, col)))?;
        }
        wtr.flush()?;

        Ok(selected.len())
    }
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Renders one output cell. Unknown columns render empty.
pub fn cell(record: &DiffRecord, column: &str) -> String {
    let source = &record.source;
    let person = &record.enriched;
    match column {
        "externalID" => source.external_id.clone(),
        "firstName" => opt(&source.first_name),
        "lastName" => opt(&source.last_name),
        "email" => opt(&source.email),
        "linkedInUrl" => opt(&source.linkedin_url),
        "firstName_surfe" => opt(&person.first_name),
        "lastName_surfe" => opt(&person.last_name),
        "companyName" => opt(&person.company_name),
        "companyDomain" => opt(&person.company_domain),
        "linkedInUrl_surfe" => opt(&person.linkedin_url),
        "jobTitle" => opt(&person.job_title),
        "country" => opt(&person.country),
        "status" => opt(&person.status),
        "crm_email_in_surfe_results" => record.crm_email_in_surfe_results.to_string(),
        "has_diff" => record.has_diff.to_string(),
        "emails_surfe" => record.emails_surfe.join(LIST_SEPARATOR),
        "emails_surfeValidationStatus" => record.validation_statuses.join(LIST_SEPARATOR),
        "diff_fields" => record.differing_fields.join(LIST_SEPARATOR),
        other => match person.extra.get(other) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(v) => v.to_string(),
        },
    }
}
