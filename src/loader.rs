//! CRM export loading.

use crate::errors::{AppError, ResultExt};
use crate::models::SourceContact;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header columns the CRM export must carry.
pub const REQUIRED_COLUMNS: [&str; 5] =
    ["CRM ID", "First Name", "Last Name", "Email", "LinkedIn URL"];

/// One row of the CRM export, with the CRM's own column names.
#[derive(Debug, Deserialize)]
struct CrmRow {
    #[serde(rename = "CRM ID")]
    crm_id: Option<String>,
    #[serde(rename = "First Name")]
    first_name: Option<String>,
    #[serde(rename = "Last Name")]
    last_name: Option<String>,
    #[serde(rename = "Email")]
    email: Option<String>,
    #[serde(rename = "LinkedIn URL")]
    linkedin_url: Option<String>,
}

/// Reads the CRM export at `path`.
pub fn load_contacts(path: &Path) -> Result<Vec<SourceContact>, AppError> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let contacts =
        read_contacts(file).with_context(|| format!("Failed to read {}", path.display()))?;
    tracing::info!("Loaded {} contacts from {}", contacts.len(), path.display());
    Ok(contacts)
}

/// Reads a CRM export with the `CRM ID, First Name, Last Name, Email,
/// LinkedIn URL` header. Other columns are ignored and empty cells become
/// missing values.
pub fn read_contacts<R: Read>(reader: R) -> Result<Vec<SourceContact>, AppError> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader.headers()?;
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }

    let mut contacts = Vec::new();

    for (idx, row) in csv_reader.deserialize::<CrmRow>().enumerate() {
        let row = row?;
        let external_id = row
            .crm_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::InvalidInput(format!("row {} has no CRM ID", idx + 1)))?;

        contacts.push(SourceContact {
            external_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            linkedin_url: row.linkedin_url,
        });
    }

    Ok(contacts)
}
