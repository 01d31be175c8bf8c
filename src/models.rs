use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// ============ CRM Models ============

/// A contact as exported from the CRM, renamed to the Surfe field names.
///
/// Created by the loader and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceContact {
    /// CRM identifier, echoed back by Surfe as `externalID`.
    #[serde(rename = "externalID")]
    pub external_id: String,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "linkedInUrl")]
    pub linkedin_url: Option<String>,
}

// ============ Surfe Models ============

/// Deliverability classification Surfe attaches to each email it returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValidationStatus {
    Valid,
    CatchAll,
    Invalid,
    #[default]
    Unknown,
    /// Any status this tool does not know about yet.
    Other(String),
}

impl ValidationStatus {
    /// Whether an email with this status is kept in the reconciliation.
    pub fn is_deliverable(&self) -> bool {
        matches!(self, ValidationStatus::Valid | ValidationStatus::CatchAll)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ValidationStatus::Valid => "VALID",
            ValidationStatus::CatchAll => "CATCH_ALL",
            ValidationStatus::Invalid => "INVALID",
            ValidationStatus::Unknown => "UNKNOWN",
            ValidationStatus::Other(s) => s,
        }
    }
}

impl From<String> for ValidationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "VALID" => ValidationStatus::Valid,
            "CATCH_ALL" => ValidationStatus::CatchAll,
            "INVALID" => ValidationStatus::Invalid,
            "UNKNOWN" => ValidationStatus::Unknown,
            _ => ValidationStatus::Other(s),
        }
    }
}

impl From<ValidationStatus> for String {
    fn from(status: ValidationStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a remote enrichment job, as reported by the polling endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Other(s) => s,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PENDING" => JobStatus::Pending,
            "RUNNING" | "IN_PROGRESS" => JobStatus::Running,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            _ => JobStatus::Other(s),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One email found by Surfe for a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedEmail {
    pub email: String,
    #[serde(rename = "validationStatus", default)]
    pub validation_status: ValidationStatus,
}

/// A person as returned by a completed Surfe enrichment job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedContact {
    /// Echo of the submitted CRM id. Not guaranteed unique.
    #[serde(rename = "externalID", default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_domain: Option<String>,
    #[serde(rename = "linkedInUrl", default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Emails in the order Surfe ranked them.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub emails: Vec<EnrichedEmail>,
    /// Mobile phones are never requested; kept loosely typed.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mobile_phones: Vec<Value>,
    /// Per-person enrichment status.
    #[serde(default)]
    pub status: Option<String>,
    /// Any other fields the provider returned.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ============ Wire Models ============

/// Which data points Surfe should look up. Only email enrichment is ever
/// requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IncludeFlags {
    pub email: bool,
    #[serde(rename = "linkedInUrl")]
    pub linkedin_url: bool,
    pub mobile: bool,
}

impl IncludeFlags {
    pub const EMAIL_ONLY: IncludeFlags = IncludeFlags {
        email: true,
        linkedin_url: false,
        mobile: false,
    };
}

/// Body of the batch submission request.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentRequest<'a> {
    pub include: IncludeFlags,
    pub people: &'a [SourceContact],
}

impl<'a> EnrichmentRequest<'a> {
    pub fn email_only(people: &'a [SourceContact]) -> Self {
        Self {
            include: IncludeFlags::EMAIL_ONLY,
            people,
        }
    }
}

/// Successful submission response.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionResponse {
    #[serde(rename = "enrichmentCallbackURL")]
    pub enrichment_callback_url: String,
}

/// Body returned by the polling endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub percent_completed: f64,
    pub status: JobStatus,
    /// Present once `status` is `COMPLETED`.
    #[serde(default)]
    pub people: Option<Vec<EnrichedContact>>,
    /// The body this response was parsed from.
    #[serde(skip)]
    pub raw: String,
}

// ============ Diff Models ============

/// One joined CRM/Surfe row with the derived reconciliation flags.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffRecord {
    pub source: SourceContact,
    pub enriched: EnrichedContact,
    /// Whether the CRM email is among the deliverable Surfe emails.
    pub crm_email_in_surfe_results: bool,
    /// Whether any compared field differs.
    pub has_diff: bool,
    /// Deliverable Surfe emails, in Surfe's order.
    pub emails_surfe: Vec<String>,
    /// Validation statuses parallel to `emails_surfe`.
    pub validation_statuses: Vec<String>,
    /// Names of the comparisons that reported a difference.
    pub differing_fields: Vec<&'static str>,
}
