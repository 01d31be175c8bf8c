/// File-level tests for the CRM loader and the output projector
use std::fs;
use surfe_auto_enrich::diff::compute_diff;
use surfe_auto_enrich::errors::AppError;
use surfe_auto_enrich::loader::load_contacts;
use surfe_auto_enrich::models::EnrichedContact;
use surfe_auto_enrich::projector::{OutputOptions, OutputProjector, DEFAULT_CLEAN_COLUMNS};
use tempfile::TempDir;

const CRM_EXPORT: &str = "\
CRM ID,First Name,Last Name,Email,LinkedIn URL
1,Jane,Doe,a@x.com,https://linkedin.com/in/jdoe/
2,John,Smith,john@y.com,https://linkedin.com/in/jsmith
3,Ann,Lee,ann@z.com,
";

fn surfe_people() -> Vec<EnrichedContact> {
    serde_json::from_value(serde_json::json!([
        {
            "externalID": "1",
            "firstName": "Jane",
            "lastName": "Doe",
            "companyName": "X Corp",
            "linkedInUrl": "https://linkedin.com/in/jdoe",
            "emails": [{"email": "a@x.com", "validationStatus": "VALID"}],
            "status": "COMPLETED"
        },
        {
            "externalID": "2",
            "firstName": "John",
            "lastName": "Smyth",
            "linkedInUrl": "https://linkedin.com/in/jsmith",
            "emails": [
                {"email": "john@y.com", "validationStatus": "CATCH_ALL"},
                {"email": "js@y.com", "validationStatus": "INVALID"}
            ],
            "status": "COMPLETED"
        }
    ]))
    .unwrap()
}

#[test]
fn test_full_pipeline_on_disk() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("contacts.csv");
    let output = dir.path().join("contacts.out.csv");
    fs::write(&input, CRM_EXPORT).unwrap();

    let contacts = load_contacts(&input).unwrap();
    assert_eq!(contacts.len(), 3);

    let diffs = compute_diff(&contacts, &surfe_people());
    assert_eq!(diffs.len(), 2);

    let projector = OutputProjector::new(OutputOptions {
        clean: true,
        ..Default::default()
    });
    let written = projector.write_csv(&output, &diffs).unwrap();
    assert_eq!(written, 2);

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, DEFAULT_CLEAN_COLUMNS);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    let col = |name: &str| headers.iter().position(|h| h == name).unwrap();

    assert_eq!(&rows[0][col("externalID")], "1");
    assert_eq!(&rows[0][col("has_diff")], "false");
    assert_eq!(&rows[0][col("crm_email_in_surfe_results")], "true");
    assert_eq!(&rows[0][col("companyName")], "X Corp");

    assert_eq!(&rows[1][col("externalID")], "2");
    assert_eq!(&rows[1][col("lastName_surfe")], "Smyth");
    assert_eq!(&rows[1][col("has_diff")], "true");
    assert_eq!(&rows[1][col("emails_surfe")], "john@y.com");
    assert_eq!(&rows[1][col("emails_surfeValidationStatus")], "CATCH_ALL");
}

#[test]
fn test_diffs_only_writes_confirmed_differences() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("contacts.csv");
    let output = dir.path().join("diffs.csv");
    fs::write(&input, CRM_EXPORT).unwrap();

    let contacts = load_contacts(&input).unwrap();
    let diffs = compute_diff(&contacts, &surfe_people());

    let projector = OutputProjector::new(OutputOptions {
        diffs_only: true,
        ..Default::default()
    });
    assert_eq!(projector.write_csv(&output, &diffs).unwrap(), 1);

    let text = fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(header.ends_with("emails_surfeValidationStatus,diff_fields"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("2,John,Smith,john@y.com,"));
    assert!(row.ends_with(",john@y.com,CATCH_ALL,lastName"));
    assert!(lines.next().is_none());
}

#[test]
fn test_missing_input_file_names_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.csv");

    let err = load_contacts(&missing).unwrap_err();
    assert!(err.to_string().contains("nope.csv"));
    assert!(matches!(err.root(), AppError::Io(_)));
}
