//! CSV bulk import and export of institutional IDs.

use std::collections::HashSet;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};
use serde::Deserialize;

use super::{exists, insert, NewInstitutionalId};
use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::institutional_id::{self, AcademicLevel, AccountType};
use crate::models::prelude::*;
use crate::schemas::institutional_id::ImportReport;

/// Number of row errors returned before the remainder is summarised
pub const MAX_REPORTED_ERRORS: usize = 10;

pub const EXPORT_HEADER: [&str; 11] = [
    "Institutional ID",
    "Account Type",
    "Status",
    "First Name",
    "Last Name",
    "Email",
    "Academic Level",
    "Department",
    "Created At",
    "Expires At",
    "Notes",
];

const EXPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImportRow {
    institutional_id: String,
    account_type: String,
    first_name: String,
    last_name: String,
    email: String,
    academic_level: String,
    department: String,
}

/// A data row: its 1-based line number (header is row 1) and either the
/// parsed fields or the row-level error message.
type ParsedRow = (usize, std::result::Result<ImportRow, String>);

fn parse_rows(data: &[u8]) -> Result<Vec<ParsedRow>> {
    let text = std::str::from_utf8(data)
        .map_err(|e| AppError::BadRequest(format!("Error processing CSV file: {}", e)))?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::BadRequest(format!("Error processing CSV file: {}", e)))?
        .clone();
    if headers.is_empty() {
        return Err(AppError::BadRequest(
            "Error processing CSV file: missing header row".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let row_num = index + 2;
        let parsed = record
            .map_err(|e| format!("Row {}: {}", row_num, e))
            .and_then(|record| {
                if record.len() != headers.len() {
                    return Err(format!(
                        "Row {}: expected {} fields, found {}",
                        row_num,
                        headers.len(),
                        record.len()
                    ));
                }
                record
                    .deserialize::<ImportRow>(Some(&headers))
                    .map_err(|e| format!("Row {}: {}", row_num, e))
            });
        rows.push((row_num, parsed));
    }
    Ok(rows)
}

fn row_to_new(row_num: usize, value: String, row: ImportRow) -> std::result::Result<NewInstitutionalId, String> {
    let account_type = match row.account_type.trim() {
        "" => AccountType::Student,
        other => other
            .parse::<AccountType>()
            .map_err(|e| format!("Row {}: {}", row_num, e))?,
    };

    let academic_level = match row.academic_level.trim() {
        "" => None,
        other => Some(
            other
                .parse::<AcademicLevel>()
                .map_err(|e| format!("Row {}: {}", row_num, e))?,
        ),
    };

    Ok(NewInstitutionalId {
        value,
        account_type: Some(account_type),
        first_name: Some(row.first_name),
        last_name: Some(row.last_name),
        email: Some(row.email),
        academic_level,
        department: Some(row.department),
        ..Default::default()
    })
}

/// Import IDs from CSV, skipping blank IDs and reporting bad rows
pub async fn import_csv(db: &DbConn, data: &[u8], added_by: i64) -> Result<ImportReport> {
    let rows = parse_rows(data)?;

    let txn = db.begin().await?;
    let mut seen = HashSet::new();
    let mut created_count = 0;
    let mut errors = Vec::new();

    for (row_num, parsed) in rows {
        let mut row = match parsed {
            Ok(row) => row,
            Err(message) => {
                errors.push(message);
                continue;
            }
        };
        let value = std::mem::take(&mut row.institutional_id).trim().to_string();
        if value.is_empty() {
            continue;
        }

        if seen.contains(&value) || exists(&txn, &value).await? {
            errors.push(format!("Row {}: ID '{}' already exists", row_num, value));
            continue;
        }

        match row_to_new(row_num, value.clone(), row) {
            Ok(new) => {
                insert(&txn, new, Some(added_by)).await?;
                seen.insert(value);
                created_count += 1;
            }
            Err(message) => errors.push(message),
        }
    }

    txn.commit().await?;

    let error_count = errors.len();
    if error_count > MAX_REPORTED_ERRORS {
        errors.truncate(MAX_REPORTED_ERRORS);
        errors.push(format!(
            "... and {} more errors",
            error_count - MAX_REPORTED_ERRORS
        ));
    }

    tracing::info!(
        "Imported institutional IDs: {} created, {} errors",
        created_count,
        error_count
    );

    Ok(ImportReport {
        created_count,
        error_count,
        errors,
    })
}

/// Render records as CSV
pub fn write_csv(records: &[institutional_id::Model]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for record in records {
        let created_at = record.created_at.format(EXPORT_TIME_FORMAT).to_string();
        let expires_at = record
            .expires_at
            .map(|t| t.format(EXPORT_TIME_FORMAT).to_string())
            .unwrap_or_default();

        writer.write_record([
            record.institutional_id.as_str(),
            record.account_type.as_str(),
            record.status.as_str(),
            record.first_name.as_deref().unwrap_or(""),
            record.last_name.as_deref().unwrap_or(""),
            record.email.as_deref().unwrap_or(""),
            record.academic_level.as_deref().unwrap_or(""),
            record.department.as_deref().unwrap_or(""),
            created_at.as_str(),
            expires_at.as_str(),
            record.notes.as_deref().unwrap_or(""),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to finish CSV export: {}", e)))
}

/// Export the selected records, or every record when `ids` is empty
pub async fn export_csv(db: &DbConn, ids: &[i64]) -> Result<(usize, Vec<u8>)> {
    let mut select = InstitutionalId::find();
    if !ids.is_empty() {
        select = select.filter(institutional_id::Column::Id.is_in(ids.iter().copied()));
    }

    let records = select
        .order_by_asc(institutional_id::Column::InstitutionalId)
        .all(db)
        .await?;

    Ok((records.len(), write_csv(&records)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::institutional_id::IdStatus;
    use crate::test_helpers::{create_test_db, seed_institutional_id};

    const HEADER: &str =
        "institutional_id,account_type,first_name,last_name,email,academic_level,department\n";

    #[tokio::test]
    async fn test_import_reports_duplicate_row() {
        let db = create_test_db().await;
        seed_institutional_id(&db, "20000099", IdStatus::Active, None).await;

        let csv = format!(
            "{HEADER}\
             20000001,student,Ada,Lovelace,ada@example.edu,freshman,Maths\n\
             30000002,staff,Alan,Turing,,faculty,CS\n\
             20000099,student,,,,,\n\
             20000003,,Grace,Hopper,,,\n"
        );

        let report = import_csv(&db, csv.as_bytes(), 1).await.unwrap();
        assert_eq!(report.created_count, 3);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.errors, vec!["Row 4: ID '20000099' already exists"]);

        let grace = InstitutionalId::find()
            .filter(institutional_id::Column::InstitutionalId.eq("20000003"))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(grace.account_type, "student");
        assert_eq!(grace.status, "active");
        assert_eq!(grace.added_by, Some(1));
    }

    #[tokio::test]
    async fn test_import_skips_blank_and_flags_in_file_duplicates() {
        let db = create_test_db().await;
        let csv = format!("{HEADER} ,student,,,,,\n20000001,,,,,,\n20000001,,,,,,\n20000002,teacher,,,,,\n");

        let report = import_csv(&db, csv.as_bytes(), 1).await.unwrap();
        assert_eq!(report.created_count, 1);
        assert_eq!(report.error_count, 2);
        assert_eq!(report.errors[0], "Row 4: ID '20000001' already exists");
        assert!(report.errors[1].starts_with("Row 5:"));
    }

    #[tokio::test]
    async fn test_import_caps_reported_errors() {
        let db = create_test_db().await;
        let mut csv = String::from(HEADER);
        for _ in 0..13 {
            csv.push_str("20000001,,,,,,\n");
        }

        let report = import_csv(&db, csv.as_bytes(), 1).await.unwrap();
        assert_eq!(report.created_count, 1);
        assert_eq!(report.error_count, 12);
        assert_eq!(report.errors.len(), MAX_REPORTED_ERRORS + 1);
        assert_eq!(report.errors.last().unwrap(), "... and 2 more errors");
    }

    #[tokio::test]
    async fn test_import_reports_short_row_and_keeps_going() {
        let db = create_test_db().await;
        let csv = format!(
            "{HEADER}\
             20000001,student,Ada,Lovelace,ada@example.edu,freshman,Maths\n\
             20000002,student\n\
             20000003,student,Grace,Hopper,grace@example.edu,senior,CS\n"
        );

        let report = import_csv(&db, csv.as_bytes(), 1).await.unwrap();
        assert_eq!(report.created_count, 2);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.errors, vec!["Row 3: expected 7 fields, found 2"]);

        let short = InstitutionalId::find()
            .filter(institutional_id::Column::InstitutionalId.eq("20000002"))
            .one(&db)
            .await
            .unwrap();
        assert!(short.is_none());
    }

    #[tokio::test]
    async fn test_import_rejects_non_utf8() {
        let db = create_test_db().await;
        let result = import_csv(&db, &[0xff, 0xfe, 0x00], 1).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_export_header_and_rows() {
        let db = create_test_db().await;
        let record = seed_institutional_id(&db, "20000001", IdStatus::Active, None).await;
        seed_institutional_id(&db, "20000002", IdStatus::Revoked, None).await;

        let (count, bytes) = export_csv(&db, &[record.id]).await.unwrap();
        assert_eq!(count, 1);

        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Institutional ID,Account Type,Status,First Name,Last Name,Email,Academic Level,Department,Created At,Expires At,Notes"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("20000001,student,active,"));
        assert!(lines.next().is_none());
    }
}
