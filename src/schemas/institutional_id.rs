use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::institutional_id::{self, AcademicLevel, AccountType, IdStatus};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateInstitutionalIdRequest {
    /// Generated when omitted or blank
    #[validate(length(max = 20))]
    pub institutional_id: Option<String>,
    pub account_type: Option<AccountType>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub academic_level: Option<AcademicLevel>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Absent fields are left unchanged; blank strings clear the field
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateInstitutionalIdRequest {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub academic_level: Option<AcademicLevel>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub status: Option<IdStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListIdsQuery {
    pub status: Option<IdStatus>,
    pub account_type: Option<AccountType>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<i64>,
    pub status: IdStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkStatusResponse {
    pub updated: u64,
    pub status: IdStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateIdsRequest {
    pub count: u32,
    pub account_type: Option<AccountType>,
    pub academic_level: Option<AcademicLevel>,
    pub department: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateIdsResponse {
    pub count: usize,
    pub institutional_ids: Vec<String>,
}

/// `ids` is a comma separated list of record ids; all records when absent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    pub ids: Option<String>,
}

impl ExportQuery {
    pub fn selected_ids(&self) -> Vec<i64> {
        self.ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter_map(|id| id.trim().parse().ok())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportReport {
    pub created_count: usize,
    pub error_count: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstitutionalIdResponse {
    pub id: i64,
    pub institutional_id: String,
    pub account_type: String,
    pub status: String,
    pub is_available: bool,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub academic_level: Option<String>,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<i64>,
    pub added_by: Option<i64>,
    pub notes: Option<String>,
}

impl From<institutional_id::Model> for InstitutionalIdResponse {
    fn from(record: institutional_id::Model) -> Self {
        Self {
            is_available: record.is_available(),
            full_name: record.full_name(),
            id: record.id,
            institutional_id: record.institutional_id,
            account_type: record.account_type,
            status: record.status,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            academic_level: record.academic_level,
            department: record.department,
            created_at: record.created_at,
            updated_at: record.updated_at,
            expires_at: record.expires_at,
            used_at: record.used_at,
            used_by: record.used_by,
            added_by: record.added_by,
            notes: record.notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_query_parses_ids() {
        let query = ExportQuery {
            ids: Some("3, 5,x,,8".to_string()),
        };
        assert_eq!(query.selected_ids(), vec![3, 5, 8]);
        assert!(ExportQuery::default().selected_ids().is_empty());
    }
}
