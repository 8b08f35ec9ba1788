use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::UnknownVariant;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "institutional_ids")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub institutional_id: String,
    pub account_type: String,
    pub status: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub academic_level: Option<String>,
    pub department: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub expires_at: Option<DateTimeUtc>,
    pub used_at: Option<DateTimeUtc>,
    pub used_by: Option<i64>,
    pub added_by: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UsedBy",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    UsedBy,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AddedBy",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    AddedBy,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Usable for registration: active and not past its expiry.
    pub fn is_available_at(&self, now: DateTimeUtc) -> bool {
        self.status == IdStatus::Active.as_str() && !self.is_expired_at(now)
    }

    pub fn is_available(&self) -> bool {
        self.is_available_at(chrono::Utc::now())
    }

    /// Expired once `now` reaches `expires_at`
    pub fn is_expired_at(&self, now: DateTimeUtc) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }

    pub fn full_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                Some(format!("{} {}", first, last))
            }
            _ => None,
        }
    }

    pub fn parsed_status(&self) -> Option<IdStatus> {
        self.status.parse().ok()
    }

    pub fn parsed_account_type(&self) -> Option<AccountType> {
        self.account_type.parse().ok()
    }
}

/// Kind of account an institutional ID may create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Student,
    Staff,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Student => "student",
            AccountType::Staff => "staff",
        }
    }

    /// Leading digit of generated IDs
    pub fn id_prefix(&self) -> char {
        match self {
            AccountType::Student => '2',
            AccountType::Staff => '3',
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(AccountType::Student),
            "staff" => Ok(AccountType::Staff),
            other => Err(UnknownVariant::new("account type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStatus {
    Active,
    Used,
    Expired,
    Revoked,
}

impl IdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdStatus::Active => "active",
            IdStatus::Used => "used",
            IdStatus::Expired => "expired",
            IdStatus::Revoked => "revoked",
        }
    }
}

impl fmt::Display for IdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(IdStatus::Active),
            "used" => Ok(IdStatus::Used),
            "expired" => Ok(IdStatus::Expired),
            "revoked" => Ok(IdStatus::Revoked),
            other => Err(UnknownVariant::new("status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcademicLevel {
    Freshman,
    Sophomore,
    Junior,
    Senior,
    Graduate,
    Phd,
    Faculty,
    Staff,
    Admin,
}

impl AcademicLevel {
    pub const ALL: [AcademicLevel; 9] = [
        AcademicLevel::Freshman,
        AcademicLevel::Sophomore,
        AcademicLevel::Junior,
        AcademicLevel::Senior,
        AcademicLevel::Graduate,
        AcademicLevel::Phd,
        AcademicLevel::Faculty,
        AcademicLevel::Staff,
        AcademicLevel::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AcademicLevel::Freshman => "freshman",
            AcademicLevel::Sophomore => "sophomore",
            AcademicLevel::Junior => "junior",
            AcademicLevel::Senior => "senior",
            AcademicLevel::Graduate => "graduate",
            AcademicLevel::Phd => "phd",
            AcademicLevel::Faculty => "faculty",
            AcademicLevel::Staff => "staff",
            AcademicLevel::Admin => "admin",
        }
    }
}

impl fmt::Display for AcademicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcademicLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|level| level.as_str() == wanted)
            .copied()
            .ok_or_else(|| UnknownVariant::new("academic level", &wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(status: IdStatus, expires_at: Option<DateTimeUtc>) -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            institutional_id: "20123456".to_string(),
            account_type: AccountType::Student.to_string(),
            status: status.to_string(),
            first_name: None,
            last_name: None,
            email: None,
            academic_level: None,
            department: None,
            created_at: now,
            updated_at: now,
            expires_at,
            used_at: None,
            used_by: None,
            added_by: None,
            notes: None,
        }
    }

    #[test]
    fn test_available_iff_active_and_unexpired() {
        let now = Utc::now();
        let past = Some(now - Duration::hours(1));
        let future = Some(now + Duration::hours(1));

        for status in [IdStatus::Active, IdStatus::Used, IdStatus::Expired, IdStatus::Revoked] {
            for expires_at in [None, past, Some(now), future] {
                let expected = status == IdStatus::Active
                    && expires_at.map_or(true, |t| t > now);
                assert_eq!(
                    record(status, expires_at).is_available_at(now),
                    expected,
                    "status={status} expires_at={expires_at:?}"
                );
            }
        }
    }

    #[test]
    fn test_active_but_past_expiry_is_expired() {
        let now = Utc::now();
        let rec = record(IdStatus::Active, Some(now - Duration::days(1)));
        assert!(rec.is_expired_at(now));
        assert!(!rec.is_available_at(now));
    }

    #[test]
    fn test_expiry_instant_is_not_available() {
        let now = Utc::now();
        let rec = record(IdStatus::Active, Some(now));
        assert!(rec.is_expired_at(now));
        assert!(!rec.is_available_at(now));
        assert!(rec.is_available_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_full_name_requires_both_parts() {
        let mut rec = record(IdStatus::Active, None);
        assert_eq!(rec.full_name(), None);
        rec.first_name = Some("Ada".to_string());
        assert_eq!(rec.full_name(), None);
        rec.last_name = Some("Lovelace".to_string());
        assert_eq!(rec.full_name().as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("Student".parse::<AccountType>().unwrap(), AccountType::Student);
        assert_eq!(" staff ".parse::<AccountType>().unwrap(), AccountType::Staff);
        assert!("teacher".parse::<AccountType>().is_err());
        assert_eq!("REVOKED".parse::<IdStatus>().unwrap(), IdStatus::Revoked);
        assert_eq!("phd".parse::<AcademicLevel>().unwrap(), AcademicLevel::Phd);
        assert!("postdoc".parse::<AcademicLevel>().is_err());
    }

    #[test]
    fn test_id_prefix() {
        assert_eq!(AccountType::Student.id_prefix(), '2');
        assert_eq!(AccountType::Staff.id_prefix(), '3');
    }
}
