use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub timestamp: DateTimeUtc,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: Option<String>, // JSON string for flexible data
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// Audit action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    // Accounts
    Login,
    LoginFailed,
    Logout,
    UserRegistered,
    ProfileUpdated,

    // Institutional IDs
    IdCreated,
    IdUpdated,
    IdDeleted,
    IdStatusChanged,
    IdsGenerated,
    IdsImported,
    IdsExported,

    // Catalog
    BookUploaded,
    CategoryCreated,

    // Borrowing
    BorrowRequested,
    BorrowApproved,
    BorrowRejected,
    BorrowReturned,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Login => write!(f, "login"),
            AuditAction::LoginFailed => write!(f, "login_failed"),
            AuditAction::Logout => write!(f, "logout"),
            AuditAction::UserRegistered => write!(f, "user_registered"),
            AuditAction::ProfileUpdated => write!(f, "profile_updated"),
            AuditAction::IdCreated => write!(f, "institutional_id_created"),
            AuditAction::IdUpdated => write!(f, "institutional_id_updated"),
            AuditAction::IdDeleted => write!(f, "institutional_id_deleted"),
            AuditAction::IdStatusChanged => write!(f, "institutional_id_status_changed"),
            AuditAction::IdsGenerated => write!(f, "institutional_ids_generated"),
            AuditAction::IdsImported => write!(f, "institutional_ids_imported"),
            AuditAction::IdsExported => write!(f, "institutional_ids_exported"),
            AuditAction::BookUploaded => write!(f, "book_uploaded"),
            AuditAction::CategoryCreated => write!(f, "category_created"),
            AuditAction::BorrowRequested => write!(f, "borrow_requested"),
            AuditAction::BorrowApproved => write!(f, "borrow_approved"),
            AuditAction::BorrowRejected => write!(f, "borrow_rejected"),
            AuditAction::BorrowReturned => write!(f, "borrow_returned"),
        }
    }
}

// Resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    User,
    Session,
    InstitutionalId,
    Book,
    Category,
    Borrow,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::User => write!(f, "user"),
            ResourceType::Session => write!(f, "session"),
            ResourceType::InstitutionalId => write!(f, "institutional_id"),
            ResourceType::Book => write!(f, "book"),
            ResourceType::Category => write!(f, "category"),
            ResourceType::Borrow => write!(f, "borrow"),
        }
    }
}
