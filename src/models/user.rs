use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub student: bool,
    pub staff: bool,
    pub academic_level: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<Date>,
    #[sea_orm(unique)]
    pub institutional_id_ref: Option<i64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub last_login: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::book_borrow::Entity")]
    Borrows,
    #[sea_orm(has_many = "super::book_review::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::book_download::Entity")]
    Downloads,
}

impl Related<super::book_borrow::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Borrows.def()
    }
}

impl Related<super::book_review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::book_download::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Downloads.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Staff members and administrators share unrestricted library access
    pub fn is_staff_member(&self) -> bool {
        self.staff || self.is_superuser
    }

    pub fn is_admin(&self) -> bool {
        self.is_superuser
    }

    /// "First Last", or the username when no name is on file
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }

    /// Dashboard a freshly logged-in user lands on
    pub fn landing_dashboard(&self) -> &'static str {
        if self.staff {
            "staff"
        } else if self.student {
            "student"
        } else {
            "home"
        }
    }
}
