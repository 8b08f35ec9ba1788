use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One permitted access to a book file (download or inline preview)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "book_downloads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub book_file_id: i64,
    pub user_id: i64,
    pub downloaded_at: DateTimeUtc,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book_file::Entity",
        from = "Column::BookFileId",
        to = "super::book_file::Column::Id",
        on_delete = "Cascade"
    )]
    BookFile,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::book_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookFile.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
