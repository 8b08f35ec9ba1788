pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_users;
mod m20261001_000002_create_institutional_ids;
mod m20261001_000003_create_categories;
mod m20261001_000004_create_books;
mod m20261001_000005_create_book_borrows;
mod m20261001_000006_create_book_reviews;
mod m20261001_000007_create_book_downloads;
mod m20261001_000008_create_recommendations;
mod m20261001_000009_create_audit_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_users::Migration),
            Box::new(m20261001_000002_create_institutional_ids::Migration),
            Box::new(m20261001_000003_create_categories::Migration),
            Box::new(m20261001_000004_create_books::Migration),
            Box::new(m20261001_000005_create_book_borrows::Migration),
            Box::new(m20261001_000006_create_book_reviews::Migration),
            Box::new(m20261001_000007_create_book_downloads::Migration),
            Box::new(m20261001_000008_create_recommendations::Migration),
            Box::new(m20261001_000009_create_audit_logs::Migration),
        ]
    }
}
