pub mod audit_log;
pub mod book;
pub mod book_borrow;
pub mod book_download;
pub mod book_file;
pub mod book_review;
pub mod category;
pub mod institutional_id;
pub mod recommendation;
pub mod user;

/// A stored enum column held a value no variant matches
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[allow(unused_imports)]
pub mod prelude {
    pub use super::audit_log::{self, Entity as AuditLog};
    pub use super::book::{self, Entity as Book};
    pub use super::book_borrow::{self, Entity as BookBorrow};
    pub use super::book_download::{self, Entity as BookDownload};
    pub use super::book_file::{self, Entity as BookFile};
    pub use super::book_review::{self, Entity as BookReview};
    pub use super::category::{self, Entity as Category};
    pub use super::institutional_id::{self, Entity as InstitutionalId};
    pub use super::recommendation::{self, Entity as Recommendation};
    pub use super::user::{self, Entity as User};
}
