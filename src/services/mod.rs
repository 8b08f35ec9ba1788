pub mod access;
pub mod audit;
pub mod authentication;
pub mod borrow;
pub mod catalog;
pub mod institutional_ids;
pub mod registration;
pub mod security;
pub mod statistics;
pub mod storage;

pub use audit::AuditService;
pub use security::*;
pub use storage::MediaStorage;
