use super::env_parse;

/// Loan period applied when a borrow request has no explicit due date
pub const DEFAULT_LOAN_DAYS: i64 = 14;

/// Books per catalog page
pub const DEFAULT_PAGE_SIZE: u64 = 12;

#[derive(Debug, Clone)]
pub struct LibraryConfig {
    pub loan_days: i64,
    pub page_size: u64,
}

impl LibraryConfig {
    pub fn from_env() -> Self {
        Self {
            loan_days: env_parse("ACADEMIALINK_LOAN_DAYS", DEFAULT_LOAN_DAYS),
            page_size: env_parse("ACADEMIALINK_PAGE_SIZE", DEFAULT_PAGE_SIZE),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            loan_days: DEFAULT_LOAN_DAYS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
