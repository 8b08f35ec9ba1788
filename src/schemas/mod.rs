pub mod book;
pub mod borrow;
pub mod institutional_id;
pub mod statistics;
pub mod user;

pub use book::*;
pub use borrow::*;
pub use institutional_id::*;
pub use statistics::*;
pub use user::*;
