pub mod auth;
pub mod client;
pub mod roles;
pub mod security_headers;

pub use auth::{attach_user, require_auth, AuthenticatedUser};
pub use client::ClientMeta;
pub use roles::*;
pub use security_headers::security_headers;
