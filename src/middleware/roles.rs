//! Role guards as type-safe authorization extractors
//!
//! Usage in handlers:
//! ```ignore
//! use crate::middleware::{Authorized, roles::*};
//!
//! async fn approve_borrow(
//!     Authorized(staff, _): Authorized<StaffOnly>,
//!     State(state): State<AppState>,
//! ) -> Result<Json<BorrowResponse>> {
//!     // Role already verified
//! }
//! ```

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::models::user;

/// Trait for role marker types
pub trait Role: Send + Sync + 'static {
    /// Human readable name used in the 403 message
    const NAME: &'static str;

    fn allows(user: &user::Model) -> bool;
}

/// Creates zero-sized marker types that implement `Role`
macro_rules! define_roles {
    ($($(#[$meta:meta])* $name:ident($label:expr) => |$user:ident| $check:expr),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Role for $name {
                const NAME: &'static str = $label;

                fn allows($user: &user::Model) -> bool {
                    $check
                }
            }
        )*
    };
}

define_roles! {
    /// Accounts registered with a student ID
    StudentOnly("Student") => |u| u.student,
    /// Library staff and administrators
    StaffOnly("Staff") => |u| u.is_staff_member(),
    /// Administrators
    AdminOnly("Administrator") => |u| u.is_admin(),
}

/// Extractor that requires a role
///
/// Returns 401 when no user is attached to the request and 403 when the user
/// lacks the role.
#[derive(Debug, Clone)]
pub struct Authorized<R: Role>(pub user::Model, pub PhantomData<R>);

impl<R: Role> Authorized<R> {
    pub fn user(&self) -> &user::Model {
        &self.0
    }
}

impl<S, R> FromRequestParts<S> for Authorized<R>
where
    S: Send + Sync,
    R: Role,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        if !R::allows(&auth_user.0) {
            return Err(AppError::Forbidden(format!(
                "{} access required",
                R::NAME
            )));
        }

        Ok(Authorized(auth_user.0.clone(), PhantomData))
    }
}

/// Extractor for any authenticated user
#[derive(Debug, Clone)]
pub struct Authenticated(pub user::Model);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        Ok(Authenticated(auth_user.0.clone()))
    }
}

/// The signed-in user on routes that also serve anonymous visitors
#[derive(Debug, Clone)]
pub struct MaybeAuthenticated(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthenticated
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthenticated(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|u| u.0.clone()),
        ))
    }
}
