//! Authentication and authorization.
//!
//! Clients authenticate with stateless JWT bearer tokens:
//!
//! - `POST /api/auth/register/` and `POST /api/auth/login/` issue an **access** token and a
//!   **refresh** token
//! - Access tokens go in the `Authorization: Bearer <token>` header of every protected request
//! - `POST /api/auth/refresh/` trades a refresh token for a new access token
//!
//! Logout is client-side: tokens are not stored, so they stay valid until they expire.
//!
//! # Authorization
//!
//! There are two privilege levels. Regular users act on their own analyses, bookmarks and
//! challenges. Staff users (`is_staff`) may additionally approve corrections, curate featured
//! words and create challenges. See [`CurrentUser::require_staff`](crate::api::models::users::CurrentUser::require_staff).
//!
//! # Modules
//!
//! - [`current_user`]: Extractor for the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`session`]: JWT creation and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use vradix::api::models::users::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> String {
//!     format!("Hello, {}!", current_user.username)
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod session;
