//! API request and response data models.
//!
//! These define the public JSON contract and are kept apart from the database models in
//! [`crate::db::models`]. Field names on the analysis endpoints are camelCase because clients
//! depend on them; everything else is snake_case.
//!
//! - [`users`]: user summaries and the authenticated [`users::CurrentUser`]
//! - [`auth`]: registration, login and token payloads
//! - [`etymology`]: analysis requests, the analysis response schema, images and featured words
//! - [`corrections`], [`bookmarks`]: user contributions on analyses
//! - [`challenges`], [`profile`]: gamification
//! - [`system`]: health and statistics
//! - [`pagination`]: shared `skip`/`limit` query parameters

pub mod auth;
pub mod bookmarks;
pub mod challenges;
pub mod corrections;
pub mod etymology;
pub mod pagination;
pub mod profile;
pub mod system;
pub mod users;
