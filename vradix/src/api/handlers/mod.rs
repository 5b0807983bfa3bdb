//! HTTP request handlers for all API endpoints.
//!
//! # Handler Modules
//!
//! - [`auth`]: Registration, login, token refresh and logout
//! - [`etymology`]: Word analysis, image generation, featured and popular words, analysis history
//! - [`corrections`]: Proposed corrections to analyses and their staff approval
//! - [`bookmarks`]: The caller's bookmarked analyses
//! - [`challenges`]: Learning challenges and their completion
//! - [`profile`]: The caller's progress and achievements
//! - [`system`]: Health check and platform statistics
//!
//! # Authentication
//!
//! Handlers that need a caller take a [`CurrentUser`](crate::api::models::users::CurrentUser)
//! argument, which rejects the request with 401 unless a valid bearer access token is sent.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to the matching status code and an
//! `{"error": message}` body.

pub mod auth;
pub mod bookmarks;
pub mod challenges;
pub mod corrections;
pub mod etymology;
pub mod profile;
pub mod system;
