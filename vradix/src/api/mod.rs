//! HTTP surface: route handlers and their request/response models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Authentication** (`/api/auth/*`): registration, login, token refresh
//! - **Etymology** (`/api/etymology/*`): analysis, images, featured words, bookmarks, corrections
//! - **Challenges** (`/api/challenges/*`) and **Profile** (`/api/profile/`): gamification
//! - **Core** (`/health/`, `/api/stats/`)
//!
//! All endpoints are annotated for `utoipa`; the rendered reference lives at `/api/docs`.

pub mod handlers;
pub mod models;
