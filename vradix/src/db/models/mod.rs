//! Database record models matching table schemas.
//!
//! These are the request and response types exchanged with the store traits in
//! [`crate::db::handlers`]. They are kept separate from the API models so that storage and
//! wire representations can evolve independently.
//!
//! - [`users`]: User accounts, gamification progress and achievements
//! - [`words`]: Canonical word origin records
//! - [`analyses`]: AI etymology analyses and their lifecycle status
//! - [`corrections`]: Proposed edits to analysis fields
//! - [`bookmarks`]: Saved analyses per user
//! - [`searches`]: Popular search counters and featured words
//! - [`challenges`]: Learning challenges and per-user completion
//! - [`usage`]: External API audit records

pub mod analyses;
pub mod bookmarks;
pub mod challenges;
pub mod corrections;
pub mod searches;
pub mod usage;
pub mod users;
pub mod words;
