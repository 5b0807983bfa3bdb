//! Persistence layer.
//!
//! Request handlers depend only on the [`handlers::Store`] trait. Two backends implement it:
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │  Arc<dyn Store>
//!        ↓
//! ┌─────────────┐      ┌──────────────┐
//! │   PgStore   │  or  │ InMemoryStore│
//! └──────┬──────┘      └──────────────┘
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Store traits and both implementations
//! - [`models`]: Record structures matching table schemas
//! - [`errors`]: Storage error types
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and run on startup for the PostgreSQL backend. The in-memory
//! backend is seeded with the same default challenges the initial migration inserts.

pub mod errors;
pub mod handlers;
pub mod models;

use std::{sync::Arc, time::Duration};

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::{Config, DatabaseConfig};
use crate::db::handlers::{ChallengeStore, InMemoryStore, PgStore, Store};
use crate::db::models::challenges::{ChallengeCreateDBRequest, ChallengeType, Difficulty};

/// Get the vradix database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Challenges available on a fresh install
pub fn default_challenges() -> Vec<ChallengeCreateDBRequest> {
    vec![
        ChallengeCreateDBRequest {
            title: "Raízes gregas".to_string(),
            description: "Identifique a raiz grega de cinco palavras do cotidiano.".to_string(),
            challenge_type: ChallengeType::Etymology,
            difficulty: Difficulty::Easy,
            xp_reward: 10,
        },
        ChallengeCreateDBRequest {
            title: "Prefixos e sufixos".to_string(),
            description: "Separe prefixo, raiz e sufixo de palavras compostas.".to_string(),
            challenge_type: ChallengeType::Morphology,
            difficulty: Difficulty::Medium,
            xp_reward: 20,
        },
        ChallengeCreateDBRequest {
            title: "Quiz latino".to_string(),
            description: "Responda perguntas sobre palavras de origem latina.".to_string(),
            challenge_type: ChallengeType::Quiz,
            difficulty: Difficulty::Hard,
            xp_reward: 30,
        },
    ]
}

/// Connect to the configured backend, run migrations and seed data.
pub async fn setup_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match &config.database {
        DatabaseConfig::External { url, pool } => {
            info!("Using external database");
            let pg_pool = PgPoolOptions::new()
                .max_connections(pool.max_connections)
                .min_connections(pool.min_connections)
                .acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs))
                .idle_timeout(Duration::from_secs(pool.idle_timeout_secs))
                .max_lifetime(Duration::from_secs(pool.max_lifetime_secs))
                .connect(url)
                .await?;
            migrator().run(&pg_pool).await?;
            Ok(Arc::new(PgStore::new(pg_pool)))
        }
        DatabaseConfig::Memory => {
            info!("Using in-memory store: data will be lost on shutdown");
            let store = InMemoryStore::new();
            for challenge in default_challenges() {
                store.create_challenge(&challenge).await?;
            }
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_config;

    #[tokio::test]
    async fn test_memory_store_is_seeded() {
        let mut config = create_test_config();
        config.database = DatabaseConfig::Memory;

        let store = setup_store(&config).await.unwrap();
        assert_eq!(store.backend_name(), "memory");

        let challenges = store.list_active_challenges(uuid::Uuid::new_v4()).await.unwrap();
        assert_eq!(challenges.len(), 3);
        assert!(challenges.iter().all(|c| c.progress.is_none()));
    }
}
