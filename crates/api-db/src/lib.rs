/*
 * SPDX-FileCopyrightText: Copyright (c) 2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: Apache-2.0
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Database functions for hil-api.
//!
//! Every function takes the connection of an open transaction, so that the caller
//! decides what is committed together. In particular the action log is always
//! written in the same transaction as the model change that motivated it.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod attachment;
pub mod migrations;
pub mod network;
pub mod network_action;
pub mod nic;
pub mod node;
pub mod port;
pub mod project;
pub mod switch;
pub mod vlan_pool;

/// SQLite allows far more, but large batches don't make the inserts any faster
pub const BIND_LIMIT: usize = 900;

#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error("Database query `{query}` failed: {source}")]
    Query {
        query: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Could not {action} transaction: {source}")]
    Transaction {
        action: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Could not connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{0}")]
    FailedPrecondition(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

impl DatabaseError {
    pub fn query(query: &str, source: sqlx::Error) -> Self {
        DatabaseError::Query {
            query: query.to_string(),
            source,
        }
    }

    pub fn internal(message: String) -> Self {
        DatabaseError::Internal(message)
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        DatabaseError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// True when the query failed because it would have violated a UNIQUE constraint
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Query { source, .. } => source
                .as_database_error()
                .is_some_and(|e| e.is_unique_violation()),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
    }
}

/// Opens a connection pool and brings the schema up to date.
///
/// `sqlite::memory:` databases live as long as their connection; callers that use one
/// should pass `max_connections = 1`.
pub async fn connect(url: &str, max_connections: u32) -> DatabaseResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(DatabaseError::Connect)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(DatabaseError::Connect)?;

    migrations::migrate(&pool).await?;
    Ok(pool)
}

/// Begins a transaction on `pool`.
pub async fn begin(pool: &SqlitePool) -> DatabaseResult<sqlx::Transaction<'static, sqlx::Sqlite>> {
    pool.begin()
        .await
        .map_err(|source| DatabaseError::Transaction {
            action: "begin",
            source,
        })
}

/// Commits `txn`, mapping the error like every other database failure.
pub async fn commit(txn: sqlx::Transaction<'_, sqlx::Sqlite>) -> DatabaseResult<()> {
    txn.commit()
        .await
        .map_err(|source| DatabaseError::Transaction {
            action: "commit",
            source,
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A fresh, migrated in-memory database for a single test.
    pub async fn test_pool() -> SqlitePool {
        connect("sqlite::memory:", 1)
            .await
            .expect("failed to create test database")
    }

    #[tokio::test]
    async fn migrations_apply_cleanly() {
        let pool = test_pool().await;
        let mut txn = begin(&pool).await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vlan_pool")
            .fetch_one(&mut *txn)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
