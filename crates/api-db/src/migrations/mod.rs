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

//! Schema migrations, embedded from `crates/api-db/migrations`.

use sqlx::SqlitePool;
use sqlx::migrate::{MigrateError, Migrator};

/// Embedded once. Everything that needs the schema goes through [`migrate`].
static MIGRATOR: Migrator = sqlx::migrate!();

/// Brings the schema of `pool` up to date and returns the version it is at.
#[tracing::instrument(skip(pool))]
pub async fn migrate(pool: &SqlitePool) -> Result<i64, MigrateError> {
    MIGRATOR.run(pool).await?;
    let version = MIGRATOR.iter().map(|m| m.version).max().unwrap_or_default();
    tracing::debug!(version, "Database schema is up to date");
    Ok(version)
}
