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
use model::id::SwitchId;
use model::switch::{Switch, SwitchVendor};
use sqlx::SqliteConnection;

use crate::{DatabaseError, DatabaseResult};

pub async fn create(
    txn: &mut SqliteConnection,
    label: &str,
    vendor: SwitchVendor,
    config: &serde_json::Value,
) -> DatabaseResult<Switch> {
    let query = "INSERT INTO switches (label, vendor, config) VALUES ($1, $2, $3) RETURNING *";
    sqlx::query_as(query)
        .bind(label)
        .bind(vendor.to_string())
        .bind(config.to_string())
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn find(txn: &mut SqliteConnection, id: SwitchId) -> DatabaseResult<Switch> {
    let query = "SELECT * FROM switches WHERE id = $1";
    sqlx::query_as(query)
        .bind(id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .ok_or_else(|| DatabaseError::not_found("switch", id))
}

pub async fn find_by_label(txn: &mut SqliteConnection, label: &str) -> DatabaseResult<Switch> {
    let query = "SELECT * FROM switches WHERE label = $1";
    sqlx::query_as(query)
        .bind(label)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .ok_or_else(|| DatabaseError::not_found("switch", label))
}

/// Deletes a switch without ports.
pub async fn delete(txn: &mut SqliteConnection, id: SwitchId) -> DatabaseResult<()> {
    let query = "SELECT COUNT(*) FROM ports WHERE switch_id = $1";
    let (ports,): (i64,) = sqlx::query_as(query)
        .bind(id)
        .fetch_one(&mut *txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    if ports > 0 {
        return Err(DatabaseError::FailedPrecondition(format!(
            "switch {id} still has {ports} port(s)"
        )));
    }

    let query = "DELETE FROM switches WHERE id = $1";
    let result = sqlx::query(query)
        .bind(id)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("switch", id));
    }
    Ok(())
}
