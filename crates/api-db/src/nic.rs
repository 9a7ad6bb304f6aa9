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
use mac_address::MacAddress;
use model::id::{NicId, NodeId, PortId};
use model::node::Nic;
use sqlx::SqliteConnection;

use crate::{DatabaseError, DatabaseResult};

pub async fn create(
    txn: &mut SqliteConnection,
    node_id: NodeId,
    label: &str,
    mac_address: MacAddress,
) -> DatabaseResult<Nic> {
    let query = "INSERT INTO nics (node_id, label, mac_address) VALUES ($1, $2, $3) RETURNING *";
    sqlx::query_as(query)
        .bind(node_id)
        .bind(label)
        .bind(mac_address.to_string())
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn find(txn: &mut SqliteConnection, id: NicId) -> DatabaseResult<Nic> {
    let query = "SELECT * FROM nics WHERE id = $1";
    sqlx::query_as(query)
        .bind(id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .ok_or_else(|| DatabaseError::not_found("nic", id))
}

pub async fn find_by_label(
    txn: &mut SqliteConnection,
    node_id: NodeId,
    label: &str,
) -> DatabaseResult<Nic> {
    let query = "SELECT * FROM nics WHERE node_id = $1 AND label = $2";
    sqlx::query_as(query)
        .bind(node_id)
        .bind(label)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .ok_or_else(|| DatabaseError::not_found("nic", format!("{node_id}/{label}")))
}

/// The NIC cabled to `port_id`, if there is one.
pub async fn find_by_port(
    txn: &mut SqliteConnection,
    port_id: PortId,
) -> DatabaseResult<Option<Nic>> {
    let query = "SELECT * FROM nics WHERE port_id = $1";
    sqlx::query_as(query)
        .bind(port_id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn list_for_node(txn: &mut SqliteConnection, node_id: NodeId) -> DatabaseResult<Vec<Nic>> {
    let query = "SELECT * FROM nics WHERE node_id = $1 ORDER BY label";
    sqlx::query_as(query)
        .bind(node_id)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

/// Records the cable between a NIC and a port, or removes it with `None`.
/// A port that is already cabled to another NIC fails with a unique violation.
pub async fn set_port(
    txn: &mut SqliteConnection,
    id: NicId,
    port_id: Option<PortId>,
) -> DatabaseResult<Nic> {
    let query = "UPDATE nics SET port_id = $2 WHERE id = $1 RETURNING *";
    sqlx::query_as(query)
        .bind(id)
        .bind(port_id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .ok_or_else(|| DatabaseError::not_found("nic", id))
}

pub async fn delete(txn: &mut SqliteConnection, id: NicId) -> DatabaseResult<()> {
    let query = "DELETE FROM nics WHERE id = $1";
    let result = sqlx::query(query)
        .bind(id)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("nic", id));
    }
    Ok(())
}
