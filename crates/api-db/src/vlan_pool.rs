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

//! Persistence for the VLAN pool: one row per tracked tag with an availability flag.

use model::vlan_pool::{VlanPoolSpec, VlanPoolStats};
use sqlx::SqliteConnection;

use super::BIND_LIMIT;
use crate::DatabaseError;

/// Result of trying to take a specific VLAN out of the pool.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VlanClaim {
    /// The VLAN was available and is now taken
    Claimed,
    /// The VLAN is tracked by the pool but already taken
    InUse,
    /// The pool does not track this VLAN
    Untracked,
}

/// Put the VLANs of `spec` into the pool, so they can be allocated later.
/// VLANs that are already tracked keep their current state, so this can run on
/// every start. Returns how many VLANs were added.
pub async fn populate(txn: &mut SqliteConnection, spec: &VlanPoolSpec) -> Result<u64, DatabaseError> {
    let vlans: Vec<u16> = spec.vlans().iter().copied().collect();
    let mut added = 0;
    for chunk in vlans.chunks(BIND_LIMIT) {
        let query = "INSERT INTO vlan_pool (vlan, available) ";
        let mut qb = sqlx::QueryBuilder::new(query);
        qb.push_values(chunk.iter(), |mut b, vlan| {
            b.push_bind(i64::from(*vlan)).push_bind(true);
        });
        qb.push(" ON CONFLICT (vlan) DO NOTHING");
        let result = qb
            .build()
            .execute(&mut *txn)
            .await
            .map_err(|e| DatabaseError::query(query, e))?;
        added += result.rows_affected();
    }
    adopt_claimed(txn).await?;
    Ok(added)
}

/// Networks may have been created on a VLAN before the pool tracked it. Once the
/// pool covers such a VLAN it is taken, and the network returns it to the pool
/// when it is deleted.
async fn adopt_claimed(txn: &mut SqliteConnection) -> Result<(), DatabaseError> {
    let query = "UPDATE networks SET allocated = 1
        WHERE allocated = 0 AND net_id <> '' AND net_id NOT GLOB '*[^0-9]*'
        AND CAST(net_id AS INTEGER) IN (SELECT vlan FROM vlan_pool)";
    let adopted = sqlx::query(query)
        .execute(&mut *txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .rows_affected();

    let query = "UPDATE vlan_pool SET available = 0
        WHERE available = 1 AND vlan IN (
            SELECT CAST(net_id AS INTEGER) FROM networks
            WHERE net_id <> '' AND net_id NOT GLOB '*[^0-9]*')";
    sqlx::query(query)
        .execute(&mut *txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;

    if adopted > 0 {
        tracing::info!(adopted, "VLANs of existing networks are now tracked by the pool");
    }
    Ok(())
}

/// Take one available VLAN out of the pool. `None` means the pool is exhausted.
///
/// The select and the update are one statement, so two transactions can never
/// walk away with the same VLAN.
pub async fn allocate(txn: &mut SqliteConnection) -> Result<Option<u16>, DatabaseError> {
    let query = "UPDATE vlan_pool SET available = 0
        WHERE vlan = (SELECT vlan FROM vlan_pool WHERE available = 1 ORDER BY vlan LIMIT 1)
        RETURNING vlan";
    let allocated: Option<(i64,)> = sqlx::query_as(query)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    allocated.map(|(vlan,)| to_vlan(vlan)).transpose()
}

/// Take a specific VLAN out of the pool.
pub async fn claim(txn: &mut SqliteConnection, vlan: u16) -> Result<VlanClaim, DatabaseError> {
    let query = "UPDATE vlan_pool SET available = 0 WHERE vlan = $1 AND available = 1 RETURNING vlan";
    let claimed: Option<(i64,)> = sqlx::query_as(query)
        .bind(i64::from(vlan))
        .fetch_optional(&mut *txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    if claimed.is_some() {
        return Ok(VlanClaim::Claimed);
    }

    match is_available(txn, vlan).await? {
        Some(_) => Ok(VlanClaim::InUse),
        None => Ok(VlanClaim::Untracked),
    }
}

/// Return a VLAN to the pool. Returns `false` if the pool does not track it.
pub async fn release(txn: &mut SqliteConnection, vlan: u16) -> Result<bool, DatabaseError> {
    let query = "UPDATE vlan_pool SET available = 1 WHERE vlan = $1 RETURNING vlan";
    let released: Option<(i64,)> = sqlx::query_as(query)
        .bind(i64::from(vlan))
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(released.is_some())
}

/// `None` if the VLAN is not tracked, otherwise whether it can be allocated.
pub async fn is_available(
    txn: &mut SqliteConnection,
    vlan: u16,
) -> Result<Option<bool>, DatabaseError> {
    let query = "SELECT available FROM vlan_pool WHERE vlan = $1";
    let row: Option<(bool,)> = sqlx::query_as(query)
        .bind(i64::from(vlan))
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(row.map(|(available,)| available))
}

pub async fn stats(txn: &mut SqliteConnection) -> Result<VlanPoolStats, DatabaseError> {
    let query = "SELECT
            COALESCE(SUM(CASE WHEN available THEN 0 ELSE 1 END), 0) AS used,
            COALESCE(SUM(CASE WHEN available THEN 1 ELSE 0 END), 0) AS free
        FROM vlan_pool";
    sqlx::query_as(query)
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

fn to_vlan(value: i64) -> Result<u16, DatabaseError> {
    u16::try_from(value)
        .map_err(|_| DatabaseError::internal(format!("vlan_pool holds out of range value {value}")))
}
