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
use model::id::{NetworkId, ProjectId};
use model::network::Network;
use sqlx::SqliteConnection;

use crate::{DatabaseError, DatabaseResult};

/// Values for a new network row.
#[derive(Debug, Clone)]
pub struct NewNetwork<'a> {
    pub label: &'a str,
    pub net_id: &'a str,
    pub allocated: bool,
    pub owner_id: Option<ProjectId>,
}

/// Inserts the network and, for project owned networks, puts the owner on the access list.
pub async fn create(txn: &mut SqliteConnection, network: &NewNetwork<'_>) -> DatabaseResult<Network> {
    let query = "INSERT INTO networks (label, net_id, allocated, owner_id) VALUES ($1, $2, $3, $4) RETURNING *";
    let created: Network = sqlx::query_as(query)
        .bind(network.label)
        .bind(network.net_id)
        .bind(network.allocated)
        .bind(network.owner_id)
        .fetch_one(&mut *txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;

    if let Some(owner_id) = created.owner_id {
        grant_access(txn, created.id, owner_id).await?;
    }
    Ok(created)
}

pub async fn find(txn: &mut SqliteConnection, id: NetworkId) -> DatabaseResult<Network> {
    let query = "SELECT * FROM networks WHERE id = $1";
    sqlx::query_as(query)
        .bind(id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .ok_or_else(|| DatabaseError::not_found("network", id))
}

pub async fn find_by_label(txn: &mut SqliteConnection, label: &str) -> DatabaseResult<Network> {
    let query = "SELECT * FROM networks WHERE label = $1";
    sqlx::query_as(query)
        .bind(label)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .ok_or_else(|| DatabaseError::not_found("network", label))
}

pub async fn find_by_net_id(
    txn: &mut SqliteConnection,
    net_id: &str,
) -> DatabaseResult<Option<Network>> {
    let query = "SELECT * FROM networks WHERE net_id = $1";
    sqlx::query_as(query)
        .bind(net_id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

/// Deletes a network nothing refers to anymore: no attachment, pending or active,
/// and no pending action.
pub async fn delete(txn: &mut SqliteConnection, id: NetworkId) -> DatabaseResult<Network> {
    let query = "SELECT
            (SELECT COUNT(*) FROM network_attachments WHERE network_id = $1),
            (SELECT COUNT(*) FROM network_actions WHERE network_id = $1 AND status = 'pending')";
    let (attachments, actions): (i64, i64) = sqlx::query_as(query)
        .bind(id)
        .fetch_one(&mut *txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    if attachments > 0 || actions > 0 {
        return Err(DatabaseError::FailedPrecondition(format!(
            "network {id} still has {attachments} attachment(s) and {actions} pending action(s)"
        )));
    }

    let query = "DELETE FROM networks WHERE id = $1 RETURNING *";
    sqlx::query_as(query)
        .bind(id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .ok_or_else(|| DatabaseError::not_found("network", id))
}

/// Returns `false` if the project already had access.
pub async fn grant_access(
    txn: &mut SqliteConnection,
    network_id: NetworkId,
    project_id: ProjectId,
) -> DatabaseResult<bool> {
    let query = "INSERT INTO network_access (network_id, project_id) VALUES ($1, $2)
        ON CONFLICT (network_id, project_id) DO NOTHING";
    let result = sqlx::query(query)
        .bind(network_id)
        .bind(project_id)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(result.rows_affected() > 0)
}

/// Returns `false` if the project had no access.
pub async fn revoke_access(
    txn: &mut SqliteConnection,
    network_id: NetworkId,
    project_id: ProjectId,
) -> DatabaseResult<bool> {
    let query = "DELETE FROM network_access WHERE network_id = $1 AND project_id = $2";
    let result = sqlx::query(query)
        .bind(network_id)
        .bind(project_id)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(result.rows_affected() > 0)
}

/// The projects on the access list of a network. Empty for public networks.
pub async fn access_list(
    txn: &mut SqliteConnection,
    network_id: NetworkId,
) -> DatabaseResult<Vec<ProjectId>> {
    let query = "SELECT project_id FROM network_access WHERE network_id = $1 ORDER BY project_id";
    let rows: Vec<(ProjectId,)> = sqlx::query_as(query)
        .bind(network_id)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_pool;

    #[tokio::test]
    async fn owner_gets_access() {
        let pool = test_pool().await;
        let mut txn = pool.begin().await.unwrap();

        let owner = crate::project::create(&mut txn, "runway").await.unwrap();
        let other = crate::project::create(&mut txn, "taxiway").await.unwrap();
        let network = create(
            &mut txn,
            &NewNetwork {
                label: "net-0",
                net_id: "101",
                allocated: true,
                owner_id: Some(owner.id),
            },
        )
        .await
        .unwrap();
        assert_eq!(access_list(&mut txn, network.id).await.unwrap(), vec![owner.id]);

        assert!(grant_access(&mut txn, network.id, other.id).await.unwrap());
        assert!(!grant_access(&mut txn, network.id, other.id).await.unwrap());
        assert!(revoke_access(&mut txn, network.id, other.id).await.unwrap());
        assert!(!revoke_access(&mut txn, network.id, other.id).await.unwrap());

        let deleted = delete(&mut txn, network.id).await.unwrap();
        assert_eq!(deleted, network);
        assert!(access_list(&mut txn, network.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn net_id_is_unique() {
        let pool = test_pool().await;
        let mut txn = pool.begin().await.unwrap();

        let public = NewNetwork {
            label: "pxe",
            net_id: "5",
            allocated: false,
            owner_id: None,
        };
        let network = create(&mut txn, &public).await.unwrap();
        assert!(network.is_admin_owned());
        assert!(access_list(&mut txn, network.id).await.unwrap().is_empty());
        assert_eq!(
            find_by_net_id(&mut txn, "5").await.unwrap(),
            Some(network.clone())
        );

        let duplicate = NewNetwork {
            label: "pxe-2",
            ..public
        };
        assert!(create(&mut txn, &duplicate).await.unwrap_err().is_unique_violation());
    }
}
