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
use model::id::{NodeId, ProjectId};
use model::node::Node;
use sqlx::SqliteConnection;

use crate::{DatabaseError, DatabaseResult};

pub async fn create(txn: &mut SqliteConnection, label: &str) -> DatabaseResult<Node> {
    let query = "INSERT INTO nodes (label) VALUES ($1) RETURNING *";
    sqlx::query_as(query)
        .bind(label)
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn find_by_label(txn: &mut SqliteConnection, label: &str) -> DatabaseResult<Node> {
    let query = "SELECT * FROM nodes WHERE label = $1";
    sqlx::query_as(query)
        .bind(label)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .ok_or_else(|| DatabaseError::not_found("node", label))
}

pub async fn find(txn: &mut SqliteConnection, id: NodeId) -> DatabaseResult<Node> {
    let query = "SELECT * FROM nodes WHERE id = $1";
    sqlx::query_as(query)
        .bind(id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .ok_or_else(|| DatabaseError::not_found("node", id))
}

pub async fn list_for_project(
    txn: &mut SqliteConnection,
    project_id: ProjectId,
) -> DatabaseResult<Vec<Node>> {
    let query = "SELECT * FROM nodes WHERE project_id = $1 ORDER BY label";
    sqlx::query_as(query)
        .bind(project_id)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

/// Moves a node into a project, or back to the free pool with `None`.
pub async fn set_project(
    txn: &mut SqliteConnection,
    id: NodeId,
    project_id: Option<ProjectId>,
) -> DatabaseResult<Node> {
    let query = "UPDATE nodes SET project_id = $2 WHERE id = $1 RETURNING *";
    sqlx::query_as(query)
        .bind(id)
        .bind(project_id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .ok_or_else(|| DatabaseError::not_found("node", id))
}

/// Deletes a node that has no NICs left.
pub async fn delete(txn: &mut SqliteConnection, id: NodeId) -> DatabaseResult<()> {
    let query = "SELECT COUNT(*) FROM nics WHERE node_id = $1";
    let (nics,): (i64,) = sqlx::query_as(query)
        .bind(id)
        .fetch_one(&mut *txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    if nics > 0 {
        return Err(DatabaseError::FailedPrecondition(format!(
            "node {id} still has {nics} NIC(s)"
        )));
    }

    let query = "DELETE FROM nodes WHERE id = $1";
    let result = sqlx::query(query)
        .bind(id)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("node", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_pool;

    #[tokio::test]
    async fn node_moves_between_pool_and_project() {
        let pool = test_pool().await;
        let mut txn = pool.begin().await.unwrap();

        let project = crate::project::create(&mut txn, "runway").await.unwrap();
        let node = create(&mut txn, "node-0").await.unwrap();
        assert!(node.is_free());

        let node = set_project(&mut txn, node.id, Some(project.id)).await.unwrap();
        assert_eq!(node.project_id, Some(project.id));
        assert_eq!(
            list_for_project(&mut txn, project.id).await.unwrap(),
            vec![node.clone()]
        );

        let node = set_project(&mut txn, node.id, None).await.unwrap();
        assert!(node.is_free());
        delete(&mut txn, node.id).await.unwrap();
        assert!(find_by_label(&mut txn, "node-0").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn node_with_nics_is_kept() {
        let pool = test_pool().await;
        let mut txn = pool.begin().await.unwrap();

        let node = create(&mut txn, "node-0").await.unwrap();
        let mac = model::node::parse_mac_address("00:11:22:33:44:55").unwrap();
        crate::nic::create(&mut txn, node.id, "eth0", mac).await.unwrap();
        assert!(matches!(
            delete(&mut txn, node.id).await,
            Err(DatabaseError::FailedPrecondition(_))
        ));
    }
}
