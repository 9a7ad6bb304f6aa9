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
use model::id::ProjectId;
use model::project::Project;
use sqlx::SqliteConnection;

use crate::{DatabaseError, DatabaseResult};

pub async fn create(txn: &mut SqliteConnection, label: &str) -> DatabaseResult<Project> {
    let query = "INSERT INTO projects (label) VALUES ($1) RETURNING *";
    sqlx::query_as(query)
        .bind(label)
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn find_by_label(txn: &mut SqliteConnection, label: &str) -> DatabaseResult<Project> {
    let query = "SELECT * FROM projects WHERE label = $1";
    sqlx::query_as(query)
        .bind(label)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .ok_or_else(|| DatabaseError::not_found("project", label))
}

pub async fn find(txn: &mut SqliteConnection, id: ProjectId) -> DatabaseResult<Project> {
    let query = "SELECT * FROM projects WHERE id = $1";
    sqlx::query_as(query)
        .bind(id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?
        .ok_or_else(|| DatabaseError::not_found("project", id))
}

pub async fn list(txn: &mut SqliteConnection) -> DatabaseResult<Vec<Project>> {
    let query = "SELECT * FROM projects ORDER BY label";
    sqlx::query_as(query)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

/// Deletes a project that owns neither nodes nor networks.
pub async fn delete(txn: &mut SqliteConnection, id: ProjectId) -> DatabaseResult<()> {
    let query = "SELECT
            (SELECT COUNT(*) FROM nodes WHERE project_id = $1),
            (SELECT COUNT(*) FROM networks WHERE owner_id = $1)";
    let (nodes, networks): (i64, i64) = sqlx::query_as(query)
        .bind(id)
        .fetch_one(&mut *txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    if nodes > 0 || networks > 0 {
        return Err(DatabaseError::FailedPrecondition(format!(
            "project {id} still owns {nodes} node(s) and {networks} network(s)"
        )));
    }

    let query = "DELETE FROM network_access WHERE project_id = $1";
    sqlx::query(query)
        .bind(id)
        .execute(&mut *txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;

    let query = "DELETE FROM projects WHERE id = $1";
    let result = sqlx::query(query)
        .bind(id)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("project", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_pool;

    #[tokio::test]
    async fn create_and_delete() {
        let pool = test_pool().await;
        let mut txn = pool.begin().await.unwrap();

        let project = create(&mut txn, "runway").await.unwrap();
        assert_eq!(find_by_label(&mut txn, "runway").await.unwrap(), project);
        assert!(create(&mut txn, "runway").await.unwrap_err().is_unique_violation());

        delete(&mut txn, project.id).await.unwrap();
        assert!(find(&mut txn, project.id).await.unwrap_err().is_not_found());
        assert!(delete(&mut txn, project.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn project_with_nodes_is_kept() {
        let pool = test_pool().await;
        let mut txn = pool.begin().await.unwrap();

        let project = create(&mut txn, "runway").await.unwrap();
        let node = crate::node::create(&mut txn, "node-0").await.unwrap();
        crate::node::set_project(&mut txn, node.id, Some(project.id)).await.unwrap();

        assert!(matches!(
            delete(&mut txn, project.id).await,
            Err(DatabaseError::FailedPrecondition(_))
        ));
        assert_eq!(list(&mut txn).await.unwrap(), vec![project]);
    }
}
