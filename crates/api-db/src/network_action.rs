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
//! The action log. Rows are appended in the transaction that changes the model and
//! consumed by the reconciliation engine, which marks them `done` once the switch
//! has been programmed. Finished rows are kept for inspection.

use model::id::{NetworkActionId, NetworkId, NicId, NodeId, PortId, SwitchId};
use model::network_action::{NetworkAction, NetworkActionStatus, PortAction};
use sqlx::SqliteConnection;

use crate::{DatabaseError, DatabaseResult};

const ACTION_COLUMNS: &str = "network_actions.*, ports.label AS port
    FROM network_actions JOIN ports ON ports.id = network_actions.port_id";

/// Values for a new action log entry.
#[derive(Debug, Clone)]
pub struct NewNetworkAction<'a> {
    pub switch_id: SwitchId,
    pub port_id: PortId,
    pub nic_id: Option<NicId>,
    pub network_id: Option<NetworkId>,
    pub action: &'a PortAction,
}

pub async fn enqueue(
    txn: &mut SqliteConnection,
    new: &NewNetworkAction<'_>,
) -> DatabaseResult<NetworkActionId> {
    let query = "INSERT INTO network_actions (switch_id, port_id, nic_id, network_id, kind, channel, net_id, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id";
    let (id,): (NetworkActionId,) = sqlx::query_as(query)
        .bind(new.switch_id)
        .bind(new.port_id)
        .bind(new.nic_id)
        .bind(new.network_id)
        .bind(new.action.kind().to_string())
        .bind(new.action.channel())
        .bind(new.action.net_id())
        .bind(NetworkActionStatus::Pending)
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(id)
}

pub async fn find(txn: &mut SqliteConnection, id: NetworkActionId) -> DatabaseResult<NetworkAction> {
    let query = format!("SELECT {ACTION_COLUMNS} WHERE network_actions.id = $1");
    sqlx::query_as(&query)
        .bind(id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(&query, e))?
        .ok_or_else(|| DatabaseError::not_found("networking action", id))
}

/// Switches that have at least one pending action, in id order.
pub async fn pending_switches(txn: &mut SqliteConnection) -> DatabaseResult<Vec<SwitchId>> {
    let query = "SELECT DISTINCT switch_id FROM network_actions WHERE status = 'pending' ORDER BY switch_id";
    let rows: Vec<(SwitchId,)> = sqlx::query_as(query)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// The pending actions of a switch in the order they have to be applied.
pub async fn pending_for_switch(
    txn: &mut SqliteConnection,
    switch_id: SwitchId,
) -> DatabaseResult<Vec<NetworkAction>> {
    let query = format!(
        "SELECT {ACTION_COLUMNS}
        WHERE network_actions.switch_id = $1 AND network_actions.status = 'pending'
        ORDER BY network_actions.id"
    );
    sqlx::query_as(&query)
        .bind(switch_id)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(&query, e))
}

pub async fn pending_count_for_port(txn: &mut SqliteConnection, port_id: PortId) -> DatabaseResult<i64> {
    let query = "SELECT COUNT(*) FROM network_actions WHERE port_id = $1 AND status = 'pending'";
    let (count,): (i64,) = sqlx::query_as(query)
        .bind(port_id)
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(count)
}

/// Pending actions that were queued for any NIC of `node_id`.
pub async fn pending_count_for_node(txn: &mut SqliteConnection, node_id: NodeId) -> DatabaseResult<i64> {
    let query = "SELECT COUNT(*) FROM network_actions
        JOIN nics ON nics.id = network_actions.nic_id
        WHERE nics.node_id = $1 AND network_actions.status = 'pending'";
    let (count,): (i64,) = sqlx::query_as(query)
        .bind(node_id)
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(count)
}

/// Marks a pending action as applied. Returns `false` if it was not pending anymore.
pub async fn mark_done(txn: &mut SqliteConnection, id: NetworkActionId) -> DatabaseResult<bool> {
    let query = "UPDATE network_actions SET status = $2, completed = CURRENT_TIMESTAMP
        WHERE id = $1 AND status = 'pending'";
    let result = sqlx::query(query)
        .bind(id)
        .bind(NetworkActionStatus::Done)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use model::switch::SwitchVendor;

    use super::*;
    use crate::tests::test_pool;

    #[tokio::test]
    async fn pending_actions_are_ordered_per_switch() {
        let pool = test_pool().await;
        let mut txn = pool.begin().await.unwrap();

        let sw0 = crate::switch::create(&mut txn, "sw0", SwitchVendor::Mock, &serde_json::json!({}))
            .await
            .unwrap();
        let sw1 = crate::switch::create(&mut txn, "sw1", SwitchVendor::Mock, &serde_json::json!({}))
            .await
            .unwrap();
        let p0 = crate::port::create(&mut txn, sw0.id, "1").await.unwrap();
        let p1 = crate::port::create(&mut txn, sw0.id, "2").await.unwrap();
        let p2 = crate::port::create(&mut txn, sw1.id, "1").await.unwrap();

        let attach = PortAction::Attach {
            channel: "vlan/native".to_string(),
            net_id: "100".to_string(),
        };
        let mut ids = Vec::new();
        for port in [&p1, &p0, &p2] {
            let new = NewNetworkAction {
                switch_id: port.switch_id,
                port_id: port.id,
                nic_id: None,
                network_id: None,
                action: &attach,
            };
            ids.push(enqueue(&mut txn, &new).await.unwrap());
        }
        let revert = NewNetworkAction {
            switch_id: sw0.id,
            port_id: p1.id,
            nic_id: None,
            network_id: None,
            action: &PortAction::Revert,
        };
        ids.push(enqueue(&mut txn, &revert).await.unwrap());

        assert_eq!(pending_switches(&mut txn).await.unwrap(), vec![sw0.id, sw1.id]);

        let pending = pending_for_switch(&mut txn, sw0.id).await.unwrap();
        let order: Vec<_> = pending.iter().map(|a| a.id).collect();
        assert_eq!(order, vec![ids[0], ids[1], ids[3]]);
        assert_eq!(pending[0].port, "2");
        assert_eq!(pending[0].action, attach);
        assert_eq!(pending[2].action, PortAction::Revert);
        assert_eq!(pending_count_for_port(&mut txn, p1.id).await.unwrap(), 2);

        assert!(mark_done(&mut txn, ids[2]).await.unwrap());
        assert!(!mark_done(&mut txn, ids[2]).await.unwrap());
        assert_eq!(pending_switches(&mut txn).await.unwrap(), vec![sw0.id]);
        assert_eq!(
            find(&mut txn, ids[2]).await.unwrap().status,
            NetworkActionStatus::Done
        );
    }

    #[tokio::test]
    async fn detach_keeps_its_channel() {
        let pool = test_pool().await;
        let mut txn = pool.begin().await.unwrap();

        let switch = crate::switch::create(&mut txn, "sw0", SwitchVendor::Mock, &serde_json::json!({}))
            .await
            .unwrap();
        let port = crate::port::create(&mut txn, switch.id, "1").await.unwrap();
        let detach = PortAction::Detach {
            channel: "vlan/7".to_string(),
        };
        let id = enqueue(
            &mut txn,
            &NewNetworkAction {
                switch_id: switch.id,
                port_id: port.id,
                nic_id: None,
                network_id: None,
                action: &detach,
            },
        )
        .await
        .unwrap();

        let action = find(&mut txn, id).await.unwrap();
        assert_eq!(action.action, detach);
        assert_eq!(action.status, NetworkActionStatus::Pending);
        assert!(find(&mut txn, NetworkActionId(id.0 + 1)).await.unwrap_err().is_not_found());
    }
}
