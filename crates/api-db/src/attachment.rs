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
//! Network attachments: which NIC is on which network, on which channel.

use model::id::{NetworkId, NicId, NodeId, PortId};
use model::network::{Attachment, AttachmentDetails, AttachmentState};
use sqlx::SqliteConnection;

use crate::{DatabaseError, DatabaseResult};

/// Records a new attachment in the `pending` state. Fails with a unique violation
/// if the NIC already uses the channel or is already on the network.
pub async fn create(
    txn: &mut SqliteConnection,
    nic_id: NicId,
    network_id: NetworkId,
    channel: &str,
) -> DatabaseResult<Attachment> {
    let query = "INSERT INTO network_attachments (nic_id, network_id, channel, state)
        VALUES ($1, $2, $3, $4) RETURNING *";
    sqlx::query_as(query)
        .bind(nic_id)
        .bind(network_id)
        .bind(channel)
        .bind(AttachmentState::Pending)
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn find(
    txn: &mut SqliteConnection,
    nic_id: NicId,
    network_id: NetworkId,
) -> DatabaseResult<Option<Attachment>> {
    let query = "SELECT * FROM network_attachments WHERE nic_id = $1 AND network_id = $2";
    sqlx::query_as(query)
        .bind(nic_id)
        .bind(network_id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn list_for_nic(txn: &mut SqliteConnection, nic_id: NicId) -> DatabaseResult<Vec<Attachment>> {
    let query = "SELECT * FROM network_attachments WHERE nic_id = $1 ORDER BY channel";
    sqlx::query_as(query)
        .bind(nic_id)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

/// Number of attachments held by the NICs of a node.
pub async fn count_for_node(txn: &mut SqliteConnection, node_id: NodeId) -> DatabaseResult<i64> {
    let query = "SELECT COUNT(*) FROM network_attachments
        JOIN nics ON nics.id = network_attachments.nic_id
        WHERE nics.node_id = $1";
    let (count,): (i64,) = sqlx::query_as(query)
        .bind(node_id)
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(count)
}

/// All attachments of a network, resolved to node and NIC labels.
pub async fn list_for_network(
    txn: &mut SqliteConnection,
    network_id: NetworkId,
) -> DatabaseResult<Vec<AttachmentDetails>> {
    let query = "SELECT nodes.label AS node, nics.label AS nic, networks.label AS network,
            network_attachments.channel, network_attachments.state
        FROM network_attachments
        JOIN nics ON nics.id = network_attachments.nic_id
        JOIN nodes ON nodes.id = nics.node_id
        JOIN networks ON networks.id = network_attachments.network_id
        WHERE network_attachments.network_id = $1
        ORDER BY nodes.label, nics.label";
    sqlx::query_as(query)
        .bind(network_id)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

/// Marks the attachment of `nic_id` on `channel` as programmed on the switch.
pub async fn activate(
    txn: &mut SqliteConnection,
    nic_id: NicId,
    channel: &str,
) -> DatabaseResult<bool> {
    let query = "UPDATE network_attachments SET state = $3 WHERE nic_id = $1 AND channel = $2";
    let result = sqlx::query(query)
        .bind(nic_id)
        .bind(channel)
        .bind(AttachmentState::Active)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(txn: &mut SqliteConnection, nic_id: NicId, channel: &str) -> DatabaseResult<bool> {
    let query = "DELETE FROM network_attachments WHERE nic_id = $1 AND channel = $2";
    let result = sqlx::query(query)
        .bind(nic_id)
        .bind(channel)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(result.rows_affected() > 0)
}

/// Removes every attachment of the NIC cabled to `port_id`. Returns how many went away.
pub async fn delete_for_port(txn: &mut SqliteConnection, port_id: PortId) -> DatabaseResult<u64> {
    let query = "DELETE FROM network_attachments
        WHERE nic_id IN (SELECT id FROM nics WHERE port_id = $1)";
    let result = sqlx::query(query)
        .bind(port_id)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(result.rows_affected())
}

pub async fn delete_for_nic(txn: &mut SqliteConnection, nic_id: NicId) -> DatabaseResult<u64> {
    let query = "DELETE FROM network_attachments WHERE nic_id = $1";
    let result = sqlx::query(query)
        .bind(nic_id)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use model::switch::SwitchVendor;

    use super::*;
    use crate::network::NewNetwork;
    use crate::tests::test_pool;

    #[tokio::test]
    async fn attachment_lifecycle() {
        let pool = test_pool().await;
        let mut txn = pool.begin().await.unwrap();

        let node = crate::node::create(&mut txn, "node-0").await.unwrap();
        let mac = model::node::parse_mac_address("00:00:00:00:00:01").unwrap();
        let nic = crate::nic::create(&mut txn, node.id, "eth0", mac).await.unwrap();
        let switch = crate::switch::create(&mut txn, "sw0", SwitchVendor::Mock, &serde_json::json!({}))
            .await
            .unwrap();
        let port = crate::port::create(&mut txn, switch.id, "1").await.unwrap();
        crate::nic::set_port(&mut txn, nic.id, Some(port.id)).await.unwrap();

        let mut networks = Vec::new();
        for (label, net_id) in [("net-0", "100"), ("net-1", "101")] {
            let network = NewNetwork {
                label,
                net_id,
                allocated: true,
                owner_id: None,
            };
            networks.push(crate::network::create(&mut txn, &network).await.unwrap());
        }

        let native = create(&mut txn, nic.id, networks[0].id, "vlan/native").await.unwrap();
        assert_eq!(native.state, AttachmentState::Pending);

        // One network per channel and one channel per network
        assert!(
            create(&mut txn, nic.id, networks[1].id, "vlan/native")
                .await
                .unwrap_err()
                .is_unique_violation()
        );
        assert!(
            create(&mut txn, nic.id, networks[0].id, "vlan/101")
                .await
                .unwrap_err()
                .is_unique_violation()
        );

        create(&mut txn, nic.id, networks[1].id, "vlan/101").await.unwrap();
        assert!(activate(&mut txn, nic.id, "vlan/native").await.unwrap());
        let native = find(&mut txn, nic.id, networks[0].id).await.unwrap().unwrap();
        assert_eq!(native.state, AttachmentState::Active);

        let details = list_for_network(&mut txn, networks[0].id).await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].node, "node-0");
        assert_eq!(details[0].nic, "eth0");
        assert_eq!(count_for_node(&mut txn, node.id).await.unwrap(), 2);

        assert!(delete(&mut txn, nic.id, "vlan/101").await.unwrap());
        assert!(!delete(&mut txn, nic.id, "vlan/101").await.unwrap());
        assert_eq!(delete_for_port(&mut txn, port.id).await.unwrap(), 1);
        assert!(list_for_nic(&mut txn, nic.id).await.unwrap().is_empty());
    }
}
