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
use model::id::{PortId, SwitchId};
use model::switch::Port;
use sqlx::SqliteConnection;

use crate::{DatabaseError, DatabaseResult};

// Ports don't store their NIC, the cable is recorded on the NIC side.
const PORT_COLUMNS: &str = "ports.id, ports.switch_id, ports.label, nics.id AS nic_id
    FROM ports LEFT JOIN nics ON nics.port_id = ports.id";

pub async fn create(txn: &mut SqliteConnection, switch_id: SwitchId, label: &str) -> DatabaseResult<Port> {
    let query = "INSERT INTO ports (switch_id, label) VALUES ($1, $2) RETURNING id";
    let (id,): (PortId,) = sqlx::query_as(query)
        .bind(switch_id)
        .bind(label)
        .fetch_one(&mut *txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    find(txn, id).await
}

pub async fn find(txn: &mut SqliteConnection, id: PortId) -> DatabaseResult<Port> {
    let query = format!("SELECT {PORT_COLUMNS} WHERE ports.id = $1");
    sqlx::query_as(&query)
        .bind(id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(&query, e))?
        .ok_or_else(|| DatabaseError::not_found("port", id))
}

pub async fn find_by_label(
    txn: &mut SqliteConnection,
    switch_id: SwitchId,
    label: &str,
) -> DatabaseResult<Port> {
    let query = format!("SELECT {PORT_COLUMNS} WHERE ports.switch_id = $1 AND ports.label = $2");
    sqlx::query_as(&query)
        .bind(switch_id)
        .bind(label)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(&query, e))?
        .ok_or_else(|| DatabaseError::not_found("port", format!("{switch_id}/{label}")))
}

pub async fn list_for_switch(
    txn: &mut SqliteConnection,
    switch_id: SwitchId,
) -> DatabaseResult<Vec<Port>> {
    let query = format!("SELECT {PORT_COLUMNS} WHERE ports.switch_id = $1 ORDER BY ports.label");
    sqlx::query_as(&query)
        .bind(switch_id)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(&query, e))
}

/// Deletes a port that no NIC is cabled to.
pub async fn delete(txn: &mut SqliteConnection, id: PortId) -> DatabaseResult<()> {
    let port = find(&mut *txn, id).await?;
    if let Some(nic_id) = port.nic_id {
        return Err(DatabaseError::FailedPrecondition(format!(
            "port {} is still connected to NIC {nic_id}",
            port.label
        )));
    }

    let query = "DELETE FROM ports WHERE id = $1";
    sqlx::query(query)
        .bind(id)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use model::switch::SwitchVendor;

    use super::*;
    use crate::tests::test_pool;

    #[tokio::test]
    async fn port_reports_its_nic() {
        let pool = test_pool().await;
        let mut txn = pool.begin().await.unwrap();

        let switch = crate::switch::create(&mut txn, "sw0", SwitchVendor::Mock, &serde_json::json!({}))
            .await
            .unwrap();
        let port = create(&mut txn, switch.id, "gi1/0/3").await.unwrap();
        assert_eq!(port.nic_id, None);
        assert!(
            create(&mut txn, switch.id, "gi1/0/3")
                .await
                .unwrap_err()
                .is_unique_violation()
        );

        let node = crate::node::create(&mut txn, "node-0").await.unwrap();
        let mac = model::node::parse_mac_address("00:00:00:00:00:01").unwrap();
        let nic = crate::nic::create(&mut txn, node.id, "eth0", mac).await.unwrap();
        crate::nic::set_port(&mut txn, nic.id, Some(port.id)).await.unwrap();

        let port = find_by_label(&mut txn, switch.id, "gi1/0/3").await.unwrap();
        assert_eq!(port.nic_id, Some(nic.id));
        assert!(matches!(
            delete(&mut txn, port.id).await,
            Err(DatabaseError::FailedPrecondition(_))
        ));

        crate::nic::set_port(&mut txn, nic.id, None).await.unwrap();
        delete(&mut txn, port.id).await.unwrap();
        assert!(list_for_switch(&mut txn, switch.id).await.unwrap().is_empty());
    }
}
