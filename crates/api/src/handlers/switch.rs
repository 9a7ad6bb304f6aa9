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
use std::collections::BTreeMap;

use model::switch::{Switch, SwitchVendor};
use serde::Serialize;
use switch::SwitchDriverFactory;

use super::{ensure_no_pending_actions, find_nic, find_port};
use crate::api::Api;
use crate::errors::{HilError, HilResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    pub switch: String,
    pub port: String,
    pub node: Option<String>,
    pub nic: Option<String>,
    /// Network labels by channel, as recorded in the database
    pub networks: BTreeMap<String, String>,
}

/// Records a switch after its vendor accepted the configuration.
#[tracing::instrument(skip(api, config))]
pub(crate) async fn register(
    api: &Api,
    label: &str,
    vendor: SwitchVendor,
    config: &serde_json::Value,
) -> HilResult<Switch> {
    SwitchDriverFactory::validate_config(vendor, config)
        .map_err(|e| HilError::InvalidArgument(e.to_string()))?;

    let mut txn = api.txn_begin().await?;
    let switch = db::switch::create(&mut txn, label, vendor, config)
        .await
        .map_err(HilError::on_insert("switch", label))?;
    db::commit(txn).await?;
    Ok(switch)
}

#[tracing::instrument(skip(api))]
pub(crate) async fn delete(api: &Api, label: &str) -> HilResult<()> {
    let mut txn = api.txn_begin().await?;
    let switch = db::switch::find_by_label(&mut txn, label).await?;
    db::switch::delete(&mut txn, switch.id).await?;
    db::commit(txn).await?;
    api.engine.forget_switch(switch.id).await;
    Ok(())
}

#[tracing::instrument(skip(api))]
pub(crate) async fn register_port(api: &Api, switch: &str, port: &str) -> HilResult<()> {
    let mut txn = api.txn_begin().await?;
    let switch = db::switch::find_by_label(&mut txn, switch).await?;
    db::port::create(&mut txn, switch.id, port)
        .await
        .map_err(HilError::on_insert("port", format!("{}/{port}", switch.label)))?;
    db::commit(txn).await?;

    // Mocked hardware only knows the ports it was told about
    if switch.vendor == SwitchVendor::Mock {
        api.engine
            .factory()
            .mock_fabric()
            .add_port(&switch.label, port);
    }
    Ok(())
}

#[tracing::instrument(skip(api))]
pub(crate) async fn delete_port(api: &Api, switch: &str, port: &str) -> HilResult<()> {
    let mut txn = api.txn_begin().await?;
    let (_, port) = find_port(&mut txn, switch, port).await?;
    ensure_no_pending_actions(&mut txn, &port).await?;
    db::port::delete(&mut txn, port.id).await?;
    db::commit(txn).await?;
    Ok(())
}

/// Records the cable between a port and a NIC. Neither side may be cabled already.
#[tracing::instrument(skip(api))]
pub(crate) async fn port_connect_nic(
    api: &Api,
    switch: &str,
    port: &str,
    node: &str,
    nic: &str,
) -> HilResult<()> {
    let mut txn = api.txn_begin().await?;
    let (switch, port) = find_port(&mut txn, switch, port).await?;
    let (node, nic) = find_nic(&mut txn, node, nic).await?;
    let port_name = format!("{}/{}", switch.label, port.label);

    if port.nic_id.is_some() {
        return Err(HilError::Conflict(format!(
            "port {port_name} is already connected to a nic"
        )));
    }
    if nic.port_id.is_some() {
        return Err(HilError::Conflict(format!(
            "nic {}/{} is already connected to a port",
            node.label, nic.label
        )));
    }
    db::nic::set_port(&mut txn, nic.id, Some(port.id))
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                HilError::Conflict(format!("port {port_name} is already connected to a nic"))
            } else {
                e.into()
            }
        })?;
    db::commit(txn).await?;
    Ok(())
}

/// Unplugs the NIC from the port. The NIC has to be off all networks first.
#[tracing::instrument(skip(api))]
pub(crate) async fn port_detach_nic(api: &Api, switch: &str, port: &str) -> HilResult<()> {
    let mut txn = api.txn_begin().await?;
    let (switch, port) = find_port(&mut txn, switch, port).await?;
    let port_name = format!("{}/{}", switch.label, port.label);
    let nic = db::nic::find_by_port(&mut txn, port.id)
        .await?
        .ok_or_else(|| HilError::not_found("nic on port", &port_name))?;

    ensure_no_pending_actions(&mut txn, &port).await?;
    if !db::attachment::list_for_nic(&mut txn, nic.id).await?.is_empty() {
        return Err(HilError::Blocked(format!(
            "the nic on port {port_name} is still attached to networks"
        )));
    }
    db::nic::set_port(&mut txn, nic.id, None).await?;
    db::commit(txn).await?;
    Ok(())
}

pub(crate) async fn show_port(api: &Api, switch: &str, port: &str) -> HilResult<PortInfo> {
    let mut txn = api.txn_begin().await?;
    let (switch, port) = find_port(&mut txn, switch, port).await?;

    let mut info = PortInfo {
        switch: switch.label,
        port: port.label,
        node: None,
        nic: None,
        networks: BTreeMap::new(),
    };
    if let Some(nic) = db::nic::find_by_port(&mut txn, port.id).await? {
        let node = db::node::find(&mut txn, nic.node_id).await?;
        for attachment in db::attachment::list_for_nic(&mut txn, nic.id).await? {
            let network = db::network::find(&mut txn, attachment.network_id).await?;
            info.networks.insert(attachment.channel, network.label);
        }
        info.node = Some(node.label);
        info.nic = Some(nic.label);
    }
    Ok(info)
}
