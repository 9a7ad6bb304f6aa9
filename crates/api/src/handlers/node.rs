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

use model::node::{Node, parse_mac_address};
use serde::Serialize;

use super::find_nic;
use crate::api::Api;
use crate::errors::{HilError, HilResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub name: String,
    pub project: Option<String>,
    pub nics: Vec<NicInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NicInfo {
    pub label: String,
    pub macaddr: String,
    pub switch: Option<String>,
    pub port: Option<String>,
    /// Network labels by channel, including attachments that are not applied yet
    pub networks: BTreeMap<String, String>,
}

#[tracing::instrument(skip(api))]
pub(crate) async fn register(api: &Api, label: &str) -> HilResult<Node> {
    let mut txn = api.txn_begin().await?;
    let node = db::node::create(&mut txn, label)
        .await
        .map_err(HilError::on_insert("node", label))?;
    db::commit(txn).await?;
    Ok(node)
}

/// Only free nodes without NICs can be deleted.
#[tracing::instrument(skip(api))]
pub(crate) async fn delete(api: &Api, label: &str) -> HilResult<()> {
    let mut txn = api.txn_begin().await?;
    let node = db::node::find_by_label(&mut txn, label).await?;
    if !node.is_free() {
        return Err(HilError::Blocked(format!(
            "node {label} still belongs to a project"
        )));
    }
    db::node::delete(&mut txn, node.id).await?;
    db::commit(txn).await?;
    Ok(())
}

#[tracing::instrument(skip(api))]
pub(crate) async fn project_connect(api: &Api, project: &str, node: &str) -> HilResult<()> {
    let mut txn = api.txn_begin().await?;
    let project = db::project::find_by_label(&mut txn, project).await?;
    let node = db::node::find_by_label(&mut txn, node).await?;
    if let Some(owner) = node.project_id {
        let owner = db::project::find(&mut txn, owner).await?;
        return Err(HilError::Conflict(format!(
            "node {} already belongs to project {}",
            node.label, owner.label
        )));
    }
    db::node::set_project(&mut txn, node.id, Some(project.id)).await?;
    db::commit(txn).await?;
    Ok(())
}

/// A node only leaves its project once all of its networks are detached
/// and the detaches reached the switches.
#[tracing::instrument(skip(api))]
pub(crate) async fn project_detach(api: &Api, project: &str, node: &str) -> HilResult<()> {
    let mut txn = api.txn_begin().await?;
    let project = db::project::find_by_label(&mut txn, project).await?;
    let node = db::node::find_by_label(&mut txn, node).await?;
    if node.project_id != Some(project.id) {
        return Err(HilError::not_found(
            "node in project",
            format!("{}/{}", project.label, node.label),
        ));
    }
    let attachments = db::attachment::count_for_node(&mut txn, node.id).await?;
    if attachments > 0 {
        return Err(HilError::Blocked(format!(
            "node {} is still attached to {attachments} network(s)",
            node.label
        )));
    }
    let pending = db::network_action::pending_count_for_node(&mut txn, node.id).await?;
    if pending > 0 {
        return Err(HilError::Blocked(format!(
            "node {} has {pending} pending networking action(s)",
            node.label
        )));
    }
    db::node::set_project(&mut txn, node.id, None).await?;
    db::commit(txn).await?;
    Ok(())
}

#[tracing::instrument(skip(api))]
pub(crate) async fn register_nic(
    api: &Api,
    node: &str,
    nic: &str,
    mac_address: &str,
) -> HilResult<()> {
    let mac_address = parse_mac_address(mac_address)?;
    let mut txn = api.txn_begin().await?;
    let node = db::node::find_by_label(&mut txn, node).await?;
    db::nic::create(&mut txn, node.id, nic, mac_address)
        .await
        .map_err(HilError::on_insert("nic", format!("{}/{nic}", node.label)))?;
    db::commit(txn).await?;
    Ok(())
}

/// The NIC has to be unplugged from its port first.
#[tracing::instrument(skip(api))]
pub(crate) async fn delete_nic(api: &Api, node: &str, nic: &str) -> HilResult<()> {
    let mut txn = api.txn_begin().await?;
    let (node, nic) = find_nic(&mut txn, node, nic).await?;
    if nic.port_id.is_some() {
        return Err(HilError::Blocked(format!(
            "nic {}/{} is still connected to a switch port",
            node.label, nic.label
        )));
    }
    if !db::attachment::list_for_nic(&mut txn, nic.id).await?.is_empty() {
        return Err(HilError::Blocked(format!(
            "nic {}/{} is still attached to networks",
            node.label, nic.label
        )));
    }
    db::nic::delete(&mut txn, nic.id).await?;
    db::commit(txn).await?;
    Ok(())
}

pub(crate) async fn show(api: &Api, label: &str) -> HilResult<NodeInfo> {
    let mut txn = api.txn_begin().await?;
    let node = db::node::find_by_label(&mut txn, label).await?;
    let project = match node.project_id {
        Some(id) => Some(db::project::find(&mut txn, id).await?.label),
        None => None,
    };

    let mut nics = Vec::new();
    for nic in db::nic::list_for_node(&mut txn, node.id).await? {
        let (switch, port) = match nic.port_id {
            Some(port_id) => {
                let port = db::port::find(&mut txn, port_id).await?;
                let switch = db::switch::find(&mut txn, port.switch_id).await?;
                (Some(switch.label), Some(port.label))
            }
            None => (None, None),
        };
        let mut networks = BTreeMap::new();
        for attachment in db::attachment::list_for_nic(&mut txn, nic.id).await? {
            let network = db::network::find(&mut txn, attachment.network_id).await?;
            networks.insert(attachment.channel, network.label);
        }
        nics.push(NicInfo {
            label: nic.label,
            macaddr: nic.mac_address.to_string(),
            switch,
            port,
            networks,
        });
    }

    Ok(NodeInfo {
        name: node.label,
        project,
        nics,
    })
}
