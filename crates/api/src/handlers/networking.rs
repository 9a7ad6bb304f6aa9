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
use model::id::NetworkActionId;
use model::network::Network;
use model::network_action::{NetworkActionStatus, PortAction};
use model::node::{Nic, Node};
use model::switch::{Port, PortOperation, Switch};
use sqlx::SqliteConnection;
use switch::PortNetworks;

use super::{ensure_no_pending_actions, find_nic, find_port};
use crate::api::Api;
use crate::errors::{HilError, HilResult};
use crate::network_actions::ApplyNetworkingReport;

/// Queues the attachment of a NIC to a network. The attachment is recorded as
/// `pending` right away and becomes `active` once `apply_networking` programmed the switch.
#[tracing::instrument(skip(api))]
pub(crate) async fn node_connect_network(
    api: &Api,
    node: &str,
    nic: &str,
    network: &str,
    channel: Option<&str>,
) -> HilResult<NetworkActionId> {
    let mut txn = api.txn_begin().await?;
    let (node, nic) = find_nic(&mut txn, node, nic).await?;
    let network = db::network::find_by_label(&mut txn, network).await?;
    ensure_network_access(&mut txn, &node, &network).await?;

    let channel = channel
        .map(str::to_string)
        .unwrap_or_else(|| api.allocator.default_channel());
    if !api.allocator.is_legal_channel_for(&channel, &network.net_id) {
        return Err(HilError::InvalidArgument(format!(
            "channel {channel} can not carry network {}",
            network.label
        )));
    }

    let (switch, port) = cabled_port(&mut txn, &node, &nic).await?;
    ensure_no_pending_actions(&mut txn, &port).await?;

    let existing = db::attachment::list_for_nic(&mut txn, nic.id).await?;
    if existing.iter().any(|a| a.network_id == network.id) {
        return Err(HilError::Blocked(format!(
            "nic {}/{} is already attached to network {}",
            node.label, nic.label, network.label
        )));
    }
    if existing.iter().any(|a| a.channel == channel) {
        return Err(HilError::Blocked(format!(
            "channel {channel} of nic {}/{} is already in use",
            node.label, nic.label
        )));
    }
    switch
        .vendor
        .check_operation(PortOperation::Connect, &channel, &existing)?;

    db::attachment::create(&mut txn, nic.id, network.id, &channel).await?;
    let action_id = db::network_action::enqueue(
        &mut txn,
        &db::network_action::NewNetworkAction {
            switch_id: switch.id,
            port_id: port.id,
            nic_id: Some(nic.id),
            network_id: Some(network.id),
            action: &PortAction::Attach {
                channel: channel.clone(),
                net_id: network.net_id.clone(),
            },
        },
    )
    .await?;
    db::commit(txn).await?;

    tracing::info!(%action_id, switch = %switch.label, port = %port.label, %channel, "Queued attach");
    Ok(action_id)
}

/// Queues the removal of a NIC from a network. The attachment goes away once
/// `apply_networking` programmed the switch.
#[tracing::instrument(skip(api))]
pub(crate) async fn node_detach_network(
    api: &Api,
    node: &str,
    nic: &str,
    network: &str,
) -> HilResult<NetworkActionId> {
    let mut txn = api.txn_begin().await?;
    let (node, nic) = find_nic(&mut txn, node, nic).await?;
    let network = db::network::find_by_label(&mut txn, network).await?;
    let attachment = db::attachment::find(&mut txn, nic.id, network.id)
        .await?
        .ok_or_else(|| {
            HilError::not_found(
                "attachment",
                format!("{}/{} on {}", node.label, nic.label, network.label),
            )
        })?;

    let (switch, port) = cabled_port(&mut txn, &node, &nic).await?;
    ensure_no_pending_actions(&mut txn, &port).await?;

    let existing = db::attachment::list_for_nic(&mut txn, nic.id).await?;
    switch
        .vendor
        .check_operation(PortOperation::Detach, &attachment.channel, &existing)?;

    let action_id = db::network_action::enqueue(
        &mut txn,
        &db::network_action::NewNetworkAction {
            switch_id: switch.id,
            port_id: port.id,
            nic_id: Some(nic.id),
            network_id: Some(network.id),
            action: &PortAction::Detach {
                channel: attachment.channel.clone(),
            },
        },
    )
    .await?;
    db::commit(txn).await?;

    tracing::info!(%action_id, switch = %switch.label, port = %port.label, channel = %attachment.channel, "Queued detach");
    Ok(action_id)
}

/// Queues the removal of every network from a port.
#[tracing::instrument(skip(api))]
pub(crate) async fn port_revert(api: &Api, switch: &str, port: &str) -> HilResult<NetworkActionId> {
    let mut txn = api.txn_begin().await?;
    let (switch, port) = find_port(&mut txn, switch, port).await?;
    let nic = db::nic::find_by_port(&mut txn, port.id)
        .await?
        .ok_or_else(|| HilError::not_found("nic on port", format!("{}/{}", switch.label, port.label)))?;
    ensure_no_pending_actions(&mut txn, &port).await?;

    let action_id = db::network_action::enqueue(
        &mut txn,
        &db::network_action::NewNetworkAction {
            switch_id: switch.id,
            port_id: port.id,
            nic_id: Some(nic.id),
            network_id: None,
            action: &PortAction::Revert,
        },
    )
    .await?;
    db::commit(txn).await?;

    tracing::info!(%action_id, switch = %switch.label, port = %port.label, "Queued revert");
    Ok(action_id)
}

pub(crate) async fn show_networking_action(
    api: &Api,
    id: NetworkActionId,
) -> HilResult<NetworkActionStatus> {
    let mut txn = api.txn_begin().await?;
    let action = db::network_action::find(&mut txn, id).await?;
    Ok(action.status)
}

pub(crate) async fn apply_networking(api: &Api) -> HilResult<ApplyNetworkingReport> {
    api.engine.apply_networking().await
}

/// What the switch reports for a port, read through a driver session.
pub(crate) async fn port_networks(api: &Api, switch: &str, port: &str) -> HilResult<PortNetworks> {
    let mut txn = api.txn_begin().await?;
    let (switch, port) = find_port(&mut txn, switch, port).await?;
    db::commit(txn).await?;

    Ok(api.engine.port_networks(&switch, &port.label).await?)
}

/// Nodes outside of a project can't use networks. Public networks are open to
/// every project, everything else needs the project on the access list.
async fn ensure_network_access(
    txn: &mut SqliteConnection,
    node: &Node,
    network: &Network,
) -> HilResult<()> {
    let Some(project_id) = node.project_id else {
        return Err(HilError::Conflict(format!(
            "node {} does not belong to a project",
            node.label
        )));
    };
    let access = db::network::access_list(txn, network.id).await?;
    if !access.is_empty() && !access.contains(&project_id) {
        return Err(HilError::Conflict(format!(
            "the project of node {} has no access to network {}",
            node.label, network.label
        )));
    }
    Ok(())
}

async fn cabled_port(
    txn: &mut SqliteConnection,
    node: &Node,
    nic: &Nic,
) -> HilResult<(Switch, Port)> {
    let port_id = nic.port_id.ok_or_else(|| {
        HilError::not_found("switch port of nic", format!("{}/{}", node.label, nic.label))
    })?;
    let port = db::port::find(txn, port_id).await?;
    let switch = db::switch::find(txn, port.switch_id).await?;
    Ok((switch, port))
}
