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
use std::collections::{BTreeMap, BTreeSet};

use model::network::{AttachmentDetails, Network};
use serde::Serialize;

use crate::allocator::Claim;
use crate::api::Api;
use crate::errors::{HilError, HilResult};

/// What a new network looks like. `owner: None` makes it an admin network.
#[derive(Debug, Clone, Default)]
pub struct NetworkCreate<'a> {
    pub label: &'a str,
    pub owner: Option<&'a str>,
    /// Projects that may attach nodes. Left empty on an admin network, everyone may.
    pub access: Vec<&'a str>,
    /// Use this identifier instead of allocating one. Admin networks only.
    pub net_id: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    pub name: String,
    pub owner: Option<String>,
    pub access: Vec<String>,
    pub net_id: String,
    pub channels: BTreeSet<String>,
    /// NIC labels by node
    pub connected_nodes: BTreeMap<String, Vec<String>>,
}

#[tracing::instrument(skip(api), fields(label = request.label))]
pub(crate) async fn create(api: &Api, request: &NetworkCreate<'_>) -> HilResult<Network> {
    if request.net_id.is_some() && request.owner.is_some() {
        return Err(HilError::InvalidArgument(
            "only admin networks can use an existing network identifier".to_string(),
        ));
    }

    let mut txn = api.txn_begin().await?;

    let owner = match request.owner {
        Some(owner) => Some(db::project::find_by_label(&mut txn, owner).await?),
        None => None,
    };
    let mut access = Vec::with_capacity(request.access.len());
    for project in &request.access {
        access.push(db::project::find_by_label(&mut txn, project).await?);
    }
    if let Some(owner) = &owner {
        if access.iter().any(|p| p.id != owner.id) {
            return Err(HilError::InvalidArgument(format!(
                "a network owned by {} can only be accessed by its owner",
                owner.label
            )));
        }
    }

    let (net_id, allocated) = match request.net_id {
        Some(net_id) => {
            if !api.allocator.validate(net_id) {
                return Err(HilError::InvalidArgument(format!(
                    "invalid network identifier {net_id}"
                )));
            }
            if let Some(existing) = db::network::find_by_net_id(&mut txn, net_id).await? {
                return Err(HilError::Conflict(format!(
                    "network identifier {net_id} is used by network {}",
                    existing.label
                )));
            }
            match api.allocator.claim(&mut txn, net_id).await? {
                Claim::Claimed => (net_id.to_string(), true),
                Claim::Unmanaged => (net_id.to_string(), false),
                Claim::InUse => {
                    return Err(HilError::Conflict(format!(
                        "network identifier {net_id} is already allocated"
                    )));
                }
            }
        }
        None => {
            let net_id = api
                .allocator
                .allocate(&mut txn)
                .await?
                .ok_or(HilError::NoFreeNetworkId)?;
            (net_id, true)
        }
    };

    let network = db::network::create(
        &mut txn,
        &db::network::NewNetwork {
            label: request.label,
            net_id: &net_id,
            allocated,
            owner_id: owner.as_ref().map(|p| p.id),
        },
    )
    .await
    .map_err(HilError::on_insert("network", request.label))?;
    for project in &access {
        db::network::grant_access(&mut txn, network.id, project.id).await?;
    }

    db::commit(txn).await?;
    tracing::info!(net_id = %network.net_id, allocated, "Created network");
    Ok(network)
}

/// Deletes a network once nothing is attached and no action refers to it, and
/// returns its identifier to the allocator.
#[tracing::instrument(skip(api))]
pub(crate) async fn delete(api: &Api, label: &str) -> HilResult<()> {
    let mut txn = api.txn_begin().await?;
    let network = db::network::find_by_label(&mut txn, label).await?;
    let network = db::network::delete(&mut txn, network.id).await?;
    if network.allocated {
        api.allocator.free(&mut txn, &network.net_id).await?;
    }
    db::commit(txn).await?;
    Ok(())
}

#[tracing::instrument(skip(api))]
pub(crate) async fn grant_access(api: &Api, project: &str, network: &str) -> HilResult<()> {
    let mut txn = api.txn_begin().await?;
    let project = db::project::find_by_label(&mut txn, project).await?;
    let network = db::network::find_by_label(&mut txn, network).await?;
    if !network.is_admin_owned() {
        return Err(HilError::Conflict(format!(
            "network {} belongs to a project, its access list can not change",
            network.label
        )));
    }
    if !db::network::grant_access(&mut txn, network.id, project.id).await? {
        return Err(HilError::AlreadyExists {
            kind: "network access",
            id: format!("{}/{}", network.label, project.label),
        });
    }
    db::commit(txn).await?;
    Ok(())
}

/// Nodes of the project have to leave the network before access goes away.
#[tracing::instrument(skip(api))]
pub(crate) async fn revoke_access(api: &Api, project: &str, network: &str) -> HilResult<()> {
    let mut txn = api.txn_begin().await?;
    let project = db::project::find_by_label(&mut txn, project).await?;
    let network = db::network::find_by_label(&mut txn, network).await?;
    if network.owner_id == Some(project.id) {
        return Err(HilError::Conflict(format!(
            "project {} owns network {}",
            project.label, network.label
        )));
    }

    for attachment in db::attachment::list_for_network(&mut txn, network.id).await? {
        let node = db::node::find_by_label(&mut txn, &attachment.node).await?;
        if node.project_id == Some(project.id) {
            return Err(HilError::Blocked(format!(
                "node {} of project {} is still attached to network {}",
                node.label, project.label, network.label
            )));
        }
    }

    if !db::network::revoke_access(&mut txn, network.id, project.id).await? {
        return Err(HilError::not_found(
            "network access",
            format!("{}/{}", network.label, project.label),
        ));
    }
    db::commit(txn).await?;
    Ok(())
}

pub(crate) async fn show(api: &Api, label: &str) -> HilResult<NetworkInfo> {
    let mut txn = api.txn_begin().await?;
    let network = db::network::find_by_label(&mut txn, label).await?;
    let owner = match network.owner_id {
        Some(id) => Some(db::project::find(&mut txn, id).await?.label),
        None => None,
    };
    let mut access = Vec::new();
    for project_id in db::network::access_list(&mut txn, network.id).await? {
        access.push(db::project::find(&mut txn, project_id).await?.label);
    }
    access.sort();

    let mut connected_nodes: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for attachment in db::attachment::list_for_network(&mut txn, network.id).await? {
        connected_nodes
            .entry(attachment.node)
            .or_default()
            .push(attachment.nic);
    }

    Ok(NetworkInfo {
        channels: api.allocator.legal_channels_for(&network.net_id),
        name: network.label,
        owner,
        access,
        net_id: network.net_id,
        connected_nodes,
    })
}

/// Attachments of a network, optionally only those of nodes in `project`.
pub(crate) async fn list_attachments(
    api: &Api,
    label: &str,
    project: Option<&str>,
) -> HilResult<Vec<AttachmentDetails>> {
    let mut txn = api.txn_begin().await?;
    let network = db::network::find_by_label(&mut txn, label).await?;
    let project = match project {
        Some(project) => Some(db::project::find_by_label(&mut txn, project).await?),
        None => None,
    };

    let mut attachments = Vec::new();
    for attachment in db::attachment::list_for_network(&mut txn, network.id).await? {
        if let Some(project) = &project {
            let node = db::node::find_by_label(&mut txn, &attachment.node).await?;
            if node.project_id != Some(project.id) {
                continue;
            }
        }
        attachments.push(attachment);
    }
    Ok(attachments)
}
