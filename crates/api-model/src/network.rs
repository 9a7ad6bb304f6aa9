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
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::id::{NetworkId, NicId, ProjectId};

/// A logical isolated L2 segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Network {
    pub id: NetworkId,
    pub label: String,
    /// The network identifier (VLAN tag for the VLAN pool allocator)
    pub net_id: String,
    /// Whether `net_id` belongs to the allocator and must be given back on delete.
    /// Networks created by an admin with an identifier outside the pool are not allocated
    /// until the pool is populated with that identifier.
    pub allocated: bool,
    /// `None` means the network is owned by the administrator
    pub owner_id: Option<ProjectId>,
}

impl Network {
    pub fn is_admin_owned(&self) -> bool {
        self.owner_id.is_none()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Network {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Network {
            id: row.try_get("id")?,
            label: row.try_get("label")?,
            net_id: row.try_get("net_id")?,
            allocated: row.try_get("allocated")?,
            owner_id: row.try_get("owner_id")?,
        })
    }
}

/// Whether the switch has been programmed for an attachment yet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttachmentState {
    /// Recorded, waiting for `apply_networking`
    Pending,
    /// Confirmed on the switch
    Active,
}

/// Membership of a NIC in a network on a given channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub nic_id: NicId,
    pub network_id: NetworkId,
    pub channel: String,
    pub state: AttachmentState,
}

impl<'r> FromRow<'r, SqliteRow> for Attachment {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Attachment {
            nic_id: row.try_get("nic_id")?,
            network_id: row.try_get("network_id")?,
            channel: row.try_get("channel")?,
            state: row.try_get("state")?,
        })
    }
}

/// An attachment resolved to labels, as shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentDetails {
    pub node: String,
    pub nic: String,
    pub network: String,
    pub channel: String,
    pub state: AttachmentState,
}

impl<'r> FromRow<'r, SqliteRow> for AttachmentDetails {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(AttachmentDetails {
            node: row.try_get("node")?,
            nic: row.try_get("nic")?,
            network: row.try_get("network")?,
            channel: row.try_get("channel")?,
            state: row.try_get("state")?,
        })
    }
}
