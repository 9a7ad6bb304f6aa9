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

//! The action log: queued instructions that bring a switch port in line with the
//! attachments recorded in the database.

use std::str::FromStr;

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::id::{NetworkActionId, NetworkId, NicId, PortId, SwitchId};

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum NetworkActionKind {
    Attach,
    Detach,
    Revert,
}

/// What the driver has to do to the port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PortAction {
    /// Make the port carry `net_id` on `channel`
    Attach { channel: String, net_id: String },
    /// Remove whatever the port carries on `channel`
    Detach { channel: String },
    /// Remove everything from the port
    Revert,
}

impl PortAction {
    pub fn kind(&self) -> NetworkActionKind {
        match self {
            PortAction::Attach { .. } => NetworkActionKind::Attach,
            PortAction::Detach { .. } => NetworkActionKind::Detach,
            PortAction::Revert => NetworkActionKind::Revert,
        }
    }

    pub fn channel(&self) -> Option<&str> {
        match self {
            PortAction::Attach { channel, .. } | PortAction::Detach { channel } => Some(channel),
            PortAction::Revert => None,
        }
    }

    pub fn net_id(&self) -> Option<&str> {
        match self {
            PortAction::Attach { net_id, .. } => Some(net_id),
            PortAction::Detach { .. } | PortAction::Revert => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NetworkActionStatus {
    Pending,
    Done,
}

/// One entry of the action log, joined with the label of the port it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkAction {
    pub id: NetworkActionId,
    pub switch_id: SwitchId,
    pub port_id: PortId,
    pub port: String,
    /// The NIC cabled to the port when the action was queued
    pub nic_id: Option<NicId>,
    /// The network being attached or detached. Not set for reverts.
    pub network_id: Option<NetworkId>,
    pub action: PortAction,
    pub status: NetworkActionStatus,
}

impl<'r> FromRow<'r, SqliteRow> for NetworkAction {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("kind")?;
        let kind = NetworkActionKind::from_str(&kind)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let channel: Option<String> = row.try_get("channel")?;
        let net_id: Option<String> = row.try_get("net_id")?;

        let missing = |column: &str| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: format!("{kind} action without {column}").into(),
        };
        let action = match kind {
            NetworkActionKind::Attach => PortAction::Attach {
                channel: channel.ok_or_else(|| missing("channel"))?,
                net_id: net_id.ok_or_else(|| missing("net_id"))?,
            },
            NetworkActionKind::Detach => PortAction::Detach {
                channel: channel.ok_or_else(|| missing("channel"))?,
            },
            NetworkActionKind::Revert => PortAction::Revert,
        };

        Ok(NetworkAction {
            id: row.try_get("id")?,
            switch_id: row.try_get("switch_id")?,
            port_id: row.try_get("port_id")?,
            port: row.try_get("port")?,
            nic_id: row.try_get("nic_id")?,
            network_id: row.try_get("network_id")?,
            action,
            status: row.try_get("status")?,
        })
    }
}
