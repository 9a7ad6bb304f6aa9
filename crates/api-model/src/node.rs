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
use std::str::FromStr;

use mac_address::MacAddress;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::ModelError;
use crate::id::{NicId, NodeId, PortId, ProjectId};

/// A physical machine. A node without a project sits in the free pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub project_id: Option<ProjectId>,
}

impl Node {
    pub fn is_free(&self) -> bool {
        self.project_id.is_none()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Node {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Node {
            id: row.try_get("id")?,
            label: row.try_get("label")?,
            project_id: row.try_get("project_id")?,
        })
    }
}

/// A network interface of a node, optionally cabled to one switch port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nic {
    pub id: NicId,
    pub node_id: NodeId,
    pub label: String,
    pub mac_address: MacAddress,
    pub port_id: Option<PortId>,
}

impl<'r> FromRow<'r, SqliteRow> for Nic {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let mac: String = row.try_get("mac_address")?;
        Ok(Nic {
            id: row.try_get("id")?,
            node_id: row.try_get("node_id")?,
            label: row.try_get("label")?,
            mac_address: parse_mac_address(&mac).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            port_id: row.try_get("port_id")?,
        })
    }
}

pub fn parse_mac_address(s: &str) -> Result<MacAddress, ModelError> {
    MacAddress::from_str(s).map_err(|_| ModelError::InvalidMacAddress(s.to_string()))
}
