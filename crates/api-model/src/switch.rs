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

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::ModelError;
use crate::channel::Channel;
use crate::id::{NicId, PortId, SwitchId};
use crate::network::Attachment;

/// The vendor of a switch decides which driver talks to it.
/// It is chosen when the switch is registered and never changes afterwards.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    clap::ValueEnum,
    serde::Serialize,
    serde::Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SwitchVendor {
    /// In-memory switch, used for testing and for sites without real hardware
    Mock,
    /// Dell PowerConnect, managed through its CLI over SSH
    DellPowerconnect,
    /// Brocade VDX, managed through its REST interface
    BrocadeVdx,
}

/// The kind of change a tenant asks for on a NIC.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PortOperation {
    Connect,
    Detach,
}

impl SwitchVendor {
    /// Vendors that carry tagged VLANs in trunk mode need a native VLAN in place first,
    /// and refuse to drop the native VLAN while tagged ones remain.
    pub fn requires_native_first(&self) -> bool {
        match self {
            SwitchVendor::Mock => false,
            SwitchVendor::DellPowerconnect | SwitchVendor::BrocadeVdx => true,
        }
    }

    /// Checks whether `operation` on `channel` is something this vendor can do given
    /// the attachments the NIC already has (pending or active).
    pub fn check_operation(
        &self,
        operation: PortOperation,
        channel: &str,
        existing: &[Attachment],
    ) -> Result<(), ModelError> {
        if !self.requires_native_first() {
            return Ok(());
        }
        let channel = Channel::from_str(channel)?;
        let has_native = existing.iter().any(|a| a.channel == Channel::Native.to_string());
        match operation {
            PortOperation::Connect if !channel.is_native() && !has_native => {
                Err(ModelError::IllegalOperation(format!(
                    "{self} switches need a native network on the port before a tagged one can be attached"
                )))
            }
            PortOperation::Detach if channel.is_native() && existing.len() > 1 => {
                Err(ModelError::IllegalOperation(format!(
                    "{self} switches need all tagged networks removed before the native one"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// A network device. `config` holds the vendor specific connection settings
/// (address, credentials, ...) as JSON and is only interpreted by the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Switch {
    pub id: SwitchId,
    pub label: String,
    pub vendor: SwitchVendor,
    #[serde(skip)]
    pub config: serde_json::Value,
}

impl<'r> FromRow<'r, SqliteRow> for Switch {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let vendor: String = row.try_get("vendor")?;
        let vendor = SwitchVendor::from_str(&vendor)
            .map_err(|_| sqlx::Error::Decode(Box::new(ModelError::UnknownVendor(vendor))))?;
        let config: String = row.try_get("config")?;
        let config =
            serde_json::from_str(&config).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Switch {
            id: row.try_get("id")?,
            label: row.try_get("label")?,
            vendor,
            config,
        })
    }
}

/// A physical port on a switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Port {
    pub id: PortId,
    pub switch_id: SwitchId,
    pub label: String,
    /// The NIC cabled to this port, if any
    pub nic_id: Option<NicId>,
}

impl<'r> FromRow<'r, SqliteRow> for Port {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Port {
            id: row.try_get("id")?,
            switch_id: row.try_get("switch_id")?,
            label: row.try_get("label")?,
            nic_id: row.try_get("nic_id")?,
        })
    }
}
