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
use std::str::FromStr;

use async_trait::async_trait;
use model::channel::{Channel, parse_vlan};
use model::switch::SwitchVendor;

use crate::SwitchError;

/// The networks a port carries, by channel.
pub type PortNetworks = BTreeMap<String, String>;

/// Which configuration to fetch with [`SwitchSession::get_config`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKind {
    Running,
    Startup,
}

/// A long lived handle to one switch. Cheap to keep around, holds no connection.
#[async_trait]
pub trait SwitchDriver: Send + Sync {
    fn vendor(&self) -> SwitchVendor;

    /// Opens a session for a batch of changes. The caller must call
    /// [`SwitchSession::disconnect`] once it is done, whatever the outcome of the batch.
    async fn session(&self) -> Result<Box<dyn SwitchSession>, SwitchError>;
}

/// A connection to a switch that lasts for one batch of changes.
/// Every port operation is idempotent.
#[async_trait]
pub trait SwitchSession: Send {
    /// Makes `port` carry `net_id` on `channel`, replacing whatever the channel carried before.
    async fn ensure_port_attached(
        &mut self,
        port: &str,
        channel: &str,
        net_id: &str,
    ) -> Result<(), SwitchError>;

    /// Removes whatever `port` carries on `channel`. Nothing on the channel is fine.
    async fn ensure_port_detached(&mut self, port: &str, channel: &str)
    -> Result<(), SwitchError>;

    /// Returns `port` to its unconfigured state.
    async fn revert_port(&mut self, port: &str) -> Result<(), SwitchError>;

    async fn get_port_networks(&mut self, port: &str) -> Result<PortNetworks, SwitchError>;

    /// Persists the running configuration so that it survives a reboot.
    async fn save_running_config(&mut self) -> Result<(), SwitchError> {
        Err(SwitchError::Unsupported("saving the running configuration"))
    }

    async fn get_config(&mut self, _kind: ConfigKind) -> Result<String, SwitchError> {
        Err(SwitchError::Unsupported("reading the configuration"))
    }

    async fn disconnect(self: Box<Self>) -> Result<(), SwitchError>;
}

/// What a VLAN based switch has to do to carry a network on a channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VlanTarget {
    /// Untagged traffic goes to this VLAN
    Native(u16),
    /// Tagged traffic for this VLAN is allowed
    Tagged(u16),
}

impl VlanTarget {
    /// Resolves an attach request for a VLAN switch. A tagged channel only
    /// carries the network with the same VLAN.
    pub fn for_attach(channel: &str, net_id: &str) -> Result<Self, SwitchError> {
        let vlan = parse_vlan(net_id)?;
        match Channel::from_str(channel)? {
            Channel::Native => Ok(VlanTarget::Native(vlan)),
            Channel::Tagged(tag) if tag == vlan => Ok(VlanTarget::Tagged(vlan)),
            Channel::Tagged(_) | Channel::Null => Err(SwitchError::ChannelMismatch {
                channel: channel.to_string(),
                net_id: net_id.to_string(),
            }),
        }
    }

    /// The channel of a detach request. `None` stands for the native channel.
    pub fn tag_for_detach(channel: &str) -> Result<Option<u16>, SwitchError> {
        match Channel::from_str(channel)? {
            Channel::Native => Ok(None),
            Channel::Tagged(vlan) => Ok(Some(vlan)),
            Channel::Null => Err(SwitchError::ChannelMismatch {
                channel: channel.to_string(),
                net_id: String::new(),
            }),
        }
    }
}

/// Builds [`PortNetworks`] from what a VLAN switch reports for a port.
pub fn vlan_port_networks(native: Option<u16>, tagged: impl IntoIterator<Item = u16>) -> PortNetworks {
    let mut networks = PortNetworks::new();
    for vlan in tagged {
        if Some(vlan) != native {
            networks.insert(Channel::tagged_name(vlan), vlan.to_string());
        }
    }
    if let Some(vlan) = native {
        networks.insert(Channel::Native.to_string(), vlan.to_string());
    }
    networks
}
