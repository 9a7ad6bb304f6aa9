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

//! Switch drivers.
//!
//! A [`SwitchDriver`] is created once per switch from its vendor tag by the
//! [`SwitchDriverFactory`] and opens a [`SwitchSession`] for every batch of port
//! changes. Only the reconciliation engine talks to drivers.

use model::ModelError;
use model::switch::SwitchVendor;

mod brocade;
mod dell;
mod factory;
mod iface;
mod mock;

pub use self::factory::SwitchDriverFactory;
pub use self::iface::{ConfigKind, PortNetworks, SwitchDriver, SwitchSession, VlanTarget};
pub use self::mock::{MockFailure, MockSwitchDriver, MockSwitchFabric, SessionCounters};

#[derive(thiserror::Error, Debug)]
pub enum SwitchError {
    #[error("Invalid configuration for {vendor} switch: {reason}")]
    InvalidConfig {
        vendor: SwitchVendor,
        reason: String,
    },

    #[error("Port {port} does not exist on switch {switch}")]
    UnknownPort { switch: String, port: String },

    #[error(transparent)]
    InvalidChannel(#[from] ModelError),

    #[error("Channel {channel} can not carry network {net_id}")]
    ChannelMismatch { channel: String, net_id: String },

    #[error("The driver does not support {0}")]
    Unsupported(&'static str),

    #[error("Could not connect to switch {switch}: {reason}")]
    Connect { switch: String, reason: String },

    #[error("Switch {switch} rejected the command: {reason}")]
    Command { switch: String, reason: String },

    #[error(transparent)]
    Ssh(#[from] hil_ssh::SshError),

    #[error("Network error talking to {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status_code} at {url}: {response_body}")]
    HttpStatus {
        url: String,
        status_code: u16,
        response_body: String,
    },

    #[error("Could not understand the answer of switch {switch}: {reason}")]
    UnexpectedResponse { switch: String, reason: String },

    #[error("Internal switch driver error: {0}")]
    Internal(String),
}

impl SwitchError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, SwitchError::Unsupported(_))
    }
}
