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

//! Channel names: the tagging mode under which a port carries a network.

use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Untagged traffic on the port.
pub const NATIVE_CHANNEL: &str = "vlan/native";
/// The only channel used when no isolation is configured.
pub const NULL_CHANNEL: &str = "null";

const TAGGED_PREFIX: &str = "vlan/";

/// Lowest and highest representable VLAN tag.
pub const MIN_VLAN: u16 = 1;
pub const MAX_VLAN: u16 = 4096;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Native,
    Tagged(u16),
    Null,
}

impl Channel {
    pub fn tagged_name(vlan: u16) -> String {
        format!("{TAGGED_PREFIX}{vlan}")
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Channel::Native)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Native => f.write_str(NATIVE_CHANNEL),
            Channel::Tagged(vlan) => write!(f, "{TAGGED_PREFIX}{vlan}"),
            Channel::Null => f.write_str(NULL_CHANNEL),
        }
    }
}

impl FromStr for Channel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == NATIVE_CHANNEL {
            return Ok(Channel::Native);
        }
        if s == NULL_CHANNEL {
            return Ok(Channel::Null);
        }
        let vlan = s
            .strip_prefix(TAGGED_PREFIX)
            .and_then(|v| parse_vlan(v).ok())
            .ok_or_else(|| ModelError::InvalidChannel(s.to_string()))?;
        Ok(Channel::Tagged(vlan))
    }
}

/// Parses a VLAN tag, rejecting anything outside of `[MIN_VLAN, MAX_VLAN]`.
pub fn parse_vlan(s: &str) -> Result<u16, ModelError> {
    let invalid = || ModelError::InvalidChannel(s.to_string());
    // `u16::from_str` accepts a leading '+', which is not a valid tag spelling
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let vlan: u16 = s.parse().map_err(|_| invalid())?;
    if !(MIN_VLAN..=MAX_VLAN).contains(&vlan) {
        return Err(invalid());
    }
    Ok(vlan)
}
