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

//! Resource model shared by the HIL API, its database layer and the switch drivers.

pub mod channel;
pub mod id;
pub mod network;
pub mod network_action;
pub mod node;
pub mod project;
pub mod switch;
pub mod vlan_pool;

/// Errors raised while validating model values before they reach the database.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid channel `{0}`")]
    InvalidChannel(String),

    #[error("Invalid VLAN pool specification `{spec}`: {reason}")]
    InvalidPoolSpec { spec: String, reason: String },

    #[error("Unknown switch vendor `{0}`")]
    UnknownVendor(String),

    #[error("Invalid MAC address `{0}`")]
    InvalidMacAddress(String),

    #[error("{0}")]
    IllegalOperation(String),
}
