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

//! Network allocators hand out the identifiers that isolate networks from each other.
//!
//! Exactly one allocator is active for a site. It is built once from the configuration
//! and handed to every code path that needs it as an `Arc<dyn NetworkAllocator>`.

use std::sync::Arc;

pub use self::iface::{AllocatorStats, Claim, NetworkAllocator};
pub use self::null::NullAllocator;
pub use self::vlan_pool::VlanPoolAllocator;
use crate::cfg::file::{NetworkAllocatorConfig, NetworkAllocatorKind};

mod iface;
mod null;
mod vlan_pool;

/// Builds the allocator selected in the configuration.
pub fn create_network_allocator(config: &NetworkAllocatorConfig) -> Arc<dyn NetworkAllocator> {
    match config.kind {
        NetworkAllocatorKind::VlanPool => Arc::new(VlanPoolAllocator),
        NetworkAllocatorKind::Null => Arc::new(NullAllocator),
    }
}
