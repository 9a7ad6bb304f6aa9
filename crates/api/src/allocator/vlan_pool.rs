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
use std::collections::BTreeSet;

use async_trait::async_trait;
use db::vlan_pool::VlanClaim;
use model::channel::{Channel, parse_vlan};
use model::vlan_pool::VlanPoolSpec;
use sqlx::SqliteConnection;

use super::{AllocatorStats, Claim, NetworkAllocator};
use crate::errors::HilResult;

/// Allocates VLAN tags out of the persisted `vlan_pool` table.
#[derive(Debug, Default)]
pub struct VlanPoolAllocator;

#[async_trait]
impl NetworkAllocator for VlanPoolAllocator {
    async fn populate(&self, txn: &mut SqliteConnection, spec: &str) -> HilResult<u64> {
        let spec: VlanPoolSpec = spec.parse()?;
        let added = db::vlan_pool::populate(txn, &spec).await?;
        tracing::info!(added, size = spec.len(), "Populated VLAN pool");
        Ok(added)
    }

    async fn allocate(&self, txn: &mut SqliteConnection) -> HilResult<Option<String>> {
        let vlan = db::vlan_pool::allocate(txn).await?;
        if let Some(vlan) = vlan {
            tracing::debug!(vlan, "Allocated VLAN");
        }
        Ok(vlan.map(|vlan| vlan.to_string()))
    }

    async fn claim(&self, txn: &mut SqliteConnection, net_id: &str) -> HilResult<Claim> {
        let vlan = parse_vlan(net_id)?;
        Ok(match db::vlan_pool::claim(txn, vlan).await? {
            VlanClaim::Claimed => Claim::Claimed,
            VlanClaim::InUse => Claim::InUse,
            VlanClaim::Untracked => Claim::Unmanaged,
        })
    }

    async fn free(&self, txn: &mut SqliteConnection, net_id: &str) -> HilResult<()> {
        let Ok(vlan) = parse_vlan(net_id) else {
            tracing::error!(net_id, "Asked to free a malformed VLAN");
            return Ok(());
        };
        if !db::vlan_pool::release(txn, vlan).await? {
            tracing::error!(vlan, "Asked to free a VLAN the pool does not track");
        }
        Ok(())
    }

    fn validate(&self, net_id: &str) -> bool {
        parse_vlan(net_id).is_ok()
    }

    fn legal_channels_for(&self, net_id: &str) -> BTreeSet<String> {
        let mut channels = BTreeSet::from([Channel::Native.to_string()]);
        if let Ok(vlan) = parse_vlan(net_id) {
            channels.insert(Channel::tagged_name(vlan));
        }
        channels
    }

    fn default_channel(&self) -> String {
        Channel::Native.to_string()
    }

    async fn stats(&self, txn: &mut SqliteConnection) -> HilResult<AllocatorStats> {
        let stats = db::vlan_pool::stats(txn).await?;
        Ok(AllocatorStats {
            used: stats.used,
            free: stats.free,
        })
    }
}
