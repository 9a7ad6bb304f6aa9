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
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::errors::HilResult;

/// Outcome of reserving a specific identifier with [`NetworkAllocator::claim`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The identifier was free and is now reserved. It goes back to the pool once freed.
    Claimed,
    /// The allocator does not manage this identifier. It can be used as is, but
    /// must never be freed.
    Unmanaged,
    /// The identifier is managed and currently in use.
    InUse,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllocatorStats {
    pub used: i64,
    pub free: i64,
}

/// Every method that changes the pool runs inside the transaction of the caller,
/// so pool state commits or rolls back together with the network it belongs to.
#[async_trait]
pub trait NetworkAllocator: Send + Sync {
    /// Adds the identifiers described by `spec` to the pool. Identifiers that are already
    /// tracked are left alone. Returns how many were added.
    async fn populate(&self, txn: &mut SqliteConnection, spec: &str) -> HilResult<u64>;

    /// Reserves one free identifier. `None` means the pool is exhausted.
    async fn allocate(&self, txn: &mut SqliteConnection) -> HilResult<Option<String>>;

    async fn claim(&self, txn: &mut SqliteConnection, net_id: &str) -> HilResult<Claim>;

    /// Returns an identifier to the pool. Freeing an identifier the pool doesn't
    /// know is logged and otherwise ignored.
    async fn free(&self, txn: &mut SqliteConnection, net_id: &str) -> HilResult<()>;

    /// Whether `net_id` is well formed for this allocator. Never fails.
    fn validate(&self, net_id: &str) -> bool;

    /// The channels a network with this identifier can be attached on.
    fn legal_channels_for(&self, net_id: &str) -> BTreeSet<String>;

    /// The channel used when a connect request doesn't name one.
    fn default_channel(&self) -> String;

    fn is_legal_channel_for(&self, channel: &str, net_id: &str) -> bool {
        self.legal_channels_for(net_id).contains(channel)
    }

    async fn stats(&self, txn: &mut SqliteConnection) -> HilResult<AllocatorStats>;
}
