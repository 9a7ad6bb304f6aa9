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
use model::channel::NULL_CHANNEL;
use sqlx::SqliteConnection;

use super::{AllocatorStats, Claim, NetworkAllocator};
use crate::errors::HilResult;

/// Allocator for sites without network isolation. Every network gets a fresh
/// random identifier and is carried on the single `null` channel.
#[derive(Debug, Default)]
pub struct NullAllocator;

#[async_trait]
impl NetworkAllocator for NullAllocator {
    async fn populate(&self, _txn: &mut SqliteConnection, _spec: &str) -> HilResult<u64> {
        Ok(0)
    }

    async fn allocate(&self, _txn: &mut SqliteConnection) -> HilResult<Option<String>> {
        Ok(Some(uuid::Uuid::new_v4().to_string()))
    }

    async fn claim(&self, _txn: &mut SqliteConnection, _net_id: &str) -> HilResult<Claim> {
        Ok(Claim::Unmanaged)
    }

    async fn free(&self, _txn: &mut SqliteConnection, _net_id: &str) -> HilResult<()> {
        Ok(())
    }

    fn validate(&self, net_id: &str) -> bool {
        !net_id.is_empty()
    }

    fn legal_channels_for(&self, _net_id: &str) -> BTreeSet<String> {
        BTreeSet::from([NULL_CHANNEL.to_string()])
    }

    fn default_channel(&self) -> String {
        NULL_CHANNEL.to_string()
    }

    async fn stats(&self, _txn: &mut SqliteConnection) -> HilResult<AllocatorStats> {
        Ok(AllocatorStats::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::test_db;

    #[tokio::test]
    async fn identifiers_are_unique() {
        let pool = test_db().await;
        let mut txn = pool.begin().await.unwrap();
        let a = NullAllocator.allocate(&mut txn).await.unwrap().unwrap();
        let b = NullAllocator.allocate(&mut txn).await.unwrap().unwrap();
        assert_ne!(a, b);
        assert!(NullAllocator.validate(&a));
        assert!(!NullAllocator.validate(""));
        assert!(NullAllocator.is_legal_channel_for("null", &a));
        assert!(!NullAllocator.is_legal_channel_for("vlan/native", &a));
    }
}
