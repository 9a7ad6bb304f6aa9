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
use crate::allocator::AllocatorStats;
use crate::api::Api;
use crate::errors::HilResult;

/// Adds the identifiers of `spec` to the pool of the active allocator.
#[tracing::instrument(skip(api))]
pub(crate) async fn populate(api: &Api, spec: &str) -> HilResult<u64> {
    let mut txn = api.txn_begin().await?;
    let added = api.allocator.populate(&mut txn, spec).await?;
    db::commit(txn).await?;
    Ok(added)
}

pub(crate) async fn stats(api: &Api) -> HilResult<AllocatorStats> {
    let mut txn = api.txn_begin().await?;
    api.allocator.stats(&mut txn).await
}
