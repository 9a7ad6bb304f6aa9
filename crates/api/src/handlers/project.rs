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
use model::project::Project;

use crate::api::Api;
use crate::errors::{HilError, HilResult};

#[tracing::instrument(skip(api))]
pub(crate) async fn create(api: &Api, label: &str) -> HilResult<Project> {
    let mut txn = api.txn_begin().await?;
    let project = db::project::create(&mut txn, label)
        .await
        .map_err(HilError::on_insert("project", label))?;
    db::commit(txn).await?;
    Ok(project)
}

/// Fails with `Blocked` while the project still has nodes or owns networks.
#[tracing::instrument(skip(api))]
pub(crate) async fn delete(api: &Api, label: &str) -> HilResult<()> {
    let mut txn = api.txn_begin().await?;
    let project = db::project::find_by_label(&mut txn, label).await?;
    db::project::delete(&mut txn, project.id).await?;
    db::commit(txn).await?;
    Ok(())
}

pub(crate) async fn list(api: &Api) -> HilResult<Vec<String>> {
    let mut txn = api.txn_begin().await?;
    let projects = db::project::list(&mut txn).await?;
    Ok(projects.into_iter().map(|p| p.label).collect())
}
