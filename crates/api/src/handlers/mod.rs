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
use model::node::{Nic, Node};
use model::switch::{Port, Switch};
use sqlx::SqliteConnection;

use crate::errors::{HilError, HilResult};

pub(crate) mod network;
pub(crate) mod networking;
pub(crate) mod node;
pub(crate) mod pool;
pub(crate) mod project;
pub(crate) mod switch;

pub(crate) async fn find_nic(
    txn: &mut SqliteConnection,
    node: &str,
    nic: &str,
) -> HilResult<(Node, Nic)> {
    let node = db::node::find_by_label(txn, node).await?;
    let nic = db::nic::find_by_label(txn, node.id, nic).await?;
    Ok((node, nic))
}

pub(crate) async fn find_port(
    txn: &mut SqliteConnection,
    switch: &str,
    port: &str,
) -> HilResult<(Switch, Port)> {
    let switch = db::switch::find_by_label(txn, switch).await?;
    let port = db::port::find_by_label(txn, switch.id, port).await?;
    Ok((switch, port))
}

/// A port takes one change at a time: nothing new is queued for it while
/// an earlier action is still waiting for `apply_networking`.
pub(crate) async fn ensure_no_pending_actions(
    txn: &mut SqliteConnection,
    port: &Port,
) -> HilResult<()> {
    let pending = db::network_action::pending_count_for_port(txn, port.id).await?;
    if pending > 0 {
        return Err(HilError::Blocked(format!(
            "port {} has {pending} pending networking action(s)",
            port.label
        )));
    }
    Ok(())
}
