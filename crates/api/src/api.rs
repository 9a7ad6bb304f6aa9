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
//! The operations of the HIL API.
//!
//! Every operation that changes the topology validates its input, updates the
//! resource model and queues the matching networking action in one transaction, and
//! returns without touching any switch. Switches are only programmed by
//! [`Api::apply_networking`].

use std::sync::Arc;

use model::id::NetworkActionId;
use model::network::{AttachmentDetails, Network};
use model::network_action::NetworkActionStatus;
use model::node::Node;
use model::project::Project;
use model::switch::{Switch, SwitchVendor};
use sqlx::{Sqlite, SqlitePool, Transaction};
use switch::{PortNetworks, SwitchDriverFactory};

pub use crate::handlers::network::{NetworkCreate, NetworkInfo};
pub use crate::handlers::node::{NicInfo, NodeInfo};
pub use crate::handlers::switch::PortInfo;
use crate::allocator::{AllocatorStats, NetworkAllocator, create_network_allocator};
use crate::cfg::file::{HilApiConfig, ReconcilerConfig};
use crate::errors::HilResult;
use crate::handlers;
use crate::network_actions::{ApplyNetworkingReport, NetworkActionEngine};

pub struct Api {
    pub(crate) database_connection: SqlitePool,
    pub(crate) allocator: Arc<dyn NetworkAllocator>,
    pub(crate) engine: NetworkActionEngine,
}

impl Api {
    pub fn new(
        database_connection: SqlitePool,
        allocator: Arc<dyn NetworkAllocator>,
        switch_driver_factory: Arc<SwitchDriverFactory>,
        reconciler: ReconcilerConfig,
    ) -> Self {
        let engine = NetworkActionEngine::new(
            database_connection.clone(),
            switch_driver_factory,
            reconciler,
        );
        Self {
            database_connection,
            allocator,
            engine,
        }
    }

    /// Connects to the configured database, applies migrations and builds the
    /// configured allocator.
    pub async fn from_config(config: &HilApiConfig) -> HilResult<Self> {
        let pool = db::connect(&config.database_url, config.max_database_connections).await?;
        let factory = Arc::new(SwitchDriverFactory::new(config.reconciler.driver_timeout));
        Ok(Self::new(
            pool,
            create_network_allocator(&config.network_allocator),
            factory,
            config.reconciler.clone(),
        ))
    }

    pub(crate) async fn txn_begin(&self) -> HilResult<Transaction<'static, Sqlite>> {
        Ok(db::begin(&self.database_connection).await?)
    }

    pub fn database_connection(&self) -> &SqlitePool {
        &self.database_connection
    }

    pub fn switch_driver_factory(&self) -> &Arc<SwitchDriverFactory> {
        self.engine.factory()
    }

    // Projects

    pub async fn project_create(&self, project: &str) -> HilResult<Project> {
        handlers::project::create(self, project).await
    }

    pub async fn project_delete(&self, project: &str) -> HilResult<()> {
        handlers::project::delete(self, project).await
    }

    pub async fn list_projects(&self) -> HilResult<Vec<String>> {
        handlers::project::list(self).await
    }

    // Nodes

    pub async fn node_register(&self, node: &str) -> HilResult<Node> {
        handlers::node::register(self, node).await
    }

    pub async fn node_delete(&self, node: &str) -> HilResult<()> {
        handlers::node::delete(self, node).await
    }

    pub async fn project_connect_node(&self, project: &str, node: &str) -> HilResult<()> {
        handlers::node::project_connect(self, project, node).await
    }

    pub async fn project_detach_node(&self, project: &str, node: &str) -> HilResult<()> {
        handlers::node::project_detach(self, project, node).await
    }

    pub async fn node_register_nic(&self, node: &str, nic: &str, macaddr: &str) -> HilResult<()> {
        handlers::node::register_nic(self, node, nic, macaddr).await
    }

    pub async fn node_delete_nic(&self, node: &str, nic: &str) -> HilResult<()> {
        handlers::node::delete_nic(self, node, nic).await
    }

    pub async fn show_node(&self, node: &str) -> HilResult<NodeInfo> {
        handlers::node::show(self, node).await
    }

    // Switches

    pub async fn switch_register(
        &self,
        switch: &str,
        vendor: SwitchVendor,
        config: &serde_json::Value,
    ) -> HilResult<Switch> {
        handlers::switch::register(self, switch, vendor, config).await
    }

    pub async fn switch_delete(&self, switch: &str) -> HilResult<()> {
        handlers::switch::delete(self, switch).await
    }

    pub async fn switch_register_port(&self, switch: &str, port: &str) -> HilResult<()> {
        handlers::switch::register_port(self, switch, port).await
    }

    pub async fn switch_delete_port(&self, switch: &str, port: &str) -> HilResult<()> {
        handlers::switch::delete_port(self, switch, port).await
    }

    pub async fn port_connect_nic(
        &self,
        switch: &str,
        port: &str,
        node: &str,
        nic: &str,
    ) -> HilResult<()> {
        handlers::switch::port_connect_nic(self, switch, port, node, nic).await
    }

    pub async fn port_detach_nic(&self, switch: &str, port: &str) -> HilResult<()> {
        handlers::switch::port_detach_nic(self, switch, port).await
    }

    pub async fn show_port(&self, switch: &str, port: &str) -> HilResult<PortInfo> {
        handlers::switch::show_port(self, switch, port).await
    }

    // Networks

    pub async fn network_create(&self, request: &NetworkCreate<'_>) -> HilResult<Network> {
        handlers::network::create(self, request).await
    }

    pub async fn network_delete(&self, network: &str) -> HilResult<()> {
        handlers::network::delete(self, network).await
    }

    pub async fn network_grant_project_access(&self, project: &str, network: &str) -> HilResult<()> {
        handlers::network::grant_access(self, project, network).await
    }

    pub async fn network_revoke_project_access(&self, project: &str, network: &str) -> HilResult<()> {
        handlers::network::revoke_access(self, project, network).await
    }

    pub async fn show_network(&self, network: &str) -> HilResult<NetworkInfo> {
        handlers::network::show(self, network).await
    }

    pub async fn list_network_attachments(
        &self,
        network: &str,
        project: Option<&str>,
    ) -> HilResult<Vec<AttachmentDetails>> {
        handlers::network::list_attachments(self, network, project).await
    }

    // Networking

    /// Connects `nic` of `node` to `network` on `channel`, or on the default
    /// channel of the allocator when none is given.
    pub async fn node_connect_network(
        &self,
        node: &str,
        nic: &str,
        network: &str,
        channel: Option<&str>,
    ) -> HilResult<NetworkActionId> {
        handlers::networking::node_connect_network(self, node, nic, network, channel).await
    }

    pub async fn node_detach_network(
        &self,
        node: &str,
        nic: &str,
        network: &str,
    ) -> HilResult<NetworkActionId> {
        handlers::networking::node_detach_network(self, node, nic, network).await
    }

    pub async fn port_revert(&self, switch: &str, port: &str) -> HilResult<NetworkActionId> {
        handlers::networking::port_revert(self, switch, port).await
    }

    pub async fn show_networking_action(&self, id: NetworkActionId) -> HilResult<NetworkActionStatus> {
        handlers::networking::show_networking_action(self, id).await
    }

    pub async fn apply_networking(&self) -> HilResult<ApplyNetworkingReport> {
        handlers::networking::apply_networking(self).await
    }

    pub async fn port_networks(&self, switch: &str, port: &str) -> HilResult<PortNetworks> {
        handlers::networking::port_networks(self, switch, port).await
    }

    // Network identifier pool

    pub async fn populate_pool(&self, spec: &str) -> HilResult<u64> {
        handlers::pool::populate(self, spec).await
    }

    pub async fn pool_stats(&self) -> HilResult<AllocatorStats> {
        handlers::pool::stats(self).await
    }
}
