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
//! Builds a complete hil-api on an in-memory database with mocked switches.

use std::sync::Arc;
use std::time::Duration;

use model::switch::SwitchVendor;
use sqlx::SqlitePool;
use switch::{MockSwitchFabric, SwitchDriverFactory};

use crate::allocator::{NetworkAllocator, NullAllocator, VlanPoolAllocator};
use crate::api::{Api, NetworkCreate};
use crate::cfg::file::ReconcilerConfig;

pub const TEST_VLANS: &str = "100-200";

pub const PROJECT_0: &str = "runway";
pub const PROJECT_1: &str = "stock";

pub const SWITCH_0: &str = "sw0";
pub const SWITCH_1: &str = "sw1";

pub const NIC: &str = "eth0";

/// Network owned by [`PROJECT_0`]
pub const NETWORK_0: &str = "runway-pxe";
/// Network owned by [`PROJECT_1`]
pub const NETWORK_1: &str = "stock-int";
/// Admin network without access list
pub const PUBLIC_NETWORK: &str = "pub";

pub struct TestEnv {
    pub api: Arc<Api>,
    pub pool: SqlitePool,
    pub fabric: Arc<MockSwitchFabric>,
}

pub struct TestEnvOverrides {
    /// `None` leaves the pool empty
    pub vlans: Option<&'static str>,
    pub null_allocator: bool,
    pub reconciler: ReconcilerConfig,
}

impl Default for TestEnvOverrides {
    fn default() -> Self {
        Self {
            vlans: Some(TEST_VLANS),
            null_allocator: false,
            reconciler: ReconcilerConfig {
                driver_timeout: Duration::from_secs(5),
                ..Default::default()
            },
        }
    }
}

impl TestEnvOverrides {
    pub fn with_vlans(vlans: &'static str) -> Self {
        Self {
            vlans: Some(vlans),
            ..Default::default()
        }
    }

    pub fn with_driver_timeout(driver_timeout: Duration) -> Self {
        let mut overrides = Self::default();
        overrides.reconciler.driver_timeout = driver_timeout;
        overrides
    }
}

pub async fn create_test_env() -> TestEnv {
    create_test_env_with_overrides(TestEnvOverrides::default()).await
}

pub async fn create_test_env_with_overrides(overrides: TestEnvOverrides) -> TestEnv {
    let pool = super::test_db().await;
    let allocator: Arc<dyn NetworkAllocator> = if overrides.null_allocator {
        Arc::new(NullAllocator)
    } else {
        Arc::new(VlanPoolAllocator)
    };
    let factory = Arc::new(SwitchDriverFactory::default());
    let fabric = factory.mock_fabric();
    let api = Api::new(pool.clone(), allocator, factory, overrides.reconciler);
    if let Some(vlans) = overrides.vlans {
        api.populate_pool(vlans)
            .await
            .expect("failed to populate the pool");
    }
    TestEnv {
        api: Arc::new(api),
        pool,
        fabric,
    }
}

/// The port of the NIC of node `n`, the first four on [`SWITCH_0`], the rest on [`SWITCH_1`].
pub fn port_of(n: usize) -> (&'static str, String) {
    if n < 4 {
        (SWITCH_0, format!("gi1/0/{}", n + 1))
    } else {
        (SWITCH_1, format!("te0/{}", n - 3))
    }
}

pub fn node_name(n: usize) -> String {
    format!("node-{n}")
}

impl TestEnv {
    /// Creates the standard site:
    /// - projects [`PROJECT_0`] and [`PROJECT_1`]
    /// - mocked switches [`SWITCH_0`] and [`SWITCH_1`]
    /// - six nodes with one NIC each, cabled to [`port_of`]
    /// - node-0, node-1 and node-4 in [`PROJECT_0`], node-2 in [`PROJECT_1`], node-3 and node-5 free
    /// - one network per project and a public admin network
    pub async fn create_site(&self) {
        let api = &self.api;
        for project in [PROJECT_0, PROJECT_1] {
            api.project_create(project).await.unwrap();
        }
        for switch in [SWITCH_0, SWITCH_1] {
            api.switch_register(switch, SwitchVendor::Mock, &serde_json::json!({}))
                .await
                .unwrap();
        }
        for n in 0..6 {
            let node = node_name(n);
            let (switch, port) = port_of(n);
            api.node_register(&node).await.unwrap();
            api.node_register_nic(&node, NIC, &format!("de:ad:be:ef:00:{n:02x}"))
                .await
                .unwrap();
            api.switch_register_port(switch, &port).await.unwrap();
            api.port_connect_nic(switch, &port, &node, NIC).await.unwrap();
        }
        for (n, project) in [(0, PROJECT_0), (1, PROJECT_0), (4, PROJECT_0), (2, PROJECT_1)] {
            api.project_connect_node(project, &node_name(n)).await.unwrap();
        }

        for (network, owner) in [(NETWORK_0, PROJECT_0), (NETWORK_1, PROJECT_1)] {
            api.network_create(&NetworkCreate {
                label: network,
                owner: Some(owner),
                ..Default::default()
            })
            .await
            .unwrap();
        }
        api.network_create(&NetworkCreate {
            label: PUBLIC_NETWORK,
            ..Default::default()
        })
        .await
        .unwrap();
    }

    pub async fn net_id(&self, network: &str) -> String {
        self.api.show_network(network).await.unwrap().net_id
    }

    /// Port state as the mocked hardware sees it
    pub fn hardware_port(&self, n: usize) -> switch::PortNetworks {
        let (switch, port) = port_of(n);
        self.fabric
            .port_networks(switch, &port)
            .expect("port is not known to the mocked switch")
    }
}
