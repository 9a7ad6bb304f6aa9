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
use model::switch::SwitchVendor;
use serde_json::json;

use crate::api::NetworkCreate;
use crate::errors::HilError;
use crate::tests::common::api_fixtures::{
    NETWORK_0, NETWORK_1, NIC, PROJECT_0, PROJECT_1, PUBLIC_NETWORK, create_test_env,
    node_name, port_of,
};

fn dell_config() -> serde_json::Value {
    json!({
        "host": "10.0.0.2",
        "username": "admin",
        "password": "secret",
    })
}

#[tokio::test]
async fn test_projects() -> Result<(), eyre::Report> {
    let env = create_test_env().await;
    env.api.project_create("b").await?;
    env.api.project_create("a").await?;
    assert!(matches!(
        env.api.project_create("a").await,
        Err(HilError::AlreadyExists { kind: "project", .. })
    ));
    assert_eq!(env.api.list_projects().await?, vec!["a", "b"]);

    env.api.node_register("node").await?;
    env.api.project_connect_node("a", "node").await?;
    assert!(matches!(
        env.api.project_delete("a").await,
        Err(HilError::Blocked(_))
    ));
    env.api.project_detach_node("a", "node").await?;
    env.api.project_delete("a").await?;
    assert!(matches!(
        env.api.project_delete("a").await,
        Err(HilError::NotFound { .. })
    ));
    assert_eq!(env.api.list_projects().await?, vec!["b"]);
    Ok(())
}

#[tokio::test]
async fn test_project_owning_networks_stays() -> Result<(), eyre::Report> {
    let env = create_test_env().await;
    env.create_site().await;
    for n in [0, 1, 4] {
        env.api.project_detach_node(PROJECT_0, &node_name(n)).await?;
    }
    assert!(matches!(
        env.api.project_delete(PROJECT_0).await,
        Err(HilError::Blocked(_))
    ));
    env.api.network_delete(NETWORK_0).await?;
    env.api.project_delete(PROJECT_0).await?;
    Ok(())
}

#[tokio::test]
async fn test_nodes_and_nics() -> Result<(), eyre::Report> {
    let env = create_test_env().await;
    env.api.project_create(PROJECT_0).await?;
    env.api.project_create(PROJECT_1).await?;
    env.api.node_register("node").await?;
    assert!(matches!(
        env.api.node_register("node").await,
        Err(HilError::AlreadyExists { .. })
    ));

    assert!(matches!(
        env.api.node_register_nic("node", NIC, "not-a-mac").await,
        Err(HilError::InvalidArgument(_))
    ));
    env.api
        .node_register_nic("node", NIC, "de:ad:be:ef:20:14")
        .await?;
    assert!(matches!(
        env.api
            .node_register_nic("node", NIC, "de:ad:be:ef:20:15")
            .await,
        Err(HilError::AlreadyExists { .. })
    ));

    env.api.project_connect_node(PROJECT_0, "node").await?;
    assert!(matches!(
        env.api.project_connect_node(PROJECT_1, "node").await,
        Err(HilError::Conflict(_))
    ));
    assert!(matches!(
        env.api.project_detach_node(PROJECT_1, "node").await,
        Err(HilError::NotFound { .. })
    ));
    assert!(matches!(
        env.api.node_delete("node").await,
        Err(HilError::Blocked(_))
    ));

    let info = env.api.show_node("node").await?;
    assert_eq!(info.project.as_deref(), Some(PROJECT_0));
    assert_eq!(info.nics.len(), 1);
    assert_eq!(info.nics[0].macaddr.to_lowercase(), "de:ad:be:ef:20:14");
    assert_eq!(info.nics[0].port, None);

    env.api.project_detach_node(PROJECT_0, "node").await?;
    // Still has a NIC
    assert!(matches!(
        env.api.node_delete("node").await,
        Err(HilError::Blocked(_))
    ));
    env.api.node_delete_nic("node", NIC).await?;
    env.api.node_delete("node").await?;
    assert!(matches!(
        env.api.show_node("node").await,
        Err(HilError::NotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_switches_and_ports() -> Result<(), eyre::Report> {
    let env = create_test_env().await;
    env.api.node_register("node").await?;
    env.api
        .node_register_nic("node", NIC, "de:ad:be:ef:20:14")
        .await?;

    let result = env
        .api
        .switch_register("dell", SwitchVendor::DellPowerconnect, &json!({"host": "10.0.0.2"}))
        .await;
    assert!(matches!(result, Err(HilError::InvalidArgument(_))), "{result:?}");
    let result = env
        .api
        .switch_register("mock", SwitchVendor::Mock, &json!("not an object"))
        .await;
    assert!(matches!(result, Err(HilError::InvalidArgument(_))), "{result:?}");

    let switch = env
        .api
        .switch_register("dell", SwitchVendor::DellPowerconnect, &dell_config())
        .await?;
    assert_eq!(switch.vendor, SwitchVendor::DellPowerconnect);
    assert!(matches!(
        env.api
            .switch_register("dell", SwitchVendor::Mock, &json!({}))
            .await,
        Err(HilError::AlreadyExists { .. })
    ));

    env.api.switch_register_port("dell", "gi1/0/1").await?;
    env.api.switch_register_port("dell", "gi1/0/2").await?;
    assert!(matches!(
        env.api.switch_register_port("dell", "gi1/0/1").await,
        Err(HilError::AlreadyExists { .. })
    ));

    env.api
        .port_connect_nic("dell", "gi1/0/1", "node", NIC)
        .await?;
    assert!(matches!(
        env.api
            .port_connect_nic("dell", "gi1/0/2", "node", NIC)
            .await,
        Err(HilError::Conflict(_))
    ));
    env.api.node_register("other").await?;
    env.api
        .node_register_nic("other", NIC, "de:ad:be:ef:20:15")
        .await?;
    assert!(matches!(
        env.api
            .port_connect_nic("dell", "gi1/0/1", "other", NIC)
            .await,
        Err(HilError::Conflict(_))
    ));

    let port = env.api.show_port("dell", "gi1/0/1").await?;
    assert_eq!(port.node.as_deref(), Some("node"));
    assert_eq!(port.nic.as_deref(), Some(NIC));
    let node = env.api.show_node("node").await?;
    assert_eq!(node.nics[0].switch.as_deref(), Some("dell"));
    assert_eq!(node.nics[0].port.as_deref(), Some("gi1/0/1"));

    assert!(matches!(
        env.api.switch_delete_port("dell", "gi1/0/1").await,
        Err(HilError::Blocked(_))
    ));
    assert!(matches!(
        env.api.node_delete_nic("node", NIC).await,
        Err(HilError::Blocked(_))
    ));
    env.api.port_detach_nic("dell", "gi1/0/1").await?;
    assert!(matches!(
        env.api.port_detach_nic("dell", "gi1/0/1").await,
        Err(HilError::NotFound { .. })
    ));

    assert!(matches!(
        env.api.switch_delete("dell").await,
        Err(HilError::Blocked(_))
    ));
    env.api.switch_delete_port("dell", "gi1/0/1").await?;
    env.api.switch_delete_port("dell", "gi1/0/2").await?;
    env.api.switch_delete("dell").await?;
    Ok(())
}

#[tokio::test]
async fn test_vendor_ordering_rules() -> Result<(), eyre::Report> {
    let env = create_test_env().await;
    env.create_site().await;
    env.api
        .switch_register("dell", SwitchVendor::DellPowerconnect, &dell_config())
        .await?;
    env.api.switch_register_port("dell", "gi1/0/1").await?;
    env.api.node_register("dell-node").await?;
    env.api
        .node_register_nic("dell-node", NIC, "de:ad:be:ef:20:14")
        .await?;
    env.api.project_connect_node(PROJECT_0, "dell-node").await?;
    env.api
        .port_connect_nic("dell", "gi1/0/1", "dell-node", NIC)
        .await?;

    // Tagged networks need a native one first on this vendor
    let public = env.net_id(PUBLIC_NETWORK).await;
    let result = env
        .api
        .node_connect_network("dell-node", NIC, PUBLIC_NETWORK, Some(&format!("vlan/{public}")))
        .await;
    assert!(matches!(result, Err(HilError::Blocked(_))), "{result:?}");

    // The mocked switches have no such rule
    env.api
        .node_connect_network(&node_name(0), NIC, PUBLIC_NETWORK, Some(&format!("vlan/{public}")))
        .await?;

    // Nothing was queued for the Dell switch
    assert!(!env.api.apply_networking().await?.switches.contains_key("dell"));
    Ok(())
}

#[tokio::test]
async fn test_network_access_lists() -> Result<(), eyre::Report> {
    let env = create_test_env().await;
    env.create_site().await;

    let info = env.api.show_network(NETWORK_0).await?;
    assert_eq!(info.owner.as_deref(), Some(PROJECT_0));
    assert_eq!(info.access, vec![PROJECT_0]);
    assert_eq!(
        info.channels,
        ["vlan/native".to_string(), format!("vlan/{}", info.net_id)]
            .into_iter()
            .collect()
    );

    // Project networks keep their access list
    assert!(matches!(
        env.api
            .network_grant_project_access(PROJECT_1, NETWORK_0)
            .await,
        Err(HilError::Conflict(_))
    ));
    assert!(matches!(
        env.api
            .network_revoke_project_access(PROJECT_1, NETWORK_1)
            .await,
        Err(HilError::Conflict(_))
    ));

    // Admin networks with an access list are restricted to it
    env.api
        .network_create(&NetworkCreate {
            label: "restricted",
            access: vec![PROJECT_1],
            ..Default::default()
        })
        .await?;
    let result = env
        .api
        .node_connect_network(&node_name(0), NIC, "restricted", None)
        .await;
    assert!(matches!(result, Err(HilError::Conflict(_))), "{result:?}");

    env.api
        .network_grant_project_access(PROJECT_0, "restricted")
        .await?;
    assert!(matches!(
        env.api
            .network_grant_project_access(PROJECT_0, "restricted")
            .await,
        Err(HilError::AlreadyExists { .. })
    ));
    env.api
        .node_connect_network(&node_name(0), NIC, "restricted", None)
        .await?;
    env.api.apply_networking().await?;

    // Access can't go away while nodes of the project use the network
    assert!(matches!(
        env.api
            .network_revoke_project_access(PROJECT_0, "restricted")
            .await,
        Err(HilError::Blocked(_))
    ));
    let attachments = env
        .api
        .list_network_attachments("restricted", Some(PROJECT_0))
        .await?;
    assert_eq!(attachments.len(), 1);
    assert!(
        env.api
            .list_network_attachments("restricted", Some(PROJECT_1))
            .await?
            .is_empty()
    );
    let info = env.api.show_network("restricted").await?;
    assert_eq!(info.connected_nodes["node-0"], vec![NIC]);

    let (switch, port) = port_of(0);
    env.api.port_revert(switch, &port).await?;
    env.api.apply_networking().await?;
    env.api
        .network_revoke_project_access(PROJECT_0, "restricted")
        .await?;
    assert!(matches!(
        env.api
            .network_revoke_project_access(PROJECT_0, "restricted")
            .await,
        Err(HilError::NotFound { .. })
    ));
    assert_eq!(env.api.show_network("restricted").await?.access, vec![PROJECT_1]);
    Ok(())
}
