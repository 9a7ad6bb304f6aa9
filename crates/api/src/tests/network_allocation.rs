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
use std::collections::HashSet;

use crate::allocator::AllocatorStats;
use crate::api::NetworkCreate;
use crate::errors::HilError;
use crate::tests::common::api_fixtures::{
    PROJECT_0, TestEnvOverrides, create_test_env, create_test_env_with_overrides,
};

fn admin_network(label: &str) -> NetworkCreate<'_> {
    NetworkCreate {
        label,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_networks_get_unique_identifiers() -> Result<(), eyre::Report> {
    let env = create_test_env().await;
    let mut seen = HashSet::new();
    for n in 0..20 {
        let network = env
            .api
            .network_create(&admin_network(&format!("net-{n}")))
            .await?;
        assert!(network.allocated);
        let vlan: u16 = network.net_id.parse()?;
        assert!((100..=200).contains(&vlan));
        assert!(seen.insert(network.net_id), "identifier handed out twice");
    }
    assert_eq!(
        env.api.pool_stats().await?,
        AllocatorStats { used: 20, free: 81 }
    );
    Ok(())
}

#[tokio::test]
async fn test_pool_exhaustion() -> Result<(), eyre::Report> {
    let env = create_test_env_with_overrides(TestEnvOverrides::with_vlans("300-301")).await;
    env.api.network_create(&admin_network("a")).await?;
    env.api.network_create(&admin_network("b")).await?;

    let result = env.api.network_create(&admin_network("c")).await;
    assert!(matches!(result, Err(HilError::NoFreeNetworkId)), "{result:?}");
    // The failed request did not leave a network behind
    assert!(matches!(
        env.api.show_network("c").await,
        Err(HilError::NotFound { .. })
    ));

    // Freeing one makes room again, and it is the only free identifier
    let freed = env.api.show_network("a").await?.net_id;
    env.api.network_delete("a").await?;
    let network = env.api.network_create(&admin_network("c")).await?;
    assert_eq!(network.net_id, freed);
    Ok(())
}

#[tokio::test]
async fn test_empty_pool() -> Result<(), eyre::Report> {
    let env = create_test_env_with_overrides(TestEnvOverrides {
        vlans: None,
        ..Default::default()
    })
    .await;
    assert!(matches!(
        env.api.network_create(&admin_network("a")).await,
        Err(HilError::NoFreeNetworkId)
    ));
    Ok(())
}

#[tokio::test]
async fn test_populate_is_idempotent() -> Result<(), eyre::Report> {
    let env = create_test_env().await;
    env.api.network_create(&admin_network("a")).await?;

    assert_eq!(env.api.populate_pool("100-200").await?, 0);
    assert_eq!(
        env.api.pool_stats().await?,
        AllocatorStats { used: 1, free: 100 }
    );
    assert_eq!(env.api.populate_pool("150-250").await?, 50);

    assert!(matches!(
        env.api.populate_pool("250-150").await,
        Err(HilError::InvalidArgument(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_explicit_identifiers() -> Result<(), eyre::Report> {
    let env = create_test_env().await;
    env.api.project_create(PROJECT_0).await?;

    // Tracked and free: taken out of the pool
    let claimed = env
        .api
        .network_create(&NetworkCreate {
            label: "claimed",
            net_id: Some("150"),
            ..Default::default()
        })
        .await?;
    assert!(claimed.allocated);
    assert_eq!(claimed.net_id, "150");
    assert_eq!(env.api.pool_stats().await?.used, 1);

    // Used by another network
    let result = env
        .api
        .network_create(&NetworkCreate {
            label: "again",
            net_id: Some("150"),
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(HilError::Conflict(_))), "{result:?}");

    // Not tracked: used as is and never returned to the pool
    let external = env
        .api
        .network_create(&NetworkCreate {
            label: "external",
            net_id: Some("3000"),
            ..Default::default()
        })
        .await?;
    assert!(!external.allocated);
    env.api.network_delete("external").await?;
    env.api.network_delete("claimed").await?;
    assert_eq!(
        env.api.pool_stats().await?,
        AllocatorStats { used: 0, free: 101 }
    );

    for (owner, net_id) in [(None, "5000"), (None, "abc"), (Some(PROJECT_0), "160")] {
        let result = env
            .api
            .network_create(&NetworkCreate {
                label: "bad",
                owner,
                net_id: Some(net_id),
                ..Default::default()
            })
            .await;
        assert!(
            matches!(result, Err(HilError::InvalidArgument(_))),
            "{net_id}: {result:?}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_failed_create_keeps_the_identifier() -> Result<(), eyre::Report> {
    let env = create_test_env().await;
    env.api.network_create(&admin_network("a")).await?;

    let result = env.api.network_create(&admin_network("a")).await;
    assert!(matches!(result, Err(HilError::AlreadyExists { .. })), "{result:?}");
    // The identifier allocated for the rejected network was rolled back
    assert_eq!(env.api.pool_stats().await?.used, 1);
    Ok(())
}

#[tokio::test]
async fn test_pool_grows_over_claimed_identifier() -> Result<(), eyre::Report> {
    let env = create_test_env_with_overrides(TestEnvOverrides::with_vlans("100")).await;
    let early = env
        .api
        .network_create(&NetworkCreate {
            label: "early",
            net_id: Some("50"),
            ..Default::default()
        })
        .await?;
    assert!(!early.allocated);

    env.api.populate_pool("50-60").await?;
    assert_eq!(
        env.api.pool_stats().await?,
        AllocatorStats { used: 1, free: 11 }
    );

    let mut net_ids = Vec::new();
    for n in 0..3 {
        let network = env
            .api
            .network_create(&admin_network(&format!("net-{n}")))
            .await?;
        net_ids.push(network.net_id);
    }
    assert_eq!(net_ids, vec!["51", "52", "53"]);

    // The pool owns the identifier now, so deleting the network frees it
    env.api.network_delete("early").await?;
    let network = env.api.network_create(&admin_network("late")).await?;
    assert_eq!(network.net_id, "50");
    Ok(())
}
