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
//! HIL, the hardware isolation layer: hands bare-metal nodes to projects and keeps
//! their networks apart by programming VLANs on the switches they are cabled to.

use std::sync::Arc;

use tokio::sync::oneshot;

pub mod allocator;
pub mod api;
pub mod cfg;
pub mod errors;
mod handlers;
pub mod logging;
pub mod network_actions;

#[cfg(test)]
mod tests;

pub use crate::errors::{HilError, HilResult};
use crate::api::Api;
use crate::cfg::file::HilApiConfig;

/// Adds the VLANs of the configuration to the pool, if any are configured.
pub async fn populate_configured_pool(api: &Api, config: &HilApiConfig) -> HilResult<()> {
    if let Some(vlans) = &config.network_allocator.vlans {
        let added = api.populate_pool(vlans).await?;
        tracing::info!(added, vlans = %vlans, "Network identifier pool is up to date");
    }
    Ok(())
}

/// Runs hil-api until `stop_rx` fires: applies pending networking actions every
/// `reconciler.interval`.
pub async fn run(config: HilApiConfig, stop_rx: oneshot::Receiver<()>) -> HilResult<()> {
    let api = Arc::new(Api::from_config(&config).await?);
    populate_configured_pool(&api, &config).await?;
    run_reconciler(api, &config, stop_rx).await;
    Ok(())
}

/// Periodically drains the action log. A failed run is logged and retried on the next tick.
pub async fn run_reconciler(api: Arc<Api>, config: &HilApiConfig, mut stop_rx: oneshot::Receiver<()>) {
    if !config.reconciler.enabled {
        tracing::info!("Networking reconciler is disabled");
        let _ = stop_rx.await;
        return;
    }

    let mut interval = tokio::time::interval(config.reconciler.interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tracing::info!(
        interval = %humantime::format_duration(config.reconciler.interval),
        "Starting networking reconciler"
    );

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                tracing::info!("Stopping networking reconciler");
                return;
            }
            _ = interval.tick() => {
                match api.apply_networking().await {
                    Ok(report) => {
                        for (switch, error) in report.failed_switches() {
                            tracing::warn!(switch, error, "Networking actions remain pending");
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "apply_networking failed"),
                }
            }
        }
    }
}
