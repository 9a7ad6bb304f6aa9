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
//! Applies the action log to the switches.
//!
//! Every run collects the switches with pending actions and drains each of them in
//! its own task. Within a switch, actions are applied strictly in log order over a
//! single session, and every success is confirmed in a short transaction of its own.
//! The first failure stops the batch of that switch; the failed action and everything
//! after it stay pending for the next run. Nothing is retried within a run.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use model::id::SwitchId;
use model::network_action::{NetworkAction, PortAction};
use model::switch::Switch;
use sqlx::SqlitePool;
use switch::{PortNetworks, SwitchDriver, SwitchDriverFactory, SwitchError, SwitchSession};
use tokio::task::JoinSet;

pub use self::report::{ApplyNetworkingReport, ReconcileError, SwitchOutcome};
use crate::cfg::file::ReconcilerConfig;
use crate::errors::HilResult;

mod report;

/// Owns the drivers of all switches and makes sure only one batch talks to a
/// switch at any time.
#[derive(Clone)]
pub struct NetworkActionEngine {
    pool: SqlitePool,
    factory: Arc<SwitchDriverFactory>,
    drivers: Arc<DashMap<SwitchId, Arc<dyn SwitchDriver>>>,
    switch_locks: Arc<DashMap<SwitchId, Arc<tokio::sync::Mutex<()>>>>,
    config: ReconcilerConfig,
}

impl NetworkActionEngine {
    pub fn new(pool: SqlitePool, factory: Arc<SwitchDriverFactory>, config: ReconcilerConfig) -> Self {
        Self {
            pool,
            factory,
            drivers: Arc::new(DashMap::new()),
            switch_locks: Arc::new(DashMap::new()),
            config,
        }
    }

    pub fn factory(&self) -> &Arc<SwitchDriverFactory> {
        &self.factory
    }

    /// Drops the cached driver of a deleted switch once no batch is using it.
    pub async fn forget_switch(&self, switch_id: SwitchId) {
        let lock = self.switch_lock(switch_id);
        let _guard = lock.lock().await;
        self.drivers.remove(&switch_id);
        // Only the map and `lock` may hold the mutex, otherwise a waiter still needs it
        self.switch_locks
            .remove_if(&switch_id, |_, held| Arc::strong_count(held) <= 2);
    }

    /// Applies every pending action. Failures on one switch never affect the others;
    /// they are reported per switch and are retried by calling this again.
    #[tracing::instrument(skip(self))]
    pub async fn apply_networking(&self) -> HilResult<ApplyNetworkingReport> {
        let mut txn = db::begin(&self.pool).await?;
        let switch_ids = db::network_action::pending_switches(&mut txn).await?;
        let mut switches = Vec::with_capacity(switch_ids.len());
        for switch_id in switch_ids {
            switches.push(db::switch::find(&mut txn, switch_id).await?);
        }
        db::commit(txn).await?;

        let mut report = ApplyNetworkingReport::default();
        if switches.is_empty() {
            return Ok(report);
        }

        let concurrency_limiter = Arc::new(tokio::sync::Semaphore::new(
            self.config.max_concurrent_switches,
        ));
        let mut task_set = JoinSet::new();
        let mut labels = BTreeSet::new();

        for switch in switches {
            let engine = self.clone();
            let concurrency_limiter = concurrency_limiter.clone();
            labels.insert(switch.label.clone());
            task_set.spawn(async move {
                // The permit has to stay alive for the whole batch
                let _permit = concurrency_limiter
                    .acquire()
                    .await
                    .expect("Semaphore can't be closed");
                let outcome = engine.reconcile_switch(&switch).await;
                (switch.label, outcome)
            });
        }

        while let Some(result) = task_set.join_next().await {
            match result {
                Ok((label, outcome)) => {
                    report.switches.insert(label, outcome);
                }
                Err(e) => tracing::error!(error = %e, "Networking task failed"),
            }
        }
        for label in labels {
            report.switches.entry(label).or_insert_with(|| SwitchOutcome {
                error: Some("networking task failed".to_string()),
                ..Default::default()
            });
        }

        tracing::info!(
            switches = report.switches.len(),
            applied = report.applied(),
            success = report.is_success(),
            "Applied networking actions"
        );
        Ok(report)
    }

    /// Reads back what `port` carries on the switch right now.
    #[tracing::instrument(skip(self, switch), fields(switch = %switch.label))]
    pub async fn port_networks(&self, switch: &Switch, port: &str) -> Result<PortNetworks, ReconcileError> {
        let lock = self.switch_lock(switch.id);
        let _guard = lock.lock().await;

        let mut session = self.open_session(switch).await?;
        let result = self
            .with_timeout(
                format!("reading port {port}"),
                session.get_port_networks(port),
            )
            .await;
        self.disconnect(switch, session).await;
        result
    }

    async fn reconcile_switch(&self, switch: &Switch) -> SwitchOutcome {
        let lock = self.switch_lock(switch.id);
        let _guard = lock.lock().await;

        // Another run may have drained the switch while this one waited for the lock
        let actions = match self.pending_actions(switch.id).await {
            Ok(actions) => actions,
            Err(e) => {
                tracing::error!(switch = %switch.label, error = %e, "Could not load pending actions");
                return SwitchOutcome {
                    error: Some(e.to_string()),
                    ..Default::default()
                };
            }
        };
        if actions.is_empty() {
            return SwitchOutcome::default();
        }

        let mut outcome = SwitchOutcome {
            remaining: actions.len(),
            ..Default::default()
        };

        let mut session = match self.open_session(switch).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(switch = %switch.label, error = %e, "Could not open switch session");
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };

        for action in &actions {
            if let Err(e) = self.apply_action(session.as_mut(), action).await {
                tracing::warn!(
                    switch = %switch.label,
                    port = %action.port,
                    action_id = %action.id,
                    error = %e,
                    "Networking action failed"
                );
                outcome.error = Some(format!("action {} on port {}: {e}", action.id, action.port));
                break;
            }
            outcome.applied += 1;
            outcome.remaining -= 1;
        }

        if outcome.is_success() && self.config.save_running_config {
            match self
                .with_timeout("saving the running configuration".to_string(), session.save_running_config())
                .await
            {
                Ok(()) => {}
                Err(ReconcileError::Switch(e)) if e.is_unsupported() => {}
                Err(e) => {
                    tracing::error!(switch = %switch.label, error = %e, "Could not save running configuration");
                    outcome.error = Some(e.to_string());
                }
            }
        }

        self.disconnect(switch, session).await;
        outcome
    }

    /// Runs one action on the switch and records that it happened.
    async fn apply_action(
        &self,
        session: &mut dyn SwitchSession,
        action: &NetworkAction,
    ) -> Result<(), ReconcileError> {
        let port = action.port.as_str();
        match &action.action {
            PortAction::Attach { channel, net_id } => {
                self.with_timeout(
                    format!("attaching {net_id} on {channel} to port {port}"),
                    session.ensure_port_attached(port, channel, net_id),
                )
                .await?
            }
            PortAction::Detach { channel } => {
                self.with_timeout(
                    format!("detaching {channel} from port {port}"),
                    session.ensure_port_detached(port, channel),
                )
                .await?
            }
            PortAction::Revert => {
                self.with_timeout(format!("reverting port {port}"), session.revert_port(port))
                    .await?
            }
        }
        tracing::debug!(port, action_id = %action.id, kind = %action.action.kind(), "Applied networking action");
        self.confirm(action).await
    }

    async fn confirm(&self, action: &NetworkAction) -> Result<(), ReconcileError> {
        let mut txn = db::begin(&self.pool).await?;
        if !db::network_action::mark_done(&mut txn, action.id).await? {
            tracing::warn!(action_id = %action.id, "Networking action was no longer pending");
        }
        match (&action.action, action.nic_id) {
            (PortAction::Attach { channel, .. }, Some(nic_id)) => {
                db::attachment::activate(&mut txn, nic_id, channel).await?;
            }
            (PortAction::Detach { channel }, Some(nic_id)) => {
                db::attachment::delete(&mut txn, nic_id, channel).await?;
            }
            (PortAction::Revert, Some(nic_id)) => {
                db::attachment::delete_for_nic(&mut txn, nic_id).await?;
            }
            (PortAction::Revert, None) => {
                db::attachment::delete_for_port(&mut txn, action.port_id).await?;
            }
            (_, None) => {}
        }
        db::commit(txn).await?;
        Ok(())
    }

    async fn pending_actions(&self, switch_id: SwitchId) -> Result<Vec<NetworkAction>, ReconcileError> {
        let mut txn = db::begin(&self.pool).await?;
        let actions = db::network_action::pending_for_switch(&mut txn, switch_id).await?;
        db::commit(txn).await?;
        Ok(actions)
    }

    async fn open_session(&self, switch: &Switch) -> Result<Box<dyn SwitchSession>, ReconcileError> {
        let driver = self.driver(switch)?;
        self.with_timeout(
            format!("connecting to switch {}", switch.label),
            driver.session(),
        )
        .await
    }

    /// The session is closed on every path. A failing disconnect only gets logged.
    async fn disconnect(&self, switch: &Switch, session: Box<dyn SwitchSession>) {
        if let Err(e) = self
            .with_timeout("disconnecting".to_string(), session.disconnect())
            .await
        {
            tracing::warn!(switch = %switch.label, error = %e, "Could not disconnect from switch");
        }
    }

    fn driver(&self, switch: &Switch) -> Result<Arc<dyn SwitchDriver>, SwitchError> {
        if let Some(driver) = self.drivers.get(&switch.id) {
            return Ok(driver.clone());
        }
        let driver = self.factory.driver_for(switch)?;
        Ok(self.drivers.entry(switch.id).or_insert(driver).clone())
    }

    fn switch_lock(&self, switch_id: SwitchId) -> Arc<tokio::sync::Mutex<()>> {
        self.switch_locks.entry(switch_id).or_default().clone()
    }

    async fn with_timeout<T>(
        &self,
        operation: String,
        fut: impl Future<Output = Result<T, SwitchError>>,
    ) -> Result<T, ReconcileError> {
        let timeout: Duration = self.config.driver_timeout;
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_elapsed) => Err(ReconcileError::Timeout {
                operation,
                timeout: timeout.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::test_db;

    #[tokio::test]
    async fn forget_switch_waits_for_running_batch() {
        let engine = NetworkActionEngine::new(
            test_db().await,
            Arc::new(SwitchDriverFactory::default()),
            ReconcilerConfig::default(),
        );
        let switch_id = SwitchId(7);
        let lock = engine.switch_lock(switch_id);
        let guard = lock.lock().await;

        let forget = tokio::spawn({
            let engine = engine.clone();
            async move { engine.forget_switch(switch_id).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!forget.is_finished());
        assert!(engine.switch_locks.contains_key(&switch_id));

        drop(guard);
        forget.await.unwrap();
        drop(lock);
        // Dropped once nobody holds it any more
        engine.forget_switch(switch_id).await;
        assert!(!engine.switch_locks.contains_key(&switch_id));
    }
}
