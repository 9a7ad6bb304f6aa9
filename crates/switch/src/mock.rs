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

//! An in-memory switch fabric. Each fabric is an independent value, so every test
//! gets its own hardware state.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use model::channel::Channel;
use model::switch::SwitchVendor;

use crate::iface::{ConfigKind, PortNetworks, SwitchDriver, SwitchSession, VlanTarget};
use crate::SwitchError;

/// Failures that can be injected into a mocked switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// Opening a session fails
    Connect,
    /// Every operation on this port fails
    Port(String),
    /// Port operations never complete
    Hang,
}

/// Session bookkeeping of one mocked switch.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SessionCounters {
    pub opened: usize,
    pub closed: usize,
    /// The most sessions that were open at the same time
    pub max_concurrent: usize,
}

#[derive(Default)]
struct MockSwitch {
    ports: BTreeMap<String, PortNetworks>,
    startup_config: Option<String>,
    failure: Option<MockFailure>,
    counters: SessionCounters,
    open_sessions: usize,
}

impl MockSwitch {
    fn render(&self) -> String {
        let mut config = String::new();
        for (port, networks) in &self.ports {
            let _ = writeln!(config, "interface {port}");
            for (channel, net_id) in networks {
                let _ = writeln!(config, "  {channel} {net_id}");
            }
        }
        config
    }
}

#[derive(Default)]
pub struct MockSwitchFabric {
    switches: Mutex<HashMap<String, MockSwitch>>,
}

impl MockSwitchFabric {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HashMap<String, MockSwitch>> {
        self.switches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `port` known to the mocked switch. Operations on unknown ports fail.
    pub fn add_port(&self, switch: &str, port: &str) {
        self.state()
            .entry(switch.to_string())
            .or_default()
            .ports
            .entry(port.to_string())
            .or_default();
    }

    pub fn set_failure(&self, switch: &str, failure: Option<MockFailure>) {
        self.state().entry(switch.to_string()).or_default().failure = failure;
    }

    /// What the port carries right now, looked at from outside any session.
    pub fn port_networks(&self, switch: &str, port: &str) -> Option<PortNetworks> {
        self.state()
            .get(switch)
            .and_then(|s| s.ports.get(port))
            .cloned()
    }

    pub fn counters(&self, switch: &str) -> SessionCounters {
        self.state()
            .get(switch)
            .map(|s| s.counters)
            .unwrap_or_default()
    }

    pub fn open_sessions(&self, switch: &str) -> usize {
        self.state().get(switch).map_or(0, |s| s.open_sessions)
    }

    pub fn driver(self: &Arc<Self>, switch: &str) -> MockSwitchDriver {
        MockSwitchDriver {
            fabric: self.clone(),
            switch: switch.to_string(),
        }
    }
}

pub struct MockSwitchDriver {
    fabric: Arc<MockSwitchFabric>,
    switch: String,
}

#[async_trait]
impl SwitchDriver for MockSwitchDriver {
    fn vendor(&self) -> SwitchVendor {
        SwitchVendor::Mock
    }

    async fn session(&self) -> Result<Box<dyn SwitchSession>, SwitchError> {
        let mut state = self.fabric.state();
        let switch = state.entry(self.switch.clone()).or_default();
        if switch.failure == Some(MockFailure::Connect) {
            return Err(SwitchError::Connect {
                switch: self.switch.clone(),
                reason: "injected connect failure".to_string(),
            });
        }
        switch.counters.opened += 1;
        switch.open_sessions += 1;
        switch.counters.max_concurrent = switch.counters.max_concurrent.max(switch.open_sessions);

        Ok(Box::new(MockSwitchSession {
            fabric: self.fabric.clone(),
            switch: self.switch.clone(),
        }))
    }
}

struct MockSwitchSession {
    fabric: Arc<MockSwitchFabric>,
    switch: String,
}

impl MockSwitchSession {
    /// Runs `f` on the networks of `port`, after applying injected failures.
    async fn with_port<T>(
        &self,
        port: &str,
        f: impl FnOnce(&mut PortNetworks) -> T,
    ) -> Result<T, SwitchError> {
        let failure = self
            .fabric
            .state()
            .get(&self.switch)
            .and_then(|s| s.failure.clone());
        match failure {
            Some(MockFailure::Hang) => std::future::pending::<()>().await,
            Some(MockFailure::Port(failing)) if failing == port => {
                return Err(SwitchError::Command {
                    switch: self.switch.clone(),
                    reason: format!("injected failure on port {port}"),
                });
            }
            _ => {}
        }

        let mut state = self.fabric.state();
        let networks = state
            .get_mut(&self.switch)
            .and_then(|s| s.ports.get_mut(port))
            .ok_or_else(|| SwitchError::UnknownPort {
                switch: self.switch.clone(),
                port: port.to_string(),
            })?;
        Ok(f(networks))
    }
}

#[async_trait]
impl SwitchSession for MockSwitchSession {
    async fn ensure_port_attached(
        &mut self,
        port: &str,
        channel: &str,
        net_id: &str,
    ) -> Result<(), SwitchError> {
        let channel_name = channel;
        let channel = Channel::from_str(channel_name)?;
        // Same consistency rules as the VLAN drivers; `null` carries any identifier
        if channel != Channel::Null {
            VlanTarget::for_attach(channel_name, net_id)?;
        }
        self.with_port(port, |networks| {
            networks.insert(channel.to_string(), net_id.to_string());
        })
        .await
    }

    async fn ensure_port_detached(&mut self, port: &str, channel: &str) -> Result<(), SwitchError> {
        let channel = Channel::from_str(channel)?;
        self.with_port(port, |networks| {
            networks.remove(&channel.to_string());
        })
        .await
    }

    async fn revert_port(&mut self, port: &str) -> Result<(), SwitchError> {
        self.with_port(port, |networks| networks.clear()).await
    }

    async fn get_port_networks(&mut self, port: &str) -> Result<PortNetworks, SwitchError> {
        self.with_port(port, |networks| networks.clone()).await
    }

    async fn save_running_config(&mut self) -> Result<(), SwitchError> {
        let mut state = self.fabric.state();
        if let Some(switch) = state.get_mut(&self.switch) {
            switch.startup_config = Some(switch.render());
        }
        Ok(())
    }

    async fn get_config(&mut self, kind: ConfigKind) -> Result<String, SwitchError> {
        let state = self.fabric.state();
        let Some(switch) = state.get(&self.switch) else {
            return Ok(String::new());
        };
        Ok(match kind {
            ConfigKind::Running => switch.render(),
            ConfigKind::Startup => switch.startup_config.clone().unwrap_or_default(),
        })
    }

    async fn disconnect(self: Box<Self>) -> Result<(), SwitchError> {
        let mut state = self.fabric.state();
        if let Some(switch) = state.get_mut(&self.switch) {
            switch.open_sessions = switch.open_sessions.saturating_sub(1);
            switch.counters.closed += 1;
        }
        Ok(())
    }
}
