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

//! Dell PowerConnect switches, driven through their CLI over SSH.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use hil_ssh::{SshCredentials, SshSession};
use model::switch::SwitchVendor;
use model::vlan_pool::VlanPoolSpec;
use regex::Regex;
use serde::Deserialize;

use crate::SwitchError;
use crate::iface::{
    ConfigKind, PortNetworks, SwitchDriver, SwitchSession, VlanTarget, vlan_port_networks,
};

const DEFAULT_SSH_PORT: u16 = 22;

static NATIVE_VLAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*Trunking Native Mode VLAN:\s*(\d+)").expect("BUG: static regex")
});
static TRUNK_VLANS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*Trunking VLANs Enabled:\s*([0-9][0-9,\- ]*)").expect("BUG: static regex")
});
static PORT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+[0-9]+(/[0-9]+)*$").expect("BUG: static regex"));

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DellConfig {
    pub host: String,
    #[serde(default = "DellConfig::default_ssh_port")]
    pub ssh_port: u16,
    pub username: String,
    pub password: String,
}

impl DellConfig {
    fn default_ssh_port() -> u16 {
        DEFAULT_SSH_PORT
    }

    pub fn parse(config: &serde_json::Value) -> Result<Self, SwitchError> {
        let parsed: DellConfig =
            serde_json::from_value(config.clone()).map_err(|e| SwitchError::InvalidConfig {
                vendor: SwitchVendor::DellPowerconnect,
                reason: e.to_string(),
            })?;
        if parsed.host.trim().is_empty() {
            return Err(SwitchError::InvalidConfig {
                vendor: SwitchVendor::DellPowerconnect,
                reason: "host must not be empty".to_string(),
            });
        }
        Ok(parsed)
    }
}

pub struct DellDriver {
    config: DellConfig,
}

impl DellDriver {
    pub fn new(config: DellConfig) -> Self {
        Self { config }
    }

    async fn credentials(&self) -> Result<SshCredentials, SwitchError> {
        let connect_error = |reason: String| SwitchError::Connect {
            switch: self.config.host.clone(),
            reason,
        };
        let address = tokio::net::lookup_host((self.config.host.as_str(), self.config.ssh_port))
            .await
            .map_err(|e| connect_error(e.to_string()))?
            .next()
            .ok_or_else(|| connect_error("host name did not resolve".to_string()))?;
        Ok(SshCredentials {
            address,
            username: self.config.username.clone(),
            password: self.config.password.clone(),
        })
    }
}

#[async_trait]
impl SwitchDriver for DellDriver {
    fn vendor(&self) -> SwitchVendor {
        SwitchVendor::DellPowerconnect
    }

    async fn session(&self) -> Result<Box<dyn SwitchSession>, SwitchError> {
        let credentials = self.credentials().await?;
        let ssh = SshSession::connect(&credentials).await?;
        Ok(Box::new(DellSession {
            ssh,
            host: self.config.host.clone(),
        }))
    }
}

struct DellSession {
    ssh: SshSession,
    host: String,
}

impl DellSession {
    async fn configure_port(&self, port: &str, commands: &[String]) -> Result<(), SwitchError> {
        let script = interface_script(port, commands)?;
        tracing::debug!(switch = %self.host, port, "configuring port");
        self.ssh.run_script(&script).await?;
        Ok(())
    }
}

#[async_trait]
impl SwitchSession for DellSession {
    async fn ensure_port_attached(
        &mut self,
        port: &str,
        channel: &str,
        net_id: &str,
    ) -> Result<(), SwitchError> {
        let commands = attach_commands(VlanTarget::for_attach(channel, net_id)?);
        self.configure_port(port, &commands).await
    }

    async fn ensure_port_detached(&mut self, port: &str, channel: &str) -> Result<(), SwitchError> {
        let commands = match VlanTarget::tag_for_detach(channel)? {
            Some(vlan) => vec![format!("switchport trunk allowed vlan remove {vlan}")],
            None => {
                // The allowed list has to lose the native VLAN as well
                let current = self.get_port_networks(port).await?;
                let mut commands = vec!["no switchport trunk native vlan".to_string()];
                if let Some(vlan) = current.get(channel) {
                    commands.push(format!("switchport trunk allowed vlan remove {vlan}"));
                }
                commands
            }
        };
        self.configure_port(port, &commands).await
    }

    async fn revert_port(&mut self, port: &str) -> Result<(), SwitchError> {
        let current = self.get_port_networks(port).await?;
        self.configure_port(port, &revert_commands(&current)).await
    }

    async fn get_port_networks(&mut self, port: &str) -> Result<PortNetworks, SwitchError> {
        validate_port_name(port)?;
        let output = self
            .ssh
            .execute_checked(&format!("show interfaces switchport {port}"))
            .await?;
        parse_switchport(&output).map_err(|reason| SwitchError::UnexpectedResponse {
            switch: self.host.clone(),
            reason,
        })
    }

    async fn save_running_config(&mut self) -> Result<(), SwitchError> {
        self.ssh
            .run_script(&["copy running-config startup-config", "y"])
            .await?;
        Ok(())
    }

    async fn get_config(&mut self, kind: ConfigKind) -> Result<String, SwitchError> {
        Ok(self.ssh.execute_checked(&format!("show {kind}-config")).await?)
    }

    async fn disconnect(self: Box<Self>) -> Result<(), SwitchError> {
        self.ssh.disconnect().await?;
        Ok(())
    }
}

// Ports end up inside a CLI script, so only plain interface names get through.
fn validate_port_name(port: &str) -> Result<(), SwitchError> {
    if PORT_NAME_RE.is_match(port) {
        Ok(())
    } else {
        Err(SwitchError::UnknownPort {
            switch: "dell-powerconnect".to_string(),
            port: port.to_string(),
        })
    }
}

fn attach_commands(target: VlanTarget) -> Vec<String> {
    let mut commands = vec!["switchport mode trunk".to_string()];
    match target {
        VlanTarget::Native(vlan) => {
            commands.push(format!("switchport trunk native vlan {vlan}"));
            commands.push(format!("switchport trunk allowed vlan add {vlan}"));
        }
        VlanTarget::Tagged(vlan) => {
            commands.push(format!("switchport trunk allowed vlan add {vlan}"));
        }
    }
    commands
}

/// Removes exactly what the port carries, whatever range the VLANs come from.
fn revert_commands(current: &PortNetworks) -> Vec<String> {
    let vlans: BTreeSet<u16> = current.values().filter_map(|v| v.parse().ok()).collect();
    let mut commands = vec!["no switchport trunk native vlan".to_string()];
    if !vlans.is_empty() {
        let list: Vec<String> = vlans.iter().map(u16::to_string).collect();
        commands.push(format!("switchport trunk allowed vlan remove {}", list.join(",")));
    }
    commands
}

fn interface_script(port: &str, commands: &[String]) -> Result<Vec<String>, SwitchError> {
    validate_port_name(port)?;
    let mut script = Vec::with_capacity(commands.len() + 4);
    script.push("configure".to_string());
    script.push(format!("interface {port}"));
    script.extend(commands.iter().cloned());
    script.push("exit".to_string());
    script.push("exit".to_string());
    Ok(script)
}

fn parse_switchport(output: &str) -> Result<PortNetworks, String> {
    let native = NATIVE_VLAN_RE
        .captures(output)
        .map(|c| c[1].parse::<u16>())
        .transpose()
        .map_err(|e| format!("bad native VLAN: {e}"))?;

    let tagged = match TRUNK_VLANS_RE.captures(output) {
        Some(c) => {
            let list: String = c[1].chars().filter(|c| !c.is_whitespace()).collect();
            list.parse::<VlanPoolSpec>()
                .map_err(|e| e.to_string())?
                .vlans()
                .clone()
        }
        None => Default::default(),
    };
    // VLAN 1 is the factory default native VLAN. It only counts while it is also allowed.
    let native = native.filter(|vlan| *vlan != 1 || tagged.contains(vlan));
    Ok(vlan_port_networks(native, tagged))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_needs_credentials() {
        let config = DellConfig::parse(&serde_json::json!({
            "host": "sw0.example.org",
            "username": "admin",
            "password": "secret",
        }))
        .unwrap();
        assert_eq!(config.ssh_port, 22);

        assert!(DellConfig::parse(&serde_json::json!({"host": "sw0"})).is_err());
        assert!(
            DellConfig::parse(&serde_json::json!({
                "host": " ",
                "username": "admin",
                "password": "secret",
            }))
            .is_err()
        );
    }

    #[test]
    fn revert_removes_every_carried_vlan() {
        let current = vlan_port_networks(Some(100), [100, 250, 4095]);
        assert_eq!(
            revert_commands(&current),
            vec![
                "no switchport trunk native vlan",
                "switchport trunk allowed vlan remove 100,250,4095",
            ]
        );
        assert_eq!(
            revert_commands(&PortNetworks::new()),
            vec!["no switchport trunk native vlan"]
        );
    }

    #[test]
    fn native_attach_script() {
        let commands = attach_commands(VlanTarget::Native(100));
        let script = interface_script("gi1/0/3", &commands).unwrap();
        assert_eq!(
            script,
            vec![
                "configure",
                "interface gi1/0/3",
                "switchport mode trunk",
                "switchport trunk native vlan 100",
                "switchport trunk allowed vlan add 100",
                "exit",
                "exit",
            ]
        );
    }

    #[test]
    fn port_names_are_checked() {
        assert!(interface_script("te1/0/48", &[]).is_ok());
        assert!(interface_script("gi1/0/1\nreload", &[]).is_err());
        assert!(interface_script("", &[]).is_err());
    }

    #[test]
    fn parse_trunk_port() {
        let output = "\
Port: Gi1/0/3
VLAN Membership Mode: Trunk Mode
Operating parameters:
PVID: 100
Trunking Native Mode VLAN: 100
Trunking VLANs Enabled: 100,200-202
";
        let networks = parse_switchport(output).unwrap();
        assert_eq!(
            networks,
            PortNetworks::from([
                ("vlan/native".to_string(), "100".to_string()),
                ("vlan/200".to_string(), "200".to_string()),
                ("vlan/201".to_string(), "201".to_string()),
                ("vlan/202".to_string(), "202".to_string()),
            ])
        );
    }

    #[test]
    fn parse_reverted_port() {
        let output = "\
Port: Gi1/0/3
Trunking Native Mode VLAN: 1
Trunking VLANs Enabled: none
";
        assert!(parse_switchport(output).unwrap().is_empty());
    }
}
