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

//! Command sessions over SSH, for network devices that are managed through a CLI.

use std::net::SocketAddr;
use std::time::Duration;

use async_ssh2_tokio::{AuthMethod, Client, ServerCheckMethod};
use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum SshError {
    #[error(transparent)]
    Ssh(#[from] async_ssh2_tokio::Error),

    #[error("`{command}` exited with status {exit_status}: {output}")]
    CommandFailed {
        command: String,
        exit_status: u32,
        output: String,
    },
}

/// Where and as whom to log in.
#[derive(Clone, Deserialize)]
pub struct SshCredentials {
    pub address: SocketAddr,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SshCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshCredentials")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Output of a remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub exit_status: u32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Configuration for russh's SSH client connections
fn russh_client_config() -> russh::client::Config {
    russh::client::Config {
        // Older switch firmware offers 2048 bit DH groups only, which russh rejects by default
        gex: russh::client::GexParams::new(2048, 8192, 8192)
            .expect("BUG: static DH group parameters must be valid"),
        keepalive_interval: Some(Duration::from_secs(30)),
        keepalive_max: 2,
        maximum_packet_size: 65535,
        ..Default::default()
    }
}

/// One logged in connection. Every command runs in its own channel, so a
/// session can be reused for a whole batch of changes.
pub struct SshSession {
    client: Client,
    address: SocketAddr,
}

impl SshSession {
    pub async fn connect(credentials: &SshCredentials) -> Result<Self, SshError> {
        let client = Client::connect_with_config(
            credentials.address,
            &credentials.username,
            AuthMethod::with_password(&credentials.password),
            ServerCheckMethod::NoCheck,
            russh_client_config(),
        )
        .await?;
        tracing::debug!(address = %credentials.address, "SSH session established");
        Ok(SshSession {
            client,
            address: credentials.address,
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Runs `command` and returns its output whatever the exit status was.
    pub async fn execute(&self, command: &str) -> Result<CommandOutput, SshError> {
        let result = self.client.execute(command).await?;
        Ok(CommandOutput {
            stdout: result.stdout,
            exit_status: result.exit_status,
        })
    }

    /// Runs `command` and fails unless it exits with status 0.
    pub async fn execute_checked(&self, command: &str) -> Result<String, SshError> {
        let output = self.execute(command).await?;
        if !output.success() {
            return Err(SshError::CommandFailed {
                command: command.to_string(),
                exit_status: output.exit_status,
                output: output.stdout,
            });
        }
        Ok(output.stdout)
    }

    /// Sends a list of CLI lines as one script, so that mode changes
    /// (`configure`, `interface ...`) apply to the lines that follow them.
    pub async fn run_script<S: AsRef<str>>(&self, lines: &[S]) -> Result<String, SshError> {
        let script = join_script(lines);
        tracing::trace!(address = %self.address, %script, "running CLI script");
        self.execute_checked(&script).await
    }

    pub async fn disconnect(self) -> Result<(), SshError> {
        self.client.disconnect().await?;
        tracing::debug!(address = %self.address, "SSH session closed");
        Ok(())
    }
}

fn join_script<S: AsRef<str>>(lines: &[S]) -> String {
    let mut script = String::new();
    for line in lines {
        script.push_str(line.as_ref());
        script.push('\n');
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_lines_are_newline_terminated() {
        assert_eq!(join_script(&["configure", "exit"]), "configure\nexit\n");
        assert_eq!(join_script::<&str>(&[]), "");
    }

    #[test]
    fn credentials_hide_the_password() {
        let credentials: SshCredentials = serde_json::from_value(serde_json::json!({
            "address": "192.0.2.10:22",
            "username": "admin",
            "password": "hunter2",
        }))
        .unwrap();
        let debug = format!("{credentials:?}");
        assert!(debug.contains("192.0.2.10:22"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn failed_commands_carry_their_output() {
        let error = SshError::CommandFailed {
            command: "show vlan".to_string(),
            exit_status: 1,
            output: "% Invalid input".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "`show vlan` exited with status 1: % Invalid input"
        );
    }
}
