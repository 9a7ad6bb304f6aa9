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

//! Brocade VDX switches, driven through the REST interface of the running configuration.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use model::switch::SwitchVendor;
use model::vlan_pool::VlanPoolSpec;
use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use reqwest::{Client as HttpClient, Method};
use serde::Deserialize;

use crate::SwitchError;
use crate::iface::{PortNetworks, SwitchDriver, SwitchSession, VlanTarget, vlan_port_networks};

const DEFAULT_INTERFACE_TYPE: &str = "TenGigabitEthernet";

static NATIVE_VLAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<native-vlan>\s*(\d+)\s*</native-vlan>").expect("BUG: static regex")
});
static ALLOWED_VLANS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<allowed>\s*<vlan>\s*<add>\s*([0-9,\-]+)\s*</add>").expect("BUG: static regex")
});
static PORT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(/[0-9]+)+$").expect("BUG: static regex"));

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrocadeConfig {
    /// Base URL of the switch, e.g. `https://10.0.0.5`
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "BrocadeConfig::default_interface_type")]
    pub interface_type: String,
    /// Accept self signed certificates
    #[serde(default)]
    pub allow_insecure: bool,
}

impl BrocadeConfig {
    fn default_interface_type() -> String {
        DEFAULT_INTERFACE_TYPE.to_string()
    }

    pub fn parse(config: &serde_json::Value) -> Result<Self, SwitchError> {
        let invalid = |reason: String| SwitchError::InvalidConfig {
            vendor: SwitchVendor::BrocadeVdx,
            reason,
        };
        let mut parsed: BrocadeConfig =
            serde_json::from_value(config.clone()).map_err(|e| invalid(e.to_string()))?;
        let url = reqwest::Url::parse(&parsed.url).map_err(|e| invalid(format!("url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("url scheme {} is not http(s)", url.scheme())));
        }
        if parsed.interface_type.is_empty()
            || !parsed.interface_type.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(invalid(format!(
                "bad interface type `{}`",
                parsed.interface_type
            )));
        }
        parsed.url = parsed.url.trim_end_matches('/').to_string();
        Ok(parsed)
    }
}

pub struct BrocadeDriver {
    config: BrocadeConfig,
    client: HttpClient,
}

impl BrocadeDriver {
    pub fn new(config: BrocadeConfig, timeout: Duration) -> Result<Self, SwitchError> {
        let client = HttpClient::builder()
            .danger_accept_invalid_certs(config.allow_insecure)
            .timeout(timeout)
            .build()
            .map_err(|e| SwitchError::Internal(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl SwitchDriver for BrocadeDriver {
    fn vendor(&self) -> SwitchVendor {
        SwitchVendor::BrocadeVdx
    }

    // REST calls are stateless, the session only carries the client.
    async fn session(&self) -> Result<Box<dyn SwitchSession>, SwitchError> {
        Ok(Box::new(BrocadeSession {
            config: self.config.clone(),
            client: self.client.clone(),
        }))
    }
}

struct BrocadeSession {
    config: BrocadeConfig,
    client: HttpClient,
}

impl BrocadeSession {
    fn switchport_url(&self, port: &str, path: &str) -> Result<String, SwitchError> {
        if !PORT_NAME_RE.is_match(port) {
            return Err(SwitchError::UnknownPort {
                switch: self.config.url.clone(),
                port: port.to_string(),
            });
        }
        Ok(format!(
            "{}/rest/config/running/interface/{}/%22{port}%22/switchport{path}",
            self.config.url, self.config.interface_type
        ))
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> Result<String, SwitchError> {
        tracing::debug!(%method, url, "brocade request");
        let mut request = self
            .client
            .request(method, url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(ACCEPT, HeaderValue::from_static("application/vnd.configuration.resource+xml"));
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/xml"))
                .body(body);
        }

        let response = request.send().await.map_err(|source| SwitchError::Http {
            url: url.to_string(),
            source,
        })?;
        let status_code = response.status();
        let text = response.text().await.map_err(|source| SwitchError::Http {
            url: url.to_string(),
            source,
        })?;
        if !status_code.is_success() {
            return Err(SwitchError::HttpStatus {
                url: url.to_string(),
                status_code: status_code.as_u16(),
                response_body: text,
            });
        }
        Ok(text)
    }

    /// Like [`Self::request`], but a missing resource counts as success.
    async fn delete(&self, url: &str) -> Result<(), SwitchError> {
        match self.request(Method::DELETE, url, None).await {
            Ok(_) => Ok(()),
            Err(SwitchError::HttpStatus { status_code: 404, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn enable_trunk(&self, port: &str) -> Result<(), SwitchError> {
        let url = self.switchport_url(port, "/mode")?;
        self.request(Method::PUT, &url, Some(mode_body())).await?;
        Ok(())
    }
}

#[async_trait]
impl SwitchSession for BrocadeSession {
    async fn ensure_port_attached(
        &mut self,
        port: &str,
        channel: &str,
        net_id: &str,
    ) -> Result<(), SwitchError> {
        let target = VlanTarget::for_attach(channel, net_id)?;
        self.enable_trunk(port).await?;
        match target {
            VlanTarget::Native(vlan) => {
                let url = self.switchport_url(port, "/trunk/native-vlan")?;
                self.request(Method::PUT, &url, Some(native_vlan_body(vlan))).await?;
            }
            VlanTarget::Tagged(vlan) => {
                let url = self.switchport_url(port, "/trunk/allowed/vlan")?;
                self.request(Method::PUT, &url, Some(allowed_vlan_body("add", vlan)))
                    .await?;
            }
        }
        Ok(())
    }

    async fn ensure_port_detached(&mut self, port: &str, channel: &str) -> Result<(), SwitchError> {
        match VlanTarget::tag_for_detach(channel)? {
            Some(vlan) => {
                let url = self.switchport_url(port, "/trunk/allowed/vlan")?;
                self.request(Method::PUT, &url, Some(allowed_vlan_body("remove", vlan)))
                    .await?;
            }
            None => {
                let url = self.switchport_url(port, "/trunk/native-vlan")?;
                self.delete(&url).await?;
            }
        }
        Ok(())
    }

    async fn revert_port(&mut self, port: &str) -> Result<(), SwitchError> {
        let url = self.switchport_url(port, "/trunk/native-vlan")?;
        self.delete(&url).await?;
        let url = self.switchport_url(port, "/trunk/allowed/vlan")?;
        self.request(Method::PUT, &url, Some(no_vlans_body())).await?;
        Ok(())
    }

    async fn get_port_networks(&mut self, port: &str) -> Result<PortNetworks, SwitchError> {
        let url = self.switchport_url(port, "/trunk")?;
        let body = match self.request(Method::GET, &url, None).await {
            Ok(body) => body,
            // A port that was never put in trunk mode has no trunk resource
            Err(SwitchError::HttpStatus { status_code: 404, .. }) => return Ok(PortNetworks::new()),
            Err(e) => return Err(e),
        };
        parse_trunk(&body).map_err(|reason| SwitchError::UnexpectedResponse {
            switch: self.config.url.clone(),
            reason,
        })
    }

    async fn save_running_config(&mut self) -> Result<(), SwitchError> {
        let url = format!("{}/rest/operations/bna-config-cmd", self.config.url);
        self.request(Method::POST, &url, Some(copy_config_body())).await?;
        Ok(())
    }

    async fn disconnect(self: Box<Self>) -> Result<(), SwitchError> {
        Ok(())
    }
}

fn mode_body() -> String {
    "<mode><vlan-mode>trunk</vlan-mode></mode>".to_string()
}

fn native_vlan_body(vlan: u16) -> String {
    format!("<native-vlan>{vlan}</native-vlan>")
}

fn allowed_vlan_body(operation: &str, vlan: u16) -> String {
    format!("<vlan><{operation}>{vlan}</{operation}></vlan>")
}

fn no_vlans_body() -> String {
    "<vlan><none>true</none></vlan>".to_string()
}

fn copy_config_body() -> String {
    "<bna-config-cmd><src>running-config</src><dest>startup-config</dest></bna-config-cmd>"
        .to_string()
}

fn parse_trunk(body: &str) -> Result<PortNetworks, String> {
    let native = NATIVE_VLAN_RE
        .captures(body)
        .map(|c| c[1].parse::<u16>())
        .transpose()
        .map_err(|e| format!("bad native VLAN: {e}"))?;
    let tagged = match ALLOWED_VLANS_RE.captures(body) {
        Some(c) => c[1]
            .parse::<VlanPoolSpec>()
            .map_err(|e| e.to_string())?
            .vlans()
            .clone(),
        None => Default::default(),
    };
    Ok(vlan_port_networks(native, tagged))
}
