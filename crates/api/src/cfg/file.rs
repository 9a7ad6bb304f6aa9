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

//! The configuration file of hil-api.

use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};

/// Environment variables with this prefix override configuration file values.
/// Nested keys are separated by `__`, e.g. `HIL_API_RECONCILER__INTERVAL`.
pub const ENV_PREFIX: &str = "HIL_API_";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Could not load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HilApiConfig {
    /// SQLite connection string, e.g. `sqlite:///var/lib/hil/hil.db`
    pub database_url: String,

    #[serde(default = "Defaults::max_database_connections")]
    pub max_database_connections: u32,

    #[serde(default)]
    pub network_allocator: NetworkAllocatorConfig,

    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NetworkAllocatorKind {
    #[default]
    VlanPool,
    Null,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkAllocatorConfig {
    #[serde(default)]
    pub kind: NetworkAllocatorKind,

    /// The VLANs handed to the pool on `populate` and at startup, e.g. `"1001-1040"`
    #[serde(default)]
    pub vlans: Option<String>,
}

/// Settings of the engine that applies queued networking actions to the switches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Whether `run` applies networking actions periodically
    #[serde(default = "Defaults::reconciler_enabled")]
    pub enabled: bool,

    #[serde(default = "Defaults::reconciler_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Upper bound for opening a session and for every single driver call
    #[serde(default = "Defaults::driver_timeout", with = "humantime_serde")]
    pub driver_timeout: Duration,

    #[serde(default = "Defaults::max_concurrent_switches")]
    pub max_concurrent_switches: usize,

    /// Persist the running configuration after every fully applied batch
    #[serde(default)]
    pub save_running_config: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: Defaults::reconciler_enabled(),
            interval: Defaults::reconciler_interval(),
            driver_timeout: Defaults::driver_timeout(),
            max_concurrent_switches: Defaults::max_concurrent_switches(),
            save_running_config: false,
        }
    }
}

pub struct Defaults;

impl Defaults {
    pub fn max_database_connections() -> u32 {
        8
    }

    pub fn reconciler_enabled() -> bool {
        true
    }

    pub fn reconciler_interval() -> Duration {
        Duration::from_secs(10)
    }

    pub fn driver_timeout() -> Duration {
        Duration::from_secs(60)
    }

    pub fn max_concurrent_switches() -> usize {
        16
    }
}

impl HilApiConfig {
    /// Loads the configuration at `config_path`, patched by the optional site
    /// configuration and then by `HIL_API_` environment variables.
    pub fn load(config_path: &Path, site_config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Toml::file(config_path));
        if let Some(site_config_path) = site_config_path {
            figment = figment.merge(Toml::file(site_config_path));
        }
        let config: HilApiConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.reconciler.max_concurrent_switches == 0 {
            return Err(ConfigError::Invalid(
                "reconciler.max_concurrent_switches must be at least 1".to_string(),
            ));
        }
        if self.reconciler.driver_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "reconciler.driver_timeout must not be zero".to_string(),
            ));
        }
        if let Some(vlans) = &self.network_allocator.vlans {
            vlans
                .parse::<model::vlan_pool::VlanPoolSpec>()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    const BASE_CONFIG: &str = r#"
database_url = "sqlite:///var/lib/hil/hil.db"

[network_allocator]
vlans = "1001-1040"

[reconciler]
interval = "30s"
"#;

    #[test]
    fn defaults_apply() {
        Jail::expect_with(|jail| {
            jail.create_file("hil.toml", "database_url = \"sqlite::memory:\"")?;
            let config = HilApiConfig::load(Path::new("hil.toml"), None).unwrap();
            assert_eq!(config.max_database_connections, 8);
            assert_eq!(config.network_allocator.kind, NetworkAllocatorKind::VlanPool);
            assert_eq!(config.network_allocator.vlans, None);
            assert_eq!(config.reconciler, ReconcilerConfig::default());
            Ok(())
        });
    }

    #[test]
    fn site_config_and_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("hil.toml", BASE_CONFIG)?;
            jail.create_file(
                "site.toml",
                r#"
[network_allocator]
vlans = "2000-2099"

[reconciler]
driver_timeout = "5s"
save_running_config = true
"#,
            )?;
            jail.set_env("HIL_API_RECONCILER__INTERVAL", "2m");
            jail.set_env("HIL_API_MAX_DATABASE_CONNECTIONS", "3");

            let config =
                HilApiConfig::load(Path::new("hil.toml"), Some(Path::new("site.toml"))).unwrap();
            assert_eq!(config.database_url, "sqlite:///var/lib/hil/hil.db");
            assert_eq!(config.max_database_connections, 3);
            assert_eq!(config.network_allocator.vlans.as_deref(), Some("2000-2099"));
            assert_eq!(config.reconciler.interval, Duration::from_secs(120));
            assert_eq!(config.reconciler.driver_timeout, Duration::from_secs(5));
            assert!(config.reconciler.save_running_config);
            Ok(())
        });
    }

    #[test]
    fn null_allocator() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "hil.toml",
                "database_url = \"sqlite::memory:\"\n[network_allocator]\nkind = \"null\"\n",
            )?;
            let config = HilApiConfig::load(Path::new("hil.toml"), None).unwrap();
            assert_eq!(config.network_allocator.kind, NetworkAllocatorKind::Null);
            Ok(())
        });
    }

    #[test]
    fn invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("hil.toml", BASE_CONFIG)?;
            jail.set_env("HIL_API_NETWORK_ALLOCATOR__VLANS", "40-10");
            assert!(matches!(
                HilApiConfig::load(Path::new("hil.toml"), None),
                Err(ConfigError::Invalid(_))
            ));

            jail.set_env("HIL_API_NETWORK_ALLOCATOR__VLANS", "10-40");
            jail.set_env("HIL_API_RECONCILER__MAX_CONCURRENT_SWITCHES", "0");
            assert!(matches!(
                HilApiConfig::load(Path::new("hil.toml"), None),
                Err(ConfigError::Invalid(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn missing_database_url() {
        Jail::expect_with(|jail| {
            jail.create_file("hil.toml", "[reconciler]\nenabled = false\n")?;
            assert!(matches!(
                HilApiConfig::load(Path::new("hil.toml"), None),
                Err(ConfigError::Load(_))
            ));
            Ok(())
        });
    }
}
