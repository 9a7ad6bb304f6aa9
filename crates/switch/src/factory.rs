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
use std::sync::Arc;
use std::time::Duration;

use model::switch::{Switch, SwitchVendor};

use crate::SwitchError;
use crate::brocade::{BrocadeConfig, BrocadeDriver};
use crate::dell::{DellConfig, DellDriver};
use crate::iface::SwitchDriver;
use crate::mock::MockSwitchFabric;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maps the vendor of a switch to the driver that talks to it.
///
/// Mocked switches all live in the fabric owned by the factory, so two factories
/// never share hardware state.
pub struct SwitchDriverFactory {
    mock_fabric: Arc<MockSwitchFabric>,
    http_timeout: Duration,
}

impl Default for SwitchDriverFactory {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT)
    }
}

impl SwitchDriverFactory {
    pub fn new(http_timeout: Duration) -> Self {
        Self {
            mock_fabric: Arc::new(MockSwitchFabric::new()),
            http_timeout,
        }
    }

    /// The fabric that backs every switch with the `mock` vendor
    pub fn mock_fabric(&self) -> Arc<MockSwitchFabric> {
        self.mock_fabric.clone()
    }

    /// Checks a vendor specific configuration before the switch is recorded.
    pub fn validate_config(
        vendor: SwitchVendor,
        config: &serde_json::Value,
    ) -> Result<(), SwitchError> {
        match vendor {
            SwitchVendor::Mock => {
                if config.is_object() {
                    Ok(())
                } else {
                    Err(SwitchError::InvalidConfig {
                        vendor,
                        reason: "configuration must be a JSON object".to_string(),
                    })
                }
            }
            SwitchVendor::DellPowerconnect => DellConfig::parse(config).map(|_| ()),
            SwitchVendor::BrocadeVdx => BrocadeConfig::parse(config).map(|_| ()),
        }
    }

    pub fn driver_for(&self, switch: &Switch) -> Result<Arc<dyn SwitchDriver>, SwitchError> {
        let driver: Arc<dyn SwitchDriver> = match switch.vendor {
            SwitchVendor::Mock => Arc::new(self.mock_fabric.driver(&switch.label)),
            SwitchVendor::DellPowerconnect => {
                Arc::new(DellDriver::new(DellConfig::parse(&switch.config)?))
            }
            SwitchVendor::BrocadeVdx => Arc::new(BrocadeDriver::new(
                BrocadeConfig::parse(&switch.config)?,
                self.http_timeout,
            )?),
        };
        tracing::debug!(switch = %switch.label, vendor = %switch.vendor, "created switch driver");
        Ok(driver)
    }
}
