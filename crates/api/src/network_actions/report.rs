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
use std::collections::BTreeMap;

use serde::Serialize;
use switch::SwitchError;

use crate::errors::HilError;

/// Why a switch batch stopped early.
#[derive(thiserror::Error, Debug)]
pub enum ReconcileError {
    #[error("Timed out after {timeout} while {operation}")]
    Timeout {
        operation: String,
        timeout: humantime::Duration,
    },

    #[error(transparent)]
    Switch(#[from] SwitchError),

    #[error(transparent)]
    Hil(#[from] HilError),
}

impl From<db::DatabaseError> for ReconcileError {
    fn from(e: db::DatabaseError) -> Self {
        ReconcileError::Hil(e.into())
    }
}

impl From<ReconcileError> for HilError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::Switch(e) => HilError::Switch(e),
            ReconcileError::Hil(e) => e,
            e @ ReconcileError::Timeout { .. } => HilError::Internal(e.to_string()),
        }
    }
}

/// What one `apply_networking` run did on one switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SwitchOutcome {
    /// Actions applied and confirmed in this run
    pub applied: usize,
    /// Actions still pending after this run
    pub remaining: usize,
    /// Set when the batch stopped early. The failed action and everything after it stay pending.
    pub error: Option<String>,
}

impl SwitchOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of one `apply_networking` run, keyed by switch label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyNetworkingReport {
    pub switches: BTreeMap<String, SwitchOutcome>,
}

impl ApplyNetworkingReport {
    pub fn is_success(&self) -> bool {
        self.switches.values().all(SwitchOutcome::is_success)
    }

    pub fn applied(&self) -> usize {
        self.switches.values().map(|o| o.applied).sum()
    }

    pub fn failed_switches(&self) -> impl Iterator<Item = (&str, &str)> {
        self.switches
            .iter()
            .filter_map(|(label, o)| o.error.as_deref().map(|e| (label.as_str(), e)))
    }
}
