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
use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::ModelError;
use crate::channel::parse_vlan;

/// The set of VLAN tags an operator hands to the allocator, written as
/// comma separated values and inclusive ranges, e.g. `"14,35-40,50"`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VlanPoolSpec {
    vlans: BTreeSet<u16>,
}

impl VlanPoolSpec {
    pub fn vlans(&self) -> &BTreeSet<u16> {
        &self.vlans
    }

    pub fn len(&self) -> usize {
        self.vlans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vlans.is_empty()
    }
}

impl FromStr for VlanPoolSpec {
    type Err = ModelError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ModelError::InvalidPoolSpec {
            spec: spec.to_string(),
            reason,
        };

        let mut vlans = BTreeSet::new();
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid("empty entry".to_string()));
            }
            match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_vlan(start.trim())
                        .map_err(|_| invalid(format!("bad range start in `{part}`")))?;
                    let end = parse_vlan(end.trim())
                        .map_err(|_| invalid(format!("bad range end in `{part}`")))?;
                    if start > end {
                        return Err(invalid(format!("range `{part}` is reversed")));
                    }
                    vlans.extend(start..=end);
                }
                None => {
                    let vlan =
                        parse_vlan(part).map_err(|_| invalid(format!("bad VLAN `{part}`")))?;
                    vlans.insert(vlan);
                }
            }
        }
        Ok(VlanPoolSpec { vlans })
    }
}

/// Used and free counts of the VLAN pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanPoolStats {
    pub used: i64,
    pub free: i64,
}

impl<'r> FromRow<'r, SqliteRow> for VlanPoolStats {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(VlanPoolStats {
            used: row.try_get("used")?,
            free: row.try_get("free")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_values_and_ranges() {
        let spec: VlanPoolSpec = "14,35-40, 50".parse().unwrap();
        assert_eq!(
            spec.vlans().iter().copied().collect::<Vec<_>>(),
            vec![14, 35, 36, 37, 38, 39, 40, 50]
        );
    }

    #[test]
    fn overlapping_entries_collapse() {
        let spec: VlanPoolSpec = "100-200,150,200".parse().unwrap();
        assert_eq!(spec.len(), 101);
    }

    #[test]
    fn reject_malformed_specs() {
        for bad in ["", "1,,2", "0-5", "5-1", "4000-4097", "a-b", "12-", "-3"] {
            assert!(
                matches!(
                    bad.parse::<VlanPoolSpec>(),
                    Err(ModelError::InvalidPoolSpec { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }
}
