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
use db::DatabaseError;
use model::ModelError;
use switch::SwitchError;

/// Errors returned by API operations.
#[derive(thiserror::Error, Debug)]
pub enum HilError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The operation has to wait until other work is done (pending networking actions,
    /// remaining attachments, ...). Retrying later can succeed.
    #[error("Blocked: {0}")]
    Blocked(String),

    /// The network allocator ran out of identifiers.
    #[error("No free network identifier available")]
    NoFreeNetworkId,

    #[error(transparent)]
    Database(DatabaseError),

    #[error(transparent)]
    Switch(#[from] SwitchError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HilResult<T> = Result<T, HilError>;

impl HilError {
    pub fn internal(message: String) -> Self {
        HilError::Internal(message)
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        HilError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Maps a failed insert: a unique violation means the object is already there.
    pub fn on_insert(kind: &'static str, id: impl ToString) -> impl FnOnce(DatabaseError) -> Self {
        move |e| {
            if e.is_unique_violation() {
                HilError::AlreadyExists {
                    kind,
                    id: id.to_string(),
                }
            } else {
                e.into()
            }
        }
    }
}

impl From<DatabaseError> for HilError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound { kind, id } => HilError::NotFound { kind, id },
            DatabaseError::FailedPrecondition(message) => HilError::Blocked(message),
            e => HilError::Database(e),
        }
    }
}

impl From<ModelError> for HilError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::IllegalOperation(message) => HilError::Blocked(message),
            e => HilError::InvalidArgument(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_keep_their_meaning() {
        let e: HilError = DatabaseError::not_found("node", "node-0").into();
        assert!(matches!(e, HilError::NotFound { kind: "node", .. }));

        let e: HilError = DatabaseError::FailedPrecondition("busy".to_string()).into();
        assert!(matches!(e, HilError::Blocked(m) if m == "busy"));

        let e: HilError = DatabaseError::internal("boom".to_string()).into();
        assert!(matches!(e, HilError::Database(_)));
    }

    #[test]
    fn model_errors() {
        let e: HilError = ModelError::InvalidChannel("vlan/x".to_string()).into();
        assert!(matches!(e, HilError::InvalidArgument(_)));
        let e: HilError = ModelError::IllegalOperation("native first".to_string()).into();
        assert!(matches!(e, HilError::Blocked(_)));
    }
}
