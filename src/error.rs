// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TracepilotError {
    #[error("Kubernetes API error: {0}")]
    Store(#[from] kube::Error),

    #[error("Invalid label selector: {0}")]
    InvalidSelector(String),

    #[error("Object is missing {0}")]
    MissingObjectKey(&'static str),

    #[error("Reconcile pass exceeded deadline of {0:?}")]
    Timeout(Duration),
}

impl TracepilotError {
    /// Errors that will not go away by retrying the same spec
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            TracepilotError::InvalidSelector(_) | TracepilotError::MissingObjectKey(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TracepilotError>;
