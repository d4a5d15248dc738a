// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Builds and publishes TracingConfig status

use crate::kubernetes::ResourceStore;
use crate::sync::workloads::PatchReport;
use crate::types::{Phase, TracingConfig, TracingConfigStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use kube::ResourceExt;
use tracing::{debug, warn};

pub const PENDING_MESSAGE: &str = "Processing tracing configuration";

/// Status carrying forward the last successful apply of `policy`
fn carried(policy: &TracingConfig) -> TracingConfigStatus {
    let previous = policy.status.clone().unwrap_or_default();
    TracingConfigStatus {
        applied_at: previous.applied_at,
        target_pods: previous.target_pods,
        observed_generation: policy.metadata.generation,
        ..Default::default()
    }
}

pub fn pending(policy: &TracingConfig) -> TracingConfigStatus {
    TracingConfigStatus {
        phase: Some(Phase::Pending),
        message: Some(PENDING_MESSAGE.to_string()),
        ..carried(policy)
    }
}

pub fn failed(policy: &TracingConfig, message: impl Into<String>) -> TracingConfigStatus {
    TracingConfigStatus {
        phase: Some(Phase::Failed),
        message: Some(message.into()),
        ..carried(policy)
    }
}

pub fn applied(
    policy: &TracingConfig,
    mut pods: Vec<String>,
    report: &PatchReport,
    now: DateTime<Utc>,
) -> TracingConfigStatus {
    pods.sort();

    let mut message = format!("Tracing configuration applied to {} pods", pods.len());
    if !report.all_succeeded() {
        message.push_str(&format!(
            "; {} of {} workloads failed to update",
            report.failed.len(),
            report.matched
        ));
    }

    TracingConfigStatus {
        phase: Some(Phase::Applied),
        message: Some(message),
        applied_at: Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
        target_pods: pods,
        observed_generation: policy.metadata.generation,
    }
}

/// Persist a status. Failures are logged and otherwise ignored.
pub async fn report_status(
    store: &dyn ResourceStore,
    policy: &TracingConfig,
    status: &TracingConfigStatus,
) {
    let phase = status.phase.map(|p| p.to_string()).unwrap_or_default();
    match store.update_policy_status(policy, status).await {
        Ok(()) => debug!(
            "Status of {}/{} is now {}",
            policy.namespace().unwrap_or_default(),
            policy.name_any(),
            phase
        ),
        Err(e) => warn!(
            "Failed to update status of {}/{} to {}: {}",
            policy.namespace().unwrap_or_default(),
            policy.name_any(),
            phase,
            e
        ),
    }
}
