// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! One reconcile pass for a single TracingConfig

use crate::error::{Result, TracepilotError};
use crate::kubernetes::ResourceStore;
use crate::sync::config_map::ensure_config_map;
use crate::sync::desired::desired_config;
use crate::sync::selector::Selector;
use crate::sync::status::{self, report_status};
use crate::sync::workloads::{patch_workloads, PatchReport};
use crate::types::TracingConfig;
use chrono::{DateTime, Utc};
use kube::ResourceExt;
use tracing::{info, instrument, warn};

/// What a pass did
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// The TracingConfig was deleted before the pass started
    Gone,
    Applied {
        config_map_changed: bool,
        matched_pods: usize,
        report: PatchReport,
    },
}

/// Fetch the latest TracingConfig and drive its downstream objects to the
/// desired state.
pub async fn run_pass(store: &dyn ResourceStore, namespace: &str, name: &str) -> Result<PassOutcome> {
    run_pass_with_clock(store, namespace, name, Utc::now).await
}

#[instrument(skip(store, now))]
pub async fn run_pass_with_clock(
    store: &dyn ResourceStore,
    namespace: &str,
    name: &str,
    now: fn() -> DateTime<Utc>,
) -> Result<PassOutcome> {
    let Some(policy) = store.get_policy(namespace, name).await? else {
        info!("TracingConfig {}/{} no longer exists, nothing to do", namespace, name);
        return Ok(PassOutcome::Gone);
    };

    report_status(store, &policy, &status::pending(&policy)).await;

    apply(store, &policy, now).await
}

async fn apply(
    store: &dyn ResourceStore,
    policy: &TracingConfig,
    now: fn() -> DateTime<Utc>,
) -> Result<PassOutcome> {
    let target_namespace = policy.target_namespace();
    let config_map_name = policy.config_map_name();

    let selector = match Selector::compile(policy.spec.selector.as_ref()) {
        Ok(selector) => selector,
        Err(e) => {
            let message = e.to_string();
            return fail(store, policy, message, e).await;
        }
    };

    let pods = match store.list_pods(&target_namespace, &selector).await {
        Ok(pods) => pods,
        Err(e) => {
            let message = format!("Failed to list pods: {}", e);
            return fail(store, policy, message, e).await;
        }
    };
    let pod_names: Vec<String> = pods.iter().map(|p| p.name_any()).collect();

    let payload = desired_config(&policy.spec);

    // The ConfigMap must be in place before any workload points at it
    let config_map_changed = match ensure_config_map(
        store,
        policy,
        &target_namespace,
        &config_map_name,
        &payload,
    )
    .await
    {
        Ok(changed) => changed,
        Err(e) => {
            let message = format!("Failed to apply ConfigMap {}: {}", config_map_name, e);
            return fail(store, policy, message, e).await;
        }
    };

    let report = match patch_workloads(store, &target_namespace, &selector, &config_map_name).await
    {
        Ok(report) => report,
        Err(e) => {
            let message = format!("Failed to list deployments: {}", e);
            return fail(store, policy, message, e).await;
        }
    };

    if !report.all_succeeded() {
        warn!(
            "{} of {} deployments in {} could not be updated",
            report.failed.len(),
            report.matched,
            target_namespace
        );
    }

    let matched_pods = pod_names.len();
    report_status(
        store,
        policy,
        &status::applied(policy, pod_names, &report, now()),
    )
    .await;

    info!(
        "Successfully reconciled TracingConfig {}/{}",
        policy.namespace().unwrap_or_default(),
        policy.name_any()
    );

    Ok(PassOutcome::Applied {
        config_map_changed,
        matched_pods,
        report,
    })
}

async fn fail(
    store: &dyn ResourceStore,
    policy: &TracingConfig,
    message: String,
    error: TracepilotError,
) -> Result<PassOutcome> {
    warn!(
        "Reconciling TracingConfig {}/{} failed: {}",
        policy.namespace().unwrap_or_default(),
        policy.name_any(),
        message
    );
    report_status(store, policy, &status::failed(policy, message)).await;
    Err(error)
}
