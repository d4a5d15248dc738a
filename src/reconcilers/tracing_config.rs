// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! TracingConfig reconciler - watches TracingConfigs and runs a reconcile pass for each.
//!
//! The controller runtime never runs two reconciles for the same object at
//! once, while different objects are reconciled concurrently.

use crate::config::Config;
use crate::constants::{labels, OPERATOR_NAME};
use crate::error::{Result, TracepilotError};
use crate::kubernetes::{KubeStore, ResourceStore};
use crate::reconcilers::backoff::Backoff;
use crate::sync::{run_pass, PassOutcome};
use crate::types::TracingConfig;
use futures::StreamExt;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{
    runtime::{controller::Action, predicates, reflector, watcher, Controller, WatchStreamExt},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Shared state handed to every reconcile
pub struct ReconcileContext {
    store: Arc<dyn ResourceStore>,
    config: Config,
    backoff: Backoff,
}

impl ReconcileContext {
    pub fn new(store: Arc<dyn ResourceStore>, config: Config) -> Self {
        let backoff = Backoff::new(config.backoff_base, config.backoff_max);
        Self {
            store,
            config,
            backoff,
        }
    }
}

pub struct TracingConfigReconciler {
    client: Client,
    config: Config,
}

impl TracingConfigReconciler {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let (policies, config_maps): (Api<TracingConfig>, Api<ConfigMap>) =
            match &self.config.watch_namespace {
                Some(ns) => (
                    Api::namespaced(self.client.clone(), ns),
                    Api::namespaced(self.client.clone(), ns),
                ),
                None => (Api::all(self.client.clone()), Api::all(self.client.clone())),
            };

        let store: Arc<dyn ResourceStore> = Arc::new(KubeStore::new(self.client.clone()));
        let context = Arc::new(ReconcileContext::new(store, self.config));

        // Edits to ConfigMaps we own wake their TracingConfig up so they get overwritten
        let managed = WatcherConfig::default().labels(&format!("{}={}", labels::MANAGED_BY, OPERATOR_NAME));

        // Status writes from our own passes must not queue another pass
        let (reader, writer) = reflector::store();
        let policy_changes = watcher(policies, WatcherConfig::default())
            .default_backoff()
            .reflect(writer)
            .applied_objects()
            .predicate_filter(spec_generation);

        info!("Watching TracingConfig resources");

        Controller::for_stream(policy_changes, reader)
            .owns(config_maps, managed)
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled TracingConfig: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

/// Changes only when the spec does; the status subresource leaves it alone
fn spec_generation(policy: &TracingConfig) -> Option<u64> {
    predicates::generation(policy)
}

fn object_key(policy: &TracingConfig) -> String {
    format!("{}/{}", policy.namespace().unwrap_or_default(), policy.name_any())
}

#[instrument(skip(policy, ctx), fields(key = %object_key(&policy)))]
async fn reconcile(policy: Arc<TracingConfig>, ctx: Arc<ReconcileContext>) -> Result<Action> {
    let namespace = policy
        .namespace()
        .ok_or(TracepilotError::MissingObjectKey(".metadata.namespace"))?;
    let name = policy.name_any();

    debug!("Reconciling TracingConfig {}/{}", namespace, name);

    let deadline = ctx.config.pass_timeout;
    let outcome = tokio::time::timeout(deadline, run_pass(ctx.store.as_ref(), &namespace, &name))
        .await
        .map_err(|_| TracepilotError::Timeout(deadline))??;

    ctx.backoff.reset(&object_key(&policy));

    match outcome {
        PassOutcome::Gone => Ok(Action::await_change()),
        PassOutcome::Applied { .. } => Ok(Action::requeue(ctx.config.resync_interval)),
    }
}

fn error_policy(policy: Arc<TracingConfig>, error: &TracepilotError, ctx: Arc<ReconcileContext>) -> Action {
    let key = object_key(&policy);

    if error.is_permanent() {
        error!("Reconciling {} failed: {}; retrying at next resync", key, error);
        ctx.backoff.reset(&key);
        return Action::requeue(ctx.config.resync_interval);
    }

    let delay = ctx.backoff.next(&key);
    error!("Reconciling {} failed: {}; retrying in {:?}", key, error, delay);
    Action::requeue(delay)
}
