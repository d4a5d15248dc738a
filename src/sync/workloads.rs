// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Wires matching Deployments to the derived ConfigMap

use crate::error::Result;
use crate::kubernetes::ResourceStore;
use crate::sync::selector::Selector;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMapEnvSource, EnvFromSource};
use kube::ResourceExt;
use tracing::{debug, error, info, instrument};

/// A Deployment whose update was rejected
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of patching the workloads of one namespace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchReport {
    /// Deployments whose pod template matched the selector
    pub matched: usize,
    pub patched: Vec<String>,
    /// Matched Deployments that already referenced the ConfigMap everywhere
    pub unchanged: Vec<String>,
    pub failed: Vec<WorkloadFailure>,
}

impl PatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Pod template labels of a Deployment
fn template_labels(deployment: &Deployment) -> Option<&std::collections::BTreeMap<String, String>> {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.metadata.as_ref())
        .and_then(|m| m.labels.as_ref())
}

/// Add an `envFrom` reference to `config_map` on every container that lacks
/// one. Returns whether any container changed.
pub fn inject_config_map_ref(deployment: &mut Deployment, config_map: &str) -> bool {
    let Some(pod_spec) = deployment
        .spec
        .as_mut()
        .and_then(|s| s.template.spec.as_mut())
    else {
        return false;
    };

    let mut changed = false;
    for container in &mut pod_spec.containers {
        let env_from = container.env_from.get_or_insert_with(Vec::new);
        let present = env_from.iter().any(|source| {
            source
                .config_map_ref
                .as_ref()
                .is_some_and(|r| r.name == config_map)
        });

        if !present {
            env_from.push(EnvFromSource {
                config_map_ref: Some(ConfigMapEnvSource {
                    name: config_map.to_string(),
                    optional: None,
                }),
                ..Default::default()
            });
            changed = true;
        }
    }
    changed
}

/// Reference `config_map` from every Deployment in `namespace` whose pod
/// template matches `selector`.
///
/// Listing failures abort. A failed update of one Deployment is recorded in
/// the report and the remaining Deployments are still processed.
#[instrument(skip(store, selector))]
pub async fn patch_workloads(
    store: &dyn ResourceStore,
    namespace: &str,
    selector: &Selector,
    config_map: &str,
) -> Result<PatchReport> {
    let deployments = store.list_workloads(namespace).await?;
    let mut report = PatchReport::default();

    for mut deployment in deployments
        .into_iter()
        .filter(|d| selector.matches(template_labels(d)))
    {
        report.matched += 1;
        let name = deployment.name_any();

        if !inject_config_map_ref(&mut deployment, config_map) {
            debug!("Deployment {} already references {}", name, config_map);
            report.unchanged.push(name);
            continue;
        }

        match store.update_workload(namespace, &deployment).await {
            Ok(()) => {
                info!("Updated deployment {} with tracing configuration", name);
                report.patched.push(name);
            }
            Err(e) => {
                error!("Failed to update deployment {}: {}", name, e);
                report.failed.push(WorkloadFailure {
                    name,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}
