// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Materializes the compiled payload as a ConfigMap

use crate::constants::{labels, OPERATOR_NAME};
use crate::error::Result;
use crate::kubernetes::ResourceStore;
use crate::types::TracingConfig;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{api::ObjectMeta, Resource, ResourceExt};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Make sure `namespace/name` holds exactly `payload`.
///
/// Creates the ConfigMap when missing and replaces its contents wholesale when
/// they differ, so keys no longer in the payload disappear. Labels and owner
/// reference are restored when stripped. Returns whether a write was made.
#[instrument(skip(store, policy, payload), fields(policy = %policy.name_any()))]
pub async fn ensure_config_map(
    store: &dyn ResourceStore,
    policy: &TracingConfig,
    namespace: &str,
    name: &str,
    payload: &BTreeMap<String, String>,
) -> Result<bool> {
    let desired = build_config_map(policy, namespace, name, payload);

    match store.get_config_map(namespace, name).await? {
        None => {
            store.create_config_map(namespace, &desired).await?;
            info!("Created ConfigMap {}/{}", namespace, name);
            Ok(true)
        }
        Some(existing) if is_current(&existing, &desired) => {
            debug!("ConfigMap {}/{} is up to date", namespace, name);
            Ok(false)
        }
        Some(mut existing) => {
            existing.data = desired.data;
            existing.binary_data = None;
            existing
                .labels_mut()
                .extend(desired.metadata.labels.into_iter().flatten());
            for oref in desired.metadata.owner_references.into_iter().flatten() {
                let orefs = existing.owner_references_mut();
                if !orefs.iter().any(|o| o.uid == oref.uid) {
                    orefs.push(oref);
                }
            }
            store.update_config_map(namespace, &existing).await?;
            info!("Updated ConfigMap {}/{}", namespace, name);
            Ok(true)
        }
    }
}

/// Data, labels and owner reference of `existing` already match `desired`
fn is_current(existing: &ConfigMap, desired: &ConfigMap) -> bool {
    let labels = existing.labels();
    let orefs = existing.owner_references();

    existing.data == desired.data
        && existing.binary_data.as_ref().map_or(true, |b| b.is_empty())
        && desired
            .labels()
            .iter()
            .all(|(k, v)| labels.get(k) == Some(v))
        && desired
            .owner_references()
            .iter()
            .all(|oref| orefs.iter().any(|o| o.uid == oref.uid))
}

/// New ConfigMap labelled as ours. It is owned by the policy when both live
/// in the same namespace, since owner references cannot cross namespaces.
fn build_config_map(
    policy: &TracingConfig,
    namespace: &str,
    name: &str,
    payload: &BTreeMap<String, String>,
) -> ConfigMap {
    let owner_references = (policy.namespace().as_deref() == Some(namespace))
        .then(|| policy.controller_owner_ref(&()))
        .flatten()
        .map(|oref| vec![oref]);

    ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(BTreeMap::from([
                (labels::MANAGED_BY.to_string(), OPERATOR_NAME.to_string()),
                (labels::POLICY.to_string(), policy.name_any()),
            ])),
            owner_references,
            ..Default::default()
        },
        data: Some(payload.clone()),
        ..Default::default()
    }
}
