// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::CONFIG_MAP_SUFFIX;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Desired tracing configuration for the workloads of a namespace
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "observability.kubevishwa.io",
    version = "v1",
    kind = "TracingConfig"
)]
#[kube(namespaced)]
#[kube(status = "TracingConfigStatus")]
#[kube(shortname = "tc")]
#[kube(printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#)]
#[kube(printcolumn = r#"{"name":"Message","type":"string","jsonPath":".status.message"}"#)]
#[serde(rename_all = "camelCase")]
pub struct TracingConfigSpec {
    #[serde(default)]
    pub enabled: bool,
    /// Fraction of traces to sample, between 0 and 1
    #[serde(default)]
    #[schemars(range(min = 0.0, max = 1.0))]
    pub sampling_rate: f64,
    /// OTLP collector address
    pub endpoint: String,
    pub service_name: String,
    /// Namespace to configure; defaults to the namespace of the TracingConfig
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Restricts which workloads are configured; all workloads when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1))]
    pub max_batch_size: Option<u32>,
}

impl TracingConfig {
    /// Namespace whose workloads this policy configures
    pub fn target_namespace(&self) -> String {
        self.spec
            .namespace
            .clone()
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| self.namespace().unwrap_or_default())
    }

    /// Name of the ConfigMap holding the compiled configuration
    pub fn config_map_name(&self) -> String {
        format!("{}{}", self.name_any(), CONFIG_MAP_SUFFIX)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub enum Phase {
    Pending,
    Applied,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Pending => "Pending",
            Phase::Applied => "Applied",
            Phase::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// Status written by the controller.
///
/// Fields are always serialized (absent values as `null`) so that a merge
/// patch of the whole status clears what the previous status had set.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TracingConfigStatus {
    #[serde(default)]
    pub phase: Option<Phase>,
    #[serde(default)]
    pub message: Option<String>,
    /// Time of the last successful apply (RFC 3339)
    #[serde(default)]
    pub applied_at: Option<String>,
    /// Pods matched by the selector at the last successful apply
    #[serde(default)]
    pub target_pods: Vec<String>,
    #[serde(default)]
    pub observed_generation: Option<i64>,
}
