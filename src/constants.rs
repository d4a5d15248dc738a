// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Label keys stamped on objects owned by tracepilot
pub mod labels {
    /// Standard managed-by label
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
    /// Name of the TracingConfig that produced the object
    pub const POLICY: &str = "tracepilot.kubevishwa.io/policy";
}

/// The operator name used for labels and field management
pub const OPERATOR_NAME: &str = "tracepilot";

/// Suffix appended to the policy name to build the ConfigMap name
pub const CONFIG_MAP_SUFFIX: &str = "-tracing-config";

/// Environment keys written into the derived ConfigMap.
///
/// These keys are read by traced workloads as process environment and must
/// stay stable across releases.
pub mod env {
    pub const ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
    pub const SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
    pub const SAMPLER: &str = "OTEL_TRACES_SAMPLER";
    pub const SAMPLER_ARG: &str = "OTEL_TRACES_SAMPLER_ARG";
    pub const EXPORT_TIMEOUT: &str = "OTEL_EXPORTER_OTLP_TIMEOUT";
    pub const BATCH_SCHEDULE_DELAY: &str = "OTEL_BSP_SCHEDULE_DELAY";
    pub const MAX_EXPORT_BATCH_SIZE: &str = "OTEL_BSP_MAX_EXPORT_BATCH_SIZE";
    pub const HEADERS: &str = "OTEL_EXPORTER_OTLP_HEADERS";
    pub const SDK_DISABLED: &str = "OTEL_SDK_DISABLED";
    /// Prefix for one key per custom resource attribute
    pub const RESOURCE_ATTRIBUTE_PREFIX: &str = "OTEL_RESOURCE_ATTRIBUTES_";

    /// The only sampler the controller configures
    pub const SAMPLER_TRACE_ID_RATIO: &str = "traceidratio";
}

/// Reconcile scheduling defaults
pub mod schedule {
    /// Requeue delay after a successful pass
    pub const RESYNC_INTERVAL_SECS: u64 = 300;
    /// Deadline for a single pass
    pub const PASS_TIMEOUT_SECS: u64 = 60;
    /// First requeue delay after a failed pass
    pub const BACKOFF_BASE_SECS: u64 = 5;
    /// Maximum requeue delay after repeated failures
    pub const BACKOFF_MAX_SECS: u64 = 300;
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
