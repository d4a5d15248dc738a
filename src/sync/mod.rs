// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconcile pass logic: desired configuration, ConfigMap upkeep and workload patching.

pub mod config_map;
pub mod desired;
pub mod pass;
pub mod selector;
pub mod status;
pub mod workloads;

pub use config_map::ensure_config_map;
pub use desired::desired_config;
pub use pass::{run_pass, PassOutcome};
pub use selector::Selector;
pub use workloads::{inject_config_map_ref, patch_workloads, PatchReport};
