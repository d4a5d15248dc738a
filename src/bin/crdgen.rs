// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Prints the TracingConfig CustomResourceDefinition as YAML.

use kube::CustomResourceExt;
use tracepilot::types::TracingConfig;

fn main() -> anyhow::Result<()> {
    let crd = serde_yaml::to_string(&TracingConfig::crd())
        .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
    print!("{crd}");
    Ok(())
}
