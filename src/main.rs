// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tracepilot::config::{Config, LogFormat};
use tracepilot::kubernetes::wait_for_tracing_config_crd;
use tracepilot::reconcilers::TracingConfigReconciler;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(config.log_format);

    info!("Starting Tracepilot operator");
    info!(
        "Configuration loaded: watch_namespace={}, resync_interval={:?}, pass_timeout={:?}",
        config.watch_namespace.as_deref().unwrap_or("<all>"),
        config.resync_interval,
        config.pass_timeout
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Wait for TracingConfig CRD before starting the reconciler
    info!("Waiting for TracingConfig CRD to become available...");
    wait_for_tracing_config_crd(&client).await?;

    info!("Starting reconciler...");
    TracingConfigReconciler::new(client, config).run().await?;

    warn!("Reconciler stopped");
    Ok(())
}
