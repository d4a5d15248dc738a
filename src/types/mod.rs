// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource definitions owned by tracepilot.

pub mod tracing_config;

pub use tracing_config::{Phase, TracingConfig, TracingConfigSpec, TracingConfigStatus};
