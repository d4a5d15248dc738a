// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Compiles a TracingConfig spec into the ConfigMap payload consumed by traced workloads.

use crate::constants::env;
use crate::types::TracingConfigSpec;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::collections::BTreeMap;

/// Characters that would break the `k1=v1,k2=v2` header list
const HEADER_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b',')
    .add(b';')
    .add(b'=')
    .add(b'\\');

/// Build the environment payload for a spec.
///
/// The result is a sorted map, so the same spec always produces the same
/// payload whatever order its attribute and header maps were built in.
pub fn desired_config(spec: &TracingConfigSpec) -> BTreeMap<String, String> {
    let mut data = BTreeMap::from([
        (env::ENDPOINT.to_string(), spec.endpoint.clone()),
        (env::SERVICE_NAME.to_string(), spec.service_name.clone()),
        (
            env::SAMPLER.to_string(),
            env::SAMPLER_TRACE_ID_RATIO.to_string(),
        ),
        (
            env::SAMPLER_ARG.to_string(),
            format!("{:.2}", spec.sampling_rate),
        ),
    ]);

    if let Some(timeout) = non_empty(&spec.export_timeout) {
        data.insert(env::EXPORT_TIMEOUT.to_string(), timeout.to_string());
    }
    if let Some(delay) = non_empty(&spec.batch_timeout) {
        data.insert(env::BATCH_SCHEDULE_DELAY.to_string(), delay.to_string());
    }
    if let Some(size) = spec.max_batch_size.filter(|size| *size > 0) {
        data.insert(env::MAX_EXPORT_BATCH_SIZE.to_string(), size.to_string());
    }

    if let Some(headers) = spec.headers.as_ref().filter(|h| !h.is_empty()) {
        let joined = headers
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, HEADER_ESCAPES),
                    utf8_percent_encode(v, HEADER_ESCAPES)
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        data.insert(env::HEADERS.to_string(), joined);
    }

    if !spec.enabled {
        data.insert(env::SDK_DISABLED.to_string(), "true".to_string());
    }

    for (key, value) in spec.attributes.iter().flatten() {
        data.insert(
            format!("{}{}", env::RESOURCE_ATTRIBUTE_PREFIX, key),
            value.clone(),
        );
    }

    data
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
