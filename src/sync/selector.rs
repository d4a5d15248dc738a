// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Label selector validation and matching

use crate::error::{Result, TracepilotError};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use kube::core::{Selector as LabelQuery, SelectorExt};
use std::collections::BTreeMap;

const MAX_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

/// A validated label selector.
///
/// Matching and query rendering are done by kube's selector; this type adds
/// the syntax and consistency checks the API server would apply. An empty
/// selector matches every object.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    query: LabelQuery,
}

impl Selector {
    /// Selector that matches everything
    pub fn everything() -> Self {
        Self::default()
    }

    /// Validate a selector spec. An absent selector matches everything.
    pub fn compile(selector: Option<&LabelSelector>) -> Result<Self> {
        let Some(selector) = selector else {
            return Ok(Self::everything());
        };

        for (key, value) in selector.match_labels.iter().flatten() {
            validate_key(key)?;
            validate_value(key, value)?;
        }

        for expr in selector.match_expressions.iter().flatten() {
            validate_expression(expr)?;
        }

        check_conflicts(selector)?;

        let query = LabelQuery::try_from(selector.clone())
            .map_err(|e| TracepilotError::InvalidSelector(e.to_string()))?;

        Ok(Self { query })
    }

    pub fn is_everything(&self) -> bool {
        self.query.selects_all()
    }

    /// Check whether an object's labels satisfy every requirement
    pub fn matches(&self, labels: Option<&BTreeMap<String, String>>) -> bool {
        match labels {
            Some(labels) => self.query.matches(labels),
            None => self.query.matches(&BTreeMap::new()),
        }
    }

    /// Render as a Kubernetes label selector query, `None` when it matches everything
    pub fn to_query(&self) -> Option<String> {
        (!self.is_everything()).then(|| self.query.to_string())
    }

    /// The selector in the form list requests take
    pub fn as_label_query(&self) -> &LabelQuery {
        &self.query
    }
}

fn validate_expression(expr: &LabelSelectorRequirement) -> Result<()> {
    validate_key(&expr.key)?;
    let key = &expr.key;
    let values = expr.values.as_deref().unwrap_or_default();

    match expr.operator.as_str() {
        "In" | "NotIn" => {
            if values.is_empty() {
                return Err(TracepilotError::InvalidSelector(format!(
                    "operator {} on key '{}' requires at least one value",
                    expr.operator, key
                )));
            }
            for value in values {
                validate_value(key, value)?;
            }
            Ok(())
        }
        "Exists" | "DoesNotExist" => {
            if !values.is_empty() {
                return Err(TracepilotError::InvalidSelector(format!(
                    "operator {} on key '{}' must not have values",
                    expr.operator, key
                )));
            }
            Ok(())
        }
        other => Err(TracepilotError::InvalidSelector(format!(
            "unknown operator '{}' on key '{}'",
            other, key
        ))),
    }
}

/// Reject selectors that can never match anything because an exact
/// `matchLabels` value contradicts an expression on the same key.
fn check_conflicts(selector: &LabelSelector) -> Result<()> {
    for (key, value) in selector.match_labels.iter().flatten() {
        for expr in selector
            .match_expressions
            .iter()
            .flatten()
            .filter(|e| &e.key == key)
        {
            let listed = expr.values.iter().flatten().any(|v| v == value);
            let conflict = match expr.operator.as_str() {
                "DoesNotExist" => true,
                "In" => !listed,
                "NotIn" => listed,
                _ => false,
            };
            if conflict {
                return Err(TracepilotError::InvalidSelector(format!(
                    "conflicting requirements on key '{}': '{}={}' and {} {:?}",
                    key,
                    key,
                    value,
                    expr.operator,
                    expr.values.clone().unwrap_or_default()
                )));
            }
        }
    }
    Ok(())
}

fn validate_key(key: &str) -> Result<()> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    if let Some(prefix) = prefix {
        if !is_dns_subdomain(prefix) {
            return Err(TracepilotError::InvalidSelector(format!(
                "key '{}' has an invalid prefix",
                key
            )));
        }
    }

    if name.is_empty() || !is_label_name(name) {
        return Err(TracepilotError::InvalidSelector(format!(
            "key '{}' is not a valid label name",
            key
        )));
    }

    Ok(())
}

fn validate_value(key: &str, value: &str) -> Result<()> {
    if value.is_empty() || is_label_name(value) {
        return Ok(());
    }
    Err(TracepilotError::InvalidSelector(format!(
        "value '{}' for key '{}' is not a valid label value",
        value, key
    )))
}

/// Up to 63 characters of `[A-Za-z0-9._-]`, alphanumeric at both ends
fn is_label_name(s: &str) -> bool {
    let bytes = s.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            s.len() <= MAX_NAME_LEN
                && first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes
                    .iter()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(*b, b'-' | b'_' | b'.'))
        }
        _ => false,
    }
}

fn is_dns_subdomain(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_PREFIX_LEN
        && s.split('.').all(|part| {
            let bytes = part.as_bytes();
            match (bytes.first(), bytes.last()) {
                (Some(first), Some(last)) => {
                    (first.is_ascii_lowercase() || first.is_ascii_digit())
                        && (last.is_ascii_lowercase() || last.is_ascii_digit())
                        && bytes
                            .iter()
                            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
                }
                _ => false,
            }
        })
}
