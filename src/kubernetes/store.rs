// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource store abstraction used by reconcile passes

use crate::constants::OPERATOR_NAME;
use crate::error::Result;
use crate::sync::selector::Selector;
use crate::types::{TracingConfig, TracingConfigStatus};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Pod};
use kube::{
    api::{ListParams, Patch, PatchParams, PostParams},
    Api, Client, ResourceExt,
};
use tracing::{debug, instrument};

/// Read and write access to the objects a reconcile pass touches.
///
/// A missing object is reported as `Ok(None)`, never as an error.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Get a TracingConfig by namespace and name
    async fn get_policy(&self, namespace: &str, name: &str) -> Result<Option<TracingConfig>>;

    /// Replace the status of a TracingConfig
    async fn update_policy_status(
        &self,
        policy: &TracingConfig,
        status: &TracingConfigStatus,
    ) -> Result<()>;

    /// List the pods of a namespace matching the selector
    async fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Pod>>;

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>>;

    async fn create_config_map(&self, namespace: &str, config_map: &ConfigMap) -> Result<()>;

    /// Replace an existing ConfigMap. The object's resourceVersion guards
    /// against overwriting a concurrent change.
    async fn update_config_map(&self, namespace: &str, config_map: &ConfigMap) -> Result<()>;

    /// List every Deployment of a namespace
    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Deployment>>;

    async fn update_workload(&self, namespace: &str, deployment: &Deployment) -> Result<()>;
}

/// ResourceStore backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Turn a 404 into `None`
fn optional<T>(result: std::result::Result<T, kube::Error>) -> Result<Option<T>> {
    match result {
        Ok(obj) => Ok(Some(obj)),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    #[instrument(skip(self))]
    async fn get_policy(&self, namespace: &str, name: &str) -> Result<Option<TracingConfig>> {
        let api: Api<TracingConfig> = Api::namespaced(self.client.clone(), namespace);
        optional(api.get(name).await)
    }

    #[instrument(skip(self, policy, status), fields(policy = %policy.name_any()))]
    async fn update_policy_status(
        &self,
        policy: &TracingConfig,
        status: &TracingConfigStatus,
    ) -> Result<()> {
        let namespace = policy.namespace().unwrap_or_default();
        let api: Api<TracingConfig> = Api::namespaced(self.client.clone(), &namespace);

        let patch = serde_json::json!({ "status": status });
        api.patch_status(
            &policy.name_any(),
            &PatchParams::default(),
            &Patch::Merge(&patch),
        )
        .await?;

        debug!("Status of {}/{} set to {:?}", namespace, policy.name_any(), status.phase);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Pod>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let lp = if selector.is_everything() {
            ListParams::default()
        } else {
            ListParams::default().labels_from(selector.as_label_query())
        };

        let pods = api.list(&lp).await?;

        // The API server already filtered; match again so the result never
        // depends on how the server interpreted the query.
        Ok(pods
            .items
            .into_iter()
            .filter(|pod| selector.matches(pod.metadata.labels.as_ref()))
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        optional(api.get(name).await)
    }

    #[instrument(skip(self, config_map), fields(config_map = %config_map.name_any()))]
    async fn create_config_map(&self, namespace: &str, config_map: &ConfigMap) -> Result<()> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let pp = PostParams {
            field_manager: Some(OPERATOR_NAME.to_string()),
            ..Default::default()
        };
        api.create(&pp, config_map).await?;
        Ok(())
    }

    #[instrument(skip(self, config_map), fields(config_map = %config_map.name_any()))]
    async fn update_config_map(&self, namespace: &str, config_map: &ConfigMap) -> Result<()> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let pp = PostParams {
            field_manager: Some(OPERATOR_NAME.to_string()),
            ..Default::default()
        };
        api.replace(&config_map.name_any(), &pp, config_map).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Deployment>> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }

    #[instrument(skip(self, deployment), fields(deployment = %deployment.name_any()))]
    async fn update_workload(&self, namespace: &str, deployment: &Deployment) -> Result<()> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let pp = PostParams {
            field_manager: Some(OPERATOR_NAME.to_string()),
            ..Default::default()
        };
        api.replace(&deployment.name_any(), &pp, deployment).await?;
        Ok(())
    }
}
