// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mocked Kubernetes API server and an in-memory resource store.

use crate::error::{Result, TracepilotError};
use crate::kubernetes::ResourceStore;
use crate::sync::selector::Selector;
use crate::types::{TracingConfig, TracingConfigSpec, TracingConfigStatus};
use async_trait::async_trait;
use http::{Request, Response};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{ConfigMap, Container, Pod, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A request the mock API server received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: serde_json::Value,
}

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the exact path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    /// Add a response for PUT requests matching the exact path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    /// Add a response for PATCH requests matching the exact path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();
        responses
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(str::to_string);

        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json("resource", &path)));
        let requests = self.requests.clone();

        Box::pin(async move {
            let sent = req.into_body().collect_bytes().await?;
            let sent = serde_json::from_slice(&sent).unwrap_or(serde_json::Value::Null);
            requests.lock().unwrap().push(RecordedRequest {
                method,
                path,
                query,
                body: sent,
            });

            Ok::<_, tower::BoxError>(
                Response::builder()
                    .status(status)
                    .header("content-type", "application/json")
                    .body(Body::from(body.into_bytes()))
                    .unwrap(),
            )
        })
    }
}

/// Create a mock ConfigMap JSON response
pub fn config_map_json(namespace: &str, name: &str, data: &BTreeMap<String, String>) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "resourceVersion": "1"
        },
        "data": data
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// A store error as the API server would report it
pub fn store_error(message: &str) -> TracepilotError {
    TracepilotError::Store(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: "InternalError".to_string(),
        code: 500,
    }))
}

/// Every write the fake store accepted, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    CreateConfigMap(String),
    UpdateConfigMap(String),
    UpdateWorkload(String),
    UpdateStatus(TracingConfigStatus),
}

#[derive(Default)]
struct FakeState {
    policies: BTreeMap<(String, String), TracingConfig>,
    pods: Vec<Pod>,
    config_maps: BTreeMap<(String, String), ConfigMap>,
    deployments: Vec<Deployment>,
    writes: Vec<Write>,
    reads: Vec<String>,
    failing_workloads: HashSet<String>,
    fail_config_map_write: bool,
    fail_pod_list: bool,
    fail_workload_list: bool,
    fail_status: bool,
}

/// In-memory ResourceStore recording every call
#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<FakeState>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(self, policy: TracingConfig) -> Self {
        self.put_policy(policy);
        self
    }

    pub fn with_pod(self, pod: Pod) -> Self {
        self.state.lock().unwrap().pods.push(pod);
        self
    }

    pub fn with_deployment(self, deployment: Deployment) -> Self {
        self.state.lock().unwrap().deployments.push(deployment);
        self
    }

    pub fn with_config_map(self, config_map: ConfigMap) -> Self {
        let key = (
            config_map.namespace().unwrap_or_default(),
            config_map.name_any(),
        );
        self.state.lock().unwrap().config_maps.insert(key, config_map);
        self
    }

    /// Make writes to this deployment fail
    pub fn failing_workload(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_workloads
            .insert(name.to_string());
        self
    }

    pub fn failing_config_map_write(self) -> Self {
        self.state.lock().unwrap().fail_config_map_write = true;
        self
    }

    pub fn failing_pod_list(self) -> Self {
        self.state.lock().unwrap().fail_pod_list = true;
        self
    }

    pub fn failing_workload_list(self) -> Self {
        self.state.lock().unwrap().fail_workload_list = true;
        self
    }

    pub fn failing_status(self) -> Self {
        self.state.lock().unwrap().fail_status = true;
        self
    }

    /// Insert or replace a policy, keeping the status the controller wrote
    pub fn put_policy(&self, mut policy: TracingConfig) {
        let mut state = self.state.lock().unwrap();
        let key = (policy.namespace().unwrap_or_default(), policy.name_any());
        if let Some(existing) = state.policies.get(&key) {
            policy.status = existing.status.clone();
        }
        state.policies.insert(key, policy);
    }

    pub fn policy(&self, namespace: &str, name: &str) -> Option<TracingConfig> {
        self.state
            .lock()
            .unwrap()
            .policies
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.state
            .lock()
            .unwrap()
            .config_maps
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn deployment(&self, name: &str) -> Option<Deployment> {
        self.state
            .lock()
            .unwrap()
            .deployments
            .iter()
            .find(|d| d.name_any() == name)
            .cloned()
    }

    pub fn writes(&self) -> Vec<Write> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Writes other than status updates
    pub fn object_writes(&self) -> Vec<Write> {
        self.writes()
            .into_iter()
            .filter(|w| !matches!(w, Write::UpdateStatus(_)))
            .collect()
    }

    pub fn statuses(&self) -> Vec<TracingConfigStatus> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                Write::UpdateStatus(status) => Some(status),
                _ => None,
            })
            .collect()
    }

    /// Names of the read calls made, in order
    pub fn reads(&self) -> Vec<String> {
        self.state.lock().unwrap().reads.clone()
    }

    pub fn clear_log(&self) {
        let mut state = self.state.lock().unwrap();
        state.writes.clear();
        state.reads.clear();
    }
}

#[async_trait]
impl ResourceStore for FakeStore {
    async fn get_policy(&self, namespace: &str, name: &str) -> Result<Option<TracingConfig>> {
        let mut state = self.state.lock().unwrap();
        state.reads.push("get_policy".to_string());
        Ok(state
            .policies
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn update_policy_status(
        &self,
        policy: &TracingConfig,
        status: &TracingConfigStatus,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_status {
            return Err(store_error("status update rejected"));
        }
        let key = (policy.namespace().unwrap_or_default(), policy.name_any());
        if let Some(stored) = state.policies.get_mut(&key) {
            stored.status = Some(status.clone());
        }
        state.writes.push(Write::UpdateStatus(status.clone()));
        Ok(())
    }

    async fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Pod>> {
        let mut state = self.state.lock().unwrap();
        state.reads.push("list_pods".to_string());
        if state.fail_pod_list {
            return Err(store_error("pods list failed"));
        }
        Ok(state
            .pods
            .iter()
            .filter(|p| p.namespace().as_deref() == Some(namespace))
            .filter(|p| selector.matches(p.metadata.labels.as_ref()))
            .cloned()
            .collect())
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        let mut state = self.state.lock().unwrap();
        state.reads.push("get_config_map".to_string());
        Ok(state
            .config_maps
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn create_config_map(&self, namespace: &str, config_map: &ConfigMap) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_config_map_write {
            return Err(store_error("configmap create failed"));
        }
        let key = (namespace.to_string(), config_map.name_any());
        state.config_maps.insert(key, config_map.clone());
        state
            .writes
            .push(Write::CreateConfigMap(config_map.name_any()));
        Ok(())
    }

    async fn update_config_map(&self, namespace: &str, config_map: &ConfigMap) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_config_map_write {
            return Err(store_error("configmap update failed"));
        }
        let key = (namespace.to_string(), config_map.name_any());
        state.config_maps.insert(key, config_map.clone());
        state
            .writes
            .push(Write::UpdateConfigMap(config_map.name_any()));
        Ok(())
    }

    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Deployment>> {
        let mut state = self.state.lock().unwrap();
        state.reads.push("list_workloads".to_string());
        if state.fail_workload_list {
            return Err(store_error("deployments list failed"));
        }
        Ok(state
            .deployments
            .iter()
            .filter(|d| d.namespace().as_deref() == Some(namespace))
            .cloned()
            .collect())
    }

    async fn update_workload(&self, namespace: &str, deployment: &Deployment) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let name = deployment.name_any();
        if state.failing_workloads.contains(&name) {
            return Err(store_error("deployment update conflict"));
        }
        if let Some(stored) = state
            .deployments
            .iter_mut()
            .find(|d| d.name_any() == name && d.namespace().as_deref() == Some(namespace))
        {
            *stored = deployment.clone();
        }
        state.writes.push(Write::UpdateWorkload(name));
        Ok(())
    }
}

pub fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A policy in `namespace` selecting `app=<app>` when `app` is given
pub fn make_policy(name: &str, namespace: &str, app: Option<&str>) -> TracingConfig {
    TracingConfig {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(format!("{}-uid", name)),
            generation: Some(1),
            ..Default::default()
        },
        spec: TracingConfigSpec {
            enabled: true,
            sampling_rate: 0.5,
            endpoint: "collector:4317".to_string(),
            service_name: "svc-a".to_string(),
            selector: app.map(|app| LabelSelector {
                match_labels: Some(labels(&[("app", app)])),
                match_expressions: None,
            }),
            ..Default::default()
        },
        status: None,
    }
}

pub fn make_pod(name: &str, namespace: &str, pod_labels: &[(&str, &str)]) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels(pod_labels)),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A deployment whose pod template carries `template_labels` and one
/// container per entry of `containers`
pub fn make_deployment(
    name: &str,
    namespace: &str,
    template_labels: &[(&str, &str)],
    containers: &[&str],
) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            selector: LabelSelector {
                match_labels: Some(labels(template_labels)),
                match_expressions: None,
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels(template_labels)),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: containers
                        .iter()
                        .map(|c| Container {
                            name: c.to_string(),
                            image: Some("example/app:1.0".to_string()),
                            ..Default::default()
                        })
                        .collect(),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}
