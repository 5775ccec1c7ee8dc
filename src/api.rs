use crate::model::{
    ClusterSummary, Event, HealthResponse, ItemList, LogsResponse, Namespace, Node, NodeMetric,
    Pod, PodKey, Service, Workload, WorkloadKey,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        source: reqwest::Error,
    },
    #[error("{path} returned HTTP {status}")]
    Status {
        path: String,
        status: u16,
        message: Option<String>,
    },
    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        self.server_message()
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Endpoint {
    Health,
    Summary,
    Events { limit: Option<u32> },
    Namespaces,
    Pods,
    PodLogs { pod: PodKey, tail: u32 },
    Nodes,
    NodeMetrics,
    Workloads,
    RestartWorkload(WorkloadKey),
    Services,
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Self::Health => "/api/health".to_string(),
            Self::Summary => "/api/summary".to_string(),
            Self::Events { limit: None } => "/api/events".to_string(),
            Self::Events { limit: Some(limit) } => format!("/api/events?limit={limit}"),
            Self::Namespaces => "/api/namespaces".to_string(),
            Self::Pods => "/api/pods".to_string(),
            Self::PodLogs { pod, tail } => {
                format!("/api/pods/{}/{}/logs?tail={tail}", pod.namespace, pod.name)
            }
            Self::Nodes => "/api/nodes".to_string(),
            Self::NodeMetrics => "/api/metrics/nodes".to_string(),
            Self::Workloads => "/api/workloads".to_string(),
            Self::RestartWorkload(key) => format!(
                "/api/workloads/{}/{}/{}/restart",
                key.namespace, key.name, key.kind
            ),
            Self::Services => "/api/services".to_string(),
        }
    }

    pub fn method(&self) -> reqwest::Method {
        match self {
            Self::RestartWorkload(_) => reqwest::Method::POST,
            _ => reqwest::Method::GET,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum FetchCall {
    Summary,
    RecentEvents(u32),
    Events,
    Namespaces,
    Pods,
    Nodes,
    NodeMetrics,
    Workloads,
    Services,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Summary(ClusterSummary),
    Events(Vec<Event>),
    Namespaces(Vec<Namespace>),
    Pods(Vec<Pod>),
    Nodes(Vec<Node>),
    NodeMetrics(Vec<NodeMetric>),
    Workloads(Vec<Workload>),
    Services(Vec<Service>),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.get(&Endpoint::Health).await
    }

    pub async fn summary(&self) -> Result<ClusterSummary, ApiError> {
        self.get(&Endpoint::Summary).await
    }

    pub async fn events(&self, limit: Option<u32>) -> Result<Vec<Event>, ApiError> {
        self.list(&Endpoint::Events { limit }).await
    }

    pub async fn namespaces(&self) -> Result<Vec<Namespace>, ApiError> {
        self.list(&Endpoint::Namespaces).await
    }

    pub async fn pods(&self) -> Result<Vec<Pod>, ApiError> {
        self.list(&Endpoint::Pods).await
    }

    pub async fn pod_logs(&self, pod: &PodKey, tail: u32) -> Result<String, ApiError> {
        let endpoint = Endpoint::PodLogs {
            pod: pod.clone(),
            tail,
        };
        let response: LogsResponse = self.get(&endpoint).await?;
        Ok(response.logs)
    }

    pub async fn nodes(&self) -> Result<Vec<Node>, ApiError> {
        self.list(&Endpoint::Nodes).await
    }

    pub async fn node_metrics(&self) -> Result<Vec<NodeMetric>, ApiError> {
        self.list(&Endpoint::NodeMetrics).await
    }

    pub async fn workloads(&self) -> Result<Vec<Workload>, ApiError> {
        self.list(&Endpoint::Workloads).await
    }

    pub async fn services(&self) -> Result<Vec<Service>, ApiError> {
        self.list(&Endpoint::Services).await
    }

    pub async fn restart_workload(&self, key: &WorkloadKey) -> Result<(), ApiError> {
        let endpoint = Endpoint::RestartWorkload(key.clone());
        self.send(&endpoint).await.map(|_| ())
    }

    pub async fn fetch(&self, call: FetchCall) -> Result<Payload, ApiError> {
        let payload = match call {
            FetchCall::Summary => Payload::Summary(self.summary().await?),
            FetchCall::RecentEvents(limit) => Payload::Events(self.events(Some(limit)).await?),
            FetchCall::Events => Payload::Events(self.events(None).await?),
            FetchCall::Namespaces => Payload::Namespaces(self.namespaces().await?),
            FetchCall::Pods => Payload::Pods(self.pods().await?),
            FetchCall::Nodes => Payload::Nodes(self.nodes().await?),
            FetchCall::NodeMetrics => Payload::NodeMetrics(self.node_metrics().await?),
            FetchCall::Workloads => Payload::Workloads(self.workloads().await?),
            FetchCall::Services => Payload::Services(self.services().await?),
        };
        Ok(payload)
    }

    async fn list<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<Vec<T>, ApiError> {
        let list: ItemList<T> = self.get(endpoint).await?;
        Ok(list.items)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, ApiError> {
        let path = endpoint.path();
        let body = self.send(endpoint).await?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { path, source })
    }

    async fn send(&self, endpoint: &Endpoint) -> Result<String, ApiError> {
        let path = endpoint.path();
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %endpoint.method(), %url, "api request");

        let response = self
            .client
            .request(endpoint.method(), &url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.clone(),
                source,
            })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .map(|body| body.error);
            return Err(ApiError::Status {
                path,
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}
