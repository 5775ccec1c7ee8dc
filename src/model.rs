use serde::Deserialize;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Ports(Vec<ServicePort>),
}

impl CellValue {
    pub fn text(value: &str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_string())
        }
    }

    pub fn number(value: impl Into<f64>) -> Self {
        Self::Number(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(value) => value.trim().is_empty(),
            Self::Number(_) => false,
            Self::Ports(ports) => ports.is_empty(),
        }
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(left), Self::Number(right)) => left.total_cmp(right),
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Ports(left), Self::Ports(right)) => {
                let left_first = left.first().map(ServicePort::effective_port);
                let right_first = right.first().map(ServicePort::effective_port);
                left_first
                    .cmp(&right_first)
                    .then_with(|| left.len().cmp(&right.len()))
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
            Self::Ports(_) => 3,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(value) => write!(f, "{value}"),
            Self::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Self::Number(value) => write!(f, "{value}"),
            Self::Ports(ports) => {
                let joined = ports
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{joined}")
            }
        }
    }
}

pub trait Resource {
    type Key: Clone + Eq + Hash + Debug;

    fn key(&self) -> Self::Key;

    fn search_fields(&self) -> Vec<&str>;

    fn namespace(&self) -> Option<&str> {
        None
    }

    fn category(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PodKey {
    pub namespace: String,
    pub name: String,
}

impl PodKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for PodKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct WorkloadKey {
    pub namespace: String,
    pub name: String,
    pub kind: String,
}

impl WorkloadKey {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind: kind.into(),
        }
    }
}

impl Display for WorkloadKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct EventKey {
    pub namespace: String,
    pub object: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterSummary {
    pub total_pods: u64,
    pub running_pods: u64,
    pub total_nodes: u64,
    pub ready_nodes: u64,
    pub total_services: u64,
    pub total_workloads: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct Namespace {
    pub name: String,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct Pod {
    pub name: String,
    pub namespace: String,
    pub status: String,
    pub ready: String,
    pub restarts: i64,
    pub age: String,
    pub node: String,
}

impl Resource for Pod {
    type Key = PodKey;

    fn key(&self) -> PodKey {
        PodKey::new(&self.namespace, &self.name)
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.namespace.as_str()]
    }

    fn namespace(&self) -> Option<&str> {
        Some(&self.namespace)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Node {
    pub name: String,
    pub status: String,
    pub roles: String,
    pub age: String,
    pub version: String,
    #[serde(rename = "internalIP")]
    pub internal_ip: String,
    #[serde(rename = "externalIP")]
    pub external_ip: String,
    pub os_image: String,
    pub kernel_version: String,
    pub container_runtime: String,
    pub architecture: String,
}

impl Node {
    pub fn is_control_plane(&self) -> bool {
        self.roles.contains("master") || self.roles.contains("control-plane")
    }
}

impl Resource for Node {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.status.as_str(), self.roles.as_str()]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeMetric {
    pub name: String,
    // millicores
    pub cpu_usage: f64,
    // bytes
    pub memory_usage: f64,
}

impl Resource for NodeMetric {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Workload {
    pub name: String,
    pub namespace: String,
    pub kind: String,
    pub ready: String,
    pub up_to_date: String,
    pub available: String,
    pub age: String,
}

impl Resource for Workload {
    type Key = WorkloadKey;

    fn key(&self) -> WorkloadKey {
        WorkloadKey::new(&self.namespace, &self.name, &self.kind)
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.namespace.as_str()]
    }

    fn namespace(&self) -> Option<&str> {
        Some(&self.namespace)
    }

    fn category(&self) -> Option<&str> {
        Some(&self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ServicePort {
    pub port: i64,
    pub target_port: i64,
    pub node_port: i64,
    pub protocol: String,
}

impl ServicePort {
    pub fn effective_port(&self) -> i64 {
        if self.port != 0 {
            self.port
        } else {
            self.target_port
        }
    }
}

impl Display for ServicePort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.effective_port())?;
        if !self.protocol.is_empty() {
            write!(f, "/{}", self.protocol)?;
        }
        if self.node_port != 0 {
            write!(f, ":{}", self.node_port)?;
        }
        Ok(())
    }
}

// `ports` may be plain text or structured port objects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(untagged)]
pub enum ServicePorts {
    #[default]
    Missing,
    Text(String),
    List(Vec<ServicePort>),
    Single(ServicePort),
}

impl ServicePorts {
    pub fn to_cell(&self) -> CellValue {
        match self {
            Self::Missing => CellValue::Empty,
            Self::Text(value) => CellValue::text(value),
            Self::List(ports) if ports.is_empty() => CellValue::Empty,
            Self::List(ports) => CellValue::Ports(ports.clone()),
            Self::Single(port) => CellValue::Ports(vec![port.clone()]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(rename = "clusterIP")]
    pub cluster_ip: String,
    #[serde(rename = "externalIP")]
    pub external_ip: String,
    pub ports: ServicePorts,
    pub age: String,
}

impl Resource for Service {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.namespace.as_str()]
    }

    fn namespace(&self) -> Option<&str> {
        Some(&self.namespace)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub reason: String,
    pub object: String,
    pub message: String,
    pub namespace: String,
    pub count: i64,
    pub first_time: String,
    pub last_time: String,
    pub time: String,
    pub age: String,
}

impl Event {
    pub fn timestamp(&self) -> &str {
        [&self.last_time, &self.time, &self.first_time]
            .into_iter()
            .find(|value| !value.is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl Resource for Event {
    type Key = EventKey;

    fn key(&self) -> EventKey {
        EventKey {
            namespace: self.namespace.clone(),
            object: self.object.clone(),
            reason: self.reason.clone(),
        }
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.reason.as_str(), self.object.as_str(), self.message.as_str()]
    }

    fn namespace(&self) -> Option<&str> {
        Some(&self.namespace)
    }

    fn category(&self) -> Option<&str> {
        Some(&self.event_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct LogsResponse {
    pub logs: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::{CellValue, ItemList, Pod, Service, ServicePort, ServicePorts};
    use std::cmp::Ordering;

    #[test]
    fn service_ports_accept_list_single_and_text() {
        let raw = r#"{"items":[
            {"name":"a","ports":[{"port":80,"targetPort":8080,"protocol":"TCP"}]},
            {"name":"b","ports":{"port":0,"targetPort":9090,"nodePort":30090,"protocol":"TCP"}},
            {"name":"c","ports":"53/UDP"},
            {"name":"d"}
        ]}"#;
        let list: ItemList<Service> = serde_json::from_str(raw).expect("decode services");

        assert_eq!(list.items[0].ports.to_cell().to_string(), "80/TCP");
        assert_eq!(list.items[1].ports.to_cell().to_string(), "9090/TCP:30090");
        assert_eq!(list.items[2].ports, ServicePorts::Text("53/UDP".to_string()));
        assert_eq!(list.items[3].ports.to_cell(), CellValue::Empty);
    }

    #[test]
    fn missing_items_decode_as_empty_list() {
        let list: ItemList<Pod> = serde_json::from_str("{}").expect("decode");
        assert!(list.items.is_empty());
    }

    #[test]
    fn pod_decodes_with_missing_fields() {
        let pod: Pod = serde_json::from_str(r#"{"name":"web-1","restarts":3}"#).expect("decode");
        assert_eq!(pod.name, "web-1");
        assert_eq!(pod.restarts, 3);
        assert_eq!(pod.namespace, "");
    }

    #[test]
    fn cell_compare_orders_numbers_numerically() {
        assert_eq!(
            CellValue::number(10).compare(&CellValue::number(9)),
            Ordering::Greater
        );
        assert_eq!(
            CellValue::text("10").compare(&CellValue::text("9")),
            Ordering::Less
        );
        assert_eq!(
            CellValue::Empty.compare(&CellValue::number(0)),
            Ordering::Less
        );
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(CellValue::number(3).to_string(), "3");
        assert_eq!(CellValue::number(1.5).to_string(), "1.5");
    }

    #[test]
    fn port_falls_back_to_target_port() {
        let port = ServicePort {
            port: 0,
            target_port: 8443,
            node_port: 0,
            protocol: String::new(),
        };
        assert_eq!(port.to_string(), "8443");
    }
}
