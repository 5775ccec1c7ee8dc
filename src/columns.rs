use crate::model::{CellValue, Event, Node, NodeMetric, Pod, Service, Workload};
use crate::table::{ACTIONS_KEY, CellView, Column, RowContext, Tone};
use chrono::{DateTime, Local, Utc};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Stat {
    pub label: &'static str,
    pub value: usize,
    pub tone: Tone,
}

impl Stat {
    fn new(label: &'static str, value: usize, tone: Tone) -> Self {
        Self { label, value, tone }
    }
}

pub type StatsFn<R> = fn(&[&R]) -> Vec<Stat>;

fn count<R>(records: &[&R], predicate: impl Fn(&R) -> bool) -> usize {
    records.iter().filter(|record| predicate(**record)).count()
}

pub fn pod_columns() -> Vec<Column<Pod>> {
    vec![
        Column::new("name", "Name", |pod: &Pod| CellValue::text(&pod.name)).width(30),
        Column::new("namespace", "Namespace", |pod: &Pod| {
            CellValue::text(&pod.namespace)
        })
        .width(16)
        .render(namespace_badge),
        Column::new("status", "Status", |pod: &Pod| CellValue::text(&pod.status))
            .width(12)
            .render(pod_status),
        Column::new("ready", "Ready", |pod: &Pod| CellValue::text(&pod.ready)).width(7),
        Column::new("restarts", "Restarts", |pod: &Pod| {
            CellValue::number(pod.restarts as f64)
        })
        .width(9)
        .render(restart_count),
        Column::new("age", "Age", |pod: &Pod| CellValue::text(&pod.age)).width(9),
        Column::new("node", "Node", |pod: &Pod| CellValue::text(&pod.node)),
        Column::new(ACTIONS_KEY, "Actions", |_: &Pod| CellValue::Empty)
            .width(14)
            .render(pod_actions),
    ]
}

pub fn pod_stats(pods: &[&Pod]) -> Vec<Stat> {
    vec![
        Stat::new("Total", pods.len(), Tone::Plain),
        Stat::new("Running", count(pods, |p| p.status == "Running"), Tone::Success),
        Stat::new("Pending", count(pods, |p| p.status == "Pending"), Tone::Warning),
        Stat::new("Failed", count(pods, |p| p.status == "Failed"), Tone::Error),
    ]
}

pub fn node_columns() -> Vec<Column<Node>> {
    vec![
        Column::new("name", "Name", |node: &Node| CellValue::text(&node.name)).width(24),
        Column::new("status", "Status", |node: &Node| CellValue::text(&node.status))
            .width(10)
            .render(node_status),
        Column::new("roles", "Roles", |node: &Node| CellValue::text(&node.roles))
            .width(16)
            .render(node_roles),
        Column::new("age", "Age", |node: &Node| CellValue::text(&node.age)).width(8),
        Column::new("version", "Version", |node: &Node| {
            CellValue::text(&node.version)
        })
        .width(12)
        .render(code),
        Column::new("internalIP", "Internal IP", |node: &Node| {
            CellValue::text(&node.internal_ip)
        })
        .width(15)
        .render(code),
        Column::new("externalIP", "External IP", |node: &Node| {
            CellValue::text(&node.external_ip)
        })
        .width(15)
        .render(code),
        Column::new("osImage", "OS Image", |node: &Node| {
            CellValue::text(&node.os_image)
        }),
    ]
}

pub fn node_stats(nodes: &[&Node]) -> Vec<Stat> {
    vec![
        Stat::new("Total", nodes.len(), Tone::Plain),
        Stat::new("Ready", count(nodes, |n| n.status == "Ready"), Tone::Success),
        Stat::new("NotReady", count(nodes, |n| n.status == "NotReady"), Tone::Error),
        Stat::new("Control plane", count(nodes, Node::is_control_plane), Tone::Info),
    ]
}

pub fn metric_columns() -> Vec<Column<NodeMetric>> {
    vec![
        Column::new("name", "Node", |metric: &NodeMetric| {
            CellValue::text(&metric.name)
        })
        .width(30),
        Column::new("cpuUsage", "CPU", |metric: &NodeMetric| {
            CellValue::number(metric.cpu_usage)
        })
        .width(16)
        .render(cpu_cores),
        Column::new("memoryUsage", "Memory", |metric: &NodeMetric| {
            CellValue::number(metric.memory_usage)
        })
        .width(16)
        .render(memory_gib),
    ]
}

pub fn metric_stats(metrics: &[&NodeMetric]) -> Vec<Stat> {
    vec![Stat::new("Total", metrics.len(), Tone::Plain)]
}

pub fn workload_columns() -> Vec<Column<Workload>> {
    vec![
        Column::new("name", "Name", |w: &Workload| CellValue::text(&w.name)).width(28),
        Column::new("namespace", "Namespace", |w: &Workload| {
            CellValue::text(&w.namespace)
        })
        .width(16)
        .render(namespace_badge),
        Column::new("kind", "Kind", |w: &Workload| CellValue::text(&w.kind))
            .width(12)
            .render(workload_kind),
        Column::new("ready", "Ready", |w: &Workload| CellValue::text(&w.ready))
            .width(7)
            .render(ready_ratio),
        Column::new("upToDate", "Up-to-date", |w: &Workload| {
            CellValue::text(&w.up_to_date)
        })
        .width(10),
        Column::new("available", "Available", |w: &Workload| {
            CellValue::text(&w.available)
        })
        .width(9),
        Column::new("age", "Age", |w: &Workload| CellValue::text(&w.age)).width(9),
        Column::new(ACTIONS_KEY, "Actions", |_: &Workload| CellValue::Empty)
            .width(14)
            .render(workload_actions),
    ]
}

pub fn workload_stats(workloads: &[&Workload]) -> Vec<Stat> {
    vec![
        Stat::new("Total", workloads.len(), Tone::Plain),
        Stat::new("Deployment", count(workloads, |w| w.kind == "Deployment"), Tone::Success),
        Stat::new("StatefulSet", count(workloads, |w| w.kind == "StatefulSet"), Tone::Info),
        Stat::new("DaemonSet", count(workloads, |w| w.kind == "DaemonSet"), Tone::Warning),
    ]
}

pub fn service_columns() -> Vec<Column<Service>> {
    vec![
        Column::new("name", "Name", |s: &Service| CellValue::text(&s.name)).width(28),
        Column::new("namespace", "Namespace", |s: &Service| {
            CellValue::text(&s.namespace)
        })
        .width(16)
        .render(namespace_badge),
        Column::new("type", "Type", |s: &Service| CellValue::text(&s.service_type))
            .width(13)
            .render(service_type),
        Column::new("clusterIP", "Cluster IP", |s: &Service| {
            CellValue::text(&s.cluster_ip)
        })
        .width(15)
        .render(code),
        Column::new("externalIP", "External IP", |s: &Service| {
            CellValue::text(&s.external_ip)
        })
        .width(15)
        .render(code),
        Column::new("ports", "Ports", |s: &Service| s.ports.to_cell())
            .width(22)
            .render(code),
        Column::new("age", "Age", |s: &Service| CellValue::text(&s.age)),
    ]
}

pub fn service_stats(services: &[&Service]) -> Vec<Stat> {
    vec![
        Stat::new("Total", services.len(), Tone::Plain),
        Stat::new("ClusterIP", count(services, |s| s.service_type == "ClusterIP"), Tone::Plain),
        Stat::new("NodePort", count(services, |s| s.service_type == "NodePort"), Tone::Warning),
        Stat::new(
            "LoadBalancer",
            count(services, |s| s.service_type == "LoadBalancer"),
            Tone::Success,
        ),
    ]
}

pub fn event_columns() -> Vec<Column<Event>> {
    vec![
        Column::new("type", "Type", |e: &Event| CellValue::text(&e.event_type))
            .width(9)
            .render(event_type),
        Column::new("reason", "Reason", |e: &Event| CellValue::text(&e.reason))
            .width(16)
            .render(event_reason),
        Column::new("object", "Object", |e: &Event| CellValue::text(&e.object))
            .width(28)
            .render(code),
        Column::new("namespace", "Namespace", |e: &Event| {
            CellValue::text(&e.namespace)
        })
        .width(14)
        .render(event_namespace),
        Column::new("message", "Message", |e: &Event| CellValue::text(&e.message)),
        Column::new("count", "Count", |e: &Event| CellValue::number(e.count as f64))
            .width(6)
            .render(event_count),
        Column::new("lastTime", "Last Seen", |e: &Event| {
            CellValue::text(&e.last_time)
        })
        .width(10)
        .render(relative_time_cell),
    ]
}

pub fn recent_event_columns() -> Vec<Column<Event>> {
    vec![
        Column::new("type", "Type", |e: &Event| CellValue::text(&e.event_type))
            .width(9)
            .render(event_type),
        Column::new("reason", "Reason", |e: &Event| CellValue::text(&e.reason)).width(16),
        Column::new("object", "Object", |e: &Event| CellValue::text(&e.object)).width(28),
        Column::new("message", "Message", |e: &Event| CellValue::text(&e.message)),
        Column::new("time", "Time", |e: &Event| CellValue::text(e.timestamp()))
            .width(20)
            .render(local_time_cell),
    ]
}

pub fn event_stats(events: &[&Event]) -> Vec<Stat> {
    vec![
        Stat::new("Total", events.len(), Tone::Plain),
        Stat::new("Normal", count(events, |e| e.event_type == "Normal"), Tone::Success),
        Stat::new("Warning", count(events, |e| e.event_type == "Warning"), Tone::Warning),
        Stat::new("Error", count(events, |e| e.event_type == "Error"), Tone::Error),
    ]
}

fn toned(value: &CellValue, tone: Tone) -> CellView {
    if value.is_empty() {
        CellView::new("-", Tone::Muted)
    } else {
        CellView::new(value.to_string(), tone)
    }
}

fn namespace_badge<R>(value: &CellValue, _: &R, _: RowContext) -> CellView {
    toned(value, Tone::Info)
}

fn code<R>(value: &CellValue, _: &R, _: RowContext) -> CellView {
    toned(value, Tone::Code)
}

pub fn pod_phase_tone(phase: &str) -> Tone {
    match phase {
        "Running" | "Succeeded" => Tone::Success,
        "Pending" => Tone::Warning,
        "Failed" => Tone::Error,
        _ => Tone::Plain,
    }
}

fn pod_status(value: &CellValue, _: &Pod, _: RowContext) -> CellView {
    toned(value, pod_phase_tone(value.as_text().unwrap_or_default()))
}

fn restart_count(value: &CellValue, _: &Pod, _: RowContext) -> CellView {
    let tone = match value.as_number() {
        Some(restarts) if restarts > 0.0 => Tone::Warning,
        _ => Tone::Plain,
    };
    CellView::new(value.to_string(), tone)
}

fn pod_actions(_: &CellValue, _: &Pod, context: RowContext) -> CellView {
    if context.action_in_flight {
        CellView::new("loading logs…", Tone::Muted)
    } else {
        CellView::new("l logs", Tone::Info)
    }
}

fn node_status(value: &CellValue, _: &Node, _: RowContext) -> CellView {
    let tone = match value.as_text() {
        Some("Ready") => Tone::Success,
        Some("NotReady") => Tone::Error,
        Some("Unknown") => Tone::Warning,
        _ => Tone::Plain,
    };
    toned(value, tone)
}

fn node_roles(value: &CellValue, node: &Node, _: RowContext) -> CellView {
    if node.is_control_plane() {
        CellView::new(value.to_string(), Tone::Info)
    } else if value.is_empty() {
        CellView::new("worker", Tone::Plain)
    } else {
        CellView::plain(value.to_string())
    }
}

pub fn format_cores(millicores: f64) -> String {
    format!("{:.2} cores", millicores / 1000.0)
}

pub fn format_gib(bytes: f64) -> String {
    format!("{:.2} GiB", bytes / GIB)
}

fn cpu_cores(value: &CellValue, _: &NodeMetric, _: RowContext) -> CellView {
    CellView::plain(format_cores(value.as_number().unwrap_or_default()))
}

fn memory_gib(value: &CellValue, _: &NodeMetric, _: RowContext) -> CellView {
    CellView::plain(format_gib(value.as_number().unwrap_or_default()))
}

fn workload_kind(value: &CellValue, _: &Workload, _: RowContext) -> CellView {
    let tone = match value.as_text() {
        Some("Deployment") => Tone::Success,
        Some("StatefulSet") | Some("Job") => Tone::Info,
        Some("DaemonSet") | Some("CronJob") => Tone::Warning,
        _ => Tone::Plain,
    };
    toned(value, tone)
}

pub fn ready_ratio_tone(ready: &str) -> Tone {
    let Some((current, desired)) = ready.split_once('/') else {
        return Tone::Plain;
    };
    match (current.trim().parse::<u32>(), desired.trim().parse::<u32>()) {
        (Ok(current), Ok(desired)) if current == desired && desired > 0 => Tone::Success,
        (Ok(_), Ok(_)) => Tone::Warning,
        _ => Tone::Plain,
    }
}

fn ready_ratio(value: &CellValue, _: &Workload, _: RowContext) -> CellView {
    toned(value, ready_ratio_tone(value.as_text().unwrap_or_default()))
}

fn workload_actions(_: &CellValue, _: &Workload, context: RowContext) -> CellView {
    if context.action_in_flight {
        CellView::new("restarting…", Tone::Muted)
    } else {
        CellView::new("R restart", Tone::Warning)
    }
}

fn service_type(value: &CellValue, _: &Service, _: RowContext) -> CellView {
    let tone = match value.as_text() {
        Some("NodePort") => Tone::Warning,
        Some("LoadBalancer") => Tone::Success,
        Some("ExternalName") => Tone::Info,
        _ => Tone::Plain,
    };
    toned(value, tone)
}

pub fn event_type_tone(event_type: &str) -> Tone {
    match event_type {
        "Normal" => Tone::Success,
        "Warning" => Tone::Warning,
        "Error" => Tone::Error,
        _ => Tone::Info,
    }
}

fn event_type(value: &CellValue, _: &Event, _: RowContext) -> CellView {
    toned(value, event_type_tone(value.as_text().unwrap_or_default()))
}

fn event_reason(value: &CellValue, _: &Event, _: RowContext) -> CellView {
    let tone = match value.as_text() {
        Some("Failed") | Some("FailedMount") => Tone::Error,
        Some("Killing") | Some("Unhealthy") => Tone::Warning,
        Some("Created") => Tone::Success,
        Some("Started") | Some("Scheduled") | Some("Pulled") => Tone::Info,
        _ => Tone::Muted,
    };
    toned(value, tone)
}

fn event_namespace(value: &CellValue, _: &Event, _: RowContext) -> CellView {
    if value.is_empty() {
        CellView::new("default", Tone::Info)
    } else {
        CellView::new(value.to_string(), Tone::Info)
    }
}

fn event_count(value: &CellValue, _: &Event, _: RowContext) -> CellView {
    let tone = match value.as_number() {
        Some(count) if count > 1.0 => Tone::Warning,
        _ => Tone::Muted,
    };
    CellView::new(value.to_string(), tone)
}

pub fn relative_time(timestamp: &str, now: DateTime<Utc>) -> String {
    if timestamp.trim().is_empty() {
        return "-".to_string();
    }
    let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp.trim()) else {
        return timestamp.to_string();
    };

    let minutes = (now - parsed.with_timezone(&Utc)).num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        parsed.format("%Y-%m-%d").to_string()
    }
}

fn relative_time_cell(value: &CellValue, _: &Event, _: RowContext) -> CellView {
    let text = relative_time(value.as_text().unwrap_or_default(), Utc::now());
    CellView::new(text, Tone::Muted)
}

fn local_time_cell(value: &CellValue, _: &Event, _: RowContext) -> CellView {
    let raw = value.as_text().unwrap_or_default();
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => CellView::plain(
            parsed
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        ),
        Err(_) => toned(value, Tone::Muted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::sort_records;
    use std::collections::HashSet;

    fn unique_keys<R>(columns: &[Column<R>]) -> bool {
        let keys = columns.iter().map(|column| column.key).collect::<HashSet<_>>();
        keys.len() == columns.len()
    }

    #[test]
    fn column_keys_are_unique_per_page() {
        assert!(unique_keys(&pod_columns()));
        assert!(unique_keys(&node_columns()));
        assert!(unique_keys(&metric_columns()));
        assert!(unique_keys(&workload_columns()));
        assert!(unique_keys(&service_columns()));
        assert!(unique_keys(&event_columns()));
        assert!(unique_keys(&recent_event_columns()));
    }

    #[test]
    fn metrics_render_as_cores_and_gib() {
        assert_eq!(format_cores(1500.0), "1.50 cores");
        assert_eq!(format_gib(2.0 * GIB), "2.00 GiB");
        assert_eq!(format_gib(0.0), "0.00 GiB");
    }

    #[test]
    fn ready_ratio_requires_full_and_nonzero() {
        assert_eq!(ready_ratio_tone("3/3"), Tone::Success);
        assert_eq!(ready_ratio_tone("1/3"), Tone::Warning);
        assert_eq!(ready_ratio_tone("0/0"), Tone::Warning);
        assert_eq!(ready_ratio_tone("n/a"), Tone::Plain);
    }

    #[test]
    fn relative_time_buckets() {
        let now = DateTime::parse_from_rfc3339("2024-05-10T12:00:00Z")
            .expect("now")
            .with_timezone(&Utc);
        assert_eq!(relative_time("", now), "-");
        assert_eq!(relative_time("2024-05-10T11:59:30Z", now), "just now");
        assert_eq!(relative_time("2024-05-10T11:15:00Z", now), "45m ago");
        assert_eq!(relative_time("2024-05-10T07:00:00Z", now), "5h ago");
        assert_eq!(relative_time("2024-05-07T12:00:00Z", now), "3d ago");
        assert_eq!(relative_time("2024-04-01T12:00:00Z", now), "2024-04-01");
        assert_eq!(relative_time("yesterday", now), "yesterday");
    }

    #[test]
    fn node_roles_fall_back_to_worker() {
        let worker = Node::default();
        let cell = node_roles(&CellValue::Empty, &worker, RowContext::default());
        assert_eq!(cell.text, "worker");

        let master = Node {
            roles: "control-plane".to_string(),
            ..Node::default()
        };
        let cell = node_roles(&CellValue::text("control-plane"), &master, RowContext::default());
        assert_eq!(cell.tone, Tone::Info);
    }

    #[test]
    fn empty_ip_and_event_namespace_placeholders() {
        let node = Node::default();
        let columns = node_columns();
        let internal = columns
            .iter()
            .find(|column| column.key == "internalIP")
            .expect("internal ip column");
        assert_eq!(internal.cell(&node, RowContext::default()).text, "-");

        let event = Event::default();
        let columns = event_columns();
        let namespace = columns
            .iter()
            .find(|column| column.key == "namespace")
            .expect("namespace column");
        assert_eq!(namespace.cell(&event, RowContext::default()).text, "default");
    }

    #[test]
    fn action_cells_reflect_in_flight_state() {
        let workload = Workload::default();
        let columns = workload_columns();
        let actions = columns
            .iter()
            .find(|column| column.key == ACTIONS_KEY)
            .expect("actions column");
        assert_eq!(actions.cell(&workload, RowContext::default()).text, "R restart");
        let busy = RowContext {
            action_in_flight: true,
        };
        assert_eq!(actions.cell(&workload, busy).text, "restarting…");
    }

    #[test]
    fn stats_count_filtered_records() {
        let pods = [
            Pod {
                status: "Running".to_string(),
                ..Pod::default()
            },
            Pod {
                status: "Pending".to_string(),
                ..Pod::default()
            },
            Pod {
                status: "Running".to_string(),
                ..Pod::default()
            },
        ];
        let refs = pods.iter().collect::<Vec<_>>();
        let stats = pod_stats(&refs);
        assert_eq!(stats[0].value, 3);
        assert_eq!(stats[1].value, 2);
        assert_eq!(stats[2].value, 1);
        assert_eq!(stats[3].value, 0);
    }

    #[test]
    fn service_ports_sort_by_first_port() {
        use crate::model::{ServicePort, ServicePorts};
        use crate::table::{SortDirection, SortState};

        let service = |name: &str, port: i64| Service {
            name: name.to_string(),
            ports: ServicePorts::List(vec![ServicePort {
                port,
                ..ServicePort::default()
            }]),
            ..Service::default()
        };
        let services = [service("https", 443), service("http", 80), service("none", 0)];
        let sort = SortState {
            key: "ports",
            direction: SortDirection::Ascending,
        };
        let sorted = sort_records(services.iter().collect(), &service_columns(), Some(&sort));
        let names = sorted.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["none", "http", "https"]);
    }
}
