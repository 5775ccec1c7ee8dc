use crate::api::FetchCall;
use crate::columns::{Stat, StatsFn};
use crate::fetch::FetchController;
use crate::filter::{self, FilterState};
use crate::model::{ClusterSummary, Event, Namespace, Resource};
use crate::table::{self, Column, GridView, RowContext, SortState, TableView};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Page {
    Dashboard,
    Pods,
    Nodes,
    NodeMetrics,
    Workloads,
    Services,
    Events,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FilterSupport {
    pub search: bool,
    pub namespace: bool,
    pub category: Option<&'static str>,
}

impl Page {
    pub const ALL: [Self; 7] = [
        Self::Dashboard,
        Self::Pods,
        Self::Nodes,
        Self::NodeMetrics,
        Self::Workloads,
        Self::Services,
        Self::Events,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Pods => "Pods",
            Self::Nodes => "Nodes",
            Self::NodeMetrics => "Node Metrics",
            Self::Workloads => "Workloads",
            Self::Services => "Services",
            Self::Events => "Events",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "dash" | "dashboard" | "overview" | "home" => Some(Self::Dashboard),
            "po" | "pod" | "pods" => Some(Self::Pods),
            "no" | "node" | "nodes" => Some(Self::Nodes),
            "nm" | "top" | "metrics" | "node-metrics" | "nodemetrics" => Some(Self::NodeMetrics),
            "wl" | "workload" | "workloads" | "deploy" | "deployments" => Some(Self::Workloads),
            "svc" | "service" | "services" => Some(Self::Services),
            "ev" | "event" | "events" => Some(Self::Events),
            _ => None,
        }
    }

    pub fn short_token(self) -> &'static str {
        match self {
            Self::Dashboard => "dash",
            Self::Pods => "po",
            Self::Nodes => "no",
            Self::NodeMetrics => "top",
            Self::Workloads => "wl",
            Self::Services => "svc",
            Self::Events => "ev",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|page| *page == self)
            .unwrap_or_default()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn polls(self) -> bool {
        matches!(self, Self::NodeMetrics)
    }

    pub fn sortable(self) -> bool {
        matches!(self, Self::Dashboard | Self::Pods)
    }

    pub fn filters(self) -> FilterSupport {
        let (search, namespace, category) = match self {
            Self::Dashboard => (false, false, None),
            Self::Pods | Self::Services => (true, true, None),
            Self::Workloads => (true, true, Some("kind")),
            Self::Events => (true, true, Some("type")),
            Self::Nodes | Self::NodeMetrics => (true, false, None),
        };
        FilterSupport {
            search,
            namespace,
            category,
        }
    }

    pub fn fetch_calls(self, recent_events: u32) -> Vec<FetchCall> {
        match self {
            Self::Dashboard => vec![FetchCall::Summary, FetchCall::RecentEvents(recent_events)],
            Self::Pods => vec![FetchCall::Pods, FetchCall::Namespaces],
            Self::Nodes => vec![FetchCall::Nodes],
            Self::NodeMetrics => vec![FetchCall::NodeMetrics],
            Self::Workloads => vec![FetchCall::Workloads, FetchCall::Namespaces],
            Self::Services => vec![FetchCall::Services, FetchCall::Namespaces],
            Self::Events => vec![FetchCall::Events, FetchCall::Namespaces],
        }
    }
}

pub trait TableControls {
    fn filter(&self) -> &FilterState;
    fn filter_mut(&mut self) -> &mut FilterState;
    fn fetch_mut(&mut self) -> &mut FetchController;
    fn set_namespaces(&mut self, namespaces: Vec<Namespace>);
    fn namespace_options(&self) -> &[String];
    fn category_options(&self) -> Vec<String>;
    fn stats(&self) -> Vec<Stat>;
    fn visible_len(&self) -> usize;
    fn total_len(&self) -> usize;
    fn table(&self) -> &TableView;
    fn move_header_cursor(&mut self, delta: isize);
    fn activate_header(&mut self) -> bool;
    fn sort_by(&mut self, key: &'static str) -> bool;
    fn column_key(&self, key: &str) -> Option<&'static str>;
    fn selected(&self) -> usize;
    fn move_selection(&mut self, delta: isize);
    fn select_first(&mut self);
    fn select_last(&mut self);
    fn clamp_selection(&mut self);
}

pub struct ResourcePage<R: Resource> {
    records: Vec<R>,
    namespaces: Vec<String>,
    filter: FilterState,
    fetch: FetchController,
    table: TableView,
    columns: Vec<Column<R>>,
    stats: StatsFn<R>,
    selected: usize,
}

impl<R: Resource> ResourcePage<R> {
    pub fn new(columns: Vec<Column<R>>, sortable: bool, stats: StatsFn<R>) -> Self {
        Self {
            records: Vec::new(),
            namespaces: Vec::new(),
            filter: FilterState::default(),
            fetch: FetchController::default(),
            table: TableView::new(sortable),
            columns,
            stats,
            selected: 0,
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn replace_records(&mut self, records: Vec<R>) {
        let previous = self.selected_key();
        self.records = records;
        // follow the selected row when it survives the refresh
        let index = previous.and_then(|key| {
            self.visible()
                .iter()
                .position(|record| record.key() == key)
        });
        if let Some(index) = index {
            self.selected = index;
        }
        self.clamp_selection();
    }

    pub fn visible(&self) -> Vec<&R> {
        let filtered = filter::apply(&self.records, &self.filter);
        table::sort_records(filtered, &self.columns, self.table.sort())
    }

    pub fn grid<F>(&self, context: F) -> GridView
    where
        F: Fn(&R) -> RowContext,
    {
        let visible = self.visible();
        table::build_grid(
            &self.table,
            &self.columns,
            &visible,
            self.fetch.loading(),
            context,
        )
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.table.sort()
    }

    pub fn selected_record(&self) -> Option<&R> {
        self.visible().get(self.selected).copied()
    }

    pub fn selected_key(&self) -> Option<R::Key> {
        self.selected_record().map(Resource::key)
    }
}

impl<R: Resource> TableControls for ResourcePage<R> {
    fn filter(&self) -> &FilterState {
        &self.filter
    }

    fn filter_mut(&mut self) -> &mut FilterState {
        &mut self.filter
    }

    fn fetch_mut(&mut self) -> &mut FetchController {
        &mut self.fetch
    }

    fn set_namespaces(&mut self, namespaces: Vec<Namespace>) {
        self.namespaces = namespaces
            .into_iter()
            .map(|namespace| namespace.name)
            .filter(|name| !name.is_empty())
            .collect();
    }

    fn namespace_options(&self) -> &[String] {
        &self.namespaces
    }

    fn category_options(&self) -> Vec<String> {
        filter::category_options(&self.records)
    }

    fn stats(&self) -> Vec<Stat> {
        (self.stats)(&self.visible())
    }

    fn visible_len(&self) -> usize {
        filter::apply(&self.records, &self.filter).len()
    }

    fn total_len(&self) -> usize {
        self.records.len()
    }

    fn table(&self) -> &TableView {
        &self.table
    }

    fn move_header_cursor(&mut self, delta: isize) {
        self.table.move_cursor(delta, self.columns.len());
    }

    fn activate_header(&mut self) -> bool {
        self.table.activate_cursor(&self.columns)
    }

    fn sort_by(&mut self, key: &'static str) -> bool {
        self.table.activate_header(key)
    }

    fn column_key(&self, key: &str) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|column| column.key.eq_ignore_ascii_case(key))
            .map(|column| column.key)
    }

    fn selected(&self) -> usize {
        self.selected
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.visible_len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let max = len as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, max) as usize;
    }

    fn select_first(&mut self) {
        self.selected = 0;
    }

    fn select_last(&mut self) {
        self.selected = self.visible_len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

pub struct DashboardPage {
    pub summary: Option<ClusterSummary>,
    pub recent_events: ResourcePage<Event>,
}
