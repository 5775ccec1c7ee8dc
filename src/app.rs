use crate::api::{ApiError, FetchCall, Payload};
use crate::columns::{
    event_columns, event_stats, metric_columns, metric_stats, node_columns, node_stats,
    pod_columns, pod_stats, recent_event_columns, service_columns, service_stats,
    workload_columns, workload_stats,
};
use crate::actions::ActionTracker;
use crate::fetch::{CycleToken, PollTick};
use crate::filter::Selector;
use crate::input::Action;
use crate::logs::{LogRequest, LogSession, LogToken};
use crate::model::{
    ClusterSummary, Event, Node, NodeMetric, Pod, Resource, Service, Workload, WorkloadKey,
};
use crate::pages::{DashboardPage, Page, ResourcePage, TableControls};
use crate::table::{GridView, RowContext};
use tracing::{debug, info, warn};

const MAX_STATUS_LEN: usize = 180;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Filter,
    Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    Refresh {
        page: Page,
        token: CycleToken,
        calls: Vec<FetchCall>,
    },
    RestartWorkload {
        key: WorkloadKey,
    },
    LoadPodLogs {
        request: LogRequest,
    },
}

#[derive(Debug, Clone)]
struct PendingConfirmation {
    prompt: String,
    key: WorkloadKey,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub api_url: String,
    pub start_page: Page,
    pub log_tail: u32,
    pub recent_events_limit: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080".to_string(),
            start_page: Page::Dashboard,
            log_tail: 100,
            recent_events_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ApiHealth {
    Unknown,
    Healthy(String),
    Unreachable(String),
}

pub struct App {
    running: bool,
    mode: InputMode,
    input: String,
    status: String,
    show_help: bool,
    pending_g: bool,
    pending_confirmation: Option<PendingConfirmation>,
    search_before_edit: String,
    api_url: String,
    health: ApiHealth,
    active: Page,
    activation_epoch: u64,
    recent_events_limit: u32,
    table_page_size: usize,
    dashboard: DashboardPage,
    pods: ResourcePage<Pod>,
    nodes: ResourcePage<Node>,
    node_metrics: ResourcePage<NodeMetric>,
    workloads: ResourcePage<Workload>,
    services: ResourcePage<Service>,
    events: ResourcePage<Event>,
    restarts: ActionTracker<WorkloadKey>,
    logs: LogSession,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            running: true,
            mode: InputMode::Normal,
            input: String::new(),
            status: "Ready".to_string(),
            show_help: false,
            pending_g: false,
            pending_confirmation: None,
            search_before_edit: String::new(),
            api_url: settings.api_url,
            health: ApiHealth::Unknown,
            active: settings.start_page,
            activation_epoch: 0,
            recent_events_limit: settings.recent_events_limit,
            table_page_size: 10,
            dashboard: DashboardPage {
                summary: None,
                recent_events: ResourcePage::new(
                    recent_event_columns(),
                    Page::Dashboard.sortable(),
                    event_stats,
                ),
            },
            pods: ResourcePage::new(pod_columns(), Page::Pods.sortable(), pod_stats),
            nodes: ResourcePage::new(node_columns(), Page::Nodes.sortable(), node_stats),
            node_metrics: ResourcePage::new(
                metric_columns(),
                Page::NodeMetrics.sortable(),
                metric_stats,
            ),
            workloads: ResourcePage::new(
                workload_columns(),
                Page::Workloads.sortable(),
                workload_stats,
            ),
            services: ResourcePage::new(
                service_columns(),
                Page::Services.sortable(),
                service_stats,
            ),
            events: ResourcePage::new(event_columns(), Page::Events.sortable(), event_stats),
            restarts: ActionTracker::default(),
            logs: LogSession::new(settings.log_tail),
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn health(&self) -> &ApiHealth {
        &self.health
    }

    pub fn active_page(&self) -> Page {
        self.active
    }

    pub fn activation_epoch(&self) -> u64 {
        self.activation_epoch
    }

    pub fn pending_confirmation_prompt(&self) -> Option<&str> {
        self.pending_confirmation
            .as_ref()
            .map(|pending| pending.prompt.as_str())
    }

    pub fn summary(&self) -> Option<&ClusterSummary> {
        self.dashboard.summary.as_ref()
    }

    #[cfg(test)]
    pub fn pods(&self) -> &ResourcePage<Pod> {
        &self.pods
    }

    #[cfg(test)]
    pub fn workloads(&self) -> &ResourcePage<Workload> {
        &self.workloads
    }

    pub fn restarts(&self) -> &ActionTracker<WorkloadKey> {
        &self.restarts
    }

    pub fn logs(&self) -> &LogSession {
        &self.logs
    }

    pub fn error_banner(&self) -> Option<&str> {
        match self.active {
            Page::Workloads => self.restarts.last_error(),
            _ => None,
        }
    }

    pub fn set_table_page_size(&mut self, rows: usize) {
        self.table_page_size = rows.max(1);
    }

    pub fn controls(&self, page: Page) -> &dyn TableControls {
        match page {
            Page::Dashboard => &self.dashboard.recent_events,
            Page::Pods => &self.pods,
            Page::Nodes => &self.nodes,
            Page::NodeMetrics => &self.node_metrics,
            Page::Workloads => &self.workloads,
            Page::Services => &self.services,
            Page::Events => &self.events,
        }
    }

    fn controls_mut(&mut self, page: Page) -> &mut dyn TableControls {
        match page {
            Page::Dashboard => &mut self.dashboard.recent_events,
            Page::Pods => &mut self.pods,
            Page::Nodes => &mut self.nodes,
            Page::NodeMetrics => &mut self.node_metrics,
            Page::Workloads => &mut self.workloads,
            Page::Services => &mut self.services,
            Page::Events => &mut self.events,
        }
    }

    pub fn active_controls(&self) -> &dyn TableControls {
        self.controls(self.active)
    }

    fn active_controls_mut(&mut self) -> &mut dyn TableControls {
        self.controls_mut(self.active)
    }

    pub fn grid(&self) -> GridView {
        match self.active {
            Page::Dashboard => self.dashboard.recent_events.grid(|_| RowContext::default()),
            Page::Pods => self.pods.grid(|pod| RowContext {
                action_in_flight: self.logs.is_loading()
                    && self.logs.target() == Some(&pod.key()),
            }),
            Page::Nodes => self.nodes.grid(|_| RowContext::default()),
            Page::NodeMetrics => self.node_metrics.grid(|_| RowContext::default()),
            Page::Workloads => self.workloads.grid(|workload| RowContext {
                action_in_flight: self.restarts.is_in_flight(&workload.key()),
            }),
            Page::Services => self.services.grid(|_| RowContext::default()),
            Page::Events => self.events.grid(|_| RowContext::default()),
        }
    }

    pub fn set_health(&mut self, result: Result<String, ApiError>) {
        self.health = match result {
            Ok(status) => {
                info!(%status, "api health check succeeded");
                self.set_status(format!("API {}: {status}", self.api_url));
                ApiHealth::Healthy(status)
            }
            Err(err) => {
                warn!(error = %err, "api health check failed");
                self.set_status(format!("API unreachable: {}", err.user_message()));
                ApiHealth::Unreachable(err.user_message())
            }
        };
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        if let Some(pending) = self.pending_confirmation.take() {
            match action {
                Action::ConfirmYes => {
                    self.status = format!("Confirmed: {}", pending.prompt);
                    return self.begin_restart(pending.key);
                }
                Action::ConfirmNo | Action::CancelInput | Action::CloseOverlay => {
                    self.status = "Action cancelled".to_string();
                    return AppCommand::None;
                }
                _ => {
                    self.pending_confirmation = Some(pending);
                    self.status =
                        "Pending confirmation: press y to confirm or n to cancel".to_string();
                    return AppCommand::None;
                }
            }
        }

        if !matches!(action, Action::GPrefix) {
            self.pending_g = false;
        }

        if self.show_help && !matches!(action, Action::ToggleHelp) {
            self.show_help = false;
            if matches!(action, Action::CloseOverlay) {
                return AppCommand::None;
            }
        }

        match action {
            Action::Quit => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            Action::NextPage => self.activate(self.active.next()),
            Action::PrevPage => self.activate(self.active.previous()),
            Action::JumpPage(number) => match Page::ALL.get(usize::from(number).saturating_sub(1)) {
                Some(page) => self.activate(*page),
                None => AppCommand::None,
            },
            Action::Down => {
                self.active_controls_mut().move_selection(1);
                AppCommand::None
            }
            Action::Up => {
                self.active_controls_mut().move_selection(-1);
                AppCommand::None
            }
            Action::PageDown => {
                let step = self.table_page_size as isize;
                self.active_controls_mut().move_selection(step);
                AppCommand::None
            }
            Action::PageUp => {
                let step = self.table_page_size as isize;
                self.active_controls_mut().move_selection(-step);
                AppCommand::None
            }
            Action::Top => {
                self.active_controls_mut().select_first();
                AppCommand::None
            }
            Action::Bottom => {
                self.active_controls_mut().select_last();
                AppCommand::None
            }
            Action::GPrefix => {
                if self.pending_g {
                    self.pending_g = false;
                    self.active_controls_mut().select_first();
                } else {
                    self.pending_g = true;
                }
                AppCommand::None
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                AppCommand::None
            }
            Action::StartFilter => {
                if !self.active.filters().search {
                    self.status = format!("{} has no search", self.active.title());
                    return AppCommand::None;
                }
                self.mode = InputMode::Filter;
                self.search_before_edit = self.active_controls().filter().search.clone();
                self.input = self.search_before_edit.clone();
                self.status = "Search mode".to_string();
                AppCommand::None
            }
            Action::StartCommand => {
                self.mode = InputMode::Command;
                self.input.clear();
                self.status = "Command mode".to_string();
                AppCommand::None
            }
            Action::Refresh => {
                self.status = format!("Refreshing {}", self.active.title());
                self.refresh_active()
            }
            Action::HeaderLeft => {
                self.active_controls_mut().move_header_cursor(-1);
                AppCommand::None
            }
            Action::HeaderRight => {
                self.active_controls_mut().move_header_cursor(1);
                AppCommand::None
            }
            Action::SortFocused => {
                self.sort_focused();
                AppCommand::None
            }
            Action::CycleNamespace => {
                self.cycle_namespace();
                AppCommand::None
            }
            Action::CycleCategory => {
                self.cycle_category();
                AppCommand::None
            }
            Action::ClearFilters => {
                self.clear_filters();
                AppCommand::None
            }
            Action::RestartSelected => self.request_restart(),
            Action::OpenLogs => self.open_logs(),
            Action::CloseOverlay => {
                if self.logs.is_open() {
                    self.logs.close();
                    self.status = "Logs closed".to_string();
                }
                AppCommand::None
            }
            Action::DismissError => {
                if self.active == Page::Workloads && self.restarts.dismiss_error() {
                    self.status = "Error dismissed".to_string();
                }
                AppCommand::None
            }
            Action::SubmitInput => self.submit_input(),
            Action::CancelInput => {
                if self.mode == InputMode::Filter {
                    let previous = std::mem::take(&mut self.search_before_edit);
                    self.status = if previous.is_empty() {
                        "Search cancelled".to_string()
                    } else {
                        format!("Search restored: {previous}")
                    };
                    self.set_search(previous);
                } else {
                    self.status = "Input cancelled".to_string();
                }
                self.mode = InputMode::Normal;
                self.input.clear();
                AppCommand::None
            }
            Action::Backspace => {
                self.input.pop();
                self.sync_live_search();
                AppCommand::None
            }
            Action::DeleteWord => {
                while self.input.ends_with(' ') {
                    self.input.pop();
                }
                while !self.input.ends_with(' ') && !self.input.is_empty() {
                    self.input.pop();
                }
                self.sync_live_search();
                AppCommand::None
            }
            Action::InputChar(c) => {
                self.input.push(c);
                self.sync_live_search();
                AppCommand::None
            }
            Action::ConfirmYes | Action::ConfirmNo => {
                self.status = "No pending confirmation".to_string();
                AppCommand::None
            }
        }
    }

    pub fn activate(&mut self, page: Page) -> AppCommand {
        if page != self.active {
            if self.logs.is_open() {
                self.logs.close();
            }
            self.pending_confirmation = None;
            self.active = page;
            self.activation_epoch = self.activation_epoch.wrapping_add(1);
            debug!(page = page.title(), epoch = self.activation_epoch, "page activated");
        }
        self.status = format!("Viewing {}", page.title());
        self.refresh(page)
    }

    pub fn refresh_active(&mut self) -> AppCommand {
        self.refresh(self.active)
    }

    pub fn refresh(&mut self, page: Page) -> AppCommand {
        let calls = page.fetch_calls(self.recent_events_limit);
        let token = self.controls_mut(page).fetch_mut().begin(calls.len());
        AppCommand::Refresh { page, token, calls }
    }

    pub fn on_poll_tick(&mut self, tick: PollTick) -> AppCommand {
        if tick.page != self.active || tick.epoch != self.activation_epoch || !tick.page.polls() {
            debug!(page = tick.page.title(), epoch = tick.epoch, "ignoring stale poll tick");
            return AppCommand::None;
        }
        self.refresh(tick.page)
    }

    pub fn apply_fetch(
        &mut self,
        page: Page,
        token: CycleToken,
        call: FetchCall,
        result: Result<Payload, ApiError>,
    ) {
        let fresh = self
            .controls_mut(page)
            .fetch_mut()
            .settle(token, call, result.is_ok());

        match result {
            Ok(payload) if fresh => self.apply_payload(page, payload),
            Ok(_) => {}
            Err(err) => {
                warn!(page = page.title(), ?call, error = %err, "refresh call failed");
            }
        }
    }

    fn apply_payload(&mut self, page: Page, payload: Payload) {
        match (page, payload) {
            (Page::Dashboard, Payload::Summary(summary)) => self.dashboard.summary = Some(summary),
            (Page::Dashboard, Payload::Events(events)) => {
                self.dashboard.recent_events.replace_records(events)
            }
            (Page::Pods, Payload::Pods(pods)) => self.pods.replace_records(pods),
            (Page::Nodes, Payload::Nodes(nodes)) => self.nodes.replace_records(nodes),
            (Page::NodeMetrics, Payload::NodeMetrics(metrics)) => {
                self.node_metrics.replace_records(metrics)
            }
            (Page::Workloads, Payload::Workloads(workloads)) => {
                self.workloads.replace_records(workloads)
            }
            (Page::Services, Payload::Services(services)) => {
                self.services.replace_records(services)
            }
            (Page::Events, Payload::Events(events)) => self.events.replace_records(events),
            (page, Payload::Namespaces(namespaces)) => {
                self.controls_mut(page).set_namespaces(namespaces)
            }
            (page, payload) => {
                debug!(page = page.title(), ?payload, "payload does not belong to page");
            }
        }
    }

    fn request_restart(&mut self) -> AppCommand {
        if self.active != Page::Workloads {
            self.status = "Restart is available on the Workloads page".to_string();
            return AppCommand::None;
        }
        let Some(key) = self.workloads.selected_key() else {
            self.status = "No workload selected".to_string();
            return AppCommand::None;
        };
        if self.restarts.is_in_flight(&key) {
            self.status = format!("{key} is already restarting");
            return AppCommand::None;
        }

        let prompt = format!("Restart {key}");
        self.status = format!("{prompt}? (y/n)");
        self.pending_confirmation = Some(PendingConfirmation { prompt, key });
        AppCommand::None
    }

    fn begin_restart(&mut self, key: WorkloadKey) -> AppCommand {
        if !self.restarts.try_begin(&key) {
            self.status = format!("{key} is already restarting");
            return AppCommand::None;
        }
        info!(workload = %key, "restart requested");
        self.status = format!("Restarting {key}");
        AppCommand::RestartWorkload { key }
    }

    pub fn finish_restart(&mut self, key: WorkloadKey, result: Result<(), ApiError>) -> AppCommand {
        match result {
            Ok(()) => {
                self.restarts.finish_ok(&key);
                info!(workload = %key, "restart accepted");
                self.set_status(format!("Restarted {key}"));
                self.refresh(Page::Workloads)
            }
            Err(err) => {
                let message = err
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Restart failed for {key}"));
                self.restarts.finish_err(&key, message.clone());
                self.set_status(format!("Restart failed: {message}"));
                AppCommand::None
            }
        }
    }

    fn open_logs(&mut self) -> AppCommand {
        if self.active != Page::Pods {
            self.status = "Logs are available on the Pods page".to_string();
            return AppCommand::None;
        }
        let Some(target) = self.pods.selected_key() else {
            self.status = "No pod selected".to_string();
            return AppCommand::None;
        };
        let request = self.logs.open(target);
        self.status = format!("Loading logs for {}", request.target);
        AppCommand::LoadPodLogs { request }
    }

    pub fn finish_logs(&mut self, token: LogToken, result: Result<String, ApiError>) {
        let result = result.map_err(|err| {
            warn!(error = %err, "log fetch failed");
            err.user_message()
        });
        if self.logs.resolve(token, result) && !self.logs.failed() {
            self.status = "Logs loaded".to_string();
        }
    }

    fn sort_focused(&mut self) {
        let controls = self.active_controls_mut();
        if !controls.table().sortable() {
            self.status = format!("{} is not sortable", self.active.title());
            return;
        }
        if !controls.activate_header() {
            self.status = "Column is not sortable".to_string();
            return;
        }
        self.describe_sort();
    }

    fn describe_sort(&mut self) {
        let description = self
            .active_controls()
            .table()
            .sort()
            .map(|sort| format!("Sorted by {} {}", sort.key, sort.direction.arrow()));
        if let Some(description) = description {
            self.status = description;
        }
    }

    fn cycle_namespace(&mut self) {
        if !self.active.filters().namespace {
            self.status = format!("{} has no namespace filter", self.active.title());
            return;
        }
        let controls = self.active_controls_mut();
        let next = controls.filter().namespace.cycle(controls.namespace_options());
        controls.filter_mut().namespace = next;
        controls.clamp_selection();
        self.status = format!("Namespace: {}", self.active_controls().filter().namespace);
    }

    fn cycle_category(&mut self) {
        let Some(label) = self.active.filters().category else {
            self.status = format!("{} has no category filter", self.active.title());
            return;
        };
        let controls = self.active_controls_mut();
        let options = controls.category_options();
        let next = controls.filter().category.cycle(&options);
        controls.filter_mut().category = next;
        controls.clamp_selection();
        self.status = format!("{label}: {}", self.active_controls().filter().category);
    }

    fn clear_filters(&mut self) {
        let controls = self.active_controls_mut();
        controls.filter_mut().clear();
        controls.clamp_selection();
        self.status = "Filters cleared".to_string();
    }

    fn set_search(&mut self, search: String) {
        let controls = self.active_controls_mut();
        controls.filter_mut().search = search;
        controls.clamp_selection();
    }

    fn sync_live_search(&mut self) {
        if self.mode == InputMode::Filter {
            let search = self.input.clone();
            self.set_search(search);
        }
    }

    fn submit_input(&mut self) -> AppCommand {
        match self.mode {
            InputMode::Normal => AppCommand::None,
            InputMode::Filter => {
                let search = self.input.trim().to_string();
                self.mode = InputMode::Normal;
                self.input.clear();
                self.status = if search.is_empty() {
                    "Search cleared".to_string()
                } else {
                    format!("Search: '{search}'")
                };
                self.set_search(search);
                AppCommand::None
            }
            InputMode::Command => {
                let command = self.input.trim().to_string();
                self.mode = InputMode::Normal;
                self.input.clear();
                self.execute_command_line(&command)
            }
        }
    }

    fn execute_command_line(&mut self, line: &str) -> AppCommand {
        let line = line.trim_start_matches(':').trim();
        if line.is_empty() {
            self.status = "No command entered".to_string();
            return AppCommand::None;
        }

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default().to_ascii_lowercase();
        let argument = parts.next();

        match command.as_str() {
            "q" | "quit" | "exit" => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            "r" | "refresh" | "reload" => self.refresh_active(),
            "help" | "h" => {
                self.show_help = true;
                AppCommand::None
            }
            "clear" => {
                self.clear_filters();
                AppCommand::None
            }
            "ns" | "namespace" => {
                if !self.active.filters().namespace {
                    self.status = format!("{} has no namespace filter", self.active.title());
                    return AppCommand::None;
                }
                let selector = Selector::from_choice(argument.unwrap_or("all"));
                self.status = format!("Namespace: {selector}");
                let controls = self.active_controls_mut();
                controls.filter_mut().namespace = selector;
                controls.clamp_selection();
                AppCommand::None
            }
            "kind" | "type" => {
                let Some(label) = self.active.filters().category else {
                    self.status = format!("{} has no {command} filter", self.active.title());
                    return AppCommand::None;
                };
                let selector = Selector::from_choice(argument.unwrap_or("all"));
                self.status = format!("{label}: {selector}");
                let controls = self.active_controls_mut();
                controls.filter_mut().category = selector;
                controls.clamp_selection();
                AppCommand::None
            }
            "sort" => {
                let Some(argument) = argument else {
                    self.status = "Usage: :sort <column>".to_string();
                    return AppCommand::None;
                };
                let controls = self.active_controls_mut();
                let Some(key) = controls.column_key(argument) else {
                    self.status = format!("Unknown column '{argument}'");
                    return AppCommand::None;
                };
                if controls.sort_by(key) {
                    self.describe_sort();
                } else {
                    self.status = format!("Column '{key}' is not sortable here");
                }
                AppCommand::None
            }
            other => match Page::from_token(other) {
                Some(page) => self.activate(page),
                None => {
                    self.status = format!("Unknown command '{other}'");
                    AppCommand::None
                }
            },
        }
    }

    fn set_status(&mut self, status: String) {
        self.status = normalize_status_text(status);
    }
}

fn normalize_status_text(status: String) -> String {
    if status.chars().count() <= MAX_STATUS_LEN {
        return status;
    }

    let mut shortened = status
        .chars()
        .take(MAX_STATUS_LEN.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::{ApiHealth, App, AppCommand, AppSettings, InputMode};
    use crate::api::{ApiError, FetchCall, Payload};
    use crate::fetch::PollTick;
    use crate::filter::Selector;
    use crate::input::Action;
    use crate::model::{Namespace, NodeMetric, Pod, PodKey, Workload, WorkloadKey};
    use crate::pages::{Page, TableControls};
    use crate::table::GridView;

    fn app_on(page: Page) -> App {
        App::new(AppSettings {
            start_page: page,
            ..AppSettings::default()
        })
    }

    fn load(app: &mut App, page: Page, payloads: Vec<Payload>) {
        let AppCommand::Refresh { token, calls, .. } = app.refresh(page) else {
            panic!("expected refresh command");
        };
        let mut payloads = payloads.into_iter();
        for call in calls {
            let payload = payloads
                .next()
                .unwrap_or_else(|| Payload::Namespaces(Vec::new()));
            app.apply_fetch(page, token, call, Ok(payload));
        }
    }

    fn workload(namespace: &str, name: &str, kind: &str) -> Workload {
        Workload {
            name: name.to_string(),
            namespace: namespace.to_string(),
            kind: kind.to_string(),
            ready: "1/1".to_string(),
            ..Workload::default()
        }
    }

    fn pod(namespace: &str, name: &str) -> Pod {
        Pod {
            name: name.to_string(),
            namespace: namespace.to_string(),
            status: "Running".to_string(),
            ..Pod::default()
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.apply_action(Action::InputChar(c));
        }
    }

    fn status_error(message: &str) -> ApiError {
        ApiError::Status {
            path: "/api/workloads/prod/api/Deployment/restart".to_string(),
            status: 500,
            message: Some(message.to_string()),
        }
    }

    #[test]
    fn restart_failure_fills_banner_and_clears_in_flight() {
        let mut app = app_on(Page::Workloads);
        load(
            &mut app,
            Page::Workloads,
            vec![Payload::Workloads(vec![workload("prod", "api", "Deployment")])],
        );

        assert_eq!(app.apply_action(Action::RestartSelected), AppCommand::None);
        assert!(app.pending_confirmation_prompt().is_some());

        let key = WorkloadKey::new("prod", "api", "Deployment");
        let command = app.apply_action(Action::ConfirmYes);
        assert_eq!(command, AppCommand::RestartWorkload { key: key.clone() });
        assert!(app.restarts().is_in_flight(&key));

        let follow_up = app.finish_restart(key.clone(), Err(status_error("quota exceeded")));
        assert_eq!(follow_up, AppCommand::None);
        assert_eq!(app.error_banner(), Some("quota exceeded"));
        assert!(!app.restarts().is_in_flight(&key));
        assert_eq!(app.workloads().records().len(), 1);
    }

    #[test]
    fn restart_without_server_message_uses_fallback() {
        let mut app = app_on(Page::Workloads);
        let key = WorkloadKey::new("prod", "api", "Deployment");
        app.begin_restart(key.clone());
        let err = ApiError::Status {
            path: "/x".to_string(),
            status: 502,
            message: None,
        };
        app.finish_restart(key, Err(err));
        assert_eq!(
            app.error_banner(),
            Some("Restart failed for Deployment prod/api")
        );

        app.apply_action(Action::DismissError);
        assert_eq!(app.error_banner(), None);
    }

    #[test]
    fn restart_success_triggers_full_refresh() {
        let mut app = app_on(Page::Workloads);
        let key = WorkloadKey::new("prod", "api", "Deployment");
        app.begin_restart(key.clone());

        let command = app.finish_restart(key.clone(), Ok(()));
        let AppCommand::Refresh { page, calls, .. } = command else {
            panic!("expected refresh after restart");
        };
        assert_eq!(page, Page::Workloads);
        assert_eq!(calls, vec![FetchCall::Workloads, FetchCall::Namespaces]);
        assert!(!app.restarts().is_in_flight(&key));
    }

    #[test]
    fn double_restart_is_rejected_while_in_flight() {
        let mut app = app_on(Page::Workloads);
        let key = WorkloadKey::new("prod", "api", "Deployment");
        assert!(matches!(
            app.begin_restart(key.clone()),
            AppCommand::RestartWorkload { .. }
        ));
        assert_eq!(app.begin_restart(key), AppCommand::None);
    }

    #[test]
    fn declining_confirmation_issues_nothing() {
        let mut app = app_on(Page::Workloads);
        load(
            &mut app,
            Page::Workloads,
            vec![Payload::Workloads(vec![workload("prod", "api", "Deployment")])],
        );
        app.apply_action(Action::RestartSelected);
        assert_eq!(app.apply_action(Action::ConfirmNo), AppCommand::None);
        assert!(!app.restarts().any_in_flight());
    }

    #[test]
    fn opening_logs_marks_loading_before_response() {
        let mut app = app_on(Page::Pods);
        load(
            &mut app,
            Page::Pods,
            vec![Payload::Pods(vec![pod("default", "web-1")])],
        );

        let command = app.apply_action(Action::OpenLogs);
        let AppCommand::LoadPodLogs { request } = command else {
            panic!("expected log request");
        };
        assert_eq!(request.target, PodKey::new("default", "web-1"));
        assert_eq!(request.tail, 100);
        assert!(app.logs().is_loading());
        assert_eq!(app.logs().text(), "");

        app.finish_logs(request.token, Ok("line 1\nline 2".to_string()));
        assert!(!app.logs().is_loading());
        assert_eq!(app.logs().text(), "line 1\nline 2");
    }

    #[test]
    fn log_failure_shows_inline_text() {
        let mut app = app_on(Page::Pods);
        load(&mut app, Page::Pods, vec![Payload::Pods(vec![pod("default", "web-1")])]);
        let AppCommand::LoadPodLogs { request } = app.apply_action(Action::OpenLogs) else {
            panic!("expected log request");
        };
        app.finish_logs(request.token, Err(status_error("container not found")));
        assert_eq!(app.logs().text(), "Failed to load logs: container not found");
        assert_eq!(app.error_banner(), None);
    }

    #[test]
    fn leaving_page_closes_logs_and_invalidates_poll_ticks() {
        let mut app = app_on(Page::NodeMetrics);
        let epoch = app.activation_epoch();
        let tick = PollTick {
            page: Page::NodeMetrics,
            epoch,
        };
        assert!(matches!(app.on_poll_tick(tick), AppCommand::Refresh { .. }));

        app.activate(Page::Pods);
        assert_eq!(app.on_poll_tick(tick), AppCommand::None);

        load(&mut app, Page::Pods, vec![Payload::Pods(vec![pod("default", "web-1")])]);
        app.apply_action(Action::OpenLogs);
        assert!(app.logs().is_open());
        app.apply_action(Action::NextPage);
        assert!(!app.logs().is_open());
    }

    #[test]
    fn stale_refresh_cycle_is_ignored() {
        let mut app = app_on(Page::Pods);
        let AppCommand::Refresh { token: old, .. } = app.refresh(Page::Pods) else {
            panic!("expected refresh");
        };
        let AppCommand::Refresh { token: new, .. } = app.refresh(Page::Pods) else {
            panic!("expected refresh");
        };

        app.apply_fetch(
            Page::Pods,
            new,
            FetchCall::Pods,
            Ok(Payload::Pods(vec![pod("default", "new")])),
        );
        app.apply_fetch(
            Page::Pods,
            old,
            FetchCall::Pods,
            Ok(Payload::Pods(vec![pod("default", "old")])),
        );
        assert_eq!(app.pods().records()[0].name, "new");
    }

    #[test]
    fn slow_metrics_cycle_lands_after_next_poll_tick() {
        let mut app = app_on(Page::NodeMetrics);
        let AppCommand::Refresh { token: slow, .. } = app.refresh_active() else {
            panic!("expected refresh");
        };
        let tick = PollTick {
            page: Page::NodeMetrics,
            epoch: app.activation_epoch(),
        };
        let AppCommand::Refresh { token: next, .. } = app.on_poll_tick(tick) else {
            panic!("expected poll refresh");
        };

        let metric = |name: &str, cpu: f64| NodeMetric {
            name: name.to_string(),
            cpu_usage: cpu,
            memory_usage: 1024.0,
        };
        app.apply_fetch(
            Page::NodeMetrics,
            slow,
            FetchCall::NodeMetrics,
            Ok(Payload::NodeMetrics(vec![metric("node-a", 250.0)])),
        );
        assert_eq!(app.controls(Page::NodeMetrics).total_len(), 1);
        assert_eq!(app.grid().row_count(), 1);

        app.apply_fetch(
            Page::NodeMetrics,
            next,
            FetchCall::NodeMetrics,
            Ok(Payload::NodeMetrics(vec![
                metric("node-a", 300.0),
                metric("node-b", 100.0),
            ])),
        );
        assert_eq!(app.controls(Page::NodeMetrics).total_len(), 2);

        app.apply_fetch(
            Page::NodeMetrics,
            slow,
            FetchCall::NodeMetrics,
            Ok(Payload::NodeMetrics(Vec::new())),
        );
        assert_eq!(app.controls(Page::NodeMetrics).total_len(), 2);
    }

    #[test]
    fn read_failure_keeps_previous_collection() {
        let mut app = app_on(Page::Pods);
        load(&mut app, Page::Pods, vec![Payload::Pods(vec![pod("default", "web-1")])]);

        let AppCommand::Refresh { token, .. } = app.refresh(Page::Pods) else {
            panic!("expected refresh");
        };
        let err = ApiError::Status {
            path: "/api/pods".to_string(),
            status: 503,
            message: None,
        };
        app.apply_fetch(Page::Pods, token, FetchCall::Pods, Err(err));
        assert_eq!(app.pods().records().len(), 1);
        assert_eq!(app.error_banner(), None);
    }

    #[test]
    fn live_search_filters_while_typing() {
        let mut app = app_on(Page::Pods);
        load(
            &mut app,
            Page::Pods,
            vec![Payload::Pods(vec![
                pod("default", "web-1"),
                pod("kube-system", "coredns"),
            ])],
        );
        app.apply_action(Action::StartFilter);
        assert_eq!(app.mode(), InputMode::Filter);
        type_text(&mut app, "dns");
        assert_eq!(app.pods().visible().len(), 1);

        app.apply_action(Action::CancelInput);
        assert_eq!(app.pods().visible().len(), 2);
    }

    #[test]
    fn cancelling_search_edit_restores_previous_search() {
        let mut app = app_on(Page::Pods);
        load(
            &mut app,
            Page::Pods,
            vec![Payload::Pods(vec![
                pod("default", "web-1"),
                pod("kube-system", "coredns"),
            ])],
        );
        app.apply_action(Action::StartFilter);
        type_text(&mut app, "web");
        app.apply_action(Action::SubmitInput);
        assert_eq!(app.pods().visible().len(), 1);

        app.apply_action(Action::StartFilter);
        assert_eq!(app.input(), "web");
        type_text(&mut app, "x");
        assert_eq!(app.pods().visible().len(), 0);

        app.apply_action(Action::CancelInput);
        assert_eq!(app.mode(), InputMode::Normal);
        assert_eq!(app.active_controls().filter().search, "web");
        assert_eq!(app.pods().visible().len(), 1);
    }

    #[test]
    fn namespace_command_and_cycle() {
        let mut app = app_on(Page::Pods);
        load(
            &mut app,
            Page::Pods,
            vec![
                Payload::Pods(vec![pod("default", "a"), pod("kube-system", "b")]),
                Payload::Namespaces(vec![
                    Namespace {
                        name: "default".to_string(),
                        ..Namespace::default()
                    },
                    Namespace {
                        name: "kube-system".to_string(),
                        ..Namespace::default()
                    },
                ]),
            ],
        );

        app.apply_action(Action::StartCommand);
        type_text(&mut app, "ns kube-system");
        app.apply_action(Action::SubmitInput);
        assert_eq!(
            app.pods().filter().namespace,
            Selector::Exact("kube-system".to_string())
        );
        assert_eq!(app.pods().visible().len(), 1);

        app.apply_action(Action::CycleNamespace);
        assert_eq!(app.pods().filter().namespace, Selector::All);
    }

    #[test]
    fn header_sort_only_on_sortable_pages() {
        let mut app = app_on(Page::Workloads);
        app.apply_action(Action::SortFocused);
        assert!(app.workloads().sort().is_none());

        let mut app = app_on(Page::Pods);
        app.apply_action(Action::StartCommand);
        type_text(&mut app, "sort restarts");
        app.apply_action(Action::SubmitInput);
        assert_eq!(app.pods().sort().map(|sort| sort.key), Some("restarts"));
    }

    #[test]
    fn grid_marks_restarting_row() {
        let mut app = app_on(Page::Workloads);
        load(
            &mut app,
            Page::Workloads,
            vec![Payload::Workloads(vec![
                workload("prod", "api", "Deployment"),
                workload("prod", "worker", "Deployment"),
            ])],
        );
        app.begin_restart(WorkloadKey::new("prod", "api", "Deployment"));

        let GridView::Populated { rows, .. } = app.grid() else {
            panic!("expected rows");
        };
        let actions = rows
            .iter()
            .map(|row| row.last().map(|cell| cell.text.clone()).unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(actions, vec!["restarting…".to_string(), "R restart".to_string()]);
    }

    #[test]
    fn health_check_updates_header_state() {
        let mut app = app_on(Page::Dashboard);
        assert_eq!(app.health(), &ApiHealth::Unknown);
        app.set_health(Ok("ok".to_string()));
        assert_eq!(app.health(), &ApiHealth::Healthy("ok".to_string()));

        app.set_health(Err(ApiError::Status {
            path: "/api/health".to_string(),
            status: 503,
            message: None,
        }));
        assert!(matches!(app.health(), ApiHealth::Unreachable(_)));
        assert!(app.status().starts_with("API unreachable"));
    }

    #[test]
    fn page_command_switches_page() {
        let mut app = app_on(Page::Dashboard);
        app.apply_action(Action::StartCommand);
        type_text(&mut app, "svc");
        let command = app.apply_action(Action::SubmitInput);
        assert_eq!(app.active_page(), Page::Services);
        assert!(matches!(
            command,
            AppCommand::Refresh {
                page: Page::Services,
                ..
            }
        ));
    }
}
