mod actions;
mod api;
mod app;
mod cli;
mod columns;
mod config;
mod fetch;
mod filter;
mod input;
mod logs;
mod model;
mod pages;
mod table;
mod ui;

use anyhow::{Context, Result};
use api::{ApiClient, ApiError, FetchCall, Payload};
use app::{App, AppCommand};
use clap::Parser;
use cli::CliArgs;
use config::ConsoleConfig;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use fetch::{CycleToken, PollTick, Poller};
use futures::StreamExt;
use logs::LogToken;
use model::WorkloadKey;
use pages::Page;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

#[derive(Debug)]
enum LoopEvent {
    Fetched {
        page: Page,
        token: CycleToken,
        call: FetchCall,
        result: Result<Payload, ApiError>,
    },
    Restarted {
        key: WorkloadKey,
        result: Result<(), ApiError>,
    },
    Logs {
        token: LogToken,
        result: Result<String, ApiError>,
    },
    Health(Result<String, ApiError>),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let config = ConsoleConfig::load(&args)?;
    info!(
        source = config.source.as_deref().unwrap_or("defaults"),
        api_url = %config.api_url,
        "configuration loaded"
    );

    let client = ApiClient::new(&config.api_url, config.request_timeout)?;
    debug!(base_url = client.base_url(), timeout = ?config.request_timeout, "api client ready");
    let mut app = App::new(config.app_settings());

    run(&mut app, &client, config.metrics_interval).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::sink).try_init();
        }
    }

    Ok(())
}

async fn run(app: &mut App, client: &ApiClient, metrics_interval: Duration) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, client, metrics_interval).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    client: &ApiClient,
    metrics_interval: Duration,
) -> Result<()> {
    let mut reader = EventStream::new();
    let (loop_tx, mut loop_rx) = mpsc::unbounded_channel::<LoopEvent>();
    let (poll_tx, mut poll_rx) = mpsc::unbounded_channel::<PollTick>();
    let mut poller = Poller::new(metrics_interval, poll_tx);

    spawn_health_check(client, &loop_tx);
    let initial = app.refresh_active();
    dispatch(client, &loop_tx, initial);
    poller.sync(app.active_page(), app.activation_epoch());

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action);
                            dispatch(client, &loop_tx, command);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        debug!(%error, "terminal event error");
                    }
                    None => break,
                }
            }
            Some(event) = loop_rx.recv() => {
                let command = handle_loop_event(app, event);
                dispatch(client, &loop_tx, command);
            }
            Some(tick) = poll_rx.recv() => {
                let command = app.on_poll_tick(tick);
                dispatch(client, &loop_tx, command);
            }
        }

        poller.sync(app.active_page(), app.activation_epoch());
    }

    Ok(())
}

fn handle_loop_event(app: &mut App, event: LoopEvent) -> AppCommand {
    match event {
        LoopEvent::Fetched {
            page,
            token,
            call,
            result,
        } => {
            app.apply_fetch(page, token, call, result);
            AppCommand::None
        }
        LoopEvent::Restarted { key, result } => app.finish_restart(key, result),
        LoopEvent::Logs { token, result } => {
            app.finish_logs(token, result);
            AppCommand::None
        }
        LoopEvent::Health(result) => {
            app.set_health(result);
            AppCommand::None
        }
    }
}

fn dispatch(client: &ApiClient, tx: &UnboundedSender<LoopEvent>, command: AppCommand) {
    match command {
        AppCommand::None => {}
        AppCommand::Refresh { page, token, calls } => {
            debug!(page = page.title(), cycle = token.generation(), "refresh cycle");
            for call in calls {
                let client = client.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = client.fetch(call).await;
                    let _ = tx.send(LoopEvent::Fetched {
                        page,
                        token,
                        call,
                        result,
                    });
                });
            }
        }
        AppCommand::RestartWorkload { key } => {
            let client = client.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = client.restart_workload(&key).await;
                let _ = tx.send(LoopEvent::Restarted { key, result });
            });
        }
        AppCommand::LoadPodLogs { request } => {
            let client = client.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = client.pod_logs(&request.target, request.tail).await;
                let _ = tx.send(LoopEvent::Logs {
                    token: request.token,
                    result,
                });
            });
        }
    }
}

fn spawn_health_check(client: &ApiClient, tx: &UnboundedSender<LoopEvent>) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.health().await.map(|health| health.status);
        let _ = tx.send(LoopEvent::Health(result));
    });
}
