use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use crate::app::{ApiHealth, App, InputMode};
use crate::columns::Stat;
use crate::pages::Page;
use crate::table::{GridView, HeaderView, Tone};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const INFO: Color = Color::Rgb(125, 211, 252);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);

pub fn render(frame: &mut Frame, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    render_body(frame, root[1], app);
    render_footer(frame, root[2], app);

    if app.logs().is_open() {
        render_log_modal(frame, app);
    }
    if app.show_help() {
        render_help_modal(frame, app);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let left_line = build_left_header_line(app);
    let right_line = build_right_header_line(app);
    let right_width = spans_width(&right_line.spans) as u16;
    if area.width < 42 || right_width == 0 || right_width >= area.width {
        frame.render_widget(
            Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(right_line).style(Style::default().bg(BG)),
        chunks[1],
    );
}

fn build_left_header_line(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " KUBELENS ", Color::Black, ACCENT, BG);
    spans.push(Span::raw(" "));
    for (index, page) in Page::ALL.iter().enumerate() {
        let active = *page == app.active_page();
        let label = format!(" {}:{} ", index + 1, page.short_token());
        let style = if active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Rgb(59, 130, 246))
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED)
        };
        spans.push(Span::styled(label, style));
    }
    Line::from(spans)
}

fn build_right_header_line(app: &App) -> Line<'static> {
    let (icon, fg) = match app.health() {
        ApiHealth::Unknown => ("…", MUTED),
        ApiHealth::Healthy(_) => ("●", ACCENT),
        ApiHealth::Unreachable(_) => ("●", ERROR),
    };
    let endpoint = display_endpoint(app.api_url());
    Line::from(vec![
        Span::styled(format!("{icon} "), Style::default().fg(fg)),
        Span::styled(
            format!("{} ", compact_text(&endpoint, 40)),
            Style::default().fg(MUTED),
        ),
    ])
}

fn render_body(frame: &mut Frame, area: Rect, app: &mut App) {
    if app.active_page() == Page::Dashboard {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(3)])
            .split(area);
        render_summary_cards(frame, chunks[0], app);
        app.set_table_page_size(table_rows_visible(chunks[1]));
        let grid = app.grid();
        let title = format!("Recent Events ({})", grid.row_count());
        render_grid(frame, chunks[1], app, grid, title);
        return;
    }

    let mut constraints = vec![Constraint::Length(1)];
    if app.error_banner().is_some() {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(3));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    render_filter_bar(frame, chunks[0], app);
    if let Some(message) = app.error_banner() {
        render_error_banner(frame, chunks[1], message);
    }
    let table_area = chunks[chunks.len() - 1];
    app.set_table_page_size(table_rows_visible(table_area));

    let controls = app.active_controls();
    let title = format!(
        "{} ({}/{})",
        app.active_page().title(),
        controls.visible_len(),
        controls.total_len()
    );
    render_grid(frame, table_area, app, app.grid(), title);
}

fn render_summary_cards(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let cards = match app.summary() {
        Some(summary) => [
            (
                "Pods",
                format!("{}/{}", summary.running_pods, summary.total_pods),
                "running",
            ),
            (
                "Nodes",
                format!("{}/{}", summary.ready_nodes, summary.total_nodes),
                "ready",
            ),
            ("Services", summary.total_services.to_string(), "total"),
            ("Workloads", summary.total_workloads.to_string(), "total"),
        ],
        None => [
            ("Pods", "-".to_string(), "running"),
            ("Nodes", "-".to_string(), "ready"),
            ("Services", "-".to_string(), "total"),
            ("Workloads", "-".to_string(), "total"),
        ],
    };

    for ((title, value, caption), area) in cards.into_iter().zip(chunks.iter()) {
        let text = vec![
            Line::from(Span::styled(
                value,
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(caption, Style::default().fg(MUTED))),
        ];
        let card = Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(MUTED))
                .style(Style::default().bg(PANEL)),
        );
        frame.render_widget(card, *area);
    }
}

fn render_filter_bar(frame: &mut Frame, area: Rect, app: &App) {
    let page = app.active_page();
    let controls = app.active_controls();
    let support = page.filters();
    let filter = controls.filter();

    let mut spans = Vec::new();
    if support.search {
        let search = if filter.search.is_empty() {
            "-".to_string()
        } else {
            compact_text(&filter.search, 24)
        };
        spans.push(chip("search", search));
    }
    if support.namespace {
        spans.push(chip("ns", filter.namespace.to_string()));
    }
    if let Some(label) = support.category {
        spans.push(chip(label, filter.category.to_string()));
    }

    if !filter.is_inactive() {
        spans.push(Span::styled(" c clear", Style::default().fg(MUTED)));
    }

    spans.push(Span::raw("  "));
    for stat in controls.stats() {
        spans.extend(stat_spans(&stat));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn chip(label: &str, value: String) -> Span<'static> {
    Span::styled(
        format!(" {label}:{value} "),
        Style::default().fg(Color::White).bg(PL_C),
    )
}

fn stat_spans(stat: &Stat) -> [Span<'static>; 2] {
    [
        Span::styled(format!(" {} ", stat.label), Style::default().fg(MUTED)),
        Span::styled(
            stat.value.to_string(),
            tone_style(stat.tone).add_modifier(Modifier::BOLD),
        ),
    ]
}

fn render_error_banner(frame: &mut Frame, area: Rect, message: &str) {
    let banner = Paragraph::new(Line::from(vec![
        Span::styled(message.to_string(), Style::default().fg(ERROR)),
        Span::styled("   x dismiss", Style::default().fg(MUTED)),
    ]))
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title("Error")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ERROR))
            .style(Style::default().bg(PANEL)),
    );
    frame.render_widget(banner, area);
}

fn render_grid(frame: &mut Frame, area: Rect, app: &App, grid: GridView, title: String) {
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(PANEL));

    let (headers, rows) = match grid {
        GridView::Loading => {
            render_placeholder(frame, area, block, "Loading…");
            return;
        }
        GridView::Empty => {
            render_placeholder(frame, area, block, "No resources found");
            return;
        }
        GridView::Populated { headers, rows } => (headers, rows),
    };

    let constraints = column_constraints(&headers);
    let header_row = Row::new(headers.iter().map(header_cell))
        .height(1)
        .style(Style::default().fg(ACCENT));
    let rows = rows.into_iter().map(|row| {
        Row::new(
            row.into_iter()
                .map(|cell| Cell::from(cell.text).style(tone_style(cell.tone))),
        )
    });

    let table = Table::new(rows, constraints)
        .header(header_row)
        .block(block)
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(24, 36, 58))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("› ");

    let mut state = TableState::default();
    state.select(Some(app.active_controls().selected()));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_placeholder(frame: &mut Frame, area: Rect, block: Block<'_>, message: &str) {
    let paragraph = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .block(block)
        .style(Style::default().fg(MUTED));
    frame.render_widget(paragraph, area);
}

fn header_cell(header: &HeaderView) -> Cell<'static> {
    let mut title = header.title.to_string();
    if let Some(direction) = header.sort {
        title.push(' ');
        title.push_str(direction.arrow());
    }
    let mut style = Style::default().add_modifier(Modifier::BOLD);
    if header.focused {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    Cell::from(title).style(style)
}

fn tone_style(tone: Tone) -> Style {
    let fg = match tone {
        Tone::Plain => Color::White,
        Tone::Muted => MUTED,
        Tone::Success => ACCENT,
        Tone::Warning => WARN,
        Tone::Error => ERROR,
        Tone::Info => INFO,
        Tone::Code => Color::Rgb(196, 181, 253),
    };
    Style::default().fg(fg)
}

fn render_log_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(86, 80, frame.area());
    frame.render_widget(Clear, area);

    let logs = app.logs();
    let title = logs
        .target()
        .map(|target| format!("Logs {target} (tail {})", logs.tail()))
        .unwrap_or_else(|| "Logs".to_string());
    let (text, style) = if logs.is_loading() {
        ("Loading logs…".to_string(), Style::default().fg(MUTED))
    } else if logs.failed() {
        (logs.text().to_string(), Style::default().fg(ERROR))
    } else if logs.text().is_empty() {
        ("No log output".to_string(), Style::default().fg(MUTED))
    } else {
        (logs.text().to_string(), Style::default().fg(Color::White))
    };

    // follow the tail: scroll so the last lines stay in view
    let inner_height = area.height.saturating_sub(2) as usize;
    let scroll = text.lines().count().saturating_sub(inner_height) as u16;
    let modal = Paragraph::new(Text::from(text))
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title(title)
                .title_bottom(" Esc close ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(style);
    frame.render_widget(modal, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    if matches!(app.mode(), InputMode::Normal) {
        let pending = app.pending_confirmation_prompt();
        let status_text = pending
            .map(|pending| format!("{pending}? (y/n)"))
            .unwrap_or_else(|| app.status().to_string());
        let (status_fg, status_bg) = if pending.is_some() {
            (Color::Black, WARN)
        } else {
            (Color::White, PL_B)
        };

        let mut spans = Vec::new();
        push_powerline_segment(&mut spans, " nrm ", Color::White, PL_A, status_bg);
        let width_hint = area.width.saturating_sub(24).min(120) as usize;
        push_powerline_segment(
            &mut spans,
            format!(" {} ", compact_text(&status_text, width_hint.max(24))),
            status_fg,
            status_bg,
            BG,
        );
        if app.restarts().any_in_flight() {
            spans.push(Span::styled(" restarting ", Style::default().fg(WARN)));
        }
        spans.push(Span::styled(" ? help", Style::default().fg(MUTED)));
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            area,
        );
        return;
    }

    let (label, prompt, prompt_bg) = match app.mode() {
        InputMode::Filter => (" flt ", format!("/{}", app.input()), WARN),
        InputMode::Command => (" cmd ", format!(":{}", app.input()), ACCENT),
        InputMode::Normal => return,
    };

    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, label, Color::Black, prompt_bg, PL_B);
    push_powerline_segment(&mut spans, format!(" {prompt} "), Color::White, PL_B, BG);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|span| span.content.chars().count()).sum()
}

fn render_help_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(72, 70, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(format!(
            "kubelens help  mode:{}  page:{}",
            help_mode_label(app.mode()),
            app.active_page().title()
        )),
        Line::from(""),
    ];
    for line in help_lines(app.active_page()) {
        lines.push(Line::from(line));
    }

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(modal, area);
}

fn help_lines(page: Page) -> Vec<String> {
    let mut lines = vec![
        "Pages: 1-7 jump  Tab/Right next  BackTab/Left previous".to_string(),
        "Rows: j/k move  gg/G top/bottom  Ctrl+d/Ctrl+u page".to_string(),
        "Filters: / search  N namespace  T kind/type  c clear".to_string(),
        "General: r refresh  : command  ? help  q quit".to_string(),
    ];
    if page.sortable() {
        lines.push("Sort: [ ] pick column  s toggle asc/desc".to_string());
    }
    match page {
        Page::Pods => lines.push("Pods: l/Enter open logs  Esc close".to_string()),
        Page::Workloads => lines.push("Workloads: R restart (y/n)  x dismiss error".to_string()),
        Page::NodeMetrics => lines.push("Metrics refresh automatically while shown".to_string()),
        _ => {}
    }
    lines.push(String::new());
    lines.push(
        "Commands: :q  :r  :ns <name|all>  :kind <v|all>  :type <v|all>  :sort <col>  :clear"
            .to_string(),
    );
    lines.push(format!(
        "Pages: {}",
        Page::ALL
            .iter()
            .map(|page| format!(":{}", page.short_token()))
            .collect::<Vec<_>>()
            .join("  ")
    ));
    lines
}

fn help_mode_label(mode: InputMode) -> &'static str {
    match mode {
        InputMode::Normal => "normal",
        InputMode::Filter => "search",
        InputMode::Command => "command",
    }
}

fn table_rows_visible(area: Rect) -> usize {
    area.height.saturating_sub(3).max(1) as usize
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn display_endpoint(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .to_string()
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn column_constraints(headers: &[HeaderView]) -> Vec<Constraint> {
    if headers.is_empty() {
        return vec![Constraint::Percentage(100)];
    }

    headers
        .iter()
        .map(|header| match header.width {
            Some(width) => Constraint::Length(width),
            None => Constraint::Fill(1),
        })
        .collect()
}
