use std::{
    io,
    sync::mpsc::{Receiver, TryRecvError},
    time::Duration,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame, Terminal,
};

use crate::app::App;
use crate::constants::INPUT_POLL_MS;
use crate::stream::{ConnectionState, StreamEvent};
use crate::util::{format_clock, format_kb};

pub fn run(app: App, events: Receiver<StreamEvent>) -> io::Result<()> {
    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app_loop(
        app,
        events,
        |timeout| {
            if event::poll(timeout)? {
                event::read().map(Some)
            } else {
                Ok(None)
            }
        },
        |app| terminal.draw(|f| draw(f, app)).map(|_| ()),
    );

    // Cleanup, even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

/// Single-writer loop: apply one stream event per pass and render after
/// each, so rapid samples are never coalesced into one frame.
///
/// `input` waits up to the given timeout for a terminal event; `render`
/// puts the current state on screen.
fn run_app_loop<I, R>(
    mut app: App,
    events: Receiver<StreamEvent>,
    mut input: I,
    mut render: R,
) -> io::Result<()>
where
    I: FnMut(Duration) -> io::Result<Option<Event>>,
    R: FnMut(&App) -> io::Result<()>,
{
    let idle_poll = Duration::from_millis(INPUT_POLL_MS);
    let mut stream_done = false;

    loop {
        if app.take_redraw() {
            render(&app)?;
        }

        let mut timeout = idle_poll;
        if !stream_done {
            match events.try_recv() {
                Ok(event) => {
                    app.apply(event);
                    timeout = Duration::ZERO;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => stream_done = true,
            }
        }

        // Handle input
        match input(timeout)? {
            Some(Event::Key(key)) if is_quit(&key) => return Ok(()),
            Some(Event::Resize(..)) => app.request_redraw(),
            _ => {}
        }
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(1)].as_ref())
        .split(f.size());

    let mem_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", app.plot.title))
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(mem_block.clone(), main_chunks[0]);

    let inner_area = mem_block.inner(main_chunks[0]);
    let panel_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(75), Constraint::Percentage(25)].as_ref())
        .split(inner_area);

    draw_chart(f, panel_chunks[0], app);
    draw_stats(f, panel_chunks[1], app);
    draw_status(f, main_chunks[1], app);
}

fn draw_chart(f: &mut Frame, area: Rect, app: &App) {
    if app.window().is_empty() {
        let p = Paragraph::new("Waiting for samples...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title(" Memory ").title_style(Style::default().fg(Color::Green)));
        f.render_widget(p, area);
        return;
    }

    let data = app.points();
    let [x_lo, x_hi] = app.x_bounds();
    let [y_lo, y_hi] = app.y_bounds();

    let datasets = vec![Dataset::default()
        .name(app.plot.series_label)
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&data)];

    let chart = Chart::new(datasets)
        .block(Block::default().title(" Memory ").title_style(Style::default().fg(Color::Green)))
        .x_axis(
            Axis::default()
                .title(app.plot.x_title)
                .style(Style::default().fg(Color::DarkGray))
                .bounds([x_lo, x_hi])
                .labels(vec![
                    Span::raw(format_clock(x_lo)),
                    Span::raw(format_clock((x_lo + x_hi) / 2.0)),
                    Span::raw(format_clock(x_hi)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(app.plot.y_title)
                .style(Style::default().fg(Color::DarkGray))
                .bounds([y_lo, y_hi])
                .labels(vec![
                    Span::raw(format_kb(y_lo)),
                    Span::raw(format_kb(y_hi / 2.0)),
                    Span::raw(format_kb(y_hi)),
                ]),
        );
    f.render_widget(chart, area);
}

fn draw_stats(f: &mut Frame, area: Rect, app: &App) {
    let window = app.window();
    let latest = window.latest().map(|s| format_kb(s.memory_kb)).unwrap_or_else(|| "-".to_string());
    let (peak, peak_time) = match app.peak() {
        Some((kb, at)) => (
            format_kb(kb),
            at.map(|t| t.format("%H:%M:%S").to_string()).unwrap_or_else(|| "-".to_string()),
        ),
        None => ("-".to_string(), "-".to_string()),
    };
    let average = window.average_kb().map(format_kb).unwrap_or_else(|| "-".to_string());

    let text = vec![
        Line::from(vec![Span::raw("● "), Span::styled(latest, Style::default().fg(Color::White).add_modifier(Modifier::BOLD))]),
        Line::from(vec![Span::styled("  Peak: ", Style::default().fg(Color::DarkGray)), Span::raw(peak)]),
        Line::from(vec![Span::styled("        ", Style::default()), Span::styled(format!("(@{})", peak_time), Style::default().fg(Color::DarkGray))]),
        Line::from(vec![Span::styled("  Avg:  ", Style::default().fg(Color::DarkGray)), Span::raw(average)]),
        Line::from(vec![Span::styled("  Win:  ", Style::default().fg(Color::DarkGray)), Span::raw(format!("{}/{}", window.len(), window.capacity()))]),
        Line::from(vec![Span::styled("  Seen: ", Style::default().fg(Color::DarkGray)), Span::raw(app.accepted().to_string())]),
    ];
    f.render_widget(Paragraph::new(text).block(Block::default().style(Style::default().fg(Color::Green))), area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let state = app.connection();
    let state_color = match state {
        ConnectionState::Connecting => Color::Yellow,
        ConnectionState::Open => Color::Green,
        ConnectionState::Closed => Color::Gray,
        ConnectionState::Errored => Color::Red,
    };

    let mut spans = vec![
        Span::styled(" STREAM ", Style::default().bg(Color::White).fg(Color::Black).add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::styled(state.label(), Style::default().fg(state_color).add_modifier(Modifier::BOLD)),
    ];
    if let Some(err) = app.last_error() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(err.to_string(), Style::default().fg(Color::Red)));
    }
    spans.push(Span::raw(" | Press 'q' to quit"));

    let status_bar = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::Rgb(20, 20, 20)));
    f.render_widget(status_bar, area);
}
