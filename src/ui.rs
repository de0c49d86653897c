use std::error::Error;
use std::io;
use std::time::Duration as StdDuration;

use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use crossterm::{ExecutableCommand, execute};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Tabs};
use ratatui::{Frame, Terminal};
use tracing::{debug, warn};

use crate::context::AppContext;
use crate::display::{ButtonText, can_toggle, is_running, primary_button_text, resume_button_text};
use crate::entry::{ButtonDisplayMode, State, Timestamp};
use crate::reducer::{toggle, with_display_mode, with_label};
use crate::summary::{SummaryGrouping, pair_line};

const ACTIVE_TAB_COLOR: Color = Color::Yellow;
const RUNNING_COLOR: Color = Color::LightGreen;
const IDLE_COLOR: Color = Color::LightBlue;
const MUTED_COLOR: Color = Color::DarkGray;

pub fn run_dashboard(context: &mut AppContext, tick: StdDuration) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, context, tick);
	context.teardown();

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	context: &mut AppContext,
	tick: StdDuration,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::default();

	loop {
		let live_elapsed = context.tick();
		let view = build_view(&app, context.state(), live_elapsed, context.now());
		terminal.draw(|frame| draw_dashboard(frame, &app, &view))?;

		if event::poll(tick)? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::EditLabel(_) => handle_label_key(&mut app, key.code, context),
					InputMode::ConfirmClear => handle_confirm_key(&mut app, key.code, context),
					InputMode::Normal => handle_normal_key(&mut app, key.code, context),
				};

				if should_quit {
					debug!("dashboard closed");
					break;
				}
			}
		}
	}

	Ok(())
}

fn draw_dashboard(frame: &mut Frame, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Length(3),
			Constraint::Length(3),
			Constraint::Length(5),
			Constraint::Min(6),
			Constraint::Length(4),
		])
		.split(frame.area());

	render_mode_tabs(frame, layout[0], view.display_mode);
	render_label(frame, layout[1], app, view);
	render_button(frame, layout[2], view);
	render_summary(frame, layout[3], app, view);
	render_footer(frame, layout[4], app);
}

fn render_mode_tabs(frame: &mut Frame, area: Rect, display_mode: ButtonDisplayMode) {
	let titles = ButtonDisplayMode::ALL
		.iter()
		.map(|mode| Line::from(mode.title()))
		.collect::<Vec<_>>();
	let selected = ButtonDisplayMode::ALL
		.iter()
		.position(|mode| *mode == display_mode)
		.unwrap_or(0);
	let tabs = Tabs::new(titles)
		.select(selected)
		.highlight_style(Style::default().fg(ACTIVE_TAB_COLOR).add_modifier(Modifier::BOLD))
		.block(Block::default().borders(Borders::ALL).title("Display"));
	frame.render_widget(tabs, area);
}

fn render_label(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let line = match &app.mode {
		InputMode::EditLabel(input) => Line::from(vec![
			Span::raw(input.clone()),
			Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
		]),
		_ if view.label.is_empty() => {
			Line::from(Span::styled("Category", Style::default().fg(MUTED_COLOR)))
		}
		_ => Line::from(view.label.clone()),
	};

	let title = if view.running { "Label (locked while running)" } else { "Label" };
	let border = if matches!(app.mode, InputMode::EditLabel(_)) {
		Style::default().fg(ACTIVE_TAB_COLOR)
	} else {
		Style::default()
	};
	let label = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(title).border_style(border));
	frame.render_widget(label, area);
}

fn render_button(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let color = if view.running { RUNNING_COLOR } else { IDLE_COLOR };
	let mut lines = vec![Line::from(vec![
		Span::styled(
			format!("[ {} ]", view.button.action),
			Style::default().fg(color).add_modifier(Modifier::BOLD),
		),
		Span::raw("  "),
		Span::styled(view.button.display.clone(), Style::default().add_modifier(Modifier::BOLD)),
	])];

	if let Some(resume) = &view.resume {
		lines.push(Line::from(Span::styled(
			format!("{} at {}", resume.action, resume.display),
			Style::default().fg(MUTED_COLOR),
		)));
	}

	if view.label.is_empty() && !view.running {
		lines.push(Line::from(Span::styled(
			"type a label to enable the timer",
			Style::default().fg(MUTED_COLOR),
		)));
	}

	let button = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Timer"));
	frame.render_widget(button, area);
}

fn render_summary(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let mut items = Vec::new();
	for group in &view.groups {
		items.push(ListItem::new(Line::from(Span::styled(
			group.heading.clone(),
			Style::default().add_modifier(Modifier::BOLD),
		))));
		for pair in &group.pairs {
			items.push(ListItem::new(format!("  {pair}")));
		}
	}
	if items.is_empty() {
		items.push(ListItem::new("(no entries yet)"));
	}

	let title = format!("Summary ({})", app.grouping.title());
	let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
	frame.render_widget(list, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("space/Enter start/stop | e edit label | m/1/2/3 display | g grouping | C clear all | q quit"),
			Line::from(app.status.clone()),
		],
		InputMode::EditLabel(_) => vec![
			Line::from("Type a label"),
			Line::from("Enter save | Esc cancel"),
		],
		InputMode::ConfirmClear => vec![
			Line::from("Clear every entry? This cannot be undone."),
			Line::from("y confirm | any other key cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn handle_normal_key(app: &mut App, code: KeyCode, context: &mut AppContext) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => true,
		KeyCode::Char(' ') | KeyCode::Enter => {
			app.status = press_button(context);
			false
		}
		KeyCode::Char('e') => {
			let state = context.state();
			if is_running(state) {
				app.status = "stop the timer before changing the label".to_string();
			} else {
				app.mode = InputMode::EditLabel(state.current_label.clone());
			}
			false
		}
		KeyCode::Char('m') => {
			let next = context.state().display_mode.cycle();
			app.status = set_display_mode(context, next);
			false
		}
		KeyCode::Char(digit @ '1'..='3') => {
			let index = digit as usize - '1' as usize;
			app.status = set_display_mode(context, ButtonDisplayMode::ALL[index]);
			false
		}
		KeyCode::Char('g') => {
			app.grouping = app.grouping.toggle();
			app.status = format!("grouping: {}", app.grouping.title());
			false
		}
		KeyCode::Char('C') => {
			app.mode = InputMode::ConfirmClear;
			false
		}
		_ => false,
	}
}

fn handle_label_key(app: &mut App, code: KeyCode, context: &mut AppContext) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::EditLabel(input) = &mut app.mode {
				input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::EditLabel(input) = &mut app.mode {
				input.push(value);
			}
		}
		KeyCode::Enter => {
			if let InputMode::EditLabel(input) = std::mem::replace(&mut app.mode, InputMode::Normal) {
				let label = input.trim().to_string();
				app.status = match context.apply(|state, _| with_label(state, label.clone())) {
					Ok(_) => format!("label: {}", if label.is_empty() { "(none)" } else { &label }),
					Err(err) => format!("error: {err}"),
				};
			}
		}
		_ => {}
	}

	false
}

fn handle_confirm_key(app: &mut App, code: KeyCode, context: &mut AppContext) -> bool {
	app.mode = InputMode::Normal;
	app.status = if code == KeyCode::Char('y') {
		match context.clear() {
			Ok(_) => "cleared all entries".to_string(),
			Err(err) => format!("error: {err}"),
		}
	} else {
		"Clear cancelled".to_string()
	};
	false
}

fn press_button(context: &mut AppContext) -> String {
	if !can_toggle(context.state()) {
		return "type a label first (e)".to_string();
	}

	match context.apply(toggle) {
		Ok(state) => match state.newest() {
			Some(entry) if entry.is_start() => format!("started {}", entry.label),
			Some(entry) => format!("stopped {}", entry.label),
			None => String::new(),
		},
		Err(err) => {
			warn!(%err, "failed to persist entry");
			format!("error: {err}")
		}
	}
}

fn set_display_mode(context: &mut AppContext, mode: ButtonDisplayMode) -> String {
	match context.apply(|state, _| with_display_mode(state, mode)) {
		Ok(_) => format!("display: {}", mode.title()),
		Err(err) => format!("error: {err}"),
	}
}

fn build_view(app: &App, state: &State, live_elapsed: Option<i64>, now: Timestamp) -> ViewModel {
	let groups = app
		.grouping
		.groups(state)
		.iter()
		.map(|group| GroupView {
			heading: group.heading(now),
			pairs: group.items.iter().map(pair_line).collect(),
		})
		.collect();

	ViewModel {
		display_mode: state.display_mode,
		label: state.current_label.clone(),
		running: is_running(state),
		button: primary_button_text(state, live_elapsed.unwrap_or(0)),
		resume: resume_button_text(state),
		groups,
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	EditLabel(String),
	ConfirmClear,
}

#[derive(Debug, Clone)]
struct App {
	mode: InputMode,
	grouping: SummaryGrouping,
	status: String,
}

impl Default for App {
	fn default() -> Self {
		Self {
			mode: InputMode::Normal,
			grouping: SummaryGrouping::Distinct,
			status: "Ready".to_string(),
		}
	}
}

struct ViewModel {
	display_mode: ButtonDisplayMode,
	label: String,
	running: bool,
	button: ButtonText,
	resume: Option<ButtonText>,
	groups: Vec<GroupView>,
}

struct GroupView {
	heading: String,
	pairs: Vec<String>,
}
