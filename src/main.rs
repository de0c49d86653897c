mod clock;
mod config;
mod context;
mod display;
mod entry;
mod logging;
mod notify;
mod reducer;
mod storage;
mod summary;
mod ui;

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use crate::clock::SystemClock;
use crate::config::load_settings;
use crate::context::AppContext;
use crate::display::{
	can_toggle, elapsed_seconds, is_running, primary_button_text, resume_button_text,
};
use crate::entry::{ButtonDisplayMode, State, Timestamp};
use crate::logging::enable_logging;
use crate::notify::{DesktopNotifier, Notifier, NullNotifier};
use crate::reducer::{toggle, with_display_mode, with_label};
use crate::storage::FileStore;
use crate::summary::{SummaryGrouping, pair_line};
use crate::ui::run_dashboard;

#[derive(Debug, Parser)]
#[command(name = "chronos-tally", about = "Labeled start/stop timer for the terminal")]
struct Cli {
	#[arg(long)]
	state_dir: Option<PathBuf>,
	/// Mirror logs to stderr.
	#[arg(long)]
	verbose: bool,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Dashboard,
	/// Start or stop the timer, optionally switching label first.
	Toggle {
		#[arg(long)]
		label: Option<String>,
	},
	Label {
		text: String,
	},
	Mode {
		#[arg(value_enum)]
		mode: ModeArg,
	},
	Status,
	Summary {
		#[arg(long, value_enum, default_value_t = SummaryGrouping::Distinct)]
		grouping: SummaryGrouping,
	},
	Events {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
	/// Delete every recorded entry.
	Clear,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
	Elapsed,
	#[value(name = "20m")]
	TwentyMinutes,
	#[value(name = "60m")]
	Hour,
}

impl From<ModeArg> for ButtonDisplayMode {
	fn from(value: ModeArg) -> Self {
		match value {
			ModeArg::Elapsed => ButtonDisplayMode::Elapsed,
			ModeArg::TwentyMinutes => ButtonDisplayMode::Countdown20Min,
			ModeArg::Hour => ButtonDisplayMode::Countdown60Min,
		}
	}
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let settings = load_settings(cli.state_dir)?;
	let command = cli.command.unwrap_or(Command::Dashboard);
	let interactive = matches!(command, Command::Dashboard);

	if let Err(err) = enable_logging(
		&settings.state_dir,
		&settings.config.log_level,
		cli.verbose && !interactive,
	) {
		eprintln!("warning: logging disabled: {err}");
	}

	let notifier: Box<dyn Notifier> = if settings.config.notifications {
		Box::new(DesktopNotifier::register())
	} else {
		Box::new(NullNotifier)
	};
	let mut context = AppContext::init(
		Box::new(FileStore::new(&settings.state_dir)),
		Box::new(SystemClock),
		notifier,
	)?;
	info!(state_dir = %settings.state_dir.display(), "starting");

	match command {
		Command::Dashboard => {
			let tick = StdDuration::from_millis(settings.config.tick_millis.max(16));
			run_dashboard(&mut context, tick)?;
		}
		Command::Toggle { label } => {
			if let Some(label) = label {
				if is_running(context.state()) && context.state().current_label != label {
					warn!("label change ignored while running");
					println!("timer is running, keeping label {:?}", context.state().current_label);
				} else {
					context.apply(|state, _| with_label(state, label))?;
				}
			}
			if !can_toggle(context.state()) {
				return Err("set a label before starting: toggle --label <TEXT>".into());
			}
			let state = context.apply(toggle)?;
			if let Some(entry) = state.newest() {
				let verb = if entry.is_start() { "started" } else { "stopped" };
				println!("{verb} {}", display_name(&entry.label));
			}
		}
		Command::Label { text } => {
			if is_running(context.state()) {
				return Err("stop the timer before changing the label".into());
			}
			context.apply(|state, _| with_label(state, text))?;
			println!("label set to {}", display_name(&context.state().current_label));
		}
		Command::Mode { mode } => {
			let mode = ButtonDisplayMode::from(mode);
			context.apply(|state, _| with_display_mode(state, mode))?;
			println!("display mode: {}", mode.title());
		}
		Command::Status => {
			print_status(context.state(), context.now());
		}
		Command::Summary { grouping } => {
			print_summary(context.state(), grouping, context.now());
		}
		Command::Events { limit } => {
			print_events(context.state(), limit);
		}
		Command::Clear => {
			context.clear()?;
			println!("cleared all entries");
		}
	}

	context.teardown();
	Ok(())
}

fn display_name(label: &str) -> &str {
	if label.is_empty() { "Unlabeled" } else { label }
}

fn print_status(state: &State, now: Timestamp) {
	let live = elapsed_seconds(state.newest(), now).unwrap_or(0);
	let button = primary_button_text(state, live);
	println!("label: {}", display_name(&state.current_label));
	println!("display: {}", state.display_mode.title());
	println!("{} {}", button.action, button.display.trim());
	if let Some(resume) = resume_button_text(state) {
		println!("{} at {}", resume.action, resume.display);
	}
}

fn print_summary(state: &State, grouping: SummaryGrouping, now: Timestamp) {
	let groups = grouping.groups(state);
	if groups.is_empty() {
		println!("no tracked sessions");
		return;
	}

	println!("summary ({})", grouping.title());
	for group in &groups {
		println!("{}", group.heading(now));
		for pair in &group.items {
			println!("  {}", pair_line(pair));
		}
	}
}

fn print_events(state: &State, limit: usize) {
	if state.entries.is_empty() {
		println!("no entries yet");
		return;
	}

	for entry in state.entries.iter().take(limit) {
		let when = entry
			.time
			.to_local()
			.map(|local| local.to_rfc3339())
			.unwrap_or_else(|| entry.time.millis().to_string());
		let kind = if entry.is_start() { "start" } else { "stop" };
		println!("{when} {kind} {}", display_name(&entry.label));
	}
}
