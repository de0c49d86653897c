use std::path::Path;

use tracing_appender::rolling::{self, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

const LOG_PREFIX: &str = "chronos-tally";

/// Installs the global subscriber: a daily log file under `<state_dir>/logs`,
/// mirrored to stderr when `to_stderr` is set. `RUST_LOG` overrides `level`.
pub fn enable_logging(
	state_dir: &Path,
	level: &str,
	to_stderr: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let appender = rolling::Builder::new()
		.rotation(Rotation::DAILY)
		.max_log_files(5)
		.filename_prefix(LOG_PREFIX)
		.build(state_dir.join("logs"))?;

	let filter = match std::env::var("RUST_LOG") {
		Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
		_ => EnvFilter::new(format!("{}={level}", env!("CARGO_PKG_NAME"))),
	};

	let stderr = std::io::stderr.with_filter(move |_| to_stderr);

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(stderr.and(appender))
		.with_ansi(false)
		.try_init()
		.map_err(|err| err as Box<dyn std::error::Error>)?;
	Ok(())
}
