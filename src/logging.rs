//src/logging.rs

use std::io::Write;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{Level, Record};

static RUN_STARTED: OnceLock<Instant> = OnceLock::new();

/// Set up stderr logging for a PACIFIC run.
///
/// Lines look like `[00:01:07 pacific INFO] Loading model`. Debug and trace
/// lines also carry the module they came from. `RUST_LOG` overrides `level`.
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logger(level: Level) {
    RUN_STARTED.get_or_init(Instant::now);

    let result = env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_default_env()
        .format(|buf, record| {
            let elapsed = RUN_STARTED.get_or_init(Instant::now).elapsed();
            writeln!(buf, "{}", format_line(elapsed, record))
        })
        .target(env_logger::Target::Stderr)
        .try_init();

    if result.is_err() {
        log::debug!("logger already initialised");
    }
}

/// `HH:MM:SS` since the run started. Hours keep counting past 99.
fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn format_line(elapsed: Duration, record: &Record<'_>) -> String {
    let stamp = format_elapsed(elapsed);
    match record.level() {
        Level::Debug | Level::Trace => format!(
            "[{stamp} pacific {} {}] {}",
            record.level(),
            record.target(),
            record.args()
        ),
        level => format!("[{stamp} pacific {level}] {}", record.args()),
    }
}
