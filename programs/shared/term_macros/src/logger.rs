use log::{Level, LevelFilter, Log, Metadata, Record};
use owo_colors::OwoColorize;
use std::io::Write;

struct TermLogger;

static LOGGER: TermLogger = TermLogger;

impl Log for TermLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => format!("{}", "error".red().bold()),
            Level::Warn => format!("{}", "warn".yellow().bold()),
            Level::Info => format!("{}", "info".green()),
            Level::Debug => format!("{}", "debug".blue()),
            Level::Trace => format!("{}", "trace".dimmed()),
        };
        let stderr = std::io::stderr();
        let mut lock = stderr.lock();
        let _ = writeln!(
            lock,
            "{} {} {}",
            tag,
            record.target().dimmed(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Installs the stderr logger. Safe to call more than once; only the level changes after the first call.
pub fn init(verbose: bool) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
}
