use crossbeam_channel::Sender;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::solvers::SolverEvent;

/// `[LEVEL] message`, the line format shared by both loggers.
pub fn format_line(record: &Record) -> String {
    format!("[{}] {}", record.level(), record.args())
}

/// Routes `log` records into the monitor's event channel.
pub struct ChannelLogger {
    tx: Sender<SolverEvent>,
    level: LevelFilter,
}

impl ChannelLogger {
    pub fn new(tx: Sender<SolverEvent>, level: LevelFilter) -> Self {
        Self { tx, level }
    }
}

impl Log for ChannelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            // The monitor may already be gone during shutdown.
            let _ = self.tx.send(SolverEvent::Log(format_line(record)));
        }
    }

    fn flush(&self) {}
}

/// Headless runs: one line per record on stderr, so stdout stays the
/// result summary.
pub struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", format_line(record));
        }
    }

    fn flush(&self) {}
}

/// Installs `logger` as the process-wide logger. Fails if one is already
/// set.
pub fn install(logger: Box<dyn Log>, level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use log::Level;

    #[test]
    fn test_channel_logger_forwards_enabled_records() {
        let (tx, rx) = unbounded();
        let logger = ChannelLogger::new(tx, LevelFilter::Info);

        logger.log(
            &Record::builder()
                .level(Level::Warn)
                .args(format_args!("Run log unavailable"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .args(format_args!("Level 3"))
                .build(),
        );

        let lines: Vec<String> = rx
            .try_iter()
            .filter_map(|e| match e {
                SolverEvent::Log(line) => Some(line),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec!["[WARN] Run log unavailable".to_string()]);
    }

    #[test]
    fn test_stderr_logger_level_filter() {
        let logger = StderrLogger::new(LevelFilter::Info);
        let meta = |level| Metadata::builder().level(level).build();
        assert!(logger.enabled(&meta(Level::Warn)));
        assert!(logger.enabled(&meta(Level::Info)));
        assert!(!logger.enabled(&meta(Level::Debug)));
    }

    // The only test in this crate that touches the global logger.
    #[test]
    fn test_install_sets_global_logger_once() {
        let first = install(Box::new(StderrLogger::new(LevelFilter::Warn)), LevelFilter::Warn);
        assert!(first.is_ok());
        assert_eq!(log::max_level(), LevelFilter::Warn);
        assert!(log::logger().enabled(&Metadata::builder().level(Level::Error).build()));

        let second = install(Box::new(StderrLogger::new(LevelFilter::Info)), LevelFilter::Info);
        assert!(second.is_err());
    }
}
