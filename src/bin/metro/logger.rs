//! Logger that routes records into the terminal UI's status line

use std::sync::{mpsc, Mutex, OnceLock};

use log::{Level, LevelFilter, Metadata, Record};

/// One log record, ready for display.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub level: Level,
    pub message: String,
}

static SINK: OnceLock<Mutex<mpsc::Sender<LogLine>>> = OnceLock::new();
static TUI_LOGGER: TuiLogger = TuiLogger;

pub struct TuiLogger;

impl log::Log for TuiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Writing to stderr would tear the alternate screen; drop instead.
        if let Some(sink) = SINK.get() {
            if let Ok(sink) = sink.lock() {
                let _ = sink.send(LogLine {
                    level: record.level(),
                    message: record.args().to_string(),
                });
            }
        }
    }

    fn flush(&self) {}
}

/// Install the TUI logger and return the receiving end of its records.
/// Level defaults to info, `RUST_LOG` overrides it.
pub fn init_tui_logger() -> mpsc::Receiver<LogLine> {
    let (tx, rx) = mpsc::channel();
    if SINK.set(Mutex::new(tx)).is_ok() && log::set_logger(&TUI_LOGGER).is_ok() {
        let level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|s| s.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Info);
        log::set_max_level(level);
    }
    rx
}
