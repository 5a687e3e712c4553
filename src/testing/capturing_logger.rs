use log::kv::Key;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::{Mutex, Once, OnceLock};
use std::thread::ThreadId;

#[derive(Debug, Clone)]
pub struct CapturedRecord {
    pub thread: ThreadId,
    pub level: Level,
    pub message: String,
    pub user: Option<String>,
}

/// Process-wide logger recording every message together with the emitting thread
#[derive(Default)]
pub struct CapturingLogger {
    captured: Mutex<Vec<CapturedRecord>>,
}

static LOGGER: OnceLock<CapturingLogger> = OnceLock::new();
static INIT: Once = Once::new();

impl CapturingLogger {
    pub fn install() -> &'static CapturingLogger {
        let logger = LOGGER.get_or_init(CapturingLogger::default);
        INIT.call_once(|| {
            log::set_logger(logger).expect("Another logger is already installed");
            log::set_max_level(LevelFilter::Trace);
        });
        logger
    }

    /// Position to pass to `messages_since`
    pub fn mark(&self) -> usize {
        self.captured.lock().unwrap().len()
    }

    /// Messages emitted by the current thread after the mark
    pub fn messages_since(&self, mark: usize) -> Vec<CapturedRecord> {
        let current = std::thread::current().id();
        self.captured.lock().unwrap()[mark..]
            .iter()
            .filter(|record| record.thread == current)
            .cloned()
            .collect()
    }
}

impl Log for CapturingLogger {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.captured.lock().unwrap().push(CapturedRecord {
            thread: std::thread::current().id(),
            level: record.level(),
            message: record.args().to_string(),
            user: record.key_values().get(Key::from_str("user")).map(|value| value.to_string()),
        });
    }

    fn flush(&self) {}
}
