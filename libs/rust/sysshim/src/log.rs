use std::io::Write as _;

struct Writer {
    buf: spin::Mutex<Vec<u8>>,
}

static LOGGER: Writer = Writer::new();

impl Writer {
    const fn new() -> Writer {
        Writer {
            buf: spin::Mutex::new(Vec::new()),
        }
    }

    fn write_str(&self, s: &str) {
        let mut buf = self.buf.lock();
        for b in s.bytes() {
            buf.push(b);
            if b == b'\n' {
                let old_buf = core::mem::replace(&mut *buf, Vec::with_capacity(128));
                // Do not hold the lock while writing to stderr: the write
                // may block, and other threads keep logging meanwhile.
                drop(buf);
                let _ = std::io::stderr().lock().write_all(&old_buf);
                buf = self.buf.lock();
            }
        }
    }
}

impl log::Log for Writer {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let level_str = match record.level() {
                log::Level::Error => "ERROR",
                log::Level::Warn => "WARN",
                log::Level::Info => "INFO",
                log::Level::Debug => "DEBUG",
                log::Level::Trace => "TRACE",
            };

            let color = match record.level() {
                log::Level::Error => "\x1b[91m",
                log::Level::Warn => "\x1b[33m",
                log::Level::Info => "\x1b[96m",
                log::Level::Debug | log::Level::Trace => "\x1b[0m",
            };

            const RESET_COLOR: &str = "\x1b[0m";

            let thread = std::thread::current();
            let line = format!(
                "[{:<12}] {}{:6}{} {}\n",
                thread.name().unwrap_or("?"),
                color,
                level_str,
                RESET_COLOR,
                record.args()
            );
            self.write_str(&line);
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Initialize the logger. This should be called once at the start of the program.
pub fn init() {
    init_with_level(if cfg!(debug_assertions) {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Info
    });
}

/// Like [`init`], with an explicit maximum level.
pub fn init_with_level(level: log::LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

pub use log::debug;
pub use log::error;
pub use log::info;
pub use log::trace;
pub use log::warn;

#[macro_export]
macro_rules! debug_warn {
    ($($arg:tt)+) => {
        if cfg!(debug_assertions) {
            $crate::log::warn!($($arg)+);
        }
    };
}
