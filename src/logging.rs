//! Developer logging, compiled in only for debug builds.

use std::sync::OnceLock;
use std::thread;
use std::time::Instant;

static STARTED: OnceLock<Instant> = OnceLock::new();

/// Print a line tagged with the time since the first log call and the
/// current thread name (`agvs-<id>` for vehicle threads).
pub fn dev_log(message: &str) {
    if !cfg!(debug_assertions) {
        return;
    }
    let elapsed = STARTED.get_or_init(Instant::now).elapsed();
    let current = thread::current();
    let thread_name = current.name().unwrap_or("unnamed");
    eprintln!("[+{:>6}us][{thread_name}] {message}", elapsed.as_micros());
}

#[macro_export]
macro_rules! log_dev {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            $crate::logging::dev_log(&format!($($arg)*));
        }
    };
}
