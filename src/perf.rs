//! Lightweight performance instrumentation.
//!
//! Scopes report wall time on drop when `--perf` is set. Events always reach
//! `tracing` at debug level and, when `--render-debug-log` names a file, a
//! timestamped flat log useful for diagnosing render/photo issues after the
//! fact.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static EVENT_LOG: LazyLock<Mutex<EventLog>> = LazyLock::new(|| Mutex::new(EventLog::new()));

#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        eprintln!("[perf] {}: {:.2} ms", self.name, elapsed_ms);
    }
}

#[derive(Debug)]
struct EventLog {
    enabled: bool,
    start: Instant,
    writer: Option<BufWriter<File>>,
}

impl EventLog {
    fn new() -> Self {
        Self {
            enabled: false,
            start: Instant::now(),
            writer: None,
        }
    }
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut log = EVENT_LOG.lock().expect("event log lock poisoned");
    if let Some(path) = path {
        let file = File::create(path)?;
        log.enabled = true;
        log.start = Instant::now();
        log.writer = Some(BufWriter::new(file));
        if let Some(writer) = log.writer.as_mut() {
            writeln!(writer, "tumbless render debug log start")?;
            writer.flush()?;
        }
    } else {
        log.enabled = false;
        log.writer = None;
    }
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    EVENT_LOG
        .lock()
        .expect("event log lock poisoned")
        .enabled
}

/// Record a named event with a free-form detail string.
///
/// Events go to `tracing` unconditionally; the file log only receives them
/// when enabled, so hot paths may call this without a guard.
pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let detail = detail.as_ref();
    tracing::debug!(target: "tumbless::events", "{name}: {detail}");

    let mut log = EVENT_LOG.lock().expect("event log lock poisoned");
    if !log.enabled {
        return;
    }
    let elapsed_ms = log.start.elapsed().as_secs_f64() * 1000.0;
    if let Some(writer) = log.writer.as_mut() {
        let _ = writeln!(writer, "[{elapsed_ms:>10.3} ms] {name}: {detail}");
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_set_enabled_toggles_runtime_flag() {
        set_enabled(true);
        assert!(is_enabled());

        set_enabled(false);
        assert!(!is_enabled());
    }

    #[test]
    fn test_debug_log_path_enables_logging_and_writes() {
        let temp_file = NamedTempFile::new().unwrap();
        set_debug_log_path(Some(temp_file.path())).unwrap();
        assert!(is_debug_log_enabled());
        log_event("test.event", "hello world");
        set_debug_log_path(None).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("tumbless render debug log start"));
        assert!(content.contains("test.event: hello world"));
    }

    #[test]
    fn test_log_event_without_file_is_a_noop() {
        set_debug_log_path(None).unwrap();
        assert!(!is_debug_log_enabled());
        // Must not panic or block when only the tracing sink is active.
        log_event("test.quiet", "nothing to write");
    }
}
