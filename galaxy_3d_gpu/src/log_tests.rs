//! Unit tests for log.rs

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "galaxy3d::gpu::Test".to_string(),
        message: "message body".to_string(),
        file,
        line,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_labels_have_fixed_width() {
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        assert_eq!(severity.label().len(), 5);
    }
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_format_plain_without_call_site() {
    let text = DefaultLogger::format_plain(&entry(LogSeverity::Info, None, None));
    assert!(text.contains("[INFO ]"));
    assert!(text.contains("[galaxy3d::gpu::Test] message body"));
    assert!(!text.contains("("));
}

#[test]
fn test_format_plain_with_call_site() {
    let text = DefaultLogger::format_plain(&entry(LogSeverity::Error, Some("arena.rs"), Some(12)));
    assert!(text.contains("[ERROR]"));
    assert!(text.ends_with("(arena.rs:12)"));
}

#[test]
fn test_format_plain_timestamp_shape() {
    let text = DefaultLogger::format_plain(&entry(LogSeverity::Debug, None, None));
    // [YYYY-MM-DD HH:MM:SS.mmm]
    let stamp = &text[1..24];
    assert_eq!(stamp.len(), 23);
    assert_eq!(&stamp[4..5], "-");
    assert_eq!(&stamp[19..20], ".");
}

#[test]
fn test_default_logger_all_severities_do_not_panic() {
    let logger = DefaultLogger { min_severity: LogSeverity::Trace };
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        logger.log(&entry(severity, Some("x.rs"), Some(1)));
        logger.log(&entry(severity, None, None));
    }
}

#[test]
fn test_default_logger_min_severity_default() {
    assert_eq!(DefaultLogger::default().min_severity, LogSeverity::Debug);
}

// ============================================================================
// CUSTOM LOGGER TESTS
// ============================================================================

struct CountingLogger {
    seen: Arc<Mutex<Vec<LogSeverity>>>,
}

impl Logger for CountingLogger {
    fn log(&self, entry: &LogEntry) {
        self.seen.lock().unwrap().push(entry.severity);
    }
}

#[test]
fn test_custom_logger_implementation() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let logger = CountingLogger { seen: seen.clone() };
    logger.log(&entry(LogSeverity::Warn, None, None));
    logger.log(&entry(LogSeverity::Error, None, None));
    assert_eq!(*seen.lock().unwrap(), vec![LogSeverity::Warn, LogSeverity::Error]);
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
    assert_send_sync::<CountingLogger>();
}
