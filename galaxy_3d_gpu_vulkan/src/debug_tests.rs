/// Unit tests for the validation statistics and callback configuration

use super::*;
use serial_test::serial;

fn config() -> Config {
    Config {
        severity: DebugSeverity::All,
        output: DebugOutput::Console,
        message_filter: DebugMessageFilter::default(),
        break_on_error: false,
        panic_on_error: false,
        enable_stats: true,
    }
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
#[serial]
fn test_debug_init_resets_statistics() {
    VALIDATION_STATS.errors.fetch_add(3, Ordering::Relaxed);
    VALIDATION_STATS.verbose.fetch_add(1, Ordering::Relaxed);
    assert_eq!(get_validation_stats().total(), 4);

    init_debug_config(config());

    assert_eq!(get_validation_stats(), ValidationStats::default());
    cleanup_debug_config();
}

#[test]
#[serial]
fn test_debug_cleanup_removes_config() {
    init_debug_config(config());
    assert!(DEBUG_CONFIG.lock().unwrap().is_some());

    cleanup_debug_config();
    assert!(DEBUG_CONFIG.lock().unwrap().is_none());
}

#[test]
#[serial]
fn test_debug_init_clears_message_counts() {
    MESSAGE_COUNTS.lock().unwrap().get_or_insert_with(FxHashMap::default).insert("old".to_string(), 5);

    init_debug_config(config());

    assert!(MESSAGE_COUNTS.lock().unwrap().as_ref().unwrap().is_empty());
    cleanup_debug_config();
}

#[cfg(feature = "vulkan-validation")]
#[test]
#[serial]
fn test_debug_track_message_counts_repeats() {
    init_debug_config(config());
    assert_eq!(track_message("same"), 1);
    assert_eq!(track_message("same"), 2);
    assert_eq!(track_message("other"), 1);
    cleanup_debug_config();
}
