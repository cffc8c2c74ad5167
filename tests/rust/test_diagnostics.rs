use super::*;

#[test]
fn test_channel_joins_lines() {
    let mut ch = ErrorChannel::new();
    assert!(ch.is_empty());
    ch.append("Error: one");
    ch.append("Warning: two");
    assert_eq!(ch.text(), "Error: one\nWarning: two");
    ch.clear();
    assert!(ch.is_empty());
}

#[test]
fn test_channel_drops_lines_that_do_not_fit() {
    let mut ch = ErrorChannel::new();
    let long = "x".repeat(CAPACITY - 10);
    ch.append(&long);
    ch.append("this line is too long to fit");
    assert_eq!(ch.text(), long);
    // A shorter line still fits after a dropped one.
    ch.append("ok");
    assert_eq!(ch.text(), format!("{long}\nok"));
    assert!(ch.text().len() < CAPACITY);
}

#[test]
fn test_channel_rejects_line_at_capacity() {
    let mut ch = ErrorChannel::new();
    ch.append(&"y".repeat(CAPACITY - 1));
    assert!(ch.is_empty());
    ch.append(&"y".repeat(CAPACITY - 2));
    assert_eq!(ch.text().len(), CAPACITY - 2);
}

#[test]
fn test_session_collects_engine_diagnostics() {
    let session = Session::begin();
    assert!(!session.has_diagnostics());
    diag::warn("first");
    diag::error("second");
    assert!(session.has_diagnostics());
    assert_eq!(
        session.diagnostics().as_deref(),
        Some("Warning: first\nError: second")
    );
    assert_eq!(diag::worst_severity(), Some(Severity::Error));
}

#[test]
fn test_session_starts_clean() {
    {
        let _session = Session::begin();
        diag::error("left over");
    }
    let session = Session::begin();
    assert_eq!(session.diagnostics(), None);
    assert_eq!(session.error_or("fallback"), "fallback");
    assert_eq!(diag::worst_severity(), None);
}

#[test]
fn test_sink_always_continues() {
    let _session = Session::begin();
    assert_eq!(channel_sink("Error: x"), SinkAction::Continue);
}
