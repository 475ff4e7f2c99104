//! What the default and verbose log filters let through
//!
//! Transient lookup failures are diagnostics: a normal run stays silent about
//! them and `--verbose` shows them.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use partpick::cli::helpers::default_log_filter;
use partpick::core::{select_family, CatalogLookup, FamilyGroup, FamilyOutcome, ManualClock, Throttle};

/// Writer collecting formatted log lines in memory
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` under the filter the binary installs and return the log output
fn logged(verbose: bool, f: impl FnOnce()) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(default_log_filter(verbose))
        .with_writer(move || writer.clone())
        .with_target(false)
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);

    let bytes = captured.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

fn select_unknown_code() -> usize {
    let group = FamilyGroup {
        family: "R".to_string(),
        desired_quantity: 1,
        candidate_codes: vec!["C1".to_string()],
    };
    let mut lookup = CatalogLookup::new("empty");
    let mut throttle = Throttle::with_clock(Duration::ZERO, ManualClock::new());

    let report = select_family(&group, &mut lookup, &mut throttle).unwrap();
    assert!(matches!(report.outcome, FamilyOutcome::Unavailable(_)));
    report.failures.len()
}

// One test so no other thread registers a subscriber in between
#[test]
fn test_transient_failures_only_logged_when_verbose() {
    let mut failures = 0;
    let quiet = logged(false, || failures = select_unknown_code());
    assert_eq!(failures, 1);
    assert_eq!(quiet, "");

    let verbose = logged(true, || failures = select_unknown_code());
    assert_eq!(failures, 1);
    assert!(verbose.contains("not in catalog"), "got: {verbose}");
    assert!(verbose.contains("C1"));
}
