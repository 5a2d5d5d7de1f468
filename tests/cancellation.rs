mod common;

use common::*;
use mirror_backup::{Progress, Reconciler, Reporter, ShutdownToken};
use std::sync::Mutex;

/// Requests shutdown as soon as the first copy is announced.
struct StopAfterFirstCopy {
    token: ShutdownToken,
    seen: Mutex<Vec<String>>,
}

impl Reporter for StopAfterFirstCopy {
    fn report(&self, event: Progress) {
        if matches!(event, Progress::Copying { .. }) {
            self.token.request();
        }
        self.seen.lock().unwrap().push(event.to_string());
    }
}

#[test]
fn interrupt_stops_at_a_file_boundary_and_skips_pruning() {
    let r = roots();
    for name in ["a", "b", "c", "d"] {
        write(&r.src, &format!("{name}.txt"), name.as_bytes());
    }
    write(&r.dst, "stale.txt", b"s");
    std::fs::create_dir_all(r.dst.join("hollow")).unwrap();

    let token = ShutdownToken::new();
    let reporter = StopAfterFirstCopy { token: token.clone(), seen: Mutex::new(Vec::new()) };
    let report = Reconciler::new(options(&r), &reporter).with_cancel(token).run();

    assert!(report.interrupted);
    assert_eq!(report.stats.files_copied_new, 1, "the copy in flight completes");
    assert!(r.dst.join("a.txt").is_file());
    assert!(!r.dst.join("b.txt").exists());
    assert!(r.dst.join("stale.txt").exists(), "reverse pass never ran");
    assert!(r.dst.join("hollow").is_dir(), "pruning never ran");
    let seen = reporter.seen.lock().unwrap();
    assert!(!seen.iter().any(|l| l.starts_with("Reverse Scan")));
}
