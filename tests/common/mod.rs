use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A short, unique UNIX socket path; `sun_path` caps the length, so stay
/// well under it.
pub fn socket_path(name: &str) -> PathBuf {
    let run_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("hasten_{name}_{}_{run_id}.sock", std::process::id()))
}

/// Polls `predicate` until it holds or the deadline passes.
pub fn wait_for(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    predicate()
}
