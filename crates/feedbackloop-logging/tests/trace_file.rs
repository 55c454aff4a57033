use std::path::Path;
use std::process::{Command, Stdio};

use feedbackloop_logging::{init_tracing, LogFormat};

/// Set in the re-spawned test binary; names the trace directory to write to
const CHILD_DIR_ENV: &str = "FEEDBACKLOOP_TRACE_CHILD_DIR";
const LINES: usize = 2000;

fn count_trace_lines(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
        .map(|content| content.lines().filter(|l| l.contains("trace line")).count())
        .sum()
}

#[test]
fn dropping_the_guard_flushes_every_line_before_exit() {
    if let Ok(dir) = std::env::var(CHILD_DIR_ENV) {
        // Installs the global subscriber, so only ever in the child
        let guard = init_tracing("info", LogFormat::Json, Some(Path::new(&dir))).unwrap();
        for line in 0..LINES {
            tracing::info!(line, "trace line");
        }
        drop(guard);
        std::process::exit(0);
    }

    let dir = tempfile::tempdir().unwrap();
    let status = Command::new(std::env::current_exe().unwrap())
        .args([
            "--exact",
            "dropping_the_guard_flushes_every_line_before_exit",
            "--test-threads=1",
        ])
        .env(CHILD_DIR_ENV, dir.path())
        .env_remove("RUST_LOG")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();

    assert!(status.success());
    assert_eq!(count_trace_lines(dir.path()), LINES);
}
