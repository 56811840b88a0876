use chaos_filldisk::channel::{Channel, LocalChannel};
use chaos_filldisk::collectors::{filesystem, process};
use chaos_filldisk::config::Config;
use chaos_filldisk::fill::{holder, size, FillController};
use chaos_filldisk::models::outcome::FillOutcome;
use chaos_filldisk::models::request::{FillRequest, SizeSpec, ARTIFACT_NAME};
use chaos_filldisk::FillError;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const MIB: u64 = 1 << 20;

/// Scoped to a program name nothing runs as, so parallel tests never kill
/// each other's holders.
fn controller(dir: &TempDir) -> FillController<LocalChannel> {
    let mut cfg = Config::default();
    cfg.retain.log_file = dir.path().join("holder.log").to_string_lossy().into_owned();
    FillController::new(LocalChannel::new(), &cfg)
        .with_holder_program("/nonexistent/filldisk_test_scope")
}

/// Processes die asynchronously after SIGKILL; give the table a moment.
fn wait_until_gone(marker: &str) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if process::find(marker, None).is_empty() { return true; }
        std::thread::sleep(Duration::from_millis(50));
    }
    false
}

fn wait_for(marker: &str) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if !process::find(marker, None).is_empty() { return true; }
        std::thread::sleep(Duration::from_millis(50));
    }
    false
}

#[test]
fn stop_without_start_succeeds() {
    let dir = TempDir::new().unwrap();
    controller(&dir).stop(dir.path()).unwrap();
    assert!(!dir.path().join(ARTIFACT_NAME).exists());
}

#[test]
fn start_then_stop_leaves_nothing_behind() {
    let dir = TempDir::new().unwrap();
    let artifact = dir.path().join(ARTIFACT_NAME);
    let c = controller(&dir);

    let req = FillRequest::new(dir.path(), SizeSpec { size_mb: Some(1), ..Default::default() }, false).unwrap();
    let outcome = c.start(&req).unwrap();
    assert!(artifact.exists());
    if let FillOutcome::Preallocated { size_mb } = outcome {
        assert_eq!(size_mb, 1);
        assert!(std::fs::metadata(&artifact).unwrap().len() >= MIB);
    }

    c.stop(dir.path()).unwrap();
    assert!(!artifact.exists());
    assert!(wait_until_gone(&artifact.to_string_lossy()));
}

#[test]
fn streamed_fill_reaches_requested_size() {
    let dir = TempDir::new().unwrap();
    let artifact = dir.path().join(ARTIFACT_NAME);
    let mut cfg = Config::default();
    cfg.fill.use_fallocate = false;
    cfg.retain.log_file = dir.path().join("holder.log").to_string_lossy().into_owned();
    let c = FillController::new(LocalChannel::new(), &cfg)
        .with_holder_program("/nonexistent/filldisk_test_scope");

    let req = FillRequest::new(dir.path(), SizeSpec { size_mb: Some(4), ..Default::default() }, false).unwrap();
    assert_eq!(c.start(&req).unwrap(), FillOutcome::Streaming { size_mb: 4 });

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut len = 0;
    while Instant::now() < deadline {
        len = std::fs::metadata(&artifact).map(|m| m.len()).unwrap_or(0);
        if len >= 4 * MIB { break; }
        std::thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(len, 4 * MIB);

    c.stop(dir.path()).unwrap();
    assert!(!artifact.exists());
    assert!(wait_until_gone(&artifact.to_string_lossy()));
}

#[test]
fn retained_handle_is_released_on_stop() {
    let dir = TempDir::new().unwrap();
    let artifact = dir.path().join(ARTIFACT_NAME);
    std::fs::write(&artifact, b"held").unwrap();

    let marker = format!("--retain-nohup --directory {}", dir.path().display());
    LocalChannel::new()
        .spawn_detached(env!("CARGO_BIN_EXE_chaos_filldisk"), &holder::holder_args(dir.path()), None)
        .unwrap();
    assert!(wait_for(&marker), "holder never showed up");

    controller(&dir)
        .with_holder_program(env!("CARGO_BIN_EXE_chaos_filldisk"))
        .stop(dir.path())
        .unwrap();
    assert!(!artifact.exists());
    assert!(wait_until_gone(&marker), "holder survived stop");
}

#[test]
fn live_percent_bounds() {
    let dir = TempDir::new().unwrap();
    let wanted = SizeSpec { percent: Some(0), ..Default::default() };
    let err = size::compute(dir.path(), wanted).unwrap_err();
    assert!(matches!(err, FillError::AlreadyExceeded { .. }));
}

#[test]
fn live_reserve_bounds() {
    let dir = TempDir::new().unwrap();
    let st = filesystem::read_stat(dir.path()).unwrap();

    let too_much = SizeSpec { reserve_mb: Some(st.available_mb() + 1_000_000.0), ..Default::default() };
    let err = size::compute(dir.path(), too_much).unwrap_err();
    assert!(matches!(err, FillError::InsufficientSpace { .. }));

    if st.available_mb() > 2.0 {
        let wanted = SizeSpec { reserve_mb: Some(1.0), ..Default::default() };
        let mb = size::compute(dir.path(), wanted).unwrap();
        // Other processes may write in between; stay loose.
        let expected = (st.available_mb() - 1.0).floor() as u64;
        assert!(mb.abs_diff(expected) < 64, "mb={} expected={}", mb, expected);
    }
}

#[test]
fn explicit_size_ignores_missing_directory() {
    let wanted = SizeSpec { size_mb: Some(42), ..Default::default() };
    assert_eq!(size::compute(Path::new("/no/such/dir/filldisk"), wanted).unwrap(), 42);
}
