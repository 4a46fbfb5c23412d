//! Shared constants, logging bootstrap and interrupt plumbing for meshmate.
//!
//! This crate provides the foundational values and process-wide utilities
//! used by every other meshmate crate: the combo-space cardinalities, the
//! resource bounds from the coordination design, dual terminal/file logging,
//! and a cooperative interrupt flag driven by signal handlers installed in
//! `mm-coordinator`.

// ============================================================================
// COMBO SPACE
// ============================================================================
/// King-square dimension cardinality.
pub const KING_CARD: usize = 64;
/// Checking-piece dimension cardinality.
pub const CHECKER_CARD: usize = 15;
/// Check-square dimension cardinality.
pub const CHECK_SQ_CARD: usize = 64;
/// Total combo-space size: king × checker × check-square.
pub const COMBO_SPACE: usize = KING_CARD * CHECKER_CARD * CHECK_SQ_CARD;

// ============================================================================
// RESOURCE BOUNDS
// ============================================================================
/// Maximum number of workers a coordinator will spawn.
pub const MAX_WORKERS: usize = 1024;
/// Per-read chunk size when multiplexing worker pipes.
pub const READ_CHUNK: usize = 4096;
/// Maximum buffered line length before truncate-and-parse kicks in.
pub const LINE_LIMIT: usize = 8192;
/// Progress-table depth slots per worker (`m, k < 100`).
pub const PROGRESS_TABLE_SLOTS: usize = 10_000;
/// Maximum tracked heavy-combo records in probe mode.
pub const HEAVY_COMBO_CAP: usize = 256;

// ============================================================================
// TIMING
// ============================================================================
/// Multiplexing tick: how long a single poll waits before re-checking state.
pub const SELECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(1);
/// Interval between status-line summaries while any worker is active.
pub const STATUS_INTERVAL: std::time::Duration = std::time::Duration::from_secs(10);
/// Default probe/rebalance phase timeout.
pub const DEFAULT_PHASE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);
/// Maximum accepted probe/rebalance phase timeout.
pub const MAX_PHASE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3600);
/// Below this worker count, status lines also print each worker's current combo label.
pub const STATUS_LABEL_THRESHOLD: usize = 16;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
///
/// Creates the log directory (`$SOLVER_LOG_DIR`, default `logs/`) and writes
/// DEBUG level to file, INFO level to terminal, matching the dual-sink setup
/// used across the rest of the workspace.
pub fn log() {
    let dir = log_dir();
    std::fs::create_dir_all(&dir).expect("create log directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("{dir}/{time}.log")).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Directory logs are written under; `SOLVER_LOG_DIR`, default `logs`.
pub fn log_dir() -> String {
    std::env::var("SOLVER_LOG_DIR").unwrap_or_else(|_| "logs".to_string())
}

/// Default worker count when `-parallel` is given without an argument:
/// `SOLVER_WORKERS` env var, falling back to the detected core count.
pub fn default_worker_count() -> usize {
    std::env::var("SOLVER_WORKERS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(num_cpus::get)
        .clamp(1, MAX_WORKERS)
}

// ============================================================================
// COOPERATIVE INTERRUPT FLAG
// ============================================================================
/// Set by the coordinator's signal handler on SIGINT/SIGTERM; polled once per
/// multiplex-loop iteration. Never modelled as an exception — see design notes
/// on cooperative cancellation.
static INTERRUPTED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Record that an interrupt was requested.
pub fn request_interrupt() {
    INTERRUPTED.store(true, std::sync::atomic::Ordering::SeqCst);
}

/// Has an interrupt been requested since the last reset?
pub fn interrupted() -> bool {
    INTERRUPTED.load(std::sync::atomic::Ordering::SeqCst)
}

/// Reset the interrupt flag. Only meaningful in tests that run multiple
/// coordinator phases in the same process.
pub fn reset_interrupt() {
    INTERRUPTED.store(false, std::sync::atomic::Ordering::SeqCst);
}
