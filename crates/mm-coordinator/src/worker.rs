//! Per-worker bookkeeping on the coordinator side (§3 "worker record"), and
//! the fork/pipe primitive that creates one (§4.5 step 3).
use crate::error::SpawnError;
use mm_engine::Engine;
use mm_protocol::FrameReader;
use mm_worker::WorkerConfig;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::unistd::{close, fork, pipe, ForkResult, Pid};
use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, RawFd};

/// What [`spawn_worker`] hands back to the parent branch only; the child
/// branch never returns (§4.4: it drives the engine to completion and exits).
pub struct WorkerHandle {
    pub pid: Pid,
    pub read_fd: RawFd,
}

fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    let raw = fcntl(fd, FcntlArg::F_GETFL).map_err(io::Error::from)?;
    let mut flags = OFlag::from_bits_truncate(raw);
    flags.insert(OFlag::O_NONBLOCK);
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(io::Error::from)?;
    Ok(())
}

/// Fork one worker. The parent gets a [`WorkerHandle`] with a non-blocking
/// read end; the child drives `engine` under `config`, writing records to
/// the pipe's write end, and exits the process — it never returns into the
/// caller's control flow (the Rust analogue of the host's "return false so
/// the outer solver continues": here the child's "continuing" *is* the
/// drive loop, run to completion before exit).
///
/// `engine` is built once by the caller, before any fork, so each child
/// inherits an independent copy-on-write snapshot of its state (§9
/// "process-per-partition" design note) rather than needing a factory.
pub fn spawn_worker(
    partition_id: usize,
    engine: &mut dyn Engine,
    config: &WorkerConfig,
) -> Result<WorkerHandle, SpawnError> {
    let (read_end, write_end) =
        pipe().map_err(|e| SpawnError::new(partition_id, io::Error::from(e)))?;

    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            drop(write_end);
            let read_fd = read_end.into_raw_fd();
            set_nonblocking(read_fd).map_err(|e| SpawnError::new(partition_id, e))?;
            Ok(WorkerHandle { pid: child, read_fd })
        }
        Ok(ForkResult::Child) => {
            drop(read_end);
            mm_worker::reset_signal_handlers();
            let mut pipe_out = unsafe { File::from_raw_fd(write_end.into_raw_fd()) };
            let _ = mm_worker::run(engine, config, &mut pipe_out);
            std::process::exit(0);
        }
        Err(e) => Err(SpawnError::new(partition_id, io::Error::from(e))),
    }
}

/// Coordinator-side state for one live or finished worker (§3).
pub struct WorkerRecord {
    pub pid: Pid,
    pub read_fd: RawFd,
    pub partition_id: usize,
    pub reader: FrameReader,
    pub finished: bool,
    /// `m*100+k`, per §3. `None` until this worker's first `PROGRESS` record.
    pub last_depth: Option<u32>,
    pub positions_at_depth: Vec<u64>,
    pub current_combo_label: Option<String>,
}

impl WorkerRecord {
    pub fn new(handle: WorkerHandle, partition_id: usize) -> Self {
        Self {
            pid: handle.pid,
            read_fd: handle.read_fd,
            partition_id,
            reader: FrameReader::new(),
            finished: false,
            last_depth: None,
            positions_at_depth: vec![0; mm_core::PROGRESS_TABLE_SLOTS],
            current_combo_label: None,
        }
    }

    /// Close the read fd and mark this worker finished. Idempotent.
    pub fn close(&mut self) {
        if !self.finished {
            let _ = close(self.read_fd);
            self.finished = true;
        }
    }
}

impl AsRawFd for WorkerRecord {
    fn as_raw_fd(&self) -> RawFd {
        self.read_fd
    }
}
