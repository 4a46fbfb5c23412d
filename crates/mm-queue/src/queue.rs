//! Fixed-layout shared work-queue file (§3, §4.3): bytes 0-3 the next-worker
//! counter, bytes 4-7 the total worker count `W`, both little-endian,
//! mutated only under a whole-file advisory exclusive lock.
use crate::error::QueueError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use nix::fcntl::{flock, FlockArg};
use std::cell::Cell;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

const COUNTER_OFFSET: u64 = 0;
const TOTAL_OFFSET: u64 = 4;

/// A handle onto the shared work-queue file. Many worker processes may hold
/// independently-opened handles onto the same path; synchronisation is via
/// `flock`, not in-process state.
pub struct WorkQueue {
    path: PathBuf,
    file: File,
}

impl WorkQueue {
    /// Create the queue file, writing counter=0 and total=`total_workers`.
    /// Performed once by the coordinator before forking.
    pub fn initialise(path: impl AsRef<Path>, total_workers: u32) -> Result<Self, QueueError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&path)?;
        let mut queue = Self { path, file };
        queue.lock()?;
        let result = queue.write_layout(0, total_workers);
        queue.unlock();
        result?;
        Ok(queue)
    }

    /// Open an existing queue file, created by the coordinator. Performed by
    /// each worker process after fork.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Atomically read the counter, write counter+1, and return the old
    /// value. Every caller observes a distinct, monotonically-assigned index.
    pub fn acquire_worker_index(&mut self) -> Result<u32, QueueError> {
        self.lock()?;
        let result = self.read_and_bump_counter();
        self.unlock();
        result
    }

    /// Read the total worker count `W` written at `initialise` time.
    pub fn read_total(&mut self) -> Result<u32, QueueError> {
        self.lock()?;
        let result = self.read_u32_at(TOTAL_OFFSET);
        self.unlock();
        Ok(result?)
    }

    /// Unlink the queue file. Performed by the coordinator after every
    /// worker has been reaped.
    pub fn destroy(self) -> Result<(), QueueError> {
        std::fs::remove_file(&self.path)?;
        Ok(())
    }

    fn lock(&self) -> Result<(), QueueError> {
        flock(self.file.as_raw_fd(), FlockArg::LockExclusive).map_err(std::io::Error::from)?;
        Ok(())
    }

    fn unlock(&self) {
        // best-effort unlock; the fd is closed (and thus unlocked) on drop regardless
        let _ = flock(self.file.as_raw_fd(), FlockArg::Unlock);
    }

    fn read_u32_at(&mut self, offset: u64) -> std::io::Result<u32> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_u32::<LittleEndian>()
    }

    fn write_u32_at(&mut self, offset: u64, value: u32) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_u32::<LittleEndian>(value)
    }

    fn write_layout(&mut self, counter: u32, total: u32) -> Result<(), QueueError> {
        self.write_u32_at(COUNTER_OFFSET, counter)?;
        self.write_u32_at(TOTAL_OFFSET, total)?;
        Ok(())
    }

    fn read_and_bump_counter(&mut self) -> Result<u32, QueueError> {
        let current = self.read_u32_at(COUNTER_OFFSET)?;
        self.write_u32_at(COUNTER_OFFSET, current + 1)?;
        Ok(current)
    }
}

/// Per-process caching wrapper: §4.3 requires repeated calls to
/// `acquire_worker_index` to return the same value for the lifetime of the
/// calling process, even though the underlying counter only moves forward.
pub struct CachingQueueHandle {
    queue: WorkQueue,
    cached_index: Cell<Option<u32>>,
}

impl CachingQueueHandle {
    pub fn new(queue: WorkQueue) -> Self {
        Self { queue, cached_index: Cell::new(None) }
    }

    pub fn acquire_worker_index(&mut self) -> Result<u32, QueueError> {
        if let Some(cached) = self.cached_index.get() {
            return Ok(cached);
        }
        let index = self.queue.acquire_worker_index()?;
        self.cached_index.set(Some(index));
        Ok(index)
    }

    pub fn read_total(&mut self) -> Result<u32, QueueError> {
        self.queue.read_total()
    }
}
