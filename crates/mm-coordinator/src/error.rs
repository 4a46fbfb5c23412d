use std::fmt;
use std::io;

/// A per-worker `pipe`/`fork` failure (§4.7): always recoverable, the caller
/// logs and continues with one fewer active worker.
#[derive(Debug)]
pub struct SpawnError {
    pub partition_id: usize,
    source: io::Error,
}

impl SpawnError {
    pub fn new(partition_id: usize, source: io::Error) -> Self {
        Self { partition_id, source }
    }
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker {} failed to start: {}", self.partition_id, self.source)
    }
}

impl std::error::Error for SpawnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
