use std::fmt;
use std::io;

/// Work-queue I/O failure. Always recoverable per §4.3/§7: the caller is
/// expected to fall back to an unfiltered search rather than propagate this.
#[derive(Debug)]
pub struct QueueError(io::Error);

impl QueueError {
    pub fn new(source: io::Error) -> Self {
        Self(source)
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "work-queue I/O failure: {}", self.0)
    }
}

impl std::error::Error for QueueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<io::Error> for QueueError {
    fn from(e: io::Error) -> Self {
        Self(e)
    }
}
