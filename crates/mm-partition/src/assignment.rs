//! Combo-index assignment: which combo indices a worker is responsible for.
use crate::error::PartitionError;

/// A worker's combo assignment, always normalised to the strided form
/// (`(n, m)` simple assignment is sugar for `(n, m, max)`, per §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    start: usize,
    stride: usize,
    max: usize,
}

impl Assignment {
    /// The strided form: work this combo iff
    /// `index >= start && (index - start) % stride == 0 && index < max`.
    pub fn strided(start: usize, stride: usize, max: usize) -> Result<Assignment, PartitionError> {
        if stride == 0 || max == 0 || start >= max {
            return Err(PartitionError::BadStride { start, stride, max });
        }
        Ok(Assignment { start, stride, max })
    }

    /// One-indexed simple form `(n, m)`, sugar for `(n-1, m, max)`.
    pub fn simple_one_indexed(n: usize, m: usize, max: usize) -> Result<Assignment, PartitionError> {
        if m == 0 || n == 0 || n > m {
            return Err(PartitionError::BadSimpleAssignment { n, m });
        }
        Assignment::strided(n - 1, m, max).map_err(|_| PartitionError::BadSimpleAssignment { n, m })
    }

    /// Zero-indexed simple form `(n, m)`, sugar for `(n, m, max)`.
    pub fn simple_zero_indexed(n: usize, m: usize, max: usize) -> Result<Assignment, PartitionError> {
        if m == 0 || n >= m {
            return Err(PartitionError::BadSimpleAssignment { n, m });
        }
        Assignment::strided(n, m, max).map_err(|_| PartitionError::BadSimpleAssignment { n, m })
    }

    /// The assignment covering the whole combo space (single-worker default).
    pub fn whole(max: usize) -> Assignment {
        Assignment { start: 0, stride: 1, max }
    }

    pub fn in_partition(&self, index: usize) -> bool {
        index >= self.start && index < self.max && (index - self.start) % self.stride == 0
    }
}
