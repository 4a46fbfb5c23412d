use std::fmt;

/// Validation failures for partition configuration (§4.2, §7 "local recoverable").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionError {
    /// `configure_order` was given a string that isn't a permutation of `kpc`.
    BadOrder(String),
    /// `assign_strided` violated `stride>0, max>0, start<max`.
    BadStride { start: usize, stride: usize, max: usize },
    /// `assign_simple` violated `1<=n<=m, m>0` (one-indexed).
    BadSimpleAssignment { n: usize, m: usize },
}

impl fmt::Display for PartitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadOrder(s) => write!(f, "bad partition order {s:?}: must be a permutation of kpc"),
            Self::BadStride { start, stride, max } => write!(
                f,
                "bad strided assignment start={start} stride={stride} max={max}: require stride>0, max>0, start<max"
            ),
            Self::BadSimpleAssignment { n, m } => write!(
                f,
                "bad simple assignment {n}/{m}: require 1<=n<=m, m>0"
            ),
        }
    }
}

impl std::error::Error for PartitionError {}
