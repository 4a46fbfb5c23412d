//! Ply-1 first-move filtering: a static modulo rule or the work-queue's
//! rotation rule (§3, §4.2).

/// How a worker filters the engine's ply-1 candidate move list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstMoveFilter {
    /// No filtering: every candidate move belongs to this worker.
    Unfiltered,
    /// Static rule: keep `move_idx` iff `move_idx % total == index`.
    Static { index: usize, total: usize },
    /// Rotation rule: at the k-th target position encountered, keep
    /// `move_idx` iff `(move_idx + k) % total_workers == self_index`.
    Rotation { self_index: usize, total_workers: usize },
}

impl FirstMoveFilter {
    /// Filter `moves` (each identified by its ordinal position) for the
    /// `target_ordinal`-th target position this worker has encountered.
    pub fn filter(&self, moves: &[usize], target_ordinal: usize) -> Vec<usize> {
        match *self {
            FirstMoveFilter::Unfiltered => moves.to_vec(),
            FirstMoveFilter::Static { index, total } => moves
                .iter()
                .copied()
                .filter(|&m| m % total == index)
                .collect(),
            FirstMoveFilter::Rotation { self_index, total_workers } => moves
                .iter()
                .copied()
                .filter(|&m| (m + target_ordinal) % total_workers == self_index)
                .collect(),
        }
    }
}
