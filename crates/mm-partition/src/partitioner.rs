//! The worker-side configuration object: combo ordering, combo assignment
//! and first-move filter, bundled behind the operations §4.2 names.
use crate::assignment::Assignment;
use crate::error::PartitionError;
use crate::first_move::FirstMoveFilter;
use crate::order::Order;
use mm_core::COMBO_SPACE;

/// Mutable partition configuration installed into a worker before it starts
/// driving the engine (§4.4 step 3). Pure and side-effect free once
/// configured: `in_partition` and `filter_first_moves` never mutate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    order: Order,
    assignment: Assignment,
    first_move: FirstMoveFilter,
}

impl Default for Partitioner {
    fn default() -> Self {
        Self {
            order: Order::default_order(),
            assignment: Assignment::whole(COMBO_SPACE),
            first_move: FirstMoveFilter::Unfiltered,
        }
    }
}

impl Partitioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure_order(&mut self, order: &str) -> Result<(), PartitionError> {
        self.order = Order::parse(order)?;
        Ok(())
    }

    pub fn assign_strided(&mut self, start: usize, stride: usize, max: usize) -> Result<(), PartitionError> {
        self.assignment = Assignment::strided(start, stride, max)?;
        Ok(())
    }

    /// One-indexed per the `-partition N/M` CLI grammar (§6).
    pub fn assign_simple(&mut self, n: usize, m: usize) -> Result<(), PartitionError> {
        self.assignment = Assignment::simple_one_indexed(n, m, COMBO_SPACE)?;
        Ok(())
    }

    /// Restrict the assignment to a single combo index, used with
    /// `-single-combo` together with a first-move filter (§6).
    pub fn assign_single_combo(&mut self, index: usize) {
        self.assignment = Assignment::strided(index, COMBO_SPACE, COMBO_SPACE)
            .expect("single-combo assignment is always valid for index < COMBO_SPACE");
    }

    pub fn in_partition(&self, king: usize, checker: usize, check_sq: usize) -> bool {
        self.assignment.in_partition(self.combo_index(king, checker, check_sq))
    }

    /// The scalar combo index under the configured order, used as the
    /// `COMBO:<label>` status label (§4.1, literal scenario 3).
    pub fn combo_index(&self, king: usize, checker: usize, check_sq: usize) -> usize {
        self.order.combo_index(king, checker, check_sq)
    }

    pub fn set_first_move(&mut self, index: usize, total: usize) {
        self.first_move = FirstMoveFilter::Static { index, total };
    }

    pub fn set_first_move_rotation(&mut self, self_index: usize, total_workers: usize) {
        self.first_move = FirstMoveFilter::Rotation { self_index, total_workers };
    }

    pub fn filter_first_moves(&self, moves: &[usize], target_ordinal: usize) -> Vec<usize> {
        self.first_move.filter(moves, target_ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_partitioner_covers_everything_unfiltered() {
        let p = Partitioner::new();
        assert!(p.in_partition(0, 0, 0));
        assert!(p.in_partition(63, 14, 63));
        assert_eq!(p.filter_first_moves(&[0, 1, 2, 3], 0), vec![0, 1, 2, 3]);
    }

    #[test]
    fn configure_order_rejects_bad_strings() {
        let mut p = Partitioner::new();
        assert!(p.configure_order("xyz").is_err());
        assert!(p.configure_order("pkc").is_ok());
    }

    #[test]
    fn single_combo_assignment_matches_exactly_one_index() {
        let mut p = Partitioner::new();
        p.assign_single_combo(30_212);
        let order = Order::default_order();
        // find the coordinates that hash to 30212 under the default order
        // by linear scan (small enough, and keeps this test independent of
        // the order's internal fast/mid/slow wiring).
        let mut hit = None;
        'search: for king in 0..64usize {
            for checker in 0..15usize {
                for check_sq in 0..64usize {
                    if order.combo_index(king, checker, check_sq) == 30_212 {
                        hit = Some((king, checker, check_sq));
                        break 'search;
                    }
                }
            }
        }
        let (king, checker, check_sq) = hit.expect("30212 is a valid combo index");
        assert!(p.in_partition(king, checker, check_sq));
        assert!(!p.in_partition(0, 0, 0));
    }
}
