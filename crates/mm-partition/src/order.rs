//! Combo-index ordering: which of the three combo dimensions varies fastest.
use crate::error::PartitionError;
use mm_core::{CHECKER_CARD, CHECK_SQ_CARD, KING_CARD};

/// One of the three combo-space dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    King,
    Checker,
    CheckSq,
}

impl Dim {
    fn cardinality(self) -> usize {
        match self {
            Dim::King => KING_CARD,
            Dim::Checker => CHECKER_CARD,
            Dim::CheckSq => CHECK_SQ_CARD,
        }
    }

    fn coordinate(self, king: usize, checker: usize, check_sq: usize) -> usize {
        match self {
            Dim::King => king,
            Dim::Checker => checker,
            Dim::CheckSq => check_sq,
        }
    }

    fn from_char(c: char) -> Option<Dim> {
        match c {
            'k' => Some(Dim::King),
            'p' => Some(Dim::Checker),
            'c' => Some(Dim::CheckSq),
            _ => None,
        }
    }
}

/// A permutation of `{k, p, c}` fixing which dimension varies fastest
/// (`order[0]`), middling (`order[1]`), and slowest (`order[2]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order([Dim; 3]);

/// The default order: king varies fastest.
pub const DEFAULT_ORDER: &str = "kpc";

impl Order {
    /// Parse a 3-letter permutation of `kpc`, e.g. `"kpc"`, `"pkc"`.
    pub fn parse(s: &str) -> Result<Order, PartitionError> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 3 {
            return Err(PartitionError::BadOrder(s.to_string()));
        }
        let dims: Vec<Dim> = chars
            .iter()
            .filter_map(|&c| Dim::from_char(c))
            .collect();
        if dims.len() != 3 {
            return Err(PartitionError::BadOrder(s.to_string()));
        }
        let mut seen = [false; 3];
        for d in &dims {
            let slot = match d {
                Dim::King => 0,
                Dim::Checker => 1,
                Dim::CheckSq => 2,
            };
            if seen[slot] {
                return Err(PartitionError::BadOrder(s.to_string()));
            }
            seen[slot] = true;
        }
        Ok(Order([dims[0], dims[1], dims[2]]))
    }

    pub fn default_order() -> Order {
        Self::parse(DEFAULT_ORDER).expect("default order is a valid permutation")
    }

    /// Compute the scalar combo index for `(king, checker, check_sq)` under
    /// this ordering: `slowest_v*(mid_card*fast_card) + mid_v*fast_card + fast_v`.
    pub fn combo_index(&self, king: usize, checker: usize, check_sq: usize) -> usize {
        let [fast, mid, slow] = self.0;
        let fast_card = fast.cardinality();
        let mid_card = mid.cardinality();
        let fast_v = fast.coordinate(king, checker, check_sq);
        let mid_v = mid.coordinate(king, checker, check_sq);
        let slow_v = slow.coordinate(king, checker, check_sq);
        slow_v * (mid_card * fast_card) + mid_v * fast_card + fast_v
    }
}
