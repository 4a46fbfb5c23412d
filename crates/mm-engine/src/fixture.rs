//! A deterministic test double for [`Engine`](crate::Engine), used to drive
//! `mm-worker` and `mm-coordinator` end-to-end without a real chess solver.
//! Not a production code path — only built under the `testing` feature.
use crate::{Combo, Engine};
use mm_protocol::Record;
use std::collections::HashMap;
use std::io::Write;

/// An engine whose combo space, ply-1 move lists and per-combo output are
/// all supplied up front by the test author.
#[derive(Default)]
pub struct FixtureEngine {
    combos: Vec<Combo>,
    moves: HashMap<Combo, Vec<usize>>,
    scripts: HashMap<Combo, Vec<Record>>,
}

impl FixtureEngine {
    pub fn new(combos: Vec<Combo>) -> Self {
        Self { combos, moves: HashMap::new(), scripts: HashMap::new() }
    }

    /// Set the ply-1 candidate move list this combo will offer.
    pub fn with_moves(mut self, combo: Combo, moves: Vec<usize>) -> Self {
        self.moves.insert(combo, moves);
        self
    }

    /// Set the canned protocol records this combo emits when solved.
    pub fn with_script(mut self, combo: Combo, records: Vec<Record>) -> Self {
        self.scripts.insert(combo, records);
        self
    }
}

impl Engine for FixtureEngine {
    fn combos(&self) -> Vec<Combo> {
        self.combos.clone()
    }

    fn first_moves(&mut self, combo: Combo) -> Vec<usize> {
        self.moves.get(&combo).cloned().unwrap_or_default()
    }

    fn solve(&mut self, combo: Combo, _moves: &[usize], out: &mut dyn Write) -> std::io::Result<()> {
        if let Some(script) = self.scripts.get(&combo) {
            for record in script {
                record.write_line(out)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_replays_its_script_verbatim() {
        let combo = (0, 0, 0);
        let mut engine = FixtureEngine::new(vec![combo])
            .with_moves(combo, vec![0, 1, 2])
            .with_script(combo, vec![Record::Progress { m: 1, k: 0, positions: 3 }, Record::Finished]);
        assert_eq!(engine.combos(), vec![combo]);
        assert_eq!(engine.first_moves(combo), vec![0, 1, 2]);
        let mut buf = Vec::new();
        engine.solve(combo, &[0, 1, 2], &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "@@PROGRESS:1+0:3\n@@FINISHED\n"
        );
    }

    #[test]
    fn unscripted_combo_emits_nothing() {
        let combo = (1, 1, 1);
        let mut engine = FixtureEngine::new(vec![combo]);
        let mut buf = Vec::new();
        engine.solve(combo, &[], &mut buf).unwrap();
        assert!(buf.is_empty());
    }
}
