//! Human-facing status rendering: the periodic worker-pool summary line
//! (§4.5 step 5) and the probe-mode heavy-combo summary table (§4.5 Probe
//! mode). Purely presentational — neither touches the partitioning math nor
//! the protocol grammar.
use crate::worker::WorkerRecord;
use colored::Colorize;
use std::time::Duration;

fn format_depth(depth: u32) -> String {
    format!("{}+{}", depth / 100, depth % 100)
}

/// A combo seen as "still running" when a probe-mode phase timed out,
/// accumulated across every order tried (§3 heavy-combo record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeavyCombo {
    pub label: String,
    pub seen_count: u32,
    pub max_depth: u32,
}

/// Capped at [`mm_core::HEAVY_COMBO_CAP`] distinct labels.
#[derive(Default)]
pub struct HeavyComboTable {
    entries: Vec<HeavyCombo>,
}

impl HeavyComboTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The leading run of digits in `label` is the key entries are merged
    /// on (§3: "keyed by the leading integer in label").
    fn key(label: &str) -> &str {
        let end = label.find(|c: char| !c.is_ascii_digit()).unwrap_or(label.len());
        &label[..end]
    }

    /// Record that `label` was still running, at `depth`, when a probe
    /// phase timed out. Silently dropped once the table is full.
    pub fn record(&mut self, label: &str, depth: u32) {
        let key = Self::key(label);
        if let Some(entry) = self.entries.iter_mut().find(|e| e.label == key) {
            entry.seen_count += 1;
            entry.max_depth = entry.max_depth.max(depth);
            return;
        }
        if self.entries.len() < mm_core::HEAVY_COMBO_CAP {
            self.entries.push(HeavyCombo { label: key.to_string(), seen_count: 1, max_depth: depth });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted by `seen_count` descending, ties broken by `max_depth` descending.
    pub fn summary(&self) -> Vec<&HeavyCombo> {
        let mut entries: Vec<&HeavyCombo> = self.entries.iter().collect();
        entries.sort_by(|a, b| b.seen_count.cmp(&a.seen_count).then(b.max_depth.cmp(&a.max_depth)));
        entries
    }
}

pub fn render_heavy_combo_table(table: &HeavyComboTable) -> String {
    let mut rendered = format!("{:<12}{:>6}   {}\n", "combo", "seen", "max depth");
    for entry in table.summary() {
        rendered.push_str(&format!(
            "{:<12}{:>6}   {}\n",
            entry.label,
            entry.seen_count,
            format_depth(entry.max_depth)
        ));
    }
    rendered
}

/// One periodic status line (§4.5 step 5): active worker count, and, when
/// few enough workers remain, each one's current combo label.
pub fn render_status_line(workers: &[WorkerRecord], elapsed: Duration) -> String {
    let active: Vec<&WorkerRecord> = workers.iter().filter(|w| !w.finished).collect();
    let mut line = format!("[{:>8.2}s] {} active", elapsed.as_secs_f64(), active.len());
    if active.len() <= mm_core::STATUS_LABEL_THRESHOLD {
        for worker in &active {
            let label = worker.current_combo_label.as_deref().unwrap_or("-");
            line.push_str(&format!(" {}:{}", worker.partition_id, label.yellow()));
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Literal scenario 3: three probe orders report heavy combos; the
    /// summary sorts 30212 (seen 3 times) ahead of 512 (seen once).
    #[test]
    fn scenario_three_probe_sorting() {
        let mut table = HeavyComboTable::new();
        table.record("30212", 1 * 100 + 14);
        table.record("30212", 1 * 100 + 14);
        table.record("30212", 1 * 100 + 16);
        table.record("512", 1 * 100 + 5);
        let summary = table.summary();
        assert_eq!(summary[0].label, "30212");
        assert_eq!(summary[0].seen_count, 3);
        assert_eq!(summary[0].max_depth, 116);
        assert_eq!(summary[1].label, "512");
        assert_eq!(summary[1].seen_count, 1);
    }

    #[test]
    fn table_is_capped_at_256_distinct_labels() {
        let mut table = HeavyComboTable::new();
        for i in 0..300 {
            table.record(&i.to_string(), 0);
        }
        assert_eq!(table.len(), mm_core::HEAVY_COMBO_CAP);
    }

    #[test]
    fn rendered_table_lists_entries_in_sorted_order() {
        let mut table = HeavyComboTable::new();
        table.record("1", 100);
        table.record("1", 100);
        table.record("2", 100);
        let rendered = render_heavy_combo_table(&table);
        let first_line_idx = rendered.find('1').unwrap();
        let second_line_idx = rendered.find('2').unwrap();
        assert!(first_line_idx < second_line_idx);
    }
}
