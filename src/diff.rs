use crate::baseline::{Baseline, StoredRow};
use crate::config::Alignment;
use crate::snapshot::{Diff, ScrapeSnapshot, UNPARSED};
use std::collections::HashMap;

/// Fill in each row's diff against the stored baseline.
///
/// Rows with no stored counterpart, or with the -1 sentinel on either side,
/// keep `NA`.
pub fn apply(snapshot: &mut ScrapeSnapshot, baseline: &Baseline, alignment: Alignment) {
    let stored = baseline.rows();
    match alignment {
        Alignment::Ordinal => {
            for (row, prev) in snapshot.rows.iter_mut().zip(stored.iter()) {
                if let Some(prev) = prev {
                    row.diff = delta(row.count, prev.count);
                }
            }
        }
        Alignment::ByName => {
            let mut by_name: HashMap<&str, &StoredRow> = HashMap::new();
            for prev in stored.iter().flatten() {
                by_name.entry(prev.name.as_str()).or_insert(prev);
            }
            for row in &mut snapshot.rows {
                if let Some(prev) = by_name.get(row.name.as_str()) {
                    row.diff = delta(row.count, prev.count);
                }
            }
        }
    }
}

fn delta(current: i64, previous: i64) -> Diff {
    if current == UNPARSED || previous == UNPARSED {
        Diff::NotAvailable
    } else {
        Diff::Delta(current - previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{EnvironmentRow, format_line, header_lines};
    use chrono::Local;

    fn snapshot(rows: &[(&str, i64)]) -> ScrapeSnapshot {
        ScrapeSnapshot::new(
            Local::now(),
            rows.iter().map(|(n, c)| EnvironmentRow::new(*n, *c)).collect(),
        )
    }

    fn baseline_of(snap: &ScrapeSnapshot) -> Baseline {
        let mut lines = snap.to_lines();
        let timestamp = lines.remove(0);
        Baseline { timestamp, lines }
    }

    fn diffs(snap: &ScrapeSnapshot) -> Vec<Diff> {
        snap.rows.iter().map(|r| r.diff).collect()
    }

    #[test]
    fn test_self_diff_is_zero() {
        for alignment in [Alignment::ByName, Alignment::Ordinal] {
            let mut snap = snapshot(&[("EnvA", 3), ("EnvB", 0), ("EnvC", 41)]);
            let baseline = baseline_of(&snap);
            apply(&mut snap, &baseline, alignment);
            assert_eq!(diffs(&snap), vec![Diff::Delta(0); 3]);
        }
    }

    #[test]
    fn test_stored_row_example() {
        let [titles, spacer] = header_lines();
        let baseline = Baseline {
            timestamp: "1/2/2026 9:00:00 AM".into(),
            lines: vec![titles, spacer, format_line("EnvA", "3", "NA")],
        };
        for alignment in [Alignment::ByName, Alignment::Ordinal] {
            let mut snap = snapshot(&[("EnvA", 5)]);
            apply(&mut snap, &baseline, alignment);
            assert_eq!(
                snap.rows[0].to_line(),
                "|EnvA                        |5         |2         |"
            );
        }
    }

    #[test]
    fn test_by_name_survives_reordering() {
        let baseline = baseline_of(&snapshot(&[("EnvA", 1), ("EnvB", 10)]));

        let mut by_name = snapshot(&[("EnvB", 12), ("EnvA", 1)]);
        apply(&mut by_name, &baseline, Alignment::ByName);
        assert_eq!(diffs(&by_name), vec![Diff::Delta(2), Diff::Delta(0)]);

        // Positional matching compares EnvB with the stored EnvA row.
        let mut ordinal = snapshot(&[("EnvB", 12), ("EnvA", 1)]);
        apply(&mut ordinal, &baseline, Alignment::Ordinal);
        assert_eq!(diffs(&ordinal), vec![Diff::Delta(11), Diff::Delta(-9)]);
    }

    #[test]
    fn test_rows_without_baseline_keep_na() {
        let baseline = baseline_of(&snapshot(&[("EnvA", 4)]));
        let mut snap = snapshot(&[("EnvA", 4), ("EnvNew", 2)]);
        apply(&mut snap, &baseline, Alignment::Ordinal);
        assert_eq!(diffs(&snap), vec![Diff::Delta(0), Diff::NotAvailable]);

        let mut snap = snapshot(&[("EnvA", 4), ("EnvNew", 2)]);
        apply(&mut snap, &baseline, Alignment::ByName);
        assert_eq!(diffs(&snap), vec![Diff::Delta(0), Diff::NotAvailable]);
    }

    #[test]
    fn test_unparsed_rows_keep_na() {
        let baseline = baseline_of(&snapshot(&[("EnvA", UNPARSED), ("EnvB", 2)]));
        let mut snap = snapshot(&[("EnvA", 5), ("EnvB", UNPARSED)]);
        apply(&mut snap, &baseline, Alignment::ByName);
        assert_eq!(diffs(&snap), vec![Diff::NotAvailable, Diff::NotAvailable]);
    }
}
