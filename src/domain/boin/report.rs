//! Text rendering of engine results.
//!
//! The column labels and block headings here are what the conversation
//! displays; downstream readers rely on their exact wording and order.

use std::fmt;

use super::results::{BoundaryTable, MtdSelection, OperatingCharacteristics};

/// Column labels of the boundary table, in display order.
pub const BOUNDARY_COLUMNS: [&str; 5] = [
    "Patients Treated",
    "Escalate if ≤",
    "De-escalate if ≥",
    "Stay if =",
    "Eliminate if ≥",
];

pub const SELECTION_HEADING: &str = "Percentage of selecting each dose as MTD";
pub const PATIENTS_HEADING: &str = "Percentage of patients treated at each dose level";
pub const TOXICITY_HEADING: &str = "Percentage of toxicity at each dose level";

impl fmt::Display for BoundaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 5]> = self
            .rows
            .iter()
            .map(|row| {
                let stay = match row.stay_range() {
                    Some((low, high)) if low == high => low.to_string(),
                    Some((low, high)) => format!("{}-{}", low, high),
                    None => "-".to_string(),
                };
                [
                    row.patients_treated.to_string(),
                    row.escalate_at_most.to_string(),
                    row.deescalate_at_least.to_string(),
                    stay,
                    row.eliminate_at_least
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "NA".to_string()),
                ]
            })
            .collect();

        let mut widths = BOUNDARY_COLUMNS.map(|label| label.chars().count());
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write_row(f, &BOUNDARY_COLUMNS[..], &widths)?;
        for row in &cells {
            writeln!(f)?;
            write_row(f, &row[..], &widths)?;
        }

        if let Some(thresholds) = self.thresholds {
            writeln!(f)?;
            writeln!(f)?;
            write!(
                f,
                "Escalate if the observed DLT rate ≤ {:.3}; de-escalate if ≥ {:.3}; \
                 eliminate a dose if P(toxicity > target) > 0.95",
                thresholds.escalation, thresholds.deescalation
            )?;
        }
        Ok(())
    }
}

fn write_row<S: AsRef<str>>(f: &mut fmt::Formatter<'_>, cells: &[S], widths: &[usize]) -> fmt::Result {
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            write!(f, "  ")?;
        }
        write!(f, "{:>width$}", cell.as_ref(), width = *width)?;
    }
    Ok(())
}

impl fmt::Display for OperatingCharacteristics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_percent_block(f, SELECTION_HEADING, &self.selection_percent)?;
        writeln!(f)?;
        writeln!(f)?;
        write_percent_block(f, PATIENTS_HEADING, &self.patients_percent)?;
        writeln!(f)?;
        writeln!(f)?;
        write_percent_block(f, TOXICITY_HEADING, &self.toxicity_percent)
    }
}

fn write_percent_block(f: &mut fmt::Formatter<'_>, heading: &str, values: &[f64]) -> fmt::Result {
    let labels: Vec<String> = (1..=values.len()).map(|i| format!("Dose {}", i)).collect();
    let cells: Vec<String> = values.iter().map(|v| format!("{:.1}", round1(*v))).collect();
    let widths: Vec<usize> = labels
        .iter()
        .zip(&cells)
        .map(|(l, c)| l.len().max(c.len()))
        .collect();

    writeln!(f, "{}:", heading)?;
    write_row(f, &labels[..], &widths)?;
    writeln!(f)?;
    write_row(f, &cells[..], &widths)
}

/// Rounds half away from zero to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl fmt::Display for MtdSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dose_level {
            Some(level) => write!(f, "Selected MTD: Dose Level {}", level),
            None => write!(f, "Selected MTD: none (all doses too toxic)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::boin::{BoundaryRow, DecisionThresholds};

    fn sample_table() -> BoundaryTable {
        BoundaryTable::new(vec![
            BoundaryRow {
                patients_treated: 3,
                escalate_at_most: 0,
                deescalate_at_least: 2,
                eliminate_at_least: Some(3),
            },
            BoundaryRow {
                patients_treated: 1,
                escalate_at_most: 0,
                deescalate_at_least: 1,
                eliminate_at_least: None,
            },
            BoundaryRow {
                patients_treated: 12,
                escalate_at_most: 2,
                deescalate_at_least: 5,
                eliminate_at_least: Some(7),
            },
        ])
    }

    mod boundary_table {
        use super::*;

        #[test]
        fn header_lists_columns_in_order() {
            let text = sample_table().to_string();
            let header = text.lines().next().unwrap();
            let mut last = 0;
            for label in BOUNDARY_COLUMNS {
                let pos = header.find(label).expect(label);
                assert!(pos >= last, "{} out of order", label);
                last = pos;
            }
        }

        #[test]
        fn one_line_per_row() {
            let text = sample_table().to_string();
            assert_eq!(text.lines().count(), 4);
        }

        #[test]
        fn stay_column_shows_single_count_range_and_dash() {
            let text = sample_table().to_string();
            let lines: Vec<&str> = text.lines().collect();
            assert!(lines[1].split_whitespace().eq(["3", "0", "2", "1", "3"]));
            assert!(lines[2].split_whitespace().eq(["1", "0", "1", "-", "NA"]));
            assert!(lines[3].split_whitespace().eq(["12", "2", "5", "3-4", "7"]));
        }

        #[test]
        fn thresholds_render_as_rules_line() {
            let table = sample_table().with_thresholds(DecisionThresholds {
                escalation: 0.236,
                deescalation: 0.359,
            });
            let text = table.to_string();
            assert!(text.contains("≤ 0.236"));
            assert!(text.contains("≥ 0.359"));
        }
    }

    mod operating_characteristics {
        use super::*;

        #[test]
        fn blocks_appear_in_fixed_order() {
            let oc = OperatingCharacteristics {
                selection_percent: vec![10.0, 60.0, 30.0],
                patients_percent: vec![30.0, 50.0, 20.0],
                toxicity_percent: vec![5.0, 20.0, 40.0],
            };
            let text = oc.to_string();
            let s = text.find(SELECTION_HEADING).unwrap();
            let p = text.find(PATIENTS_HEADING).unwrap();
            let t = text.find(TOXICITY_HEADING).unwrap();
            assert!(s < p && p < t);
        }

        #[test]
        fn values_rounded_to_one_decimal() {
            let oc = OperatingCharacteristics {
                selection_percent: vec![12.345, 87.65],
                patients_percent: vec![33.333, 66.667],
                toxicity_percent: vec![0.04, 99.96],
            };
            let text = oc.to_string();
            assert!(text.contains("12.3"));
            assert!(text.contains("33.3"));
            assert!(text.contains("66.7"));
            assert!(text.contains("0.0"));
            assert!(text.contains("100.0"));
            assert!(!text.contains("12.345"));
        }

        #[test]
        fn dose_labels_follow_vector_length() {
            let oc = OperatingCharacteristics {
                selection_percent: vec![1.0, 2.0, 3.0, 4.0],
                patients_percent: vec![1.0, 2.0, 3.0, 4.0],
                toxicity_percent: vec![1.0, 2.0, 3.0, 4.0],
            };
            let text = oc.to_string();
            assert!(text.contains("Dose 4"));
            assert!(!text.contains("Dose 5"));
        }
    }

    mod mtd_selection {
        use super::*;

        #[test]
        fn renders_selected_level() {
            assert_eq!(
                MtdSelection::dose(2).to_string(),
                "Selected MTD: Dose Level 2"
            );
        }

        #[test]
        fn renders_no_selection() {
            assert!(MtdSelection::none().to_string().contains("none"));
        }
    }

    #[test]
    fn round1_rounds_half_away_from_zero() {
        assert_eq!(round1(0.25), 0.3);
        assert_eq!(round1(12.34), 12.3);
    }
}
