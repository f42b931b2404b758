// ============================================================
// Layer 4 — MPRA Table Loader
// ============================================================
// Reads a tab-separated activity table:
//
//   sequence<TAB>activity[<TAB>activity...]
//
// Blank lines and lines starting with '#' are skipped. The first
// data line may be a header; it is skipped when its first field
// is not a nucleotide string. Every row must carry the same
// number of activity columns.

use std::{fs, path::Path};

use crate::data::encoding::is_nucleotide_string;
use crate::domain::error::{BodaError, Result};

/// One raw row of the table
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    pub sequence: String,
    pub activity: Vec<f32>,
}

pub fn load_activity_table(path: &Path) -> Result<Vec<ActivityRecord>> {
    let text = fs::read_to_string(path).map_err(|e| {
        BodaError::Data(format!("cannot read '{}': {e}", path.display()))
    })?;
    let records = parse_activity_table(&text)?;
    tracing::info!("Loaded {} records from '{}'", records.len(), path.display());
    Ok(records)
}

pub fn parse_activity_table(text: &str) -> Result<Vec<ActivityRecord>> {
    let mut records: Vec<ActivityRecord> = Vec::new();
    let mut seen_data = false;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('\t');
        let sequence = fields.next().unwrap_or_default().trim();

        if !is_nucleotide_string(sequence) {
            if !seen_data && records.is_empty() {
                tracing::debug!("Skipping header line {}", line_no);
                seen_data = true;
                continue;
            }
            return Err(BodaError::Data(format!(
                "line {line_no}: '{sequence}' is not a DNA sequence"
            )));
        }
        seen_data = true;

        let activity = fields
            .map(|f| {
                f.trim().parse::<f32>().map_err(|_| {
                    BodaError::Data(format!("line {line_no}: bad activity value '{f}'"))
                })
            })
            .collect::<Result<Vec<f32>>>()?;

        if activity.is_empty() {
            return Err(BodaError::Data(format!("line {line_no}: no activity columns")));
        }
        if let Some(first) = records.first() {
            if first.activity.len() != activity.len() {
                return Err(BodaError::Data(format!(
                    "line {line_no}: expected {} activity columns, found {}",
                    first.activity.len(),
                    activity.len()
                )));
            }
        }

        records.push(ActivityRecord { sequence: sequence.to_string(), activity });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_header_and_comments() {
        let text = "# exported table\nsequence\tK562\tHepG2\nACGT\t1.5\t-0.5\n\nTTGA\t0.0\t2\n";
        let records = parse_activity_table(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence, "ACGT");
        assert_eq!(records[0].activity, vec![1.5, -0.5]);
        assert_eq!(records[1].activity, vec![0.0, 2.0]);
    }

    #[test]
    fn test_inconsistent_columns() {
        let text = "ACGT\t1.0\t2.0\nACGT\t1.0\n";
        assert!(matches!(parse_activity_table(text), Err(BodaError::Data(_))));
    }

    #[test]
    fn test_bad_number() {
        let text = "ACGT\tabc\n";
        let err = parse_activity_table(text).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_non_dna_after_data_is_rejected() {
        let text = "ACGT\t1.0\nhello\t2.0\n";
        assert!(parse_activity_table(text).is_err());
    }

    #[test]
    fn test_missing_activity() {
        assert!(parse_activity_table("ACGT\n").is_err());
    }
}
