//! Tab-separated clinical-trial extract.
//!
//! The CLI reads trial rows from a headered, tab-separated file. Columns are
//! resolved by header name, so extra columns and arbitrary ordering are fine;
//! only `nctid`, `criteria`, `drugs`, and `diseases` are required. `label` is
//! the known outcome (1 approved, 0 failed), carried for comparison against
//! the predicted probability when present.

use std::path::Path;

use thiserror::Error;

use crate::prompts::trial_problem;

#[derive(Debug, Error)]
pub enum TrialError {
    #[error("failed to read trial file: {0}")]
    Io(#[from] std::io::Error),

    #[error("trial file is empty")]
    Empty,

    #[error("trial file is missing the {0} column")]
    MissingColumn(&'static str),

    #[error("row {row} has {got} fields, expected {expected}")]
    MalformedRow {
        row: usize,
        got: usize,
        expected: usize,
    },

    #[error("no trial at index {index}; file has {len} rows")]
    IndexOutOfRange { index: usize, len: usize },
}

/// One clinical trial from the extract.
#[derive(Debug, Clone)]
pub struct TrialRecord {
    pub nctid: String,
    pub criteria: String,
    pub drugs: String,
    pub diseases: String,
    pub label: Option<u8>,
}

impl TrialRecord {
    /// Render this trial as the root problem statement.
    pub fn problem(&self) -> String {
        trial_problem(&self.criteria, &self.drugs, &self.diseases)
    }
}

/// Load every trial row from a tab-separated file with a header line.
pub fn load_trials(path: &Path) -> Result<Vec<TrialRecord>, TrialError> {
    let text = std::fs::read_to_string(path)?;
    let mut lines = text.lines().enumerate();

    let (_, header) = lines.next().ok_or(TrialError::Empty)?;
    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    let index_of = |name: &'static str| -> Result<usize, TrialError> {
        columns
            .iter()
            .position(|c| *c == name)
            .ok_or(TrialError::MissingColumn(name))
    };

    let nctid_idx = index_of("nctid")?;
    let criteria_idx = index_of("criteria")?;
    let drugs_idx = index_of("drugs")?;
    let diseases_idx = index_of("diseases")?;
    let label_idx = columns.iter().position(|c| *c == "label");

    let mut trials = Vec::new();
    for (row, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != columns.len() {
            return Err(TrialError::MalformedRow {
                row,
                got: fields.len(),
                expected: columns.len(),
            });
        }
        trials.push(TrialRecord {
            nctid: fields[nctid_idx].trim().to_string(),
            criteria: fields[criteria_idx].trim().to_string(),
            drugs: fields[drugs_idx].trim().to_string(),
            diseases: fields[diseases_idx].trim().to_string(),
            label: label_idx.and_then(|i| fields[i].trim().parse().ok()),
        });
    }
    Ok(trials)
}

/// Load one trial by zero-based row index.
pub fn load_trial(path: &Path, index: usize) -> Result<TrialRecord, TrialError> {
    let mut trials = load_trials(path)?;
    let len = trials.len();
    if index >= len {
        return Err(TrialError::IndexOutOfRange { index, len });
    }
    Ok(trials.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_extract(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const EXTRACT: &str = "nctid\tlabel\tphase\tdiseases\tdrugs\tcriteria\n\
                           NCT001\t1\tphase 3\theadache\taspirin\tadults 18-65\n\
                           NCT002\t0\tphase 2\tmigraine\tibuprofen\tadults 21+\n";

    #[test]
    fn loads_rows_by_header_name() {
        let file = write_extract(EXTRACT);
        let trials = load_trials(file.path()).unwrap();

        assert_eq!(trials.len(), 2);
        assert_eq!(trials[0].nctid, "NCT001");
        assert_eq!(trials[0].drugs, "aspirin");
        assert_eq!(trials[0].label, Some(1));
        assert_eq!(trials[1].diseases, "migraine");
        assert_eq!(trials[1].label, Some(0));
    }

    #[test]
    fn label_is_optional() {
        let file = write_extract(
            "nctid\tdiseases\tdrugs\tcriteria\nNCT003\theadache\taspirin\tadults\n",
        );
        let trials = load_trials(file.path()).unwrap();
        assert_eq!(trials[0].label, None);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let file = write_extract("nctid\tdiseases\tdrugs\nNCT004\theadache\taspirin\n");
        let err = load_trials(file.path()).unwrap_err();
        assert!(matches!(err, TrialError::MissingColumn("criteria")));
    }

    #[test]
    fn malformed_row_is_an_error() {
        let file = write_extract("nctid\tdiseases\tdrugs\tcriteria\nNCT005\tonly\ttwo\n");
        let err = load_trials(file.path()).unwrap_err();
        assert!(matches!(err, TrialError::MalformedRow { row: 1, .. }));
    }

    #[test]
    fn load_trial_checks_the_index() {
        let file = write_extract(EXTRACT);
        assert_eq!(load_trial(file.path(), 1).unwrap().nctid, "NCT002");

        let err = load_trial(file.path(), 5).unwrap_err();
        assert!(matches!(
            err,
            TrialError::IndexOutOfRange { index: 5, len: 2 }
        ));
    }

    #[test]
    fn record_renders_the_problem_statement() {
        let file = write_extract(EXTRACT);
        let trial = load_trial(file.path(), 0).unwrap();
        let problem = trial.problem();
        assert!(problem.contains("#criteria#: adults 18-65"));
        assert!(problem.contains("#drugs#: aspirin"));
    }
}
