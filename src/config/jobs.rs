use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{ConfigError, Result, StashError};
use crate::job::{JobEntry, JobSpec};

const FIELDS: usize = 4;

/// Reads a job table: a header row, then `command, params, source, destination`
/// rows. A malformed row yields an error entry for that row only; failing to
/// open the file is fatal.
pub fn load_jobs(path: &Path) -> Result<Vec<JobEntry>> {
    let file = File::open(path)
        .map_err(|e| StashError::message(format!("open jobs {}: {}", path.display(), e)))?;
    Ok(parse_jobs(file))
}

pub fn parse_jobs<R: io::Read>(reader: R) -> Vec<JobEntry> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    reader
        .records()
        .enumerate()
        .map(|(idx, record)| {
            let row = idx + 1;
            match record {
                Ok(record) => parse_row(row, &record),
                Err(e) => Err(ConfigError::Row {
                    row,
                    message: e.to_string(),
                }),
            }
        })
        .collect()
}

fn parse_row(row: usize, record: &StringRecord) -> JobEntry {
    if record.len() != FIELDS {
        return Err(ConfigError::Row {
            row,
            message: format!(
                "expected {} fields (command, params, source, destination), found {}: {:?}",
                FIELDS,
                record.len(),
                record.iter().collect::<Vec<_>>()
            ),
        });
    }
    Ok(JobSpec::new(&record[0], &record[1], &record[2], &record[3]))
}
