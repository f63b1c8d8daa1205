//! Report output.
//!
//! [`CsvReportSink`] publishes the three report tables as CSV files. Every table is staged in a
//! temporary file next to its destination and only renamed into place once all three have been
//! written. The files being replaced are parked until the last rename succeeds and moved back if
//! any rename fails, so readers see either the previous generation or the new one.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::SinkResult;
use crate::pipeline::TripReports;
use crate::types::DataSet;

/// Destination for a finished set of reports.
pub trait ReportSink {
    /// Make all tables of `reports` visible at once; on error the previous outputs remain.
    fn publish(&self, reports: &TripReports) -> SinkResult<()>;
}

/// Write `dataset` as CSV: a header row, then one record per row.
///
/// Values use their [`std::fmt::Display`] form; nulls are empty cells.
pub fn write_csv<W: io::Write>(dataset: &DataSet, writer: W) -> SinkResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(dataset.schema.field_names())?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `<table>.csv` files into one output directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct CsvReportSink {
    output_dir: PathBuf,
}

impl CsvReportSink {
    /// Sink writing into `output_dir`; nothing touches the filesystem until [`ReportSink::publish`].
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory the report files are published into.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Final location of the table called `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}.csv"))
    }

    fn stage(&self, name: &str, dataset: &DataSet) -> SinkResult<NamedTempFile> {
        let mut staged = tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .suffix(".tmp")
            .tempfile_in(&self.output_dir)?;
        write_csv(dataset, staged.as_file_mut())?;
        staged.as_file().sync_all()?;
        Ok(staged)
    }
}

impl ReportSink for CsvReportSink {
    fn publish(&self, reports: &TripReports) -> SinkResult<()> {
        fs::create_dir_all(&self.output_dir)?;

        // Dropping a NamedTempFile deletes it, so an early return cleans up what was staged.
        let mut staged = Vec::with_capacity(3);
        for (name, dataset) in reports.tables() {
            staged.push((name, dataset.row_count(), self.stage(name, dataset)?));
        }

        // Replaced files wait here; the directory and whatever is left in it go on return.
        let previous = tempfile::Builder::new()
            .prefix(".previous.")
            .tempdir_in(&self.output_dir)?;

        let mut swapped = Vec::with_capacity(staged.len());
        for (name, rows, file) in staged {
            let dest = self.path_for(name);
            let parking_spot = previous.path().join(format!("{name}.csv"));
            match swap_in(file, &dest, &parking_spot) {
                Ok(parked) => swapped.push((name, rows, Swapped { dest, parked })),
                Err(e) => {
                    roll_back(swapped.iter().map(|(_, _, s)| s));
                    return Err(e.into());
                }
            }
        }

        for (name, rows, Swapped { dest, .. }) in &swapped {
            tracing::info!(table = *name, rows, path = %dest.display(), "published report");
        }
        Ok(())
    }
}

/// A table renamed into place and, if it replaced a file, where that file was parked.
struct Swapped {
    dest: PathBuf,
    parked: Option<PathBuf>,
}

/// Park the file currently at `dest` (if any) at `parking_spot`, then rename `file` onto `dest`.
///
/// Only regular files are parked; anything else at `dest` makes the rename fail.
fn swap_in(file: NamedTempFile, dest: &Path, parking_spot: &Path) -> io::Result<Option<PathBuf>> {
    let parked = if dest.is_file() {
        fs::rename(dest, parking_spot)?;
        Some(parking_spot.to_path_buf())
    } else {
        None
    };

    if let Err(e) = file.persist(dest) {
        if let Some(parked) = &parked {
            if let Err(restore) = fs::rename(parked, dest) {
                tracing::error!(path = %dest.display(), error = %restore, "could not restore previous report");
            }
        }
        return Err(e.error);
    }
    Ok(parked)
}

/// Undo completed swaps, newest first: put parked files back, remove files that were new.
fn roll_back<'a>(swapped: impl DoubleEndedIterator<Item = &'a Swapped>) {
    for swap in swapped.rev() {
        let undone = match &swap.parked {
            Some(parked) => fs::rename(parked, &swap.dest),
            None => fs::remove_file(&swap.dest),
        };
        if let Err(e) = undone {
            tracing::error!(path = %swap.dest.display(), error = %e, "could not roll back report");
        }
    }
}
