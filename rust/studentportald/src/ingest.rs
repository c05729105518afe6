use std::ops::Range;
use std::path::Path;

use crate::config::IngestSettings;
use crate::error::PortalError;
use crate::records::StudentRecord;
use crate::store::{RecordStore, StoreError};
use crate::workbook;

// Fixed column order of the roster sheet: BIL, NAMA PENUH, NO. KP, ID DELIMA, KATA LALUAN.
const COL_FULL_NAME: usize = 1;
const COL_IDENTITY: usize = 2;
const COL_EXTERNAL_ID: usize = 3;
const COL_PASSWORD: usize = 4;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRows {
    pub records: Vec<StudentRecord>,
    /// Data rows after the header, blank rows included.
    pub rows_examined: usize,
    /// Rows dropped for a missing or too-short identity number.
    pub skipped_rows: usize,
}

pub fn parse_rows(rows: &[Vec<String>], settings: &IngestSettings) -> ParsedRows {
    let mut parsed = ParsedRows::default();
    for row in rows.iter().skip(1) {
        parsed.rows_examined += 1;
        match map_row(row, settings) {
            Some(r) => parsed.records.push(r),
            None => parsed.skipped_rows += 1,
        }
    }
    parsed
}

fn map_row(row: &[String], settings: &IngestSettings) -> Option<StudentRecord> {
    let cell = |i: usize| row.get(i).map(|s| s.as_str()).unwrap_or("");

    let identity = cell(COL_IDENTITY).trim();
    if identity.is_empty() || identity.chars().count() < settings.min_identity_length {
        return None;
    }
    Some(StudentRecord::from_cells(
        identity,
        cell(COL_FULL_NAME),
        cell(COL_EXTERNAL_ID),
        cell(COL_PASSWORD),
        settings,
    ))
}

/// Consecutive index ranges of at most `batch_size` records covering `0..total`.
pub fn plan_batches(total: usize, batch_size: usize) -> Vec<Range<usize>> {
    let size = batch_size.max(1);
    (0..total)
        .step_by(size)
        .map(|start| start..(start + size).min(total))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgress {
    pub batch_number: usize,
    pub batch_count: usize,
    pub committed: usize,
    pub total: usize,
}

impl UploadProgress {
    pub fn message(&self) -> String {
        format!(
            "Uploaded batch {} ({}/{} records)...",
            self.batch_number, self.committed, self.total
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub records_written: usize,
    pub batches: usize,
}

/// Writes records batch by batch, strictly in order. The first failing batch stops the
/// upload; batches committed before it stay committed.
pub fn upload_records<S, F>(
    store: &mut S,
    records: &[StudentRecord],
    batch_size: usize,
    mut on_batch: F,
) -> Result<UploadSummary, StoreError>
where
    S: RecordStore + ?Sized,
    F: FnMut(&UploadProgress),
{
    let size = batch_size.min(store.max_batch_size());
    let plan = plan_batches(records.len(), size);
    let batch_count = plan.len();
    for (i, range) in plan.into_iter().enumerate() {
        let end = range.end;
        store.batch_upsert(&records[range])?;
        on_batch(&UploadProgress {
            batch_number: i + 1,
            batch_count,
            committed: end,
            total: records.len(),
        });
    }
    Ok(UploadSummary {
        records_written: records.len(),
        batches: batch_count,
    })
}

/// Append-only log of user-facing progress lines.
#[derive(Debug, Clone, Default)]
pub struct ProgressLog {
    lines: Vec<String>,
}

impl ProgressLog {
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("ingest: {}", message);
        self.lines.push(message);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub records_written: usize,
    pub rows_examined: usize,
    pub skipped_rows: usize,
    pub batches: usize,
}

/// Reads and decodes a workbook file, then uploads every valid row.
pub fn ingest_file<S: RecordStore + ?Sized>(
    store: &mut S,
    path: &Path,
    settings: &IngestSettings,
    progress: &mut ProgressLog,
) -> Result<IngestOutcome, PortalError> {
    progress.push("Reading Excel file...");
    let bytes = std::fs::read(path).map_err(|e| PortalError::Read(e.to_string()))?;
    let grid =
        workbook::read_first_sheet(bytes).map_err(|e| PortalError::Decode(format!("{e:#}")))?;
    log::info!("ingest: decoded {} rows from the first sheet", grid.len());
    let parsed = parse_rows(&grid, settings);
    if parsed.skipped_rows > 0 {
        log::info!(
            "ingest: skipped {} of {} data rows without a valid identity number",
            parsed.skipped_rows,
            parsed.rows_examined
        );
    }
    if parsed.records.is_empty() {
        return Err(PortalError::NoValidData);
    }

    let total = parsed.records.len();
    progress.push(format!("Uploading {} student records...", total));
    let summary = upload_records(store, &parsed.records, settings.batch_size, |p| {
        log::debug!("ingest: batch {}/{} committed", p.batch_number, p.batch_count);
        progress.push(p.message());
    })?;
    progress.push(format!("All {} records uploaded successfully!", total));

    Ok(IngestOutcome {
        records_written: summary.records_written,
        rows_examined: parsed.rows_examined,
        skipped_rows: parsed.skipped_rows,
        batches: summary.batches,
    })
}
