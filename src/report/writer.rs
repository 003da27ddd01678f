//! Report output: CSV, console table and JSON.

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{ReportRow, COLUMNS};
use crate::utils::{terminal_width, truncate_with_ellipsis};

/// Narrowest title column, whatever the terminal width
const MIN_TITLE_WIDTH: usize = 20;

/// Errors raised while writing a report
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Failed to write {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write rows as CSV with a header row.
///
/// The header is written even when there are no rows.
pub fn write_csv<W: Write>(rows: &[ReportRow], writer: W) -> Result<(), WriteError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(COLUMNS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Create `path` for writing, along with any missing parent directories.
pub fn create_output_file(path: &Path) -> Result<BufWriter<File>, WriteError> {
    let file_error = |source| WriteError::File {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(file_error)?;
    }
    let file = File::create(path).map_err(file_error)?;
    Ok(BufWriter::new(file))
}

/// Write rows as CSV to `path`, creating parent directories as needed.
pub fn write_csv_file(rows: &[ReportRow], path: &Path) -> Result<(), WriteError> {
    write_csv(rows, create_output_file(path)?)?;

    tracing::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write rows as a pretty-printed JSON array.
pub fn write_json<W: Write>(rows: &[ReportRow], mut writer: W) -> Result<(), WriteError> {
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writeln!(writer)?;
    Ok(())
}

/// Render rows as a console table sized to the terminal.
pub fn render_table(rows: &[ReportRow]) -> String {
    let width = terminal_width();
    let title_width = (width / 3).max(MIN_TITLE_WIDTH);

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(u16::try_from(width).unwrap_or(u16::MAX))
        .set_header(COLUMNS.to_vec());

    for row in rows {
        table.add_row(vec![
            Cell::new(&row.pubmed_id),
            Cell::new(truncate_with_ellipsis(&row.title, title_width)).add_attribute(Attribute::Bold),
            Cell::new(&row.publication_date),
            Cell::new(&row.non_academic_authors),
            Cell::new(&row.company_affiliations),
            Cell::new(&row.corresponding_email),
        ]);
    }
    table.to_string()
}
