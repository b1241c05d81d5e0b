//! CSV export reader and watchlist CSV writer.

use crate::adapters::artifact_payload::WatchlistCsvRow;
use crate::domain::error::PremarketError;
use crate::domain::record::RawRecord;
use std::fs;
use std::path::Path;

/// Read a screener export into header-keyed raw rows, in file order.
///
/// Cells are trimmed. Short rows are padded with blanks so every row carries
/// every header; a byte-order mark on the first header is dropped.
pub fn read_export(path: &Path) -> Result<Vec<RawRecord>, PremarketError> {
    let bytes = fs::read(path)?;
    parse_export(&bytes, &path.display().to_string())
}

pub fn parse_export(bytes: &[u8], source: &str) -> Result<Vec<RawRecord>, PremarketError> {
    let parse_err = |e: csv::Error| PremarketError::ExportParse {
        file: source.to_string(),
        reason: e.to_string(),
    };

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(parse_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(PremarketError::ExportParse {
            file: source.to_string(),
            reason: "export has no header row".into(),
        });
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(parse_err)?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(RawRecord::new(columns));
    }
    tracing::debug!(source, rows = rows.len(), columns = headers.len(), "read export");
    Ok(rows)
}

pub fn write_watchlist_csv(path: &Path, rows: &[WatchlistCsvRow]) -> Result<(), PremarketError> {
    let artifact_err = |reason: String| PremarketError::Artifact {
        artifact: path.display().to_string(),
        reason,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(|e| artifact_err(e.to_string()))?;
    if rows.is_empty() {
        wtr.write_record(WatchlistCsvRow::HEADERS)
            .map_err(|e| artifact_err(e.to_string()))?;
    }
    for row in rows {
        wtr.serialize(row).map_err(|e| artifact_err(e.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}
