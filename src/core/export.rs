// BirthWindow - core/export.rs
//
// Flat per-slot export view, plus CSV and JSON writers.
// Core layer: writes to any Write trait object.

use crate::core::results::ResultSet;
use crate::core::timeline::Timeline;
use crate::util::constants;
use crate::util::error::ExportError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// One slot flattened to text columns. Covers every slot, alive or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotRow {
    pub start_time: String,
    /// `HH:MM`, or the unknown marker for an unfinalised non-last slot.
    pub end_time: String,
    pub hour_lord: String,
    pub ascendant_range: String,
    pub saturn_house_range: String,
    pub chiron_house_range: String,
    pub alive: bool,
}

/// Flatten every slot of `timeline`, in timeline order.
pub fn slot_rows(timeline: &Timeline) -> Vec<SlotRow> {
    timeline
        .slots()
        .iter()
        .enumerate()
        .map(|(index, slot)| SlotRow {
            start_time: slot.start_time.to_string(),
            end_time: timeline
                .slot_end(index)
                .map(|end| end.to_string())
                .unwrap_or_else(|| constants::UNKNOWN_END_MARKER.to_string()),
            hour_lord: slot.hour_lord.to_string(),
            ascendant_range: slot.ascendant_range.joined(),
            saturn_house_range: slot.saturn_range.joined(),
            chiron_house_range: slot.chiron_range.joined(),
            alive: slot.alive,
        })
        .collect()
}

/// Export slot rows to CSV with a header row.
///
/// Writes: start_time, end_time, hour_lord, ascendant_range,
/// saturn_house_range, chiron_house_range, alive
pub fn export_csv<W: Write>(
    rows: &[SlotRow],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let csv_err = |e: csv::Error| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(constants::EXPORT_HEADER)
        .map_err(csv_err)?;

    let mut count = 0;
    for row in rows {
        let alive = row.alive.to_string();
        csv_writer
            .write_record([
                row.start_time.as_str(),
                row.end_time.as_str(),
                row.hour_lord.as_str(),
                row.ascendant_range.as_str(),
                row.saturn_house_range.as_str(),
                row.chiron_house_range.as_str(),
                alive.as_str(),
            ])
            .map_err(csv_err)?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(rows = count, path = %export_path.display(), "CSV export written");
    Ok(count)
}

/// Export the aggregated result set as pretty JSON.
pub fn export_json<W: Write>(
    results: &ResultSet,
    writer: W,
    export_path: &Path,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, results).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })
}
