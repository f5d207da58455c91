use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use shelf_core::{CollectionRequest, HarvestResult, ProductRecord};
use thiserror::Error;

use crate::filename::stamped_stem;
use crate::persist::{AtomicFileWriter, PersistError};

const CSV_HEADERS: [&str; 6] = ["title", "price", "rating", "reviews_count", "url", "is_seed"];
const CSV_DELIMITER: u8 = b';';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedResults {
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Write `result` as `<prefix>_<stamp>.csv` and `.json` into `dir`.
///
/// Returns `Ok(None)` without touching the disk when there are no records.
pub fn save_results(
    result: &HarvestResult,
    request: &CollectionRequest,
    dir: &Path,
    stamp: &str,
) -> Result<Option<SavedResults>, ExportError> {
    if result.is_empty() {
        engine_warn!("Nothing to save: no records harvested.");
        return Ok(None);
    }

    let writer = AtomicFileWriter::new(dir.to_path_buf());
    let stem = stamped_stem(&request.result_prefix(), stamp);

    let csv = records_to_csv(&result.records)?;
    let csv_path = writer.write_bytes(&format!("{stem}.csv"), &csv)?;
    engine_info!("Results saved to CSV: {}", csv_path.display());

    let json = serde_json::to_string_pretty(result)?;
    let json_path = writer.write(&format!("{stem}.json"), &json)?;
    engine_info!("Results saved to JSON: {}", json_path.display());

    Ok(Some(SavedResults {
        csv_path,
        json_path,
    }))
}

/// Semicolon-delimited table with a header row; absent fields are empty cells.
pub fn records_to_csv(records: &[ProductRecord]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.write_record([
            record.title.clone().unwrap_or_default(),
            optional(record.price),
            optional(record.rating),
            optional(record.reviews_count),
            record.url.clone(),
            optional(record.is_seed),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportError::Csv(csv::Error::from(err.into_error())))
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
