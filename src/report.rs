use crate::error::GeopopError;
use crate::predict::PredictionResult;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes the tab-separated result table: a fixed header and one row per
/// prediction, no footer.
///
/// The header names `Lat` before `Lon`, but each row carries the
/// longitude first — that column order is what the established consumers
/// of the table parse, so it stays.
pub fn write_results<W: Write>(mut writer: W, results: &[PredictionResult]) -> io::Result<()> {
    writer.write_all(b"Population\tSample_no\tSample_id\tPrediction\tLat\tLon\n")?;
    for r in results {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            r.group, r.sample_no, r.sample_id, r.best_population, r.long, r.lat
        )?;
    }
    Ok(())
}

pub fn write_results_to_path(path: &Path, results: &[PredictionResult]) -> Result<(), GeopopError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_results(&mut writer, results)?;
    writer.flush()?;
    Ok(())
}
