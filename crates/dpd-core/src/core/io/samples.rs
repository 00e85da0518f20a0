use crate::core::decorators::behavior::Behavior;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleExportError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV writing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Activity '{0}' does not record samples")]
    NotMeasurement(String),
}

/// Writes the samples of a measurement behaviour as CSV: a `step` column
/// followed by the behaviour's value columns.
pub fn write_samples<W: Write>(
    label: &str,
    behavior: &Behavior,
    writer: W,
) -> Result<usize, SampleExportError> {
    if !behavior.kind().is_measurement() {
        return Err(SampleExportError::NotMeasurement(label.to_string()));
    }
    let csv_err = |e: csv::Error| SampleExportError::Csv {
        path: label.to_string(),
        source: e,
    };

    let mut out = csv::Writer::from_writer(writer);
    let mut header = vec!["step"];
    header.extend_from_slice(behavior.sample_columns());
    out.write_record(&header).map_err(csv_err)?;

    for sample in behavior.samples() {
        let mut row = vec![sample.step.to_string()];
        row.extend(sample.values.iter().map(f64::to_string));
        out.write_record(&row).map_err(csv_err)?;
    }
    out.flush().map_err(|e| csv_err(e.into()))?;
    Ok(behavior.samples().len())
}

/// Writes the samples of `behavior` to the file at `path`.
pub fn export_samples(
    path: &Path,
    label: &str,
    behavior: &Behavior,
) -> Result<usize, SampleExportError> {
    let file = File::create(path).map_err(|e| SampleExportError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    write_samples(label, behavior, file)
}
