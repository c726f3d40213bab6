//! CSV export of per-sample diagnostics.

use std::{fs::File, io, path::Path};

use serde::Serialize;
use wallflux_model::DiagnosticSample;

/// Failure to write a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to create {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// One CSV row.
///
/// Fluxes are in particles/s and inventories in particles. An undefined
/// `r_eff` is written as an empty field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Row {
    pub t_s: f64,
    pub plasma: f64,
    pub wall: f64,
    pub incident_flux: f64,
    pub prompt_return: f64,
    pub release: f64,
    pub return_flux: f64,
    pub r_eff: Option<f64>,
    pub near_unity: bool,
}

impl From<&DiagnosticSample> for Row {
    fn from(sample: &DiagnosticSample) -> Self {
        Self {
            t_s: sample.t,
            plasma: sample.plasma,
            wall: sample.wall,
            incident_flux: sample.incident_flux,
            prompt_return: sample.prompt_return,
            release: sample.release,
            return_flux: sample.return_flux,
            r_eff: sample.r_eff,
            near_unity: sample.near_unity,
        }
    }
}

/// Writes one header line and one row per sample to `writer`.
///
/// # Errors
///
/// Returns [`ReportError::Csv`] if serialization or the underlying write fails.
pub fn write_csv<W: io::Write>(
    writer: W,
    diagnostics: &[DiagnosticSample],
) -> Result<(), ReportError> {
    let mut out = csv::Writer::from_writer(writer);
    for sample in diagnostics {
        out.serialize(Row::from(sample))?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes the diagnostics to a CSV file at `path`, replacing any existing file.
///
/// # Errors
///
/// Returns a [`ReportError`] if the file cannot be created or written.
pub fn write_csv_file(
    path: impl AsRef<Path>,
    diagnostics: &[DiagnosticSample],
) -> Result<(), ReportError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| ReportError::Create {
        path: path.display().to_string(),
        source,
    })?;
    write_csv(io::BufWriter::new(file), diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn sample(t: f64, r_eff: Option<f64>) -> DiagnosticSample {
        DiagnosticSample {
            t,
            plasma: 1.8e21,
            wall: 3.2e22,
            incident_flux: 5.0e20,
            prompt_return: 4.96e20,
            release: 2.0e18,
            return_flux: 4.98e20,
            net_wall_flux: 1.0e18,
            r_eff,
            near_unity: r_eff.is_some_and(|r| r >= 0.995),
        }
    }

    fn render(diagnostics: &[DiagnosticSample]) -> String {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, diagnostics).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn header_names_every_column() {
        let text = render(&[sample(0.0, Some(0.996))]);
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "t_s,plasma,wall,incident_flux,prompt_return,release,return_flux,r_eff,near_unity"
        );
    }

    #[test]
    fn writes_one_row_per_sample() {
        let text = render(&[sample(0.0, Some(0.996)), sample(0.5, Some(0.9))]);
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].ends_with(",0.996,true"));
        assert!(rows[1].ends_with(",0.9,false"));
    }

    #[test]
    fn undefined_recycling_is_an_empty_field() {
        let text = render(&[sample(1.0, None)]);
        let row = text.lines().nth(1).unwrap();
        assert!(row.ends_with(",,false"), "{row}");
    }

    #[test]
    fn values_survive_a_read_back() {
        let text = render(&[sample(2.5, Some(0.998))]);
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let record = reader.records().next().unwrap().unwrap();

        assert_relative_eq!(record[0].parse::<f64>().unwrap(), 2.5);
        assert_relative_eq!(record[2].parse::<f64>().unwrap(), 3.2e22);
        assert_relative_eq!(record[7].parse::<f64>().unwrap(), 0.998);
    }
}
