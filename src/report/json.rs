//! JSON report output

use super::{MovieReport, Summary};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct JsonReport<'a> {
    generated: String,
    version: &'static str,
    summary: Summary,
    movies: &'a [MovieReport],
}

pub fn write<W: Write>(writer: &mut W, reports: &[MovieReport]) -> io::Result<()> {
    let report = JsonReport {
        generated: chrono::Local::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        summary: Summary::from_reports(reports),
        movies: reports,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{failed_report, sample_report};

    #[test]
    fn test_json_structure() {
        let mut buf = Vec::new();
        write(&mut buf, &[sample_report(), failed_report()]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["movies"][0]["analysis"]["characters"][0]["name"], "LUKE");
        assert_eq!(value["movies"][0]["analysis"]["characters"][0]["color"], "rgb(92,173,79)");
        assert!(value["movies"][1]["analysis"].is_null());
        assert!(value["movies"][1]["error"].is_string());
    }

    #[test]
    fn test_nan_written_as_null() {
        let mut buf = Vec::new();
        write(&mut buf, &[sample_report()]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        // LUKE/HAN: first turn is HAN's, so LUKE's series starts with a gap
        let pair = &value["movies"][0]["analysis"]["featured_pair"];
        assert!(pair["result"]["scores_a"][0].is_null());
        assert_eq!(pair["result"]["scores_b"][0], 0.8);
    }
}
