//! CSV report output: one row per listed character

use super::MovieReport;
use std::io::{self, Write};

const HEADER: &str = "file,title,rank,character,line_count,avg_cs,color,error";

pub fn write<W: Write>(writer: &mut W, reports: &[MovieReport]) -> io::Result<()> {
    writeln!(writer, "{}", HEADER)?;

    for r in reports {
        let Some(ref analysis) = r.analysis else {
            writeln!(
                writer,
                "{},{},,,,,,{}",
                escape(&r.file_path),
                escape(r.title()),
                escape(r.error.as_deref().unwrap_or(""))
            )?;
            continue;
        };

        for row in &analysis.characters {
            writeln!(
                writer,
                "{},{},{},{},{},{:.3},{},",
                escape(&r.file_path),
                escape(r.title()),
                row.rank,
                escape(&row.name),
                row.line_count,
                row.avg_cs,
                escape(&row.color.to_string())
            )?;
        }
    }

    Ok(())
}

/// Quote a field when it contains a delimiter, quote or line break
fn escape(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{failed_report, sample_report};

    #[test]
    fn test_escape() {
        assert_eq!(escape("LUKE"), "LUKE");
        assert_eq!(escape("rgb(1,2,3)"), "\"rgb(1,2,3)\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_rows() {
        let mut buf = Vec::new();
        write(&mut buf, &[sample_report(), failed_report()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], HEADER);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "/scripts/sample.json,Sample,1,LUKE,3,0.367,\"rgb(92,173,79)\",");
        assert!(lines[4].starts_with("/scripts/broken.json,broken.json,,,,,,"));
    }
}
