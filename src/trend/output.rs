use crate::error::{Result, TrendError};
use crate::model::{Row, TrendOutput, SCHEMA_VERSION};
use chrono::Utc;
use std::io::Write;
use std::path::Path;

/// Receives the trend as it is computed. Rows arrive oldest first.
pub trait Output {
    /// Called once before any row, with the column labels in display order.
    fn start(&mut self, columns: &[String]) -> Result<()>;

    /// Called once per analyzed commit.
    fn add_row(&mut self, row: &Row) -> Result<()>;

    /// Called after the last row. A good time to write files.
    fn finish(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Tsv,
    Csv,
    Json,
    Ndjson,
}

impl OutputFormat {
    /// Format implied by a file name such as `trends.csv`. A bare `.csv`
    /// or `csv` names just the format.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_else(|| name.trim_start_matches('.'));
        match ext.to_ascii_lowercase().as_str() {
            "tsv" => Ok(Self::Tsv),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            _ => Err(TrendError::UnsupportedFormat(name.to_string())),
        }
    }

    pub fn into_output<W: Write + 'static>(
        self,
        dest: W,
        repository_path: String,
        start_commit: String,
    ) -> Box<dyn Output> {
        match self {
            Self::Tsv => Box::new(SeparatedValuesOutput::new(dest, '\t')),
            Self::Csv => Box::new(SeparatedValuesOutput::new(dest, ',')),
            Self::Json => Box::new(JsonOutput::new(dest, repository_path, start_commit)),
            Self::Ndjson => Box::new(NdjsonOutput::new(dest)),
        }
    }
}

/// `.tsv` and `.csv` style output.
pub struct SeparatedValuesOutput<W: Write> {
    dest: W,
    separator: char,
    columns: Vec<String>,
}

impl<W: Write> SeparatedValuesOutput<W> {
    pub fn new(dest: W, separator: char) -> Self {
        Self {
            dest,
            separator,
            columns: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.dest
    }
}

impl<W: Write> Output for SeparatedValuesOutput<W> {
    fn start(&mut self, columns: &[String]) -> Result<()> {
        self.columns = columns.to_vec();

        // Pad with spaces in place of a date so tabs line up
        write!(self.dest, "{}", " ".repeat("YYYY-MM-DD".len()))?;
        for column in columns {
            write!(self.dest, "{}{}", self.separator, column)?;
        }
        writeln!(self.dest)?;
        Ok(())
    }

    fn add_row(&mut self, row: &Row) -> Result<()> {
        write!(self.dest, "{}", row.date)?;
        for column in &self.columns {
            match row.percent(column) {
                Some(percent) => write!(self.dest, "{}{}", self.separator, percent)?,
                None => write!(self.dest, "{}{}", self.separator, row.lines(column))?,
            }
        }
        writeln!(self.dest)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.dest.flush()?;
        Ok(())
    }
}

/// One pretty printed document, written when the run finishes.
pub struct JsonOutput<W: Write> {
    dest: W,
    document: TrendOutput,
}

impl<W: Write> JsonOutput<W> {
    pub fn new(dest: W, repository_path: String, start_commit: String) -> Self {
        Self {
            dest,
            document: TrendOutput {
                version: SCHEMA_VERSION,
                generated_at: Utc::now(),
                repository_path,
                start_commit,
                columns: Vec::new(),
                rows: Vec::new(),
            },
        }
    }
}

impl<W: Write> Output for JsonOutput<W> {
    fn start(&mut self, columns: &[String]) -> Result<()> {
        self.document.columns = columns.to_vec();
        Ok(())
    }

    fn add_row(&mut self, row: &Row) -> Result<()> {
        self.document.rows.push(row.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.dest, &self.document)?;
        writeln!(self.dest)?;
        self.dest.flush()?;
        Ok(())
    }
}

/// One JSON object per row, streamed as rows arrive.
pub struct NdjsonOutput<W: Write> {
    dest: W,
}

impl<W: Write> NdjsonOutput<W> {
    pub fn new(dest: W) -> Self {
        Self { dest }
    }
}

impl<W: Write> Output for NdjsonOutput<W> {
    fn start(&mut self, _columns: &[String]) -> Result<()> {
        Ok(())
    }

    fn add_row(&mut self, row: &Row) -> Result<()> {
        serde_json::to_writer(&mut self.dest, row)?;
        writeln!(self.dest)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.dest.flush()?;
        Ok(())
    }
}

/// Keeps everything in memory. Handy for library users and tests.
#[derive(Debug, Default)]
pub struct CollectOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub finished: bool,
}

impl Output for CollectOutput {
    fn start(&mut self, columns: &[String]) -> Result<()> {
        self.columns = columns.to_vec();
        Ok(())
    }

    fn add_row(&mut self, row: &Row) -> Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn row(date: &str, lines: &[(&str, u64)]) -> Row {
        Row::new(
            date.to_string(),
            "0123abcd".to_string(),
            lines.iter().map(|(c, l)| (c.to_string(), *l)).collect(),
        )
    }

    fn columns() -> Vec<String> {
        vec![".yml".to_string(), ".rs".to_string()]
    }

    #[test]
    fn tsv_pads_header_and_fills_missing_with_zero() {
        let mut out = SeparatedValuesOutput::new(Vec::new(), '\t');
        out.start(&columns()).unwrap();
        out.add_row(&row("2021-01-23", &[(".yml", 66), (".rs", 121)])).unwrap();
        out.add_row(&row("2021-01-24", &[(".rs", 196)])).unwrap();
        out.finish().unwrap();

        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(
            text,
            "          \t.yml\t.rs\n2021-01-23\t66\t121\n2021-01-24\t0\t196\n"
        );
    }

    #[test]
    fn relative_rows_print_percentages() {
        let mut out = SeparatedValuesOutput::new(Vec::new(), '\t');
        out.start(&[".rs".to_string(), ".yml".to_string(), ".md".to_string()])
            .unwrap();
        out.add_row(&row("2021-01-19", &[(".rs", 33), (".yml", 0), (".md", 1)]).with_percentages())
            .unwrap();
        out.add_row(&row("2021-01-24", &[(".rs", 0), (".yml", 0), (".md", 0)]).with_percentages())
            .unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(
            text,
            "          \t.rs\t.yml\t.md\n2021-01-19\t97.06\t0\t2.94\n2021-01-24\t0\t0\t0\n"
        );
    }

    #[test]
    fn csv_uses_commas() {
        let mut out = SeparatedValuesOutput::new(Vec::new(), ',');
        out.start(&[".m+.h".to_string()]).unwrap();
        out.add_row(&row("2021-01-23", &[(".m+.h", 14)])).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(text, "          ,.m+.h\n2021-01-23,14\n");
    }

    #[test]
    fn json_document_holds_columns_and_rows() {
        let mut buf = Vec::new();
        {
            let mut out = JsonOutput::new(&mut buf, "/repo".into(), "HEAD".into());
            out.start(&columns()).unwrap();
            out.add_row(&row("2021-01-23", &[(".yml", 1), (".rs", 2)])).unwrap();
            out.finish().unwrap();
        }
        let doc: TrendOutput = serde_json::from_slice(&buf).unwrap();
        assert_eq!(doc.version, SCHEMA_VERSION);
        assert_eq!(doc.columns, columns());
        assert_eq!(doc.rows.len(), 1);
        assert_eq!(
            doc.rows[0].column_to_lines,
            BTreeMap::from([(".rs".to_string(), 2), (".yml".to_string(), 1)])
        );
    }

    #[test]
    fn ndjson_writes_a_line_per_row() {
        let mut buf = Vec::new();
        {
            let mut out = NdjsonOutput::new(&mut buf);
            out.start(&columns()).unwrap();
            out.add_row(&row("2021-01-23", &[(".rs", 2)])).unwrap();
            out.add_row(&row("2021-02-23", &[(".rs", 3)])).unwrap();
            out.finish().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let rows: Vec<Row> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].lines(".rs"), 3);
    }

    #[test]
    fn format_follows_file_extension() {
        assert_eq!(OutputFormat::from_file_name("out.csv").unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_file_name("a/b.TSV").unwrap(), OutputFormat::Tsv);
        assert_eq!(OutputFormat::from_file_name(".json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_file_name("csv").unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_file_name("x.jsonl").unwrap(), OutputFormat::Ndjson);
        assert!(matches!(
            OutputFormat::from_file_name("graph.svg"),
            Err(TrendError::UnsupportedFormat(_))
        ));
    }
}
