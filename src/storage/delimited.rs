//! Tab-delimited output files

use crate::transform::DelimitedTable;

use eyre::{Context, Result, eyre};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes [`DelimitedTable`]s as a header row plus data rows.
///
/// Fields are tab-separated and records end with `\r\n`. NULL cells are
/// written empty; fields holding a tab, quote, or line break are quoted.
pub struct DelimitedWriter {
    dir: PathBuf,
    delimiter: u8,
    compress: bool,
}

impl DelimitedWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            delimiter: b'\t',
            compress: false,
        }
    }

    /// Gzip the output and add `.gz` to the file name
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// File name the table will be written under
    pub fn output_name(&self, table: &DelimitedTable) -> String {
        match self.compress {
            true => format!("{}.gz", table.file_name),
            false => table.file_name.clone(),
        }
    }

    /// Write one table, returning the path written
    pub fn write(&self, table: &DelimitedTable) -> Result<PathBuf> {
        let path = self.dir.join(self.output_name(table));
        let file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;

        if self.compress {
            let encoder = self.write_records(GzEncoder::new(file, Compression::default()), table)?;
            encoder
                .finish()
                .with_context(|| format!("Failed to finish {}", path.display()))?;
        } else {
            let mut writer = self.write_records(BufWriter::new(file), table)?;
            writer
                .flush()
                .with_context(|| format!("Failed to flush {}", path.display()))?;
        }

        log::info!(
            "Wrote {} row(s) x {} column(s) to {}",
            table.rows.len(),
            table.columns.len(),
            path.display()
        );

        Ok(path)
    }

    fn write_records<W: Write>(&self, out: W, table: &DelimitedTable) -> Result<W> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .terminator(csv::Terminator::CRLF)
            .from_writer(out);

        writer
            .write_record(table.header())
            .with_context(|| "Failed to write header row")?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }

        writer
            .into_inner()
            .map_err(|e| eyre!("Failed to flush delimited output: {}", e.error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hyper::{ExtractColumn, cell};
    use crate::transform::describe_columns;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn table(rows: Vec<Vec<Option<String>>>) -> DelimitedTable {
        DelimitedTable {
            file_name: "Extract.csv".to_string(),
            columns: describe_columns(&[
                ExtractColumn::new("Customer Name", "text"),
                ExtractColumn::new("Sales", "double precision"),
                ExtractColumn::new("Region", "text"),
            ]),
            rows,
        }
    }

    #[test]
    fn test_write_exact_output() {
        let temp = TempDir::new().unwrap();
        let writer = DelimitedWriter::new(temp.path());

        let path = writer
            .write(&table(vec![
                vec![cell("Ada"), cell("10.5"), cell("East")],
                vec![cell("Grace"), None, cell("West")],
                vec![cell("Linus"), cell("0"), cell("")],
            ]))
            .unwrap();

        assert_eq!(path, temp.path().join("Extract.csv"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "customer_name\tsales\tregion\r\n\
             Ada\t10.5\tEast\r\n\
             Grace\t\tWest\r\n\
             Linus\t0\t\r\n"
        );
    }

    #[test]
    fn test_records_end_with_crlf() {
        let temp = TempDir::new().unwrap();
        let path = DelimitedWriter::new(temp.path())
            .write(&table(vec![vec![cell("a"), cell("b"), cell("c")]]))
            .unwrap();

        let bytes = std::fs::read(path).unwrap();
        assert!(bytes.ends_with(b"a\tb\tc\r\n"));
        let bare_lf = bytes
            .iter()
            .enumerate()
            .filter(|(i, b)| **b == b'\n' && (*i == 0 || bytes[i - 1] != b'\r'))
            .count();
        assert_eq!(bare_lf, 0);
    }

    #[test]
    fn test_header_field_count_matches_rows() {
        let temp = TempDir::new().unwrap();
        let writer = DelimitedWriter::new(temp.path());
        let path = writer
            .write(&table(vec![vec![cell("a"), cell("b"), cell("c")]]))
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let counts: Vec<usize> = content.lines().map(|l| l.split('\t').count()).collect();
        assert_eq!(counts, vec![3, 3]);
    }

    #[test]
    fn test_special_characters_quoted() {
        let temp = TempDir::new().unwrap();
        let writer = DelimitedWriter::new(temp.path());
        let path = writer
            .write(&table(vec![vec![cell("tab\there"), cell("say \"hi\""), cell("two\nlines")]]))
            .unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "tab\there");
        assert_eq!(&record[1], "say \"hi\"");
        assert_eq!(&record[2], "two\nlines");
    }

    #[test]
    fn test_empty_table_writes_header() {
        let temp = TempDir::new().unwrap();
        let path = DelimitedWriter::new(temp.path()).write(&table(vec![])).unwrap();
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "customer_name\tsales\tregion\r\n"
        );
    }

    #[test]
    fn test_compressed_output() {
        let temp = TempDir::new().unwrap();
        let writer = DelimitedWriter::new(temp.path()).with_compression(true);
        let path = writer
            .write(&table(vec![vec![cell("Ada"), cell("1"), cell("East")]]))
            .unwrap();

        assert_eq!(path, temp.path().join("Extract.csv.gz"));
        let mut decoded = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "customer_name\tsales\tregion\r\nAda\t1\tEast\r\n");
    }
}
