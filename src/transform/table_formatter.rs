//! Table formatter transformer
//!
//! Turns a scanned extract table into a [`DelimitedTable`]: named output
//! file, column descriptors for the header, and rows checked against them.

use super::column_namer::{ColumnDescriptor, describe_columns};
use crate::etl::Transformer;
use crate::hyper::{HYPER_EXTENSION, Row, ScannedTable};

use eyre::Result;

/// Extension of delimited output files
pub const DELIMITED_EXTENSION: &str = "csv";

/// A table ready to be written as delimited text
#[derive(Debug, Clone, PartialEq)]
pub struct DelimitedTable {
    /// Output file name, e.g. `Extract.csv`
    pub file_name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Row>,
}

impl DelimitedTable {
    /// Header row of sanitized column names
    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Output file name for an extract file: `Extract.hyper` becomes `Extract.csv`
pub fn delimited_file_name(extract_file: &str) -> String {
    let suffix = format!(".{}", HYPER_EXTENSION);
    let stem = extract_file.strip_suffix(&suffix).unwrap_or(extract_file);
    format!("{}.{}", stem, DELIMITED_EXTENSION)
}

/// Transformer from [`ScannedTable`] to [`DelimitedTable`]
///
/// # Example
/// ```
/// use tdsx_exporter::etl::Transformer;
/// use tdsx_exporter::hyper::{ExtractColumn, ScannedTable, TableName};
/// use tdsx_exporter::transform::TableFormatter;
///
/// let scanned = ScannedTable {
///     file_name: "Extract.hyper".to_string(),
///     table: TableName::new("Extract", "Extract"),
///     columns: vec![ExtractColumn::new("Customer Name", "text")],
///     rows: vec![vec![Some("Ada".to_string())]],
/// };
///
/// let table = TableFormatter.transform(scanned).unwrap();
/// assert_eq!(table.file_name, "Extract.csv");
/// assert_eq!(table.header(), vec!["customer_name"]);
/// ```
pub struct TableFormatter;

impl Transformer for TableFormatter {
    type Input = ScannedTable;
    type Output = DelimitedTable;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        let columns = describe_columns(&input.columns);

        if let Some((index, row)) = input
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            eyre::bail!(
                "Row {} of {} has {} field(s) but the table has {} column(s)",
                index,
                input.table,
                row.len(),
                columns.len()
            );
        }

        Ok(DelimitedTable {
            file_name: delimited_file_name(&input.file_name),
            columns,
            rows: input.rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hyper::{ExtractColumn, TableName, cell};

    fn scanned(columns: Vec<ExtractColumn>, rows: Vec<Row>) -> ScannedTable {
        ScannedTable {
            file_name: "Extract.hyper".to_string(),
            table: TableName::new("Extract", "Extract"),
            columns,
            rows,
        }
    }

    #[test]
    fn test_delimited_file_name() {
        assert_eq!(delimited_file_name("Extract.hyper"), "Extract.csv");
        assert_eq!(delimited_file_name("my.hyper.hyper"), "my.hyper.csv");
        assert_eq!(delimited_file_name("noext"), "noext.csv");
    }

    #[test]
    fn test_header_matches_columns() {
        let table = TableFormatter
            .transform(scanned(
                vec![
                    ExtractColumn::new("Customer Name", "text"),
                    ExtractColumn::new("Sales", "double precision"),
                ],
                vec![vec![cell("Ada"), cell("1.5")]],
            ))
            .unwrap();

        assert_eq!(table.header(), vec!["customer_name", "sales"]);
        assert_eq!(table.header().len(), table.columns.len());
        assert_eq!(table.columns[1].type_name, "double");
    }

    #[test]
    fn test_rows_kept_in_order() {
        let rows = vec![vec![cell("3")], vec![cell("1")], vec![None]];
        let table = TableFormatter
            .transform(scanned(vec![ExtractColumn::new("n", "int")], rows.clone()))
            .unwrap();
        assert_eq!(table.rows, rows);
    }

    #[test]
    fn test_ragged_row_rejected() {
        let result = TableFormatter.transform(scanned(
            vec![ExtractColumn::new("a", "text"), ExtractColumn::new("b", "text")],
            vec![vec![cell("1"), cell("2")], vec![cell("only one")]],
        ));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Row 1"));
    }
}
