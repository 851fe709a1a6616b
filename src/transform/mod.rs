//! Transform implementations for extract tables
//!
//! Column naming and the table-to-delimited-text conversion.

mod column_namer;
mod table_formatter;

pub use column_namer::{
    ColumnDescriptor, ColumnParameters, describe_columns, normalize_type_name,
    sanitize_column_name,
};
pub use table_formatter::{
    DELIMITED_EXTENSION, DelimitedTable, TableFormatter, delimited_file_name,
};
