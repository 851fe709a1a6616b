//! Column naming
//!
//! Turns extract column metadata into [`ColumnDescriptor`]s: sanitized
//! lowercase names that are safe as output identifiers, lowercase type
//! names, and the original name kept as a parameter.

use crate::hyper::{ExtractColumn, quote_identifier};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Column metadata written to the JSON sidecar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "Type")]
    pub type_name: String,
    pub comment: String,
    pub parameters: ColumnParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnParameters {
    /// Quoted SQL identifier of the column, e.g. `"Customer Name"`
    #[serde(rename = "tdsColName")]
    pub tds_col_name: String,
}

impl ColumnDescriptor {
    pub fn new(column: &ExtractColumn) -> Self {
        let identifier = quote_identifier(&column.name);
        Self {
            name: sanitize_column_name(&identifier),
            type_name: normalize_type_name(&column.type_name),
            comment: String::new(),
            parameters: ColumnParameters {
                tds_col_name: identifier,
            },
        }
    }
}

/// Lowercase, spaces to underscores, double quotes removed.
///
/// ```
/// use tdsx_exporter::transform::sanitize_column_name;
///
/// assert_eq!(sanitize_column_name("Customer Name"), "customer_name");
/// assert_eq!(sanitize_column_name("Region\""), "region");
/// ```
pub fn sanitize_column_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_").replace('"', "")
}

/// Lowercase type name in the extract API's spelling
pub fn normalize_type_name(type_name: &str) -> String {
    let lower = type_name.trim().to_lowercase();

    // Parameterized types keep their modifier, e.g. character varying(255)
    let (base, modifier) = match lower.find('(') {
        Some(pos) => (lower[..pos].trim_end(), &lower[pos..]),
        None => (lower.as_str(), ""),
    };

    let mapped = match base {
        "bigint" | "int8" => "big_int",
        "integer" | "int4" => "int",
        "smallint" | "int2" => "small_int",
        "double precision" | "float8" => "double",
        "real" | "float4" => "float",
        "boolean" | "bool" => "bool",
        "bytea" => "bytes",
        "timestamp without time zone" => "timestamp",
        "timestamp with time zone" => "timestamp_tz",
        "character varying" => "varchar",
        "character" => "char",
        other => other,
    };

    format!("{}{}", mapped, modifier)
}

/// Descriptors for a table's columns with names unique within the table.
///
/// When two columns sanitize to the same name, later ones get `_2`, `_3`, ...
pub fn describe_columns(columns: &[ExtractColumn]) -> Vec<ColumnDescriptor> {
    let mut seen = HashSet::new();

    columns
        .iter()
        .map(|column| {
            let mut descriptor = ColumnDescriptor::new(column);
            if !seen.insert(descriptor.name.clone()) {
                let base = descriptor.name.clone();
                let mut suffix = 2;
                while !seen.insert(format!("{}_{}", base, suffix)) {
                    suffix += 1;
                }
                descriptor.name = format!("{}_{}", base, suffix);
                log::warn!(
                    "Column '{}' collides with another column as '{}', renamed to '{}'",
                    column.name,
                    base,
                    descriptor.name
                );
            }
            descriptor
        })
        .collect()
}
