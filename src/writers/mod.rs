pub mod parquet_writer;

pub use parquet_writer::{ParquetCatalogWriter, ParquetFileInfo};

use crate::error::Result;
use crate::models::CatalogBundle;
use serde::{Deserialize, Serialize};

/// Destination for a finished catalog.
///
/// A load either publishes every table or none of them. Loading the same
/// bundle twice leaves the destination unchanged.
pub trait CatalogSink {
    fn load(&self, bundle: &CatalogBundle) -> Result<LoadSummary>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub table: String,
    pub rows_received: usize,
    /// Rows left after collapsing duplicate keys
    pub rows_written: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub tables: Vec<TableSummary>,
}

impl LoadSummary {
    pub fn rows_written(&self, table: &str) -> Option<usize> {
        self.tables
            .iter()
            .find(|t| t.table == table)
            .map(|t| t.rows_written)
    }

    pub fn summary(&self) -> String {
        self.tables
            .iter()
            .map(|t| {
                if t.rows_received == t.rows_written {
                    format!("{}: {} rows", t.table, t.rows_written)
                } else {
                    format!(
                        "{}: {} rows ({} duplicates collapsed)",
                        t.table,
                        t.rows_written,
                        t.rows_received - t.rows_written
                    )
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
