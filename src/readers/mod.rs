pub mod csv_reader;

pub use csv_reader::{decode_text, CsvRowReader, RowIssue, RowOutcome, SourceRow};
