use crate::error::Result;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::{Encoding, WINDOWS_1252};
use memmap2::Mmap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// A source row that could not be turned into a typed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    /// 1-based line number in the source file (the header is line 1).
    pub line: u64,
    /// The raw row as read, fields joined by the delimiter.
    pub content: String,
    pub reason: String,
}

impl RowIssue {
    pub fn new(line: u64, content: String, reason: String) -> Self {
        Self {
            line,
            content,
            reason,
        }
    }
}

/// A decoded row together with the line it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow<R> {
    pub line: u64,
    pub record: R,
}

pub type RowOutcome<R> = std::result::Result<SourceRow<R>, RowIssue>;

/// Reads a delimited file with a header line into typed rows.
///
/// Failing to open or read the file is fatal. A row that does not decode
/// is returned as a [`RowIssue`] in its place so the caller can skip it.
pub struct CsvRowReader {
    delimiter: u8,
    use_mmap: bool,
}

impl CsvRowReader {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            use_mmap: false,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Read every row of the file at `path`
    pub fn read_rows<R: DeserializeOwned>(&self, path: &Path) -> Result<Vec<RowOutcome<R>>> {
        info!("Reading CSV file: {}", path.display());

        let rows = if self.use_mmap {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            self.parse_rows(decode_text(&mmap).as_bytes())?
        } else {
            let file = File::open(path)?;
            let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            self.parse_rows(decode_text(&bytes).as_bytes())?
        };

        debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }

    /// Decode rows from any UTF-8 input
    pub fn parse_rows<R: DeserializeOwned, I: Read>(&self, input: I) -> Result<Vec<RowOutcome<R>>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        let mut rows = Vec::new();

        for result in reader.records() {
            match result {
                Ok(record) => {
                    let line = record.position().map_or(0, |p| p.line());
                    match record.deserialize::<R>(Some(&headers)) {
                        Ok(record) => rows.push(Ok(SourceRow { line, record })),
                        Err(e) => rows.push(Err(RowIssue::new(
                            line,
                            self.render(&record),
                            e.to_string(),
                        ))),
                    }
                }
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    let line = e.position().map_or(0, |p| p.line());
                    rows.push(Err(RowIssue::new(line, String::new(), e.to_string())));
                }
            }
        }

        Ok(rows)
    }

    fn render(&self, record: &StringRecord) -> String {
        let separator = char::from(self.delimiter).to_string();
        record.iter().collect::<Vec<_>>().join(&separator)
    }
}

impl Default for CsvRowReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode source bytes to text. A byte-order mark selects the encoding;
/// otherwise UTF-8 is assumed, with Windows-1252 as the fallback for
/// files exported from legacy tools.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return text;
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            warn!("Source is not valid UTF-8, decoding as Windows-1252");
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text
        }
    }
}
