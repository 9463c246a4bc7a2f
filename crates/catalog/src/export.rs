//! Daily bulk-export parsing.
//!
//! The catalog publishes one gzipped newline-delimited JSON file per record
//! kind per day. The iterator here decompresses and decodes one line at a
//! time instead of materializing the whole file.

use std::io::{BufRead, BufReader, Cursor, Lines};

use flate2::read::GzDecoder;
use tracing::warn;

/// Iterator over the decoded JSON objects of one bulk-export file.
///
/// Consume-once, no resume. Lines that are not valid JSON are skipped with a
/// warning; an I/O error mid-stream (truncated gzip) ends the sequence.
pub struct ExportLines {
    lines: Lines<BufReader<GzDecoder<Cursor<Vec<u8>>>>>,
}

impl ExportLines {
    pub fn new(compressed: Vec<u8>) -> Self {
        let decoder = GzDecoder::new(Cursor::new(compressed));
        Self {
            lines: BufReader::new(decoder).lines(),
        }
    }
}

impl Iterator for ExportLines {
    type Item = serde_json::Value;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "export stream ended early");
                    return None;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str(trimmed) {
                Ok(value) => return Some(value),
                Err(e) => {
                    warn!(error = %e, "skipping malformed export line");
                    continue;
                }
            }
        }
    }
}
