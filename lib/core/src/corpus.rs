//! Corpus store: the immutable, ordinal-keyed set of template entries.
//!
//! Entries are read from JSON Lines, one record per line. Malformed records
//! are skipped and reported in a [`LoadReport`]; only a missing/unreadable
//! source, or one where no record parses at all, fails the load.

use crate::entry::{RawRecord, TemplateEntry};
use crate::hashing::{fingerprint64, FINGERPRINT_VERSION};
use crate::{Error, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// A record that was skipped during load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordWarning {
    /// 1-based line number in the source
    pub line: usize,
    pub reason: String,
}

/// Outcome of a corpus load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<RecordWarning>,
}

impl LoadReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// The loaded corpus. Ordinals (positions in `entries`) are the key space
/// shared with the embedding and lexical indexes.
#[derive(Debug, Clone)]
pub struct Corpus {
    entries: Vec<TemplateEntry>,
    texts: Vec<String>,
    fingerprint: u64,
}

impl Corpus {
    pub fn from_entries(entries: Vec<TemplateEntry>) -> Self {
        let texts: Vec<String> = entries.iter().map(TemplateEntry::retrieval_text).collect();
        let mut parts = Vec::with_capacity(texts.len() + 1);
        parts.push(format!("corpus-v{FINGERPRINT_VERSION}"));
        parts.extend(texts.iter().cloned());
        let fingerprint = fingerprint64(&parts);

        Self {
            entries,
            texts,
            fingerprint,
        }
    }

    /// Load a JSONL corpus file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<(Self, LoadReport)> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::CorpusLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let (corpus, report) = Self::from_reader(BufReader::new(file), &path.display().to_string())?;
        info!(
            path = %path.display(),
            loaded = report.loaded,
            skipped = report.skipped_count(),
            "Corpus loaded"
        );
        Ok((corpus, report))
    }

    /// Parse JSONL from any buffered reader. `source` only labels errors.
    pub fn from_reader<R: BufRead>(reader: R, source: &str) -> Result<(Self, LoadReport)> {
        let mut entries = Vec::new();
        let mut report = LoadReport::default();

        // Split on raw bytes; a badly encoded line is a skipped record
        for (idx, bytes) in reader.split(b'\n').enumerate() {
            let line_no = idx + 1;
            let bytes = bytes.map_err(|e| Error::CorpusLoad {
                path: source.to_string(),
                reason: format!("read failed at line {line_no}: {e}"),
            })?;

            let parsed = match std::str::from_utf8(&bytes) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => parse_record(line.trim()),
                Err(e) => Err(format!("invalid UTF-8: {e}")),
            };

            match parsed {
                Ok(entry) => entries.push(entry),
                Err(reason) => {
                    warn!(source, line = line_no, %reason, "Skipping corpus record");
                    report.skipped.push(RecordWarning {
                        line: line_no,
                        reason,
                    });
                }
            }
        }

        if entries.is_empty() && !report.skipped.is_empty() {
            return Err(Error::CorpusLoad {
                path: source.to_string(),
                reason: format!("none of {} records could be parsed", report.skipped.len()),
            });
        }

        report.loaded = entries.len();
        Ok((Self::from_entries(entries), report))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, ordinal: usize) -> Option<&TemplateEntry> {
        self.entries.get(ordinal)
    }

    #[inline]
    pub fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }

    /// Retrieval texts, aligned with `entries()`
    #[inline]
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Stable identity of the corpus contents and order
    #[inline]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TemplateEntry)> {
        self.entries.iter().enumerate()
    }
}

fn parse_record(line: &str) -> std::result::Result<TemplateEntry, String> {
    let raw: RawRecord = serde_json::from_str(line).map_err(|e| format!("invalid record: {e}"))?;
    TemplateEntry::try_from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PageRole;
    use std::io::{Cursor, Write};

    const SAMPLE: &str = r#"{"type": "Header", "pageRole": "header", "tags": ["general"]}

{"type": "Hero", "pageRole": "hero", "industry": ["restaurant"]}
not json at all
{"tags": ["missing type"]}
{"type": "Footer", "pageRole": "footer"}
"#;

    #[test]
    fn test_skips_bad_records_and_counts_them() {
        let (corpus, report) = Corpus::from_reader(Cursor::new(SAMPLE), "sample").unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(report.loaded, 3);
        assert_eq!(report.skipped_count(), 2);
        assert_eq!(report.skipped[0].line, 4);
        assert_eq!(report.skipped[1].line, 5);
        assert_eq!(corpus.get(1).unwrap().page_role, PageRole::Hero);
        assert_eq!(corpus.texts().len(), corpus.len());
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut bytes = b"{\"type\": \"Hero\", \"pageRole\": \"hero\"}\n".to_vec();
        bytes.extend_from_slice(b"{\"type\": \"Bad\xff\xfe\"}\n");
        bytes.extend_from_slice(b"{\"type\": \"Footer\", \"pageRole\": \"footer\"}\r\n");

        let (corpus, report) = Corpus::from_reader(Cursor::new(bytes), "bytes").unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.skipped[0].line, 2);
        assert!(report.skipped[0].reason.starts_with("invalid UTF-8"));
        assert_eq!(corpus.get(1).unwrap().kind, "Footer");
    }

    #[test]
    fn test_entirely_unparseable_is_fatal() {
        let err = Corpus::from_reader(Cursor::new("nope\n{]\n"), "junk").unwrap_err();
        assert!(matches!(err, Error::CorpusLoad { .. }));
    }

    #[test]
    fn test_empty_source_is_an_empty_corpus() {
        let (corpus, report) = Corpus::from_reader(Cursor::new("\n\n"), "blank").unwrap();
        assert!(corpus.is_empty());
        assert_eq!(report, LoadReport::default());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = Corpus::load("/definitely/not/here.jsonl").unwrap_err();
        assert!(matches!(err, Error::CorpusLoad { .. }));
    }

    #[test]
    fn test_load_is_idempotent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let (a, _) = Corpus::load(file.path()).unwrap();
        let (b, _) = Corpus::load(file.path()).unwrap();
        assert_eq!(a.entries(), b.entries());
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_tracks_order() {
        let x = TemplateEntry::new("A", PageRole::Aux);
        let y = TemplateEntry::new("B", PageRole::Aux);
        let ab = Corpus::from_entries(vec![x.clone(), y.clone()]);
        let ba = Corpus::from_entries(vec![y, x]);
        assert_ne!(ab.fingerprint(), ba.fingerprint());
    }
}
