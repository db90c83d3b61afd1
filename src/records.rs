//! Readers for the FetLife data export.
//!
//! The export directory holds two comma-separated files with a header row
//! and four columns each:
//!
//! | File | Columns |
//! |------|---------|
//! | `blockeds.txt` | `user_id, created_at, updated_at, nickname` |
//! | `private_notes.txt` | `member_id, created_at, updated_at, private_note` |
//!
//! Timestamps are kept as opaque strings. Rows with fewer than four columns
//! are skipped with a warning; a missing or unreadable file is an error.

use std::path::Path;

use crate::error::{Result, VaultError};

pub const BLOCKEDS_FILE: &str = "blockeds.txt";
pub const PRIVATE_NOTES_FILE: &str = "private_notes.txt";

/// A blocked user entry from `blockeds.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedRecord {
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub nickname: String,
}

/// A private note entry from `private_notes.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateNoteRecord {
    pub member_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub private_note: String,
}

/// A fixed four-column export row.
trait ExportRecord: Sized {
    const KIND: &'static str;

    fn from_columns(columns: [String; 4]) -> Self;
}

impl ExportRecord for BlockedRecord {
    const KIND: &'static str = "blocked";

    fn from_columns([user_id, created_at, updated_at, nickname]: [String; 4]) -> Self {
        Self {
            user_id,
            created_at,
            updated_at,
            nickname,
        }
    }
}

impl ExportRecord for PrivateNoteRecord {
    const KIND: &'static str = "private note";

    fn from_columns([member_id, created_at, updated_at, private_note]: [String; 4]) -> Self {
        Self {
            member_id,
            created_at,
            updated_at,
            private_note,
        }
    }
}

/// Read `blockeds.txt` from the export directory.
pub fn read_blockeds(data_dir: &Path) -> Result<Vec<BlockedRecord>> {
    read_records(&data_dir.join(BLOCKEDS_FILE))
}

/// Read `private_notes.txt` from the export directory.
pub fn read_private_notes(data_dir: &Path) -> Result<Vec<PrivateNoteRecord>> {
    read_records(&data_dir.join(PRIVATE_NOTES_FILE))
}

fn read_records<T: ExportRecord>(path: &Path) -> Result<Vec<T>> {
    let file = std::fs::File::open(path).map_err(|e| VaultError::io(path, e))?;
    let (records, skipped) = parse_records::<T, _>(file, path)?;
    for line in skipped {
        tracing::warn!(line, kind = T::KIND, "Skipping invalid {} record", T::KIND);
    }
    Ok(records)
}

/// Decode rows after the header. Rows with fewer than four columns are
/// dropped and their starting line numbers returned alongside the records.
fn parse_records<T: ExportRecord, R: std::io::Read>(
    input: R,
    path: &Path,
) -> Result<(Vec<T>, Vec<u64>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| VaultError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if row.len() < 4 {
            // Quoted fields may span lines, so count from the reader.
            skipped.push(row.position().map(|p| p.line()).unwrap_or_default());
            continue;
        }
        let columns = [
            row[0].to_string(),
            row[1].to_string(),
            row[2].to_string(),
            row[3].to_string(),
        ];
        records.push(T::from_columns(columns));
    }

    Ok((records, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn data_dir(blockeds: &str, notes: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(BLOCKEDS_FILE), blockeds).unwrap();
        std::fs::write(tmp.path().join(PRIVATE_NOTES_FILE), notes).unwrap();
        tmp
    }

    #[test]
    fn reads_blockeds_skipping_header() {
        let tmp = data_dir(
            "user_id,created_at,updated_at,nickname\n12345,2024-01-01,2024-01-02,Alice\n23456,2024-02-01,2024-02-02,Bob\n",
            "member_id,created_at,updated_at,private_note\n",
        );
        let blockeds = read_blockeds(tmp.path()).unwrap();
        assert_eq!(blockeds.len(), 2);
        assert_eq!(
            blockeds[0],
            BlockedRecord {
                user_id: "12345".into(),
                created_at: "2024-01-01".into(),
                updated_at: "2024-01-02".into(),
                nickname: "Alice".into(),
            }
        );
        assert_eq!(blockeds[1].nickname, "Bob");
    }

    #[test]
    fn reads_quoted_notes_with_commas() {
        let tmp = data_dir(
            "user_id,created_at,updated_at,nickname\n",
            "member_id,created_at,updated_at,private_note\n11111,2024-01-01,2024-01-01,\"Creepy, sent \"\"weird\"\" messages\"\n",
        );
        let notes = read_private_notes(tmp.path()).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].member_id, "11111");
        assert_eq!(notes[0].private_note, "Creepy, sent \"weird\" messages");
    }

    #[test]
    fn short_rows_are_dropped() {
        let tmp = data_dir(
            "user_id,created_at,updated_at,nickname\n12345,2024-01-01\n23456,2024-01-01,2024-01-01,Bob\n",
            "member_id,created_at,updated_at,private_note\n",
        );
        let blockeds = read_blockeds(tmp.path()).unwrap();
        assert_eq!(blockeds.len(), 1);
        assert_eq!(blockeds[0].user_id, "23456");
    }

    #[test]
    fn extra_columns_are_ignored() {
        let tmp = data_dir(
            "user_id,created_at,updated_at,nickname\n1,a,b,Nick,extra\n",
            "member_id,created_at,updated_at,private_note\n",
        );
        let blockeds = read_blockeds(tmp.path()).unwrap();
        assert_eq!(blockeds[0].nickname, "Nick");
    }

    #[test]
    fn header_only_gives_no_records() {
        let tmp = data_dir(
            "user_id,created_at,updated_at,nickname\n",
            "member_id,created_at,updated_at,private_note\n",
        );
        assert!(read_blockeds(tmp.path()).unwrap().is_empty());
        assert!(read_private_notes(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn skipped_rows_report_their_file_line() {
        let input = "member_id,created_at,updated_at,private_note\n\
                     1,a,b,\"first line\nsecond line\nthird line\"\n\
                     short,row\n\
                     2,a,b,fine\n\
                     3\n";
        let (notes, skipped) =
            parse_records::<PrivateNoteRecord, _>(input.as_bytes(), Path::new("notes.txt")).unwrap();

        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].private_note, "first line\nsecond line\nthird line");
        assert_eq!(skipped, vec![5, 7]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = read_blockeds(tmp.path()).unwrap_err();
        assert!(matches!(err, VaultError::Io { .. }));
        assert!(read_private_notes(tmp.path()).is_err());
    }
}
