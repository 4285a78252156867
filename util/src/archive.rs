//! Struct archiving functionality
//!
//! Archives are CSV files to which serializable records are appended, one
//! row per record. Headers are derived from the record's field names and are
//! only written when the archive file is first created, so that repeated runs
//! can append to the same file.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::path::Path;
use std::fs::{File, OpenOptions};
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
pub struct Archiver {
    writer: Writer<File>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot open the archive file: {0}")]
    FileError(std::io::Error),

    #[error("Cannot write the record: {0}")]
    CsvError(csv::Error),

    #[error("Cannot flush the archive: {0}")]
    FlushError(std::io::Error)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session, path: P
    ) -> Result<Self, ArchiveError> {
        let mut session_path = session.arch_root.clone();
        session_path.push(path);

        Self::append_to(session_path)
    }

    /// Create a new archiver which appends to the file at the given path.
    ///
    /// The file and any missing parent directories are created if needed.
    /// Headers are only written if the file didn't exist beforehand.
    pub fn append_to<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let exists = path.is_file();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(ArchiveError::FileError)?;
            }
        }

        // Open the file in append mode
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(ArchiveError::FileError)?;

        let writer = WriterBuilder::new()
            .has_headers(!exists)
            .from_writer(file);

        Ok(Self { writer })
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: Serialize>(
        &mut self, record: T
    ) -> Result<(), ArchiveError> {
        self.writer.serialize(record)
            .map_err(ArchiveError::CsvError)?;
        self.writer.flush()
            .map_err(ArchiveError::FlushError)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        #[serde(rename = "Kp")]
        k_p: f64,
        #[serde(rename = "SettlingTime")]
        settling_time: usize
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.csv");

        {
            let mut arch = Archiver::append_to(&path).unwrap();
            arch.serialise(Row { k_p: 1.5, settling_time: 12 }).unwrap();
        }
        {
            let mut arch = Archiver::append_to(&path).unwrap();
            arch.serialise(Row { k_p: 2.0, settling_time: 3 }).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "Kp,SettlingTime\n1.5,12\n2.0,3\n");
    }
}
