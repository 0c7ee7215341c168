//! Struct archiving functionality
//!
//! Archives are per-session CSV files, one row per control cycle, written
//! through an `Archiver` owned by the exec.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
pub use csv::Writer;
use std::fs::{File, OpenOptions};
use std::path::Path;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session,
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut session_path = session.arch_root.clone();
        session_path.push(path);

        // Create the parent directory and the file if they do not exist
        if let Some(parent) = session_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::File::create(session_path.clone())?;

        // Open the file in append mode
        let file = match OpenOptions::new().append(true).open(session_path) {
            Ok(f) => f,
            Err(e) => return Err(Box::new(e)),
        };

        let w = WriterBuilder::new().has_headers(true).from_writer(file);

        Ok(Self { writer: Some(w) })
    }

    /// Serialise a record into the archive.
    ///
    /// Records must be flat (scalars and strings only) for the CSV header
    /// row to be derivable; timestamp your record explicitly.
    pub fn serialise<T: serde::Serialize>(
        &mut self,
        record: T,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match self.writer {
            Some(ref mut w) => {
                w.serialize(record)?;
                w.flush()?
            }
            None => panic!("Cannot find an initialised writer!"),
        }

        Ok(())
    }
}
