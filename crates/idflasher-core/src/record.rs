//! Serial number record
//!
//! The device reads its identity from a one-line text record at the serial
//! offset: `SERIAL:<value>\n`. The record is staged in a temporary file that
//! is deleted when the [`SerialRecord`] is dropped, on success and failure
//! alike.

use crate::error::{Error, Result};
use std::fmt;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Prefix of every serial record
pub const RECORD_PREFIX: &str = "SERIAL:";

/// A device serial number, trimmed and known to be non-empty
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerialNumber(String);

impl SerialNumber {
    /// Trim surrounding whitespace; `None` if nothing is left
    ///
    /// Inner whitespace and every other character are kept as entered.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text of the record for `serial`
pub fn format_record(serial: &SerialNumber) -> String {
    format!("{}{}\n", RECORD_PREFIX, serial)
}

/// A serial record staged on disk for one flash write
#[derive(Debug)]
pub struct SerialRecord {
    file: NamedTempFile,
}

impl SerialRecord {
    /// Write the record for `serial` to a fresh temporary file
    pub fn create(serial: &SerialNumber) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("idflasher-serial-")
            .suffix(".txt")
            .tempfile()
            .map_err(Error::Record)?;

        file.write_all(format_record(serial).as_bytes())
            .and_then(|()| file.flush())
            .map_err(Error::Record)?;

        log::debug!("Staged serial record at {}", file.path().display());
        Ok(Self { file })
    }

    /// Location of the staged record
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_serial_number() {
        assert_eq!(SerialNumber::parse("  X1  ").unwrap().as_str(), "X1");
        assert_eq!(
            SerialNumber::parse("\tUnit 0001 rev B\n").unwrap().as_str(),
            "Unit 0001 rev B"
        );
        assert!(SerialNumber::parse("").is_none());
        assert!(SerialNumber::parse(" \t\n").is_none());
    }

    #[test]
    fn test_format_record() {
        let sn = SerialNumber::parse("Unit-0001").unwrap();
        assert_eq!(format_record(&sn), "SERIAL:Unit-0001\n");

        let sn = SerialNumber::parse("Tracker 0001").unwrap();
        assert_eq!(format_record(&sn), "SERIAL:Tracker 0001\n");
    }

    #[test]
    fn test_record_file_contents() {
        let sn = SerialNumber::parse("  X1  ").unwrap();
        let record = SerialRecord::create(&sn).unwrap();
        assert_eq!(fs::read(record.path()).unwrap(), b"SERIAL:X1\n");
    }

    #[test]
    fn test_record_removed_on_drop() {
        let sn = SerialNumber::parse("Unit-0002").unwrap();
        let record = SerialRecord::create(&sn).unwrap();
        let path = record.path().to_path_buf();
        assert!(path.exists());

        drop(record);
        assert!(!path.exists());
    }

    #[test]
    fn test_records_do_not_share_files() {
        let a = SerialRecord::create(&SerialNumber::parse("A").unwrap()).unwrap();
        let b = SerialRecord::create(&SerialNumber::parse("B").unwrap()).unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(fs::read_to_string(a.path()).unwrap(), "SERIAL:A\n");
        assert_eq!(fs::read_to_string(b.path()).unwrap(), "SERIAL:B\n");
    }
}
