// File Operations for RSA Encryption/Decryption
// Opening files with their names attached to errors, chunked reads, progress

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read};
use std::path::Path;

use tracing::warn;

use crate::error::{Error, Result};

/// A progress indicator for file operations
#[derive(Clone, Debug, PartialEq)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub percent: f64,
}

impl Progress {
    pub fn new(current: u64, total: u64) -> Self {
        let percent = if total > 0 {
            (current as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Self {
            current,
            total,
            percent,
        }
    }
}

/// Open a file for buffered reading
pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| Error::file_access(path, e))
}

/// Create (or truncate) a file for buffered writing
pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| Error::file_access(path, e))
}

/// Get file size in bytes
pub fn file_size(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| Error::file_access(path, e))
}

pub fn read_text_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::file_access(path, e))
}

pub fn write_text_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| Error::file_access(path, e))
}

/// Delete an output file left behind by a failed pass
pub fn remove_partial(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), %err, "failed to remove partial output");
        }
    }
}

/// Read until `buf` is full or the reader is exhausted.
///
/// Returns the number of bytes read; anything short of `buf.len()` means
/// end of input was reached.
pub fn read_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Format file size for display
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
