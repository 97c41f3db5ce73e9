use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::util::{Result, Status};

/// File name of the value log inside its directory
pub const VALUE_LOG_FILE_NAME: &str = "000001.vlog";

/// Record header: crc32 (4 bytes LE) + payload length (4 bytes LE)
const HEADER_SIZE: usize = 8;

/// Location of a value stored out of line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValuePointer {
    pub offset: u64,
    pub len: u32,
}

impl ValuePointer {
    /// Bytes a pointer occupies when stored next to its key
    pub const ENCODED_SIZE: usize = 12;
}

/// Append-only file holding large values
///
/// Record format:
///
/// ```text
/// +----------+----------+-----------------+
/// | crc32 LE | len LE   | payload         |
/// | 4 bytes  | 4 bytes  | len bytes       |
/// +----------+----------+-----------------+
/// ```
///
/// Values are read back lazily, when an item's value is requested. A short
/// read surfaces as an I/O error; a length or checksum mismatch as
/// corruption.
pub struct ValueLog {
    path: PathBuf,
    file: Mutex<LogFile>,
}

struct LogFile {
    file: File,
    end: u64,
}

impl ValueLog {
    /// Create a fresh value log in `dir`, truncating any previous one
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .map_err(|e| Status::io_error(format!("Failed to create directory: {e}")))?;

        let path = dir.join(VALUE_LOG_FILE_NAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        debug!(path = %path.display(), "created value log");
        Ok(ValueLog {
            path,
            file: Mutex::new(LogFile { file, end: 0 }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `value` and return where it landed
    pub fn append(&self, value: &[u8]) -> Result<ValuePointer> {
        let len = u32::try_from(value.len())
            .map_err(|_| Status::invalid_argument("value too large for value log"))?;

        let mut header = [0u8; HEADER_SIZE];
        header[..4].copy_from_slice(&crc32fast::hash(value).to_le_bytes());
        header[4..].copy_from_slice(&len.to_le_bytes());

        let mut log = self.file.lock();
        let offset = log.end;
        log.file.seek(SeekFrom::Start(offset))?;
        log.file.write_all(&header)?;
        log.file.write_all(value)?;
        log.end = offset + (HEADER_SIZE + value.len()) as u64;

        Ok(ValuePointer { offset, len })
    }

    /// Read the value at `ptr`, verifying its length and checksum
    pub fn read(&self, ptr: ValuePointer) -> Result<Bytes> {
        let mut header = [0u8; HEADER_SIZE];
        let mut payload = vec![0u8; ptr.len as usize];
        {
            let mut log = self.file.lock();
            log.file.seek(SeekFrom::Start(ptr.offset))?;
            read_exact_or_status(&mut log.file, &mut header, ptr)?;
            read_exact_or_status(&mut log.file, &mut payload, ptr)?;
        }

        let stored_crc = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let stored_len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if stored_len != ptr.len {
            warn!(offset = ptr.offset, stored_len, expected = ptr.len, "value log length mismatch");
            return Err(Status::corruption(format!(
                "value log record at {} has length {stored_len}, expected {}",
                ptr.offset, ptr.len
            )));
        }

        if crc32fast::hash(&payload) != stored_crc {
            warn!(offset = ptr.offset, "value log checksum mismatch");
            return Err(Status::corruption(format!(
                "value log record at {} failed checksum",
                ptr.offset
            )));
        }

        Ok(Bytes::from(payload))
    }
}

fn read_exact_or_status(file: &mut File, buf: &mut [u8], ptr: ValuePointer) -> Result<()> {
    file.read_exact(buf).map_err(|e| {
        warn!(offset = ptr.offset, error = %e, "value log read failed");
        if e.kind() == ErrorKind::UnexpectedEof {
            Status::io_error(format!("value log truncated at {}", ptr.offset))
        } else {
            Status::from(e)
        }
    })
}
