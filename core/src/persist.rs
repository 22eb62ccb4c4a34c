//! Record files with an optional read offset and append flag.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{CoreError, Result};

/// Wire value of an absent append flag.
pub const APPEND_NONE: u32 = 0xFF_FFFF;

/// Decodes the append flag. An absent flag appends.
pub fn decode_append(flag: u32) -> Result<bool> {
    match flag {
        0 => Ok(false),
        1 | APPEND_NONE => Ok(true),
        other => Err(CoreError::Decode(format!("invalid append flag {other:#x}"))),
    }
}

pub fn encode_append(append: Option<bool>) -> u32 {
    append.map_or(APPEND_NONE, u32::from)
}

pub fn write_record<T: Serialize>(path: &Path, append: bool, value: &T) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, value)?;
    writer.flush()?;
    debug!(path = %path.display(), append, "wrote record");
    Ok(())
}

pub fn read_record<T: DeserializeOwned>(path: &Path, offset: Option<u64>) -> Result<T> {
    let mut file = File::open(path)?;
    if let Some(offset) = offset {
        file.seek(SeekFrom::Start(offset))?;
    }
    Ok(bincode::deserialize_from(BufReader::new(file))?)
}

/// Like [`read_record`], but a missing file or a location holding no record yields `None`.
pub fn try_read_record<T: DeserializeOwned>(path: &Path, offset: Option<u64>) -> Result<Option<T>> {
    match read_record(path, offset) {
        Ok(value) => Ok(Some(value)),
        Err(CoreError::Io(_)) if !path.exists() => Ok(None),
        Err(CoreError::Io(_) | CoreError::Decode(_)) => {
            debug!(path = %path.display(), ?offset, "no record at location");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("plonk-core-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_append_flag() {
        assert!(decode_append(encode_append(None)).unwrap());
        assert!(!decode_append(encode_append(Some(false))).unwrap());
        assert_eq!(encode_append(Some(true)), 1);
        assert!(decode_append(2).is_err());
    }

    #[test]
    fn test_append_and_offset() {
        let path = temp_path("records");
        write_record(&path, false, &7u64).unwrap();
        write_record(&path, true, &9u64).unwrap();
        assert_eq!(read_record::<u64>(&path, None).unwrap(), 7);
        assert_eq!(read_record::<u64>(&path, Some(8)).unwrap(), 9);
        write_record(&path, false, &1u64).unwrap();
        assert_eq!(try_read_record::<u64>(&path, Some(8)).unwrap(), None);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(try_read_record::<u64>(&path, None).unwrap(), None);
    }
}
