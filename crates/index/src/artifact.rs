//! Index artifact framing
//!
//! ## Layout (little-endian)
//!
//! | Field        | Size | Notes                     |
//! |--------------|------|---------------------------|
//! | magic        | 4    | `b"OSPX"`                 |
//! | version      | 2    | [`INDEX_FORMAT_VERSION`]  |
//! | engine kind  | 1    | 0 exact, 1 hnsw           |
//! | dimension    | 4    |                           |
//! | payload len  | 8    |                           |
//! | payload crc  | 4    | CRC32 of the payload      |
//! | payload      | n    | bincode, engine-specific  |

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use osprey_core::{EngineKind, IndexError, IndexResult};
use std::io::{Cursor, Read};

/// Magic bytes for index artifacts
pub const INDEX_MAGIC: &[u8; 4] = b"OSPX";

/// Current index artifact format version
pub const INDEX_FORMAT_VERSION: u16 = 1;

/// Header size in bytes
pub const INDEX_HEADER_SIZE: usize = 4 + 2 + 1 + 4 + 8 + 4;

/// Decoded index artifact header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHeader {
    /// Format version
    pub version: u16,
    /// Engine that wrote the payload
    pub kind: EngineKind,
    /// Vector dimension
    pub dim: u32,
    /// Payload length in bytes
    pub payload_len: u64,
    /// CRC32 of the payload
    pub checksum: u32,
}

/// Frame an engine payload into artifact bytes
pub fn encode_index_artifact(kind: EngineKind, dim: usize, payload: &[u8]) -> IndexResult<Vec<u8>> {
    let dim = u32::try_from(dim).map_err(|_| {
        IndexError::Io(std::io::Error::other(format!(
            "dimension {} does not fit the index header",
            dim
        )))
    })?;

    let mut out = Vec::with_capacity(INDEX_HEADER_SIZE + payload.len());
    out.extend_from_slice(INDEX_MAGIC);
    out.write_u16::<LittleEndian>(INDEX_FORMAT_VERSION)?;
    out.write_u8(kind.to_byte())?;
    out.write_u32::<LittleEndian>(dim)?;
    out.write_u64::<LittleEndian>(payload.len() as u64)?;
    out.write_u32::<LittleEndian>(crc32fast::hash(payload))?;
    out.extend_from_slice(payload);
    Ok(out)
}

/// Parse and verify artifact bytes, returning the header and payload
///
/// Any framing problem (short file, bad magic, unknown version or engine,
/// length or checksum mismatch) is `CorruptState`.
pub fn decode_index_artifact(bytes: &[u8]) -> IndexResult<(IndexHeader, &[u8])> {
    let header = read_header(bytes)
        .map_err(|e| IndexError::corrupt(format!("index artifact header: {}", e)))?;

    let payload = &bytes[INDEX_HEADER_SIZE..];
    if payload.len() as u64 != header.payload_len {
        return Err(IndexError::corrupt(format!(
            "index artifact payload is {} bytes, header says {}",
            payload.len(),
            header.payload_len
        )));
    }
    let actual = crc32fast::hash(payload);
    if actual != header.checksum {
        return Err(IndexError::corrupt(format!(
            "index artifact checksum mismatch: stored {:08x}, computed {:08x}",
            header.checksum, actual
        )));
    }
    Ok((header, payload))
}

fn read_header(bytes: &[u8]) -> Result<IndexHeader, String> {
    if bytes.len() < INDEX_HEADER_SIZE {
        return Err(format!("{} bytes is shorter than the header", bytes.len()));
    }
    let mut cursor = Cursor::new(bytes);

    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic).map_err(|e| e.to_string())?;
    if &magic != INDEX_MAGIC {
        return Err("invalid magic bytes".to_string());
    }

    let version = cursor
        .read_u16::<LittleEndian>()
        .map_err(|e| e.to_string())?;
    if version != INDEX_FORMAT_VERSION {
        return Err(format!(
            "unsupported version {} (expected {})",
            version, INDEX_FORMAT_VERSION
        ));
    }

    let kind_byte = cursor.read_u8().map_err(|e| e.to_string())?;
    let kind = EngineKind::from_byte(kind_byte)
        .ok_or_else(|| format!("unknown engine kind {}", kind_byte))?;
    let dim = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| e.to_string())?;
    let payload_len = cursor
        .read_u64::<LittleEndian>()
        .map_err(|e| e.to_string())?;
    let checksum = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| e.to_string())?;

    Ok(IndexHeader {
        version,
        kind,
        dim,
        payload_len,
        checksum,
    })
}
