// ---------------------------------------------------------------------------
// Index persistence: binary entry codec + gzipped index file
// ---------------------------------------------------------------------------
//
// Entry binary format:
//   [4B id-len BE][id UTF-8]
//   [4B text-len BE][text UTF-8]
//   [4B emb-b64-len BE][embedding base64 UTF-8]
//   [4B item ordinal BE]
//
// Embeddings are base64 over little-endian f32 bytes.
//
// File format (v1): `index.gz` holding gzipped JSON
//   { "version": 1, "dimension": N, "entries": ["<base64 entry>", ...] }
// `entries` is an array, not a map: insertion order is part of the format,
// and equal-score retrieval ties resolve toward earlier entries.
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use crate::error::RecError;
use crate::types::ChunkEntry;

pub const INDEX_FILE: &str = "index.gz";
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Embedding encode / decode
// ---------------------------------------------------------------------------

/// Encode an f32 slice as base64 of little-endian bytes.
pub fn encode_embedding(embedding: &[f32]) -> String {
    let bytes: Vec<u8> = embedding.iter().flat_map(|f| f.to_le_bytes()).collect();
    STANDARD.encode(&bytes)
}

/// Decode a base64 little-endian f32 byte string back to `Vec<f32>`.
pub fn decode_embedding(encoded: &str) -> Result<Vec<f32>, RecError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| RecError::Corruption(format!("Invalid embedding base64: {e}")))?;
    if bytes.len() % 4 != 0 {
        return Err(RecError::Corruption("Invalid embedding length".into()));
    }
    let mut result = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        result.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(result)
}

// ---------------------------------------------------------------------------
// Gzip compress / decompress
// ---------------------------------------------------------------------------

/// Gzip-compress a byte slice at level 6.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, RecError> {
    let mut encoder = GzEncoder::new(data, Compression::new(6));
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed).map_err(RecError::Io)?;
    Ok(compressed)
}

/// Gunzip-decompress a byte slice.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, RecError> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(RecError::Io)?;
    Ok(decompressed)
}

/// Check for the gzip magic bytes (0x1f, 0x8b).
pub fn is_gzipped(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

// ---------------------------------------------------------------------------
// Per-entry binary codec
// ---------------------------------------------------------------------------

/// Serialize a single chunk entry to the binary format.
pub fn serialize_entry(entry: &ChunkEntry) -> Vec<u8> {
    let id_bytes = entry.id.as_bytes();
    let text_bytes = entry.text.as_bytes();
    let emb_b64 = encode_embedding(&entry.embedding);
    let emb_bytes = emb_b64.as_bytes();

    let total = 4 + id_bytes.len() + 4 + text_bytes.len() + 4 + emb_bytes.len() + 4;
    let mut buf = Vec::with_capacity(total);

    buf.extend_from_slice(&(id_bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(id_bytes);

    buf.extend_from_slice(&(text_bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(text_bytes);

    buf.extend_from_slice(&(emb_bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(emb_bytes);

    buf.extend_from_slice(&(entry.item as u32).to_be_bytes());

    buf
}

/// Read a `u32` from `data` at `offset` (big-endian).
/// Returns `None` if there aren't enough bytes.
fn read_u32_be(data: &[u8], offset: usize) -> Option<u32> {
    if offset + 4 > data.len() {
        return None;
    }
    Some(u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]))
}

fn read_str<'a>(data: &'a [u8], offset: &mut usize, what: &str) -> Result<&'a str, RecError> {
    let len = read_u32_be(data, *offset)
        .ok_or_else(|| RecError::Corruption(format!("Truncated: {what} length")))? as usize;
    *offset += 4;
    if *offset + len > data.len() {
        return Err(RecError::Corruption(format!("Truncated: {what} data")));
    }
    let s = std::str::from_utf8(&data[*offset..*offset + len])
        .map_err(|e| RecError::Corruption(format!("Invalid UTF-8 in {what}: {e}")))?;
    *offset += len;
    Ok(s)
}

/// Deserialize a single chunk entry from the binary format.
pub fn deserialize_entry(data: &[u8]) -> Result<ChunkEntry, RecError> {
    let mut offset = 0;

    let id = read_str(data, &mut offset, "id")?.to_string();
    let text = read_str(data, &mut offset, "text")?.to_string();
    let emb_b64 = read_str(data, &mut offset, "embedding base64")?;
    let embedding = decode_embedding(emb_b64)?;

    let item = read_u32_be(data, offset)
        .ok_or_else(|| RecError::Corruption("Truncated: item ordinal".into()))?
        as usize;

    Ok(ChunkEntry {
        id,
        text,
        embedding,
        item,
    })
}

// ---------------------------------------------------------------------------
// File I/O: v1 gzipped index format
// ---------------------------------------------------------------------------

/// On-disk JSON structure for the index file.
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    dimension: usize,
    /// Base64-encoded binary entries, in insertion order.
    entries: Vec<String>,
}

/// Everything loaded back from an index directory.
#[derive(Debug)]
pub struct IndexData {
    pub dimension: usize,
    pub entries: Vec<ChunkEntry>,
}

/// Save all entries to `dir` as a gzipped index file, creating the directory
/// if needed and replacing any previous index at the same location.
pub fn save_to_directory(
    dir: &Path,
    dimension: usize,
    entries: &[ChunkEntry],
) -> Result<(), RecError> {
    std::fs::create_dir_all(dir).map_err(RecError::Io)?;

    let encoded: Vec<String> = entries
        .iter()
        .map(|entry| STANDARD.encode(serialize_entry(entry)))
        .collect();

    let index = IndexFile {
        version: FORMAT_VERSION,
        dimension,
        entries: encoded,
    };

    let json = serde_json::to_string(&index)
        .map_err(|e| RecError::Serialization(format!("Failed to serialize index: {e}")))?;
    let compressed = compress(json.as_bytes())?;

    std::fs::write(dir.join(INDEX_FILE), &compressed).map_err(RecError::Io)?;
    Ok(())
}

/// Load an index from `dir`.
///
/// A missing directory or index file is `NotFound`: serving against an
/// index that was never built is a distinct condition, not an empty store.
/// Any undecodable content is `Corruption`.
pub fn load_from_directory(dir: &Path) -> Result<IndexData, RecError> {
    let path = dir.join(INDEX_FILE);
    if !path.exists() {
        return Err(RecError::NotFound(format!("index file {}", path.display())));
    }

    let raw_bytes = std::fs::read(&path).map_err(RecError::Io)?;
    let json_bytes = if is_gzipped(&raw_bytes) {
        decompress(&raw_bytes)?
    } else {
        raw_bytes
    };

    let json_str = std::str::from_utf8(&json_bytes)
        .map_err(|e| RecError::Corruption(format!("Invalid UTF-8 in index: {e}")))?;
    let index: IndexFile = serde_json::from_str(json_str)
        .map_err(|e| RecError::Corruption(format!("Invalid index JSON: {e}")))?;

    if index.version != FORMAT_VERSION {
        return Err(RecError::Corruption(format!(
            "Unsupported index version: {}",
            index.version
        )));
    }

    let mut entries = Vec::with_capacity(index.entries.len());
    for (pos, b64) in index.entries.iter().enumerate() {
        let binary = STANDARD
            .decode(b64)
            .map_err(|e| RecError::Corruption(format!("Invalid base64 for entry {pos}: {e}")))?;
        entries.push(deserialize_entry(&binary)?);
    }

    Ok(IndexData {
        dimension: index.dimension,
        entries,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
