//! Versioned binary snapshots of the rotation network manager.
//!
//! Snapshots are encoded with `bitcode` behind a small header (magic number,
//! format version, tick) so a save file can be rejected before attempting to
//! decode the payload. Fixed-point state round-trips bit-exactly: a restored
//! manager advances identically to the one that was saved.

use crate::fixed::Ticks;
use crate::network::RotationNetworkManager;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a Torsion network snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x7095_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("data too short for snapshot header")]
    TooShort,
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every serialized snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Magic number for format detection.
    pub magic: u32,
    /// Format version for forward compatibility.
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: Ticks,
}

impl SnapshotHeader {
    /// Create a header for the current format version.
    pub fn new(tick: Ticks) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    /// Byte length of the encoded header.
    const ENCODED_LEN: usize = 16;

    fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut bytes = [0u8; Self::ENCODED_LEN];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.tick.to_le_bytes());
        bytes
    }

    fn decode(bytes: &[u8]) -> Result<Self, DeserializeError> {
        if bytes.len() < Self::ENCODED_LEN {
            return Err(DeserializeError::TooShort);
        }
        let magic = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let tick = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
        if magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(magic));
        }
        if version != FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(version));
        }
        Ok(Self {
            magic,
            version,
            tick,
        })
    }
}

// ---------------------------------------------------------------------------
// Save / load
// ---------------------------------------------------------------------------

/// Serialize the manager with a versioned header.
pub fn save_snapshot(
    manager: &RotationNetworkManager,
    tick: Ticks,
) -> Result<Vec<u8>, SerializeError> {
    let payload =
        bitcode::serialize(manager).map_err(|e| SerializeError::Encode(e.to_string()))?;
    let mut bytes = SnapshotHeader::new(tick).encode().to_vec();
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Validate the header and decode the manager. Returns the manager and the
/// tick at which the snapshot was taken.
pub fn load_snapshot(
    bytes: &[u8],
) -> Result<(RotationNetworkManager, Ticks), DeserializeError> {
    let header = SnapshotHeader::decode(bytes)?;
    let manager = bitcode::deserialize(&bytes[SnapshotHeader::ENCODED_LEN..])
        .map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok((manager, header.tick))
}

// ===========================================================================
// Tests
// ===========================================================================
