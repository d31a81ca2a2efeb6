//! Native artifact container.
//!
//! Every artifact is a 32-byte header followed by a `postcard` payload.
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     Magic ("LNBT")
//! 4       1     Version major
//! 5       1     Version minor
//! 6       1     Artifact kind
//! 7       1     Reserved
//! 8       4     Payload size (bytes)
//! 12      4     CRC32 checksum of payload
//! 16      4     Number of encoded features
//! 20      12    Reserved
//! ```

use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Magic bytes identifying a loanboost artifact.
pub const MAGIC: &[u8; 4] = b"LNBT";

pub const CURRENT_VERSION_MAJOR: u8 = 1;

pub const CURRENT_VERSION_MINOR: u8 = 0;

/// Size of the header in bytes.
pub const HEADER_SIZE: usize = 32;

// ============================================================================
// Artifact Kind
// ============================================================================

/// What a payload contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ArtifactKind {
    /// Imputation statistics, encoder vocabulary, label classes and forest.
    Pipeline = 1,
    /// Forest, feature names and base value for TreeSHAP.
    Explainer = 2,
}

impl ArtifactKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Pipeline),
            2 => Some(Self::Explainer),
            _ => None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// An artifact could not be written, read, or understood.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("payload encoding error: {0}")]
    Encoding(#[source] postcard::Error),

    #[error("payload decoding error: {0}")]
    Decoding(#[source] postcard::Error),

    #[error("not a loanboost artifact")]
    NotAnArtifact,

    #[error("artifact requires format {major}.{minor}, this build reads {CURRENT_VERSION_MAJOR}.x")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("unknown artifact kind {0}")]
    UnknownKind(u8),

    #[error("artifact kind mismatch: expected {expected:?}, got {actual:?}")]
    KindMismatch {
        expected: ArtifactKind,
        actual: ArtifactKind,
    },

    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("artifact truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("payload too large: {0} bytes")]
    TooLarge(usize),

    #[error("corrupt payload: {0}")]
    Corrupt(String),
}

// ============================================================================
// Header
// ============================================================================

/// 32-byte artifact header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub kind: ArtifactKind,
    pub payload_size: u32,
    pub checksum: u32,
    pub n_features: u32,
}

impl FormatHeader {
    /// Header for a payload at the current version.
    pub fn for_payload(kind: ArtifactKind, n_features: u32, payload: &[u8]) -> Result<Self, SerializationError> {
        let payload_size =
            u32::try_from(payload.len()).map_err(|_| SerializationError::TooLarge(payload.len()))?;
        Ok(Self {
            version_major: CURRENT_VERSION_MAJOR,
            version_minor: CURRENT_VERSION_MINOR,
            kind,
            payload_size,
            checksum: crc32fast::hash(payload),
            n_features,
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf[6] = self.kind as u8;
        buf[8..12].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        buf[16..20].copy_from_slice(&self.n_features.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, SerializationError> {
        if &buf[0..4] != MAGIC {
            return Err(SerializationError::NotAnArtifact);
        }
        let (version_major, version_minor) = (buf[4], buf[5]);
        if version_major > CURRENT_VERSION_MAJOR {
            return Err(SerializationError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }
        let kind = ArtifactKind::from_u8(buf[6]).ok_or(SerializationError::UnknownKind(buf[6]))?;
        let word = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        Ok(Self {
            version_major,
            version_minor,
            kind,
            payload_size: word(8),
            checksum: word(12),
            n_features: word(16),
        })
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Frame a payload with its header.
pub fn encode_artifact(kind: ArtifactKind, n_features: u32, payload: &[u8]) -> Result<Vec<u8>, SerializationError> {
    let header = FormatHeader::for_payload(kind, n_features, payload)?;
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Check framing and return the header plus the verified payload.
pub fn decode_artifact(bytes: &[u8], expected: ArtifactKind) -> Result<(FormatHeader, &[u8]), SerializationError> {
    let header_bytes: &[u8; HEADER_SIZE] = bytes
        .get(..HEADER_SIZE)
        .and_then(|h| h.try_into().ok())
        .ok_or(SerializationError::Truncated {
            expected: HEADER_SIZE,
            actual: bytes.len(),
        })?;
    let header = FormatHeader::from_bytes(header_bytes)?;
    if header.kind != expected {
        return Err(SerializationError::KindMismatch {
            expected,
            actual: header.kind,
        });
    }

    let expected_len = HEADER_SIZE + header.payload_size as usize;
    if bytes.len() < expected_len {
        return Err(SerializationError::Truncated {
            expected: expected_len,
            actual: bytes.len(),
        });
    }
    if bytes.len() > expected_len {
        return Err(SerializationError::Corrupt(format!(
            "{} trailing bytes after payload",
            bytes.len() - expected_len
        )));
    }

    let payload = &bytes[HEADER_SIZE..expected_len];
    let actual = crc32fast::hash(payload);
    if actual != header.checksum {
        return Err(SerializationError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }
    Ok((header, payload))
}
