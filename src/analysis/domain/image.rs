use sha2::{Digest, Sha256};
use std::sync::Arc;

/// An uploaded firmware binary plus its upload metadata.
///
/// The payload is immutable and shared (`Arc<[u8]>`); one analysis run owns
/// the image and all derived data borrows from it by offset, never by copy.
#[derive(Debug, Clone)]
pub struct FirmwareImage {
    filename: String,
    bytes: Arc<[u8]>,
    content_hash: String,
}

impl FirmwareImage {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let digest = Sha256::digest(&bytes);
        let content_hash = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
            content_hash,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Lowercase extension of the declared filename, if any.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.filename.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex-encoded SHA-256 of the payload. Stable identity for superseding
    /// a previous report of the same image.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }
}
