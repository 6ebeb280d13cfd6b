//! BLAKE3 content digests with streaming file support.
//!
//! # Overview
//!
//! [`digest_bytes`] fingerprints an in-memory buffer (used for structural
//! units). [`Hasher`] streams a file through a fixed-size buffer so memory use
//! does not depend on file size. The [`ContentDigest`] trait is the seam the
//! duplicate finder digests through.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// A 32-byte BLAKE3 digest.
pub type Digest = [u8; 32];

/// Default read buffer for file digests (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Digest an in-memory byte slice.
#[must_use]
pub fn digest_bytes(bytes: &[u8]) -> Digest {
    *blake3::hash(bytes).as_bytes()
}

/// Render a digest as lowercase hexadecimal.
#[must_use]
pub fn digest_to_hex(digest: &Digest) -> String {
    blake3::Hash::from_bytes(*digest).to_hex().to_string()
}

/// Something that can produce a content digest for a file on disk.
pub trait ContentDigest: Send + Sync {
    /// Digest the full contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or a read fails.
    fn digest_file(&self, path: &Path) -> Result<Digest, HashError>;
}

/// Streaming BLAKE3 file hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    chunk_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            shutdown_flag: None,
        }
    }

    /// Override the read buffer size (clamped to at least 1 KiB).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1024);
        self
    }

    /// Abort long reads when the flag becomes `true`.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Stream `path` through BLAKE3 in `chunk_size` reads.
    ///
    /// # Errors
    ///
    /// - [`HashError::NotFound`] / [`HashError::PermissionDenied`] on open
    /// - [`HashError::Io`] on a read failure mid-stream
    /// - [`HashError::Interrupted`] if shutdown was requested while reading
    pub fn digest_file(&self, path: &Path) -> Result<Digest, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    hasher.update(&buffer[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(HashError::Io {
                        path: path.to_path_buf(),
                        source: e,
                    })
                }
            }
        }

        log::trace!("Digested {}", path.display());
        Ok(*hasher.finalize().as_bytes())
    }
}

impl ContentDigest for Hasher {
    fn digest_file(&self, path: &Path) -> Result<Digest, HashError> {
        Hasher::digest_file(self, path)
    }
}
