//! Streaming content hashing.

use crate::error::HashError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64;

/// Read size for full-content hashing
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Bytes covered by the prefix check
pub const PREFIX_LEN: usize = 4 * 1024;

/// SHA-256 of a file's complete content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Digest as 64 lowercase hex digits
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Hashes file content with bounded memory
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentHasher;

impl ContentHasher {
    pub fn new() -> Self {
        Self
    }

    /// SHA-256 of the whole file, read in `CHUNK_SIZE` pieces.
    pub fn digest_file(&self, path: &Path) -> Result<ContentDigest, HashError> {
        let io_error = |source| HashError::IoError {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;
        self.digest_reader(file).map_err(io_error)
    }

    /// SHA-256 of everything `reader` yields.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> std::io::Result<ContentDigest> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; CHUNK_SIZE];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => hasher.update(&buffer[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(ContentDigest(hasher.finalize().into()))
    }

    /// xxh3 of the first `PREFIX_LEN` bytes.
    pub fn prefix_hash(&self, path: &Path) -> Result<u64, HashError> {
        let io_error = |source| HashError::IoError {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;

        let mut prefix = Vec::with_capacity(PREFIX_LEN);
        file.take(PREFIX_LEN as u64)
            .read_to_end(&mut prefix)
            .map_err(io_error)?;

        Ok(xxh3_64(&prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn known_sha256_vector() {
        let digest = ContentHasher::new()
            .digest_reader(Cursor::new(b"abc"))
            .unwrap();
        assert_eq!(
            digest.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn empty_input_has_a_digest() {
        let digest = ContentHasher::new().digest_reader(std::io::empty()).unwrap();
        assert_eq!(
            digest.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn chunking_does_not_change_digest() {
        let data: Vec<u8> = (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        let hasher = ContentHasher::new();

        let streamed = hasher.digest_reader(Cursor::new(&data)).unwrap();
        let whole: [u8; 32] = Sha256::digest(&data).into();

        assert_eq!(streamed.as_bytes(), &whole);
    }

    #[test]
    fn digest_file_matches_reader() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, b"AAAA").unwrap();

        let hasher = ContentHasher::new();
        assert_eq!(
            hasher.digest_file(&path).unwrap(),
            hasher.digest_reader(Cursor::new(b"AAAA")).unwrap()
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = ContentHasher::new().digest_file(Path::new("/nonexistent/a.bin"));
        assert!(matches!(result, Err(HashError::IoError { .. })));
    }

    #[test]
    fn prefix_ignores_bytes_past_the_prefix() {
        let dir = TempDir::new().unwrap();
        let mut a = vec![1u8; PREFIX_LEN + 10];
        let mut b = a.clone();
        a[PREFIX_LEN + 5] = 2;
        b[PREFIX_LEN + 5] = 3;
        std::fs::write(dir.path().join("a"), &a).unwrap();
        std::fs::write(dir.path().join("b"), &b).unwrap();

        let hasher = ContentHasher::new();
        assert_eq!(
            hasher.prefix_hash(&dir.path().join("a")).unwrap(),
            hasher.prefix_hash(&dir.path().join("b")).unwrap()
        );
        assert_ne!(
            hasher.digest_file(&dir.path().join("a")).unwrap(),
            hasher.digest_file(&dir.path().join("b")).unwrap()
        );
    }
}
