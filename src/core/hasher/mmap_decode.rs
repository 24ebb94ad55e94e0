//! Memory-mapped reads for image decoding.
//!
//! Large files are mapped rather than copied into a heap buffer.

use crate::error::HashError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Read file bytes, mapping files of 1MB or more.
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, HashError> {
    let io_error = |source| HashError::IoError {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let len = file.metadata().map_err(io_error)?.len();

    if len >= MMAP_THRESHOLD {
        // SAFETY: the mapping is read-only and the file handle outlives the
        // decode. A file truncated by another process while mapped can fault;
        // that is accepted for files being scanned.
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;
        Ok(FileBytes::Mmap(mmap))
    } else {
        let bytes = std::fs::read(path).map_err(io_error)?;
        Ok(FileBytes::Vec(bytes))
    }
}

/// File bytes that may be either owned or memory-mapped.
pub enum FileBytes {
    /// Standard heap-allocated bytes
    Vec(Vec<u8>),
    /// Memory-mapped bytes
    Mmap(Mmap),
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}

/// Check magic bytes to reject non-images before a full decode.
pub fn validate_image_header(bytes: &[u8]) -> bool {
    if bytes.len() < 8 {
        return false;
    }

    // JPEG: FF D8 FF
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return true;
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return true;
    }

    // GIF: 47 49 46 38
    if bytes.starts_with(b"GIF8") {
        return true;
    }

    // WebP: RIFF....WEBP
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return true;
    }

    // BMP: 42 4D
    if bytes.starts_with(b"BM") {
        return true;
    }

    // TIFF: little or big endian
    bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn validate_jpeg_header() {
        let jpeg_header = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert!(validate_image_header(&jpeg_header));
    }

    #[test]
    fn validate_png_header() {
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert!(validate_image_header(&png_header));
    }

    #[test]
    fn validate_webp_header() {
        let webp_header = [
            0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50,
        ];
        assert!(validate_image_header(&webp_header));
    }

    #[test]
    fn reject_text_and_short_input() {
        assert!(!validate_image_header(b"this is not an image"));
        assert!(!validate_image_header(&[0xFF, 0xD8]));
    }

    #[test]
    fn small_files_are_read_into_memory() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();

        let bytes = read_file_bytes(file.path()).unwrap();
        assert!(matches!(bytes, FileBytes::Vec(_)));
        assert_eq!(&*bytes, b"0123456789");
    }

    #[test]
    fn large_files_are_mapped() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&vec![7u8; MMAP_THRESHOLD as usize]).unwrap();
        file.flush().unwrap();

        let bytes = read_file_bytes(file.path()).unwrap();
        assert!(matches!(bytes, FileBytes::Mmap(_)));
        assert_eq!(bytes.len(), MMAP_THRESHOLD as usize);
    }
}
