//! Fast image decoding with format-specific optimizations.
//!
//! Uses zune-jpeg for JPEG files, falls back to the image crate for other
//! formats (and for JPEGs zune cannot handle).

use super::mmap_decode::{read_file_bytes, validate_image_header};
use crate::core::scanner::ImageFormat;
use crate::error::HashError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Fast image decoder that uses optimized decoders per format
pub struct FastDecoder;

impl FastDecoder {
    /// Decode an image from a file path using the fastest available decoder.
    pub fn decode(path: &Path) -> Result<DynamicImage, HashError> {
        let bytes = read_file_bytes(path)?;
        let format = ImageFormat::from_path(path);

        // Only the built-in formats have magic bytes we know about
        if format.is_supported() && !validate_image_header(&bytes) {
            return Err(HashError::DecodeError {
                path: path.to_path_buf(),
                reason: "unrecognized image header".to_string(),
            });
        }

        let image = match format {
            ImageFormat::Jpeg => {
                Self::decode_jpeg(path, &bytes).or_else(|_| Self::decode_fallback(path, &bytes))?
            }
            ImageFormat::Unknown => Self::decode_by_extension(path, &bytes)?,
            _ => Self::decode_fallback(path, &bytes)?,
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(HashError::EmptyImage {
                path: path.to_path_buf(),
            });
        }

        Ok(image)
    }

    /// Fast JPEG decoding using zune-jpeg
    fn decode_jpeg(path: &Path, bytes: &[u8]) -> Result<DynamicImage, HashError> {
        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(bytes, options);

        let pixels = decoder.decode().map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: "Failed to get image info".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;

        let buffer_error = |kind: &str| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: format!("Failed to create {kind} buffer"),
        };

        // The decoder may not honor the requested colorspace
        let out_colorspace = decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB);

        let image = match out_colorspace {
            ColorSpace::RGB => {
                let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels)
                        .ok_or_else(|| buffer_error("RGB"))?;
                DynamicImage::ImageRgb8(buffer)
            }
            ColorSpace::RGBA => {
                let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels)
                        .ok_or_else(|| buffer_error("RGBA"))?;
                DynamicImage::ImageRgba8(buffer)
            }
            ColorSpace::Luma => {
                let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels)
                        .ok_or_else(|| buffer_error("Luma"))?;
                DynamicImage::ImageLuma8(buffer)
            }
            other => {
                return Err(HashError::DecodeError {
                    path: path.to_path_buf(),
                    reason: format!("unsupported colorspace {:?}", other),
                })
            }
        };

        Ok(image)
    }

    /// Formats without a reliable signature (TGA) need the extension as a hint
    fn decode_by_extension(path: &Path, bytes: &[u8]) -> Result<DynamicImage, HashError> {
        match image::ImageFormat::from_path(path) {
            Ok(hint) => image::load_from_memory_with_format(bytes, hint)
                .or_else(|_| Self::decode_fallback(path, bytes)),
            Err(_) => Self::decode_fallback(path, bytes),
        }
    }

    /// The image crate guesses the format from the content
    fn decode_fallback(path: &Path, bytes: &[u8]) -> Result<DynamicImage, HashError> {
        image::load_from_memory(bytes).map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
