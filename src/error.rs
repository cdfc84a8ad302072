use std::fmt::Display;
use std::io;

use crate::image::PixelFormat;

/// The four ways a load, save or quantization can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    AllocationFailure,
    FormatInvalid,
    FormatUnsupported,
    IoFailure,
}

#[derive(Debug)]
pub enum Error {
    UnableToOpenInputFileForReading(String, io::Error),
    UnableToOpenOutputFileForWriting(String, io::Error),
    AllocationFailed(usize),
    BufferSizeOverflow(u32, u32),
    InvalidSignature(u16),
    InvalidInfoHeaderSize(u32),
    InvalidDimensions(i32, i32),
    DimensionsExceedBitmapLimits(u32, u32),
    EmptyImage(u32, u32),
    PaletteMissingForIndexedFormat(PixelFormat),
    PaletteRequestedForDirectColorFormat(PixelFormat),
    UnsupportedBitDepth(u16),
    UnsupportedCompression(u32),
    UnsupportedOutputFormat(PixelFormat),
    QuantizationRequiresRgb24(PixelFormat),
    FailedToReadFileHeader(io::Error),
    FailedToReadInfoHeader(io::Error),
    FailedToReadPalette(io::Error),
    FailedToSeekToPixelData(u32, io::Error),
    FailedToReadScanline(u32, io::Error),
    PixelDataTruncated(u64, u64),
    FailedToWriteFileHeader(io::Error),
    FailedToWriteInfoHeader(io::Error),
    FailedToWritePalette(io::Error),
    FailedToWriteScanline(u32, io::Error),
    FailedToFlushOutput(io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AllocationFailed(_) | Self::BufferSizeOverflow(_, _) => {
                ErrorKind::AllocationFailure
            }
            Self::InvalidSignature(_)
            | Self::InvalidInfoHeaderSize(_)
            | Self::InvalidDimensions(_, _)
            | Self::EmptyImage(_, _)
            | Self::PaletteMissingForIndexedFormat(_)
            | Self::PaletteRequestedForDirectColorFormat(_) => ErrorKind::FormatInvalid,
            Self::UnsupportedBitDepth(_)
            | Self::UnsupportedCompression(_)
            | Self::UnsupportedOutputFormat(_)
            | Self::DimensionsExceedBitmapLimits(_, _)
            | Self::QuantizationRequiresRgb24(_) => ErrorKind::FormatUnsupported,
            Self::UnableToOpenInputFileForReading(_, _)
            | Self::UnableToOpenOutputFileForWriting(_, _)
            | Self::FailedToReadFileHeader(_)
            | Self::FailedToReadInfoHeader(_)
            | Self::FailedToReadPalette(_)
            | Self::FailedToSeekToPixelData(_, _)
            | Self::FailedToReadScanline(_, _)
            | Self::PixelDataTruncated(_, _)
            | Self::FailedToWriteFileHeader(_)
            | Self::FailedToWriteInfoHeader(_)
            | Self::FailedToWritePalette(_)
            | Self::FailedToWriteScanline(_, _)
            | Self::FailedToFlushOutput(_) => ErrorKind::IoFailure,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnableToOpenInputFileForReading(path, error) => {
                write!(
                    f,
                    "Unable to open input file '{}' for reading: {}",
                    path, error
                )
            }
            Self::UnableToOpenOutputFileForWriting(path, error) => {
                write!(
                    f,
                    "Unable to open output file '{}' for writing: {}",
                    path, error
                )
            }
            Self::AllocationFailed(size) => {
                write!(f, "Not enough memory for a buffer of {} bytes", size)
            }
            Self::BufferSizeOverflow(width, height) => {
                write!(
                    f,
                    "Buffer size for an image of {}x{} pixels does not fit into memory",
                    width, height
                )
            }
            Self::InvalidSignature(signature) => {
                write!(
                    f,
                    "Not a Windows bitmap, signature was 0x{:04X} instead of 0x4D42",
                    signature
                )
            }
            Self::InvalidInfoHeaderSize(size) => {
                write!(f, "Bitmap info header size of {} bytes is too small", size)
            }
            Self::InvalidDimensions(width, height) => {
                write!(f, "Invalid bitmap dimensions {}x{}", width, height)
            }
            Self::DimensionsExceedBitmapLimits(width, height) => {
                write!(
                    f,
                    "An image of {}x{} pixels exceeds the limits of the bitmap format",
                    width, height
                )
            }
            Self::EmptyImage(width, height) => {
                write!(f, "An image of {}x{} pixels cannot be written as a bitmap", width, height)
            }
            Self::PaletteMissingForIndexedFormat(format) => {
                write!(f, "Indexed format {} requires a palette, but none is present", format)
            }
            Self::PaletteRequestedForDirectColorFormat(format) => {
                write!(f, "Direct color format {} cannot carry a palette", format)
            }
            Self::UnsupportedBitDepth(bits) => {
                write!(f, "Bit depth of {} bits per pixel is not supported", bits)
            }
            Self::UnsupportedCompression(method) => {
                write!(f, "Compression method {} is not supported", method)
            }
            Self::UnsupportedOutputFormat(format) => {
                write!(f, "Pixel format {} cannot be written as a bitmap", format)
            }
            Self::QuantizationRequiresRgb24(format) => {
                write!(
                    f,
                    "Quantization requires a 24-bit RGB image, but got {}",
                    format
                )
            }
            Self::FailedToReadFileHeader(error) => {
                write!(f, "Failed to read bitmap file header: {}", error)
            }
            Self::FailedToReadInfoHeader(error) => {
                write!(f, "Failed to read bitmap info header: {}", error)
            }
            Self::FailedToReadPalette(error) => {
                write!(f, "Failed to read color palette: {}", error)
            }
            Self::FailedToSeekToPixelData(offset, error) => {
                write!(
                    f,
                    "Failed to seek to pixel data at offset {}: {}",
                    offset, error
                )
            }
            Self::FailedToReadScanline(row, error) => {
                write!(f, "Failed to read scanline {}: {}", row, error)
            }
            Self::PixelDataTruncated(required, available) => {
                write!(
                    f,
                    "Pixel data ends early, the file needs {} bytes but has {}",
                    required, available
                )
            }
            Self::FailedToWriteFileHeader(error) => {
                write!(f, "Failed to write bitmap file header: {}", error)
            }
            Self::FailedToWriteInfoHeader(error) => {
                write!(f, "Failed to write bitmap info header: {}", error)
            }
            Self::FailedToWritePalette(error) => {
                write!(f, "Failed to write color palette: {}", error)
            }
            Self::FailedToWriteScanline(row, error) => {
                write!(f, "Failed to write scanline {}: {}", row, error)
            }
            Self::FailedToFlushOutput(error) => {
                write!(f, "Failed to flush output: {}", error)
            }
        }
    }
}

impl std::error::Error for Error {}
