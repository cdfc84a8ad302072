use std::fmt::Display;
use std::slice::{ChunksExact, ChunksExactMut};

use crate::color::RGBColorFormat;
use crate::error::Error;
use crate::Result;

pub mod bmp;
pub mod quantizer;
pub mod reader;
pub mod writer;

pub trait ImageReader {
    fn read_image(&mut self) -> Result<Raster>;
}

pub trait ImageWriter {
    fn write_image(&mut self) -> Result<()>;
}

/// Container formats recognised from a file signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Bmp,
    Unknown,
}

impl ImageFormat {
    pub fn from_signature(signature: [u8; 2]) -> Self {
        if u16::from_le_bytes(signature) == bmp::BMP_SIGNATURE {
            Self::Bmp
        } else {
            Self::Unknown
        }
    }
}

/// Layout of the pixels inside a [`Raster`].
///
/// Indexed formats pack their palette indices most significant bit first.
/// `Rgb24` stores `[red, green, blue]` per pixel, `Rgb32` stores
/// `[red, green, blue, alpha]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Binary,
    Indexed2,
    Indexed4,
    Indexed8,
    Rgb24,
    Rgb32,
}

impl PixelFormat {
    pub fn bits_per_pixel(&self) -> u16 {
        match self {
            Self::Binary => 1,
            Self::Indexed2 => 2,
            Self::Indexed4 => 4,
            Self::Indexed8 => 8,
            Self::Rgb24 => 24,
            Self::Rgb32 => 32,
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.bits_per_pixel() <= 8
    }

    /// Number of palette entries, zero for direct color formats.
    pub fn palette_len(&self) -> usize {
        if self.is_indexed() {
            1 << self.bits_per_pixel()
        } else {
            0
        }
    }

    /// Unpadded length of one row in bytes.
    pub fn row_size(&self, width: u32) -> usize {
        let width = width as usize;
        match self {
            Self::Binary => width.div_ceil(8),
            Self::Indexed2 => width.div_ceil(4),
            Self::Indexed4 => width.div_ceil(2),
            Self::Indexed8 => width,
            Self::Rgb24 => width * 3,
            Self::Rgb32 => width * 4,
        }
    }
}

impl Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binary => write!(f, "1-bit indexed"),
            Self::Indexed2 => write!(f, "2-bit indexed"),
            Self::Indexed4 => write!(f, "4-bit indexed"),
            Self::Indexed8 => write!(f, "8-bit indexed"),
            Self::Rgb24 => write!(f, "24-bit RGB"),
            Self::Rgb32 => write!(f, "32-bit RGB"),
        }
    }
}

/// Allocates a zeroed buffer, reporting allocator refusal instead of aborting.
pub(crate) fn allocate_buffer(len: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed(len))?;
    buffer.resize(len, 0);
    Ok(buffer)
}

fn allocate_palette(len: usize) -> Result<Vec<RGBColorFormat<u8>>> {
    let mut palette = Vec::new();
    palette
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed(len * 3))?;
    palette.resize(len, RGBColorFormat::black());
    Ok(palette)
}

/// An in-memory image, rows stored top to bottom.
///
/// Palette and pixel buffer are allocated together in [`Raster::new`] and
/// released together when the raster is dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    format: PixelFormat,
    width: u32,
    height: u32,
    row_size: usize,
    palette: Option<Vec<RGBColorFormat<u8>>>,
    data: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, format: PixelFormat, with_palette: bool) -> Result<Self> {
        if with_palette && !format.is_indexed() {
            return Err(Error::PaletteRequestedForDirectColorFormat(format));
        }
        let row_size = format.row_size(width);
        let size = row_size
            .checked_mul(height as usize)
            .ok_or(Error::BufferSizeOverflow(width, height))?;
        let palette = if with_palette {
            Some(allocate_palette(format.palette_len())?)
        } else {
            None
        };
        // an early return here drops the palette again
        let data = allocate_buffer(size)?;
        Ok(Raster {
            format,
            width,
            height,
            row_size,
            palette,
            data,
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn row_size(&self) -> usize {
        self.row_size
    }

    pub fn has_palette(&self) -> bool {
        self.palette.is_some()
    }

    pub fn palette(&self) -> Option<&[RGBColorFormat<u8>]> {
        self.palette.as_deref()
    }

    pub fn palette_mut(&mut self) -> Option<&mut [RGBColorFormat<u8>]> {
        self.palette.as_deref_mut()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn row(&self, row_index: u32) -> &[u8] {
        let start = row_index as usize * self.row_size;
        &self.data[start..start + self.row_size]
    }

    pub fn row_mut(&mut self, row_index: u32) -> &mut [u8] {
        let start = row_index as usize * self.row_size;
        &mut self.data[start..start + self.row_size]
    }

    pub fn rows(&self) -> ChunksExact<'_, u8> {
        self.data.chunks_exact(self.row_size.max(1))
    }

    pub fn rows_mut(&mut self) -> ChunksExactMut<'_, u8> {
        self.data.chunks_exact_mut(self.row_size.max(1))
    }
}
