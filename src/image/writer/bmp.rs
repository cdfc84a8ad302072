use std::io::Write;

use crate::color::RGBColorFormat;
use crate::error::Error;
use crate::image::bmp::{
    padded_row_size, FileHeader, InfoHeader, BMP_SIGNATURE, COMPRESSION_NONE,
    DEFAULT_PIXELS_PER_METER, FILE_HEADER_SIZE, INFO_HEADER_SIZE, PALETTE_ENTRY_SIZE,
};
use crate::image::{allocate_buffer, ImageWriter, PixelFormat, Raster};
use crate::logger;
use crate::Result;

pub struct BmpImageWriter<'a, W: Write> {
    writer: W,
    image: &'a Raster,
}

impl<'a, W: Write> BmpImageWriter<'a, W> {
    pub fn new(writer: W, image: &'a Raster) -> Self {
        Self { writer, image }
    }
}

impl<W: Write> ImageWriter for BmpImageWriter<'_, W> {
    fn write_image(&mut self) -> Result<()> {
        let mut encoder = BmpEncoder::new(&mut self.writer);
        encoder.encode(self.image)?;
        encoder.flush()
    }
}

/// Write side of a bitmap: headers are computed completely before any byte
/// reaches the writer.
pub struct BmpEncoder<W: Write> {
    writer: W,
    file_header: FileHeader,
    info_header: InfoHeader,
    palette: Vec<RGBColorFormat<u8>>,
    row_size: usize,
    scanline: Vec<u8>,
    rows_written: u32,
}

impl<W: Write> BmpEncoder<W> {
    pub fn new(writer: W) -> Self {
        BmpEncoder {
            writer,
            file_header: FileHeader::default(),
            info_header: InfoHeader::default(),
            palette: Vec::new(),
            row_size: 0,
            scanline: Vec::new(),
            rows_written: 0,
        }
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    pub fn info_header(&self) -> &InfoHeader {
        &self.info_header
    }

    /// Derives both headers from `image` and allocates the scanline buffer.
    pub fn setup_header(&mut self, image: &Raster) -> Result<()> {
        let format = image.format();
        let bits_per_pixel = match format {
            PixelFormat::Indexed2 => return Err(Error::UnsupportedOutputFormat(format)),
            _ => format.bits_per_pixel(),
        };
        let palette = match (format.is_indexed(), image.palette()) {
            (true, Some(palette)) => palette.to_vec(),
            (true, None) => return Err(Error::PaletteMissingForIndexedFormat(format)),
            (false, _) => Vec::new(),
        };
        let width = image.width();
        let height = image.height();
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage(width, height));
        }
        let (header_width, header_height, row_size, image_size) =
            bitmap_geometry(width, height, bits_per_pixel)?;
        let palette_size = palette.len() as u32 * PALETTE_ENTRY_SIZE;
        let pixel_data_offset = FILE_HEADER_SIZE + INFO_HEADER_SIZE + palette_size;

        self.info_header = InfoHeader {
            size: INFO_HEADER_SIZE,
            width: header_width,
            height: header_height,
            planes: 1,
            bits_per_pixel,
            compression: COMPRESSION_NONE,
            image_size,
            x_pixels_per_meter: DEFAULT_PIXELS_PER_METER,
            y_pixels_per_meter: DEFAULT_PIXELS_PER_METER,
            colors_used: palette.len() as u32,
            colors_important: 0,
            masks: None,
        };
        self.file_header = FileHeader {
            signature: BMP_SIGNATURE,
            file_size: pixel_data_offset
                .checked_add(image_size)
                .ok_or(Error::DimensionsExceedBitmapLimits(width, height))?,
            reserved1: 0,
            reserved2: 0,
            pixel_data_offset,
        };
        self.palette = palette;
        self.row_size = row_size;
        self.scanline = allocate_buffer(row_size)?;
        self.rows_written = 0;
        Ok(())
    }

    pub fn write_file_header(&mut self) -> Result<()> {
        let mut block = Vec::with_capacity(FILE_HEADER_SIZE as usize);
        self.file_header
            .write_to(&mut block)
            .map_err(Error::FailedToWriteFileHeader)?;
        logger::log_block("file header", &block);
        self.writer
            .write_all(&block)
            .map_err(Error::FailedToWriteFileHeader)
    }

    /// Writes the info header followed by the palette of indexed images.
    pub fn write_info_header(&mut self) -> Result<()> {
        let mut block = Vec::with_capacity(INFO_HEADER_SIZE as usize);
        self.info_header
            .write_to(&mut block)
            .map_err(Error::FailedToWriteInfoHeader)?;
        logger::log_block("info header", &block);
        self.writer
            .write_all(&block)
            .map_err(Error::FailedToWriteInfoHeader)?;
        let quads = self
            .palette
            .iter()
            .flat_map(|color| color.to_bgr_quad())
            .collect::<Vec<u8>>();
        self.writer
            .write_all(&quads)
            .map_err(Error::FailedToWritePalette)
    }

    /// Packs one raster row into on-disk order and writes it with padding.
    pub fn write_scanline(&mut self, row: &[u8]) -> Result<()> {
        // padding bytes past the pixels stay zero from allocation
        match self.info_header.bits_per_pixel {
            24 => {
                for (source, target) in row.chunks_exact(3).zip(self.scanline.chunks_exact_mut(3)) {
                    target[0] = source[2];
                    target[1] = source[1];
                    target[2] = source[0];
                }
            }
            32 => {
                for (source, target) in row.chunks_exact(4).zip(self.scanline.chunks_exact_mut(4)) {
                    target[0] = source[2];
                    target[1] = source[1];
                    target[2] = source[0];
                    target[3] = source[3];
                }
            }
            _ => {
                let len = row.len().min(self.row_size);
                self.scanline[..len].copy_from_slice(&row[..len]);
            }
        }
        let row_index = self.rows_written;
        self.writer
            .write_all(&self.scanline)
            .map_err(|e| Error::FailedToWriteScanline(row_index, e))?;
        self.rows_written += 1;
        Ok(())
    }

    /// Writes `image` completely, last raster row first.
    ///
    /// Nothing is rolled back on failure; the bytes written so far stay in
    /// the output.
    pub fn encode(&mut self, image: &Raster) -> Result<()> {
        self.setup_header(image)?;
        log::info!(
            "Encoding {}x{} bitmap, {} bits per pixel",
            image.width(),
            image.height(),
            self.info_header.bits_per_pixel
        );
        self.write_file_header()?;
        self.write_info_header()?;
        for row_index in (0..image.height()).rev() {
            self.write_scanline(image.row(row_index))?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(Error::FailedToFlushOutput)
    }
}

/// Header width and height, padded row size and pixel data size of an
/// image, or an error when one of them does not fit its header field.
fn bitmap_geometry(
    width: u32,
    height: u32,
    bits_per_pixel: u16,
) -> Result<(i32, i32, usize, u32)> {
    let too_large = || Error::DimensionsExceedBitmapLimits(width, height);
    let header_width = i32::try_from(width).map_err(|_| too_large())?;
    let header_height = i32::try_from(height).map_err(|_| too_large())?;
    let row_size = padded_row_size(width, bits_per_pixel).ok_or_else(too_large)?;
    let image_size = u32::try_from(row_size)
        .ok()
        .and_then(|row_size| row_size.checked_mul(height))
        .ok_or_else(too_large)?;
    Ok((header_width, header_height, row_size, image_size))
}
