use std::io::{Read, Seek, SeekFrom};

use byteorder::{ByteOrder, LittleEndian};

use crate::color::RGBColorFormat;
use crate::error::Error;
use crate::image::bmp::{
    padded_row_size, palette_entries_for_bit_depth, BitfieldLayout, ChannelMasks, FileHeader,
    InfoHeader, COMPRESSION_BITFIELDS, COMPRESSION_NONE, FILE_HEADER_SIZE, INFO_HEADER_SIZE,
};
use crate::image::{allocate_buffer, ImageReader, PixelFormat, Raster};
use crate::Result;

/// Masks of the 1-5-5-5 layout, used whenever a 16-bit file has no usable masks.
const DEFAULT_16_BIT_MASKS: ChannelMasks = ChannelMasks {
    red: 0x7C00,
    green: 0x03E0,
    blue: 0x001F,
};

pub struct BmpImageReader<R: Read + Seek> {
    reader: R,
}

impl<R: Read + Seek> BmpImageReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read + Seek> ImageReader for BmpImageReader<R> {
    fn read_image(&mut self) -> Result<Raster> {
        BmpDecoder::open(&mut self.reader)?.decode()
    }
}

/// State of one open bitmap: parsed headers, palette and a scanline buffer
/// reused for every row.
pub struct BmpDecoder<R: Read + Seek> {
    reader: R,
    file_header: FileHeader,
    info_header: InfoHeader,
    layout: BitfieldLayout,
    palette: Vec<RGBColorFormat<u8>>,
    width: u32,
    height: u32,
    row_size: usize,
    scanline: Vec<u8>,
    rows_read: u32,
}

impl<R: Read + Seek> BmpDecoder<R> {
    /// Parses everything in front of the pixel data and leaves the stream
    /// positioned at the first scanline.
    pub fn open(mut reader: R) -> Result<Self> {
        let file_header = FileHeader::read_from(&mut reader)?;
        log::debug!("{:?}", file_header);
        let info_header = InfoHeader::read_from(&mut reader)?;
        log::debug!("{:?}", info_header);
        if info_header.size < INFO_HEADER_SIZE {
            return Err(Error::InvalidInfoHeaderSize(info_header.size));
        }
        let bits_per_pixel = info_header.bits_per_pixel;
        let colors = palette_entries_for_bit_depth(bits_per_pixel)
            .ok_or(Error::UnsupportedBitDepth(bits_per_pixel))?;
        let (width, height) = Self::dimensions(&info_header)?;
        let layout = info_header.bitfield_layout();
        if let Some(masks) = info_header.masks {
            if let Some(fallback) = mask_fallback(bits_per_pixel, layout) {
                log::warn!(
                    "Red channel mask 0x{:08X} does not fit {} bits per pixel, {}",
                    masks.red,
                    bits_per_pixel,
                    fallback
                );
            }
        }
        let palette = Self::read_palette(&mut reader, &info_header, colors)?;
        let row_size =
            padded_row_size(width, bits_per_pixel).ok_or(Error::BufferSizeOverflow(width, height))?;
        let scanline = allocate_buffer(row_size)?;
        let offset = file_header.pixel_data_offset;
        Self::check_pixel_data_length(&mut reader, offset, row_size, height)?;
        reader
            .seek(SeekFrom::Start(offset as u64))
            .map_err(|e| Error::FailedToSeekToPixelData(offset, e))?;
        Ok(BmpDecoder {
            reader,
            file_header,
            info_header,
            layout,
            palette,
            width,
            height,
            row_size,
            scanline,
            rows_read: 0,
        })
    }

    fn dimensions(info_header: &InfoHeader) -> Result<(u32, u32)> {
        let width = info_header.width;
        let height = info_header.height;
        if width <= 0 || height == 0 {
            return Err(Error::InvalidDimensions(width, height));
        }
        Ok((width as u32, height.unsigned_abs()))
    }

    /// Fails when the stream ends before `height` padded rows past `offset`,
    /// so no raster is ever sized from header values alone.
    fn check_pixel_data_length(
        reader: &mut R,
        offset: u32,
        row_size: usize,
        height: u32,
    ) -> Result<()> {
        let required = (row_size as u64)
            .checked_mul(height as u64)
            .and_then(|size| size.checked_add(offset as u64))
            .unwrap_or(u64::MAX);
        let available = reader
            .seek(SeekFrom::End(0))
            .map_err(|e| Error::FailedToSeekToPixelData(offset, e))?;
        if available < required {
            return Err(Error::PixelDataTruncated(required, available));
        }
        Ok(())
    }

    fn read_palette(
        reader: &mut R,
        info_header: &InfoHeader,
        colors: u32,
    ) -> Result<Vec<RGBColorFormat<u8>>> {
        if colors == 0 {
            return Ok(Vec::new());
        }
        // the palette follows the info header, whatever its declared size
        let palette_offset = FILE_HEADER_SIZE as u64 + info_header.size as u64;
        reader
            .seek(SeekFrom::Start(palette_offset))
            .map_err(Error::FailedToReadPalette)?;
        let stored_entries = match info_header.colors_used {
            used if used > 0 && used < colors => used,
            _ => colors,
        };
        let mut palette = vec![RGBColorFormat::black(); colors as usize];
        let mut quad = [0_u8; 4];
        for entry in palette.iter_mut().take(stored_entries as usize) {
            reader
                .read_exact(&mut quad)
                .map_err(Error::FailedToReadPalette)?;
            *entry = RGBColorFormat::from_bgr_quad(quad);
        }
        Ok(palette)
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    pub fn info_header(&self) -> &InfoHeader {
        &self.info_header
    }

    pub fn bitfield_layout(&self) -> BitfieldLayout {
        self.layout
    }

    pub fn palette(&self) -> &[RGBColorFormat<u8>] {
        &self.palette
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Length of one padded on-disk scanline.
    pub fn row_size(&self) -> usize {
        self.row_size
    }

    pub fn pixel_format(&self) -> Result<PixelFormat> {
        match self.info_header.bits_per_pixel {
            1 => Ok(PixelFormat::Binary),
            4 => Ok(PixelFormat::Indexed4),
            8 => Ok(PixelFormat::Indexed8),
            16 | 24 => Ok(PixelFormat::Rgb24),
            32 => Ok(PixelFormat::Rgb32),
            bits => Err(Error::UnsupportedBitDepth(bits)),
        }
    }

    fn check_compression(&self) -> Result<()> {
        match self.info_header.compression {
            COMPRESSION_NONE | COMPRESSION_BITFIELDS => Ok(()),
            method => Err(Error::UnsupportedCompression(method)),
        }
    }

    /// Reads the next scanline in file order and unpacks it into `destination`,
    /// which holds one row of the pixel format returned by [`Self::pixel_format`].
    pub fn read_scanline(&mut self, destination: &mut [u8]) -> Result<()> {
        let row = self.rows_read;
        self.reader
            .read_exact(&mut self.scanline)
            .map_err(|e| Error::FailedToReadScanline(row, e))?;
        self.rows_read += 1;
        match self.info_header.bits_per_pixel {
            16 => self.unpack_16_bit(destination),
            24 => unpack_24_bit(&self.scanline, destination),
            32 => self.unpack_32_bit(destination),
            _ => {
                let len = destination.len().min(self.scanline.len());
                destination[..len].copy_from_slice(&self.scanline[..len]);
            }
        }
        Ok(())
    }

    fn unpack_16_bit(&self, destination: &mut [u8]) {
        let masks = match (self.layout, self.info_header.masks) {
            (BitfieldLayout::R5G6B5, Some(masks))
            | (BitfieldLayout::A1R5G5B5, Some(masks))
            | (BitfieldLayout::A4R4G4B4, Some(masks)) => masks,
            _ => DEFAULT_16_BIT_MASKS,
        };
        let shifts = shifts_16_bit(self.layout);
        for (source, target) in self
            .scanline
            .chunks_exact(2)
            .zip(destination.chunks_exact_mut(3))
        {
            let pixel = LittleEndian::read_u16(source) as u32;
            target[0] = (((pixel & masks.red) >> shifts[0].0) << shifts[0].1) as u8;
            target[1] = (((pixel & masks.green) >> shifts[1].0) << shifts[1].1) as u8;
            target[2] = (((pixel & masks.blue) >> shifts[2].0) << shifts[2].1) as u8;
        }
    }

    fn unpack_32_bit(&self, destination: &mut [u8]) {
        let masks = match (self.layout, self.info_header.masks) {
            (BitfieldLayout::A8R8G8B8, Some(masks)) => masks,
            _ => {
                unpack_bgra(&self.scanline, destination);
                return;
            }
        };
        let alpha = masks.alpha();
        for (source, target) in self
            .scanline
            .chunks_exact(4)
            .zip(destination.chunks_exact_mut(4))
        {
            let pixel = LittleEndian::read_u32(source);
            target[0] = extract_channel(pixel, masks.red);
            target[1] = extract_channel(pixel, masks.green);
            target[2] = extract_channel(pixel, masks.blue);
            target[3] = extract_channel(pixel, alpha);
        }
    }

    /// Decodes all remaining scanlines into a new raster, top row first.
    pub fn decode(mut self) -> Result<Raster> {
        self.check_compression()?;
        let format = self.pixel_format()?;
        log::info!(
            "Decoding {}x{} bitmap, {} bits per pixel",
            self.width,
            self.height,
            self.info_header.bits_per_pixel
        );
        let mut raster = Raster::new(self.width, self.height, format, format.is_indexed())?;
        if let Some(palette) = raster.palette_mut() {
            for (target, &source) in palette.iter_mut().zip(self.palette.iter()) {
                *target = source;
            }
        }
        let top_down = self.info_header.is_top_down();
        for index in 0..self.height {
            let row_index = if top_down {
                index
            } else {
                self.height - index - 1
            };
            self.read_scanline(raster.row_mut(row_index))?;
        }
        Ok(raster)
    }
}

/// `(right, left)` shift per red, green and blue channel that moves a masked
/// 16-bit channel into the high bits of a byte.
fn shifts_16_bit(layout: BitfieldLayout) -> [(u32, u32); 3] {
    match layout {
        BitfieldLayout::R5G6B5 => [(11, 3), (5, 2), (0, 3)],
        BitfieldLayout::A4R4G4B4 => [(8, 4), (4, 4), (0, 4)],
        BitfieldLayout::A1R5G5B5 | BitfieldLayout::Unknown | BitfieldLayout::A8R8G8B8 => {
            [(10, 3), (5, 3), (0, 3)]
        }
    }
}

/// Describes how packed pixels are decoded when the header masks do not
/// match the bit depth, `None` when the masks are used as read.
fn mask_fallback(bits_per_pixel: u16, layout: BitfieldLayout) -> Option<&'static str> {
    match (bits_per_pixel, layout) {
        (16, BitfieldLayout::Unknown | BitfieldLayout::A8R8G8B8) => {
            Some("decoding with the 1-5-5-5 masks")
        }
        (32, BitfieldLayout::A8R8G8B8) => None,
        (32, _) => Some("reading bytes as blue, green, red, alpha"),
        _ => None,
    }
}

fn extract_channel(pixel: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    ((pixel & mask) >> mask.trailing_zeros()) as u8
}

fn unpack_24_bit(scanline: &[u8], destination: &mut [u8]) {
    for (source, target) in scanline.chunks_exact(3).zip(destination.chunks_exact_mut(3)) {
        target[0] = source[2];
        target[1] = source[1];
        target[2] = source[0];
    }
}

fn unpack_bgra(scanline: &[u8], destination: &mut [u8]) {
    for (source, target) in scanline.chunks_exact(4).zip(destination.chunks_exact_mut(4)) {
        target[0] = source[2];
        target[1] = source[1];
        target[2] = source[0];
        target[3] = source[3];
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::io::Cursor;

    use super::{mask_fallback, BmpDecoder, BmpImageReader};
    use crate::color::RGBColorFormat;
    use crate::error::{Error, ErrorKind};
    use crate::image::bmp::{
        padded_row_size, BitfieldLayout, FileHeader, InfoHeader, BMP_SIGNATURE, FILE_HEADER_SIZE,
    };
    use crate::image::{ImageReader, PixelFormat, Raster};

    /// Assembles a bitmap file from disk-order rows (bottom row first).
    pub(crate) fn bitmap_bytes(
        info_header: InfoHeader,
        masks: Option<[u32; 3]>,
        palette: &[[u8; 4]],
        rows: &[&[u8]],
    ) -> Vec<u8> {
        let mut header_bytes = Vec::new();
        info_header
            .write_to(&mut header_bytes)
            .expect("writing to a vector");
        if let Some(masks) = masks {
            for mask in masks {
                header_bytes.extend_from_slice(&mask.to_le_bytes());
            }
        }
        header_bytes.resize(info_header.size as usize, 0);
        let row_size = padded_row_size(
            info_header.width.unsigned_abs(),
            info_header.bits_per_pixel,
        )
        .expect("small test image");
        let offset = FILE_HEADER_SIZE as usize + header_bytes.len() + palette.len() * 4;
        let file_header = FileHeader {
            signature: BMP_SIGNATURE,
            file_size: (offset + rows.len() * row_size) as u32,
            reserved1: 0,
            reserved2: 0,
            pixel_data_offset: offset as u32,
        };
        let mut bytes = Vec::new();
        file_header.write_to(&mut bytes).expect("writing to a vector");
        bytes.extend_from_slice(&header_bytes);
        for quad in palette {
            bytes.extend_from_slice(quad);
        }
        for row in rows {
            let mut padded = row.to_vec();
            padded.resize(row_size, 0);
            bytes.extend_from_slice(&padded);
        }
        bytes
    }

    pub(crate) fn info_header(width: i32, height: i32, bits_per_pixel: u16) -> InfoHeader {
        InfoHeader {
            size: 40,
            width,
            height,
            planes: 1,
            bits_per_pixel,
            ..Default::default()
        }
    }

    fn decode(bytes: Vec<u8>) -> crate::Result<Raster> {
        BmpImageReader::new(Cursor::new(bytes)).read_image()
    }

    #[test]
    fn decode_24_bit_rows_bottom_up() {
        let bytes = bitmap_bytes(
            info_header(2, 2, 24),
            None,
            &[],
            &[
                &[0x03, 0x02, 0x01, 0x06, 0x05, 0x04],
                &[0x30, 0x20, 0x10, 0x60, 0x50, 0x40],
            ],
        );
        let raster = decode(bytes).expect("valid bitmap");
        assert_eq!(raster.format(), PixelFormat::Rgb24);
        assert_eq!(raster.row(0), &[0x10, 0x20, 0x30, 0x40, 0x50, 0x60]);
        assert_eq!(raster.row(1), &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    fn decode_top_down_bitmap_without_mirroring() {
        let bytes = bitmap_bytes(
            info_header(1, -2, 24),
            None,
            &[],
            &[&[0x03, 0x02, 0x01], &[0x30, 0x20, 0x10]],
        );
        let raster = decode(bytes).expect("valid bitmap");
        assert_eq!(raster.height(), 2);
        assert_eq!(raster.row(0), &[0x01, 0x02, 0x03]);
        assert_eq!(raster.row(1), &[0x10, 0x20, 0x30]);
    }

    #[test]
    fn decode_1_bit_with_palette() {
        let bytes = bitmap_bytes(
            info_header(10, 1, 1),
            None,
            &[[0, 0, 0, 0], [0xFF, 0x80, 0x00, 0xAA]],
            &[&[0b1010_0000, 0b1100_0000]],
        );
        let raster = decode(bytes).expect("valid bitmap");
        assert_eq!(raster.format(), PixelFormat::Binary);
        assert_eq!(raster.row_size(), 2);
        assert_eq!(raster.row(0), &[0b1010_0000, 0b1100_0000]);
        let palette = raster.palette().expect("indexed bitmap has a palette");
        assert_eq!(palette.len(), 2);
        assert_eq!(palette[1], RGBColorFormat::new(0x00, 0x80, 0xFF));
    }

    #[test]
    fn decode_short_palette_from_colors_used() {
        let mut header = info_header(2, 1, 8);
        header.colors_used = 2;
        let bytes = bitmap_bytes(
            header,
            None,
            &[[1, 2, 3, 0], [4, 5, 6, 0]],
            &[&[1, 0]],
        );
        let raster = decode(bytes).expect("valid bitmap");
        let palette = raster.palette().expect("indexed bitmap has a palette");
        assert_eq!(palette.len(), 256);
        assert_eq!(palette[0], RGBColorFormat::new(3, 2, 1));
        assert_eq!(palette[1], RGBColorFormat::new(6, 5, 4));
        assert_eq!(palette[2], RGBColorFormat::black());
        assert_eq!(raster.row(0), &[1, 0]);
    }

    #[test]
    fn decode_16_bit_default_layout() {
        // 1-5-5-5: red 31, green 16, blue 1
        let pixel: u16 = (31 << 10) | (16 << 5) | 1;
        let bytes = bitmap_bytes(info_header(1, 1, 16), None, &[], &[&pixel.to_le_bytes()]);
        let raster = decode(bytes).expect("valid bitmap");
        assert_eq!(raster.format(), PixelFormat::Rgb24);
        assert_eq!(raster.row(0), &[0xF8, 0x80, 0x08]);
    }

    #[test]
    fn decode_16_bit_565_layout_from_masks() {
        let mut header = info_header(2, 1, 16);
        header.size = 52;
        header.compression = 3;
        let first: u16 = (0b1111 << 11) | (0b11_1111 << 5) | 0b1_1111;
        let second: u16 = (0b0001 << 11) | (0b00_0010 << 5) | 0b0_0011;
        let mut row = first.to_le_bytes().to_vec();
        row.extend_from_slice(&second.to_le_bytes());
        let bytes = bitmap_bytes(header, Some([0x7800, 0x07E0, 0x001F]), &[], &[&row]);
        let mut decoder = BmpDecoder::open(Cursor::new(bytes)).expect("valid header");
        assert_eq!(decoder.bitfield_layout(), BitfieldLayout::R5G6B5);
        let mut destination = [0_u8; 6];
        decoder
            .read_scanline(&mut destination)
            .expect("one scanline present");
        assert_eq!(destination, [0x78, 0xFC, 0xF8, 0x08, 0x08, 0x18]);
    }

    #[test]
    fn decode_16_bit_444_layout_from_masks() {
        let mut header = info_header(1, 1, 16);
        header.size = 52;
        let pixel: u16 = 0x0ABC;
        let bytes = bitmap_bytes(header, Some([0x0F00, 0x00F0, 0x000F]), &[], &[&pixel.to_le_bytes()]);
        let raster = decode(bytes).expect("valid bitmap");
        assert_eq!(raster.row(0), &[0xA0, 0xB0, 0xC0]);
    }

    #[test]
    fn decode_32_bit_byte_order() {
        let bytes = bitmap_bytes(info_header(1, 1, 32), None, &[], &[&[0x01, 0x02, 0x03, 0x04]]);
        let raster = decode(bytes).expect("valid bitmap");
        assert_eq!(raster.format(), PixelFormat::Rgb32);
        assert_eq!(raster.row(0), &[0x03, 0x02, 0x01, 0x04]);
    }

    #[test]
    fn decode_32_bit_8888_layout_from_masks() {
        let mut header = info_header(1, 1, 32);
        header.size = 52;
        header.compression = 3;
        let pixel: u32 = 0x1122_3344;
        let bytes = bitmap_bytes(
            header,
            Some([0xFF00_0000, 0x00FF_0000, 0x0000_FF00]),
            &[],
            &[&pixel.to_le_bytes()],
        );
        let raster = decode(bytes).expect("valid bitmap");
        assert_eq!(raster.row(0), &[0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn extended_header_bytes_are_skipped() {
        let mut header = info_header(1, 1, 8);
        header.size = 108;
        let bytes = bitmap_bytes(header, Some([0, 0, 0]), &[[9, 8, 7, 0]; 256], &[&[0]]);
        let raster = decode(bytes).expect("valid bitmap");
        assert_eq!(raster.palette().unwrap()[0], RGBColorFormat::new(7, 8, 9));
    }

    #[test]
    fn reject_invalid_signature() {
        let mut bytes = bitmap_bytes(info_header(1, 1, 24), None, &[], &[&[0, 0, 0]]);
        bytes[0] = b'X';
        let error = decode(bytes).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FormatInvalid);
    }

    #[test]
    fn reject_unsupported_bit_depths_at_open() {
        for bits in [2_u16, 3, 5, 6, 7] {
            let bytes = bitmap_bytes(info_header(4, 1, bits), None, &[], &[&[0; 4]]);
            match BmpDecoder::open(Cursor::new(bytes)) {
                Err(Error::UnsupportedBitDepth(b)) => assert_eq!(b, bits),
                Err(other) => panic!("unexpected error for {} bits: {}", bits, other),
                Ok(_) => panic!("{} bits per pixel must be rejected", bits),
            }
        }
    }

    #[test]
    fn reject_compressed_bitmaps() {
        for compression in [1_u32, 2, 4, 5] {
            let mut header = info_header(1, 1, 8);
            header.compression = compression;
            let bytes = bitmap_bytes(header, None, &[[0; 4]; 256], &[&[0]]);
            let error = decode(bytes).unwrap_err();
            assert!(matches!(error, Error::UnsupportedCompression(c) if c == compression));
            assert_eq!(error.kind(), ErrorKind::FormatUnsupported);
        }
    }

    #[test]
    fn reject_zero_width() {
        let bytes = bitmap_bytes(info_header(0, 1, 24), None, &[], &[]);
        let error = decode(bytes).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FormatInvalid);
    }

    #[test]
    fn truncated_pixel_data_is_io_failure() {
        let mut bytes = bitmap_bytes(
            info_header(2, 2, 24),
            None,
            &[],
            &[&[0; 6], &[0; 6]],
        );
        bytes.truncate(bytes.len() - 3);
        let error = decode(bytes).unwrap_err();
        assert!(matches!(error, Error::PixelDataTruncated(70, 67)));
        assert_eq!(error.kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn header_only_file_with_huge_dimensions_fails_at_open() {
        let bytes = bitmap_bytes(info_header(30000, 30000, 24), None, &[], &[]);
        assert_eq!(bytes.len(), 54);
        match BmpDecoder::open(Cursor::new(bytes.clone())) {
            Err(Error::PixelDataTruncated(required, available)) => {
                assert_eq!(required, 54 + 90_000 * 30_000);
                assert_eq!(available, 54);
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("missing pixel data must be detected at open"),
        }
        assert_eq!(decode(bytes).unwrap_err().kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn reading_past_last_scanline_is_io_failure() {
        let bytes = bitmap_bytes(info_header(1, 1, 24), None, &[], &[&[1, 2, 3]]);
        let mut decoder = BmpDecoder::open(Cursor::new(bytes)).expect("valid header");
        let mut destination = [0_u8; 3];
        decoder
            .read_scanline(&mut destination)
            .expect("one scanline present");
        assert_eq!(destination, [3, 2, 1]);
        let error = decoder.read_scanline(&mut destination).unwrap_err();
        assert!(matches!(error, Error::FailedToReadScanline(1, _)));
        assert_eq!(error.kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn reject_info_header_smaller_than_40_bytes() {
        let mut bytes = bitmap_bytes(info_header(1, 1, 24), None, &[], &[&[0, 0, 0]]);
        bytes[14..18].copy_from_slice(&12_u32.to_le_bytes());
        let error = decode(bytes).unwrap_err();
        assert!(matches!(error, Error::InvalidInfoHeaderSize(12)));
        assert_eq!(error.kind(), ErrorKind::FormatInvalid);
    }

    #[test]
    fn reject_zero_height() {
        let bytes = bitmap_bytes(info_header(1, 0, 24), None, &[], &[]);
        let error = decode(bytes).unwrap_err();
        assert!(matches!(error, Error::InvalidDimensions(1, 0)));
        assert_eq!(error.kind(), ErrorKind::FormatInvalid);
    }

    #[test]
    fn decode_16_bit_1555_layout_from_masks() {
        let mut header = info_header(1, 1, 16);
        header.size = 52;
        header.compression = 3;
        let pixel: u16 = (1 << 10) | (2 << 5) | 3;
        let bytes = bitmap_bytes(header, Some([0x7C00, 0x03E0, 0x001F]), &[], &[&pixel.to_le_bytes()]);
        let mut decoder = BmpDecoder::open(Cursor::new(bytes)).expect("valid header");
        assert_eq!(decoder.bitfield_layout(), BitfieldLayout::A1R5G5B5);
        let mut destination = [0_u8; 3];
        decoder
            .read_scanline(&mut destination)
            .expect("one scanline present");
        assert_eq!(destination, [0x08, 0x10, 0x18]);
    }

    #[test]
    fn decode_16_bit_with_8888_masks_as_1555() {
        let mut header = info_header(1, 1, 16);
        header.size = 52;
        header.compression = 3;
        let pixel: u16 = (31 << 10) | (16 << 5) | 1;
        let bytes = bitmap_bytes(
            header,
            Some([0xFF00_0000, 0x00FF_0000, 0x0000_FF00]),
            &[],
            &[&pixel.to_le_bytes()],
        );
        let mut decoder = BmpDecoder::open(Cursor::new(bytes)).expect("valid header");
        assert_eq!(decoder.bitfield_layout(), BitfieldLayout::A8R8G8B8);
        let mut destination = [0_u8; 3];
        decoder
            .read_scanline(&mut destination)
            .expect("one scanline present");
        assert_eq!(destination, [0xF8, 0x80, 0x08]);
    }

    #[test]
    fn decode_32_bit_with_unknown_masks_by_byte_order() {
        let mut header = info_header(1, 1, 32);
        header.size = 52;
        header.compression = 3;
        let bytes = bitmap_bytes(
            header,
            Some([0x00FF_0000, 0x0000_FF00, 0x0000_00FF]),
            &[],
            &[&[0x01, 0x02, 0x03, 0x04]],
        );
        let raster = decode(bytes).expect("valid bitmap");
        assert_eq!(raster.row(0), &[0x03, 0x02, 0x01, 0x04]);
    }

    #[test]
    fn mask_fallback_depends_on_bit_depth() {
        assert_eq!(
            mask_fallback(16, BitfieldLayout::Unknown),
            Some("decoding with the 1-5-5-5 masks")
        );
        assert_eq!(
            mask_fallback(16, BitfieldLayout::A8R8G8B8),
            Some("decoding with the 1-5-5-5 masks")
        );
        assert_eq!(mask_fallback(16, BitfieldLayout::R5G6B5), None);
        assert_eq!(
            mask_fallback(32, BitfieldLayout::Unknown),
            Some("reading bytes as blue, green, red, alpha")
        );
        assert_eq!(
            mask_fallback(32, BitfieldLayout::R5G6B5),
            Some("reading bytes as blue, green, red, alpha")
        );
        assert_eq!(mask_fallback(32, BitfieldLayout::A8R8G8B8), None);
        assert_eq!(mask_fallback(8, BitfieldLayout::Unknown), None);
    }

    #[test]
    fn truncated_palette_is_io_failure() {
        let mut bytes = bitmap_bytes(info_header(1, 1, 4), None, &[[0; 4]; 16], &[&[0]]);
        bytes.truncate(54 + 20);
        let error = BmpDecoder::open(Cursor::new(bytes)).err().expect("short palette");
        assert!(matches!(error, Error::FailedToReadPalette(_)));
    }

    #[test]
    fn open_exposes_row_size_and_headers() {
        let bytes = bitmap_bytes(info_header(10, 1, 1), None, &[[0; 4]; 2], &[&[0, 0]]);
        let decoder = BmpDecoder::open(Cursor::new(bytes)).expect("valid header");
        assert_eq!(decoder.row_size(), 4);
        assert_eq!(decoder.palette().len(), 2);
        assert_eq!(decoder.file_header().pixel_data_offset, 62);
        assert_eq!(decoder.info_header().bits_per_pixel, 1);
        assert_eq!((decoder.width(), decoder.height()), (10, 1));
    }
}
