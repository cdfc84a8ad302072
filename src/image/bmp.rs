//! On-disk structures of the Windows bitmap format.
//!
//! Every header is encoded and decoded one field at a time in little endian
//! order, so the in-memory layout of these structs never leaks into a file.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Error;
use crate::Result;

pub const BMP_SIGNATURE: u16 = 0x4D42;
pub const FILE_HEADER_SIZE: u32 = 14;
pub const INFO_HEADER_SIZE: u32 = 40;
pub const PALETTE_ENTRY_SIZE: u32 = 4;

pub const COMPRESSION_NONE: u32 = 0;
pub const COMPRESSION_BITFIELDS: u32 = 3;

/// 72 dots per inch.
pub const DEFAULT_PIXELS_PER_METER: i32 = 2835;

/// Length of one on-disk scanline, padded to a multiple of four bytes.
pub fn padded_row_size(width: u32, bits_per_pixel: u16) -> Option<usize> {
    let bits = (width as u64).checked_mul(bits_per_pixel as u64)?;
    let size = bits.checked_add(31)? / 32 * 4;
    usize::try_from(size).ok()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileHeader {
    pub signature: u16,
    pub file_size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    pub pixel_data_offset: u32,
}

impl FileHeader {
    /// Reads the file header, stopping right after the signature when it is
    /// not the bitmap magic.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let signature = reader
            .read_u16::<LittleEndian>()
            .map_err(Error::FailedToReadFileHeader)?;
        if signature != BMP_SIGNATURE {
            return Err(Error::InvalidSignature(signature));
        }
        Self::read_fields(reader, signature).map_err(Error::FailedToReadFileHeader)
    }

    fn read_fields<R: Read>(reader: &mut R, signature: u16) -> io::Result<Self> {
        Ok(FileHeader {
            signature,
            file_size: reader.read_u32::<LittleEndian>()?,
            reserved1: reader.read_u16::<LittleEndian>()?,
            reserved2: reader.read_u16::<LittleEndian>()?,
            pixel_data_offset: reader.read_u32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.signature)?;
        writer.write_u32::<LittleEndian>(self.file_size)?;
        writer.write_u16::<LittleEndian>(self.reserved1)?;
        writer.write_u16::<LittleEndian>(self.reserved2)?;
        writer.write_u32::<LittleEndian>(self.pixel_data_offset)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelMasks {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl ChannelMasks {
    /// Bits not claimed by any color channel.
    pub fn alpha(&self) -> u32 {
        !(self.red | self.green | self.blue)
    }
}

/// Packing of 16 and 32-bit pixels, recognised from the red channel mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BitfieldLayout {
    /// Unrecognised or absent masks, decoded as 1-5-5-5.
    #[default]
    Unknown,
    A1R5G5B5,
    A4R4G4B4,
    R5G6B5,
    A8R8G8B8,
}

impl BitfieldLayout {
    pub fn from_red_mask(mask: u32) -> Self {
        match mask {
            0x7800 => Self::R5G6B5,
            0x7C00 => Self::A1R5G5B5,
            0x0F00 => Self::A4R4G4B4,
            0xFF00_0000 => Self::A8R8G8B8,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InfoHeader {
    pub size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pixels_per_meter: i32,
    pub y_pixels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
    /// Present only when the declared header size exceeds 40 bytes.
    pub masks: Option<ChannelMasks>,
}

impl InfoHeader {
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Self::read_fields(reader).map_err(Error::FailedToReadInfoHeader)
    }

    fn read_fields<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut header = InfoHeader {
            size: reader.read_u32::<LittleEndian>()?,
            width: reader.read_i32::<LittleEndian>()?,
            height: reader.read_i32::<LittleEndian>()?,
            planes: reader.read_u16::<LittleEndian>()?,
            bits_per_pixel: reader.read_u16::<LittleEndian>()?,
            compression: reader.read_u32::<LittleEndian>()?,
            image_size: reader.read_u32::<LittleEndian>()?,
            x_pixels_per_meter: reader.read_i32::<LittleEndian>()?,
            y_pixels_per_meter: reader.read_i32::<LittleEndian>()?,
            colors_used: reader.read_u32::<LittleEndian>()?,
            colors_important: reader.read_u32::<LittleEndian>()?,
            masks: None,
        };
        if header.size > INFO_HEADER_SIZE {
            header.masks = Some(ChannelMasks {
                red: reader.read_u32::<LittleEndian>()?,
                green: reader.read_u32::<LittleEndian>()?,
                blue: reader.read_u32::<LittleEndian>()?,
            });
        }
        Ok(header)
    }

    /// Writes the 40-byte core of the header; masks are never emitted.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.size)?;
        writer.write_i32::<LittleEndian>(self.width)?;
        writer.write_i32::<LittleEndian>(self.height)?;
        writer.write_u16::<LittleEndian>(self.planes)?;
        writer.write_u16::<LittleEndian>(self.bits_per_pixel)?;
        writer.write_u32::<LittleEndian>(self.compression)?;
        writer.write_u32::<LittleEndian>(self.image_size)?;
        writer.write_i32::<LittleEndian>(self.x_pixels_per_meter)?;
        writer.write_i32::<LittleEndian>(self.y_pixels_per_meter)?;
        writer.write_u32::<LittleEndian>(self.colors_used)?;
        writer.write_u32::<LittleEndian>(self.colors_important)
    }

    pub fn bitfield_layout(&self) -> BitfieldLayout {
        self.masks
            .map(|masks| BitfieldLayout::from_red_mask(masks.red))
            .unwrap_or_default()
    }

    /// Rows are stored top row first when the height is negative.
    pub fn is_top_down(&self) -> bool {
        self.height < 0
    }
}

/// Palette entries implied by a bit depth, `None` for unsupported depths.
pub fn palette_entries_for_bit_depth(bits_per_pixel: u16) -> Option<u32> {
    match bits_per_pixel {
        1 => Some(2),
        4 => Some(16),
        8 => Some(256),
        16 | 24 | 32 => Some(0),
        _ => None,
    }
}
